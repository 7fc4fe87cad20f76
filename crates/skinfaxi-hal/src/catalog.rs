//! The fixed device catalog.
//!
//! A [`MetadataCatalog`] is assembled once at startup and read-only
//! afterwards, so lookups need no locking. Iteration order is the
//! construction order, which is part of the gateway's enumeration contract.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::{HalError, HalResult};
use crate::metadata::DeviceMetadata;

/// Fixed, ordered collection of hardware-description records.
#[derive(Debug)]
pub struct MetadataCatalog {
    devices: Vec<DeviceMetadata>,
    index: FxHashMap<String, usize>,
}

impl MetadataCatalog {
    /// Build a catalog from an ordered list of device records.
    ///
    /// Rejects duplicate names and names containing `@`.
    pub fn from_devices(devices: Vec<DeviceMetadata>) -> HalResult<Self> {
        let mut index = FxHashMap::default();
        for (i, device) in devices.iter().enumerate() {
            if device.name.contains('@') {
                return Err(HalError::ReservedSeparator(device.name.clone()));
            }
            if index.insert(device.name.clone(), i).is_some() {
                return Err(HalError::DuplicateDevice(device.name.clone()));
            }
        }
        debug!("catalog loaded with {} devices", devices.len());
        Ok(Self { devices, index })
    }

    /// The built-in roster: the fixed fake-device families plus an ideal
    /// statevector simulator with `statevector_qubits` qubits.
    pub fn builtin(statevector_qubits: u32) -> Self {
        let canary5 = [
            "fake_athens",
            "fake_belem",
            "fake_bogota",
            "fake_lima",
            "fake_manila",
            "fake_quito",
            "fake_rome",
            "fake_santiago",
            "fake_vigo",
            "fake_yorktown",
        ];
        let falcon7 = [
            "fake_casablanca",
            "fake_jakarta",
            "fake_lagos",
            "fake_nairobi",
            "fake_perth",
        ];
        let falcon27 = [
            "fake_cairo",
            "fake_hanoi",
            "fake_kolkata",
            "fake_montreal",
            "fake_mumbai",
            "fake_sydney",
        ];

        let mut devices = Vec::new();
        devices.extend(canary5.iter().map(|n| DeviceMetadata::canary5(*n)));
        devices.extend(falcon7.iter().map(|n| DeviceMetadata::falcon7(*n)));
        devices.push(DeviceMetadata::falcon16("fake_guadalupe"));
        devices.extend(falcon27.iter().map(|n| DeviceMetadata::falcon27(*n)));
        devices.push(DeviceMetadata::statevector(statevector_qubits));

        // The roster contains no duplicates and no reserved characters.
        match Self::from_devices(devices) {
            Ok(catalog) => catalog,
            Err(_) => unreachable!("builtin roster is well-formed"),
        }
    }

    /// Look up a device by name.
    pub fn get(&self, name: &str) -> Option<&DeviceMetadata> {
        self.index.get(name).map(|&i| &self.devices[i])
    }

    /// Check if a device exists.
    pub fn has_device(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterate over devices in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &DeviceMetadata> {
        self.devices.iter()
    }

    /// Device names in catalog order.
    pub fn names(&self) -> Vec<&str> {
        self.devices.iter().map(|d| d.name.as_str()).collect()
    }

    /// Number of devices in the catalog.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Check if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
