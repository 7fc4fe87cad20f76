//! Hardware-description records.
//!
//! This module defines the read-only metadata the gateway publishes for each
//! simulated device: qubit count, supported gates, connectivity topology, and
//! calibration averages. Virtual backends pair one of these records with an
//! execution engine; the record itself never knows which engine it is paired
//! with.
//!
//! All edges in [`Topology`] are bidirectional: if `(a, b)` is present, both
//! `a → b` and `b → a` are valid two-qubit interactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A read-only hardware-description record.
///
/// Loaded once at startup as part of the [`MetadataCatalog`](crate::MetadataCatalog)
/// and never mutated afterwards. The `name` is the metadata half of a
/// `<device>@<executor>` virtual backend name and therefore must never
/// contain `@` (enforced at catalog construction).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceMetadata {
    /// Device name (unique within the catalog).
    pub name: String,
    /// Number of qubits.
    pub num_qubits: u32,
    /// Supported gate set (OpenQASM 3 naming convention).
    pub gate_set: GateSet,
    /// Qubit connectivity topology. All edges are bidirectional.
    pub topology: Topology,
    /// Maximum number of shots per job.
    pub max_shots: u32,
    /// Device description version string.
    pub backend_version: String,
    /// Whether this record describes a simulator rather than emulated hardware.
    pub simulator: bool,
    /// Device-wide calibration averages, if the description carries any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calibration: Option<Calibration>,
}

impl DeviceMetadata {
    /// Describe a 5-qubit linear-chain device (Canary-class).
    pub fn canary5(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            num_qubits: 5,
            gate_set: GateSet::ibm_basis(),
            topology: Topology::linear(5),
            max_shots: 20_000,
            backend_version: "1.0.4".into(),
            simulator: false,
            calibration: Some(Calibration::canary()),
        }
    }

    /// Describe a 7-qubit H-lattice device (Falcon r5.11H-class).
    pub fn falcon7(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            num_qubits: 7,
            gate_set: GateSet::ibm_basis(),
            topology: Topology::hex7(),
            max_shots: 32_000,
            backend_version: "1.1.2".into(),
            simulator: false,
            calibration: Some(Calibration::falcon()),
        }
    }

    /// Describe a 16-qubit heavy-hex device (Falcon r4P-class).
    pub fn falcon16(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            num_qubits: 16,
            gate_set: GateSet::ibm_basis(),
            topology: Topology::heavy_hex16(),
            max_shots: 32_000,
            backend_version: "1.2.0".into(),
            simulator: false,
            calibration: Some(Calibration::falcon()),
        }
    }

    /// Describe a 27-qubit heavy-hex device (Falcon r5.11-class).
    pub fn falcon27(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            num_qubits: 27,
            gate_set: GateSet::ibm_basis(),
            topology: Topology::heavy_hex27(),
            max_shots: 32_000,
            backend_version: "1.3.6".into(),
            simulator: false,
            calibration: Some(Calibration::falcon()),
        }
    }

    /// Describe an ideal statevector simulator with `num_qubits` qubits.
    ///
    /// Fully connected, universal gate set, no calibration data.
    pub fn statevector(num_qubits: u32) -> Self {
        Self {
            name: "statevector_simulator".into(),
            num_qubits,
            gate_set: GateSet::universal(),
            topology: Topology::full(num_qubits),
            max_shots: 100_000,
            backend_version: "1.0.0".into(),
            simulator: true,
            calibration: None,
        }
    }
}

/// Supported gate operations, split by arity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateSet {
    /// Single-qubit gates supported.
    pub single_qubit: Vec<String>,
    /// Two-qubit gates supported.
    pub two_qubit: Vec<String>,
    /// Native gates (execute without decomposition on this device).
    pub native: Vec<String>,
}

impl GateSet {
    /// IBM-style basis: `id`, `rz`, `sx`, `x` plus `cx`.
    pub fn ibm_basis() -> Self {
        Self {
            single_qubit: vec!["id".into(), "rz".into(), "sx".into(), "x".into()],
            two_qubit: vec!["cx".into()],
            native: vec![
                "id".into(),
                "rz".into(),
                "sx".into(),
                "x".into(),
                "cx".into(),
            ],
        }
    }

    /// Universal gate set for ideal simulators.
    pub fn universal() -> Self {
        Self {
            single_qubit: vec![
                "id".into(),
                "h".into(),
                "x".into(),
                "y".into(),
                "z".into(),
                "s".into(),
                "t".into(),
                "rx".into(),
                "ry".into(),
                "rz".into(),
            ],
            two_qubit: vec!["cx".into(), "cz".into(), "swap".into()],
            native: vec![],
        }
    }

    /// Flat list of every supported gate name.
    pub fn all(&self) -> Vec<&str> {
        self.single_qubit
            .iter()
            .chain(self.two_qubit.iter())
            .map(String::as_str)
            .collect()
    }
}

/// Kind of qubit connectivity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TopologyKind {
    /// Fully connected (all-to-all).
    FullyConnected,
    /// Linear chain.
    Linear,
    /// Heavy-hex lattice.
    HeavyHex,
    /// Custom topology.
    Custom,
}

/// Qubit connectivity graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topology {
    /// Kind of topology.
    pub kind: TopologyKind,
    /// Coupling edges (pairs of connected qubits). Bidirectional.
    pub edges: Vec<(u32, u32)>,
}

impl Topology {
    /// Create a linear topology.
    pub fn linear(n: u32) -> Self {
        let edges: Vec<_> = (0..n.saturating_sub(1)).map(|i| (i, i + 1)).collect();
        Self {
            kind: TopologyKind::Linear,
            edges,
        }
    }

    /// Create a fully connected topology.
    pub fn full(n: u32) -> Self {
        let mut edges = vec![];
        for i in 0..n {
            for j in (i + 1)..n {
                edges.push((i, j));
            }
        }
        Self {
            kind: TopologyKind::FullyConnected,
            edges,
        }
    }

    /// 7-qubit H-shaped lattice (two rows of three joined through the center).
    pub fn hex7() -> Self {
        Self {
            kind: TopologyKind::Custom,
            edges: vec![(0, 1), (1, 2), (1, 3), (3, 5), (4, 5), (5, 6)],
        }
    }

    /// 16-qubit heavy-hex lattice.
    pub fn heavy_hex16() -> Self {
        Self {
            kind: TopologyKind::HeavyHex,
            edges: vec![
                (0, 1),
                (1, 2),
                (1, 4),
                (2, 3),
                (3, 5),
                (4, 7),
                (5, 8),
                (6, 7),
                (7, 10),
                (8, 9),
                (8, 11),
                (10, 12),
                (11, 14),
                (12, 13),
                (12, 15),
                (13, 14),
            ],
        }
    }

    /// 27-qubit heavy-hex lattice.
    pub fn heavy_hex27() -> Self {
        Self {
            kind: TopologyKind::HeavyHex,
            edges: vec![
                (0, 1),
                (1, 2),
                (1, 4),
                (2, 3),
                (3, 5),
                (4, 7),
                (5, 8),
                (6, 7),
                (7, 10),
                (8, 9),
                (8, 11),
                (10, 12),
                (11, 14),
                (12, 13),
                (12, 15),
                (13, 14),
                (14, 16),
                (15, 18),
                (16, 19),
                (17, 18),
                (18, 21),
                (19, 20),
                (19, 22),
                (21, 23),
                (22, 25),
                (23, 24),
                (24, 25),
                (25, 26),
            ],
        }
    }

    /// Number of qubits implied by the edge list.
    pub fn num_qubits(&self) -> u32 {
        self.edges
            .iter()
            .map(|&(a, b)| a.max(b) + 1)
            .max()
            .unwrap_or(0)
    }

    /// Check whether two qubits are directly coupled (in either direction).
    pub fn connected(&self, a: u32, b: u32) -> bool {
        self.edges
            .iter()
            .any(|&(x, y)| (x, y) == (a, b) || (x, y) == (b, a))
    }
}

/// Device-wide calibration averages.
///
/// Aggregate characterization numbers suitable for display and coarse
/// routing decisions; per-qubit detail is out of scope for the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Calibration {
    /// T1 relaxation time (device average, microseconds).
    pub t1_us: f64,
    /// T2 dephasing time (device average, microseconds).
    pub t2_us: f64,
    /// Average readout error rate.
    pub readout_error: f64,
    /// Average two-qubit gate error rate.
    pub two_qubit_error: f64,
    /// When the calibration snapshot was taken, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_calibrated: Option<DateTime<Utc>>,
}

impl Calibration {
    /// Representative Canary-class calibration.
    pub fn canary() -> Self {
        Self {
            t1_us: 85.0,
            t2_us: 70.0,
            readout_error: 0.028,
            two_qubit_error: 0.011,
            last_calibrated: None,
        }
    }

    /// Representative Falcon-class calibration.
    pub fn falcon() -> Self {
        Self {
            t1_us: 120.0,
            t2_us: 95.0,
            readout_error: 0.016,
            two_qubit_error: 0.008,
            last_calibrated: None,
        }
    }
}
