//! Virtual backend enumeration and metadata views.
//!
//! The provider answers the read path: enumerate every virtual backend and
//! serve configuration/properties/status views by virtual name. All views
//! derive from the metadata half only — the executor half is validated for
//! existence and then ignored, so `fake_manila@aer` and
//! `fake_manila@custatevec` report identical device data under different
//! names.

use serde::{Deserialize, Serialize};
use skinfaxi_hal::Calibration;

use crate::error::SchedResult;
use crate::router::BackendRouter;

/// One entry in the virtual backend listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualBackendDescriptor {
    /// Composite `<device>@<executor>` name.
    pub backend_name: String,
    /// Metadata half.
    pub device: String,
    /// Executor half.
    pub executor: String,
    /// Number of qubits.
    pub num_qubits: u32,
    /// Device description version.
    pub backend_version: String,
    /// Whether the device is a simulator description.
    pub simulator: bool,
}

/// Full configuration view of a virtual backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigurationView {
    /// Composite name.
    pub backend_name: String,
    /// Metadata half.
    pub device: String,
    /// Executor half.
    pub executor: String,
    /// Number of qubits.
    pub num_qubits: u32,
    /// Every supported gate name.
    pub basis_gates: Vec<String>,
    /// Bidirectional coupling edges.
    pub coupling_map: Vec<(u32, u32)>,
    /// Maximum shots per job.
    pub max_shots: u32,
    /// Whether the device is a simulator description.
    pub simulator: bool,
    /// Device description version.
    pub backend_version: String,
}

/// Calibration view of a virtual backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertiesView {
    /// Composite name.
    pub backend_name: String,
    /// Metadata half.
    pub device: String,
    /// Calibration averages, when the description carries any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calibration: Option<Calibration>,
}

/// Operational status view of a virtual backend.
///
/// Simulated devices are always operational; the interesting field is
/// `pending_jobs`, the queue depth for the executor half, which the gateway
/// fills in from the job manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusView {
    /// Composite name.
    pub backend_name: String,
    /// Whether the backend accepts work.
    pub operational: bool,
    /// Short status word.
    pub status: String,
    /// QUEUED + RUNNING jobs for the executor half.
    pub pending_jobs: usize,
    /// Device description version.
    pub backend_version: String,
}

/// Enumerates virtual backends and serves metadata views.
pub struct BackendMetadataProvider {
    router: BackendRouter,
}

impl BackendMetadataProvider {
    /// Create a provider over the given router.
    pub fn new(router: BackendRouter) -> Self {
        Self { router }
    }

    /// The router backing this provider.
    pub fn router(&self) -> &BackendRouter {
        &self.router
    }

    /// Enumerate the full catalog × registry cross product.
    ///
    /// Exactly `|catalog| × |registry|` descriptors, in catalog order with
    /// the registry's registration order nested inside.
    pub fn list_virtual_backends(&self) -> Vec<VirtualBackendDescriptor> {
        let mut descriptors =
            Vec::with_capacity(self.router.catalog().len() * self.router.executors().len());
        for device in self.router.catalog().iter() {
            for executor in self.router.executors().names() {
                descriptors.push(VirtualBackendDescriptor {
                    backend_name: format!("{}@{}", device.name, executor),
                    device: device.name.clone(),
                    executor: executor.to_string(),
                    num_qubits: device.num_qubits,
                    backend_version: device.backend_version.clone(),
                    simulator: device.simulator,
                });
            }
        }
        descriptors
    }

    /// Configuration view for a virtual backend name.
    pub fn configuration(&self, name: &str) -> SchedResult<ConfigurationView> {
        let (device, executor) = self.router.resolve(name)?;
        Ok(ConfigurationView {
            backend_name: name.to_string(),
            device: device.name.clone(),
            executor: executor.name().to_string(),
            num_qubits: device.num_qubits,
            basis_gates: device.gate_set.all().iter().map(|s| s.to_string()).collect(),
            coupling_map: device.topology.edges.clone(),
            max_shots: device.max_shots,
            simulator: device.simulator,
            backend_version: device.backend_version.clone(),
        })
    }

    /// Calibration view for a virtual backend name.
    pub fn properties(&self, name: &str) -> SchedResult<PropertiesView> {
        let (device, _executor) = self.router.resolve(name)?;
        Ok(PropertiesView {
            backend_name: name.to_string(),
            device: device.name.clone(),
            calibration: device.calibration.clone(),
        })
    }

    /// Status view for a virtual backend name.
    ///
    /// `pending_jobs` is reported as zero here; the gateway overlays the
    /// live queue depth, which belongs to the job manager.
    pub fn status(&self, name: &str) -> SchedResult<StatusView> {
        let (device, _executor) = self.router.resolve(name)?;
        Ok(StatusView {
            backend_name: name.to_string(),
            operational: true,
            status: "active".to_string(),
            pending_jobs: 0,
            backend_version: device.backend_version.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use skinfaxi_hal::{
        ExecOptions, Executor, ExecutorRegistry, ExecutorResult, MetadataCatalog, Pub, ResultBlob,
    };
    use std::sync::Arc;

    struct NullExecutor(&'static str);

    #[async_trait]
    impl Executor for NullExecutor {
        fn name(&self) -> &str {
            self.0
        }

        async fn execute_sampler(
            &self,
            _pubs: &[Pub],
            _options: &ExecOptions,
            _device: &str,
        ) -> ExecutorResult<ResultBlob> {
            Ok(serde_json::Value::Null)
        }

        async fn execute_estimator(
            &self,
            _pubs: &[Pub],
            _options: &ExecOptions,
            _device: &str,
        ) -> ExecutorResult<ResultBlob> {
            Ok(serde_json::Value::Null)
        }
    }

    fn provider_with(executors: &[&'static str]) -> BackendMetadataProvider {
        let catalog = Arc::new(MetadataCatalog::builtin(30));
        let mut registry = ExecutorRegistry::new();
        for name in executors {
            registry.register(Arc::new(NullExecutor(name))).unwrap();
        }
        BackendMetadataProvider::new(BackendRouter::new(catalog, Arc::new(registry)))
    }

    #[test]
    fn test_listing_is_full_cross_product() {
        let provider = provider_with(&["aer", "custatevec"]);
        let listing = provider.list_virtual_backends();

        let devices = provider.router().catalog().len();
        assert_eq!(listing.len(), devices * 2);

        let names: Vec<_> = listing.iter().map(|d| d.backend_name.as_str()).collect();
        assert!(names.contains(&"fake_manila@aer"));
        assert!(names.contains(&"fake_manila@custatevec"));

        // Every listed name resolves back to its halves.
        for descriptor in &listing {
            let (device, executor) = BackendRouter::parse(&descriptor.backend_name).unwrap();
            assert_eq!(device, descriptor.device);
            assert_eq!(executor, descriptor.executor);
            provider.router().resolve(&descriptor.backend_name).unwrap();
        }
    }

    #[test]
    fn test_listing_order_catalog_outer_registry_inner() {
        let provider = provider_with(&["aer", "custatevec"]);
        let listing = provider.list_virtual_backends();

        let first_device = provider.router().catalog().names()[0].to_string();
        assert_eq!(listing[0].backend_name, format!("{first_device}@aer"));
        assert_eq!(
            listing[1].backend_name,
            format!("{first_device}@custatevec")
        );
        // Second device follows only after every executor of the first.
        assert_ne!(listing[2].device, first_device);
    }

    #[test]
    fn test_views_ignore_executor_half() {
        let provider = provider_with(&["aer", "custatevec"]);

        let a = provider.configuration("fake_manila@aer").unwrap();
        let b = provider.configuration("fake_manila@custatevec").unwrap();
        assert_eq!(a.num_qubits, b.num_qubits);
        assert_eq!(a.basis_gates, b.basis_gates);
        assert_eq!(a.coupling_map, b.coupling_map);
        assert_ne!(a.backend_name, b.backend_name);
    }

    #[test]
    fn test_views_validate_both_halves() {
        let provider = provider_with(&["aer"]);
        assert!(provider.configuration("fake_manila@custatevec").is_err());
        assert!(provider.properties("fake_atlantis@aer").is_err());
        assert!(provider.status("fake_manila").is_err());
    }

    #[test]
    fn test_properties_carry_calibration() {
        let provider = provider_with(&["aer"]);
        let props = provider.properties("fake_manila@aer").unwrap();
        assert!(props.calibration.is_some());

        let props = provider.properties("statevector_simulator@aer").unwrap();
        assert!(props.calibration.is_none());
    }

    #[test]
    fn test_status_is_active() {
        let provider = provider_with(&["aer"]);
        let status = provider.status("fake_manila@aer").unwrap();
        assert!(status.operational);
        assert_eq!(status.status, "active");
        assert_eq!(status.pending_jobs, 0);
    }
}
