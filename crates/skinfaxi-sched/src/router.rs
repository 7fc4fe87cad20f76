//! Virtual backend naming and resolution.
//!
//! A virtual backend is addressed as `<device>@<executor>` — one hardware
//! description from the catalog paired with one execution engine from the
//! registry. The name is a derived value, never stored: [`BackendRouter`]
//! composes and parses it on demand and resolves both halves against the
//! immutable collections.
//!
//! The split is on the **first** `@`. Since neither collection admits names
//! containing `@`, a name with more than one separator simply fails to
//! resolve on its executor half.

use std::sync::Arc;

use skinfaxi_hal::{DeviceMetadata, Executor, ExecutorRegistry, MetadataCatalog};

use crate::error::{SchedError, SchedResult};

/// The virtual backend name separator.
pub const SEPARATOR: char = '@';

/// Resolves `<device>@<executor>` names against the catalog and registry.
#[derive(Clone)]
pub struct BackendRouter {
    catalog: Arc<MetadataCatalog>,
    executors: Arc<ExecutorRegistry>,
}

impl BackendRouter {
    /// Create a router over the given collections.
    pub fn new(catalog: Arc<MetadataCatalog>, executors: Arc<ExecutorRegistry>) -> Self {
        Self { catalog, executors }
    }

    /// The catalog this router resolves against.
    pub fn catalog(&self) -> &MetadataCatalog {
        &self.catalog
    }

    /// The registry this router resolves against.
    pub fn executors(&self) -> &ExecutorRegistry {
        &self.executors
    }

    /// Join a device name and an executor name into a virtual backend name.
    ///
    /// Fails when either half already contains the separator; does not
    /// check existence.
    pub fn compose(device: &str, executor: &str) -> SchedResult<String> {
        if device.contains(SEPARATOR) {
            return Err(SchedError::ReservedSeparator(device.to_string()));
        }
        if executor.contains(SEPARATOR) {
            return Err(SchedError::ReservedSeparator(executor.to_string()));
        }
        Ok(format!("{device}{SEPARATOR}{executor}"))
    }

    /// Split a virtual backend name on the first separator.
    ///
    /// Fails when no separator is present; does not check existence.
    pub fn parse(name: &str) -> SchedResult<(&str, &str)> {
        name.split_once(SEPARATOR)
            .ok_or_else(|| SchedError::MalformedBackendName(name.to_string()))
    }

    /// Parse a name and look up both halves.
    ///
    /// The error names the specific missing half.
    pub fn resolve(&self, name: &str) -> SchedResult<(&DeviceMetadata, Arc<dyn Executor>)> {
        let (device, executor) = Self::parse(name)?;
        let metadata = self
            .catalog
            .get(device)
            .ok_or_else(|| SchedError::UnknownDevice(device.to_string()))?;
        let engine = self
            .executors
            .get(executor)
            .ok_or_else(|| SchedError::UnknownExecutor(executor.to_string()))?;
        Ok((metadata, engine))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use skinfaxi_hal::{ExecOptions, ExecutorResult, Pub, ResultBlob};

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

    fn router_with(executors: &[&'static str]) -> BackendRouter {
        let catalog = Arc::new(MetadataCatalog::builtin(30));
        let mut registry = ExecutorRegistry::new();
        for name in executors {
            registry.register(Arc::new(NullExecutor(name))).unwrap();
        }
        BackendRouter::new(catalog, Arc::new(registry))
    }

    #[test]
    fn test_compose_parse_roundtrip() {
        let name = BackendRouter::compose("fake_manila", "aer").unwrap();
        assert_eq!(name, "fake_manila@aer");
        assert_eq!(
            BackendRouter::parse(&name).unwrap(),
            ("fake_manila", "aer")
        );
    }

    #[test]
    fn test_compose_rejects_separator_in_halves() {
        assert!(matches!(
            BackendRouter::compose("fake@manila", "aer"),
            Err(SchedError::ReservedSeparator(s)) if s == "fake@manila"
        ));
        assert!(matches!(
            BackendRouter::compose("fake_manila", "a@er"),
            Err(SchedError::ReservedSeparator(_))
        ));
    }

    #[test]
    fn test_parse_requires_separator() {
        assert!(matches!(
            BackendRouter::parse("fake_manila"),
            Err(SchedError::MalformedBackendName(s)) if s == "fake_manila"
        ));
    }

    #[test]
    fn test_parse_splits_on_first_separator() {
        // The second '@' lands in the executor half and fails at resolve
        // time, not parse time.
        assert_eq!(BackendRouter::parse("a@b@c").unwrap(), ("a", "b@c"));
    }

    #[test]
    fn test_resolve_known_pair() {
        let router = router_with(&["aer"]);
        let (metadata, engine) = router.resolve("fake_manila@aer").unwrap();
        assert_eq!(metadata.name, "fake_manila");
        assert_eq!(engine.name(), "aer");
    }

    #[test]
    fn test_resolve_names_missing_half() {
        let router = router_with(&["aer"]);

        let err = router.resolve("fake_manila@custatevec").unwrap_err();
        assert_eq!(err.to_string(), "unknown executor: custatevec");

        let err = router.resolve("fake_atlantis@aer").unwrap_err();
        assert_eq!(err.to_string(), "unknown metadata: fake_atlantis");
    }

    #[test]
    fn test_resolve_checks_device_before_executor() {
        // Both halves unknown: the metadata half wins.
        let router = router_with(&["aer"]);
        let err = router.resolve("nope@nope").unwrap_err();
        assert!(matches!(err, SchedError::UnknownDevice(d) if d == "nope"));
    }
}
