//! The stand-in engine implementation.

use std::sync::Arc;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value, json};
use tracing::debug;

use skinfaxi_hal::{
    DeviceMetadata, ExecOptions, Executor, ExecutorError, ExecutorResult, MetadataCatalog, Pub,
    ResultBlob,
};

/// Default shots when neither the pub nor the options say otherwise.
const DEFAULT_SHOTS: u64 = 1024;

/// Hardware-free sampler/estimator engine.
///
/// Sampling draws uniformly random bitstrings over the device's qubits —
/// there is no circuit interpretation. Shots resolve per pub as:
/// the pub's own `shots` field, else the `default_shots` option, else the
/// instance default.
pub struct SimExecutor {
    name: String,
    catalog: Arc<MetadataCatalog>,
    default_shots: u64,
    seed: Option<u64>,
}

impl SimExecutor {
    /// Create an engine registered under `name`, resolving device metadata
    /// from `catalog`.
    pub fn new(name: impl Into<String>, catalog: Arc<MetadataCatalog>) -> Self {
        Self {
            name: name.into(),
            catalog,
            default_shots: DEFAULT_SHOTS,
            seed: None,
        }
    }

    /// Override the instance default shot count.
    pub fn with_default_shots(mut self, shots: u64) -> Self {
        self.default_shots = shots;
        self
    }

    /// Fix the sampling seed for reproducible results.
    ///
    /// A `seed_simulator` option on a job takes precedence.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn device_metadata(&self, device: &str) -> ExecutorResult<&DeviceMetadata> {
        self.catalog
            .get(device)
            .ok_or_else(|| ExecutorError::UnknownDevice(device.to_string()))
    }

    fn rng(&self, options: &ExecOptions) -> StdRng {
        let seed = options
            .get("seed_simulator")
            .and_then(Value::as_u64)
            .or(self.seed);
        match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Resolve the shot count for one pub against the device limit.
    fn resolve_shots(
        &self,
        pub_payload: &Map<String, Value>,
        options: &ExecOptions,
        device: &DeviceMetadata,
    ) -> ExecutorResult<u64> {
        let shots = pub_payload
            .get("shots")
            .and_then(Value::as_u64)
            .or_else(|| options.get("default_shots").and_then(Value::as_u64))
            .unwrap_or(self.default_shots);

        if shots == 0 {
            return Err(ExecutorError::UnsupportedOption {
                option: "shots".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if shots > device.max_shots as u64 {
            return Err(ExecutorError::UnsupportedOption {
                option: "shots".to_string(),
                reason: format!("{} exceeds device max_shots {}", shots, device.max_shots),
            });
        }
        Ok(shots)
    }

    fn as_object<'a>(index: usize, pub_payload: &'a Pub) -> ExecutorResult<&'a Map<String, Value>> {
        pub_payload.as_object().ok_or_else(|| {
            ExecutorError::MalformedPub(format!("pub {index} is not a JSON object"))
        })
    }

    fn sample_counts(rng: &mut StdRng, num_qubits: u32, shots: u64) -> Map<String, Value> {
        let mut counts: Map<String, Value> = Map::new();
        for _ in 0..shots {
            let bitstring: String = (0..num_qubits)
                .map(|_| if rng.gen_bool(0.5) { '1' } else { '0' })
                .collect();
            let entry = counts.entry(bitstring).or_insert(json!(0));
            if let Some(n) = entry.as_u64() {
                *entry = json!(n + 1);
            }
        }
        counts
    }
}

#[async_trait]
impl Executor for SimExecutor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute_sampler(
        &self,
        pubs: &[Pub],
        options: &ExecOptions,
        device: &str,
    ) -> ExecutorResult<ResultBlob> {
        let metadata = self.device_metadata(device)?;
        let mut rng = self.rng(options);

        debug!(
            "sampling {} pubs on {} ({} qubits)",
            pubs.len(),
            device,
            metadata.num_qubits
        );

        let mut results = Vec::with_capacity(pubs.len());
        for (index, pub_payload) in pubs.iter().enumerate() {
            let payload = Self::as_object(index, pub_payload)?;
            let shots = self.resolve_shots(payload, options, metadata)?;
            let counts = Self::sample_counts(&mut rng, metadata.num_qubits, shots);
            results.push(json!({
                "pub": index,
                "shots": shots,
                "counts": counts,
            }));
        }

        Ok(json!({
            "results": results,
            "metadata": {
                "device": device,
                "executor": self.name,
                "num_qubits": metadata.num_qubits,
            },
        }))
    }

    async fn execute_estimator(
        &self,
        pubs: &[Pub],
        options: &ExecOptions,
        device: &str,
    ) -> ExecutorResult<ResultBlob> {
        let metadata = self.device_metadata(device)?;

        let precision = options
            .get("default_precision")
            .and_then(Value::as_f64)
            .unwrap_or(0.015_625);

        debug!(
            "estimating {} pubs on {} (precision {})",
            pubs.len(),
            device,
            precision
        );

        let mut results = Vec::with_capacity(pubs.len());
        for (index, pub_payload) in pubs.iter().enumerate() {
            Self::as_object(index, pub_payload)?;
            results.push(json!({
                "pub": index,
                "evs": 0.0,
                "stds": 0.0,
                "precision": precision,
            }));
        }

        Ok(json!({
            "results": results,
            "metadata": {
                "device": device,
                "executor": self.name,
                "num_qubits": metadata.num_qubits,
            },
        }))
    }
}
