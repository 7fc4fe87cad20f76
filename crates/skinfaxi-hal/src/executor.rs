//! Execution-engine trait and payload types.
//!
//! An [`Executor`] is a pluggable engine capable of running sampler and
//! estimator workloads. The gateway treats work payloads as opaque: a PUB
//! (primitive unified bloc — circuit, parameters, shot count) passes through
//! unmodified as a [`Pub`] JSON value, and whatever the engine returns is
//! stored unmodified as a [`ResultBlob`].
//!
//! # Contract
//!
//! - The `device` argument is always the bare metadata name (e.g.
//!   `fake_manila`), never the `@`-joined virtual backend name.
//! - Implementations must not assume any particular device metadata beyond
//!   what they explicitly look up.
//! - Implementations should not block forever under correct operation; the
//!   gateway enforces no timeout and a hung call stalls the whole queue.
//! - Errors are captured verbatim as the job's failure reason; they never
//!   reach the submitting caller directly.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

/// An opaque unit-of-work payload, passed through unmodified.
pub type Pub = serde_json::Value;

/// Free-form, string-keyed execution options.
pub type ExecOptions = serde_json::Map<String, serde_json::Value>;

/// An opaque execution result payload.
pub type ResultBlob = serde_json::Value;

/// Errors an execution engine may raise.
///
/// The set is open-ended by design — the worker only ever records the
/// display string — but common refusals get structured variants.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExecutorError {
    /// A pub payload could not be interpreted.
    #[error("malformed pub: {0}")]
    MalformedPub(String),

    /// The device metadata this engine was asked about does not exist.
    #[error("unknown device: {0}")]
    UnknownDevice(String),

    /// An option was recognized but its value is unusable.
    #[error("unsupported option {option}: {reason}")]
    UnsupportedOption { option: String, reason: String },

    /// Engine-internal failure.
    #[error("execution failed: {0}")]
    Execution(String),
}

/// Result type for executor operations.
pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Trait for pluggable execution engines.
///
/// One instance per registry entry; implementations hold no mutable state
/// shared with the gateway. Both execute methods receive the pubs, the
/// job's options map, and the metadata name of the device the virtual
/// backend was addressed with.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Registry key for this engine (e.g. `"aer"`). Must not contain `@`.
    fn name(&self) -> &str;

    /// Execute a sampler workload.
    async fn execute_sampler(
        &self,
        pubs: &[Pub],
        options: &ExecOptions,
        device: &str,
    ) -> ExecutorResult<ResultBlob>;

    /// Execute an estimator workload.
    async fn execute_estimator(
        &self,
        pubs: &[Pub],
        options: &ExecOptions,
        device: &str,
    ) -> ExecutorResult<ResultBlob>;
}

impl fmt::Debug for dyn Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor").field("name", &self.name()).finish()
    }
}
