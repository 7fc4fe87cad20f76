//! Skinfaxi job scheduling and virtual-backend routing
//!
//! This crate is the core of the gateway: it names and enumerates
//! `(device, executor)` pairs as addressable *virtual backends*, accepts
//! and queues jobs against them, and groups jobs into sessions with
//! admission control.
//!
//! # Architecture
//!
//! ```text
//!                 ┌────────────────────┐
//!   read path ──→ │ MetadataProvider   │──→ catalog × registry views
//!                 └─────────┬──────────┘
//!                           │ BackendRouter (compose / parse / resolve)
//!                 ┌─────────┴──────────┐
//!   create_job ──→│ JobManager         │──→ FIFO queue ──→ single worker
//!                 └─────────┬──────────┘                      │
//!                           │ admission                       ▼
//!                 ┌─────────┴──────────┐              Executor::execute_*
//!                 │ SessionManager     │              (bare device name)
//!                 └────────────────────┘
//! ```
//!
//! One worker owns execution: jobs run strictly in FIFO order of
//! acceptance, one at a time, across the whole process. Acceptance is
//! non-blocking — `create_job` returns a job ID immediately and results
//! are fetched later. Cancellation is only effective before dispatch;
//! a running job is never preempted.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use skinfaxi_hal::{ExecutorRegistry, MetadataCatalog};
//! use skinfaxi_sched::{Gateway, JobParams};
//! use skinfaxi_adapter_sim::SimExecutor;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let catalog = Arc::new(MetadataCatalog::builtin(30));
//!     let mut registry = ExecutorRegistry::new();
//!     registry.register(Arc::new(SimExecutor::new("aer", Arc::clone(&catalog))))?;
//!
//!     let gateway = Gateway::new(catalog, registry);
//!
//!     let job = gateway.create_job(
//!         "sampler",
//!         "fake_manila@aer",
//!         JobParams::from_pubs(vec![serde_json::json!({ "shots": 1024 })]),
//!         Default::default(),
//!         None,
//!     )?;
//!
//!     // Poll for the result.
//!     let status = gateway.job_status(&job)?;
//!     println!("{}: {}", job, status.status);
//!
//!     gateway.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod gateway;
pub mod job;
pub mod manager;
pub mod provider;
pub mod router;
pub mod session;

pub use error::{ErrorKind, SchedError, SchedResult};
pub use gateway::Gateway;
pub use job::{JobFilter, JobId, JobParams, JobSnapshot, JobStatus, ProgramKind};
pub use manager::JobManager;
pub use provider::{
    BackendMetadataProvider, ConfigurationView, PropertiesView, StatusView,
    VirtualBackendDescriptor,
};
pub use router::{BackendRouter, SEPARATOR};
pub use session::{SessionId, SessionManager, SessionMode, SessionSnapshot};
