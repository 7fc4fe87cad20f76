//! The gateway facade.
//!
//! [`Gateway`] wires the whole core together — catalog, registry, router,
//! provider, session manager, job manager — starts the worker, and exposes
//! the operations an API layer calls with already-deserialized input.
//! String-typed fields (`program_id`, `mode`, session IDs) are parsed here,
//! so the managers only ever see typed values.

use std::sync::Arc;

use tracing::info;

use skinfaxi_hal::{ExecOptions, ExecutorRegistry, MetadataCatalog, ResultBlob};

use crate::error::{SchedError, SchedResult};
use crate::job::{JobFilter, JobId, JobParams, JobSnapshot, JobStatus};
use crate::manager::JobManager;
use crate::provider::{
    BackendMetadataProvider, ConfigurationView, PropertiesView, StatusView,
    VirtualBackendDescriptor,
};
use crate::router::BackendRouter;
use crate::session::{SessionId, SessionManager, SessionSnapshot};

/// The assembled scheduling core.
pub struct Gateway {
    provider: BackendMetadataProvider,
    sessions: Arc<SessionManager>,
    jobs: Arc<JobManager>,
}

impl Gateway {
    /// Assemble the core over a catalog and a registry, and start the
    /// worker. Must be called within a tokio runtime.
    ///
    /// The catalog is shared — executors that consult device metadata hold
    /// a clone of the same `Arc`.
    pub fn new(catalog: Arc<MetadataCatalog>, executors: ExecutorRegistry) -> Arc<Self> {
        let executors = Arc::new(executors);
        let router = BackendRouter::new(Arc::clone(&catalog), Arc::clone(&executors));
        let provider = BackendMetadataProvider::new(router.clone());
        let sessions = Arc::new(SessionManager::new());
        let jobs = JobManager::new(router, executors, Arc::clone(&sessions));
        jobs.start();

        info!(
            "gateway ready: {} devices x {} executors = {} virtual backends",
            catalog.len(),
            provider.router().executors().len(),
            catalog.len() * provider.router().executors().len(),
        );

        Arc::new(Self {
            provider,
            sessions,
            jobs,
        })
    }

    /// The metadata provider (read path).
    pub fn provider(&self) -> &BackendMetadataProvider {
        &self.provider
    }

    /// The job manager.
    pub fn jobs(&self) -> &JobManager {
        &self.jobs
    }

    /// The session manager.
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    // ── Backends (read path) ────────────────────────────────────────────

    /// Every virtual backend, catalog order outer, registry order inner.
    pub fn list_backends(&self) -> Vec<VirtualBackendDescriptor> {
        self.provider.list_virtual_backends()
    }

    /// Configuration view by virtual name.
    pub fn backend_configuration(&self, name: &str) -> SchedResult<ConfigurationView> {
        self.provider.configuration(name)
    }

    /// Calibration view by virtual name.
    pub fn backend_properties(&self, name: &str) -> SchedResult<PropertiesView> {
        self.provider.properties(name)
    }

    /// Status view by virtual name, with the live queue depth for the
    /// executor half overlaid.
    pub fn backend_status(&self, name: &str) -> SchedResult<StatusView> {
        let mut view = self.provider.status(name)?;
        let (_, executor) = BackendRouter::parse(name)?;
        view.pending_jobs = self.jobs.queue_depth(Some(executor));
        Ok(view)
    }

    // ── Jobs ────────────────────────────────────────────────────────────

    /// Accept a job. `program_id` must be `sampler` or `estimator`.
    pub fn create_job(
        &self,
        program_id: &str,
        backend_name: &str,
        params: JobParams,
        options: ExecOptions,
        session_id: Option<&str>,
    ) -> SchedResult<JobId> {
        let program = program_id.parse()?;
        let session = session_id.map(SessionId::from);
        self.jobs
            .create_job(program, backend_name, params, options, session)
    }

    /// Point-in-time view of a job.
    pub fn job_status(&self, id: &JobId) -> SchedResult<JobSnapshot> {
        self.jobs.get_job(id)
    }

    /// The result blob of a COMPLETED job; any other status conflicts.
    pub fn job_results(&self, id: &JobId) -> SchedResult<ResultBlob> {
        let snapshot = self.jobs.get_job(id)?;
        match (snapshot.status, snapshot.result) {
            (JobStatus::Completed, Some(blob)) => Ok(blob),
            (status, _) => Err(SchedError::ResultsUnavailable {
                id: id.to_string(),
                status: status.name(),
            }),
        }
    }

    /// Cancel a still-QUEUED job.
    pub fn cancel_job(&self, id: &JobId) -> SchedResult<()> {
        self.jobs.cancel_job(id)
    }

    /// Jobs matching the filter, in creation order.
    pub fn list_jobs(&self, filter: &JobFilter) -> Vec<JobSnapshot> {
        self.jobs.list_jobs(filter)
    }

    // ── Sessions ────────────────────────────────────────────────────────

    /// Create a session against a virtual backend name.
    ///
    /// The name is resolved first (both halves must exist); the session
    /// stores the device half as its target.
    pub fn create_session(
        &self,
        mode: &str,
        backend_name: &str,
        max_ttl_secs: Option<u64>,
    ) -> SchedResult<SessionSnapshot> {
        let mode = mode.parse()?;
        let device = {
            let (metadata, _) = self.provider.router().resolve(backend_name)?;
            metadata.name.clone()
        };
        let id = self.sessions.create_session(mode, device, max_ttl_secs)?;
        self.sessions.get_session(&id)
    }

    /// Point-in-time view of a session (lazy TTL expiry applied).
    pub fn get_session(&self, id: &SessionId) -> SchedResult<SessionSnapshot> {
        self.sessions.get_session(id)
    }

    /// Update a session's admission gate (one-way).
    pub fn update_session(
        &self,
        id: &SessionId,
        accepting_jobs: bool,
    ) -> SchedResult<SessionSnapshot> {
        self.sessions.update(id, accepting_jobs)
    }

    /// Close a session and cascade: every attached job still QUEUED at
    /// this moment is cancelled; RUNNING and terminal jobs are untouched.
    /// Returns the number of jobs cancelled.
    pub fn close_session(&self, id: &SessionId) -> SchedResult<usize> {
        self.sessions.close(id)?;
        let cancelled = self.jobs.cancel_session_jobs(id);
        info!("session {} closed ({} jobs cancelled)", id, cancelled);
        Ok(cancelled)
    }

    /// All sessions in creation order.
    pub fn list_sessions(&self) -> Vec<SessionSnapshot> {
        self.sessions.list_sessions()
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Stop the worker: the queued tail is cancelled, a running job
    /// finishes, and the worker task is joined.
    pub async fn shutdown(&self) {
        self.jobs.shutdown().await;
        info!("gateway shut down");
    }
}
