//! Job lifecycle management and the single sequential worker.
//!
//! The [`JobManager`] owns every job record and the FIFO queue. Accepting a
//! job is non-blocking: `create_job` resolves the virtual backend name,
//! clears session admission, inserts the record as QUEUED, pushes the ID on
//! a channel, and returns. A single worker task drains the channel and
//! dispatches to the resolved executor, so at most one executor invocation
//! is in flight system-wide at any instant. That serialization is the
//! point: engines may share a simulation device, and strict FIFO keeps
//! execution order trivial to reason about. Throughput is traded away
//! knowingly.
//!
//! The cancel-vs-dispatch race is arbitrated by a compare-and-swap on the
//! status field ([`JobRecord::cas_status`]) under the table lock: cancel
//! attempts `QUEUED → CANCELLED`, the worker attempts `QUEUED → RUNNING`,
//! and whichever lands first wins. The lock is never held across an
//! executor call.
//!
//! There is no per-job timeout. An executor call that never returns stalls
//! the entire queue; the gateway deliberately defines no recovery for that.

use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;
use skinfaxi_hal::{ExecOptions, ExecutorError, ExecutorRegistry, Pub};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::{SchedError, SchedResult};
use crate::job::{JobFilter, JobId, JobParams, JobRecord, JobSnapshot, JobStatus, ProgramKind};
use crate::router::BackendRouter;
use crate::session::{SessionId, SessionManager};

struct JobTable {
    jobs: FxHashMap<JobId, JobRecord>,
    next_seq: u64,
}

/// What the worker needs to dispatch one job, copied out under the lock.
struct Dispatch {
    program: ProgramKind,
    device: String,
    executor: String,
    pubs: Vec<Pub>,
    options: ExecOptions,
}

/// Owns job state, the FIFO queue, and the worker task.
pub struct JobManager {
    router: BackendRouter,
    executors: Arc<ExecutorRegistry>,
    sessions: Arc<SessionManager>,
    table: Mutex<JobTable>,
    queue_tx: mpsc::UnboundedSender<JobId>,
    /// Taken by the worker on start.
    queue_rx: Mutex<Option<mpsc::UnboundedReceiver<JobId>>>,
    shutdown_tx: watch::Sender<bool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl JobManager {
    /// Create a manager. The worker is not running until [`start`](Self::start).
    pub fn new(
        router: BackendRouter,
        executors: Arc<ExecutorRegistry>,
        sessions: Arc<SessionManager>,
    ) -> Arc<Self> {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, _) = watch::channel(false);

        Arc::new(Self {
            router,
            executors,
            sessions,
            table: Mutex::new(JobTable {
                jobs: FxHashMap::default(),
                next_seq: 0,
            }),
            queue_tx,
            queue_rx: Mutex::new(Some(queue_rx)),
            shutdown_tx,
            worker: Mutex::new(None),
        })
    }

    /// Spawn the worker task. Idempotent; a second call is a no-op.
    pub fn start(self: &Arc<Self>) {
        let Some(queue_rx) = self.queue_rx.lock().expect("queue receiver poisoned").take() else {
            warn!("job worker already started");
            return;
        };
        let shutdown_rx = self.shutdown_tx.subscribe();
        let manager = Arc::clone(self);
        let handle = tokio::spawn(manager.worker_loop(queue_rx, shutdown_rx));
        *self.worker.lock().expect("worker handle poisoned") = Some(handle);
        info!("job worker started");
    }

    /// Accept a job against a virtual backend, optionally inside a session.
    ///
    /// Returns the job ID as soon as the job is queued; execution happens
    /// later on the worker. Errors out synchronously on an unresolvable
    /// backend name or a refused session admission.
    pub fn create_job(
        &self,
        program: ProgramKind,
        backend_name: &str,
        params: JobParams,
        options: ExecOptions,
        session_id: Option<SessionId>,
    ) -> SchedResult<JobId> {
        if *self.shutdown_tx.borrow() || self.queue_tx.is_closed() {
            return Err(SchedError::ShutDown);
        }

        let (device, executor) = {
            let (metadata, engine) = self.router.resolve(backend_name)?;
            (metadata.name.clone(), engine.name().to_string())
        };

        let id = JobId::generate();

        if let Some(session) = &session_id {
            self.sessions.attach(session, &id, &device)?;
        }

        {
            let mut table = self.table.lock().expect("job table poisoned");
            let seq = table.next_seq;
            table.next_seq += 1;
            let record = JobRecord::new(
                id.clone(),
                program,
                backend_name.to_string(),
                device,
                executor,
                params,
                options,
                session_id.clone(),
                seq,
            );
            table.jobs.insert(id.clone(), record);
        }

        if self.queue_tx.send(id.clone()).is_err() {
            // Worker already gone; withdraw the record.
            let mut table = self.table.lock().expect("job table poisoned");
            table.jobs.remove(&id);
            return Err(SchedError::ShutDown);
        }

        info!(
            "job created and queued: {} (backend: {}, session: {})",
            id,
            backend_name,
            session_id.as_ref().map(|s| s.0.as_str()).unwrap_or("none"),
        );
        Ok(id)
    }

    /// Point-in-time view of a job.
    pub fn get_job(&self, id: &JobId) -> SchedResult<JobSnapshot> {
        let table = self.table.lock().expect("job table poisoned");
        table
            .jobs
            .get(id)
            .map(JobRecord::snapshot)
            .ok_or_else(|| SchedError::JobNotFound(id.to_string()))
    }

    /// Jobs matching the filter, in creation order.
    pub fn list_jobs(&self, filter: &JobFilter) -> Vec<JobSnapshot> {
        let table = self.table.lock().expect("job table poisoned");
        let mut matched: Vec<&JobRecord> =
            table.jobs.values().filter(|r| filter.matches(r)).collect();
        matched.sort_by_key(|r| r.seq);
        matched.iter().map(|r| r.snapshot()).collect()
    }

    /// Cancel a job that is still QUEUED.
    ///
    /// Race-free against the worker: both sides go through the same
    /// compare-and-swap under the table lock. A job the worker has already
    /// claimed (RUNNING) or that reached a terminal state cannot be
    /// cancelled.
    pub fn cancel_job(&self, id: &JobId) -> SchedResult<()> {
        let mut table = self.table.lock().expect("job table poisoned");
        let record = table
            .jobs
            .get_mut(id)
            .ok_or_else(|| SchedError::JobNotFound(id.to_string()))?;

        if record.cas_status(JobStatus::Queued, JobStatus::Cancelled) {
            record.error = Some("cancelled by user".to_string());
            info!("job cancelled: {}", id);
            Ok(())
        } else {
            Err(SchedError::CancelConflict {
                id: id.to_string(),
                status: record.status.name(),
            })
        }
    }

    /// Cancel every still-QUEUED job attached to `session`.
    ///
    /// Jobs already RUNNING or terminal are left untouched. Returns the
    /// number of jobs cancelled.
    pub fn cancel_session_jobs(&self, session: &SessionId) -> usize {
        let mut table = self.table.lock().expect("job table poisoned");
        let mut cancelled = 0;
        for record in table.jobs.values_mut() {
            if record.session_id.as_ref() == Some(session)
                && record.cas_status(JobStatus::Queued, JobStatus::Cancelled)
            {
                record.error = Some("cancelled on session close".to_string());
                cancelled += 1;
            }
        }
        info!("cancelled {} jobs from session {}", cancelled, session);
        cancelled
    }

    /// Number of QUEUED + RUNNING jobs, optionally for one executor half.
    pub fn queue_depth(&self, executor: Option<&str>) -> usize {
        let table = self.table.lock().expect("job table poisoned");
        table
            .jobs
            .values()
            .filter(|r| r.status.is_pending())
            .filter(|r| executor.is_none_or(|name| r.executor == name))
            .count()
    }

    /// Signal the worker to stop, cancel the queued tail, and join.
    ///
    /// A job that is RUNNING when the signal lands finishes normally; every
    /// job still QUEUED is transitioned to CANCELLED.
    pub async fn shutdown(&self) {
        info!("shutting down job manager");
        // send_replace updates the flag even when the worker was never
        // started and no receiver exists.
        self.shutdown_tx.send_replace(true);

        let handle = self.worker.lock().expect("worker handle poisoned").take();
        if let Some(handle) = handle {
            if handle.await.is_err() {
                error!("job worker panicked during shutdown");
            }
        }

        // Covers the never-started case; otherwise the worker has already
        // drained, and every CAS here fails harmlessly.
        let cancelled = self.cancel_pending("cancelled on shutdown");
        if cancelled > 0 {
            info!("cancelled {} queued jobs on shutdown", cancelled);
        }
    }

    fn cancel_pending(&self, reason: &str) -> usize {
        let mut table = self.table.lock().expect("job table poisoned");
        let mut cancelled = 0;
        for record in table.jobs.values_mut() {
            if record.cas_status(JobStatus::Queued, JobStatus::Cancelled) {
                record.error = Some(reason.to_string());
                cancelled += 1;
            }
        }
        cancelled
    }

    async fn worker_loop(
        self: Arc<Self>,
        mut queue_rx: mpsc::UnboundedReceiver<JobId>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        info!("worker loop started");

        loop {
            let job_id = tokio::select! {
                biased;
                _ = shutdown_rx.changed() => break,
                received = queue_rx.recv() => match received {
                    Some(id) => id,
                    None => break,
                },
            };

            debug!("worker picked up job: {}", job_id);
            self.run_one(&job_id).await;
        }

        let cancelled = self.cancel_pending("cancelled on shutdown");
        info!("worker loop stopped ({} queued jobs cancelled)", cancelled);
    }

    /// Execute a single job. Never propagates executor failures — they are
    /// absorbed into the job's FAILED state and the loop moves on.
    async fn run_one(&self, job_id: &JobId) {
        let dispatch = {
            let mut table = self.table.lock().expect("job table poisoned");
            let Some(record) = table.jobs.get_mut(job_id) else {
                error!("queued job has no record: {}", job_id);
                return;
            };
            // Lost the CAS race to a cancellation.
            if !record.cas_status(JobStatus::Queued, JobStatus::Running) {
                debug!("job {} was cancelled, skipping execution", job_id);
                return;
            }
            Dispatch {
                program: record.program,
                device: record.device.clone(),
                executor: record.executor.clone(),
                pubs: record.params.pubs.clone(),
                options: record.options.clone(),
            }
        };

        info!(
            "executing job {}: {} on {} via {}",
            job_id, dispatch.program, dispatch.device, dispatch.executor
        );

        // The executor gets the bare device name, never the virtual name.
        let outcome = match self.executors.get(&dispatch.executor) {
            Some(engine) => match dispatch.program {
                ProgramKind::Sampler => {
                    engine
                        .execute_sampler(&dispatch.pubs, &dispatch.options, &dispatch.device)
                        .await
                }
                ProgramKind::Estimator => {
                    engine
                        .execute_estimator(&dispatch.pubs, &dispatch.options, &dispatch.device)
                        .await
                }
            },
            None => Err(ExecutorError::Execution(format!(
                "executor not registered: {}",
                dispatch.executor
            ))),
        };

        let mut table = self.table.lock().expect("job table poisoned");
        let Some(record) = table.jobs.get_mut(job_id) else {
            return;
        };
        match outcome {
            Ok(blob) => {
                record.cas_status(JobStatus::Running, JobStatus::Completed);
                record.result = Some(blob);
                info!("job completed: {}", job_id);
            }
            Err(err) => {
                record.cas_status(JobStatus::Running, JobStatus::Failed);
                record.error = Some(err.to_string());
                error!("job failed: {}: {}", job_id, err);
            }
        }
    }
}
