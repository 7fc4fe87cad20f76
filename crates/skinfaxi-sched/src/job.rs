//! Job types.
//!
//! The job state machine:
//!
//! ```text
//!   create_job() ──→ Queued ──→ Running ──→ Completed
//!                      │           │
//!                      │           └──→ Failed
//!                      │
//!                      └──→ Cancelled
//! ```
//!
//! **Invariants:**
//! - Transitions are monotonic — a job never moves backward.
//! - `Cancelled` is reachable only from `Queued`; there is no preemption.
//! - Terminal states (`Completed`, `Failed`, `Cancelled`) are permanent.
//! - The result blob is set only on `Completed`, the error string only on
//!   `Failed` and `Cancelled` (as the cancellation reason).
//!
//! Status carries no payload so that [`JobRecord::cas_status`] is a plain
//! compare-and-swap of discriminants — that swap, executed under the job
//! table lock, is the single arbiter of the cancel-vs-dispatch race.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skinfaxi_hal::{ExecOptions, Pub, ResultBlob};
use uuid::Uuid;

use crate::error::SchedError;
use crate::session::SessionId;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl JobId {
    /// Create a job ID from an existing string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh unique job ID.
    pub fn generate() -> Self {
        Self(format!("job-{}", Uuid::new_v4()))
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The primitive program a job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgramKind {
    /// Sampling workload: bitstring counts.
    Sampler,
    /// Estimation workload: expectation values.
    Estimator,
}

impl ProgramKind {
    /// Wire name of this program kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgramKind::Sampler => "sampler",
            ProgramKind::Estimator => "estimator",
        }
    }
}

impl std::str::FromStr for ProgramKind {
    type Err = SchedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sampler" => Ok(ProgramKind::Sampler),
            "estimator" => Ok(ProgramKind::Estimator),
            other => Err(SchedError::InvalidProgramKind(other.to_string())),
        }
    }
}

impl std::fmt::Display for ProgramKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Waiting in the FIFO queue.
    Queued,
    /// Currently dispatched to an executor.
    Running,
    /// Finished successfully; a result blob is stored.
    Completed,
    /// The executor reported a failure; the reason is stored.
    Failed,
    /// Cancelled before dispatch.
    Cancelled,
}

impl JobStatus {
    /// Wire name of this status.
    pub fn name(&self) -> &'static str {
        match self {
            JobStatus::Queued => "QUEUED",
            JobStatus::Running => "RUNNING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
            JobStatus::Cancelled => "CANCELLED",
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    /// Check if the job is still pending (queued or running).
    pub fn is_pending(&self) -> bool {
        matches!(self, JobStatus::Queued | JobStatus::Running)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The opaque work payload of a job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobParams {
    /// PUBs, passed through to the executor unmodified.
    #[serde(default)]
    pub pubs: Vec<Pub>,
}

impl JobParams {
    /// Wrap a list of pubs.
    pub fn from_pubs(pubs: Vec<Pub>) -> Self {
        Self { pubs }
    }
}

/// Internal job record, owned exclusively by the job manager.
#[derive(Debug)]
pub(crate) struct JobRecord {
    pub(crate) id: JobId,
    pub(crate) program: ProgramKind,
    /// The full `<device>@<executor>` name the job was created with.
    pub(crate) backend_name: String,
    /// Resolved metadata half.
    pub(crate) device: String,
    /// Resolved executor half.
    pub(crate) executor: String,
    pub(crate) params: JobParams,
    pub(crate) options: ExecOptions,
    pub(crate) session_id: Option<SessionId>,
    pub(crate) status: JobStatus,
    pub(crate) result: Option<ResultBlob>,
    pub(crate) error: Option<String>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) started_at: Option<DateTime<Utc>>,
    pub(crate) finished_at: Option<DateTime<Utc>>,
    /// Insertion sequence; `list_jobs` reports creation order by this.
    pub(crate) seq: u64,
}

impl JobRecord {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: JobId,
        program: ProgramKind,
        backend_name: String,
        device: String,
        executor: String,
        params: JobParams,
        options: ExecOptions,
        session_id: Option<SessionId>,
        seq: u64,
    ) -> Self {
        Self {
            id,
            program,
            backend_name,
            device,
            executor,
            params,
            options,
            session_id,
            status: JobStatus::Queued,
            result: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            seq,
        }
    }

    /// Atomically (under the table lock) swap `from` → `to`.
    ///
    /// Returns `false` and changes nothing when the current status is not
    /// `from`. Timestamps follow the transition: entering `Running` stamps
    /// `started_at`, entering any terminal state stamps `finished_at`.
    pub(crate) fn cas_status(&mut self, from: JobStatus, to: JobStatus) -> bool {
        if self.status != from {
            return false;
        }
        self.status = to;
        if to == JobStatus::Running && self.started_at.is_none() {
            self.started_at = Some(Utc::now());
        }
        if to.is_terminal() && self.finished_at.is_none() {
            self.finished_at = Some(Utc::now());
        }
        true
    }

    /// Point-in-time copy for callers.
    pub(crate) fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            id: self.id.clone(),
            program: self.program,
            backend_name: self.backend_name.clone(),
            device: self.device.clone(),
            executor: self.executor.clone(),
            session_id: self.session_id.clone(),
            status: self.status,
            result: self.result.clone(),
            error: self.error.clone(),
            created_at: self.created_at,
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }
}

/// Point-in-time view of a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSnapshot {
    /// Job ID.
    pub id: JobId,
    /// Program kind.
    pub program: ProgramKind,
    /// Virtual backend name the job was created with.
    pub backend_name: String,
    /// Metadata half.
    pub device: String,
    /// Executor half.
    pub executor: String,
    /// Session the job is attached to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    /// Status at snapshot time.
    pub status: JobStatus,
    /// Result blob (only when `Completed`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultBlob>,
    /// Failure or cancellation reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Time the job was accepted.
    pub created_at: DateTime<Utc>,
    /// Time the job was dispatched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// Time the job reached a terminal state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

/// Filters for listing jobs. Empty filter matches everything.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    /// Match the full virtual backend name.
    pub backend: Option<String>,
    /// Match the program kind.
    pub program: Option<ProgramKind>,
    /// Match the status.
    pub status: Option<JobStatus>,
    /// Match the owning session.
    pub session: Option<SessionId>,
}

impl JobFilter {
    /// Filter matching every job.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to a virtual backend name.
    pub fn backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = Some(backend.into());
        self
    }

    /// Restrict to a program kind.
    pub fn program(mut self, program: ProgramKind) -> Self {
        self.program = Some(program);
        self
    }

    /// Restrict to a status.
    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restrict to a session.
    pub fn session(mut self, session: SessionId) -> Self {
        self.session = Some(session);
        self
    }

    pub(crate) fn matches(&self, record: &JobRecord) -> bool {
        if let Some(backend) = &self.backend {
            if record.backend_name != *backend {
                return false;
            }
        }
        if let Some(program) = self.program {
            if record.program != program {
                return false;
            }
        }
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        if let Some(session) = &self.session {
            if record.session_id.as_ref() != Some(session) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, seq: u64) -> JobRecord {
        JobRecord::new(
            JobId::new(id),
            ProgramKind::Sampler,
            "fake_manila@aer".into(),
            "fake_manila".into(),
            "aer".into(),
            JobParams::default(),
            ExecOptions::new(),
            None,
            seq,
        )
    }

    #[test]
    fn test_program_kind_parse() {
        assert_eq!("sampler".parse::<ProgramKind>().unwrap(), ProgramKind::Sampler);
        assert_eq!(
            "estimator".parse::<ProgramKind>().unwrap(),
            ProgramKind::Estimator
        );
        assert!(matches!(
            "oracle".parse::<ProgramKind>(),
            Err(SchedError::InvalidProgramKind(s)) if s == "oracle"
        ));
    }

    #[test]
    fn test_status_terminal() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_cas_status_forward_only() {
        let mut rec = record("job-1", 0);
        assert!(rec.cas_status(JobStatus::Queued, JobStatus::Running));
        assert_eq!(rec.status, JobStatus::Running);
        assert!(rec.started_at.is_some());

        // Stale expectation fails and changes nothing.
        assert!(!rec.cas_status(JobStatus::Queued, JobStatus::Cancelled));
        assert_eq!(rec.status, JobStatus::Running);

        assert!(rec.cas_status(JobStatus::Running, JobStatus::Completed));
        assert!(rec.finished_at.is_some());
        assert!(!rec.cas_status(JobStatus::Completed, JobStatus::Running));
    }

    #[test]
    fn test_cancel_only_from_queued() {
        let mut rec = record("job-1", 0);
        assert!(rec.cas_status(JobStatus::Queued, JobStatus::Cancelled));

        let mut rec = record("job-2", 1);
        rec.cas_status(JobStatus::Queued, JobStatus::Running);
        assert!(!rec.cas_status(JobStatus::Queued, JobStatus::Cancelled));
    }

    #[test]
    fn test_filter_matches() {
        let rec = record("job-1", 0);
        assert!(JobFilter::all().matches(&rec));
        assert!(JobFilter::all().backend("fake_manila@aer").matches(&rec));
        assert!(!JobFilter::all().backend("fake_lima@aer").matches(&rec));
        assert!(JobFilter::all().program(ProgramKind::Sampler).matches(&rec));
        assert!(!JobFilter::all().program(ProgramKind::Estimator).matches(&rec));
        assert!(JobFilter::all().status(JobStatus::Queued).matches(&rec));
        assert!(
            !JobFilter::all()
                .session(SessionId::new("session-x"))
                .matches(&rec)
        );
    }

    #[test]
    fn test_status_serde_wire_names() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Queued).unwrap(),
            "\"QUEUED\""
        );
        assert_eq!(
            serde_json::to_string(&ProgramKind::Sampler).unwrap(),
            "\"sampler\""
        );
    }
}
