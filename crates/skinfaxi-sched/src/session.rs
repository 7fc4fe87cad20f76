//! Session lifecycle and admission control.
//!
//! A session groups jobs targeting one device and gates their admission.
//! Two flags drive the lifecycle, and both are one-way:
//!
//! - `accepting_jobs`: `true → false` only. Closing the admission gate is
//!   permanent.
//! - `active`: `true → false` only, via an explicit close or — lazily — a
//!   `max_ttl` that has elapsed. Expiry is evaluated on read; there is no
//!   background timer, and an expired session is never deleted, only
//!   reported inactive.
//!
//! Sessions hold job IDs as back-references only. The job manager remains
//! the single source of truth for job state; the cascade on close is driven
//! from outside (see the gateway).

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{SchedError, SchedResult};
use crate::job::JobId;

/// Unique identifier for a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Create a session ID from an existing string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh unique session ID.
    pub fn generate() -> Self {
        Self(format!("session-{}", Uuid::new_v4()))
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Execution mode of a session.
///
/// Both modes share the same queue and worker; the mode is surfaced to
/// callers as intent metadata (sequential vs. independent jobs) and does
/// not select a scheduling discipline. A per-mode discipline would be an
/// extension, not a bug fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// Jobs are expected to run as one sequential block.
    Dedicated,
    /// Jobs are independent and merely grouped.
    Batch,
}

impl SessionMode {
    /// Wire name of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Dedicated => "dedicated",
            SessionMode::Batch => "batch",
        }
    }
}

impl std::str::FromStr for SessionMode {
    type Err = SchedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dedicated" => Ok(SessionMode::Dedicated),
            "batch" => Ok(SessionMode::Batch),
            other => Err(SchedError::InvalidSessionMode(other.to_string())),
        }
    }
}

impl std::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Internal session record.
#[derive(Debug)]
struct SessionRecord {
    id: SessionId,
    mode: SessionMode,
    /// Target device (metadata half); attached jobs must match it.
    device: String,
    max_ttl_secs: Option<u64>,
    created_at: DateTime<Utc>,
    accepting_jobs: bool,
    active: bool,
    /// Attached job IDs in attach order. Back-references, not ownership.
    job_ids: Vec<JobId>,
}

impl SessionRecord {
    fn expired(&self, now: DateTime<Utc>) -> bool {
        match self.max_ttl_secs {
            Some(ttl) => (now - self.created_at).num_seconds() >= ttl as i64,
            None => false,
        }
    }

    /// `active` with lazy TTL expiry applied.
    fn effective_active(&self, now: DateTime<Utc>) -> bool {
        self.active && !self.expired(now)
    }

    fn snapshot(&self, now: DateTime<Utc>) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id.clone(),
            mode: self.mode,
            device: self.device.clone(),
            max_ttl_secs: self.max_ttl_secs,
            created_at: self.created_at,
            elapsed_secs: (now - self.created_at).num_seconds().max(0) as u64,
            accepting_jobs: self.accepting_jobs,
            active: self.effective_active(now),
            jobs: self.job_ids.clone(),
        }
    }
}

/// Point-in-time view of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Session ID.
    pub id: SessionId,
    /// Execution mode.
    pub mode: SessionMode,
    /// Target device (metadata half).
    pub device: String,
    /// Maximum time-to-live in seconds, if set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_ttl_secs: Option<u64>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Seconds since creation, at snapshot time.
    pub elapsed_secs: u64,
    /// Whether new jobs are admitted.
    pub accepting_jobs: bool,
    /// Whether the session is active (explicit close and TTL both apply).
    pub active: bool,
    /// Attached job IDs in attach order.
    pub jobs: Vec<JobId>,
}

struct SessionTable {
    sessions: FxHashMap<SessionId, SessionRecord>,
    /// Creation order for listing.
    order: Vec<SessionId>,
}

/// Owns session records and decides job admission.
pub struct SessionManager {
    table: Mutex<SessionTable>,
}

impl SessionManager {
    /// Create an empty session manager.
    pub fn new() -> Self {
        Self {
            table: Mutex::new(SessionTable {
                sessions: FxHashMap::default(),
                order: Vec::new(),
            }),
        }
    }

    /// Create a session targeting `device`.
    ///
    /// `max_ttl_secs`, when given, must be positive.
    pub fn create_session(
        &self,
        mode: SessionMode,
        device: impl Into<String>,
        max_ttl_secs: Option<u64>,
    ) -> SchedResult<SessionId> {
        if max_ttl_secs == Some(0) {
            return Err(SchedError::InvalidTtl);
        }

        let id = SessionId::generate();
        let device = device.into();
        let record = SessionRecord {
            id: id.clone(),
            mode,
            device: device.clone(),
            max_ttl_secs,
            created_at: Utc::now(),
            accepting_jobs: true,
            active: true,
            job_ids: Vec::new(),
        };

        let mut table = self.table.lock().expect("session table poisoned");
        table.sessions.insert(id.clone(), record);
        table.order.push(id.clone());

        info!("session created: {} (mode: {}, device: {})", id, mode, device);
        Ok(id)
    }

    /// Admit a job into a session and record the back-reference.
    ///
    /// Refuses when the session is unknown, inactive (explicitly closed or
    /// TTL-expired), not accepting jobs, or targets a different device.
    pub fn attach(&self, session: &SessionId, job: &JobId, device: &str) -> SchedResult<()> {
        let now = Utc::now();
        let mut table = self.table.lock().expect("session table poisoned");
        let record = table
            .sessions
            .get_mut(session)
            .ok_or_else(|| SchedError::SessionNotFound(session.to_string()))?;

        if !record.effective_active(now) {
            return Err(SchedError::SessionClosed(session.to_string()));
        }
        if !record.accepting_jobs {
            warn!("session {} refused job {}: not accepting jobs", session, job);
            return Err(SchedError::SessionNotAccepting(session.to_string()));
        }
        if record.device != device {
            return Err(SchedError::SessionDeviceMismatch {
                session: session.to_string(),
                expected: record.device.clone(),
                found: device.to_string(),
            });
        }

        record.job_ids.push(job.clone());
        info!("job {} attached to session {}", job, session);
        Ok(())
    }

    /// Update the admission gate. The gate is one-way: once shut it cannot
    /// be re-opened.
    pub fn update(&self, session: &SessionId, accepting_jobs: bool) -> SchedResult<SessionSnapshot> {
        let now = Utc::now();
        let mut table = self.table.lock().expect("session table poisoned");
        let record = table
            .sessions
            .get_mut(session)
            .ok_or_else(|| SchedError::SessionNotFound(session.to_string()))?;

        if accepting_jobs && !record.accepting_jobs {
            return Err(SchedError::SessionGateOneWay(session.to_string()));
        }
        record.accepting_jobs = accepting_jobs;
        info!("session {} updated: accepting_jobs={}", session, accepting_jobs);
        Ok(record.snapshot(now))
    }

    /// Close a session: shuts the admission gate and deactivates it.
    ///
    /// Idempotent. Returns the attached job IDs so the caller can cascade
    /// cancellation over those still queued.
    pub fn close(&self, session: &SessionId) -> SchedResult<Vec<JobId>> {
        let mut table = self.table.lock().expect("session table poisoned");
        let record = table
            .sessions
            .get_mut(session)
            .ok_or_else(|| SchedError::SessionNotFound(session.to_string()))?;

        record.accepting_jobs = false;
        record.active = false;
        info!("session closed: {}", session);
        Ok(record.job_ids.clone())
    }

    /// Point-in-time view of a session, with lazy TTL expiry applied.
    pub fn get_session(&self, session: &SessionId) -> SchedResult<SessionSnapshot> {
        let now = Utc::now();
        let table = self.table.lock().expect("session table poisoned");
        table
            .sessions
            .get(session)
            .map(|record| record.snapshot(now))
            .ok_or_else(|| SchedError::SessionNotFound(session.to_string()))
    }

    /// All sessions in creation order.
    pub fn list_sessions(&self) -> Vec<SessionSnapshot> {
        let now = Utc::now();
        let table = self.table.lock().expect("session table poisoned");
        table
            .order
            .iter()
            .filter_map(|id| table.sessions.get(id))
            .map(|record| record.snapshot(now))
            .collect()
    }

    /// Shift a session's creation time into the past (test hook for TTL
    /// expiry, which is otherwise untestable without waiting).
    #[cfg(test)]
    pub(crate) fn backdate(&self, session: &SessionId, secs: i64) {
        let mut table = self.table.lock().expect("session table poisoned");
        if let Some(record) = table.sessions.get_mut(session) {
            record.created_at -= chrono::Duration::seconds(secs);
        }
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
