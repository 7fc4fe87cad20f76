//! Error handling for the scheduling core.
//!
//! Every operation surfaces one of four classes of failure: malformed input
//! (validation), a name that does not resolve (not-found), an operation
//! that conflicts with current state (conflict), or an execution failure —
//! the last of which is never raised to a caller, only recorded inside the
//! failed job. [`SchedError::kind`] exposes the class so an outer API layer
//! can map errors to status codes without matching every variant.

use thiserror::Error;

/// Result type for scheduler operations.
pub type SchedResult<T> = Result<T, SchedError>;

/// Coarse classification of a [`SchedError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input.
    Validation,
    /// A referenced job, session, device, or executor does not exist.
    NotFound,
    /// The operation conflicts with the current state of its target.
    Conflict,
}

/// Errors that can occur during scheduling operations.
#[derive(Error, Debug)]
pub enum SchedError {
    /// Program kind is not `sampler` or `estimator`.
    #[error("invalid program kind: {0}")]
    InvalidProgramKind(String),

    /// Session mode is not `dedicated` or `batch`.
    #[error("invalid session mode: {0}")]
    InvalidSessionMode(String),

    /// Virtual backend name has no `@` separator.
    #[error("invalid backend name '{0}': expected '<device>@<executor>'")]
    MalformedBackendName(String),

    /// A name half contains the reserved separator.
    #[error("invalid name '{0}': '@' is reserved for virtual backend names")]
    ReservedSeparator(String),

    /// `max_ttl` must be positive when provided.
    #[error("invalid max_ttl: must be greater than zero")]
    InvalidTtl,

    /// The metadata half of a virtual backend name does not resolve.
    #[error("unknown metadata: {0}")]
    UnknownDevice(String),

    /// The executor half of a virtual backend name does not resolve.
    #[error("unknown executor: {0}")]
    UnknownExecutor(String),

    /// Job not found.
    #[error("job not found: {0}")]
    JobNotFound(String),

    /// Session not found.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Only QUEUED jobs can be cancelled.
    #[error("cannot cancel job {id} in {status} status")]
    CancelConflict { id: String, status: &'static str },

    /// Results exist only for COMPLETED jobs.
    #[error("no results for job {id} in {status} status")]
    ResultsUnavailable { id: String, status: &'static str },

    /// The session has been closed or its TTL has elapsed.
    #[error("session {0} is closed")]
    SessionClosed(String),

    /// The session's admission gate is shut.
    #[error("session {0} is not accepting jobs")]
    SessionNotAccepting(String),

    /// The admission gate is one-way; it cannot be re-opened.
    #[error("cannot re-enable accepting_jobs on session {0}")]
    SessionGateOneWay(String),

    /// Job targets a different device than its session.
    #[error("session {session} targets device '{expected}' but job targets '{found}'")]
    SessionDeviceMismatch {
        session: String,
        expected: String,
        found: String,
    },

    /// The scheduler has been shut down and accepts no further work.
    #[error("scheduler is shut down")]
    ShutDown,
}

impl SchedError {
    /// Classify this error for an outer API layer.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SchedError::InvalidProgramKind(_)
            | SchedError::InvalidSessionMode(_)
            | SchedError::MalformedBackendName(_)
            | SchedError::ReservedSeparator(_)
            | SchedError::InvalidTtl => ErrorKind::Validation,

            SchedError::UnknownDevice(_)
            | SchedError::UnknownExecutor(_)
            | SchedError::JobNotFound(_)
            | SchedError::SessionNotFound(_) => ErrorKind::NotFound,

            SchedError::CancelConflict { .. }
            | SchedError::ResultsUnavailable { .. }
            | SchedError::SessionClosed(_)
            | SchedError::SessionNotAccepting(_)
            | SchedError::SessionGateOneWay(_)
            | SchedError::SessionDeviceMismatch { .. }
            | SchedError::ShutDown => ErrorKind::Conflict,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SchedError::UnknownExecutor("custatevec".to_string());
        assert_eq!(err.to_string(), "unknown executor: custatevec");

        let err = SchedError::CancelConflict {
            id: "job-1".to_string(),
            status: "RUNNING",
        };
        assert_eq!(err.to_string(), "cannot cancel job job-1 in RUNNING status");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            SchedError::InvalidProgramKind("x".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            SchedError::UnknownDevice("x".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            SchedError::SessionClosed("x".into()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(SchedError::ShutDown.kind(), ErrorKind::Conflict);
    }
}
