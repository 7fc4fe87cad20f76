//! Error types for the HAL crate.

use thiserror::Error;

/// Errors raised while assembling the catalog or the executor registry.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HalError {
    /// A device or executor name contains the reserved separator.
    #[error("invalid name '{0}': '@' is reserved for virtual backend names")]
    ReservedSeparator(String),

    /// A device with this name is already in the catalog.
    #[error("duplicate device: {0}")]
    DuplicateDevice(String),

    /// An executor with this name is already registered.
    #[error("duplicate executor: {0}")]
    DuplicateExecutor(String),
}

/// Result type for HAL operations.
pub type HalResult<T> = Result<T, HalError>;
