//! Error types for the control engine.
//!
//! Sensor and actuation failures stay local to their ports and end up in
//! events and logs.  `Error` covers the record-level operations (trigger
//! authoring) that callers propagate.  Variants are `Copy`; details such as
//! the underlying `io::Error` are logged at the site where they occur.

use core::fmt;

use crate::app::ports::StorageError;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Failure of a record operation on a [`TriggerStorePort`](crate::app::ports::TriggerStorePort).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The key/value store failed.
    Storage(StorageError),
    /// A trigger record is invalid.
    Trigger(TriggerError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Trigger(e) => write!(f, "trigger: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The underlying source could not be read.
    ReadFailed,
    /// The source was read but did not contain a number.
    ParseFailed,
    /// The reading was NaN or infinite.
    NonFinite,
    /// The acquisition worker panicked.
    WorkerPanicked,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed => write!(f, "read failed"),
            Self::ParseFailed => write!(f, "value could not be parsed"),
            Self::NonFinite => write!(f, "reading is not finite"),
            Self::WorkerPanicked => write!(f, "acquisition worker panicked"),
        }
    }
}

impl std::error::Error for SensorError {}

// ---------------------------------------------------------------------------
// Actuation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuationError {
    /// No RF codes are configured for the variable.
    NotConfigured,
    /// The transmitter reported a failure.
    TransmitFailed,
    /// The transmitter could not be started at all.
    TransmitterUnavailable,
    /// The transmission worker panicked.
    WorkerPanicked,
}

impl fmt::Display for ActuationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "no codes configured"),
            Self::TransmitFailed => write!(f, "transmission failed"),
            Self::TransmitterUnavailable => write!(f, "transmitter unavailable"),
            Self::WorkerPanicked => write!(f, "transmission worker panicked"),
        }
    }
}

impl std::error::Error for ActuationError {}

// ---------------------------------------------------------------------------
// Trigger errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerError {
    /// The trigger name cannot be used as a storage key.
    InvalidName,
    /// The record was written with a different schema.
    SchemaMismatch,
    /// The record could not be parsed.
    Malformed,
}

impl fmt::Display for TriggerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidName => write!(f, "invalid trigger name"),
            Self::SchemaMismatch => write!(f, "schema tag mismatch"),
            Self::Malformed => write!(f, "malformed record"),
        }
    }
}

impl std::error::Error for TriggerError {}

impl From<TriggerError> for Error {
    fn from(e: TriggerError) -> Self {
        Self::Trigger(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
