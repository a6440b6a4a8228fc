//! Port traits: the hexagonal boundary between the control engine and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlService (domain)
//! ```
//!
//! Driven adapters (sensors, RF transmitter, event sinks, storage) implement
//! these traits.  The [`ControlService`](super::service::ControlService)
//! consumes them as trait objects, so the domain core never touches
//! hardware or the filesystem directly.

use chrono::{DateTime, Utc};

use crate::config::SystemConfig;
use crate::control::{ControlState, ControlVariable};
use crate::error::ActuationError;
use crate::sensors::SensorSnapshot;
use crate::trigger::ControlTrigger;

use super::commands::ManualCommand;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this once per sampling cycle.
pub trait SensorPort {
    /// Read every sensor and return a unified snapshot stamped with `now`.
    ///
    /// Must not return before every reading has completed.
    fn read_all(&mut self, now: DateTime<Utc>) -> SensorSnapshot;
}

// ───────────────────────────────────────────────────────────────
// Actuation sink (driven adapter: domain → RF transmitter)
// ───────────────────────────────────────────────────────────────

/// Write-side port: performs a best-effort physical action.
///
/// Failures are reported but never retried by the caller.
pub trait ActuationSink {
    fn actuate(
        &mut self,
        variable: ControlVariable,
        to: bool,
        hold_time: Option<f32>,
    ) -> Result<(), ActuationError>;
}

// ───────────────────────────────────────────────────────────────
// Command port (driving adapter: operator → domain)
// ───────────────────────────────────────────────────────────────

/// Source of manual override commands issued while a run is in progress.
pub trait CommandPort {
    /// Drain every command received since the last call.
    fn poll_manual(&mut self) -> Vec<ManualCommand>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Wall-clock time source used for trigger windows.
pub trait ClockPort {
    fn now(&self) -> DateTime<Utc>;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration.  Returns [`SystemConfig::default()`] if no
    /// stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ filesystem)
// ───────────────────────────────────────────────────────────────

/// Namespaced key-value byte storage for control state and trigger records.
///
/// - Namespaces are `/`-separated relative paths (e.g. `shortly/pi-0`).
/// - Keys are single path components.
/// - Write operations MUST be atomic: no partial records after a crash.
pub trait StoragePort {
    /// Read a whole value.
    fn read(&self, namespace: &str, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;

    /// List every key in a namespace, sorted.  An absent namespace is empty.
    fn keys(&self, namespace: &str) -> Result<Vec<String>, StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Control state persistence
// ───────────────────────────────────────────────────────────────

/// "Load or nothing" / "save best-effort" slot for the last [`ControlState`].
pub trait StatePort {
    /// Load the persisted state.  `None` if absent, unreadable or written
    /// by an incompatible schema; such records are discarded.
    fn load(&mut self) -> Option<ControlState>;

    /// Persist the state.
    fn save(&mut self, state: &ControlState) -> Result<(), StorageError>;

    /// Make sure no persisted state exists.
    fn clear(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Trigger authoring store
// ───────────────────────────────────────────────────────────────

/// Collection of individually named trigger records.
pub trait TriggerStorePort {
    /// Load every readable trigger.  Unreadable records are skipped.
    fn load_all(&self) -> Vec<ControlTrigger>;

    /// Create or replace the trigger with the same name.
    fn put(&mut self, trigger: &ControlTrigger) -> crate::error::Result<()>;

    /// Remove a trigger by name.  Returns `false` if it did not exist.
    fn remove(&mut self, name: &str) -> crate::error::Result<bool>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Namespace or key is not a safe relative path.
    InvalidKey,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::InvalidKey => write!(f, "invalid namespace or key"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl std::error::Error for StorageError {}
