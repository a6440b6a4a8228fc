//! Outbound application events.
//!
//! The [`ControlService`](super::service::ControlService) and the tick
//! engine emit these through the [`EventSink`](super::ports::EventSink)
//! port.  Adapters on the other side decide what to do with them: write a
//! log line or collect them in a test.

use crate::control::{ControlVariable, OverrideSource};
use crate::error::ActuationError;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// A run has started.
    Started {
        profile: &'static str,
        pending_triggers: usize,
    },

    /// An override was consumed and written into the state.
    OverrideApplied {
        variable: ControlVariable,
        from: bool,
        to: bool,
        source: OverrideSource,
    },

    /// A variable's value differs from the previous tick.
    ControlChanged {
        variable: ControlVariable,
        from: bool,
        to: bool,
        source: OverrideSource,
    },

    /// A radio command arrived while the variable was still ignoring input.
    ManualIgnored { variable: ControlVariable },

    /// The physical action failed; the state keeps the intended value.
    ActuationFailed {
        variable: ControlVariable,
        to: bool,
        error: ActuationError,
    },

    /// A run has ended.
    Finished {
        ticks: u64,
        overrides_applied: u64,
        interrupted: bool,
    },
}
