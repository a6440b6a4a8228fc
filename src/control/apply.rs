//! Override application.
//!
//! Every [`Override`] is consumed by its first application attempt.  The
//! state records the intended value; the physical action is best-effort and
//! never rolled back.

use log::{debug, error, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{ActuationSink, EventSink};

use super::{ControlParams, ControlState, Override, VariableState};

/// Apply `ovr` to `state` at most once.
///
/// A change of value resets the variable's hold-time counter; re-asserting
/// the current value leaves it running.  Returns `true` when the state
/// assignment happened.  A second call with
/// the same override is a no-op returning `false`.
pub fn apply(
    state: &mut ControlState,
    params: &ControlParams,
    ovr: &mut Override,
    actuator: &mut dyn ActuationSink,
    events: &mut dyn EventSink,
) -> bool {
    if ovr.is_done() {
        return false;
    }
    ovr.mark_done();

    let Some(vp) = params.variable(ovr.variable) else {
        warn!(
            "Override for {} dropped: variable not governed by this profile",
            ovr.variable
        );
        return false;
    };

    let slot = state
        .variables
        .entry(ovr.variable)
        .or_insert_with(|| VariableState {
            value: vp.default_value,
            ..VariableState::default()
        });
    let from = slot.value;
    slot.value = ovr.to;
    slot.ignore_time_counter = vp.ignore_time_secs;
    // Dwell restarts on every transition, whatever its source.
    if from != ovr.to {
        slot.hold_time_counter = 0.0;
    }

    debug!(
        "Applying {} override: {} {} -> {}",
        ovr.source, ovr.variable, from, ovr.to
    );
    events.emit(&AppEvent::OverrideApplied {
        variable: ovr.variable,
        from,
        to: ovr.to,
        source: ovr.source,
    });

    if let Err(e) = actuator.actuate(ovr.variable, ovr.to, ovr.hold_time) {
        error!("Actuation of {} -> {} failed: {}", ovr.variable, ovr.to, e);
        events.emit(&AppEvent::ActuationFailed {
            variable: ovr.variable,
            to: ovr.to,
            error: e,
        });
    }

    true
}
