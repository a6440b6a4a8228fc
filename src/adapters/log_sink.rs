//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing every application event as one
//! structured line through the `log` facade.

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

fn on_off(v: bool) -> &'static str {
    if v { "on" } else { "off" }
}

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started {
                profile,
                pending_triggers,
            } => {
                info!("START | profile={} | pending_triggers={}", profile, pending_triggers);
            }
            AppEvent::OverrideApplied {
                variable,
                from,
                to,
                source,
            } => {
                info!(
                    "OVERRIDE | {} {} -> {} ({})",
                    variable,
                    on_off(*from),
                    on_off(*to),
                    source
                );
            }
            AppEvent::ControlChanged {
                variable,
                from,
                to,
                source,
            } => {
                info!("CHANGE | {} {} -> {} ({})", variable, from, to, source);
            }
            AppEvent::ManualIgnored { variable } => {
                info!("IGNORED | radio command for {} while own transmission settles", variable);
            }
            AppEvent::ActuationFailed {
                variable,
                to,
                error: e,
            } => {
                error!("ACTUATE | {} -> {} failed: {}", variable, on_off(*to), e);
            }
            AppEvent::Finished {
                ticks,
                overrides_applied,
                interrupted,
            } => {
                if *interrupted {
                    warn!(
                        "FINISH | interrupted | ticks={} overrides={}",
                        ticks, overrides_applied
                    );
                } else {
                    info!("FINISH | ticks={} overrides={}", ticks, overrides_applied);
                }
            }
        }
    }
}
