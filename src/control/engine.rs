//! One control cycle.
//!
//! ```text
//!   snapshot ──▶ inputs ──┐
//!   scheduler.tick ───────┼─▶ external overrides ─▶ apply
//!   manual ───────────────┘                           │
//!                                                     ▼
//!                          thresholds (manual-aware) ─▶ apply ─▶ state'
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::app::commands::{CommandOrigin, ManualCommand};
use crate::app::events::AppEvent;
use crate::app::ports::{ActuationSink, EventSink};
use crate::scheduler::TriggerScheduler;
use crate::sensors::SensorSnapshot;

use super::{ControlParams, ControlState, ControlVariable, Override, OverrideSource, apply, threshold};

/// Everything one tick consumes besides the state.
#[derive(Debug, Clone)]
pub struct TickInput<'a> {
    /// Seconds since the previous tick.
    pub sampling_interval: f32,
    pub snapshot: &'a SensorSnapshot,
    pub last_tick: DateTime<Utc>,
    pub now: DateTime<Utc>,
    pub manual: Vec<ManualCommand>,
}

#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub state: ControlState,
    /// Every override consumed this tick, in application order.
    pub overrides: Vec<Override>,
    /// How many of them changed the state.
    pub applied: usize,
}

#[derive(Debug, Clone)]
pub struct ControlTickEngine {
    params: ControlParams,
}

impl ControlTickEngine {
    pub fn new(params: ControlParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ControlParams {
        &self.params
    }

    /// Run one cycle on a copy of `state` and return the successor.
    ///
    /// Overrides targeting the same variable are applied in list order, so
    /// the last one wins: triggers, then manual commands, then threshold
    /// decisions.  Radio commands arriving inside a variable's ignore window
    /// are dropped as echoes of our own transmission.
    pub fn tick(
        &self,
        state: &ControlState,
        input: TickInput<'_>,
        scheduler: &mut TriggerScheduler,
        actuator: &mut dyn ActuationSink,
        events: &mut dyn EventSink,
    ) -> TickOutcome {
        let dt = input.sampling_interval;
        let mut succ = state.clone();

        // Inputs
        for (&sensor_input, &value) in &input.snapshot.readings {
            match self.params.clamp_input(sensor_input, value) {
                Some(v) => {
                    succ.inputs.insert(sensor_input, v);
                }
                None => debug!("Ignoring undeclared input {}", sensor_input),
            }
        }

        // Ignore timers
        for v in succ.variables.values_mut() {
            v.ignore_time_counter = (v.ignore_time_counter - dt).max(0.0);
        }

        // External overrides: triggers first, then manual commands, so an
        // operator command wins over a trigger firing in the same tick.
        let mut external: Vec<Override> = scheduler.tick(input.last_tick, input.now);
        for cmd in &input.manual {
            let echo = cmd.origin == CommandOrigin::Radio
                && succ
                    .variable(cmd.variable)
                    .is_some_and(|v| v.ignore_time_counter > 0.0);
            if echo {
                info!("Radio {} ignored (own transmission)", cmd);
                events.emit(&AppEvent::ManualIgnored {
                    variable: cmd.variable,
                });
                continue;
            }
            external.push(cmd.to_override());
        }

        let mut applied = 0;
        let mut externally_set: BTreeMap<ControlVariable, Option<f32>> = BTreeMap::new();
        let mut sources: BTreeMap<ControlVariable, OverrideSource> = BTreeMap::new();
        for ovr in &mut external {
            if apply::apply(&mut succ, &self.params, ovr, actuator, events) {
                applied += 1;
                externally_set.insert(ovr.variable, ovr.hold_time);
                sources.insert(ovr.variable, ovr.source);
            }
        }

        // Thresholds
        let mut decided: Vec<Override> = Vec::new();
        for spec in self.params.thresholds() {
            let value = succ.input(spec.input);
            let manual = externally_set.get(&spec.target);
            let hold = match manual {
                Some(Some(secs)) => spec.hold.with_override(*secs),
                _ => spec.hold,
            };
            let Some(var) = succ.variable_mut(spec.target) else {
                continue;
            };
            let Some(value) = value else {
                debug!("No {} reading yet; {} threshold only counts", spec.input, spec.target);
                if let Some(counter) = threshold::tick_without_input(
                    dt,
                    var.value,
                    &spec.band,
                    manual.is_some(),
                    Some(var.hold_time_counter),
                    &hold,
                ) {
                    var.hold_time_counter = counter;
                }
                continue;
            };
            let outcome = threshold::tick(
                dt,
                value,
                var.value,
                &spec.band,
                manual.is_some(),
                Some(var.hold_time_counter),
                &hold,
            );
            if let Some(counter) = outcome.hold_time_counter {
                var.hold_time_counter = counter;
            }
            if let Some(to) = outcome.flip_to {
                decided.push(Override::new(spec.target, to, None, OverrideSource::Threshold));
            }
        }
        for ovr in &mut decided {
            if apply::apply(&mut succ, &self.params, ovr, actuator, events) {
                applied += 1;
                sources.insert(ovr.variable, ovr.source);
            }
        }

        for (variable, new) in &succ.variables {
            let from = state
                .value(*variable)
                .or_else(|| self.params.variable(*variable).map(|p| p.default_value))
                .unwrap_or(new.value);
            if from == new.value {
                continue;
            }
            // Values only change through an applied override.
            if let Some(&source) = sources.get(variable) {
                events.emit(&AppEvent::ControlChanged {
                    variable: *variable,
                    from,
                    to: new.value,
                    source,
                });
            }
        }

        external.extend(decided);
        TickOutcome {
            state: succ,
            overrides: external,
            applied,
        }
    }
}
