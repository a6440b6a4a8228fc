//! Per-host control profiles.
//!
//! Hosts differ in which actuators are wired and how they are controlled.
//! The profile is selected once at startup from the hostname (or forced on
//! the command line) and stays fixed for the process lifetime.

use core::fmt;
use core::str::FromStr;

use log::{info, warn};

use crate::app::ports::{ActuationSink, ConfigError, EventSink, StatePort, StorageError};
use crate::scheduler::TriggerScheduler;

use super::engine::{ControlTickEngine, TickInput, TickOutcome};
use super::params::{
    ControlParams, HoldTimeBounds, HoldTimes, InputRange, Lpd433Codes, ThresholdBand,
    ThresholdSpec, VariableParams,
};
use super::schema::state_fingerprint;
use super::{ControlState, ControlVariable, SensorInput};

/// Control behaviour of one host.
pub trait ControlProfile {
    fn name(&self) -> &'static str;

    fn params(&self) -> &ControlParams;

    /// Identifies the persisted state layout of this profile.
    fn schema_fingerprint(&self) -> u64 {
        state_fingerprint(self.name())
    }

    /// State to start the run with.
    fn initial_state(&self, store: &mut dyn StatePort) -> ControlState;

    fn tick(
        &self,
        state: &ControlState,
        input: TickInput<'_>,
        scheduler: &mut TriggerScheduler,
        actuator: &mut dyn ActuationSink,
        events: &mut dyn EventSink,
    ) -> TickOutcome;

    fn persist(&self, state: &ControlState, store: &mut dyn StatePort)
    -> Result<(), StorageError>;
}

// ---------------------------------------------------------------------------
// Host selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostProfile {
    /// No control wiring; owns no persisted state.
    NoOp,
    RaspberryPi0,
    RaspberryPi1,
}

impl HostProfile {
    pub const ALL: [Self; 3] = [Self::NoOp, Self::RaspberryPi0, Self::RaspberryPi1];

    pub fn name(self) -> &'static str {
        match self {
            Self::NoOp => "noop",
            Self::RaspberryPi0 => "raspberrypi-0",
            Self::RaspberryPi1 => "raspberrypi-1",
        }
    }

    /// Unknown hosts get the no-op profile.
    pub fn from_hostname(hostname: &str) -> Self {
        match hostname {
            "raspberrypi-0" => Self::RaspberryPi0,
            "raspberrypi-1" => Self::RaspberryPi1,
            _ => Self::NoOp,
        }
    }

    pub fn build(self) -> Result<Box<dyn ControlProfile>, ConfigError> {
        Ok(match self {
            Self::NoOp => Box::new(NoOpControl),
            Self::RaspberryPi0 => Box::new(ThresholdControl::new(self.name(), raspberrypi_0()?)),
            Self::RaspberryPi1 => Box::new(ThresholdControl::new(self.name(), raspberrypi_1()?)),
        })
    }
}

impl fmt::Display for HostProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HostProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| format!("unknown profile \"{s}\""))
    }
}

// ---------------------------------------------------------------------------
// No-op
// ---------------------------------------------------------------------------

/// Degenerate profile: nothing is controlled and no state file may exist.
pub struct NoOpControl;

impl ControlProfile for NoOpControl {
    fn name(&self) -> &'static str {
        HostProfile::NoOp.name()
    }

    fn params(&self) -> &ControlParams {
        static EMPTY: std::sync::OnceLock<ControlParams> = std::sync::OnceLock::new();
        EMPTY.get_or_init(ControlParams::empty)
    }

    fn initial_state(&self, store: &mut dyn StatePort) -> ControlState {
        store.clear();
        ControlState::default()
    }

    fn tick(
        &self,
        state: &ControlState,
        _input: TickInput<'_>,
        _scheduler: &mut TriggerScheduler,
        _actuator: &mut dyn ActuationSink,
        _events: &mut dyn EventSink,
    ) -> TickOutcome {
        TickOutcome {
            state: state.clone(),
            overrides: Vec::new(),
            applied: 0,
        }
    }

    fn persist(
        &self,
        _state: &ControlState,
        store: &mut dyn StatePort,
    ) -> Result<(), StorageError> {
        store.clear();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Threshold-controlled hosts
// ---------------------------------------------------------------------------

pub struct ThresholdControl {
    name: &'static str,
    engine: ControlTickEngine,
}

impl ThresholdControl {
    pub fn new(name: &'static str, params: ControlParams) -> Self {
        Self {
            name,
            engine: ControlTickEngine::new(params),
        }
    }
}

impl ControlProfile for ThresholdControl {
    fn name(&self) -> &'static str {
        self.name
    }

    fn params(&self) -> &ControlParams {
        self.engine.params()
    }

    fn initial_state(&self, store: &mut dyn StatePort) -> ControlState {
        match store.load() {
            Some(mut state) => {
                // Variables added to the profile since the state was written
                // start from their defaults.
                for (variable, default) in self.params().default_state().variables {
                    state.variables.entry(variable).or_insert(default);
                }
                info!("Control state loaded for {}", self.name);
                state
            }
            None => {
                info!("No usable control state for {}, using defaults", self.name);
                self.params().default_state()
            }
        }
    }

    fn tick(
        &self,
        state: &ControlState,
        input: TickInput<'_>,
        scheduler: &mut TriggerScheduler,
        actuator: &mut dyn ActuationSink,
        events: &mut dyn EventSink,
    ) -> TickOutcome {
        self.engine.tick(state, input, scheduler, actuator, events)
    }

    fn persist(
        &self,
        state: &ControlState,
        store: &mut dyn StatePort,
    ) -> Result<(), StorageError> {
        store.save(state).inspect_err(|e| {
            warn!("Control state for {} not persisted: {}", self.name, e);
        })
    }
}

// ---------------------------------------------------------------------------
// Host parameter sets
// ---------------------------------------------------------------------------

/// Ventilation by CO2, dehumidifier by relative humidity.
fn raspberrypi_0() -> Result<ControlParams, ConfigError> {
    let ventilation_hold = HoldTimes {
        inactive: HoldTimeBounds::new(300.0, 3600.0),
        active: HoldTimeBounds::new(600.0, 3600.0).with_override(1800.0),
    };
    let dehumidifier_hold = HoldTimes {
        inactive: HoldTimeBounds::new(600.0, f32::INFINITY),
        active: HoldTimeBounds::new(900.0, 7200.0),
    };
    ControlParams::new(
        vec![
            VariableParams {
                variable: ControlVariable::Ventilation,
                default_value: false,
                codes: Some(Lpd433Codes::new(0x0045_1551, 0x0045_1554)),
                ignore_time_secs: 5.0,
            },
            VariableParams {
                variable: ControlVariable::Dehumidifier,
                default_value: false,
                codes: Some(Lpd433Codes::new(0x0045_4551, 0x0045_4554)),
                ignore_time_secs: 5.0,
            },
        ],
        vec![
            (SensorInput::Co2Ppm, InputRange::new(400.0, 5000.0)),
            (SensorInput::RelativeHumidity, InputRange::new(0.0, 100.0)),
        ],
        vec![
            ThresholdSpec {
                target: ControlVariable::Ventilation,
                input: SensorInput::Co2Ppm,
                band: ThresholdBand {
                    baseline: 700.0,
                    gap: 50.0,
                    active_region_is_above: true,
                    active_state_is_on: true,
                },
                hold: ventilation_hold,
            },
            ThresholdSpec {
                target: ControlVariable::Dehumidifier,
                input: SensorInput::RelativeHumidity,
                band: ThresholdBand {
                    baseline: 65.0,
                    gap: 5.0,
                    active_region_is_above: true,
                    active_state_is_on: true,
                },
                hold: dehumidifier_hold,
            },
        ],
    )
}

/// Dehumidifier only.
fn raspberrypi_1() -> Result<ControlParams, ConfigError> {
    ControlParams::new(
        vec![VariableParams {
            variable: ControlVariable::Dehumidifier,
            default_value: false,
            codes: Some(Lpd433Codes::new(0x0015_5551, 0x0015_5554)),
            ignore_time_secs: 5.0,
        }],
        vec![(SensorInput::RelativeHumidity, InputRange::new(0.0, 100.0))],
        vec![ThresholdSpec {
            target: ControlVariable::Dehumidifier,
            input: SensorInput::RelativeHumidity,
            band: ThresholdBand {
                baseline: 60.0,
                gap: 5.0,
                active_region_is_above: true,
                active_state_is_on: true,
            },
            hold: HoldTimes {
                inactive: HoldTimeBounds::new(600.0, f32::INFINITY),
                active: HoldTimeBounds::new(900.0, 7200.0).with_override(3600.0),
            },
        }],
    )
}
