//! Control engine: state, parameters and the per-tick decision logic.
//!
//! ```text
//!  SensorSnapshot ──▶ ┌──────────────────────────────┐
//!  ManualCommand  ──▶ │  engine::ControlTickEngine    │ ──▶ ControlState'
//!  TriggerScheduler ─▶│  threshold · apply            │ ──▶ ActuationSink
//!                     └──────────────────────────────┘
//! ```
//!
//! [`ControlState`] is the only mutable piece and is mutated exactly once
//! per tick.  [`ControlParams`] is fixed for the process lifetime.

pub mod apply;
pub mod engine;
pub mod params;
pub mod profile;
pub mod schema;
pub mod threshold;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use engine::{ControlTickEngine, TickInput, TickOutcome};
pub use params::{
    ControlParams, HoldTimeBounds, HoldTimes, InputRange, Lpd433Codes, ThresholdBand,
    ThresholdSpec, VariableParams,
};
pub use profile::{ControlProfile, HostProfile};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// One RF-controlled actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlVariable {
    Ventilation,
    Dehumidifier,
}

impl ControlVariable {
    pub const ALL: [Self; 2] = [Self::Ventilation, Self::Dehumidifier];

    pub fn name(self) -> &'static str {
        match self {
            Self::Ventilation => "ventilation",
            Self::Dehumidifier => "dehumidifier",
        }
    }
}

impl fmt::Display for ControlVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ControlVariable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.name() == s)
            .ok_or_else(|| format!("unrecognized control variable \"{s}\""))
    }
}

/// One numeric sensor input a threshold can be driven by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorInput {
    Co2Ppm,
    RelativeHumidity,
    TemperatureC,
}

impl SensorInput {
    pub const ALL: [Self; 3] = [Self::Co2Ppm, Self::RelativeHumidity, Self::TemperatureC];

    pub fn name(self) -> &'static str {
        match self {
            Self::Co2Ppm => "co2_ppm",
            Self::RelativeHumidity => "relative_humidity",
            Self::TemperatureC => "temperature_c",
        }
    }
}

impl fmt::Display for SensorInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SensorInput {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.name() == s)
            .ok_or_else(|| format!("unrecognized sensor input \"{s}\""))
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Per-variable part of [`ControlState`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VariableState {
    /// Intended actuator value (not hardware-confirmed).
    pub value: bool,
    /// Seconds since the last threshold transition.
    pub hold_time_counter: f32,
    /// Seconds during which received manual commands are ignored.
    pub ignore_time_counter: f32,
}

/// Mutable control snapshot, persisted across runs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ControlState {
    pub variables: BTreeMap<ControlVariable, VariableState>,
    /// Last accepted value per input (clamped).
    pub inputs: BTreeMap<SensorInput, f32>,
}

impl ControlState {
    pub fn value(&self, variable: ControlVariable) -> Option<bool> {
        self.variables.get(&variable).map(|v| v.value)
    }

    pub fn variable(&self, variable: ControlVariable) -> Option<&VariableState> {
        self.variables.get(&variable)
    }

    pub fn variable_mut(&mut self, variable: ControlVariable) -> Option<&mut VariableState> {
        self.variables.get_mut(&variable)
    }

    pub fn input(&self, input: SensorInput) -> Option<f32> {
        self.inputs.get(&input).copied()
    }
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

/// Where an [`Override`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideSource {
    Manual,
    Trigger,
    Threshold,
}

impl fmt::Display for OverrideSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Manual => "manual",
            Self::Trigger => "trigger",
            Self::Threshold => "threshold",
        })
    }
}

/// A one-time request to change a control variable.
///
/// `done` can only go from `false` to `true`, which is what makes every
/// override applied at most once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Override {
    pub variable: ControlVariable,
    pub to: bool,
    pub hold_time: Option<f32>,
    pub source: OverrideSource,
    done: bool,
}

impl Override {
    pub fn new(
        variable: ControlVariable,
        to: bool,
        hold_time: Option<f32>,
        source: OverrideSource,
    ) -> Self {
        Self {
            variable,
            to,
            hold_time,
            source,
            done: false,
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub(crate) fn mark_done(&mut self) {
        self.done = true;
    }
}
