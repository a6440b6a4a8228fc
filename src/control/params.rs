//! Immutable control parameters.
//!
//! Built once from the host profile and validated at construction, so the
//! tick path never has to re-check ranges.

use std::collections::BTreeMap;

use crate::app::ports::ConfigError;

use super::{ControlState, ControlVariable, SensorInput, VariableState};

// ---------------------------------------------------------------------------
// Threshold band
// ---------------------------------------------------------------------------

/// Hysteresis band around a baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdBand {
    pub baseline: f32,
    /// Width of the band; always ≥ 0.
    pub gap: f32,
    /// `true` when values above the baseline call for the active state.
    pub active_region_is_above: bool,
    /// Which boolean value of the target is the active one.
    pub active_state_is_on: bool,
}

impl ThresholdBand {
    /// Threshold that must be crossed to enter the active state.
    pub fn activating_threshold(&self) -> f32 {
        self.baseline
    }

    /// Threshold that must be crossed to leave the active state.
    pub fn deactivating_threshold(&self) -> f32 {
        if self.active_region_is_above {
            self.baseline - self.gap
        } else {
            self.baseline + self.gap
        }
    }
}

// ---------------------------------------------------------------------------
// Hold times
// ---------------------------------------------------------------------------

/// Dwell-time bounds for one branch (active or inactive), in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoldTimeBounds {
    pub min: f32,
    pub max: f32,
    /// Dwell time granted after a manual override.
    pub override_secs: Option<f32>,
}

impl HoldTimeBounds {
    pub const UNBOUNDED: Self = Self {
        min: 0.0,
        max: f32::INFINITY,
        override_secs: None,
    };

    pub fn new(min: f32, max: f32) -> Self {
        Self {
            min,
            max,
            override_secs: None,
        }
    }

    pub fn with_override(mut self, secs: f32) -> Self {
        self.override_secs = Some(secs);
        self
    }
}

impl Default for HoldTimeBounds {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HoldTimes {
    pub inactive: HoldTimeBounds,
    pub active: HoldTimeBounds,
}

impl HoldTimes {
    pub fn branch(&self, is_active: bool) -> &HoldTimeBounds {
        if is_active { &self.active } else { &self.inactive }
    }

    /// Copy with both branch overrides replaced by `secs`.
    pub fn with_override(mut self, secs: f32) -> Self {
        self.inactive.override_secs = Some(secs);
        self.active.override_secs = Some(secs);
        self
    }
}

/// One threshold controller: `input` drives `target` through `band`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdSpec {
    pub target: ControlVariable,
    pub input: SensorInput,
    pub band: ThresholdBand,
    pub hold: HoldTimes,
}

// ---------------------------------------------------------------------------
// Per-variable parameters
// ---------------------------------------------------------------------------

/// LPD433 remote socket codes and waveform timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lpd433Codes {
    pub code_off: u32,
    pub code_on: u32,
    pub n_bits: u8,
    pub n_repeats: u8,
    pub intercode_gap_us: u32,
    pub pulse_length_short_us: u32,
    pub pulse_length_long_us: u32,
}

impl Lpd433Codes {
    pub fn new(code_off: u32, code_on: u32) -> Self {
        Self {
            code_off,
            code_on,
            n_bits: 24,
            n_repeats: 6,
            intercode_gap_us: 9000,
            pulse_length_short_us: 300,
            pulse_length_long_us: 900,
        }
    }

    pub fn code_for(&self, to: bool) -> u32 {
        if to { self.code_on } else { self.code_off }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariableParams {
    pub variable: ControlVariable,
    pub default_value: bool,
    pub codes: Option<Lpd433Codes>,
    /// Seconds during which received manual commands for this variable are
    /// ignored after we transmitted ourselves.
    pub ignore_time_secs: f32,
}

/// Accepted range of a sensor input; readings are clamped into it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputRange {
    pub min: f32,
    pub max: f32,
}

impl InputRange {
    pub const UNBOUNDED: Self = Self {
        min: f32::NEG_INFINITY,
        max: f32::INFINITY,
    };

    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }
}

// ---------------------------------------------------------------------------
// ControlParams
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ControlParams {
    variables: BTreeMap<ControlVariable, VariableParams>,
    inputs: BTreeMap<SensorInput, InputRange>,
    thresholds: Vec<ThresholdSpec>,
}

impl ControlParams {
    /// Parameters that govern nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(
        variables: Vec<VariableParams>,
        inputs: Vec<(SensorInput, InputRange)>,
        thresholds: Vec<ThresholdSpec>,
    ) -> Result<Self, ConfigError> {
        let mut var_map = BTreeMap::new();
        for v in variables {
            if !ordered(0.0, v.ignore_time_secs) {
                return Err(ConfigError::ValidationFailed(
                    "ignore time must be a non-negative number",
                ));
            }
            if var_map.insert(v.variable, v).is_some() {
                return Err(ConfigError::ValidationFailed("variable declared twice"));
            }
        }

        let mut input_map = BTreeMap::new();
        for (input, range) in inputs {
            if !ordered(range.min, range.max) {
                return Err(ConfigError::ValidationFailed("input range min exceeds max"));
            }
            if input_map.insert(input, range).is_some() {
                return Err(ConfigError::ValidationFailed("input declared twice"));
            }
        }

        for (i, spec) in thresholds.iter().enumerate() {
            if !var_map.contains_key(&spec.target) {
                return Err(ConfigError::ValidationFailed(
                    "threshold target is not a declared variable",
                ));
            }
            if !input_map.contains_key(&spec.input) {
                return Err(ConfigError::ValidationFailed(
                    "threshold input is not a declared input",
                ));
            }
            if !spec.band.baseline.is_finite() {
                return Err(ConfigError::ValidationFailed("threshold baseline must be finite"));
            }
            if !ordered(0.0, spec.band.gap) {
                return Err(ConfigError::ValidationFailed("hysteresis gap must be >= 0"));
            }
            for bounds in [spec.hold.inactive, spec.hold.active] {
                if !ordered(bounds.min, bounds.max) {
                    return Err(ConfigError::ValidationFailed("hold time min exceeds max"));
                }
            }
            if thresholds[..i].iter().any(|s| s.target == spec.target) {
                return Err(ConfigError::ValidationFailed(
                    "at most one threshold per variable",
                ));
            }
        }

        Ok(Self {
            variables: var_map,
            inputs: input_map,
            thresholds,
        })
    }

    pub fn variable(&self, variable: ControlVariable) -> Option<&VariableParams> {
        self.variables.get(&variable)
    }

    pub fn variables(&self) -> impl Iterator<Item = &VariableParams> {
        self.variables.values()
    }

    pub fn thresholds(&self) -> &[ThresholdSpec] {
        &self.thresholds
    }

    pub fn governs(&self, variable: ControlVariable) -> bool {
        self.variables.contains_key(&variable)
    }

    /// Clamp a reading to the declared range.  `None` for undeclared inputs.
    pub fn clamp_input(&self, input: SensorInput, value: f32) -> Option<f32> {
        self.inputs.get(&input).map(|r| r.clamp(value))
    }

    /// Fresh state: every variable at its default value, counters zeroed.
    pub fn default_state(&self) -> ControlState {
        let variables = self
            .variables
            .values()
            .map(|v| {
                (
                    v.variable,
                    VariableState {
                        value: v.default_value,
                        ..VariableState::default()
                    },
                )
            })
            .collect();
        ControlState {
            variables,
            inputs: BTreeMap::new(),
        }
    }
}

/// `lo <= hi`, false when either side is NaN.
fn ordered(lo: f32, hi: f32) -> bool {
    lo <= hi
}
