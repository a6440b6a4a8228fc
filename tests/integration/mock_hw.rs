//! Mock adapters for integration tests.
//!
//! Records every actuation and event so tests can assert on the full
//! history without an RF transmitter or real sensors.

use std::cell::Cell;
use std::collections::VecDeque;

use chrono::{DateTime, TimeDelta, Utc};
use sensorctl::app::commands::ManualCommand;
use sensorctl::app::events::AppEvent;
use sensorctl::app::ports::{ActuationSink, ClockPort, CommandPort, EventSink, SensorPort};
use sensorctl::control::params::{
    HoldTimes, InputRange, Lpd433Codes, ThresholdBand, ThresholdSpec, VariableParams,
};
use sensorctl::control::profile::ThresholdControl;
use sensorctl::control::{ControlParams, ControlVariable, OverrideSource, SensorInput};
use sensorctl::error::ActuationError;
use sensorctl::sensors::SensorSnapshot;
use sensorctl::shutdown::ShutdownToken;

pub fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

/// Ventilation by CO2 (700 / 50) without hold times, for short scenarios.
pub fn co2_profile() -> ThresholdControl {
    let params = ControlParams::new(
        vec![VariableParams {
            variable: ControlVariable::Ventilation,
            default_value: false,
            codes: Some(Lpd433Codes::new(0x0045_1551, 0x0045_1554)),
            ignore_time_secs: 5.0,
        }],
        vec![(SensorInput::Co2Ppm, InputRange::new(400.0, 5000.0))],
        vec![ThresholdSpec {
            target: ControlVariable::Ventilation,
            input: SensorInput::Co2Ppm,
            band: ThresholdBand {
                baseline: 700.0,
                gap: 50.0,
                active_region_is_above: true,
                active_state_is_on: true,
            },
            hold: HoldTimes::default(),
        }],
    )
    .unwrap();
    ThresholdControl::new("test-co2", params)
}

// ── Sensors ───────────────────────────────────────────────────

/// Returns one scripted reading per call, then nothing.  CO2 unless
/// another input is chosen.
#[derive(Default)]
pub struct ScriptedSensors {
    script: VecDeque<f32>,
    input: Option<SensorInput>,
    pub reads: usize,
    /// Requested on the read with this (1-based) number.
    shutdown_on: Option<(usize, ShutdownToken)>,
}

#[allow(dead_code)]
impl ScriptedSensors {
    pub fn co2(values: &[f32]) -> Self {
        Self {
            script: values.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn readings(input: SensorInput, values: &[f32]) -> Self {
        Self {
            script: values.iter().copied().collect(),
            input: Some(input),
            ..Self::default()
        }
    }

    pub fn shutdown_after(mut self, reads: usize, token: &ShutdownToken) -> Self {
        self.shutdown_on = Some((reads, token.clone()));
        self
    }
}

impl SensorPort for ScriptedSensors {
    fn read_all(&mut self, now: DateTime<Utc>) -> SensorSnapshot {
        self.reads += 1;
        if let Some((n, token)) = &self.shutdown_on {
            if *n == self.reads {
                token.request();
            }
        }
        let mut snapshot = SensorSnapshot::empty(now);
        if let Some(v) = self.script.pop_front() {
            snapshot
                .readings
                .insert(self.input.unwrap_or(SensorInput::Co2Ppm), v);
        }
        snapshot
    }
}

// ── Actuator ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActuationCall {
    pub variable: ControlVariable,
    pub to: bool,
    pub hold_time: Option<f32>,
}

#[derive(Default)]
pub struct MockActuator {
    pub calls: Vec<ActuationCall>,
    pub fail: bool,
}

#[allow(dead_code)]
impl MockActuator {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl ActuationSink for MockActuator {
    fn actuate(
        &mut self,
        variable: ControlVariable,
        to: bool,
        hold_time: Option<f32>,
    ) -> Result<(), ActuationError> {
        self.calls.push(ActuationCall {
            variable,
            to,
            hold_time,
        });
        if self.fail {
            Err(ActuationError::TransmitFailed)
        } else {
            Ok(())
        }
    }
}

// ── Commands ──────────────────────────────────────────────────

/// One batch of manual commands per poll.
#[derive(Default)]
pub struct ScriptedCommands {
    batches: VecDeque<Vec<ManualCommand>>,
}

#[allow(dead_code)]
impl ScriptedCommands {
    pub fn new(batches: Vec<Vec<&str>>) -> Self {
        Self {
            batches: batches
                .into_iter()
                .map(|b| b.into_iter().map(|c| c.parse().unwrap()).collect())
                .collect(),
        }
    }
}

impl CommandPort for ScriptedCommands {
    fn poll_manual(&mut self) -> Vec<ManualCommand> {
        self.batches.pop_front().unwrap_or_default()
    }
}

// ── Events ────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn changes(&self) -> Vec<(ControlVariable, bool, OverrideSource)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::ControlChanged {
                    variable,
                    to,
                    source,
                    ..
                } => Some((*variable, *to, *source)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Clock ─────────────────────────────────────────────────────

/// Advances by `step` on every call after the first.
pub struct SteppingClock {
    start: DateTime<Utc>,
    step: TimeDelta,
    calls: Cell<i32>,
}

#[allow(dead_code)]
impl SteppingClock {
    pub fn new(start: DateTime<Utc>, step: TimeDelta) -> Self {
        Self {
            start,
            step,
            calls: Cell::new(0),
        }
    }
}

impl ClockPort for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let n = self.calls.get();
        self.calls.set(n + 1);
        self.start + self.step * n
    }
}
