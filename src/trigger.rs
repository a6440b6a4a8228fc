//! Scheduled control triggers and the pending set of a run.
//!
//! A trigger is either absolute (fires at one instant) or daily (only the
//! UTC time of day is significant).  At run start the triggers whose time
//! falls inside the run window become [`ControlTriggerPending`] entries,
//! which the [`TriggerScheduler`](crate::scheduler::TriggerScheduler) fires
//! tick by tick.

use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::control::ControlVariable;

/// One scheduled override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlTrigger {
    /// Unique name; also the record's file name.
    pub name: String,
    pub variable: ControlVariable,
    pub to: bool,
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub daily: bool,
    #[serde(default)]
    pub hold_time: Option<f32>,
}

impl ControlTrigger {
    /// Same trigger, `offset` later.
    pub fn shifted(&self, offset: TimeDelta) -> Self {
        Self {
            time: self.time + offset,
            ..self.clone()
        }
    }

    /// `true` if the trigger occurs within `[start, end]`, both inclusive.
    ///
    /// A daily trigger occurs at its time of day on the day of `start`, or
    /// on the following day when that is already before `start`.  A
    /// reversed interval contains nothing.
    pub fn is_in_interval(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        if end < start {
            return false;
        }
        if !self.daily {
            return start <= self.time && self.time <= end;
        }

        let occurrence = next_occurrence(self.time.time(), start);
        occurrence <= end
    }
}

/// First instant at or after `start` whose UTC time of day is `tod`.
fn next_occurrence(tod: NaiveTime, start: DateTime<Utc>) -> DateTime<Utc> {
    let same_day = start.date_naive().and_time(tod).and_utc();
    if same_day < start {
        same_day + TimeDelta::days(1)
    } else {
        same_day
    }
}

/// A trigger selected for the current run.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlTriggerPending {
    /// Already shifted by the safety offset.
    pub trigger: ControlTrigger,
    pending: bool,
}

impl ControlTriggerPending {
    pub fn new(trigger: ControlTrigger) -> Self {
        Self {
            trigger,
            pending: true,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Consume the entry; it can never become pending again.
    pub(crate) fn fire(&mut self) {
        self.pending = false;
    }
}

/// Triggers that occur within `[run_start, run_start + run_duration]` after
/// being shifted forward by `safety_offset`.
pub fn compute_pending(
    all: &[ControlTrigger],
    run_start: DateTime<Utc>,
    run_duration: TimeDelta,
    safety_offset: TimeDelta,
) -> Vec<ControlTriggerPending> {
    let run_end = run_start + run_duration;
    all.iter()
        .map(|t| t.shifted(safety_offset))
        .filter(|t| t.is_in_interval(run_start, run_end))
        .map(ControlTriggerPending::new)
        .collect()
}
