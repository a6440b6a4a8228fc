//! Sampling loop of one run.
//!
//! Deadlines are derived from one monotonic reference
//! (`reference + interval × (i + 1)`) so slow ticks do not accumulate
//! drift.  Every wait is cancellable; a cancelled wait ends the run before
//! the next tick starts, so a tick either runs completely or not at all.

use std::time::{Duration, Instant};

use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, info};

use crate::config::SystemConfig;
use crate::shutdown::{ShutdownToken, WaitOutcome};

use super::ports::ClockPort;
use super::service::{ControlService, TickPorts};

/// Timing of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunPlan {
    pub run_start: DateTime<Utc>,
    pub sampling_interval: Duration,
    pub samples: u32,
    pub wait_slice: Duration,
}

impl RunPlan {
    pub fn from_config(config: &SystemConfig, run_start: DateTime<Utc>) -> Self {
        Self {
            run_start,
            sampling_interval: config.sampling_interval(),
            samples: config.samples_per_run(),
            wait_slice: Duration::from_millis(u64::from(config.wait_slice_ms.max(1))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Interrupted,
}

/// Next run boundary strictly after `now`, counted in whole runs from the
/// previous UTC midnight.
pub fn next_run_start(now: DateTime<Utc>, run_duration: TimeDelta) -> DateTime<Utc> {
    let run_ms = run_duration.num_milliseconds();
    if run_ms <= 0 {
        return now;
    }
    let midnight = now.date_naive().and_time(chrono::NaiveTime::MIN).and_utc();
    let elapsed_ms = (now - midnight).num_milliseconds();
    let runs = elapsed_ms / run_ms + 1;
    midnight + TimeDelta::milliseconds(runs * run_ms)
}

/// Sleep until the wall clock reaches `plan.run_start`.
pub fn wait_for_start(plan: &RunPlan, clock: &dyn ClockPort, token: &ShutdownToken) -> WaitOutcome {
    let remaining = (plan.run_start - clock.now()).to_std().unwrap_or(Duration::ZERO);
    info!("Waiting {:.1}s for run start {}", remaining.as_secs_f32(), plan.run_start);
    token.wait_until(Instant::now() + remaining, plan.wait_slice)
}

/// Sample `plan.samples` times, one control tick per sample.
pub fn run(
    service: &mut ControlService,
    plan: &RunPlan,
    clock: &dyn ClockPort,
    token: &ShutdownToken,
    ports: &mut TickPorts<'_>,
) -> RunOutcome {
    let reference = Instant::now();
    for i in 0..plan.samples {
        let deadline = reference + plan.sampling_interval * (i + 1);
        if token.wait_until(deadline, plan.wait_slice) == WaitOutcome::Cancelled {
            info!("Run interrupted after {} of {} samples", i, plan.samples);
            return RunOutcome::Interrupted;
        }
        debug!("Sample {}/{}", i + 1, plan.samples);
        service.tick(clock.now(), ports);
    }
    RunOutcome::Completed
}
