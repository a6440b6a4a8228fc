//! Application service, the hexagonal core.
//!
//! [`ControlService`] owns the control state, the pending triggers of the
//! current run and the tick bookkeeping.  It exposes a clean,
//! hardware-agnostic API.  All I/O flows through port traits injected at
//! call sites, making the entire service testable with mock adapters.
//!
//! ```text
//!  SensorPort  ──▶ ┌────────────────────────────┐ ──▶ EventSink
//!  CommandPort ──▶ │       ControlService        │
//! ActuationSink ◀──│ profile · scheduler · state │ ◀─▶ StatePort
//!                  └────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::config::SystemConfig;
use crate::control::{ControlProfile, ControlState, TickInput};
use crate::scheduler::TriggerScheduler;
use crate::trigger::ControlTrigger;

use super::events::AppEvent;
use super::ports::{ActuationSink, CommandPort, EventSink, SensorPort, StatePort};

/// Every port one tick talks to.
pub struct TickPorts<'a> {
    pub sensors: &'a mut dyn SensorPort,
    pub commands: &'a mut dyn CommandPort,
    pub actuator: &'a mut dyn ActuationSink,
    pub events: &'a mut dyn EventSink,
}

/// Totals of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub ticks: u64,
    pub overrides_applied: u64,
}

// ───────────────────────────────────────────────────────────────
// ControlService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic of one run.
pub struct ControlService {
    profile: Box<dyn ControlProfile>,
    config: SystemConfig,
    state: ControlState,
    scheduler: TriggerScheduler,
    /// Seconds per control tick (derived from config).
    tick_secs: f32,
    last_tick: Option<DateTime<Utc>>,
    tick_count: u64,
    overrides_applied: u64,
}

impl ControlService {
    /// Construct the service and load the profile's initial state.
    ///
    /// Does **not** select triggers; call [`start`](Self::start) next.
    pub fn new(
        profile: Box<dyn ControlProfile>,
        config: SystemConfig,
        store: &mut dyn StatePort,
    ) -> Self {
        let tick_secs = config.sampling_interval_ms as f32 / 1000.0;
        let state = profile.initial_state(store);
        Self {
            profile,
            config,
            state,
            scheduler: TriggerScheduler::default(),
            tick_secs,
            last_tick: None,
            tick_count: 0,
            overrides_applied: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Select the triggers of the run starting at `run_start`.
    pub fn start(
        &mut self,
        run_start: DateTime<Utc>,
        triggers: &[ControlTrigger],
        sink: &mut dyn EventSink,
    ) {
        self.scheduler = TriggerScheduler::for_run(
            triggers,
            run_start,
            self.config.run_duration(),
            self.config.trigger_safety_offset(),
        );
        self.last_tick = Some(run_start);
        sink.emit(&AppEvent::Started {
            profile: self.profile.name(),
            pending_triggers: self.scheduler.pending_count(),
        });
        info!(
            "ControlService started ({}, {} of {} triggers pending)",
            self.profile.name(),
            self.scheduler.pending_count(),
            triggers.len()
        );
    }

    /// Persist the state and report the run totals.
    pub fn finish(
        &mut self,
        store: &mut dyn StatePort,
        interrupted: bool,
        sink: &mut dyn EventSink,
    ) -> RunStats {
        if let Err(e) = self.profile.persist(&self.state, store) {
            warn!("Control state not saved: {}", e);
        }
        let stats = RunStats {
            ticks: self.tick_count,
            overrides_applied: self.overrides_applied,
        };
        sink.emit(&AppEvent::Finished {
            ticks: stats.ticks,
            overrides_applied: stats.overrides_applied,
            interrupted,
        });
        stats
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full control cycle: read sensors → merge commands → control.
    ///
    /// The trigger window is `[previous tick, now]`.
    pub fn tick(&mut self, now: DateTime<Utc>, ports: &mut TickPorts<'_>) {
        self.tick_count += 1;
        let last_tick = self.last_tick.unwrap_or(now);

        // 1. Read sensors via SensorPort
        let snapshot = ports.sensors.read_all(now);

        // 2. Manual commands received since the last tick
        let manual = ports.commands.poll_manual();

        // 3. Control
        let outcome = self.profile.tick(
            &self.state,
            TickInput {
                sampling_interval: self.tick_secs,
                snapshot: &snapshot,
                last_tick,
                now,
                manual,
            },
            &mut self.scheduler,
            &mut *ports.actuator,
            &mut *ports.events,
        );

        self.overrides_applied += outcome.applied as u64;
        self.state = outcome.state;
        self.last_tick = Some(now);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    pub fn profile_name(&self) -> &'static str {
        self.profile.name()
    }

    /// Total control ticks executed this run.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn overrides_applied(&self) -> u64 {
        self.overrides_applied
    }

    pub fn pending_triggers(&self) -> usize {
        self.scheduler.pending_count()
    }

    pub fn last_tick(&self) -> Option<DateTime<Utc>> {
        self.last_tick
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }
}
