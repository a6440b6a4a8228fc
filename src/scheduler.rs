//! Trigger scheduler.
//!
//! Coexists with the threshold controllers.  Holds the pending triggers of
//! one run and turns each into exactly one [`Override`] on the tick whose
//! window first contains it.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Override Sources                         │
//! │                                                              │
//! │  ┌───────────┐      ┌──────────────────┐     ┌───────────┐   │
//! │  │  Manual   │      │ TriggerScheduler │     │ Threshold │   │
//! │  │ (stdin)   │      │ (pending set)    │     │controllers│   │
//! │  └─────┬─────┘      └────────┬─────────┘     └─────┬─────┘   │
//! │        │                     │                     │         │
//! │        ▼                     ▼                     ▼         │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │                 ControlTickEngine                      │  │
//! │  │          (applies overrides in list order)             │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, TimeDelta, Utc};
use log::info;

use crate::control::{Override, OverrideSource};
use crate::trigger::{ControlTrigger, ControlTriggerPending, compute_pending};

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Pending triggers of the current run.
///
/// Firing is decoupled from application: [`tick`](Self::tick) only returns
/// overrides, the tick engine decides when to apply them.
#[derive(Debug, Clone, Default)]
pub struct TriggerScheduler {
    pending: Vec<ControlTriggerPending>,
}

impl TriggerScheduler {
    pub fn new(pending: Vec<ControlTriggerPending>) -> Self {
        Self { pending }
    }

    /// Select the triggers of the run starting at `run_start`.
    pub fn for_run(
        all: &[ControlTrigger],
        run_start: DateTime<Utc>,
        run_duration: TimeDelta,
        safety_offset: TimeDelta,
    ) -> Self {
        let pending = compute_pending(all, run_start, run_duration, safety_offset);
        for p in &pending {
            info!(
                "Scheduler: '{}' pending at {} ({} -> {})",
                p.trigger.name,
                p.trigger.time.format("%H:%M:%S%.3f"),
                p.trigger.variable,
                p.trigger.to
            );
        }
        Self::new(pending)
    }

    /// Fire every pending trigger inside `[last_tick, now]`.
    ///
    /// Fired entries stay in the set but never fire again.
    pub fn tick(&mut self, last_tick: DateTime<Utc>, now: DateTime<Utc>) -> Vec<Override> {
        let mut fired = Vec::new();
        for entry in &mut self.pending {
            if !entry.is_pending() || !entry.trigger.is_in_interval(last_tick, now) {
                continue;
            }
            entry.fire();
            let t = &entry.trigger;
            info!("Scheduler: '{}' fired ({} -> {})", t.name, t.variable, t.to);
            fired.push(Override::new(
                t.variable,
                t.to,
                t.hold_time,
                OverrideSource::Trigger,
            ));
        }
        fired
    }

    /// Number of triggers that have not fired yet.
    pub fn pending_count(&self) -> usize {
        self.pending.iter().filter(|p| p.is_pending()).count()
    }

    pub fn entries(&self) -> &[ControlTriggerPending] {
        &self.pending
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
