//! Hysteresis threshold controller with hold-time debouncing.
//!
//! ```text
//!   value ▲         active region (above)
//!         │  ───────────────────────────── baseline        (activating)
//!         │  ░░░░░░░░░░░░ gap ░░░░░░░░░░░░
//!         │  ───────────────────────────── baseline − gap  (deactivating)
//!         │         inactive region
//! ```
//!
//! [`tick`] is pure: the hold-time counter goes in as a value and comes back
//! in [`ThresholdOutcome`].

use super::params::{HoldTimeBounds, HoldTimes, ThresholdBand};

/// Result of one controller evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdOutcome {
    /// `Some(!target)` when the target must flip.
    pub flip_to: Option<bool>,
    /// Updated counter; `None` iff no counter was supplied.
    pub hold_time_counter: Option<f32>,
}

/// Evaluate one controller for one sampling interval.
///
/// * `target` is the current value of the controlled variable.
/// * `manual_override` suppresses the threshold decision for this tick.  If
///   a counter and a branch override exist the counter is set to
///   `hold_min − override`, so it reaches `hold_min` after `override`
///   more seconds.  The result may be negative.
/// * The counter must exceed `hold_min` for an input-driven flip, and a
///   counter above `hold_max` forces a flip regardless of input.
pub fn tick(
    sampling_interval: f32,
    input: f32,
    target: bool,
    band: &ThresholdBand,
    manual_override: bool,
    hold_time_counter: Option<f32>,
    hold: &HoldTimes,
) -> ThresholdOutcome {
    let counter = hold_time_counter.map(|c| c + sampling_interval);

    let is_active = target == band.active_state_is_on;
    let bounds = hold.branch(is_active);
    let threshold = if is_active {
        band.deactivating_threshold()
    } else {
        band.activating_threshold()
    };
    let current_region_is_below = is_active != band.active_region_is_above;

    if manual_override {
        return ThresholdOutcome {
            flip_to: None,
            hold_time_counter: manual_counter(counter, bounds),
        };
    }

    let crossed = (input > threshold) == current_region_is_below;
    let held_long_enough = counter.is_none_or(|c| c > bounds.min);
    let held_too_long = counter.is_some_and(|c| c > bounds.max);

    if (crossed && held_long_enough) || held_too_long {
        ThresholdOutcome {
            flip_to: Some(!target),
            hold_time_counter: counter.map(|_| 0.0),
        }
    } else {
        ThresholdOutcome {
            flip_to: None,
            hold_time_counter: counter,
        }
    }
}

/// Counter bookkeeping for a tick without an input value.
///
/// Advances the counter and honours a manual override exactly like
/// [`tick`], but never decides a flip: without a reading neither the
/// threshold nor the hold maximum is evaluated.
pub fn tick_without_input(
    sampling_interval: f32,
    target: bool,
    band: &ThresholdBand,
    manual_override: bool,
    hold_time_counter: Option<f32>,
    hold: &HoldTimes,
) -> Option<f32> {
    let counter = hold_time_counter.map(|c| c + sampling_interval);
    if manual_override {
        manual_counter(counter, hold.branch(target == band.active_state_is_on))
    } else {
        counter
    }
}

fn manual_counter(counter: Option<f32>, bounds: &HoldTimeBounds) -> Option<f32> {
    match (counter, bounds.override_secs) {
        (Some(_), Some(secs)) => Some(bounds.min - secs),
        (c, _) => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CO2: ThresholdBand = ThresholdBand {
        baseline: 700.0,
        gap: 50.0,
        active_region_is_above: true,
        active_state_is_on: true,
    };

    fn run(inputs: &[f32], mut target: bool, band: &ThresholdBand) -> Vec<Option<bool>> {
        let hold = HoldTimes::default();
        let mut counter = Some(0.0);
        inputs
            .iter()
            .map(|&input| {
                let out = tick(3.0, input, target, band, false, counter, &hold);
                counter = out.hold_time_counter;
                if let Some(to) = out.flip_to {
                    target = to;
                }
                out.flip_to
            })
            .collect()
    }

    #[test]
    fn co2_sequence_flips_on_then_off() {
        assert_eq!(
            run(&[650.0, 705.0, 705.0, 640.0], false, &CO2),
            vec![None, Some(true), None, Some(false)]
        );
    }

    #[test]
    fn same_sequence_without_counter() {
        let hold = HoldTimes::default();
        let a = tick(3.0, 705.0, false, &CO2, false, None, &hold);
        assert_eq!(a.flip_to, Some(true));
        assert_eq!(a.hold_time_counter, None);
    }

    #[test]
    fn input_equal_to_threshold_does_not_activate() {
        let out = tick(3.0, 700.0, false, &CO2, false, None, &HoldTimes::default());
        assert_eq!(out.flip_to, None);
    }

    #[test]
    fn input_equal_to_deactivating_threshold_deactivates() {
        let out = tick(3.0, 650.0, true, &CO2, false, None, &HoldTimes::default());
        assert_eq!(out.flip_to, Some(false));
    }

    #[test]
    fn active_region_below_inverts_directions() {
        // Dehumidifier-style inverse: active when humidity falls below 40.
        let band = ThresholdBand {
            baseline: 40.0,
            gap: 5.0,
            active_region_is_above: false,
            active_state_is_on: true,
        };
        assert_eq!(
            run(&[50.0, 39.0, 44.0, 45.5], false, &band),
            vec![None, Some(true), None, Some(false)]
        );
    }

    #[test]
    fn active_state_off_inverts_values() {
        let band = ThresholdBand {
            active_state_is_on: false,
            ..CO2
        };
        // `true` is the inactive state here, so crossing 700 flips to false.
        assert_eq!(run(&[705.0, 640.0], true, &band), vec![Some(false), Some(true)]);
    }

    #[test]
    fn hold_min_delays_flip() {
        let hold = HoldTimes {
            inactive: HoldTimeBounds::new(10.0, f32::INFINITY),
            active: HoldTimeBounds::UNBOUNDED,
        };
        let mut counter = Some(0.0);
        let mut flips = Vec::new();
        for _ in 0..4 {
            let out = tick(3.0, 800.0, false, &CO2, false, counter, &hold);
            counter = out.hold_time_counter;
            flips.push(out.flip_to);
        }
        // 3, 6, 9 are not > 10; 12 is.
        assert_eq!(flips, vec![None, None, None, Some(true)]);
        assert_eq!(counter, Some(0.0));
    }

    #[test]
    fn hold_max_forces_flip() {
        let hold = HoldTimes {
            inactive: HoldTimeBounds::UNBOUNDED,
            active: HoldTimeBounds::new(0.0, 5.0),
        };
        let out = tick(3.0, 900.0, true, &CO2, false, Some(3.0), &hold);
        assert_eq!(out.flip_to, Some(false));
        assert_eq!(out.hold_time_counter, Some(0.0));
    }

    #[test]
    fn manual_override_sets_counter_below_min() {
        let hold = HoldTimes {
            inactive: HoldTimeBounds::new(300.0, f32::INFINITY),
            active: HoldTimeBounds::new(600.0, 3600.0).with_override(900.0),
        };
        let out = tick(3.0, 900.0, true, &CO2, true, Some(42.0), &hold);
        assert_eq!(out.flip_to, None);
        assert_eq!(out.hold_time_counter, Some(600.0 - 900.0));
    }

    #[test]
    fn manual_override_without_branch_override_keeps_counter() {
        let out = tick(3.0, 900.0, false, &CO2, true, Some(1.0), &HoldTimes::default());
        assert_eq!(out.flip_to, None);
        assert_eq!(out.hold_time_counter, Some(4.0));
    }

    #[test]
    fn negative_counter_reaches_min_after_override_seconds() {
        let hold = HoldTimes::default().with_override(6.0);
        let first = tick(3.0, 900.0, true, &CO2, true, Some(0.0), &hold);
        assert_eq!(first.hold_time_counter, Some(-6.0));
        // Input is in the deactivating region but the dwell is not over yet.
        let a = tick(3.0, 600.0, true, &CO2, false, first.hold_time_counter, &hold);
        assert_eq!(a.flip_to, None);
        let b = tick(3.0, 600.0, true, &CO2, false, a.hold_time_counter, &hold);
        assert_eq!(b.hold_time_counter, Some(0.0));
        assert_eq!(b.flip_to, None);
        let c = tick(3.0, 600.0, true, &CO2, false, b.hold_time_counter, &hold);
        assert_eq!(c.flip_to, Some(false));
    }
    #[test]
    fn no_input_only_advances_counter() {
        let bounds = HoldTimeBounds::new(60.0, 90.0);
        let hold = HoldTimes { inactive: bounds, active: bounds };
        // Past the maximum, yet no reading means no decision.
        assert_eq!(tick_without_input(3.0, true, &CO2, false, Some(100.0), &hold), Some(103.0));
        assert_eq!(tick_without_input(3.0, true, &CO2, false, None, &hold), None);

        let hold = hold.with_override(120.0);
        assert_eq!(
            tick_without_input(3.0, true, &CO2, true, Some(100.0), &hold),
            Some(60.0 - 120.0)
        );
    }
}
