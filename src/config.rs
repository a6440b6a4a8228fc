//! System configuration parameters
//!
//! Timing and sensor wiring for one host.  Control parameters are not part
//! of this file; they come from the host profile and are fixed for the
//! process lifetime.

use serde::{Deserialize, Serialize};

use crate::control::SensorInput;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Sampling ---
    /// Interval between two sensor samples (milliseconds)
    pub sampling_interval_ms: u32,
    /// Samples averaged into one aggregate row
    pub samples_per_aggregate: u32,
    /// Aggregate rows per run
    pub aggregates_per_run: u32,

    // --- Triggers ---
    /// Forward shift applied to every trigger time (milliseconds)
    pub trigger_safety_offset_ms: u32,

    // --- Shutdown ---
    /// Upper bound on one uninterrupted sleep slice (milliseconds)
    pub wait_slice_ms: u32,

    // --- Sensors ---
    /// Values exported to files by external acquisition daemons
    pub sensor_files: Vec<SensorFileConfig>,
}

/// One numeric sensor value read from a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorFileConfig {
    pub name: String,
    pub input: SensorInput,
    pub path: std::path::PathBuf,
    /// Multiplier applied to the parsed value (e.g. 0.001 for milli-units).
    #[serde(default = "default_scale")]
    pub scale: f32,
}

fn default_scale() -> f32 {
    1.0
}

impl SystemConfig {
    pub fn samples_per_run(&self) -> u32 {
        self.samples_per_aggregate.saturating_mul(self.aggregates_per_run)
    }

    pub fn sampling_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(u64::from(self.sampling_interval_ms))
    }

    /// Wall-clock length of one run.
    pub fn run_duration(&self) -> chrono::TimeDelta {
        chrono::TimeDelta::milliseconds(
            i64::from(self.sampling_interval_ms) * i64::from(self.samples_per_run()),
        )
    }

    pub fn trigger_safety_offset(&self) -> chrono::TimeDelta {
        chrono::TimeDelta::milliseconds(i64::from(self.trigger_safety_offset_ms))
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Sampling: 3 s × 5 × 60 = one run every 15 min
            sampling_interval_ms: 3000,
            samples_per_aggregate: 5,
            aggregates_per_run: 60,

            // Triggers
            trigger_safety_offset_ms: 500,

            // Shutdown
            wait_slice_ms: 100,

            sensor_files: Vec::new(),
        }
    }
}
