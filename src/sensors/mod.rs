//! Sensor subsystem: individual sources and the aggregating [`SensorHub`].
//!
//! The hub owns every sensor and produces a [`SensorSnapshot`] each tick.
//! Sensors are read concurrently, one scoped thread each, and all of them
//! are joined before the snapshot is returned.

pub mod file;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use log::{debug, warn};

use crate::app::ports::SensorPort;
use crate::control::SensorInput;
use crate::error::SensorError;

/// Readings of one sampling cycle.  Absent inputs failed or are not wired.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSnapshot {
    pub timestamp: DateTime<Utc>,
    pub readings: BTreeMap<SensorInput, f32>,
}

impl SensorSnapshot {
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            readings: BTreeMap::new(),
        }
    }

    pub fn get(&self, input: SensorInput) -> Option<f32> {
        self.readings.get(&input).copied()
    }
}

/// One numeric source.
pub trait Sensor: Send {
    fn input(&self) -> SensorInput;

    fn name(&self) -> &str;

    /// Blocking read.
    fn sample(&mut self) -> Result<f32, SensorError>;
}

/// Aggregates all sensors and produces a unified snapshot.
#[derive(Default)]
pub struct SensorHub {
    sensors: Vec<Box<dyn Sensor>>,
}

impl SensorHub {
    pub fn new(sensors: Vec<Box<dyn Sensor>>) -> Self {
        Self { sensors }
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// Read every sensor and return a unified snapshot.
    ///
    /// Individual failures are logged and leave the input absent; a single
    /// flaky sensor must not crash the control loop.  When two sensors feed
    /// the same input the later one in the list wins.
    pub fn read_all(&mut self, now: DateTime<Utc>) -> SensorSnapshot {
        let results: Vec<(SensorInput, String, Result<f32, SensorError>)> =
            std::thread::scope(|scope| {
                let handles: Vec<_> = self
                    .sensors
                    .iter_mut()
                    .map(|sensor| {
                        let input = sensor.input();
                        let name = sensor.name().to_string();
                        let handle = scope.spawn(move || sensor.sample());
                        (input, name, handle)
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|(input, name, handle)| {
                        let result = handle.join().unwrap_or(Err(SensorError::WorkerPanicked));
                        (input, name, result)
                    })
                    .collect()
            });

        let mut snapshot = SensorSnapshot::empty(now);
        for (input, name, result) in results {
            match result.and_then(finite) {
                Ok(value) => {
                    debug!("{} ({}) = {}", name, input, value);
                    snapshot.readings.insert(input, value);
                }
                Err(e) => warn!("Sensor {} ({}) failed: {}", name, input, e),
            }
        }
        snapshot
    }
}

impl SensorPort for SensorHub {
    fn read_all(&mut self, now: DateTime<Utc>) -> SensorSnapshot {
        SensorHub::read_all(self, now)
    }
}

fn finite(value: f32) -> Result<f32, SensorError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SensorError::NonFinite)
    }
}
