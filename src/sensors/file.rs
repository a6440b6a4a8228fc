//! Sensor value exported to a file by an external acquisition daemon
//! (sysfs `in_*_input`, a DHT22 helper writing `/run/dht22/humidity`, …).

use std::path::PathBuf;

use log::debug;

use crate::config::SensorFileConfig;
use crate::control::SensorInput;
use crate::error::SensorError;

use super::Sensor;

pub struct FileSensor {
    name: String,
    input: SensorInput,
    path: PathBuf,
    scale: f32,
}

impl FileSensor {
    pub fn new(name: impl Into<String>, input: SensorInput, path: impl Into<PathBuf>, scale: f32) -> Self {
        Self {
            name: name.into(),
            input,
            path: path.into(),
            scale,
        }
    }

    pub fn from_config(cfg: &SensorFileConfig) -> Self {
        Self::new(cfg.name.clone(), cfg.input, cfg.path.clone(), cfg.scale)
    }
}

impl Sensor for FileSensor {
    fn input(&self) -> SensorInput {
        self.input
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn sample(&mut self) -> Result<f32, SensorError> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            debug!("{}: read {} failed: {}", self.name, self.path.display(), e);
            SensorError::ReadFailed
        })?;
        let raw: f32 = text.trim().parse().map_err(|_| SensorError::ParseFailed)?;
        Ok(raw * self.scale)
    }
}
