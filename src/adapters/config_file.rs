//! JSON configuration file adapter.
//!
//! Implements [`ConfigPort`] on a single JSON file.
//!
//! - **Missing file**: [`SystemConfig::default()`].
//! - **Unparseable file**: [`ConfigError::Corrupted`].
//! - **Out-of-range values**: [`ConfigError::ValidationFailed`] on load and
//!   before every save; nothing is silently clamped.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::SystemConfig;

pub struct JsonConfigFile {
    path: PathBuf,
}

impl JsonConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigPort for JsonConfigFile {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("JsonConfigFile: {} not found, using defaults", self.path.display());
                return Ok(SystemConfig::default());
            }
            Err(e) => {
                warn!("JsonConfigFile: read {} failed: {}", self.path.display(), e);
                return Err(ConfigError::IoError);
            }
        };

        let cfg: SystemConfig = serde_json::from_slice(&bytes).map_err(|e| {
            warn!("JsonConfigFile: {} is corrupted: {}", self.path.display(), e);
            ConfigError::Corrupted
        })?;
        validate_config(&cfg)?;
        info!("JsonConfigFile: loaded {}", self.path.display());
        Ok(cfg)
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        validate_config(config)?;
        let json = serde_json::to_vec_pretty(config).map_err(|_| ConfigError::Corrupted)?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|_| ConfigError::IoError)?;
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        fs::write(&tmp, &json)
            .and_then(|()| fs::rename(&tmp, &self.path))
            .map_err(|e| {
                warn!("JsonConfigFile: write {} failed: {}", self.path.display(), e);
                let _ = fs::remove_file(&tmp);
                ConfigError::IoError
            })?;
        info!("JsonConfigFile: saved {}", self.path.display());
        Ok(())
    }
}

/// Range checks for every field of [`SystemConfig`].
pub fn validate_config(cfg: &SystemConfig) -> Result<(), ConfigError> {
    if !(100..=600_000).contains(&cfg.sampling_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "sampling_interval_ms must be 100-600000",
        ));
    }
    if !(1..=10_000).contains(&cfg.samples_per_aggregate) {
        return Err(ConfigError::ValidationFailed(
            "samples_per_aggregate must be 1-10000",
        ));
    }
    if !(1..=10_000).contains(&cfg.aggregates_per_run) {
        return Err(ConfigError::ValidationFailed(
            "aggregates_per_run must be 1-10000",
        ));
    }
    if cfg.trigger_safety_offset_ms >= cfg.sampling_interval_ms {
        return Err(ConfigError::ValidationFailed(
            "trigger_safety_offset_ms must be < sampling_interval_ms",
        ));
    }
    if !(1..=10_000).contains(&cfg.wait_slice_ms) {
        return Err(ConfigError::ValidationFailed("wait_slice_ms must be 1-10000"));
    }
    for sensor in &cfg.sensor_files {
        if sensor.name.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "sensor_files[].name must not be empty",
            ));
        }
        if !sensor.scale.is_finite() || sensor.scale == 0.0 {
            return Err(ConfigError::ValidationFailed(
                "sensor_files[].scale must be finite and non-zero",
            ));
        }
    }
    Ok(())
}
