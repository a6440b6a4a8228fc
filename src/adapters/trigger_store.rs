//! Trigger records on top of a [`StoragePort`].
//!
//! One JSON file per trigger under `triggers/<hostname>/<name>.json`.  Each
//! record carries a schema tag; records with another tag, or that do not
//! parse, are skipped with a warning instead of failing the whole load.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::{StorageError, StoragePort, TriggerStorePort};
use crate::error::{Error, Result, TriggerError};
use crate::trigger::ControlTrigger;

/// Tag written into every record.
pub const TRIGGER_SCHEMA: &str = "control-trigger/1";

const EXTENSION: &str = ".json";

#[derive(Serialize, Deserialize)]
struct TriggerRecord {
    schema: String,
    trigger: ControlTrigger,
}

/// `true` if `name` can be used as a record file name.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 64
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// A hold time, when given, must be a finite non-negative number of seconds.
fn hold_time_is_valid(trigger: &ControlTrigger) -> bool {
    trigger.hold_time.is_none_or(|h| h.is_finite() && h >= 0.0)
}

fn decode(bytes: &[u8]) -> core::result::Result<ControlTrigger, TriggerError> {
    let record: TriggerRecord =
        serde_json::from_slice(bytes).map_err(|_| TriggerError::Malformed)?;
    if record.schema != TRIGGER_SCHEMA {
        return Err(TriggerError::SchemaMismatch);
    }
    if !hold_time_is_valid(&record.trigger) {
        return Err(TriggerError::Malformed);
    }
    Ok(record.trigger)
}

pub struct TriggerStore<S: StoragePort> {
    storage: S,
    namespace: String,
}

impl<S: StoragePort> TriggerStore<S> {
    pub fn new(storage: S, hostname: &str) -> Self {
        Self {
            storage,
            namespace: format!("triggers/{hostname}"),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn key(name: &str) -> Result<String> {
        if !is_valid_name(name) {
            return Err(TriggerError::InvalidName.into());
        }
        Ok(format!("{name}{EXTENSION}"))
    }
}

impl<S: StoragePort> TriggerStorePort for TriggerStore<S> {
    fn load_all(&self) -> Vec<ControlTrigger> {
        let keys = match self.storage.keys(&self.namespace) {
            Ok(keys) => keys,
            Err(e) => {
                warn!("TriggerStore: listing {} failed: {}", self.namespace, e);
                return Vec::new();
            }
        };

        let mut triggers = Vec::with_capacity(keys.len());
        for key in keys.iter().filter(|k| k.ends_with(EXTENSION)) {
            let decoded = self
                .storage
                .read(&self.namespace, key)
                .map_err(Error::from)
                .and_then(|bytes| decode(&bytes).map_err(Error::from));
            match decoded {
                Ok(trigger) => triggers.push(trigger),
                Err(e) => warn!("TriggerStore: skipping {}/{}: {}", self.namespace, key, e),
            }
        }
        triggers
    }

    fn put(&mut self, trigger: &ControlTrigger) -> Result<()> {
        let key = Self::key(&trigger.name)?;
        if !hold_time_is_valid(trigger) {
            return Err(TriggerError::Malformed.into());
        }
        let record = TriggerRecord {
            schema: TRIGGER_SCHEMA.to_string(),
            trigger: trigger.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&record).map_err(|e| {
            warn!("TriggerStore: encode '{}' failed: {}", trigger.name, e);
            TriggerError::Malformed
        })?;
        self.storage.write(&self.namespace, &key, &bytes)?;
        debug!("TriggerStore: saved {}/{}", self.namespace, key);
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<bool> {
        let key = Self::key(name)?;
        if !self.storage.exists(&self.namespace, &key) {
            return Ok(false);
        }
        match self.storage.delete(&self.namespace, &key) {
            Ok(()) | Err(StorageError::NotFound) => Ok(true),
            Err(e) => Err(e.into()),
        }
    }
}
