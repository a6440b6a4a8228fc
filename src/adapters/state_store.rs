//! Control state slot on top of a [`StoragePort`].
//!
//! The record lives under `shortly/<hostname>` with a key derived from the
//! profile's schema fingerprint.  A record is read at most once: it is
//! deleted as soon as it has been loaded, whether or not it decoded, so a
//! stale state never survives a crashed run.

use log::{info, warn};

use crate::app::ports::{StatePort, StorageError, StoragePort};
use crate::control::schema::{self, state_key};
use crate::control::ControlState;

pub struct StateStore<S: StoragePort> {
    storage: S,
    namespace: String,
    key: String,
    fingerprint: u64,
}

impl<S: StoragePort> StateStore<S> {
    pub fn new(storage: S, hostname: &str, fingerprint: u64) -> Self {
        Self {
            storage,
            namespace: format!("shortly/{hostname}"),
            key: state_key(fingerprint),
            fingerprint,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn discard(&mut self) {
        if let Err(e) = self.storage.delete(&self.namespace, &self.key) {
            warn!("StateStore: could not delete {}/{}: {}", self.namespace, self.key, e);
        }
    }
}

impl<S: StoragePort> StatePort for StateStore<S> {
    fn load(&mut self) -> Option<ControlState> {
        let bytes = match self.storage.read(&self.namespace, &self.key) {
            Ok(bytes) => bytes,
            Err(StorageError::NotFound) => return None,
            Err(e) => {
                warn!("StateStore: read {}/{} failed: {}", self.namespace, self.key, e);
                return None;
            }
        };

        let decoded = schema::decode(&bytes, self.fingerprint);
        self.discard();
        match decoded {
            Ok(state) => {
                info!("StateStore: loaded {}/{}", self.namespace, self.key);
                Some(state)
            }
            Err(e) => {
                warn!("StateStore: discarding {}/{}: {}", self.namespace, self.key, e);
                None
            }
        }
    }

    fn save(&mut self, state: &ControlState) -> Result<(), StorageError> {
        let bytes = schema::encode(state, self.fingerprint).map_err(|e| {
            warn!("StateStore: encode failed: {}", e);
            StorageError::IoError
        })?;
        self.storage.write(&self.namespace, &self.key, &bytes)?;
        info!("StateStore: saved {}/{} ({} bytes)", self.namespace, self.key, bytes.len());
        Ok(())
    }

    fn clear(&mut self) {
        self.discard();
    }
}

/// State port that never remembers anything.
#[derive(Debug, Default)]
pub struct NoPersistence;

impl StatePort for NoPersistence {
    fn load(&mut self) -> Option<ControlState> {
        None
    }

    fn save(&mut self, _state: &ControlState) -> Result<(), StorageError> {
        Ok(())
    }

    fn clear(&mut self) {}
}
