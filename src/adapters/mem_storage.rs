//! In-memory storage adapter.
//!
//! Implements [`StoragePort`] over a map.  Used for dry runs and tests; the
//! contents vanish with the process.

use std::collections::BTreeMap;

use crate::app::ports::{StorageError, StoragePort};

use super::fs_storage::is_valid_component;

#[derive(Debug, Default, Clone)]
pub struct MemStorage {
    store: BTreeMap<(String, String), Vec<u8>>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    fn composite_key(namespace: &str, key: &str) -> Result<(String, String), StorageError> {
        if namespace.is_empty()
            || !namespace.split('/').all(is_valid_component)
            || !is_valid_component(key)
        {
            return Err(StorageError::InvalidKey);
        }
        Ok((namespace.to_string(), key.to_string()))
    }
}

impl StoragePort for MemStorage {
    fn read(&self, namespace: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let composite = Self::composite_key(namespace, key)?;
        self.store.get(&composite).cloned().ok_or(StorageError::NotFound)
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let composite = Self::composite_key(namespace, key)?;
        self.store.insert(composite, data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        let composite = Self::composite_key(namespace, key)?;
        self.store.remove(&composite);
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        Self::composite_key(namespace, key).is_ok_and(|c| self.store.contains_key(&c))
    }

    fn keys(&self, namespace: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .store
            .keys()
            .filter(|(ns, _)| ns == namespace)
            .map(|(_, k)| k.clone())
            .collect())
    }
}
