//! Filesystem storage adapter.
//!
//! Implements [`StoragePort`] on top of a directory tree:
//! `<root>/<namespace>/<key>`.
//!
//! - Namespace and key validation: only plain relative components, so a
//!   trigger name can never escape the data directory.
//! - Atomic writes: data goes to a temporary sibling first and is renamed
//!   over the target.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::app::ports::{StorageError, StoragePort};

const TMP_SUFFIX: &str = ".tmp";

pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dir(&self, namespace: &str) -> Result<PathBuf, StorageError> {
        if namespace.is_empty() {
            return Err(StorageError::InvalidKey);
        }
        let mut dir = self.root.clone();
        for part in namespace.split('/') {
            if !is_valid_component(part) {
                return Err(StorageError::InvalidKey);
            }
            dir.push(part);
        }
        Ok(dir)
    }

    fn path(&self, namespace: &str, key: &str) -> Result<PathBuf, StorageError> {
        if !is_valid_component(key) {
            return Err(StorageError::InvalidKey);
        }
        Ok(self.dir(namespace)?.join(key))
    }
}

/// `true` for a single, non-special path component.
pub fn is_valid_component(s: &str) -> bool {
    !s.is_empty()
        && s != "."
        && s != ".."
        && !s.ends_with(TMP_SUFFIX)
        && !s.chars().any(|c| c == '/' || c == '\\' || c == '\0')
}

fn io_error(op: &str, path: &Path, e: &std::io::Error) -> StorageError {
    if e.kind() == ErrorKind::NotFound {
        StorageError::NotFound
    } else {
        warn!("FsStorage: {} {} failed: {}", op, path.display(), e);
        StorageError::IoError
    }
}

impl StoragePort for FsStorage {
    fn read(&self, namespace: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path(namespace, key)?;
        fs::read(&path).map_err(|e| io_error("read", &path, &e))
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let path = self.path(namespace, key)?;
        let dir = self.dir(namespace)?;
        fs::create_dir_all(&dir).map_err(|e| io_error("mkdir", &dir, &e))?;

        let tmp = dir.join(format!("{key}{TMP_SUFFIX}"));
        let result = fs::File::create(&tmp)
            .and_then(|mut f| {
                f.write_all(data)?;
                f.sync_all()
            })
            .and_then(|()| fs::rename(&tmp, &path));
        if let Err(e) = result {
            let _ = fs::remove_file(&tmp);
            return Err(io_error("write", &path, &e));
        }
        debug!("FsStorage: wrote {} ({} bytes)", path.display(), data.len());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        let path = self.path(namespace, key)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("FsStorage: deleted {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("delete", &path, &e)),
        }
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.path(namespace, key).is_ok_and(|p| p.is_file())
    }

    fn keys(&self, namespace: &str) -> Result<Vec<String>, StorageError> {
        let dir = self.dir(namespace)?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error("list", &dir, &e)),
        };
        let mut keys: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|name| is_valid_component(name))
            .collect();
        keys.sort();
        Ok(keys)
    }
}
