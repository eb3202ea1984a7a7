//! Small JSON files used as key-value stores.
//!
//! Every mutation reads the whole file, changes it and writes it back.
//! A missing or unreadable file reads as the default value. Writes go to a
//! temporary file in the same directory that is then renamed over the store.
//! Read-modify-write cycles are serialized within the process only; running
//! several processes against the same file needs an external lock.

pub mod metrics;
pub mod sequence;

pub use metrics::{UsageMetrics, UsageStats};
pub use sequence::SequenceStore;

use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write store file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize store data")]
    Serialize(#[from] serde_json::Error),
}

/// A JSON document on disk holding a `T`.
pub struct JsonFile<T> {
    path: PathBuf,
    lock: Mutex<()>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonFile<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current contents; `T::default()` when the file is missing or corrupt.
    pub fn load(&self) -> T {
        let _guard = self.lock.lock();
        self.read()
    }

    /// Run `f` on the current contents and persist the result.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, StoreError> {
        let _guard = self.lock.lock();
        let mut data = self.read();
        let result = f(&mut data);
        self.write(&data)?;
        Ok(result)
    }

    fn read(&self) -> T {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return T::default(),
            Err(e) => {
                log::warn!("Failed to read {}: {}, using empty data", self.path.display(), e);
                return T::default();
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(e) => {
                log::warn!("Corrupt store file {}: {}, using empty data", self.path.display(), e);
                T::default()
            }
        }
    }

    fn write(&self, data: &T) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(data)?;
        let io_err = |source: std::io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(io_err)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(io_err)?;
        tmp.write_all(&json).map_err(io_err)?;
        tmp.flush().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}
