//! The file-backed data store.
//!
//! The whole dataset lives in one pretty-printed JSON file. Reads load it
//! wholesale; writes replace it wholesale by writing a temporary file next to
//! it and renaming that over the canonical path, so the canonical file is
//! always either the previous or the next complete snapshot.
//!
//! Writes from this process go through a FIFO queue (a fair async mutex):
//! a [`Store::save`] resolves only once its own bytes are the current file.
//! [`Store::load`] followed by [`Store::save`] is *not* atomic as a pair; two
//! such cycles may interleave and the later save wins. [`Store::transact`]
//! serializes whole load/mutate/save cycles for callers that need that.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, error};
use rocket::serde::json::serde_json;
use rocket::tokio::{fs, io::AsyncWriteExt, sync::Mutex};
use thiserror::Error;

use crate::model::snapshot::Snapshot;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on data file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Data file {path} is not a valid snapshot: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Handle on the data file. Cloning is cheap and every clone shares the same
/// write queue, so a process should build exactly one `Store` per file.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Inner>,
}

struct Inner {
    path: PathBuf,
    temp_path: PathBuf,
    /// Held for the duration of every physical write, in arrival order.
    write_queue: Mutex<()>,
    /// Held across whole `transact` cycles.
    transactions: Mutex<()>,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut temp_path = path.clone().into_os_string();
        temp_path.push(".tmp");
        Self {
            inner: Arc::new(Inner {
                path,
                temp_path: temp_path.into(),
                write_queue: Mutex::new(()),
                transactions: Mutex::new(()),
            }),
        }
    }

    /// Path of the canonical data file.
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Path of the scratch file each write goes through.
    pub fn temp_path(&self) -> &Path {
        &self.inner.temp_path
    }

    /// Read the whole dataset, creating an empty data file (and its directory)
    /// first if none exists yet.
    pub async fn load(&self) -> Result<Snapshot, StoreError> {
        self.ensure_file().await?;
        let path = self.path();
        let bytes = fs::read(path).await.map_err(StoreError::io(path))?;
        serde_json::from_slice(&bytes).map_err(|source| {
            error!("Data file {} is corrupt: {source}", path.display());
            StoreError::Corrupt {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// Durably replace the whole dataset.
    ///
    /// The snapshot is serialized immediately, then queued behind any saves
    /// submitted earlier. A failed save leaves the previous file in place and
    /// does not affect saves queued after it.
    pub async fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(snapshot).map_err(|source| StoreError::Corrupt {
            path: self.path().to_path_buf(),
            source,
        })?;
        let _queued = self.inner.write_queue.lock().await;
        self.create_parent_dir().await?;
        self.replace_file(&bytes).await
    }

    /// Run one serialized load/mutate/save cycle.
    ///
    /// `apply` sees the freshly loaded snapshot; if it fails, nothing is
    /// written and its error is returned. No other `transact` can load until
    /// this one's save has completed.
    pub async fn transact<T, E, F>(&self, apply: F) -> Result<T, E>
    where
        F: FnOnce(&mut Snapshot) -> Result<T, E>,
        E: From<StoreError>,
    {
        let _transaction = self.inner.transactions.lock().await;
        let mut snapshot = self.load().await?;
        let value = apply(&mut snapshot)?;
        self.save(&snapshot).await?;
        Ok(value)
    }

    async fn exists(&self) -> Result<bool, StoreError> {
        match fs::metadata(self.path()).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io(self.path())(e)),
        }
    }

    async fn ensure_file(&self) -> Result<(), StoreError> {
        if self.exists().await? {
            return Ok(());
        }
        let _queued = self.inner.write_queue.lock().await;
        // A save queued ahead of us may have created it in the meantime.
        if self.exists().await? {
            return Ok(());
        }
        debug!("Initialising empty data file {}", self.path().display());
        self.create_parent_dir().await?;
        let bytes = serde_json::to_vec_pretty(&Snapshot::default()).map_err(|source| {
            StoreError::Corrupt {
                path: self.path().to_path_buf(),
                source,
            }
        })?;
        self.replace_file(&bytes).await
    }

    async fn create_parent_dir(&self) -> Result<(), StoreError> {
        match self.path().parent() {
            Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir)
                .await
                .map_err(StoreError::io(dir)),
            _ => Ok(()),
        }
    }

    /// Write-then-rename. Must be called with the write queue held.
    async fn replace_file(&self, bytes: &[u8]) -> Result<(), StoreError> {
        let temp_path = self.temp_path();
        let result = async {
            let mut file = fs::File::create(temp_path).await?;
            file.write_all(bytes).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(temp_path, self.path()).await?;
            self.sync_directory().await
        }
        .await;

        match result {
            Ok(()) => {
                debug!(
                    "Wrote {} bytes to {}",
                    bytes.len(),
                    self.path().display()
                );
                Ok(())
            }
            Err(e) => {
                error!("Failed to write {}: {e}", self.path().display());
                // Best effort: the canonical file is untouched either way.
                let _ = fs::remove_file(temp_path).await;
                Err(StoreError::io(self.path())(e))
            }
        }
    }

    /// Make the rename itself durable.
    #[cfg(unix)]
    async fn sync_directory(&self) -> std::io::Result<()> {
        match self.path().parent() {
            Some(dir) if !dir.as_os_str().is_empty() => fs::File::open(dir).await?.sync_all().await,
            _ => Ok(()),
        }
    }

    #[cfg(not(unix))]
    async fn sync_directory(&self) -> std::io::Result<()> {
        Ok(())
    }
}
