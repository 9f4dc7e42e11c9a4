//! Durable JSON store
//!
//! One document (`{widgets, data}`) on disk, owned by the host process.
//! Every access goes through a single async lock so read-modify-write
//! sequences from different tasks never interleave.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;

use crate::shared::types::StoreDocument;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize store document: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// How a read obtained its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Parsed from the file on disk.
    Loaded,
    /// File was missing; a default document was written.
    Created,
    /// File was unreadable or corrupt; default returned, file left as is.
    Recovered,
}

#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    lock: Mutex<()>,
    writes: AtomicU64,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
            writes: AtomicU64::new(0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of successful writes since this store was opened.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Create the file with an empty document if it does not exist yet.
    pub async fn ensure_initialized(&self) -> StoreResult<()> {
        let _guard = self.lock.lock().await;
        match fs::metadata(&self.path).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "creating widget store");
                self.write_unlocked(&StoreDocument::default()).await
            }
            Err(source) => Err(self.io_error("inspect", source)),
        }
    }

    /// Load the document. Never fails: a missing file is recreated, a
    /// corrupt one is replaced by a default in memory only.
    pub async fn read(&self) -> StoreDocument {
        let _guard = self.lock.lock().await;
        self.read_unlocked().await.0
    }

    /// Replace the whole file with `document`.
    pub async fn write(&self, document: &StoreDocument) -> StoreResult<()> {
        let _guard = self.lock.lock().await;
        self.write_unlocked(document).await
    }

    /// Read, mutate, write, all under the store lock. The closure returns
    /// whether anything changed; nothing is written when it returns `false`.
    pub async fn update<F>(&self, mutate: F) -> StoreResult<bool>
    where
        F: FnOnce(&mut StoreDocument) -> bool,
    {
        let _guard = self.lock.lock().await;
        let (mut document, outcome) = self.read_unlocked().await;
        if !mutate(&mut document) {
            return Ok(false);
        }
        if outcome == ReadOutcome::Recovered {
            self.backup_unreadable().await?;
        }
        self.write_unlocked(&document).await?;
        Ok(true)
    }

    async fn read_unlocked(&self) -> (StoreDocument, ReadOutcome) {
        match fs::read_to_string(&self.path).await {
            Ok(raw) => match serde_json::from_str::<StoreDocument>(&raw) {
                Ok(document) => (document, ReadOutcome::Loaded),
                Err(err) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %err,
                        "store content is invalid; using an empty document"
                    );
                    (StoreDocument::default(), ReadOutcome::Recovered)
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let document = StoreDocument::default();
                match self.write_unlocked(&document).await {
                    Ok(()) => tracing::info!(path = %self.path.display(), "store file was missing; recreated"),
                    Err(err) => tracing::error!(error = %err, "failed to recreate missing store file"),
                }
                (document, ReadOutcome::Created)
            }
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "failed to read store");
                (StoreDocument::default(), ReadOutcome::Recovered)
            }
        }
    }

    async fn write_unlocked(&self, document: &StoreDocument) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error("create directory for", e))?;
        }

        let content = serde_json::to_string_pretty(document)?;
        let staging = sibling(&self.path, ".tmp");
        fs::write(&staging, content)
            .await
            .map_err(|e| self.io_error("write staging file for", e))?;
        fs::rename(&staging, &self.path)
            .await
            .map_err(|e| self.io_error("replace", e))?;

        let count = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(path = %self.path.display(), writes = count, "store written");
        Ok(())
    }

    /// Keep the bytes of a corrupt file before the first overwrite. The
    /// overwrite must not happen when the copy fails.
    async fn backup_unreadable(&self) -> StoreResult<()> {
        let backup = sibling(&self.path, ".corrupt");
        match fs::copy(&self.path, &backup).await {
            Ok(_) => {
                tracing::warn!(backup = %backup.display(), "corrupt store saved before overwrite");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => {
                tracing::error!(backup = %backup.display(), error = %e, "failed to back up corrupt store");
                Err(self.io_error("back up", e))
            }
        }
    }

    fn io_error(&self, operation: &'static str, source: std::io::Error) -> StoreError {
        StoreError::Io {
            operation,
            path: self.path.clone(),
            source,
        }
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("storage.json"));
    name.push(suffix);
    path.with_file_name(name)
}
