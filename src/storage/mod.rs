use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use thiserror::Error;

use crate::config::{ConfigPaths, StorageOptions};
use crate::entries::JournalEntry;

mod codec;

pub use codec::{parse_entries, serialize_entries, Envelope, STORAGE_VERSION};

pub const JOURNAL_FILE_NAME: &str = "journal.entries.v1.json";
const JOURNAL_TMP_EXTENSION: &str = "json.tmp";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("journal io failure: {0}")]
    Io(#[from] io::Error),
    #[error("journal serialization failure: {0}")]
    Json(#[from] serde_json::Error),
}

/// File-backed journal persistence. Reads always produce an envelope, even
/// for missing or damaged files; writes and clears log a warning on failure
/// instead of surfacing an error.
#[derive(Debug, Clone)]
pub struct JournalStorage {
    journal_path: PathBuf,
    pretty: bool,
}

impl JournalStorage {
    pub fn new(journal_path: PathBuf) -> Self {
        Self {
            journal_path,
            pretty: false,
        }
    }

    pub fn journal_path(&self) -> &Path {
        &self.journal_path
    }

    pub fn read(&self) -> Envelope {
        match self.try_read() {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::warn!(
                    ?err,
                    "failed to read journal file {}",
                    self.journal_path.display()
                );
                Envelope::empty()
            }
        }
    }

    pub fn write(&self, entries: &[JournalEntry]) {
        if let Err(err) = self.try_write(entries) {
            tracing::warn!(
                ?err,
                "failed to persist journal file {}",
                self.journal_path.display()
            );
        }
    }

    pub fn clear(&self) {
        if let Err(err) = self.try_clear() {
            tracing::warn!(
                ?err,
                "failed to remove journal file {}",
                self.journal_path.display()
            );
        }
    }

    fn try_read(&self) -> Result<Envelope, StorageError> {
        let raw = match fs::read_to_string(&self.journal_path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Envelope::empty()),
            Err(err) => return Err(err.into()),
        };

        let value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(
                    ?err,
                    "discarding unparseable journal file {}",
                    self.journal_path.display()
                );
                return Ok(Envelope::empty());
            }
        };

        if codec::coerce_version(&value) != Some(STORAGE_VERSION) {
            tracing::warn!(
                "discarding journal file {} with unsupported version",
                self.journal_path.display()
            );
            return Ok(Envelope::empty());
        }

        let entries = match value.get("entries") {
            Some(Value::Array(records)) => codec::sanitize_entries(records),
            _ => {
                tracing::warn!(
                    "discarding journal file {} without an entries array",
                    self.journal_path.display()
                );
                return Ok(Envelope::empty());
            }
        };
        Ok(Envelope::current(entries))
    }

    fn try_write(&self, entries: &[JournalEntry]) -> Result<(), StorageError> {
        let envelope = Envelope::current(entries.to_vec());
        let payload = if self.pretty {
            serde_json::to_vec_pretty(&envelope)?
        } else {
            serde_json::to_vec(&envelope)?
        };

        if let Some(parent) = self.journal_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = self.journal_path.with_extension(JOURNAL_TMP_EXTENSION);
        fs::write(&tmp_path, &payload)?;
        fs::rename(&tmp_path, &self.journal_path)?;
        Ok(())
    }

    fn try_clear(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.journal_path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

pub fn init(paths: &ConfigPaths, storage: &StorageOptions) -> Result<JournalStorage> {
    let journal_path = if storage.journal_path.as_os_str().is_empty() {
        paths.journal_path.clone()
    } else {
        storage.journal_path.clone()
    };
    if let Some(parent) = journal_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating data directory {}", parent.display()))?;
    }
    Ok(JournalStorage {
        journal_path,
        pretty: storage.pretty,
    })
}
