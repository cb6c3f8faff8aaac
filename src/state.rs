use crate::error::Result;
use crate::models::InstallRecord;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Shape of a state document found on disk
#[derive(Debug, Clone, PartialEq)]
pub enum StateDocument {
    Current(InstallRecord),
    /// Flat format written by older releases; recognised, never imported
    Legacy,
    Unreadable,
}

impl StateDocument {
    pub fn parse(contents: &str) -> Self {
        let value: Value = match serde_json::from_str(contents) {
            Ok(value) => value,
            Err(_) => return StateDocument::Unreadable,
        };

        if is_legacy(&value) {
            return StateDocument::Legacy;
        }

        match serde_json::from_value::<InstallRecord>(value) {
            Ok(record) => StateDocument::Current(record),
            Err(_) => StateDocument::Unreadable,
        }
    }
}

fn is_legacy(value: &Value) -> bool {
    value.get("apiKeySource").is_some() && value.get("credentials").is_none()
}

/// On-disk store for the single install record
pub struct StateStore {
    path: PathBuf,
    legacy_path: PathBuf,
}

impl StateStore {
    pub fn new(path: PathBuf, legacy_path: PathBuf) -> Self {
        Self { path, legacy_path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn legacy_path(&self) -> &Path {
        &self.legacy_path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn legacy_exists(&self) -> bool {
        self.legacy_path.exists()
    }

    /// Read the current record; absent, corrupt or legacy content is `None`.
    pub fn read(&self) -> Option<InstallRecord> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(_) => return None,
        };

        match StateDocument::parse(&contents) {
            StateDocument::Current(record) => {
                debug!(path = %self.path.display(), "read install record");
                Some(record)
            }
            StateDocument::Legacy => {
                warn!(path = %self.path.display(), "ignoring legacy-format install record");
                None
            }
            StateDocument::Unreadable => {
                warn!(path = %self.path.display(), "ignoring unreadable install record");
                None
            }
        }
    }

    /// Replace the record on disk, creating the habitat directory if needed.
    pub fn write(&self, record: &InstallRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut contents = serde_json::to_string_pretty(record)?;
        contents.push('\n');
        std::fs::write(&self.path, contents)?;

        debug!(path = %self.path.display(), "wrote install record");
        Ok(())
    }

    /// Delete the record, then its directory if nothing else lives there.
    ///
    /// Returns whether a file was removed.
    pub fn remove(&self) -> Result<bool> {
        let removed = remove_if_present(&self.path)?;

        if let Some(parent) = self.path.parent() {
            if is_empty_dir(parent) {
                std::fs::remove_dir(parent)?;
                debug!(path = %parent.display(), "removed empty habitat directory");
            }
        }

        Ok(removed)
    }

    /// Delete the flat state file left by older releases.
    pub fn remove_legacy(&self) -> Result<bool> {
        remove_if_present(&self.legacy_path)
    }
}

fn remove_if_present(path: &Path) -> Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "removed state file");
            Ok(true)
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err.into()),
    }
}

fn is_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}
