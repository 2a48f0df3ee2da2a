use std::fmt::Display;
use std::path::PathBuf;

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use super::directory::{BackupDirectory, BackupFile, DirectoryHost};
use super::BackupError;
use crate::db::kv;
use crate::status::format_date;

/// File written by auto-export and read by auto-import.
pub const BACKUP_FILE_NAME: &str = "backup-auto.json";

/// Mutations between automatic exports.
pub const DEFAULT_THRESHOLD: u32 = 10;

const METADATA_KEY: &str = "backup_settings";
const COUNTER_KEY: &str = "backup_counter";

/// `medical_backup_YYYY-MM-DD.json`
pub fn manual_export_file_name(date: NaiveDate) -> String {
    format!("medical_backup_{}.json", format_date(date))
}

fn default_threshold() -> u32 {
    DEFAULT_THRESHOLD
}

/// Persisted coordinator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct BackupMetadata {
    #[serde(default = "default_threshold")]
    threshold: u32,
    #[serde(default)]
    directory: Option<PathBuf>,
    #[serde(default)]
    auto_import: bool,
    /// Modification time (epoch millis) of the last imported backup file.
    #[serde(default)]
    last_imported: i64,
}

impl Default for BackupMetadata {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            directory: None,
            auto_import: false,
            last_imported: 0,
        }
    }
}

pub enum DirectoryState {
    Unset,
    Available(Box<dyn BackupDirectory>),
    /// A folder was chosen once but cannot be reopened (moved, permission lost).
    Unavailable(PathBuf),
}

impl std::fmt::Debug for DirectoryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unset => f.write_str("Unset"),
            Self::Available(dir) => f.debug_tuple("Available").field(&dir.location()).finish(),
            Self::Unavailable(path) => f.debug_tuple("Unavailable").field(path).finish(),
        }
    }
}

/// Where a backup file ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupTarget {
    Directory { name: String, path: PathBuf },
    Download(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Written(BackupTarget),
    Failed(String),
}

impl ExportOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written(_))
    }
}

/// Counts mutations and snapshots the store once the threshold is reached.
///
/// Holds no domain data. Metadata and the counter live in the key/value
/// table so they survive restarts.
pub struct BackupCoordinator {
    metadata: BackupMetadata,
    counter: u32,
    directory: DirectoryState,
    host: Box<dyn DirectoryHost>,
}

impl BackupCoordinator {
    /// Load persisted state and reopen the saved directory.
    ///
    /// Never fails: unreadable metadata falls back to defaults so backup
    /// health cannot block the app.
    pub fn init(conn: &Connection, host: Box<dyn DirectoryHost>) -> Self {
        let mut metadata = kv::get_json::<BackupMetadata>(conn, METADATA_KEY)
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Backup settings unreadable, using defaults");
                None
            })
            .unwrap_or_default();
        metadata.threshold = metadata.threshold.max(1);

        let counter = kv::get_json::<u32>(conn, COUNTER_KEY)
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Backup counter unreadable, restarting at 0");
                None
            })
            .unwrap_or(0);

        let directory = match metadata.directory.clone() {
            None => DirectoryState::Unset,
            Some(path) => match host.open(&path) {
                Some(dir) => DirectoryState::Available(dir),
                None => {
                    tracing::warn!(path = %path.display(), "Backup directory unavailable");
                    DirectoryState::Unavailable(path)
                }
            },
        };

        tracing::debug!(
            threshold = metadata.threshold,
            counter,
            auto_import = metadata.auto_import,
            "Backup coordinator ready"
        );

        Self {
            metadata,
            counter,
            directory,
            host,
        }
    }

    fn save_metadata(&self, conn: &Connection) -> Result<(), BackupError> {
        kv::set_json(conn, METADATA_KEY, &self.metadata)?;
        Ok(())
    }

    fn save_counter(&self, conn: &Connection) -> Result<(), BackupError> {
        kv::set_json(conn, COUNTER_KEY, &self.counter)?;
        Ok(())
    }

    // ── Counter ─────────────────────────────────────────────

    /// Record one mutation. Returns true when an export is due.
    pub fn register_mutation(&mut self, conn: &Connection) -> bool {
        self.counter = self.counter.saturating_add(1);
        if let Err(e) = self.save_counter(conn) {
            tracing::warn!(error = %e, "Failed to persist backup counter");
        }
        self.counter >= self.metadata.threshold
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn reset_counter(&mut self, conn: &Connection) -> Result<(), BackupError> {
        self.counter = 0;
        self.save_counter(conn)
    }

    pub fn threshold(&self) -> u32 {
        self.metadata.threshold
    }

    /// Values below 1 are clamped to 1.
    pub fn set_threshold(&mut self, conn: &Connection, threshold: u32) -> Result<(), BackupError> {
        self.metadata.threshold = threshold.max(1);
        self.save_metadata(conn)
    }

    // ── Export ──────────────────────────────────────────────

    /// Produce a snapshot and write it to the directory, or download it.
    ///
    /// The counter is reset only once a write lands somewhere. Failures are
    /// reported in the outcome, never as an error.
    pub fn perform_auto_export<F, E>(&mut self, conn: &Connection, produce: F) -> ExportOutcome
    where
        F: FnOnce() -> Result<String, E>,
        E: Display,
    {
        let json = match produce() {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "Auto-export could not serialise data");
                return ExportOutcome::Failed(e.to_string());
            }
        };

        let target = match self.save_backup_json(BACKUP_FILE_NAME, &json) {
            Ok(target) => target,
            Err(e) => {
                tracing::warn!(error = %e, counter = self.counter, "Auto-export failed");
                return ExportOutcome::Failed(e.to_string());
            }
        };

        // Our own snapshot must not be re-imported over newer edits.
        if matches!(target, BackupTarget::Directory { .. }) {
            if let Some(file) = self.read_backup_json(BACKUP_FILE_NAME) {
                self.metadata.last_imported = self.metadata.last_imported.max(file.last_modified);
                if let Err(e) = self.save_metadata(conn) {
                    tracing::warn!(error = %e, "Failed to persist backup settings");
                }
            }
        }

        if let Err(e) = self.reset_counter(conn) {
            tracing::warn!(error = %e, "Failed to persist backup counter");
        }
        tracing::info!(destination = ?target, size_bytes = json.len(), "Auto-export written");
        ExportOutcome::Written(target)
    }

    /// Write `json` under `file_name` to the directory, falling back to a
    /// download when no directory is usable or the write fails.
    pub fn save_backup_json(&self, file_name: &str, json: &str) -> Result<BackupTarget, BackupError> {
        if let DirectoryState::Available(dir) = &self.directory {
            match dir.write(file_name, json.as_bytes()) {
                Ok(()) => {
                    return Ok(BackupTarget::Directory {
                        name: dir.name(),
                        path: dir.location().join(file_name),
                    })
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        directory = %dir.location().display(),
                        "Directory write failed, falling back to download"
                    );
                }
            }
        }
        let path = self.host.download(file_name, json.as_bytes())?;
        Ok(BackupTarget::Download(path))
    }

    // ── Directory ───────────────────────────────────────────

    /// Prompt for a folder and remember it. Returns its display name.
    pub fn choose_directory(&mut self, conn: &Connection) -> Result<String, BackupError> {
        let path = self.host.pick_directory()?;
        let dir = self
            .host
            .open(&path)
            .ok_or_else(|| BackupError::DirectoryUnavailable(path.clone()))?;
        let name = dir.name();

        self.metadata.directory = Some(path);
        self.directory = DirectoryState::Available(dir);
        self.save_metadata(conn)?;

        tracing::info!(directory = %name, "Backup directory selected");
        Ok(name)
    }

    pub fn clear_directory(&mut self, conn: &Connection) -> Result<(), BackupError> {
        self.metadata.directory = None;
        self.directory = DirectoryState::Unset;
        self.save_metadata(conn)
    }

    /// Display name of the directory, when one is usable.
    pub fn directory_name(&self) -> Option<String> {
        match &self.directory {
            DirectoryState::Available(dir) => Some(dir.name()),
            _ => None,
        }
    }

    pub fn directory_state(&self) -> &DirectoryState {
        &self.directory
    }

    pub fn read_backup_json(&self, file_name: &str) -> Option<BackupFile> {
        let DirectoryState::Available(dir) = &self.directory else {
            return None;
        };
        match dir.read(file_name) {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!(error = %e, file = file_name, "Backup read failed");
                None
            }
        }
    }

    // ── Auto-import ─────────────────────────────────────────

    pub fn auto_import(&self) -> bool {
        self.metadata.auto_import
    }

    pub fn set_auto_import(&mut self, conn: &Connection, enabled: bool) -> Result<(), BackupError> {
        self.metadata.auto_import = enabled;
        self.save_metadata(conn)
    }

    /// Import the backup file when it is newer than the last one imported.
    ///
    /// `import` applies the JSON and reports success. Each modification time
    /// is imported at most once.
    pub fn check_and_auto_import<F>(&mut self, conn: &Connection, import: F) -> bool
    where
        F: FnOnce(&str) -> bool,
    {
        if !self.metadata.auto_import {
            return false;
        }
        let Some(file) = self.read_backup_json(BACKUP_FILE_NAME) else {
            return false;
        };
        if file.last_modified <= self.metadata.last_imported {
            tracing::debug!(last_modified = file.last_modified, "Backup already imported");
            return false;
        }
        if !import(&file.text) {
            tracing::warn!(last_modified = file.last_modified, "Auto-import rejected backup file");
            return false;
        }

        self.metadata.last_imported = file.last_modified;
        if let Err(e) = self.save_metadata(conn) {
            tracing::warn!(error = %e, "Failed to persist backup settings");
        }
        tracing::info!(last_modified = file.last_modified, "Backup auto-imported");
        true
    }
}
