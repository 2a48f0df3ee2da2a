use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use super::BackupError;

/// Contents of a backup file plus its modification time (epoch millis).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupFile {
    pub text: String,
    pub last_modified: i64,
}

/// Capability token for a writable folder the user granted.
///
/// The coordinator only names files inside it; it never interprets the
/// location beyond persisting it.
pub trait BackupDirectory: Send {
    /// Display name (last path component).
    fn name(&self) -> String;
    /// Location to persist so the grant can be reopened next session.
    fn location(&self) -> &Path;
    fn write(&self, file_name: &str, bytes: &[u8]) -> io::Result<()>;
    /// `Ok(None)` when the file does not exist.
    fn read(&self, file_name: &str) -> io::Result<Option<BackupFile>>;
    fn exists(&self, file_name: &str) -> bool;
}

/// Host capabilities the coordinator depends on.
pub trait DirectoryHost: Send {
    /// Ask the user for a folder.
    fn pick_directory(&self) -> Result<PathBuf, BackupError>;
    /// Reopen a persisted location; `None` when it is no longer usable.
    fn open(&self, location: &Path) -> Option<Box<dyn BackupDirectory>>;
    /// Fallback when no folder is usable: hand the file to the user.
    fn download(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, BackupError>;
}

fn check_file_name(file_name: &str) -> io::Result<()> {
    let plain = !file_name.is_empty()
        && file_name != "."
        && file_name != ".."
        && !file_name.contains(['/', '\\']);
    if plain {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid backup file name: {file_name:?}"),
        ))
    }
}

/// Write through a sibling temp file so readers never see a partial backup.
fn write_atomic(dir: &Path, file_name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
    check_file_name(file_name)?;
    let target = dir.join(file_name);
    let staging = dir.join(format!(".{file_name}.tmp"));
    std::fs::write(&staging, bytes)?;
    if let Err(e) = std::fs::rename(&staging, &target) {
        let _ = std::fs::remove_file(&staging);
        return Err(e);
    }
    Ok(target)
}

// ═══════════════════════════════════════════════════════════════════════════
// Filesystem implementation
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct FsDirectory {
    root: PathBuf,
}

impl FsDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl BackupDirectory for FsDirectory {
    fn name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.root.to_string_lossy().into_owned())
    }

    fn location(&self) -> &Path {
        &self.root
    }

    fn write(&self, file_name: &str, bytes: &[u8]) -> io::Result<()> {
        write_atomic(&self.root, file_name, bytes).map(|_| ())
    }

    fn read(&self, file_name: &str) -> io::Result<Option<BackupFile>> {
        check_file_name(file_name)?;
        let path = self.root.join(file_name);
        let meta = match std::fs::metadata(&path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let modified: DateTime<Utc> = meta.modified()?.into();
        let text = std::fs::read_to_string(&path)?;
        Ok(Some(BackupFile {
            text,
            last_modified: modified.timestamp_millis(),
        }))
    }

    fn exists(&self, file_name: &str) -> bool {
        check_file_name(file_name).is_ok() && self.root.join(file_name).is_file()
    }
}

/// Picker callback: `None` means the user cancelled.
pub type DirectoryPicker = Box<dyn Fn() -> Option<PathBuf> + Send>;

/// Desktop host: folders are plain paths, downloads land in a downloads dir.
pub struct FsHost {
    picker: Option<DirectoryPicker>,
    downloads_dir: PathBuf,
}

impl FsHost {
    /// Host without a picker; `pick_directory` reports it as unsupported.
    pub fn new(downloads_dir: impl Into<PathBuf>) -> Self {
        Self {
            picker: None,
            downloads_dir: downloads_dir.into(),
        }
    }

    pub fn with_picker(mut self, picker: impl Fn() -> Option<PathBuf> + Send + 'static) -> Self {
        self.picker = Some(Box::new(picker));
        self
    }

    /// Host configured from the environment: downloads go to the user's
    /// download folder and `GESTMED_BACKUP_DIR`, when set, answers the picker.
    pub fn from_env() -> Self {
        let host = Self::new(crate::config::downloads_dir());
        match crate::config::backup_dir_override() {
            Some(dir) => host.with_picker(move || Some(dir.clone())),
            None => host,
        }
    }
}

impl DirectoryHost for FsHost {
    fn pick_directory(&self) -> Result<PathBuf, BackupError> {
        let picker = self.picker.as_ref().ok_or(BackupError::PickerUnsupported)?;
        let dir = picker().ok_or(BackupError::PickCancelled)?;
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    fn open(&self, location: &Path) -> Option<Box<dyn BackupDirectory>> {
        if location.is_dir() {
            Some(Box::new(FsDirectory::new(location)))
        } else {
            None
        }
    }

    fn download(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, BackupError> {
        std::fs::create_dir_all(&self.downloads_dir)?;
        Ok(write_atomic(&self.downloads_dir, file_name, bytes)?)
    }
}

/// Host with no folder access at all (headless, sandboxed).
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedHost;

impl DirectoryHost for UnsupportedHost {
    fn pick_directory(&self) -> Result<PathBuf, BackupError> {
        Err(BackupError::PickerUnsupported)
    }

    fn open(&self, _location: &Path) -> Option<Box<dyn BackupDirectory>> {
        None
    }

    fn download(&self, _file_name: &str, _bytes: &[u8]) -> Result<PathBuf, BackupError> {
        Err(BackupError::DownloadUnsupported)
    }
}
