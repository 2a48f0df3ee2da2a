//! Threshold-triggered snapshots to a user-chosen folder.
//!
//! Two pieces:
//! 1. `directory`: capability token for a granted folder, plus host
//!    capabilities (directory picker, download fallback)
//! 2. `coordinator`: mutation counter, persisted metadata, auto-export
//!    and startup auto-import
//!
//! The coordinator never serialises domain data itself. The store hands it
//! export JSON through a callback, and an importer for the reverse path.

mod coordinator;
mod directory;

use std::path::PathBuf;

use thiserror::Error;

use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Directory picker not supported on this host")]
    PickerUnsupported,

    #[error("Directory selection cancelled")]
    PickCancelled,

    #[error("Backup directory unavailable: {}", .0.display())]
    DirectoryUnavailable(PathBuf),

    #[error("Downloads not supported on this host")]
    DownloadUnsupported,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

pub use coordinator::*;
pub use directory::*;
