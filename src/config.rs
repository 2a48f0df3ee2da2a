use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "GestMed";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Database file inside the data directory
pub const DATABASE_FILE_NAME: &str = "gestmed.db";

/// Overrides the data directory (tests, portable installs)
pub const DATA_DIR_ENV: &str = "GESTMED_DATA_DIR";

/// Folder handed back by the headless directory picker
pub const BACKUP_DIR_ENV: &str = "GESTMED_BACKUP_DIR";

/// PIN used until the user stores one in settings
pub const DEFAULT_PIN: &str = "0011";

/// Default tracing filter when `RUST_LOG` is not set
pub fn default_log_filter() -> &'static str {
    "info,gestmed_lib=debug"
}

/// Get the application data directory.
/// `$GESTMED_DATA_DIR` when set, otherwise ~/GestMed/ on all platforms.
pub fn app_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_NAME)
}

/// Path of the local SQLite store
pub fn database_path() -> PathBuf {
    app_data_dir().join(DATABASE_FILE_NAME)
}

/// Folder the download fallback writes into
pub fn downloads_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| app_data_dir().join("downloads"))
}

/// Backup folder preselected for the headless picker, if any
pub fn backup_dir_override() -> Option<PathBuf> {
    std::env::var_os(BACKUP_DIR_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_path_under_app_data() {
        let db = database_path();
        assert!(db.starts_with(app_data_dir()));
        assert!(db.ends_with(DATABASE_FILE_NAME));
    }

    #[test]
    fn app_name_is_gestmed() {
        assert_eq!(APP_NAME, "GestMed");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn default_pin_is_four_digits() {
        assert_eq!(DEFAULT_PIN.len(), 4);
        assert!(DEFAULT_PIN.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn default_log_filter_enables_crate_debug() {
        assert!(default_log_filter().contains("gestmed_lib=debug"));
    }
}
