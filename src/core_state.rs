//! Application state shared by every entry point.
//!
//! `CoreState` owns the single `Store` behind a mutex and the PIN lock flag.
//! The app starts locked.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use subtle::ConstantTimeEq;

use crate::dashboard::{get_dashboard_stats, DashboardStats};
use crate::db::{Store, StoreError};
use crate::models::Settings;

pub struct CoreState {
    store: Mutex<Store>,
    locked: AtomicBool,
}

impl CoreState {
    pub fn new(store: Store) -> Self {
        Self {
            store: Mutex::new(store),
            locked: AtomicBool::new(true),
        }
    }

    /// Run `f` with exclusive access to the store.
    pub fn with_store<T, F>(&self, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(&mut Store) -> Result<T, StoreError>,
    {
        let mut guard = self.store.lock().map_err(|_| CoreError::LockPoisoned)?;
        Ok(f(&mut guard)?)
    }

    /// Seed reference data, then pull a newer auto-backup if enabled.
    /// Returns whether a backup was imported.
    pub fn startup(&self) -> Result<bool, CoreError> {
        self.with_store(|store| {
            store.init()?;
            Ok(store.check_and_auto_import())
        })
    }

    // ── PIN lock ────────────────────────────────────────────

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }

    pub fn lock(&self) {
        self.locked.store(true, Ordering::SeqCst);
        tracing::info!("App locked");
    }

    /// Compare `pin` with the stored (or default) PIN in constant time.
    pub fn unlock(&self, pin: &str) -> Result<bool, CoreError> {
        let settings = self.with_store(|store| store.get_settings())?;
        let matches = pin_matches(&settings, pin);
        if matches {
            self.locked.store(false, Ordering::SeqCst);
            tracing::info!("App unlocked");
        } else {
            tracing::warn!("Unlock rejected");
        }
        Ok(matches)
    }

    /// Replace the PIN after checking the current one. Returns false when
    /// `current` is wrong.
    pub fn change_pin(&self, current: &str, new_pin: &str) -> Result<bool, CoreError> {
        self.with_store(|store| {
            let mut settings = store.get_settings()?;
            if !pin_matches(&settings, current) {
                return Ok(false);
            }
            settings.pin = Some(new_pin.to_string());
            store.save_settings(&settings)?;
            Ok(true)
        })
    }

    pub fn dashboard(&self) -> Result<DashboardStats, CoreError> {
        self.with_store(|store| {
            let workers = store.get_workers()?;
            let exams = store.get_exams()?;
            Ok(get_dashboard_stats(&workers, &exams))
        })
    }
}

fn pin_matches(settings: &Settings, pin: &str) -> bool {
    pin.as_bytes().ct_eq(settings.effective_pin().as_bytes()).into()
}

/// Errors from CoreState operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::UnsupportedHost;
    use crate::config::DEFAULT_PIN;

    fn state() -> CoreState {
        let store = Store::open_in_memory(Box::new(UnsupportedHost)).unwrap();
        let state = CoreState::new(store);
        state.startup().unwrap();
        state
    }

    #[test]
    fn new_state_is_locked() {
        assert!(state().is_locked());
    }

    #[test]
    fn default_pin_unlocks() {
        let state = state();
        assert!(!state.unlock("9999").unwrap());
        assert!(state.is_locked());
        assert!(state.unlock(DEFAULT_PIN).unwrap());
        assert!(!state.is_locked());
        state.lock();
        assert!(state.is_locked());
    }

    #[test]
    fn changed_pin_replaces_default() {
        let state = state();
        assert!(!state.change_pin("1111", "2468").unwrap());
        assert!(state.change_pin(DEFAULT_PIN, "2468").unwrap());
        assert!(!state.unlock(DEFAULT_PIN).unwrap());
        assert!(state.unlock("2468").unwrap());
    }

    #[test]
    fn invalid_new_pin_is_rejected() {
        let state = state();
        let result = state.change_pin(DEFAULT_PIN, "12345");
        assert!(matches!(result, Err(CoreError::Store(StoreError::Validation(_)))));
        assert!(state.unlock(DEFAULT_PIN).unwrap());
    }

    #[test]
    fn startup_seeds_and_reports_no_import() {
        let state = state();
        assert!(!state.startup().unwrap());
        let workers = state.with_store(|store| store.get_workers()).unwrap();
        assert_eq!(workers.len(), 5);
    }

    #[test]
    fn dashboard_reflects_seed_data() {
        let state = state();
        let stats = state.dashboard().unwrap();
        // Seed due dates are all in the past relative to any current run
        assert_eq!(stats.overdue.len(), 5);
        assert!(stats.due_soon.is_empty());
    }

    #[test]
    fn core_error_display() {
        assert_eq!(CoreError::LockPoisoned.to_string(), "Internal lock error");
    }
}
