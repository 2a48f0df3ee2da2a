pub mod backup;
pub mod config;
pub mod core_state;
pub mod crypto;
pub mod dashboard;
pub mod db;
pub mod models;
pub mod records;
pub mod status;

use tracing_subscriber::EnvFilter;

use crate::core_state::{CoreError, CoreState};

pub fn run() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    if let Err(e) = start() {
        tracing::error!(error = %e, "Startup failed");
        std::process::exit(1);
    }
}

fn start() -> Result<(), CoreError> {
    let db_path = config::database_path();
    tracing::debug!(path = %db_path.display(), "Opening store");
    let store = db::Store::open(&db_path, Box::new(backup::FsHost::from_env()))?;
    let state = CoreState::new(store);

    if state.startup()? {
        tracing::info!("Data restored from auto-backup");
    }

    let summary = state.dashboard()?.summary();
    tracing::info!(
        due_soon = summary.due_soon,
        overdue = summary.overdue,
        active_positive = summary.active_positive,
        retests = summary.retests,
        "Dashboard"
    );
    Ok(())
}
