pub mod analysis;
pub mod config;
pub mod db;
pub mod export;
pub mod frequency;
pub mod history;
pub mod manager;
pub mod models;
pub mod sample;
pub mod schedule;
pub mod settings;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use db::SqliteStore;
use manager::MedicineManager;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// `RUST_LOG` when set, otherwise [`config::default_log_filter`].
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Headless run: opens the store, optionally seeds sample data, rebuilds
/// today's schedule and prints the daily summary as JSON.
pub fn run(seed_sample_data: bool) -> Result<(), AppError> {
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let data_dir = config::app_data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let db_path = config::database_path();
    let store = SqliteStore::open(&db_path)?;
    tracing::info!(path = %db_path.display(), "Store opened");

    let mut manager = MedicineManager::new(store);
    if seed_sample_data {
        manager.seed_sample_data();
    }
    manager.refresh();

    let summary = manager.daily_summary();
    tracing::info!(
        medicines = summary.total_medicines,
        doses = manager.today_dosages().len(),
        overdue = summary.overdue_refills,
        "Today's schedule ready"
    );
    if let Some(alert) = manager.refill_alert_message() {
        tracing::warn!("{alert}");
    }
    println!("{}", serde_json::to_string_pretty(&summary)?);

    manager.into_store().close()?;
    Ok(())
}
