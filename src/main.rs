//! Fleetkeeper - campus asset and maintenance tracking client
//!
//! Runs one sync cycle against the configured backend: fetch the asset
//! collection, reconcile it with the local cache, re-cache the merged
//! view, and print a due/overdue summary.

use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fleetkeeper::{
    config::AppConfig,
    services::recurrence::{due_state, DueState},
    services::Services,
    storage::{FileStorage, LocalStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("fleetkeeper={}", config.logging.level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Fleetkeeper v{}", env!("CARGO_PKG_VERSION"));

    let backend = FileStorage::new(&config.storage.path, config.storage.quota_bytes)?;
    let mut store = LocalStore::new(Box::new(backend));

    let services = Services::new(&config);
    let records = services.sync.refresh_assets(&mut store).await?;
    tracing::info!(count = records.len(), "asset snapshot refreshed");

    let today = Utc::now().date_naive();
    let horizon = config.recurrence.search_horizon_months;
    let mut overdue = 0usize;
    let mut due_soon = 0usize;
    for record in &records {
        match due_state(record, today, config.alerts.due_soon_days, horizon) {
            DueState::Overdue => {
                overdue += 1;
                println!("OVERDUE  {}  {}", record.asset_code, record.campus);
            }
            DueState::DueSoon => {
                due_soon += 1;
                println!("DUE SOON {}  {}", record.asset_code, record.campus);
            }
            DueState::Ok | DueState::Unscheduled => {}
        }
    }
    println!(
        "{} assets, {} overdue, {} due within {} days",
        records.len(),
        overdue,
        due_soon,
        config.alerts.due_soon_days
    );

    Ok(())
}
