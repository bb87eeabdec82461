pub mod api;
pub mod config;
pub mod conversion;
pub mod db;
pub mod entities;
pub mod error;
pub mod models;
pub mod notify;
pub mod state;
pub mod utils;

pub use api::create_app;

use crate::config::Settings;
use crate::db::PoolSettings;
use crate::state::AppState;

/// Connect to the database, create missing tables and build the notifier.
pub async fn create_app_state(settings: &Settings) -> anyhow::Result<AppState> {
    let db_pool = db::connect(&settings.database_url(), &PoolSettings::default()).await?;
    db::init_db(&db_pool).await?;
    let notifier = notify::create_sender(settings)?;
    Ok(AppState::new(db_pool, notifier))
}
