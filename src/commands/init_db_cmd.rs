use super::load_settings_or_exit;
use sensorhub::db::{self, PoolSettings};
use std::error::Error;

pub async fn execute() -> Result<(), Box<dyn Error>> {
    let settings = load_settings_or_exit();
    let db_pool = db::connect(&settings.database_url(), &PoolSettings::single()).await?;
    db::init_db(&db_pool).await?;
    db::close_db(db_pool).await?;
    Ok(())
}
