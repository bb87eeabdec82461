use crate::notify::MessageSender;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DatabaseConnection,
    pub notifier: Arc<dyn MessageSender>,
}

impl AppState {
    pub fn new(db_pool: DatabaseConnection, notifier: Arc<dyn MessageSender>) -> Self {
        Self { db_pool, notifier }
    }
}
