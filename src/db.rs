use crate::entities::{sensor_data, sensors};
use crate::error::AppError;
use crate::{db_error, db_info};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, Schema, TransactionError, TransactionTrait,
};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::debug;

/// Connection pool sizing.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolSettings {
    pub min_connections: u32,
    pub max_connections: u32,
    pub max_lifetime: Duration,
    pub test_before_acquire: bool,
    pub statement_logging: bool,
}

impl Default for PoolSettings {
    fn default() -> Self {
        // 5 pooled connections plus up to 10 overflow.
        Self {
            min_connections: 5,
            max_connections: 15,
            max_lifetime: Duration::from_secs(3600),
            test_before_acquire: true,
            statement_logging: false,
        }
    }
}

impl PoolSettings {
    /// A single connection. Needed for `sqlite::memory:`, where every
    /// connection would otherwise see its own empty database.
    pub fn single() -> Self {
        Self {
            min_connections: 1,
            max_connections: 1,
            ..Self::default()
        }
    }

    fn connect_options(&self, url: &str) -> ConnectOptions {
        let mut opts = ConnectOptions::new(url.to_owned());
        opts.min_connections(self.min_connections)
            .max_connections(self.max_connections)
            .max_lifetime(self.max_lifetime)
            .test_before_acquire(self.test_before_acquire)
            .sqlx_logging(self.statement_logging);
        opts
    }
}

pub async fn connect(url: &str, pool: &PoolSettings) -> Result<DatabaseConnection, DbErr> {
    db_info!("Creating database engine...");
    let db = Database::connect(pool.connect_options(url)).await?;
    db_info!(
        backend = ?db.get_database_backend(),
        max_connections = pool.max_connections,
        "Database engine created successfully"
    );
    Ok(db)
}

/// Create every table the service uses, skipping those that already exist.
pub async fn init_db(db: &DatabaseConnection) -> Result<(), DbErr> {
    db_info!("Initializing database tables...");
    let result = async {
        create_table(db, sensors::Entity).await?;
        create_table(db, sensor_data::Entity).await
    }
    .await;

    match result {
        Ok(()) => {
            db_info!("Database tables initialized successfully");
            Ok(())
        }
        Err(e) => {
            db_error!("Failed to initialize database: {}", e);
            Err(e)
        }
    }
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    debug!(table = %entity.table_name(), "table ready");
    Ok(())
}

/// Run `f` inside a transaction. Commits when it returns `Ok`, rolls back
/// and logs otherwise.
pub async fn with_transaction<F, T>(db: &DatabaseConnection, f: F) -> Result<T, AppError>
where
    F: for<'c> FnOnce(
            &'c DatabaseTransaction,
        ) -> Pin<Box<dyn Future<Output = Result<T, AppError>> + Send + 'c>>
        + Send,
    T: Send,
{
    match db.transaction::<F, T, AppError>(f).await {
        Ok(value) => Ok(value),
        Err(TransactionError::Connection(e)) => {
            db_error!("Database error: {}", e);
            Err(AppError::Database(e))
        }
        Err(TransactionError::Transaction(e)) => {
            if let AppError::Database(inner) = &e {
                db_error!("Database error: {}", inner);
            } else {
                debug!(category = "database", "transaction rolled back: {}", e);
            }
            Err(e)
        }
    }
}

pub async fn close_db(db: DatabaseConnection) -> Result<(), DbErr> {
    db_info!("Closing database connections...");
    db.close().await?;
    db_info!("Database connections closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{ActiveModelTrait, ActiveValue::Set, PaginatorTrait};

    async fn memory_db() -> DatabaseConnection {
        let db = connect("sqlite::memory:", &PoolSettings::single())
            .await
            .unwrap();
        init_db(&db).await.unwrap();
        db
    }

    fn sensor(name: &str) -> sensors::ActiveModel {
        sensors::ActiveModel {
            name: Set(name.to_string()),
            description: Set("test".to_string()),
            unit: Set("V".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn default_pool_matches_service_sizing() {
        let pool = PoolSettings::default();
        assert_eq!(pool.min_connections, 5);
        assert_eq!(pool.max_connections, 15);
        assert_eq!(pool.max_lifetime, Duration::from_secs(3600));
        assert!(pool.test_before_acquire);
        assert!(!pool.statement_logging);
    }

    #[tokio::test]
    async fn init_db_is_idempotent() {
        let db = memory_db().await;
        init_db(&db).await.unwrap();
        assert_eq!(sensors::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn transaction_commits_on_success() {
        let db = memory_db().await;
        with_transaction(&db, |txn| {
            Box::pin(async move {
                sensor("a").insert(txn).await?;
                Ok(())
            })
        })
        .await
        .unwrap();
        assert_eq!(sensors::Entity::find().count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn transaction_rolls_back_on_error() {
        let db = memory_db().await;
        let result: Result<(), AppError> = with_transaction(&db, |txn| {
            Box::pin(async move {
                sensor("b").insert(txn).await?;
                Err(AppError::NotFound("abort".to_string()))
            })
        })
        .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(sensors::Entity::find().count(&db).await.unwrap(), 0);
    }
}
