use super::load_settings_or_exit;
use sensorhub::config::ServeConfig;
use sensorhub::{create_app, create_app_state, db, server_info, server_info_with_fields};
use std::error::Error;
use std::future::Future;
use std::io;
use tokio::signal;

pub async fn execute(config: ServeConfig) -> Result<(), Box<dyn Error>> {
    let settings = load_settings_or_exit();

    server_info!("Starting sensorhub");
    let app_state = create_app_state(&settings).await?;
    let app = create_app(app_state.clone(), &config);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    server_info_with_fields!(
        addr = addr.as_str(),
        workers = config.workers,
        root_path = config.root_path.as_str();
        "Server running at http://{}", addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    server_info!("Server stopped, releasing resources");
    db::close_db(app_state.db_pool).await?;
    Ok(())
}

/// Resolve when `listener` reports a signal. A listener that fails to
/// register parks forever so it cannot trigger shutdown.
async fn signal_or_park<F>(name: &str, listener: F)
where
    F: Future<Output = io::Result<()>>,
{
    if let Err(e) = listener.await {
        tracing::error!("failed to listen for {}: {}", name, e);
        std::future::pending::<()>().await;
    }
}

async fn shutdown_signal() {
    let ctrl_c = signal_or_park("ctrl-c", signal::ctrl_c());

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => signal_or_park("SIGTERM", async { Err(e) }).await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    server_info!("Shutdown signal received");
}
