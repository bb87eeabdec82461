use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "sensorhub=info,tower_http=info";

/// Structured logging macro for database operations
#[macro_export]
macro_rules! db_info {
    ($($arg:tt)*) => {
        tracing::info!(category = "database", $($arg)*)
    };
}

/// Structured logging macro for database failures
#[macro_export]
macro_rules! db_error {
    ($($arg:tt)*) => {
        tracing::error!(category = "database", $($arg)*)
    };
}

/// Structured logging macro for server operations
#[macro_export]
macro_rules! server_info {
    ($($arg:tt)*) => {
        tracing::info!(category = "server", $($arg)*)
    };
}

/// Structured logging macro for server operations with fields
#[macro_export]
macro_rules! server_info_with_fields {
    ($($field:ident = $value:expr),*; $($arg:tt)*) => {
        tracing::info!(category = "server", $($field = $value,)* $($arg)*)
    };
}

/// Structured logging macro for fatal configuration problems
#[macro_export]
macro_rules! config_critical {
    ($($arg:tt)*) => {
        tracing::error!(category = "config_loader", critical = true, $($arg)*)
    };
}

/// Structured logging macro for outbound notifications
#[macro_export]
macro_rules! notify_info_with_fields {
    ($($field:ident = $value:expr),*; $($arg:tt)*) => {
        tracing::info!(category = "notify", $($field = $value,)* $($arg)*)
    };
}

/// Install the global subscriber.
///
/// `RUST_LOG` drives the filter. `LOG_FORMAT=json` switches to one JSON object
/// per line. Events are written straight to stdout.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stdout))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
            .try_init()
    };

    if let Err(e) = result {
        eprintln!("tracing already initialized: {}", e);
    }
}
