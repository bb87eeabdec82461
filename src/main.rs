mod commands;

use clap::{Parser, Subcommand};
use sensorhub::config::ServeConfig;
use sensorhub::utils::logging::init_tracing;
use std::error::Error;

#[derive(Parser)]
#[command(name = "sensorhub", version, about = "Sensor telemetry API")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        /// Runtime worker threads
        #[arg(long)]
        workers: Option<usize>,
        #[arg(long)]
        root_path: Option<String>,
    },
    /// Create missing database tables and exit
    InitDb,
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Send a WhatsApp message to the configured recipient
    Notify {
        body: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the resolved configuration with secrets redacted
    Show,
}

fn resolve_serve_config(
    host: Option<String>,
    port: Option<u16>,
    workers: Option<usize>,
    root_path: Option<String>,
) -> Result<ServeConfig, Box<dyn Error>> {
    let mut config = ServeConfig::from_env()?;
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(workers) = workers {
        config.workers = workers;
    }
    if let Some(root_path) = root_path {
        config.root_path = root_path;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing();

    let (workers, serve_config) = match &cli.command {
        Commands::Serve {
            host,
            port,
            workers,
            root_path,
        } => {
            let config =
                resolve_serve_config(host.clone(), *port, *workers, root_path.clone())?;
            (config.workers, Some(config))
        }
        _ => (1, None),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(workers)
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        match cli.command {
            Commands::Serve { .. } => {
                commands::serve_cmd::execute(serve_config.unwrap_or_default()).await
            }
            Commands::InitDb => commands::init_db_cmd::execute().await,
            Commands::Config {
                command: ConfigCommands::Show,
            } => commands::config_cmd::show_config().await,
            Commands::Notify { body } => commands::notify_cmd::execute(body).await,
        }
    })
}
