use super::load_settings_or_exit;
use sensorhub::config::ServeConfig;
use serde::Serialize;
use std::error::Error;

#[derive(Serialize)]
struct ConfigView<'a> {
    settings: &'a sensorhub::config::Settings,
    database_url: String,
    serve: &'a ServeConfig,
}

pub async fn show_config() -> Result<(), Box<dyn Error>> {
    let settings = load_settings_or_exit().redacted();
    let serve = ServeConfig::from_env()?;
    let view = ConfigView {
        settings: &settings,
        database_url: settings.database_url(),
        serve: &serve,
    };
    match serde_yaml::to_string(&view) {
        Ok(yaml) => println!("{}", yaml),
        Err(e) => eprintln!("Error formatting config as YAML: {}", e),
    }
    Ok(())
}
