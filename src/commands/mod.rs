pub mod config_cmd;
pub mod init_db_cmd;
pub mod notify_cmd;
pub mod serve_cmd;

use sensorhub::config::Settings;
use sensorhub::config_critical;

/// Load settings, or log why the start was canceled and exit with status 1.
pub fn load_settings_or_exit() -> Settings {
    match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            config_critical!("{}", e.startup_message());
            std::process::exit(1);
        }
    }
}
