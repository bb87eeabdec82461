use dotenv::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

const DEFAULT_MYSQL_PORT: u16 = 3306;
const DEFAULT_TWILIO_API_BASE: &str = "https://api.twilio.com";
const REDACTED: &str = "<redacted>";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("missing environment variables: {}", .0.join(", "))]
    Missing(Vec<String>),
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

impl ConfigError {
    /// The single line logged before the process exits on a failed start.
    pub fn startup_message(&self) -> String {
        match self {
            ConfigError::Missing(vars) => format!(
                "START CANCELED: Missing environment variables: {}",
                vars.join(", ")
            ),
            other => format!(
                "START CANCELED: All required environment variables are present, but settings failed to load. ({})",
                other
            ),
        }
    }
}

/// Service settings read from the environment.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Settings {
    pub mysql_database: String,
    pub mysql_user: String,
    pub mysql_password: String,
    pub mysql_host: String,
    pub mysql_port: u16,
    pub database_url_override: Option<String>,
    pub twilio_sid: String,
    pub twilio_key: String,
    pub twilio_from: String,
    pub twilio_to: String,
    pub twilio_api_base: String,
}

impl Settings {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build settings from an arbitrary variable source.
    ///
    /// Every required variable is checked before failing, so the error names
    /// all of the missing ones at once.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut required = |name: &str| match lookup(name).filter(|v| !v.is_empty()) {
            Some(value) => value,
            None => {
                missing.push(name.to_string());
                String::new()
            }
        };

        let mysql_database = required("MYSQL_DATABASE");
        let mysql_user = required("MYSQL_USER");
        let mysql_password = required("MYSQL_PASSWORD");
        let mysql_host = required("MYSQL_HOST");
        let twilio_sid = required("TWILIO_SID");
        let twilio_key = required("TWILIO_KEY");
        let twilio_from = required("TWILIO_FROM");
        let twilio_to = required("TWILIO_TO");

        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let mysql_port = match lookup("MYSQL_PORT") {
            Some(raw) => parse_var("MYSQL_PORT", &raw)?,
            None => DEFAULT_MYSQL_PORT,
        };

        Ok(Self {
            mysql_database,
            mysql_user,
            mysql_password,
            mysql_host,
            mysql_port,
            database_url_override: lookup("DATABASE_URL").filter(|v| !v.is_empty()),
            twilio_sid,
            twilio_key,
            twilio_from,
            twilio_to,
            twilio_api_base: lookup("TWILIO_API_BASE")
                .unwrap_or_else(|| DEFAULT_TWILIO_API_BASE.to_string()),
        })
    }

    /// Connection URL for the database pool.
    ///
    /// The password is percent-encoded so characters such as `@` or `/` do not
    /// break the authority section.
    pub fn database_url(&self) -> String {
        if let Some(url) = &self.database_url_override {
            return url.clone();
        }
        format!(
            "mysql://{}:{}@{}:{}/{}",
            self.mysql_user,
            urlencoding::encode(&self.mysql_password),
            self.mysql_host,
            self.mysql_port,
            self.mysql_database
        )
    }

    /// Copy with secrets masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.mysql_password = REDACTED.to_string();
        copy.twilio_key = REDACTED.to_string();
        copy.database_url_override = copy
            .database_url_override
            .as_ref()
            .map(|_| REDACTED.to_string());
        copy
    }
}

/// HTTP server parameters.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ServeConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub root_path: String,
    pub cors_origins: String,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4001,
            workers: 1,
            root_path: "/api/1".to_string(),
            cors_origins: "*".to_string(),
        }
    }
}

impl ServeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let port = match lookup("PORT") {
            Some(raw) => parse_var("PORT", &raw)?,
            None => defaults.port,
        };
        let workers = match lookup("WORKERS") {
            Some(raw) => parse_var("WORKERS", &raw)?,
            None => defaults.workers,
        };

        let config = Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port,
            workers,
            root_path: lookup("ROOT_PATH").unwrap_or(defaults.root_path),
            cors_origins: lookup("CORS_ORIGINS").unwrap_or(defaults.cors_origins),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid {
                var: "WORKERS".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        var: var.to_string(),
        reason: e.to_string(),
    })
}
