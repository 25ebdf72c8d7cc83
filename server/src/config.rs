use std::env;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Origin allowed to call the API from a browser.
    pub frontend_url: String,
    pub seed_sample_data: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            database_url: "sqlite://tasks.db".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            seed_sample_data: false,
        }
    }
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv` first to pick
    /// up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let port = match lookup("PORT") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidValue { key: "PORT", value })?,
            None => defaults.port,
        };
        let seed_sample_data = match lookup("SEED_SAMPLE_DATA") {
            Some(value) => parse_flag(&value).ok_or(ConfigError::InvalidValue {
                key: "SEED_SAMPLE_DATA",
                value,
            })?,
            None => defaults.seed_sample_data,
        };

        // Sent back verbatim as a header value.
        let frontend_url = match lookup("FRONTEND_URL") {
            Some(value) if value.chars().any(char::is_control) => {
                return Err(ConfigError::InvalidValue {
                    key: "FRONTEND_URL",
                    value,
                })
            }
            Some(value) => value,
            None => defaults.frontend_url,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port,
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            frontend_url,
            seed_sample_data,
        })
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
