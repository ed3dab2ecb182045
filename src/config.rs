use config::{Config, ConfigError, File};
use secrecy::{ExposeSecret, Secret};
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::{
    postgres::{PgConnectOptions, PgSslMode},
    ConnectOptions,
};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::storage::QueryTimeout;

#[derive(Debug)]
pub enum Environment {
    Development,
    Production,
}

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    pub log_level: String,
    // Grace period given to in-flight requests on shutdown
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub shutdown_timeout_seconds: u64,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    // secrecy protects secret information and prevents them to be exposed (eg: via logs)
    pub password: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    pub name: String,
    pub require_ssl: bool,
    // Full connection string, wins over the discrete fields above when present
    #[serde(default)]
    pub url: Option<Secret<String>>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub query_timeout_milliseconds: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_connections: u32,
    pub migrations_dir: String,
    // Set by `set_name`, makes `name` win over the database named in `url`
    #[serde(skip)]
    pub name_overrides_url: bool,
}

impl Settings {
    pub fn get_address(&self) -> String {
        format!(
            "{}:{}",
            self.application.get_host(),
            self.application.get_port()
        )
    }

    pub fn get_log_level(&self) -> String {
        self.application.log_level.clone()
    }

    pub fn get_shutdown_timeout(&self) -> u64 {
        self.application.shutdown_timeout_seconds
    }

    pub fn set_app_port(&mut self, port: u16) {
        self.application.port = port;
    }
}

impl DatabaseSettings {
    pub fn get_db_options(&self) -> Result<PgConnectOptions, sqlx::Error> {
        let mut db_options = match &self.url {
            Some(url) if self.name_overrides_url => {
                PgConnectOptions::from_str(url.expose_secret())?.database(&self.name)
            }
            Some(url) => PgConnectOptions::from_str(url.expose_secret())?,
            None => {
                let ssl_mode = if self.require_ssl {
                    PgSslMode::Require
                } else {
                    PgSslMode::Prefer
                };

                PgConnectOptions::new()
                    .host(&self.host)
                    .password(self.password.expose_secret())
                    .username(&self.username)
                    .port(self.port)
                    .database(&self.name)
                    .ssl_mode(ssl_mode)
            }
        };

        db_options.log_statements(tracing::log::LevelFilter::Trace);

        Ok(db_options)
    }

    /// Options pointing at the server itself rather than a specific database.
    pub fn get_server_options(&self) -> Result<PgConnectOptions, sqlx::Error> {
        Ok(self.get_db_options()?.database("postgres"))
    }

    pub fn get_query_timeout(&self) -> QueryTimeout {
        QueryTimeout::new(Duration::from_millis(self.query_timeout_milliseconds))
    }

    pub fn get_migrations_dir(&self) -> PathBuf {
        PathBuf::from(&self.migrations_dir)
    }

    pub fn get_name(&self) -> String {
        self.name.clone()
    }

    pub fn set_name(&mut self, new_db_name: String) {
        self.name = new_db_name;
        self.name_overrides_url = true;
    }
}

impl ApplicationSettings {
    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub fn get_host(&self) -> String {
        self.host.clone()
    }
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            unknown_env => Err(format!(
                "{} is not supported environment. Use either 'development' or 'production'.",
                unknown_env
            )),
        }
    }
}

pub fn get_environment() -> Result<Environment, ConfigError> {
    std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "development".into())
        .try_into()
        .map_err(ConfigError::Message)
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let root_path = std::env::current_dir()
        .map_err(|err| ConfigError::Message(format!("Failed to determine the current directory: {}", err)))?;
    let config_directory = root_path.join("config");
    let environment = get_environment()?;
    let config_base_filepath = config_directory.join("base");
    let config_env_filepath = config_directory.join(environment.as_str());

    // Base values, then the environment specific file, then APP_* variables
    // E.g APP_APPLICATION__PORT would set Settings.application.port
    let settings = Config::builder()
        .add_source(File::from(config_base_filepath).required(true))
        .add_source(File::from(config_env_filepath).required(false))
        .add_source(config::Environment::with_prefix("app").separator("__"))
        .build()?;

    settings.try_deserialize()
}
