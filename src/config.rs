//! Configuration management for the library server

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::{env, str::FromStr};

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// How long in-flight requests may run after a shutdown signal
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Full connection URL; takes precedence over the individual fields
    #[serde(default)]
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub name: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    pub sslmode: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from defaults, files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let defaults = Self::default();

        let config = Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", defaults.server.port as i64)?
            .set_default("server.shutdown_timeout_secs", defaults.server.shutdown_timeout_secs as i64)?
            .set_default("database.host", defaults.database.host)?
            .set_default("database.port", defaults.database.port as i64)?
            .set_default("database.name", defaults.database.name)?
            .set_default("database.user", defaults.database.user)?
            .set_default("database.password", defaults.database.password)?
            .set_default("database.sslmode", defaults.database.sslmode)?
            .set_default("database.max_connections", defaults.database.max_connections as i64)?
            .set_default("database.min_connections", defaults.database.min_connections as i64)?
            .set_default("database.acquire_timeout_secs", defaults.database.acquire_timeout_secs as i64)?
            .set_default("logging.level", defaults.logging.level)?
            .set_default("logging.format", defaults.logging.format)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // LIBRARY_SERVER__PORT, LIBRARY_DATABASE__MAX_CONNECTIONS, ...
            .add_source(
                Environment::with_prefix("LIBRARY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            // Variable names used by existing deployments
            .set_override_option("database.host", env::var("POSTGRES_HOST").ok())?
            .set_override_option("database.port", env::var("POSTGRES_PORT").ok())?
            .set_override_option("database.name", env::var("POSTGRES_NAME").ok())?
            .set_override_option("database.user", env::var("POSTGRES_USERNAME").ok())?
            .set_override_option("database.password", env::var("POSTGRES_PASSWORD").ok())?
            .set_override_option("database.sslmode", env::var("POSTGRES_SSL_MODE").ok())?
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .set_override_option("server.host", env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", env::var("SERVER_PORT").ok())?
            .build()?;

        config.try_deserialize()
    }
}

impl DatabaseConfig {
    /// libpq keyword/value connection string.
    ///
    /// Credentials are only appended when a user is configured; without one the
    /// server is expected to use trust or peer authentication.
    pub fn connection_string(&self) -> String {
        self.dsn(&self.password)
    }

    /// [`connection_string`](Self::connection_string) with the password masked,
    /// for logs
    pub fn redacted_connection_string(&self) -> String {
        self.dsn("****")
    }

    fn dsn(&self, password: &str) -> String {
        let mut dsn = format!(
            "host={} port={} dbname={} sslmode={}",
            self.host, self.port, self.name, self.sslmode
        );

        if !self.user.is_empty() {
            dsn.push_str(&format!(" user={} password={}", self.user, password));
        }

        dsn
    }

    /// Connection options for the pool, from `url` when set, otherwise from the
    /// individual fields.
    pub fn connect_options(&self) -> Result<PgConnectOptions, sqlx::Error> {
        if let Some(url) = self.url.as_deref().filter(|u| !u.is_empty()) {
            return PgConnectOptions::from_str(url);
        }

        let mut options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.name)
            .ssl_mode(PgSslMode::from_str(&self.sslmode)?);

        if !self.user.is_empty() {
            options = options.username(&self.user).password(&self.password);
        }

        Ok(options)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8090,
            shutdown_timeout_secs: 10,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            name: "library".to_string(),
            user: "library".to_string(),
            password: "library".to_string(),
            sslmode: "disable".to_string(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_secs: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
