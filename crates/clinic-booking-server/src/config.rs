//! Server configuration.
//!
//! Defaults, then an optional `clinic.toml`, then `CLINIC_*` environment
//! variables (e.g. `CLINIC_PORT=9000`, `CLINIC_DATABASE_PATH=/var/lib/clinic.db`).

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use clinic_booking_core::db::MAX_BUSY_TIMEOUT;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use tracing::Level;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    /// How long a request waits on a locked database before failing
    pub busy_timeout_ms: u64,
    /// trace, debug, info, warn or error
    pub log_level: String,
}

impl ServerConfig {
    /// Load from `clinic.toml` in the working directory, if present.
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(File::with_name("clinic").required(false))
    }

    /// Load from an explicit TOML file.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        Self::build(File::from(path))
    }

    fn build<S>(file: S) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let settings = Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8080_i64)?
            .set_default("database_path", "clinic.db")?
            .set_default("busy_timeout_ms", 5000_i64)?
            .set_default("log_level", "info")?
            .add_source(file)
            .add_source(Environment::with_prefix("CLINIC"))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Message("port must be non-zero".to_string()));
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::Message("host is required".to_string()));
        }
        if self.busy_timeout() > MAX_BUSY_TIMEOUT {
            return Err(ConfigError::Message(format!(
                "busy_timeout_ms must be at most {}",
                MAX_BUSY_TIMEOUT.as_millis()
            )));
        }
        self.level()?;
        Ok(())
    }

    pub fn level(&self) -> Result<Level, ConfigError> {
        Level::from_str(&self.log_level)
            .map_err(|_| ConfigError::Message(format!("unknown log_level {:?}", self.log_level)))
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
