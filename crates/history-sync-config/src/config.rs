use crate::error::ConfigError;
use crate::paths::PathManager;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const ENV_SOURCE_HOST: &str = "TAUTULLI_IP";
pub const ENV_SOURCE_PORT: &str = "TAUTULLI_PORT";
pub const ENV_SOURCE_API_KEY: &str = "TAUTULLI_API_KEY";
pub const ENV_SOURCE_HISTORY_LENGTH: &str = "TAUTULLI_HISTORY_LENGTH";
pub const ENV_DB_USER: &str = "DB_USER";
pub const ENV_DB_PASS: &str = "DB_PASS";
pub const ENV_DB_HOST: &str = "DB_HOST";
pub const ENV_DB_PORT: &str = "DB_PORT";
pub const ENV_DB_NAME: &str = "DB_NAME";
pub const ENV_SYNC_INTERVAL: &str = "SYNC_INTERVAL_SECS";

const MASK: &str = "********";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Tautulli API connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_source_port")]
    pub port: u16,
    #[serde(default)]
    pub api_key: String,
    /// Number of most recent history rows requested per cycle
    #[serde(default = "default_history_length")]
    pub history_length: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// PostgreSQL destination settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_store_port")]
    pub port: u16,
    #[serde(default)]
    pub database: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_true")]
    pub run_on_startup: bool,
}

fn default_true() -> bool {
    true
}

fn default_source_port() -> u16 {
    8181
}

fn default_history_length() -> u32 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_store_port() -> u16 {
    5432
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_interval_secs() -> u64 {
    3600 // 1 hour
}

pub fn default_scheduler_config() -> SchedulerConfig {
    SchedulerConfig {
        interval_secs: default_interval_secs(),
        run_on_startup: default_true(),
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_source_port(),
            api_key: String::new(),
            history_length: default_history_length(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            user: String::new(),
            password: String::new(),
            host: String::new(),
            port: default_store_port(),
            database: String::new(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        default_scheduler_config()
    }
}

impl SourceConfig {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl StoreConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Connection URL with the password masked, for logs and `config show`
    pub fn redacted_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, MASK, self.host, self.port, self.database
        )
    }
}

impl SchedulerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Config {
    /// Load the effective configuration: defaults, then the TOML file (explicit
    /// path, or the default location when it exists), then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = Self::load_unvalidated(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Same layering as [`Config::load`] without the final validation, for
    /// inspecting an incomplete setup
    pub fn load_unvalidated(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => match Self::default_path() {
                Some(path) => Self::load_from_file(&path)?,
                None => Self::default(),
            },
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Default config file, if one has been created
    pub fn default_path() -> Option<PathBuf> {
        let path = PathManager::default().config_file();
        path.exists().then_some(path)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Apply environment-style overrides. `lookup` returns the raw value for a
    /// variable name, or `None` when it is unset.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = text(ENV_SOURCE_HOST) {
            self.source.host = v;
        }
        if let Some(v) = text(ENV_SOURCE_PORT) {
            self.source.port = parse_number(ENV_SOURCE_PORT, &v)?;
        }
        if let Some(v) = text(ENV_SOURCE_API_KEY) {
            self.source.api_key = v;
        }
        if let Some(v) = text(ENV_SOURCE_HISTORY_LENGTH) {
            self.source.history_length = parse_number(ENV_SOURCE_HISTORY_LENGTH, &v)?;
        }
        if let Some(v) = text(ENV_DB_USER) {
            self.store.user = v;
        }
        // Passwords may legitimately be whitespace, so no trimming filter here
        if let Some(v) = lookup(ENV_DB_PASS) {
            self.store.password = v;
        }
        if let Some(v) = text(ENV_DB_HOST) {
            self.store.host = v;
        }
        if let Some(v) = text(ENV_DB_PORT) {
            self.store.port = parse_number(ENV_DB_PORT, &v)?;
        }
        if let Some(v) = text(ENV_DB_NAME) {
            self.store.database = v;
        }
        if let Some(v) = text(ENV_SYNC_INTERVAL) {
            self.scheduler.interval_secs = parse_number(ENV_SYNC_INTERVAL, &v)?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.host.trim().is_empty() {
            return Err(ConfigError::Missing(ENV_SOURCE_HOST));
        }
        if self.source.api_key.trim().is_empty() {
            return Err(ConfigError::Missing(ENV_SOURCE_API_KEY));
        }
        if self.store.user.trim().is_empty() {
            return Err(ConfigError::Missing(ENV_DB_USER));
        }
        if self.store.host.trim().is_empty() {
            return Err(ConfigError::Missing(ENV_DB_HOST));
        }
        if self.store.database.trim().is_empty() {
            return Err(ConfigError::Missing(ENV_DB_NAME));
        }

        ensure_positive(ENV_SOURCE_PORT, u64::from(self.source.port))?;
        ensure_positive(ENV_SOURCE_HISTORY_LENGTH, u64::from(self.source.history_length))?;
        ensure_positive("source.request_timeout_secs", self.source.request_timeout_secs)?;
        ensure_positive(ENV_DB_PORT, u64::from(self.store.port))?;
        ensure_positive("store.connect_timeout_secs", self.store.connect_timeout_secs)?;
        ensure_positive(ENV_SYNC_INTERVAL, self.scheduler.interval_secs)?;

        Ok(())
    }

    /// Copy of the configuration with secrets replaced, safe to print
    pub fn masked(&self) -> Self {
        let mut masked = self.clone();
        if !masked.source.api_key.is_empty() {
            masked.source.api_key = MASK.to_string();
        }
        if !masked.store.password.is_empty() {
            masked.store.password = MASK.to_string();
        }
        masked
    }
}

fn parse_number<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: format!("'{}' ({})", value, e),
    })
}

fn ensure_positive(key: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid {
            key,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::NamedTempFile;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn complete_env() -> Vec<(&'static str, &'static str)> {
        vec![
            (ENV_SOURCE_HOST, "192.168.1.20"),
            (ENV_SOURCE_API_KEY, "abc123"),
            (ENV_DB_USER, "plex"),
            (ENV_DB_PASS, "secret"),
            (ENV_DB_HOST, "db"),
            (ENV_DB_NAME, "media"),
        ]
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.source.port, 8181);
        assert_eq!(config.source.history_length, 1000);
        assert_eq!(config.source.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.store.port, 5432);
        assert_eq!(config.scheduler.interval(), Duration::from_secs(3600));
        assert!(config.scheduler.run_on_startup);
    }

    #[test]
    fn test_env_overrides_fill_required_settings() {
        let mut config = Config::default();
        config.apply_overrides(env(&complete_env())).unwrap();
        config.validate().unwrap();

        assert_eq!(config.source.base_url(), "http://192.168.1.20:8181");
        assert_eq!(config.store.redacted_url(), "postgres://plex:********@db:5432/media");
        assert_eq!(config.store.password, "secret");
    }

    #[test]
    fn test_missing_required_setting() {
        let mut vars = complete_env();
        vars.retain(|(k, _)| *k != ENV_SOURCE_API_KEY);

        let mut config = Config::default();
        config.apply_overrides(env(&vars)).unwrap();
        match config.validate() {
            Err(ConfigError::Missing(key)) => assert_eq!(key, ENV_SOURCE_API_KEY),
            other => panic!("expected missing api key, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_numeric_override() {
        let mut vars = complete_env();
        vars.push((ENV_SYNC_INTERVAL, "hourly"));

        let mut config = Config::default();
        let err = config.apply_overrides(env(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key, .. } if key == ENV_SYNC_INTERVAL));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut vars = complete_env();
        vars.push((ENV_SYNC_INTERVAL, "0"));

        let mut config = Config::default();
        config.apply_overrides(env(&vars)).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_then_env_override() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            r#"
[source]
host = "tautulli.local"
api_key = "from-file"
history_length = 250

[store]
user = "plex"
host = "db"
database = "media"

[scheduler]
interval_secs = 900
"#,
        )
        .unwrap();

        let mut config = Config::load_from_file(file.path()).unwrap();
        assert_eq!(config.source.history_length, 250);
        assert_eq!(config.source.port, 8181);
        assert_eq!(config.scheduler.interval_secs, 900);

        config
            .apply_overrides(env(&[(ENV_SOURCE_API_KEY, "from-env")]))
            .unwrap();
        assert_eq!(config.source.api_key, "from-env");
        assert_eq!(config.source.host, "tautulli.local");
        config.validate().unwrap();
    }

    #[test]
    fn test_rendered_toml_reloads() {
        let file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.apply_overrides(env(&complete_env())).unwrap();
        std::fs::write(file.path(), config.to_toml().unwrap()).unwrap();

        let loaded = Config::load_from_file(file.path()).unwrap();
        assert_eq!(loaded.source.host, "192.168.1.20");
        assert_eq!(loaded.store.database, "media");
    }

    #[test]
    fn test_masked_hides_secrets() {
        let mut config = Config::default();
        config.apply_overrides(env(&complete_env())).unwrap();

        let masked = config.masked();
        assert_eq!(masked.source.api_key, MASK);
        assert_eq!(masked.store.password, MASK);
        assert_eq!(masked.store.user, "plex");
    }
}
