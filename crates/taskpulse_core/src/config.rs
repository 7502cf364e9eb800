//! TOML configuration.
//!
//! # Responsibility
//! - Load `config.toml` from the profile's config directory or an explicit
//!   path, writing defaults on first run.
//! - Resolve relative/`~` paths and profile-specific data locations.
//!
//! # Invariants
//! - Every field has a default so partial files load.
//! - A loaded config has passed [`Config::validate`].

use crate::scheduler::SchedulerSettings;
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "config.toml";
const DATABASE_FILE_NAME: &str = "taskpulse.db";

/// Selects the on-disk directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Prod,
    /// Separate directories so development never touches real data.
    Dev,
}

impl Profile {
    fn app_name(self) -> &'static str {
        match self {
            Self::Prod => "taskpulse",
            Self::Dev => "taskpulse-dev",
        }
    }

    fn dirs(self) -> Option<ProjectDirs> {
        ProjectDirs::from("com", "taskpulse", self.app_name())
    }

    pub fn config_dir(self) -> Option<PathBuf> {
        self.dirs().map(|dirs| dirs.config_dir().to_path_buf())
    }

    pub fn data_dir(self) -> Option<PathBuf> {
        self.dirs().map(|dirs| dirs.data_dir().to_path_buf())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ConfigDir(String),
    Read { path: PathBuf, source: std::io::Error },
    Write { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConfigDir(message) => write!(f, "cannot determine directory: {message}"),
            Self::Read { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Write { path, source } => {
                write!(f, "failed to write config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Serialize(err) => write!(f, "failed to serialize config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } | Self::Write { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Serialize(err) => Some(err),
            Self::ConfigDir(_) | Self::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(value: toml::ser::Error) -> Self {
        Self::Serialize(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Empty means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Unset means `taskpulse.db` in the profile data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_grace_window_secs")]
    pub grace_window_secs: u64,
    #[serde(default = "default_snooze_minutes")]
    pub snooze_minutes: u32,
    #[serde(default = "default_modal_timeout_secs")]
    pub modal_timeout_secs: u64,
    #[serde(default = "default_removal_delay_ms")]
    pub removal_delay_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "enabled")]
    pub native: bool,
    #[serde(default = "enabled")]
    pub modal: bool,
    #[serde(default = "enabled")]
    pub cue: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Unset means the build-mode default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Unset means `logs/` under the profile data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_grace_window_secs() -> u64 {
    300
}

fn default_snooze_minutes() -> u32 {
    5
}

fn default_modal_timeout_secs() -> u64 {
    30
}

fn default_removal_delay_ms() -> u64 {
    2000
}

fn enabled() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            grace_window_secs: default_grace_window_secs(),
            snooze_minutes: default_snooze_minutes(),
            modal_timeout_secs: default_modal_timeout_secs(),
            removal_delay_ms: default_removal_delay_ms(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            native: true,
            modal: true,
            cue: true,
        }
    }
}

impl SchedulerConfig {
    pub fn to_settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            poll_interval: std::time::Duration::from_secs(self.poll_interval_secs),
            grace_window: chrono::Duration::seconds(to_i64(self.grace_window_secs)),
            snooze_minutes: self.snooze_minutes,
            modal_timeout: chrono::Duration::seconds(to_i64(self.modal_timeout_secs)),
            removal_delay: chrono::Duration::milliseconds(to_i64(self.removal_delay_ms)),
        }
    }
}

/// Caps configured durations well inside chrono's range.
fn to_i64(value: u64) -> i64 {
    const MAX_UNITS: u64 = 1_000_000_000_000;
    value.min(MAX_UNITS) as i64
}

impl Config {
    /// Loads the profile's config file, creating it with defaults if absent.
    pub fn load_with_profile(profile: Profile) -> Result<Self, ConfigError> {
        let path = Self::config_path(profile)?;
        Self::load_or_create(&path)
    }

    /// Loads `path`, creating it with defaults if absent.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::load_from(path);
        }
        let config = Config::default();
        config.save_to(path)?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&contents)?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn config_path(profile: Profile) -> Result<PathBuf, ConfigError> {
        profile
            .config_dir()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .ok_or_else(|| ConfigError::ConfigDir("no home directory for config".to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.poll_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.scheduler.snooze_minutes == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.snooze_minutes must be greater than zero".to_string(),
            ));
        }
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::Invalid("server.host cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Database file for the sqlite backend.
    pub fn database_path(&self, profile: Profile) -> Result<PathBuf, ConfigError> {
        match &self.storage.database_path {
            Some(path) => Ok(expand_path(path)),
            None => profile
                .data_dir()
                .map(|dir| dir.join(DATABASE_FILE_NAME))
                .ok_or_else(|| ConfigError::ConfigDir("no home directory for data".to_string())),
        }
    }

    /// Absolute directory for rotating log files.
    pub fn log_dir(&self, profile: Profile) -> Result<PathBuf, ConfigError> {
        let dir = match &self.logging.dir {
            Some(dir) => expand_path(dir),
            None => profile
                .data_dir()
                .map(|dir| dir.join("logs"))
                .ok_or_else(|| ConfigError::ConfigDir("no home directory for logs".to_string()))?,
        };
        if dir.is_absolute() {
            return Ok(dir);
        }
        std::env::current_dir()
            .map(|cwd| cwd.join(dir))
            .map_err(|err| ConfigError::ConfigDir(err.to_string()))
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .level
            .as_deref()
            .unwrap_or_else(|| crate::logging::default_log_level())
    }
}

/// Expands a leading `~/` to the home directory.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(base) = BaseDirs::new() {
            return base.home_dir().join(rest);
        }
    }
    PathBuf::from(path)
}
