//! TOML-based configuration for carbridge.
//!
//! Supports a config file (carbridge.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [worker]
//! path = "${CARBRIDGE_HOME}/bin/car-worker"
//! working_dir = "./data"
//! args = []
//! grace_period_secs = 5
//!
//! [exchange]
//! timeout_ms = 10000
//! poll_interval_ms = 100
//!
//! [mailbox]
//! command_file = "command.json"
//! result_file = "result.json"
//!
//! [images]
//! source_prefix = "src/Images/"
//! resource_prefix = "/Images/"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::bridge::{
    ExchangeConfig, SupervisorConfig, DEFAULT_COMMAND_FILE, DEFAULT_RESULT_FILE,
};
use crate::cars::{PathRewrite, RESOURCE_IMAGE_PREFIX, SOURCE_IMAGE_PREFIX};

/// Name of the worker binary searched for when no path is configured.
const WORKER_BINARY: &str = "car-worker";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Worker binary not found. Set worker.path in config")]
    WorkerNotFound,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Worker process configuration.
    pub worker: WorkerSettings,

    /// Exchange polling configuration.
    pub exchange: ExchangeSettings,

    /// Mailbox slot file names.
    pub mailbox: MailboxSettings,

    /// Image path rewrite.
    pub images: ImageSettings,
}

/// Worker process configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerSettings {
    /// Path to the worker binary (supports ${ENV_VAR} expansion).
    pub path: Option<String>,

    /// Directory the worker runs in; the mailbox lives here too.
    pub working_dir: String,

    /// Extra worker arguments.
    pub args: Vec<String>,

    /// Seconds to wait for a graceful exit before killing the worker.
    pub grace_period_secs: u64,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            path: None,
            working_dir: ".".to_string(),
            args: Vec::new(),
            grace_period_secs: 5,
        }
    }
}

/// Exchange polling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExchangeSettings {
    /// Overall wait for a correlated response.
    pub timeout_ms: u64,

    /// Pause between reads of the result slot.
    pub poll_interval_ms: u64,
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            poll_interval_ms: 100,
        }
    }
}

/// Mailbox slot file names, relative to the worker's working directory.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MailboxSettings {
    pub command_file: String,
    pub result_file: String,
}

impl Default for MailboxSettings {
    fn default() -> Self {
        Self {
            command_file: DEFAULT_COMMAND_FILE.to_string(),
            result_file: DEFAULT_RESULT_FILE.to_string(),
        }
    }
}

/// Image path rewrite applied to received cars.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ImageSettings {
    /// Prefix used by the worker.
    pub source_prefix: String,

    /// Prefix the UI loads resources from.
    pub resource_prefix: String,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            source_prefix: SOURCE_IMAGE_PREFIX.to_string(),
            resource_prefix: RESOURCE_IMAGE_PREFIX.to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `CARBRIDGE_CONFIG`
    /// 2. `./carbridge.toml`
    /// 3. `~/.config/carbridge/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("CARBRIDGE_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("carbridge.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("carbridge").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        // Return defaults if no config file found
        Ok(Settings::default())
    }

    /// Check values that would make the bridge unusable.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.exchange.poll_interval_ms == 0 {
            return Err(SettingsError::InvalidConfig(
                "exchange.poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.exchange.timeout_ms == 0 {
            return Err(SettingsError::InvalidConfig(
                "exchange.timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.mailbox.command_file.is_empty() || self.mailbox.result_file.is_empty() {
            return Err(SettingsError::InvalidConfig(
                "mailbox file names must not be empty".to_string(),
            ));
        }
        if self.mailbox.command_file == self.mailbox.result_file {
            return Err(SettingsError::InvalidConfig(
                "mailbox command and result files must differ".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the worker binary path.
    ///
    /// Uses the configured path if set; otherwise looks next to the running
    /// executable, then in the current directory.
    pub fn worker_path(&self) -> Result<PathBuf, SettingsError> {
        if let Some(path) = &self.worker.path {
            return Ok(PathBuf::from(expand_env_vars(path)?));
        }

        let binary = format!("{}{}", WORKER_BINARY, env::consts::EXE_SUFFIX);
        let mut candidates = Vec::new();
        if let Ok(exe) = env::current_exe() {
            candidates.push(exe.with_file_name(&binary));
        }
        candidates.push(PathBuf::from(".").join(&binary));

        candidates
            .into_iter()
            .find(|path| path.is_file())
            .ok_or(SettingsError::WorkerNotFound)
    }

    /// Get the worker working directory with environment variables expanded.
    pub fn working_dir(&self) -> Result<PathBuf, SettingsError> {
        Ok(PathBuf::from(expand_env_vars(&self.worker.working_dir)?))
    }

    /// Build the supervisor launch configuration.
    ///
    /// Non-default mailbox file names are passed on to the worker as
    /// `--command-file` / `--result-file` so both sides agree on the slots.
    pub fn supervisor_config(&self) -> Result<SupervisorConfig, SettingsError> {
        let mut args = self
            .worker
            .args
            .iter()
            .map(|arg| expand_env_vars(arg))
            .collect::<Result<Vec<_>, _>>()?;

        if self.mailbox.command_file != DEFAULT_COMMAND_FILE {
            args.push("--command-file".to_string());
            args.push(self.mailbox.command_file.clone());
        }
        if self.mailbox.result_file != DEFAULT_RESULT_FILE {
            args.push("--result-file".to_string());
            args.push(self.mailbox.result_file.clone());
        }

        Ok(SupervisorConfig::new(self.worker_path()?, self.working_dir()?)
            .with_args(args)
            .with_grace_period(Duration::from_secs(self.worker.grace_period_secs)))
    }

    /// Build the exchange polling bounds.
    pub fn exchange_config(&self) -> ExchangeConfig {
        ExchangeConfig {
            timeout: Duration::from_millis(self.exchange.timeout_ms),
            poll_interval: Duration::from_millis(self.exchange.poll_interval_ms),
        }
    }

    /// Build the image path rewrite.
    pub fn path_rewrite(&self) -> PathRewrite {
        PathRewrite::new(&self.images.source_prefix, &self.images.resource_prefix)
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax. A lone `$` is kept as is.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let mut var_name = String::new();
        if chars.next_if_eq(&'{').is_some() {
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
        } else {
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                var_name.push(ch);
            }
            if var_name.is_empty() {
                result.push('$');
                continue;
            }
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
