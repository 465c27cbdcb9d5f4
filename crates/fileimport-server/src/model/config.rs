//! Configuration management for the file import server
//!
//! Settings come from `conf/application.yml` (or `--config`), overridden by
//! environment variables such as `FILEIMPORT_MINIO__ENDPOINT`, then by
//! command line flags.

use std::path::{Path, PathBuf};

use clap::Parser;
use config::{Config, ConfigError, Environment, File, FileFormat, Map};
use fileimport_common::settings::{
    FtpSettings, MetadataSettings, MinioSettings, RedisSettings, TaskSettings,
};
use fileimport_common::{ImportError, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError};

use crate::startup::{LogRotation, LoggingConfig};

pub const DEFAULT_CONFIG_FILE: &str = "conf/application.yml";
pub const ENV_PREFIX: &str = "FILEIMPORT";

pub const FTP_SECTION: &str = "ftp.server";
pub const MINIO_SECTION: &str = "minio";
pub const REDIS_SECTION: &str = "redis";
pub const METADATA_SECTION: &str = "metadata";
pub const TASK_SECTION: &str = "task";
pub const SERVER_SECTION: &str = "server";
pub const LOGGING_SECTION: &str = "logging";

/// Command line arguments for the server
#[derive(Debug, Clone, Parser)]
#[command(
    name = "fileimport-server",
    version,
    about = "Imports files from an FTP server into object storage on a cron schedule"
)]
pub struct Cli {
    /// Configuration file
    #[arg(short = 'c', long = "config", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
    /// HTTP port, overrides `server.port`
    #[arg(short = 'p', long = "port", env = "FILEIMPORT_PORT")]
    pub port: Option<u16>,
    /// Run a single import and exit
    #[arg(long = "run-once")]
    pub run_once: bool,
}

// ---------------------------------------------------------------------------
// server / logging sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "kebab-case")]
pub struct ServerSettings {
    #[serde(default = "default_address")]
    #[validate(length(min = 1))]
    pub address: String,
    #[serde(default = "default_port")]
    #[validate(range(min = 1))]
    pub port: u16,
    /// Prefix for every route, e.g. `/fileimport`. Empty serves from the root.
    #[serde(default)]
    #[validate(custom(function = "validate_context_path"))]
    pub context_path: String,
    /// Seconds in-flight requests get to finish on shutdown.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            context_path: String::new(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

fn default_address() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_shutdown_timeout_secs() -> u64 {
    30
}

fn validate_context_path(path: &str) -> std::result::Result<(), ValidationError> {
    if path.is_empty() || (path.starts_with('/') && !path.ends_with('/')) {
        Ok(())
    } else {
        Err(ValidationError::new("context_path")
            .with_message("context path must start with '/' and must not end with '/'".into()))
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "kebab-case")]
pub struct LoggingSettings {
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_level")]
    #[validate(length(min = 1))]
    pub level: String,
    #[serde(default = "default_true")]
    pub console: bool,
    #[serde(default = "default_true")]
    pub file: bool,
    #[serde(default)]
    pub rotation: LogRotation,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            dir: None,
            level: default_level(),
            console: true,
            file: true,
            rotation: LogRotation::Daily,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Layered application configuration with typed, validated section getters
#[derive(Clone, Debug)]
pub struct Configuration {
    pub config: Config,
}

fn config_error(e: ConfigError) -> ImportError {
    ImportError::config(e.to_string())
}

/// `FILEIMPORT_` variables from the process environment.
fn environment() -> Environment {
    environment_from(std::env::vars())
}

/// Environment source over `vars`, with each key rewritten to the kebab-case
/// spelling used by the configuration file.
fn environment_from<I, K, V>(vars: I) -> Environment
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let source: Map<String, String> = vars
        .into_iter()
        .filter_map(|(key, value)| env_key(key.as_ref()).map(|key| (key, value.into())))
        .collect();

    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .source(Some(source))
}

/// `FILEIMPORT_MINIO__SECRET_KEY` becomes `FILEIMPORT_MINIO__SECRET-KEY`, which
/// the environment source then reads as `minio.secret-key`.
fn env_key(key: &str) -> Option<String> {
    let path = key.strip_prefix(ENV_PREFIX)?.strip_prefix('_')?;
    let path = path
        .split("__")
        .map(|segment| segment.replace('_', "-"))
        .collect::<Vec<_>>()
        .join("__");
    Some(format!("{ENV_PREFIX}_{path}"))
}

impl Configuration {
    /// Load the file named by `--config`, the environment, and CLI overrides.
    pub fn new(cli: &Cli) -> Result<Self> {
        Self::load(&cli.config, cli.port, Some(environment()))
    }

    fn load(path: &Path, port: Option<u16>, env: Option<Environment>) -> Result<Self> {
        if !path.exists() {
            return Err(ImportError::config(format!(
                "configuration file {} not found",
                path.display()
            )));
        }

        let mut builder = Config::builder().add_source(File::from(path));
        if let Some(env) = env {
            builder = builder.add_source(env);
        }
        if let Some(port) = port {
            builder = builder
                .set_override("server.port", i64::from(port))
                .map_err(config_error)?;
        }

        let config = builder.build().map_err(config_error)?;
        Ok(Configuration { config })
    }

    /// Configuration from an inline YAML document, without environment overrides.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .map_err(config_error)?;
        Ok(Configuration { config })
    }

    fn section<T: DeserializeOwned + Validate>(&self, key: &str) -> Result<T> {
        let value: T = self
            .config
            .get(key)
            .map_err(|e| ImportError::config(format!("{key}: {e}")))?;
        validate_section(key, value)
    }

    fn section_or_default<T: DeserializeOwned + Validate + Default>(&self, key: &str) -> Result<T> {
        match self.config.get::<T>(key) {
            Ok(value) => validate_section(key, value),
            Err(ConfigError::NotFound(_)) => Ok(T::default()),
            Err(e) => Err(ImportError::config(format!("{key}: {e}"))),
        }
    }

    // ========================================================================
    // Sections
    // ========================================================================

    pub fn server_settings(&self) -> Result<ServerSettings> {
        self.section_or_default(SERVER_SECTION)
    }

    pub fn ftp_settings(&self) -> Result<FtpSettings> {
        self.section(FTP_SECTION)
    }

    pub fn minio_settings(&self) -> Result<MinioSettings> {
        self.section(MINIO_SECTION)
    }

    pub fn redis_settings(&self) -> Result<RedisSettings> {
        self.section_or_default(REDIS_SECTION)
    }

    pub fn metadata_settings(&self) -> Result<MetadataSettings> {
        self.section_or_default(METADATA_SECTION)
    }

    pub fn task_settings(&self) -> Result<TaskSettings> {
        self.section_or_default(TASK_SECTION)
    }

    pub fn logging_settings(&self) -> Result<LoggingSettings> {
        self.section_or_default(LOGGING_SECTION)
    }

    pub fn logging_config(&self) -> Result<LoggingConfig> {
        Ok(LoggingConfig::from_settings(&self.logging_settings()?))
    }

    /// Load and validate every section, failing on the first bad one.
    pub fn validate(&self) -> Result<()> {
        self.server_settings()?;
        self.ftp_settings()?;
        self.minio_settings()?;
        self.redis_settings()?;
        self.metadata_settings()?;
        self.task_settings()?;
        self.logging_settings()?;
        Ok(())
    }
}

fn validate_section<T: Validate>(key: &str, value: T) -> Result<T> {
    value
        .validate()
        .map_err(|e| ImportError::config(format!("invalid {key} configuration: {e}")))?;
    Ok(value)
}
