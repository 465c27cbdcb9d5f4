//! File-based logging with per-component files.
//!
//! | Log File        | Component                          | Target Prefixes                                  |
//! |-----------------|------------------------------------|--------------------------------------------------|
//! | fileimport.log  | Root logger (all components)       | (all)                                            |
//! | ftp.log         | FTP fetch                          | fileimport_core::source, suppaftp                |
//! | storage.log     | Object storage uploads             | fileimport_core::storage, object_store           |
//! | metadata.log    | File status store                  | fileimport_core::metadata, redis                 |
//! | import.log      | Import runs and the cron scheduler | fileimport_core::processor, ::scheduler          |
//! | http.log        | REST API and access log            | fileimport_server::api, actix_web                |
//!
//! Log files are stored in `~/fileimport/logs` unless `logging.dir` is set.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::model::config::LoggingSettings;

/// Root log file name
pub const ROOT_LOG_FILE: &str = "fileimport.log";

struct ComponentLogDef {
    file_name: &'static str,
    targets: &'static [&'static str],
}

/// Each entry produces a separate rolling log file. Events are routed by their
/// `tracing` target; the root file always captures everything.
const COMPONENT_LOGS: &[ComponentLogDef] = &[
    ComponentLogDef {
        file_name: "ftp.log",
        targets: &["fileimport_core::source", "suppaftp"],
    },
    ComponentLogDef {
        file_name: "storage.log",
        targets: &["fileimport_core::storage", "object_store"],
    },
    ComponentLogDef {
        file_name: "metadata.log",
        targets: &["fileimport_core::metadata", "redis"],
    },
    ComponentLogDef {
        file_name: "import.log",
        targets: &["fileimport_core::processor", "fileimport_core::scheduler"],
    },
    ComponentLogDef {
        file_name: "http.log",
        targets: &["fileimport_server::api", "actix_web", "actix_server"],
    },
];

/// Log rotation policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Daily,
    Hourly,
    /// Single file, never rotated
    Never,
}

impl From<LogRotation> for Rotation {
    fn from(rotation: LogRotation) -> Self {
        match rotation {
            LogRotation::Daily => Rotation::DAILY,
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Never => Rotation::NEVER,
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub log_dir: PathBuf,
    pub console_output: bool,
    pub console_level: Level,
    pub file_logging: bool,
    pub file_level: Level,
    pub rotation: LogRotation,
}

fn default_log_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(format!("{}/fileimport/logs", home))
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            console_output: true,
            console_level: Level::INFO,
            file_logging: true,
            file_level: Level::INFO,
            rotation: LogRotation::Daily,
        }
    }
}

impl LoggingConfig {
    /// Build from the `logging` section. An unparsable level falls back to INFO.
    pub fn from_settings(settings: &LoggingSettings) -> Self {
        let level = settings.level.parse().unwrap_or(Level::INFO);

        Self {
            log_dir: settings.dir.clone().unwrap_or_else(default_log_dir),
            console_output: settings.console,
            console_level: level,
            file_logging: settings.file,
            file_level: level,
            rotation: settings.rotation,
        }
    }
}

/// Keeps the non-blocking writers alive; dropping it flushes buffered output.
pub struct LoggingGuard {
    _file_guards: Vec<WorkerGuard>,
}

/// Initialize the global subscriber.
///
/// `RUST_LOG`, when set, controls the console and root file levels. Component
/// files capture every level from their targets.
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard, Box<dyn std::error::Error>> {
    if config.file_logging {
        std::fs::create_dir_all(&config.log_dir)?;
    }

    let mut guards: Vec<WorkerGuard> = Vec::new();
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    if config.console_output {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.console_level.to_string()));
        let console_layer = fmt::layer()
            .with_target(true)
            .with_thread_names(true)
            .with_filter(filter);
        layers.push(Box::new(console_layer));
    }

    if config.file_logging {
        let root_appender =
            RollingFileAppender::new(config.rotation.into(), &config.log_dir, ROOT_LOG_FILE);
        let (root_nb, root_guard) = tracing_appender::non_blocking(root_appender);
        guards.push(root_guard);

        let root_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.file_level.to_string()));
        let root_layer = fmt::layer()
            .with_writer(root_nb)
            .with_target(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .with_filter(root_filter);
        layers.push(Box::new(root_layer));

        for component in COMPONENT_LOGS {
            let appender = RollingFileAppender::new(
                config.rotation.into(),
                &config.log_dir,
                component.file_name,
            );
            let (nb, guard) = tracing_appender::non_blocking(appender);
            guards.push(guard);

            let mut targets = Targets::new();
            for target in component.targets {
                targets = targets.with_target(*target, LevelFilter::TRACE);
            }

            let layer = fmt::layer()
                .with_writer(nb)
                .with_target(true)
                .with_thread_names(true)
                .with_ansi(false)
                .with_filter(targets);
            layers.push(Box::new(layer));
        }
    }

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|e| format!("Failed to initialize logging: {}", e))?;

    if config.file_logging {
        tracing::info!(
            log_dir = %config.log_dir.display(),
            component_files = COMPONENT_LOGS.len(),
            "File logging initialized: {} (root) + {} component log files",
            ROOT_LOG_FILE,
            COMPONENT_LOGS.len()
        );
    }

    Ok(LoggingGuard {
        _file_guards: guards,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_settings() {
        let settings = LoggingSettings {
            dir: Some(PathBuf::from("/var/log/fileimport")),
            level: "debug".to_string(),
            console: false,
            file: true,
            rotation: LogRotation::Hourly,
        };
        let config = LoggingConfig::from_settings(&settings);
        assert_eq!(config.log_dir, PathBuf::from("/var/log/fileimport"));
        assert_eq!(config.console_level, Level::DEBUG);
        assert!(!config.console_output);
        assert_eq!(config.rotation, LogRotation::Hourly);
    }

    #[test]
    fn test_invalid_level_falls_back_to_info() {
        let settings = LoggingSettings {
            level: "chatty".to_string(),
            ..LoggingSettings::default()
        };
        assert_eq!(LoggingConfig::from_settings(&settings).file_level, Level::INFO);
    }

    #[test]
    fn test_component_files_are_unique() {
        let mut names: Vec<&str> = COMPONENT_LOGS.iter().map(|c| c.file_name).collect();
        names.push(ROOT_LOG_FILE);
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }
}
