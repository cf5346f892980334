//! ---
//! tbus_section: "01-core-functionality"
//! tbus_subsection: "module"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Shared primitives and utilities for the command runtime."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::daily;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;

const LOG_ENV: &str = "TBUS_LOG";
const RUST_LOG_ENV: &str = "RUST_LOG";

/// Available log formats for the command-line tools.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    #[default]
    Pretty,
    StructuredJson,
}

/// Keeps the background log file writer alive; drop it last in `main`.
#[must_use = "dropping the guard stops the log file writer"]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// Initialize the tracing subscriber based on configuration and environment variables.
///
/// * `TBUS_LOG` overrides the log filter (e.g. `info`, `debug,tbus_transport=trace`).
///   When unset `RUST_LOG` is honoured, finally falling back to `logging.directive`.
/// * Events are written to stderr; stdout carries command output only.
/// * When `logging.directory` is configured a daily rolling JSON file is written too.
pub fn init_tracing(service_name: &str, config: &LoggingConfig) -> Result<LoggingGuard> {
    let directive = select_directive(
        std::env::var(LOG_ENV).ok(),
        std::env::var(RUST_LOG_ENV).ok(),
        &config.directive,
    );
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|err| {
        eprintln!(
            "invalid log directive {:?} ({}); defaulting to warn logging",
            directive, err
        );
        EnvFilter::new("warn")
    });

    let fmt_layer = match config.format {
        LogFormat::StructuredJson => fmt::layer()
            .with_target(false)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .json()
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_writer(std::io::stderr)
            .boxed(),
    };

    let (file_layer, file_guard) = match &config.directory {
        Some(directory) => {
            std::fs::create_dir_all(directory)?;
            let prefix = config
                .file_prefix
                .clone()
                .unwrap_or_else(|| service_name.to_owned());
            let appender = daily(directory, format!("{}-{}.log", prefix, service_name));
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_target(true)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .json()
                .with_writer(writer)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(file_layer)
        .try_init()
        .ok();

    debug!(service = %service_name, directive = %directive, format = ?config.format, "tracing initialised");
    Ok(LoggingGuard { _file: file_guard })
}

/// Pick the filter directive: `TBUS_LOG`, then `RUST_LOG`, then the configured fallback.
/// Blank values are ignored.
pub fn select_directive(
    tbus_log: Option<String>,
    rust_log: Option<String>,
    fallback: &str,
) -> String {
    [tbus_log, rust_log]
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| fallback.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tbus_log_takes_precedence() {
        let directive = select_directive(Some("trace".into()), Some("info".into()), "warn");
        assert_eq!(directive, "trace");
    }

    #[test]
    fn rust_log_used_when_tbus_log_blank() {
        let directive = select_directive(Some("  ".into()), Some("info".into()), "warn");
        assert_eq!(directive, "info");
    }

    #[test]
    fn falls_back_to_configured_directive() {
        assert_eq!(select_directive(None, None, "error"), "error");
    }

    #[test]
    fn init_with_log_directory_creates_it() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = LoggingConfig {
            directory: Some(dir.path().join("logs")),
            ..LoggingConfig::default()
        };
        let _guard = init_tracing("tbus-test", &config).expect("init tracing");
        assert!(dir.path().join("logs").is_dir());
    }
}
