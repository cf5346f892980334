//! ---
//! tbus_section: "01-core-functionality"
//! tbus_subsection: "module"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Shared primitives and utilities for the command runtime."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
//! Core shared primitives for the tbus workspace.
//! This crate exposes configuration loading, tracing initialisation, the
//! shutdown token used by blocking commands, and version metadata.

pub mod config;
pub mod logging;
pub mod shutdown;
pub mod time;
pub mod version;

pub use config::{CliConfig, LoadedCliConfig, LoggingConfig, PublishConfig};
pub use logging::{init_tracing, LogFormat};
pub use shutdown::{install_signal_handler, ShutdownToken};
pub use version::{version_string, VersionInfo};
