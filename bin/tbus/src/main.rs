//! ---
//! tbus_section: "06-command-line-interface"
//! tbus_subsection: "binary"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Command-line front end over the command harness."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tbus_commands::{Harness, HarnessSettings};
use tbus_common::version::{version_string, VersionInfo};
use tbus_common::{init_tracing, CliConfig};
use tbus_logging::bus_debug;
use tbus_msgs::MessageFactory;
use tbus_transport::InProcConnector;

mod service;
mod topic;

const IN_PROCESS_NOTE: &str = "The bundled backend is an in-process bus. Each tbus invocation \
has its own registry, so separate invocations never see each other's topics or services: \
`topic echo` receives nothing published elsewhere and `service req` times out.";

#[derive(Debug, Parser)]
#[command(
    name = "tbus",
    author,
    disable_version_flag = true,
    arg_required_else_help = true,
    about = "Inspect and drive topics and services on the message bus (in-process backend)",
    long_about = None,
    after_help = IN_PROCESS_NOTE
)]
struct Cli {
    #[arg(
        short = 'V',
        long = "version",
        action = ArgAction::SetTrue,
        help = "Print extended version information and exit"
    )]
    version: bool,
    /// Configuration file (defaults to TBUS_CONFIG, ./tbus.toml, ~/.config/tbus/tbus.toml).
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(subcommand, about = "Topic discovery, publish and echo")]
    Topic(topic::TopicCommand),
    #[command(subcommand, about = "Service discovery and requests")]
    Service(service::ServiceCommand),
    /// Print the tool version.
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.version {
        println!("{}", VersionInfo::current().extended());
        return Ok(());
    }
    let Some(command) = cli.command else {
        return Ok(());
    };
    if let Commands::Version = command {
        println!("{}", version_string());
        return Ok(());
    }

    let loaded = CliConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    let _guard = init_tracing("tbus", &loaded.config.logging)?;
    if let Some(source) = &loaded.source {
        bus_debug!("using configuration {}", source.display());
    }

    let harness = Harness::new(
        Arc::new(InProcConnector::shared()),
        Arc::new(MessageFactory::with_builtin_types()),
    )
    .with_settings(HarnessSettings::from(&loaded.config.publish));

    match command {
        Commands::Topic(cmd) => topic::run(cmd, &harness),
        Commands::Service(cmd) => service::run(cmd, &harness),
        Commands::Version => {}
    }
    Ok(())
}
