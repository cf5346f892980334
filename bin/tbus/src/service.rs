//! ---
//! tbus_section: "06-command-line-interface"
//! tbus_subsection: "binary"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Service sub-commands."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
use clap::{Args, Subcommand};
use tbus_commands::Harness;

#[derive(Debug, Subcommand)]
pub enum ServiceCommand {
    /// List every known service.
    List,
    /// Show the providers of a service.
    Info(InfoArgs),
    /// Call a service once and print the response.
    Req(ReqArgs),
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Service name.
    #[arg(short, long, value_name = "SERVICE")]
    service: Option<String>,
}

#[derive(Debug, Args)]
pub struct ReqArgs {
    /// Service name.
    #[arg(short, long, value_name = "SERVICE")]
    service: Option<String>,
    /// Request message type.
    #[arg(long = "reqtype", value_name = "TYPE")]
    req_type: Option<String>,
    /// Response message type.
    #[arg(long = "reptype", value_name = "TYPE")]
    rep_type: Option<String>,
    /// Milliseconds to wait for the response.
    #[arg(long, value_name = "MS")]
    timeout: Option<u64>,
    /// Request content in text format.
    #[arg(short = 'r', long = "req", value_name = "DATA", allow_hyphen_values = true)]
    data: Option<String>,
}

/// Execute the supplied service command.
pub fn run(command: ServiceCommand, harness: &Harness) {
    match command {
        ServiceCommand::List => harness.service_list(),
        ServiceCommand::Info(args) => harness.service_info(args.service.as_deref()),
        ServiceCommand::Req(args) => harness.service_req(
            args.service.as_deref(),
            args.req_type.as_deref(),
            args.rep_type.as_deref(),
            args.timeout,
            args.data.as_deref(),
        ),
    }
}
