//! ---
//! tbus_section: "06-command-line-interface"
//! tbus_subsection: "binary"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Topic sub-commands."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
use clap::{Args, Subcommand};
use tbus_commands::{runs_indefinitely, Harness};
use tbus_common::{install_signal_handler, ShutdownToken};
use tracing::warn;

#[derive(Debug, Subcommand)]
pub enum TopicCommand {
    /// List every known topic.
    List,
    /// Show the publishers of a topic.
    Info(InfoArgs),
    /// Publish one message on a topic.
    Pub(PubArgs),
    /// Print messages received on a topic.
    Echo(EchoArgs),
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Topic name.
    #[arg(short, long, value_name = "TOPIC")]
    topic: Option<String>,
}

#[derive(Debug, Args)]
pub struct PubArgs {
    /// Topic name.
    #[arg(short, long, value_name = "TOPIC")]
    topic: Option<String>,
    /// Message type, e.g. tbus_msgs.StringMsg.
    #[arg(short = 'm', long = "msgtype", value_name = "TYPE")]
    msg_type: Option<String>,
    /// Message content in text format, e.g. 'data: "Hello"'.
    #[arg(short = 'p', long = "msg", value_name = "DATA", allow_hyphen_values = true)]
    data: Option<String>,
}

#[derive(Debug, Args)]
pub struct EchoArgs {
    /// Topic name.
    #[arg(short, long, value_name = "TOPIC")]
    topic: Option<String>,
    /// Seconds to listen for; negative listens until interrupted.
    #[arg(
        short,
        long,
        value_name = "SECONDS",
        default_value_t = -1.0,
        allow_negative_numbers = true
    )]
    duration: f64,
}

/// Execute the supplied topic command.
pub fn run(command: TopicCommand, harness: &Harness) {
    match command {
        TopicCommand::List => harness.topic_list(),
        TopicCommand::Info(args) => harness.topic_info(args.topic.as_deref()),
        TopicCommand::Pub(args) => harness.topic_pub(
            args.topic.as_deref(),
            args.msg_type.as_deref(),
            args.data.as_deref(),
        ),
        TopicCommand::Echo(args) => {
            let root = ShutdownToken::process();
            if runs_indefinitely(args.duration) {
                if let Err(err) = install_signal_handler(root.clone()) {
                    warn!(error = %err, "unable to install signal handler");
                }
            }
            harness.topic_echo(args.topic.as_deref(), args.duration, &root.child_token());
        }
    }
}
