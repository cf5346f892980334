//! ---
//! tbus_section: "03-logging"
//! tbus_subsection: "module"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Structured logging context and command event helpers."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
#![warn(missing_docs)]

//! Structured logging helpers shared by the tbus crates.
//!
//! Every command invocation carries a [`LogContext`] naming the command and
//! the topic/service it operates on, so that diagnostics written through the
//! `bus_*!` macros can be correlated without parsing free-form messages.

#[macro_use]
pub mod macros;

/// Structured logging context propagated by the convenience macros.
#[derive(Debug, Default, Clone)]
pub struct LogContext<'a> {
    /// Command being executed (`topic-pub`, `service-req`, ...).
    pub command: Option<&'a str>,
    /// Topic the command operates on.
    pub topic: Option<&'a str>,
    /// Service the command operates on.
    pub service: Option<&'a str>,
    /// Message type involved in the operation.
    pub msg_type: Option<&'a str>,
}

impl<'a> LogContext<'a> {
    /// Create an empty logging context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for the named command.
    pub fn for_command(command: &'a str) -> Self {
        Self::new().with_command(command)
    }

    /// Attach a command name.
    pub fn with_command(mut self, command: &'a str) -> Self {
        self.command = Some(command);
        self
    }

    /// Attach a topic name.
    pub fn with_topic(mut self, topic: &'a str) -> Self {
        self.topic = Some(topic);
        self
    }

    /// Attach a service name.
    pub fn with_service(mut self, service: &'a str) -> Self {
        self.service = Some(service);
        self
    }

    /// Attach a message type name.
    pub fn with_msg_type(mut self, msg_type: &'a str) -> Self {
        self.msg_type = Some(msg_type);
        self
    }
}

/// High-level outcome used when emitting command log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The command ran to completion.
    Success,
    /// The command was aborted by a precondition or collaborator failure.
    Fault,
}

impl CommandOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            CommandOutcome::Success => "success",
            CommandOutcome::Fault => "fault",
        }
    }
}

/// Emit a standardized command event with a success/fault outcome.
///
/// Successes are logged at `DEBUG` and faults at `INFO`: the operator already
/// sees the fault as a diagnostic line, so it must not be echoed again at the
/// default `warn` filter.
pub fn log_command_event(
    context: Option<&LogContext>,
    event: &str,
    message: &str,
    outcome: CommandOutcome,
) {
    let ctx = context.cloned().unwrap_or_default();
    match outcome {
        CommandOutcome::Success => tracing::debug!(
            event,
            outcome = outcome.as_str(),
            command = ctx.command.unwrap_or(""),
            topic = ctx.topic.unwrap_or(""),
            service = ctx.service.unwrap_or(""),
            msg_type = ctx.msg_type.unwrap_or(""),
            message = %message
        ),
        CommandOutcome::Fault => tracing::info!(
            event,
            outcome = outcome.as_str(),
            command = ctx.command.unwrap_or(""),
            topic = ctx.topic.unwrap_or(""),
            service = ctx.service.unwrap_or(""),
            msg_type = ctx.msg_type.unwrap_or(""),
            message = %message
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .try_init();
    }

    #[test]
    fn macros_emit_without_panic() {
        init();
        let ctx = LogContext::for_command("topic-echo").with_topic("/chatter");
        bus_info!(context = ctx.clone(), "subscribed");
        bus_debug!("debug message");
        bus_warn!(context = ctx.clone(), "slow consumer: {}", 3);
        bus_error!(context = ctx, "error code: {}", 42);
    }

    #[test]
    fn builders_populate_fields() {
        let ctx = LogContext::for_command("service-req")
            .with_service("/echo")
            .with_msg_type("tbus.msgs.StringMsg");
        assert_eq!(ctx.command, Some("service-req"));
        assert_eq!(ctx.service, Some("/echo"));
        assert_eq!(ctx.msg_type, Some("tbus.msgs.StringMsg"));
        assert!(ctx.topic.is_none());
    }

    #[test]
    fn command_event_helper_emits() {
        init();
        let ctx = LogContext::for_command("topic-pub").with_topic("/foo");
        log_command_event(
            Some(&ctx),
            "topic.publish",
            "message published",
            CommandOutcome::Success,
        );
        log_command_event(
            None,
            "topic.publish",
            "advertise rejected",
            CommandOutcome::Fault,
        );
    }
}
