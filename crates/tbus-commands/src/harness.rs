//! ---
//! tbus_section: "05-command-harness"
//! tbus_subsection: "module"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Discovery, publish, echo and request commands over a messaging node."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
use std::sync::Arc;
use std::time::Duration;

use tbus_common::PublishConfig;
use tbus_logging::{log_command_event, CommandOutcome, LogContext};
use tbus_msgs::MessageFactory;
use tbus_transport::{Connector, Node};

use crate::{CommandError, Console, Sleeper, ThreadSleeper};

/// Tunables applied to every command run by a [`Harness`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessSettings {
    /// Pause between advertising a topic and publishing on it, giving
    /// subscribers time to discover the new publisher.
    pub publish_grace: Duration,
}

impl HarnessSettings {
    /// Grace period used when none is configured.
    pub const DEFAULT_PUBLISH_GRACE: Duration = Duration::from_millis(800);
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            publish_grace: Self::DEFAULT_PUBLISH_GRACE,
        }
    }
}

impl From<&PublishConfig> for HarnessSettings {
    fn from(config: &PublishConfig) -> Self {
        Self {
            publish_grace: config.grace_period,
        }
    }
}

/// Runs discovery, publish, echo and request commands.
///
/// The harness owns no messaging state between invocations: every command
/// connects a fresh node through the [`Connector`] and drops it on return.
#[derive(Clone)]
pub struct Harness {
    pub(crate) connector: Arc<dyn Connector>,
    pub(crate) factory: Arc<MessageFactory>,
    pub(crate) sleeper: Arc<dyn Sleeper>,
    pub(crate) console: Console,
    pub(crate) settings: HarnessSettings,
}

impl Harness {
    /// Harness writing to stdio with a real sleeper and default settings.
    pub fn new(connector: Arc<dyn Connector>, factory: Arc<MessageFactory>) -> Self {
        Self {
            connector,
            factory,
            sleeper: Arc::new(ThreadSleeper),
            console: Console::stdio(),
            settings: HarnessSettings::default(),
        }
    }

    /// Replace the sleeper.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Replace the console.
    pub fn with_console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    /// Replace the settings.
    pub fn with_settings(mut self, settings: HarnessSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Where command output goes.
    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn settings(&self) -> &HarnessSettings {
        &self.settings
    }

    pub(crate) fn connect(&self) -> Result<Box<dyn Node>, CommandError> {
        self.connector.connect().map_err(CommandError::Connect)
    }

    /// Render a command result: failures become one stderr line.
    pub(crate) fn report(&self, ctx: &LogContext<'_>, event: &str, result: Result<(), CommandError>) {
        match result {
            Ok(()) => log_command_event(Some(ctx), event, "completed", CommandOutcome::Success),
            Err(err) => {
                let cause = std::error::Error::source(&err)
                    .map(|source| source.to_string())
                    .unwrap_or_default();
                log_command_event(Some(ctx), event, &cause, CommandOutcome::Fault);
                self.console.err_line(&err.to_string());
            }
        }
    }
}

/// A name argument that is present and non-empty.
pub(crate) fn non_empty(name: Option<&str>) -> Option<&str> {
    name.filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_grace_is_800ms() {
        assert_eq!(
            HarnessSettings::default().publish_grace,
            Duration::from_millis(800)
        );
        let config = PublishConfig {
            grace_period: Duration::from_millis(5),
        };
        assert_eq!(
            HarnessSettings::from(&config).publish_grace,
            Duration::from_millis(5)
        );
    }

    #[test]
    fn non_empty_filters_blank_names() {
        assert_eq!(non_empty(Some("/a")), Some("/a"));
        assert_eq!(non_empty(Some("")), None);
        assert_eq!(non_empty(None), None);
    }
}
