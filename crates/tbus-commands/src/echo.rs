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

use tbus_common::time::truncated_millis_from_secs;
use tbus_common::ShutdownToken;
use tbus_logging::{bus_debug, bus_warn, LogContext};
use tbus_msgs::DynamicMessage;

use crate::harness::non_empty;
use crate::{CommandError, Harness};

/// Whether an echo `duration` (seconds) means "until shutdown".
///
/// Negative values and NaN run indefinitely.
pub fn runs_indefinitely(duration: f64) -> bool {
    truncated_millis_from_secs(duration).is_none()
}

impl Harness {
    /// Print every message received on `topic`.
    ///
    /// With `duration >= 0` the command returns after `duration` seconds,
    /// truncated to whole milliseconds; otherwise it blocks until `shutdown`
    /// is cancelled. The subscription ends when the command returns.
    pub fn topic_echo(&self, topic: Option<&str>, duration: f64, shutdown: &ShutdownToken) {
        let mut ctx = LogContext::for_command("topic-echo");
        if let Some(topic) = topic {
            ctx = ctx.with_topic(topic);
        }
        let result = self.try_topic_echo(&ctx, topic, duration, shutdown);
        self.report(&ctx, "topic.echo", result);
    }

    fn try_topic_echo(
        &self,
        ctx: &LogContext<'_>,
        topic: Option<&str>,
        duration: f64,
        shutdown: &ShutdownToken,
    ) -> Result<(), CommandError> {
        let topic = non_empty(topic).ok_or(CommandError::InvalidTopic)?;
        let node = self.connect()?;

        let console = self.console.clone();
        let callback = Arc::new(move |message: &DynamicMessage| {
            console.out_line(&message.debug_string());
        });
        node.subscribe(topic, callback)
            .map_err(|source| CommandError::Subscribe {
                topic: topic.to_owned(),
                source,
            })?;

        match truncated_millis_from_secs(duration) {
            Some(bound) => {
                bus_debug!(context = ctx.clone(), "echoing for {:?}", bound);
                self.sleeper.sleep(bound);
            }
            None => {
                bus_debug!(context = ctx.clone(), "echoing until shutdown");
                if let Err(err) = shutdown.wait() {
                    bus_warn!(context = ctx.clone(), "unable to wait for shutdown: {}", err);
                }
            }
        }
        drop(node);
        Ok(())
    }
}
