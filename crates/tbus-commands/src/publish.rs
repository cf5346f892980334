//! ---
//! tbus_section: "05-command-harness"
//! tbus_subsection: "module"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Discovery, publish, echo and request commands over a messaging node."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
use tbus_logging::{bus_debug, LogContext};

use crate::error::MissingArgument;
use crate::harness::non_empty;
use crate::{CommandError, Harness};

impl Harness {
    /// Publish one message built from `msg_type` and the text-format `data`.
    ///
    /// The topic is advertised under the message's canonical type name, then
    /// the configured grace period elapses before the single publish so that
    /// subscribers can discover the new publisher. There is no feedback that
    /// any subscriber actually connected.
    pub fn topic_pub(&self, topic: Option<&str>, msg_type: Option<&str>, data: Option<&str>) {
        let mut ctx = LogContext::for_command("topic-pub");
        if let Some(topic) = topic {
            ctx = ctx.with_topic(topic);
        }
        let result = self.try_topic_pub(&ctx, topic, msg_type, data);
        self.report(&ctx, "topic.publish", result);
    }

    fn try_topic_pub(
        &self,
        ctx: &LogContext<'_>,
        topic: Option<&str>,
        msg_type: Option<&str>,
        data: Option<&str>,
    ) -> Result<(), CommandError> {
        let topic = topic.ok_or(CommandError::Missing(MissingArgument::TopicName))?;
        let msg_type = msg_type.ok_or(CommandError::Missing(MissingArgument::MessageType))?;
        let data = data.ok_or(CommandError::Missing(MissingArgument::MessageData))?;
        let topic = non_empty(Some(topic)).ok_or(CommandError::InvalidTopic)?;

        let message = self
            .factory
            .new_message(msg_type, Some(data))
            .map_err(|source| CommandError::CreateMessage {
                msg_type: msg_type.to_owned(),
                data: data.to_owned(),
                source,
            })?;

        let node = self.connect()?;
        let publisher = node
            .advertise(topic, message.type_name())
            .map_err(|source| CommandError::Advertise {
                topic: topic.to_owned(),
                msg_type: msg_type.to_owned(),
                source,
            })?;
        bus_debug!(
            context = ctx.clone().with_msg_type(message.type_name()),
            "advertised, waiting {:?} before publishing",
            self.settings.publish_grace
        );

        self.sleeper.sleep(self.settings.publish_grace);
        publisher
            .publish(&message)
            .map_err(|source| CommandError::Publish {
                topic: topic.to_owned(),
                source,
            })
    }
}
