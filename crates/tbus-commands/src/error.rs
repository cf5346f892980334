//! ---
//! tbus_section: "05-command-harness"
//! tbus_subsection: "module"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Discovery, publish, echo and request commands over a messaging node."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
use std::fmt;

use tbus_msgs::FactoryError;
use tbus_transport::TransportError;
use thiserror::Error;

/// A required command argument that was not supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingArgument {
    /// Topic of `topic-pub`.
    TopicName,
    /// Message type of `topic-pub`.
    MessageType,
    /// Payload of `topic-pub`.
    MessageData,
    /// Service of `service-req`.
    ServiceName,
    /// Request type of `service-req`.
    RequestType,
    /// Response type of `service-req`.
    ResponseType,
    /// Timeout of `service-req`.
    Timeout,
    /// Request payload of `service-req`.
    RequestData,
}

impl fmt::Display for MissingArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MissingArgument::TopicName => "Topic name",
            MissingArgument::MessageType => "Message type",
            MissingArgument::MessageData => "Message data",
            MissingArgument::ServiceName => "Service name",
            MissingArgument::RequestType => "Request type",
            MissingArgument::ResponseType => "Response type",
            MissingArgument::Timeout => "Timeout",
            MissingArgument::RequestData => "Request data",
        };
        f.write_str(label)
    }
}

/// Why a command stopped early. `Display` is the operator-facing line.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A required argument was absent.
    #[error("{0} is null")]
    Missing(MissingArgument),
    /// The topic argument was absent or empty.
    #[error("Invalid topic. Topic must not be empty.")]
    InvalidTopic,
    /// The service argument was absent or empty.
    #[error("Invalid service. Service must not be empty.")]
    InvalidService,
    /// The message to publish could not be built.
    #[error("Unable to create message of type[{msg_type}] with data[{data}].")]
    CreateMessage {
        /// Type as given by the caller.
        msg_type: String,
        /// Payload as given by the caller.
        data: String,
        /// Factory failure.
        #[source]
        source: FactoryError,
    },
    /// The request could not be built.
    #[error("Unable to create request of type[{req_type}] with data[{data}].")]
    CreateRequest {
        /// Type as given by the caller.
        req_type: String,
        /// Payload as given by the caller.
        data: String,
        /// Factory failure.
        #[source]
        source: FactoryError,
    },
    /// The response container could not be built.
    #[error("Unable to create response of type[{rep_type}].")]
    CreateResponse {
        /// Type as given by the caller.
        rep_type: String,
        /// Factory failure.
        #[source]
        source: FactoryError,
    },
    /// The node refused the advertisement.
    #[error("Unable to publish on topic[{topic}] with message type[{msg_type}].")]
    Advertise {
        /// Topic being advertised.
        topic: String,
        /// Type as given by the caller.
        msg_type: String,
        /// Transport failure.
        #[source]
        source: TransportError,
    },
    /// The publisher refused the message.
    #[error("Unable to send message on topic[{topic}].")]
    Publish {
        /// Topic being published.
        topic: String,
        /// Transport failure.
        #[source]
        source: TransportError,
    },
    /// The node refused the subscription.
    #[error("Unable to subscribe to topic[{topic}].")]
    Subscribe {
        /// Topic being subscribed.
        topic: String,
        /// Transport failure.
        #[source]
        source: TransportError,
    },
    /// No node could be created.
    #[error("Unable to connect to the messaging layer.")]
    Connect(#[source] TransportError),
}
