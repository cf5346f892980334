//! ---
//! tbus_section: "04-messaging-transport"
//! tbus_subsection: "module"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Messaging node interface and in-process publish/subscribe bus."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
use thiserror::Error;

/// Failures reported by a messaging node.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The topic name is not acceptable to the transport.
    #[error("invalid topic name [{0}]")]
    InvalidTopic(String),
    /// The service name is not acceptable to the transport.
    #[error("invalid service name [{0}]")]
    InvalidService(String),
    /// The node already advertises the topic with another message type.
    #[error("topic [{topic}] is already advertised with type [{advertised}], not [{requested}]")]
    TypeConflict {
        /// Topic being advertised.
        topic: String,
        /// Type of the existing advertisement.
        advertised: String,
        /// Type of the rejected advertisement.
        requested: String,
    },
    /// A publisher was handed a message of the wrong type.
    #[error("publisher on [{topic}] expects [{expected}], got [{found}]")]
    TypeMismatch {
        /// Topic of the publisher.
        topic: String,
        /// Advertised type.
        expected: String,
        /// Type of the offered message.
        found: String,
    },
    /// The publisher's node has been dropped.
    #[error("publisher on [{0}] is no longer advertised")]
    NotAdvertised(String),
    /// The node already provides this service.
    #[error("service [{0}] is already advertised by this node")]
    DuplicateService(String),
    /// The delivery worker has stopped.
    #[error("bus delivery worker has stopped")]
    Disconnected,
    /// A background worker could not be started.
    #[error("transport worker failed: {0}")]
    Io(#[from] std::io::Error),
}
