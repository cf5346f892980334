//! ---
//! tbus_section: "04-messaging-transport"
//! tbus_subsection: "module"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Messaging node interface and in-process publish/subscribe bus."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tbus_msgs::DynamicMessage;

use crate::TransportError;

/// A publisher of a topic as known to discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessagePublisher {
    /// Address of the node that advertised the topic.
    pub address: String,
    /// Message type name of the advertisement.
    pub msg_type: String,
}

/// A provider of a service as known to discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServicePublisher {
    /// Address of the node hosting the service.
    pub address: String,
    /// Request message type name.
    pub req_type: String,
    /// Response message type name.
    pub rep_type: String,
}

/// Result of a synchronous service call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A reply arrived and the provider reported success; the response is filled.
    Success,
    /// A reply arrived but the provider reported failure.
    Failure,
    /// No reply arrived before the deadline.
    TimedOut,
}

impl RequestOutcome {
    /// Map an `(executed, result)` flag pair onto the tri-state outcome.
    ///
    /// `executed == false` is always [`RequestOutcome::TimedOut`], whatever
    /// `result` says.
    pub fn from_flags(executed: bool, result: bool) -> Self {
        match (executed, result) {
            (false, _) => RequestOutcome::TimedOut,
            (true, true) => RequestOutcome::Success,
            (true, false) => RequestOutcome::Failure,
        }
    }
}

/// Callback invoked for every message received on a subscription.
pub type MessageCallback = Arc<dyn Fn(&DynamicMessage) + Send + Sync>;

/// Handle returned by [`Node::advertise`].
pub trait Publisher: Send {
    /// Advertised topic.
    fn topic(&self) -> &str;
    /// Advertised message type.
    fn msg_type(&self) -> &str;
    /// Send one message to every current subscriber.
    fn publish(&self, message: &DynamicMessage) -> Result<(), TransportError>;
}

/// One participant of the messaging layer.
///
/// Dropping the node withdraws every advertisement, subscription and service
/// it owns.
pub trait Node: Send {
    /// Address other participants see for this node.
    fn address(&self) -> &str;
    /// Names of topics with at least one known publisher.
    fn topic_list(&self) -> Vec<String>;
    /// Publishers currently known for `topic`.
    fn topic_info(&self, topic: &str) -> Vec<MessagePublisher>;
    /// Names of services with at least one known provider.
    fn service_list(&self) -> Vec<String>;
    /// Providers currently known for `service`.
    fn service_info(&self, service: &str) -> Vec<ServicePublisher>;
    /// Announce that this node publishes `msg_type` on `topic`.
    fn advertise(&self, topic: &str, msg_type: &str) -> Result<Box<dyn Publisher>, TransportError>;
    /// Receive every message published on `topic` through `callback`.
    fn subscribe(&self, topic: &str, callback: MessageCallback) -> Result<(), TransportError>;
    /// Call `service` and wait at most `timeout` for the reply, which is written
    /// into `response`.
    fn request(
        &self,
        service: &str,
        request: &DynamicMessage,
        timeout: Duration,
        response: &mut DynamicMessage,
    ) -> RequestOutcome;
}

/// Factory for nodes; each command invocation connects exactly once.
pub trait Connector: Send + Sync {
    /// Create a fresh node.
    fn connect(&self) -> Result<Box<dyn Node>, TransportError>;
}
