//! ---
//! tbus_section: "04-messaging-transport"
//! tbus_subsection: "module"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Messaging node interface and in-process publish/subscribe bus."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tbus_common::time::{monotonic_now, remaining_until};
use tbus_msgs::DynamicMessage;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::bus::InMemoryBus;
use crate::logging::{log_traffic, TrafficDirection};
use crate::naming::{validate_service, validate_topic};
use crate::{
    Connector, MessageCallback, MessagePublisher, Node, Publisher, RequestOutcome,
    ServicePublisher, TransportError,
};

/// Service implementation: fills the response and reports success.
pub type ServiceHandler = Arc<dyn Fn(&DynamicMessage, &mut DynamicMessage) -> bool + Send + Sync>;

/// A node attached to an [`InMemoryBus`].
pub struct InMemoryNode {
    bus: InMemoryBus,
    id: Uuid,
    address: String,
}

impl InMemoryNode {
    /// Attach a new node to `bus`.
    pub fn new(bus: InMemoryBus) -> Self {
        let id = Uuid::new_v4();
        Self {
            bus,
            id,
            address: format!("inproc://{}", id),
        }
    }

    /// The bus this node is attached to.
    pub fn bus(&self) -> &InMemoryBus {
        &self.bus
    }

    /// Provide `service` with the given request and response types.
    ///
    /// Callers are matched on all three names; type names are compared
    /// verbatim, so providers should register canonical names.
    pub fn advertise_service<F>(
        &self,
        service: &str,
        req_type: &str,
        rep_type: &str,
        handler: F,
    ) -> Result<(), TransportError>
    where
        F: Fn(&DynamicMessage, &mut DynamicMessage) -> bool + Send + Sync + 'static,
    {
        validate_service(service)?;
        self.bus.advertise_service(
            self.id,
            &self.address,
            service,
            req_type,
            rep_type,
            Arc::new(handler),
        )
    }
}

impl Node for InMemoryNode {
    fn address(&self) -> &str {
        &self.address
    }

    fn topic_list(&self) -> Vec<String> {
        self.bus.topic_list()
    }

    fn topic_info(&self, topic: &str) -> Vec<MessagePublisher> {
        self.bus.topic_info(topic)
    }

    fn service_list(&self) -> Vec<String> {
        self.bus.service_list()
    }

    fn service_info(&self, service: &str) -> Vec<ServicePublisher> {
        self.bus.service_info(service)
    }

    fn advertise(&self, topic: &str, msg_type: &str) -> Result<Box<dyn Publisher>, TransportError> {
        validate_topic(topic)?;
        self.bus.advertise(self.id, &self.address, topic, msg_type)?;
        Ok(Box::new(InMemoryPublisher {
            bus: self.bus.clone(),
            node: self.id,
            topic: topic.to_owned(),
            msg_type: msg_type.to_owned(),
        }))
    }

    fn subscribe(&self, topic: &str, callback: MessageCallback) -> Result<(), TransportError> {
        validate_topic(topic)?;
        self.bus.subscribe(self.id, topic, callback);
        Ok(())
    }

    fn request(
        &self,
        service: &str,
        request: &DynamicMessage,
        timeout: Duration,
        response: &mut DynamicMessage,
    ) -> RequestOutcome {
        let outcome = self.call(service, request, timeout, response);
        self.bus.record_outcome(outcome);
        outcome
    }
}

impl InMemoryNode {
    fn call(
        &self,
        service: &str,
        request: &DynamicMessage,
        timeout: Duration,
        response: &mut DynamicMessage,
    ) -> RequestOutcome {
        if let Err(err) = validate_service(service) {
            debug!(error = %err, "request rejected");
            return RequestOutcome::TimedOut;
        }
        let deadline = monotonic_now() + timeout;
        let Some(handler) =
            self.bus
                .wait_for_provider(service, request.type_name(), response.type_name(), deadline)
        else {
            debug!(service, "no provider before deadline");
            return RequestOutcome::TimedOut;
        };

        let bytes = request.encode();
        log_traffic(TrafficDirection::Request, service, request.type_name(), bytes.len());
        let request_descriptor = Arc::clone(request.descriptor());
        let mut reply = DynamicMessage::new(Arc::clone(response.descriptor()));
        let (sender, receiver) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("tbus-service".into())
            .spawn(move || {
                let executed = match DynamicMessage::decode(request_descriptor, &bytes) {
                    Ok(request) => handler(&request, &mut reply),
                    Err(err) => {
                        warn!(error = %err, "undecodable service request");
                        false
                    }
                };
                let _ = sender.send((executed, reply));
            });
        if let Err(err) = spawned {
            warn!(service, error = %err, "unable to start service handler");
            return RequestOutcome::TimedOut;
        }

        match receiver.recv_timeout(remaining_until(deadline)) {
            Ok((result, reply)) => {
                log_traffic(TrafficDirection::Reply, service, reply.type_name(), 0);
                if result {
                    *response = reply;
                }
                RequestOutcome::from_flags(true, result)
            }
            Err(_) => RequestOutcome::TimedOut,
        }
    }
}

impl Drop for InMemoryNode {
    fn drop(&mut self) {
        self.bus.remove_node(self.id);
    }
}

/// Publisher handle returned by [`InMemoryNode::advertise`](Node::advertise).
pub struct InMemoryPublisher {
    bus: InMemoryBus,
    node: Uuid,
    topic: String,
    msg_type: String,
}

impl Publisher for InMemoryPublisher {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn msg_type(&self) -> &str {
        &self.msg_type
    }

    fn publish(&self, message: &DynamicMessage) -> Result<(), TransportError> {
        if message.type_name() != self.msg_type {
            return Err(TransportError::TypeMismatch {
                topic: self.topic.clone(),
                expected: self.msg_type.clone(),
                found: message.type_name().to_owned(),
            });
        }
        if !self.bus.is_advertised(self.node, &self.topic, &self.msg_type) {
            return Err(TransportError::NotAdvertised(self.topic.clone()));
        }
        self.bus.publish(&self.topic, message)
    }
}

/// [`Connector`] producing [`InMemoryNode`]s on one bus.
#[derive(Clone)]
pub struct InProcConnector {
    bus: InMemoryBus,
}

impl InProcConnector {
    /// Connector for `bus`.
    pub fn new(bus: InMemoryBus) -> Self {
        Self { bus }
    }

    /// Connector for the process-wide bus.
    pub fn shared() -> Self {
        Self::new(InMemoryBus::shared())
    }
}

impl Connector for InProcConnector {
    fn connect(&self) -> Result<Box<dyn Node>, TransportError> {
        Ok(Box::new(self.bus.node()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tbus_msgs::builtin::names;
    use tbus_msgs::MessageFactory;

    fn message(type_name: &str, payload: &str) -> DynamicMessage {
        MessageFactory::builtin()
            .new_message(type_name, Some(payload))
            .expect("message")
    }

    #[test]
    fn address_is_unique_and_inproc() {
        let bus = InMemoryBus::new();
        let a = bus.node();
        let b = bus.node();
        assert!(a.address().starts_with("inproc://"));
        assert_ne!(a.address(), b.address());
    }

    #[test]
    fn same_node_cannot_change_topic_type() {
        let node = InMemoryBus::new().node();
        node.advertise("/t", names::INT32).expect("first");
        node.advertise("/t", names::INT32).expect("same type again");
        let err = node.advertise("/t", names::STRING_MSG).err().expect("conflict");
        assert!(matches!(err, TransportError::TypeConflict { .. }));
    }

    #[test]
    fn invalid_names_are_rejected() {
        let node = InMemoryBus::new().node();
        assert!(matches!(
            node.advertise("bad topic", names::INT32).err(),
            Some(TransportError::InvalidTopic(_))
        ));
        assert!(matches!(
            node.subscribe("", Arc::new(|_: &DynamicMessage| {})),
            Err(TransportError::InvalidTopic(_))
        ));
        assert!(node
            .advertise_service("/a//b", names::INT32, names::INT32, |_, _| true)
            .is_err());
    }

    #[test]
    fn publisher_checks_message_type() {
        let node = InMemoryBus::new().node();
        let publisher = node.advertise("/t", names::INT32).expect("advertise");
        let err = publisher
            .publish(&message(names::STRING_MSG, "data: 'x'"))
            .expect_err("wrong type");
        assert!(matches!(err, TransportError::TypeMismatch { .. }));
    }

    #[test]
    fn publisher_outliving_node_is_rejected() {
        let node = InMemoryBus::new().node();
        let publisher = node.advertise("/t", names::INT32).expect("advertise");
        drop(node);
        let err = publisher
            .publish(&message(names::INT32, "data: 1"))
            .expect_err("node gone");
        assert!(matches!(err, TransportError::NotAdvertised(_)));
    }

    #[test]
    fn request_round_trip_fills_response() {
        let bus = InMemoryBus::new();
        let server = bus.node();
        server
            .advertise_service("/double", names::INT32, names::INT32, |req, rep| {
                let value = req.get("data").and_then(|v| v.as_i64()).unwrap_or(0);
                rep.set("data", value * 2).is_ok()
            })
            .expect("service");
        let client = bus.node();
        let mut response = message(names::INT32, "");
        let outcome = client.request(
            "/double",
            &message(names::INT32, "data: 21"),
            Duration::from_secs(1),
            &mut response,
        );
        assert_eq!(outcome, RequestOutcome::Success);
        assert_eq!(response.debug_string(), "data: 42\n");
        assert_eq!(bus.metrics().replied, 1);
    }

    #[test]
    fn failing_handler_reports_failure() {
        let bus = InMemoryBus::new();
        let server = bus.node();
        server
            .advertise_service("/nope", names::EMPTY, names::EMPTY, |_, _| false)
            .expect("service");
        let mut response = message(names::EMPTY, "");
        let outcome = bus.node().request(
            "/nope",
            &message(names::EMPTY, ""),
            Duration::from_secs(1),
            &mut response,
        );
        assert_eq!(outcome, RequestOutcome::Failure);
    }

    #[test]
    fn mismatched_types_time_out() {
        let bus = InMemoryBus::new();
        let server = bus.node();
        server
            .advertise_service("/svc", names::INT32, names::INT32, |_, _| true)
            .expect("service");
        let mut response = message(names::STRING_MSG, "");
        let started = Instant::now();
        let outcome = bus.node().request(
            "/svc",
            &message(names::INT32, "data: 1"),
            Duration::from_millis(50),
            &mut response,
        );
        assert_eq!(outcome, RequestOutcome::TimedOut);
        assert!(started.elapsed() >= Duration::from_millis(45));
        assert!(response.is_empty());
    }

    #[test]
    fn invalid_service_name_times_out_immediately() {
        let node = InMemoryBus::new().node();
        let mut response = message(names::EMPTY, "");
        let started = Instant::now();
        let outcome = node.request(
            "",
            &message(names::EMPTY, ""),
            Duration::from_secs(5),
            &mut response,
        );
        assert_eq!(outcome, RequestOutcome::TimedOut);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn connector_nodes_share_the_bus() {
        let bus = InMemoryBus::new();
        let connector = bus.connector();
        let first = connector.connect().expect("connect");
        let _publisher = first.advertise("/shared", names::EMPTY).expect("advertise");
        let second = connector.connect().expect("connect");
        assert_eq!(second.topic_list(), ["/shared"]);
        assert_eq!(second.topic_info("/shared")[0].address, first.address());
    }
}
