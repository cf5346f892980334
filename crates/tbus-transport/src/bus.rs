//! ---
//! tbus_section: "04-messaging-transport"
//! tbus_subsection: "module"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Messaging node interface and in-process publish/subscribe bus."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
//! In-process discovery registry and message delivery.
//!
//! The registry is shared by every node connected to the bus and guarded by a
//! single mutex; a condvar is notified whenever advertisements change so that
//! requests can wait for a provider to appear. Published messages travel as
//! encoded bytes to one delivery thread, which decodes them and invokes the
//! subscription callbacks in publish order.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use parking_lot::{Condvar, Mutex};
use tbus_msgs::{DynamicMessage, MessageDescriptor};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::inproc::{InMemoryNode, InProcConnector, ServiceHandler};
use crate::logging::{log_traffic, TrafficDirection};
use crate::{MessageCallback, MessagePublisher, RequestOutcome, ServicePublisher, TransportError};

static SHARED: Lazy<InMemoryBus> = Lazy::new(InMemoryBus::new);

/// Snapshot of bus activity counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BusMetrics {
    /// Messages accepted by publishers.
    pub published: u64,
    /// Callback invocations completed.
    pub delivered: u64,
    /// Deliveries abandoned because decoding failed or the callback panicked.
    pub dropped: u64,
    /// Service calls that received a reply.
    pub replied: u64,
    /// Service calls that ended without a reply.
    pub timed_out: u64,
}

#[derive(Default)]
struct Counters {
    published: AtomicU64,
    delivered: AtomicU64,
    dropped: AtomicU64,
    replied: AtomicU64,
    timed_out: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> BusMetrics {
        BusMetrics {
            published: self.published.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            replied: self.replied.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
        }
    }
}

struct TopicEntry {
    node: Uuid,
    address: String,
    msg_type: String,
}

struct Subscription {
    node: Uuid,
    topic: String,
    callback: MessageCallback,
    active: Arc<AtomicBool>,
}

struct ServiceEntry {
    node: Uuid,
    address: String,
    req_type: String,
    rep_type: String,
    handler: ServiceHandler,
}

#[derive(Default)]
struct Registry {
    topics: IndexMap<String, Vec<TopicEntry>>,
    subscriptions: Vec<Subscription>,
    services: IndexMap<String, Vec<ServiceEntry>>,
}

impl Registry {
    fn provider(&self, service: &str, req_type: &str, rep_type: &str) -> Option<ServiceHandler> {
        self.services.get(service).and_then(|entries| {
            entries
                .iter()
                .find(|entry| entry.req_type == req_type && entry.rep_type == rep_type)
                .map(|entry| Arc::clone(&entry.handler))
        })
    }
}

struct Target {
    callback: MessageCallback,
    active: Arc<AtomicBool>,
}

struct Delivery {
    topic: String,
    descriptor: Arc<MessageDescriptor>,
    bytes: Vec<u8>,
    targets: Vec<Target>,
}

struct BusInner {
    registry: Mutex<Registry>,
    changed: Condvar,
    dispatcher: Mutex<Option<Sender<Delivery>>>,
    counters: Arc<Counters>,
}

/// An in-process messaging bus. Clones share the same registry.
#[derive(Clone)]
pub struct InMemoryBus {
    inner: Arc<BusInner>,
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBus {
    /// Create an isolated bus.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                registry: Mutex::new(Registry::default()),
                changed: Condvar::new(),
                dispatcher: Mutex::new(None),
                counters: Arc::new(Counters::default()),
            }),
        }
    }

    /// The process-wide bus used by the command-line tool.
    pub fn shared() -> Self {
        SHARED.clone()
    }

    /// Connect a new node to this bus.
    pub fn node(&self) -> InMemoryNode {
        InMemoryNode::new(self.clone())
    }

    /// A connector producing nodes on this bus.
    pub fn connector(&self) -> InProcConnector {
        InProcConnector::new(self.clone())
    }

    /// Current activity counters.
    pub fn metrics(&self) -> BusMetrics {
        self.inner.counters.snapshot()
    }

    pub(crate) fn topic_list(&self) -> Vec<String> {
        self.inner.registry.lock().topics.keys().cloned().collect()
    }

    pub(crate) fn topic_info(&self, topic: &str) -> Vec<MessagePublisher> {
        let registry = self.inner.registry.lock();
        registry
            .topics
            .get(topic)
            .map(|entries| {
                entries
                    .iter()
                    .map(|entry| MessagePublisher {
                        address: entry.address.clone(),
                        msg_type: entry.msg_type.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn service_list(&self) -> Vec<String> {
        self.inner.registry.lock().services.keys().cloned().collect()
    }

    pub(crate) fn service_info(&self, service: &str) -> Vec<ServicePublisher> {
        let registry = self.inner.registry.lock();
        registry
            .services
            .get(service)
            .map(|entries| {
                entries
                    .iter()
                    .map(|entry| ServicePublisher {
                        address: entry.address.clone(),
                        req_type: entry.req_type.clone(),
                        rep_type: entry.rep_type.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Record that `node` publishes `msg_type` on `topic`. Re-advertising the
    /// same type is a no-op.
    pub(crate) fn advertise(
        &self,
        node: Uuid,
        address: &str,
        topic: &str,
        msg_type: &str,
    ) -> Result<(), TransportError> {
        let mut registry = self.inner.registry.lock();
        let entries = registry.topics.entry(topic.to_owned()).or_default();
        if let Some(existing) = entries.iter().find(|entry| entry.node == node) {
            if existing.msg_type != msg_type {
                return Err(TransportError::TypeConflict {
                    topic: topic.to_owned(),
                    advertised: existing.msg_type.clone(),
                    requested: msg_type.to_owned(),
                });
            }
            return Ok(());
        }
        entries.push(TopicEntry {
            node,
            address: address.to_owned(),
            msg_type: msg_type.to_owned(),
        });
        drop(registry);
        debug!(topic, msg_type, address, "topic advertised");
        self.inner.changed.notify_all();
        Ok(())
    }

    pub(crate) fn is_advertised(&self, node: Uuid, topic: &str, msg_type: &str) -> bool {
        let registry = self.inner.registry.lock();
        registry.topics.get(topic).is_some_and(|entries| {
            entries
                .iter()
                .any(|entry| entry.node == node && entry.msg_type == msg_type)
        })
    }

    pub(crate) fn subscribe(&self, node: Uuid, topic: &str, callback: MessageCallback) {
        let mut registry = self.inner.registry.lock();
        registry.subscriptions.push(Subscription {
            node,
            topic: topic.to_owned(),
            callback,
            active: Arc::new(AtomicBool::new(true)),
        });
        debug!(topic, "subscription registered");
    }

    pub(crate) fn advertise_service(
        &self,
        node: Uuid,
        address: &str,
        service: &str,
        req_type: &str,
        rep_type: &str,
        handler: ServiceHandler,
    ) -> Result<(), TransportError> {
        let mut registry = self.inner.registry.lock();
        let entries = registry.services.entry(service.to_owned()).or_default();
        if entries.iter().any(|entry| entry.node == node) {
            return Err(TransportError::DuplicateService(service.to_owned()));
        }
        entries.push(ServiceEntry {
            node,
            address: address.to_owned(),
            req_type: req_type.to_owned(),
            rep_type: rep_type.to_owned(),
            handler,
        });
        drop(registry);
        debug!(service, req_type, rep_type, address, "service advertised");
        self.inner.changed.notify_all();
        Ok(())
    }

    /// Queue `message` for every subscription on `topic` that exists now.
    pub(crate) fn publish(&self, topic: &str, message: &DynamicMessage) -> Result<(), TransportError> {
        let targets: Vec<Target> = {
            let registry = self.inner.registry.lock();
            registry
                .subscriptions
                .iter()
                .filter(|subscription| subscription.topic == topic)
                .map(|subscription| Target {
                    callback: Arc::clone(&subscription.callback),
                    active: Arc::clone(&subscription.active),
                })
                .collect()
        };
        self.inner.counters.published.fetch_add(1, Ordering::Relaxed);
        let bytes = message.encode();
        log_traffic(TrafficDirection::Outbound, topic, message.type_name(), bytes.len());
        if targets.is_empty() {
            return Ok(());
        }

        let delivery = Delivery {
            topic: topic.to_owned(),
            descriptor: Arc::clone(message.descriptor()),
            bytes,
            targets,
        };
        let sender = self.dispatcher()?;
        sender.send(delivery).map_err(|_| {
            self.inner.dispatcher.lock().take();
            TransportError::Disconnected
        })
    }

    fn dispatcher(&self) -> Result<Sender<Delivery>, TransportError> {
        let mut slot = self.inner.dispatcher.lock();
        if let Some(sender) = slot.as_ref() {
            return Ok(sender.clone());
        }
        let (sender, receiver) = mpsc::channel();
        let counters = Arc::clone(&self.inner.counters);
        thread::Builder::new()
            .name("tbus-dispatch".into())
            .spawn(move || run_dispatcher(receiver, counters))?;
        *slot = Some(sender.clone());
        Ok(sender)
    }

    /// Block until a provider matching all three names is known, or `deadline`.
    pub(crate) fn wait_for_provider(
        &self,
        service: &str,
        req_type: &str,
        rep_type: &str,
        deadline: Instant,
    ) -> Option<ServiceHandler> {
        let mut registry = self.inner.registry.lock();
        loop {
            if let Some(handler) = registry.provider(service, req_type, rep_type) {
                return Some(handler);
            }
            if self.inner.changed.wait_until(&mut registry, deadline).timed_out() {
                return registry.provider(service, req_type, rep_type);
            }
        }
    }

    pub(crate) fn record_outcome(&self, outcome: RequestOutcome) {
        let counter = match outcome {
            RequestOutcome::TimedOut => &self.inner.counters.timed_out,
            RequestOutcome::Success | RequestOutcome::Failure => &self.inner.counters.replied,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Withdraw everything `node` owns.
    pub(crate) fn remove_node(&self, node: Uuid) {
        let mut registry = self.inner.registry.lock();
        registry.topics.retain(|_, entries| {
            entries.retain(|entry| entry.node != node);
            !entries.is_empty()
        });
        registry.subscriptions.retain(|subscription| {
            if subscription.node == node {
                subscription.active.store(false, Ordering::Release);
                false
            } else {
                true
            }
        });
        registry.services.retain(|_, entries| {
            entries.retain(|entry| entry.node != node);
            !entries.is_empty()
        });
        drop(registry);
        self.inner.changed.notify_all();
    }
}

fn run_dispatcher(deliveries: Receiver<Delivery>, counters: Arc<Counters>) {
    for delivery in deliveries {
        let message = match DynamicMessage::decode(Arc::clone(&delivery.descriptor), &delivery.bytes) {
            Ok(message) => message,
            Err(err) => {
                warn!(topic = %delivery.topic, error = %err, "dropping undecodable message");
                counters
                    .dropped
                    .fetch_add(delivery.targets.len() as u64, Ordering::Relaxed);
                continue;
            }
        };
        for target in delivery.targets {
            if !target.active.load(Ordering::Acquire) {
                continue;
            }
            log_traffic(
                TrafficDirection::Inbound,
                &delivery.topic,
                message.type_name(),
                delivery.bytes.len(),
            );
            match catch_unwind(AssertUnwindSafe(|| (target.callback)(&message))) {
                Ok(()) => {
                    counters.delivered.fetch_add(1, Ordering::Relaxed);
                }
                Err(_) => {
                    warn!(topic = %delivery.topic, "subscription callback panicked");
                    counters.dropped.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }
    debug!("delivery worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Node;
    use std::time::Duration;

    #[test]
    fn registry_preserves_first_advertise_order() {
        let bus = InMemoryBus::new();
        let a = bus.node();
        let b = bus.node();
        a.advertise("/b", "tbus.msgs.Int32").expect("advertise");
        b.advertise("/a", "tbus.msgs.Int32").expect("advertise");
        b.advertise("/b", "tbus.msgs.Int32").expect("advertise");
        assert_eq!(bus.topic_list(), ["/b", "/a"]);
        assert_eq!(bus.topic_info("/b").len(), 2);
    }

    #[test]
    fn removing_node_clears_its_entries() {
        let bus = InMemoryBus::new();
        let keep = bus.node();
        keep.advertise("/kept", "tbus.msgs.Empty").expect("advertise");
        {
            let gone = bus.node();
            gone.advertise("/gone", "tbus.msgs.Empty").expect("advertise");
            gone.advertise("/kept", "tbus.msgs.Empty").expect("advertise");
            assert_eq!(bus.topic_list().len(), 2);
        }
        assert_eq!(bus.topic_list(), ["/kept"]);
        assert_eq!(bus.topic_info("/kept").len(), 1);
    }

    #[test]
    fn provider_wait_times_out_without_provider() {
        let bus = InMemoryBus::new();
        let started = Instant::now();
        let handler = bus.wait_for_provider(
            "/none",
            "tbus.msgs.Int32",
            "tbus.msgs.Int32",
            started + Duration::from_millis(30),
        );
        assert!(handler.is_none());
        assert!(started.elapsed() >= Duration::from_millis(25));
    }

    #[test]
    fn metrics_start_at_zero() {
        assert_eq!(InMemoryBus::new().metrics(), BusMetrics::default());
    }
}
