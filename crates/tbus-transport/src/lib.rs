//! ---
//! tbus_section: "04-messaging-transport"
//! tbus_subsection: "module"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Messaging node interface and in-process publish/subscribe bus."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
#![warn(missing_docs)]

//! The messaging node seam and its in-process implementation.
//!
//! Commands talk to the messaging layer only through [`Connector`], [`Node`]
//! and [`Publisher`]. [`InMemoryBus`] is the in-process backend: every node
//! connected to the same bus sees the others' topics and services.

pub mod bus;
pub mod error;
pub mod inproc;
pub mod logging;
pub mod naming;
pub mod node;

pub use bus::{BusMetrics, InMemoryBus};
pub use error::TransportError;
pub use inproc::{InMemoryNode, InMemoryPublisher, InProcConnector, ServiceHandler};
pub use logging::{log_traffic, TrafficDirection};
pub use naming::{validate_service, validate_topic};
pub use node::{
    Connector, MessageCallback, MessagePublisher, Node, Publisher, RequestOutcome,
    ServicePublisher,
};
