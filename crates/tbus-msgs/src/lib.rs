//! ---
//! tbus_section: "02-messaging-data-model"
//! tbus_subsection: "module"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Runtime message registry, dynamic messages and text format."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
#![warn(missing_docs)]

//! Message types resolved at runtime.
//!
//! Command-line tools only learn the message type as a string, so messages
//! are modelled as a [`MessageDescriptor`] (the schema) plus a
//! [`DynamicMessage`] holding the assigned field values. The
//! [`MessageFactory`] is the registry that turns a type name and an optional
//! text-format payload into a message.

pub mod builtin;
pub mod descriptor;
pub mod error;
pub mod factory;
pub mod message;
pub mod text;
pub mod value;

pub use descriptor::{FieldDescriptor, FieldKind, MessageDescriptor, MessageDescriptorBuilder};
pub use error::{FactoryError, FieldError, TextErrorReason, TextFormatError};
pub use factory::MessageFactory;
pub use message::DynamicMessage;
pub use value::Value;
