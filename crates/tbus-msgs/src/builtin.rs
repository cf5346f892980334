//! ---
//! tbus_section: "02-messaging-data-model"
//! tbus_subsection: "module"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Runtime message registry, dynamic messages and text format."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
//! Built-in message catalogue.
//!
//! Every type is registered under `tbus.msgs.<Name>` and aliased as
//! `tbus_msgs.<Name>`.

use std::sync::Arc;

use crate::descriptor::{FieldKind, MessageDescriptor};
use crate::{FactoryError, MessageFactory};

/// Prefix of canonical built-in type names.
pub const CANONICAL_PREFIX: &str = "tbus.msgs.";
/// Prefix of the alias registered for every built-in type.
pub const ALIAS_PREFIX: &str = "tbus_msgs.";

/// Canonical names of the built-in types.
pub mod names {
    /// No fields.
    pub const EMPTY: &str = "tbus.msgs.Empty";
    /// `data: string`.
    pub const STRING_MSG: &str = "tbus.msgs.StringMsg";
    /// `data: bool`.
    pub const BOOLEAN: &str = "tbus.msgs.Boolean";
    /// `data: int32`.
    pub const INT32: &str = "tbus.msgs.Int32";
    /// `data: int64`.
    pub const INT64: &str = "tbus.msgs.Int64";
    /// `data: uint32`.
    pub const UINT32: &str = "tbus.msgs.UInt32";
    /// `data: uint64`.
    pub const UINT64: &str = "tbus.msgs.UInt64";
    /// `data: float`.
    pub const FLOAT: &str = "tbus.msgs.Float";
    /// `data: double`.
    pub const DOUBLE: &str = "tbus.msgs.Double";
    /// `sec: int64`, `nsec: int32`.
    pub const TIME: &str = "tbus.msgs.Time";
    /// `stamp: Time`.
    pub const HEADER: &str = "tbus.msgs.Header";
    /// `x`, `y`, `z` doubles.
    pub const VECTOR3D: &str = "tbus.msgs.Vector3d";
    /// `x`, `y`, `z`, `w` doubles.
    pub const QUATERNION: &str = "tbus.msgs.Quaternion";
    /// `name`, `position: Vector3d`, `orientation: Quaternion`.
    pub const POSE: &str = "tbus.msgs.Pose";
    /// `linear`, `angular` as `Vector3d`.
    pub const TWIST: &str = "tbus.msgs.Twist";
}

fn data(type_name: &str, kind: FieldKind) -> Result<Arc<MessageDescriptor>, FactoryError> {
    MessageDescriptor::builder(type_name).field("data", kind).build()
}

fn try_descriptors() -> Result<Vec<Arc<MessageDescriptor>>, FactoryError> {
    let time = MessageDescriptor::builder(names::TIME)
        .field("sec", FieldKind::Int64)
        .field("nsec", FieldKind::Int32)
        .build()?;
    let header = MessageDescriptor::builder(names::HEADER)
        .message_field("stamp", &time)
        .build()?;
    let vector = MessageDescriptor::builder(names::VECTOR3D)
        .field("x", FieldKind::Double)
        .field("y", FieldKind::Double)
        .field("z", FieldKind::Double)
        .build()?;
    let quaternion = MessageDescriptor::builder(names::QUATERNION)
        .field("x", FieldKind::Double)
        .field("y", FieldKind::Double)
        .field("z", FieldKind::Double)
        .field("w", FieldKind::Double)
        .build()?;
    let pose = MessageDescriptor::builder(names::POSE)
        .field("name", FieldKind::String)
        .message_field("position", &vector)
        .message_field("orientation", &quaternion)
        .build()?;
    let twist = MessageDescriptor::builder(names::TWIST)
        .message_field("linear", &vector)
        .message_field("angular", &vector)
        .build()?;

    Ok(vec![
        MessageDescriptor::builder(names::EMPTY).build()?,
        data(names::STRING_MSG, FieldKind::String)?,
        data(names::BOOLEAN, FieldKind::Bool)?,
        data(names::INT32, FieldKind::Int32)?,
        data(names::INT64, FieldKind::Int64)?,
        data(names::UINT32, FieldKind::UInt32)?,
        data(names::UINT64, FieldKind::UInt64)?,
        data(names::FLOAT, FieldKind::Float)?,
        data(names::DOUBLE, FieldKind::Double)?,
        time,
        header,
        vector,
        quaternion,
        pose,
        twist,
    ])
}

/// Descriptors of every built-in type, in catalogue order.
pub fn descriptors() -> Vec<Arc<MessageDescriptor>> {
    try_descriptors().unwrap_or_default()
}

/// Register the catalogue and its aliases into `factory`.
pub(crate) fn install(factory: &mut MessageFactory) -> Result<(), FactoryError> {
    for descriptor in try_descriptors()? {
        let canonical = descriptor.type_name().to_owned();
        factory.register(descriptor)?;
        if let Some(short) = canonical.strip_prefix(CANONICAL_PREFIX) {
            factory.register_alias(format!("{}{}", ALIAS_PREFIX, short), &canonical)?;
        }
    }
    Ok(())
}
