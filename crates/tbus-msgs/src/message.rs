//! ---
//! tbus_section: "02-messaging-data-model"
//! tbus_subsection: "module"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Runtime message registry, dynamic messages and text format."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};

use crate::descriptor::{FieldKind, MessageDescriptor};
use crate::{FactoryError, FieldError, TextFormatError, Value};

/// A message instance whose schema is known only at runtime.
///
/// Only explicitly assigned fields are stored; unassigned fields are absent
/// from [`DynamicMessage::debug_string`] and from the JSON encoding.
#[derive(Clone)]
pub struct DynamicMessage {
    descriptor: Arc<MessageDescriptor>,
    fields: IndexMap<String, Value>,
}

/// Wire envelope used by [`DynamicMessage::encode`].
#[derive(Serialize, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    type_name: String,
    fields: JsonValue,
}

impl DynamicMessage {
    /// Create an empty message of the given type.
    pub fn new(descriptor: Arc<MessageDescriptor>) -> Self {
        Self {
            descriptor,
            fields: IndexMap::new(),
        }
    }

    /// The schema this message conforms to.
    pub fn descriptor(&self) -> &Arc<MessageDescriptor> {
        &self.descriptor
    }

    /// Canonical type name.
    pub fn type_name(&self) -> &str {
        self.descriptor.type_name()
    }

    /// Value of an assigned field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Whether `name` has been assigned.
    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Assign a field, checking kind and range against the descriptor.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), FieldError> {
        let field = self
            .descriptor
            .field(name)
            .ok_or_else(|| self.unknown_field(name))?;
        let value = value.into().conform(field)?;
        self.fields.insert(name.to_owned(), value);
        Ok(())
    }

    /// Remove a field assignment, returning the previous value.
    pub fn clear(&mut self, name: &str) -> Option<Value> {
        self.fields.shift_remove(name)
    }

    /// True when no field is assigned.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Assigned fields in descriptor order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.descriptor
            .fields()
            .iter()
            .filter_map(|field| self.fields.get(field.name()).map(|v| (field.name(), v)))
    }

    /// Mutable access to a nested message field, assigning an empty one first
    /// when it is unset.
    pub fn message_mut(&mut self, name: &str) -> Result<&mut DynamicMessage, FieldError> {
        let field = self
            .descriptor
            .field(name)
            .ok_or_else(|| self.unknown_field(name))?;
        let FieldKind::Message(nested) = field.kind() else {
            return Err(FieldError::TypeMismatch {
                field: name.to_owned(),
                expected: field.kind().name().to_owned(),
                found: "message".to_owned(),
            });
        };
        let nested = Arc::clone(nested);
        let slot = self
            .fields
            .entry(name.to_owned())
            .or_insert_with(|| Value::Message(DynamicMessage::new(nested)));
        match slot {
            Value::Message(message) => Ok(message),
            other => Err(FieldError::TypeMismatch {
                field: name.to_owned(),
                expected: "message".to_owned(),
                found: other.kind_name().to_owned(),
            }),
        }
    }

    /// Merge every assigned field of `other` into `self`.
    ///
    /// Scalars overwrite, nested messages merge recursively.
    pub fn merge_from(&mut self, other: &DynamicMessage) -> Result<(), FieldError> {
        if self.type_name() != other.type_name() {
            return Err(FieldError::MessageTypeMismatch {
                expected: self.type_name().to_owned(),
                found: other.type_name().to_owned(),
            });
        }
        for (name, value) in &other.fields {
            match (self.fields.get_mut(name), value) {
                (Some(Value::Message(mine)), Value::Message(theirs)) => mine.merge_from(theirs)?,
                _ => {
                    self.fields.insert(name.clone(), value.clone());
                }
            }
        }
        Ok(())
    }

    /// Parse a text-format payload and merge it into this message.
    pub fn merge_text(&mut self, text: &str) -> Result<(), TextFormatError> {
        crate::text::merge(text, self)
    }

    /// Human-readable rendering, one `name: value` line per assigned field.
    pub fn debug_string(&self) -> String {
        let mut out = String::new();
        self.write_fields(0, &mut out);
        out
    }

    fn write_fields(&self, indent: usize, out: &mut String) {
        for field in self.descriptor.fields() {
            let Some(value) = self.fields.get(field.name()) else {
                continue;
            };
            push_indent(indent, out);
            out.push_str(field.name());
            match value {
                Value::Message(nested) => {
                    out.push_str(" {\n");
                    nested.write_fields(indent + 2, out);
                    push_indent(indent, out);
                    out.push_str("}\n");
                }
                scalar => {
                    out.push_str(": ");
                    scalar.write_scalar(field.kind(), out);
                    out.push('\n');
                }
            }
        }
    }

    /// Field values as a JSON object in descriptor order.
    pub fn to_json(&self) -> JsonValue {
        let mut map = Map::new();
        for (name, value) in self.fields() {
            map.insert(name.to_owned(), value.to_json());
        }
        JsonValue::Object(map)
    }

    /// Build a message of `descriptor`'s type from a JSON object of fields.
    pub fn from_json(descriptor: Arc<MessageDescriptor>, json: &JsonValue) -> Result<Self, FieldError> {
        let JsonValue::Object(map) = json else {
            return Err(FieldError::TypeMismatch {
                field: descriptor.type_name().to_owned(),
                expected: "object".to_owned(),
                found: "non-object JSON".to_owned(),
            });
        };
        let mut message = DynamicMessage::new(descriptor);
        for (name, raw) in map {
            let field = message
                .descriptor
                .field(name)
                .ok_or_else(|| message.unknown_field(name))?;
            let value = Value::from_json(field, raw)?;
            message.fields.insert(name.clone(), value);
        }
        Ok(message)
    }

    /// Serialize to the self-describing byte form carried by transports.
    pub fn encode(&self) -> Vec<u8> {
        let envelope = Envelope {
            type_name: self.type_name().to_owned(),
            fields: self.to_json(),
        };
        serde_json::to_vec(&envelope).unwrap_or_default()
    }

    /// Decode bytes produced by [`DynamicMessage::encode`] as `descriptor`'s type.
    pub fn decode(descriptor: Arc<MessageDescriptor>, bytes: &[u8]) -> Result<Self, FactoryError> {
        let envelope: Envelope =
            serde_json::from_slice(bytes).map_err(|source| FactoryError::Decode {
                type_name: descriptor.type_name().to_owned(),
                source,
            })?;
        if envelope.type_name != descriptor.type_name() {
            return Err(FieldError::MessageTypeMismatch {
                expected: descriptor.type_name().to_owned(),
                found: envelope.type_name,
            }
            .into());
        }
        Ok(Self::from_json(descriptor, &envelope.fields)?)
    }

    fn unknown_field(&self, name: &str) -> FieldError {
        FieldError::UnknownField {
            type_name: self.type_name().to_owned(),
            field: name.to_owned(),
        }
    }
}

fn push_indent(indent: usize, out: &mut String) {
    out.extend(std::iter::repeat(' ').take(indent));
}

impl PartialEq for DynamicMessage {
    fn eq(&self, other: &Self) -> bool {
        self.type_name() == other.type_name() && self.fields == other.fields
    }
}

impl fmt::Debug for DynamicMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicMessage")
            .field("type_name", &self.type_name())
            .field("fields", &self.fields)
            .finish()
    }
}

impl fmt::Display for DynamicMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.debug_string())
    }
}

impl Serialize for DynamicMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
