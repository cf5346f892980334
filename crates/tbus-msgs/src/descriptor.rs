//! ---
//! tbus_section: "02-messaging-data-model"
//! tbus_subsection: "module"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Runtime message registry, dynamic messages and text format."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::FactoryError;

/// Kind of a single message field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// UTF-8 string.
    String,
    /// Signed 32-bit integer.
    Int32,
    /// Signed 64-bit integer.
    Int64,
    /// Unsigned 32-bit integer.
    UInt32,
    /// Unsigned 64-bit integer.
    UInt64,
    /// Single precision float.
    Float,
    /// Double precision float.
    Double,
    /// Boolean.
    Bool,
    /// Nested message of the given type.
    Message(Arc<MessageDescriptor>),
}

impl FieldKind {
    /// Name used in diagnostics (`int32`, `double`, or the nested type name).
    pub fn name(&self) -> &str {
        match self {
            FieldKind::String => "string",
            FieldKind::Int32 => "int32",
            FieldKind::Int64 => "int64",
            FieldKind::UInt32 => "uint32",
            FieldKind::UInt64 => "uint64",
            FieldKind::Float => "float",
            FieldKind::Double => "double",
            FieldKind::Bool => "bool",
            FieldKind::Message(descriptor) => descriptor.type_name(),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named, typed field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    name: String,
    kind: FieldKind,
}

impl FieldDescriptor {
    /// Field name as written in payloads.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field kind.
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }
}

/// Schema of one message type.
#[derive(Debug, PartialEq)]
pub struct MessageDescriptor {
    type_name: String,
    fields: Vec<FieldDescriptor>,
}

impl MessageDescriptor {
    /// Start building a descriptor for `type_name`.
    pub fn builder(type_name: impl Into<String>) -> MessageDescriptorBuilder {
        MessageDescriptorBuilder {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    /// Canonical, fully qualified type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Look a field up by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Builder returned by [`MessageDescriptor::builder`].
#[derive(Debug)]
pub struct MessageDescriptorBuilder {
    type_name: String,
    fields: Vec<FieldDescriptor>,
}

impl MessageDescriptorBuilder {
    /// Append a field.
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldDescriptor {
            name: name.into(),
            kind,
        });
        self
    }

    /// Append a nested message field.
    pub fn message_field(self, name: impl Into<String>, descriptor: &Arc<MessageDescriptor>) -> Self {
        self.field(name, FieldKind::Message(Arc::clone(descriptor)))
    }

    /// Validate and freeze the descriptor.
    ///
    /// The type name must be a dotted identifier path and field names must be
    /// unique identifiers.
    pub fn build(self) -> Result<Arc<MessageDescriptor>, FactoryError> {
        if self.type_name.is_empty() || !self.type_name.split('.').all(is_identifier) {
            return Err(FactoryError::InvalidDescriptor(format!(
                "type name [{}] is not a dotted identifier",
                self.type_name
            )));
        }
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !is_identifier(&field.name) {
                return Err(FactoryError::InvalidDescriptor(format!(
                    "field name [{}] of [{}] is not an identifier",
                    field.name, self.type_name
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(FactoryError::InvalidDescriptor(format!(
                    "field [{}] declared twice in [{}]",
                    field.name, self.type_name
                )));
            }
        }
        Ok(Arc::new(MessageDescriptor {
            type_name: self.type_name,
            fields: self.fields,
        }))
    }
}

pub(crate) fn is_identifier(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_preserves_declaration_order() {
        let descriptor = MessageDescriptor::builder("demo.Point")
            .field("z", FieldKind::Double)
            .field("a", FieldKind::Double)
            .build()
            .expect("valid descriptor");
        let names: Vec<&str> = descriptor.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, ["z", "a"]);
        assert_eq!(descriptor.field("a").map(|f| f.kind()), Some(&FieldKind::Double));
    }

    #[test]
    fn rejects_duplicate_fields() {
        let err = MessageDescriptor::builder("demo.Bad")
            .field("x", FieldKind::Int32)
            .field("x", FieldKind::String)
            .build()
            .expect_err("duplicate field");
        assert!(matches!(err, FactoryError::InvalidDescriptor(_)));
    }

    #[test]
    fn rejects_malformed_names() {
        assert!(MessageDescriptor::builder("demo..Bad").build().is_err());
        assert!(MessageDescriptor::builder("").build().is_err());
        assert!(MessageDescriptor::builder("demo.Ok")
            .field("1st", FieldKind::Bool)
            .build()
            .is_err());
    }

    #[test]
    fn nested_kind_reports_type_name() {
        let inner = MessageDescriptor::builder("demo.Inner").build().expect("inner");
        let kind = FieldKind::Message(inner);
        assert_eq!(kind.name(), "demo.Inner");
        assert_eq!(FieldKind::UInt32.to_string(), "uint32");
    }
}
