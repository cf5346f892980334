//! ---
//! tbus_section: "02-messaging-data-model"
//! tbus_subsection: "module"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Runtime message registry, dynamic messages and text format."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
use std::fmt::Write as _;

use serde_json::Value as JsonValue;

use crate::descriptor::{FieldDescriptor, FieldKind};
use crate::{DynamicMessage, FieldError};

/// A field value held by a [`DynamicMessage`].
///
/// Signed integer kinds share [`Value::Int`], unsigned kinds [`Value::UInt`]
/// and both float kinds [`Value::Double`]; the descriptor decides the width.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Boolean value.
    Bool(bool),
    /// Signed integer value.
    Int(i64),
    /// Unsigned integer value.
    UInt(u64),
    /// Floating point value.
    Double(f64),
    /// String value.
    String(String),
    /// Nested message.
    Message(DynamicMessage),
}

impl Value {
    /// Short name of the value's variant, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "signed integer",
            Value::UInt(_) => "unsigned integer",
            Value::Double(_) => "floating point",
            Value::String(_) => "string",
            Value::Message(_) => "message",
        }
    }

    /// Borrow the string payload.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Signed integer payload.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Unsigned integer payload.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::UInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Floating point payload.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Boolean payload.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Nested message payload.
    pub fn as_message(&self) -> Option<&DynamicMessage> {
        match self {
            Value::Message(m) => Some(m),
            _ => None,
        }
    }

    /// Check this value against `field` and normalise it to the field's width.
    pub(crate) fn conform(self, field: &FieldDescriptor) -> Result<Value, FieldError> {
        let out_of_range = |value: String| FieldError::OutOfRange {
            field: field.name().to_owned(),
            kind: field.kind().name().to_owned(),
            value,
        };
        let mismatch = |found: &str| FieldError::TypeMismatch {
            field: field.name().to_owned(),
            expected: field.kind().name().to_owned(),
            found: found.to_owned(),
        };

        match (field.kind(), self) {
            (FieldKind::String, value @ Value::String(_)) => Ok(value),
            (FieldKind::Bool, value @ Value::Bool(_)) => Ok(value),
            (FieldKind::Int32, Value::Int(v)) => i32::try_from(v)
                .map(|v| Value::Int(v.into()))
                .map_err(|_| out_of_range(v.to_string())),
            (FieldKind::Int32, Value::UInt(v)) => i32::try_from(v)
                .map(|v| Value::Int(v.into()))
                .map_err(|_| out_of_range(v.to_string())),
            (FieldKind::Int64, value @ Value::Int(_)) => Ok(value),
            (FieldKind::Int64, Value::UInt(v)) => i64::try_from(v)
                .map(Value::Int)
                .map_err(|_| out_of_range(v.to_string())),
            (FieldKind::UInt32, Value::UInt(v)) => u32::try_from(v)
                .map(|v| Value::UInt(v.into()))
                .map_err(|_| out_of_range(v.to_string())),
            (FieldKind::UInt32, Value::Int(v)) => u32::try_from(v)
                .map(|v| Value::UInt(v.into()))
                .map_err(|_| out_of_range(v.to_string())),
            (FieldKind::UInt64, value @ Value::UInt(_)) => Ok(value),
            (FieldKind::UInt64, Value::Int(v)) => u64::try_from(v)
                .map(Value::UInt)
                .map_err(|_| out_of_range(v.to_string())),
            (FieldKind::Float, Value::Double(v)) => Ok(Value::Double(f64::from(v as f32))),
            (FieldKind::Float, Value::Int(v)) => Ok(Value::Double(f64::from(v as f32))),
            (FieldKind::Float, Value::UInt(v)) => Ok(Value::Double(f64::from(v as f32))),
            (FieldKind::Double, value @ Value::Double(_)) => Ok(value),
            (FieldKind::Double, Value::Int(v)) => Ok(Value::Double(v as f64)),
            (FieldKind::Double, Value::UInt(v)) => Ok(Value::Double(v as f64)),
            (FieldKind::Message(descriptor), Value::Message(message)) => {
                if message.type_name() == descriptor.type_name() {
                    Ok(Value::Message(message))
                } else {
                    Err(FieldError::MessageTypeMismatch {
                        expected: descriptor.type_name().to_owned(),
                        found: message.type_name().to_owned(),
                    })
                }
            }
            (_, other) => Err(mismatch(other.kind_name())),
        }
    }

    /// Append the debug rendering of a scalar value.
    pub(crate) fn write_scalar(&self, kind: &FieldKind, out: &mut String) {
        match self {
            Value::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
            Value::Int(v) => {
                let _ = write!(out, "{}", v);
            }
            Value::UInt(v) => {
                let _ = write!(out, "{}", v);
            }
            Value::Double(v) => match kind {
                FieldKind::Float if v.is_finite() => {
                    let _ = write!(out, "{}", *v as f32);
                }
                _ => write_float(*v, out),
            },
            Value::String(s) => write_escaped(s, out),
            Value::Message(m) => out.push_str(&m.debug_string()),
        }
    }

    /// JSON form used by [`DynamicMessage::encode`].
    pub(crate) fn to_json(&self) -> JsonValue {
        match self {
            Value::Bool(v) => JsonValue::Bool(*v),
            Value::Int(v) => JsonValue::from(*v),
            Value::UInt(v) => JsonValue::from(*v),
            Value::Double(v) => match serde_json::Number::from_f64(*v) {
                Some(number) => JsonValue::Number(number),
                None => JsonValue::String(non_finite_literal(*v).to_owned()),
            },
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Message(m) => m.to_json(),
        }
    }

    /// Read a JSON value as `field`'s kind.
    pub(crate) fn from_json(field: &FieldDescriptor, json: &JsonValue) -> Result<Value, FieldError> {
        let mismatch = || FieldError::TypeMismatch {
            field: field.name().to_owned(),
            expected: field.kind().name().to_owned(),
            found: json_kind(json).to_owned(),
        };
        let value = match (field.kind(), json) {
            (FieldKind::String, JsonValue::String(s)) => Value::String(s.clone()),
            (FieldKind::Bool, JsonValue::Bool(b)) => Value::Bool(*b),
            (FieldKind::Int32 | FieldKind::Int64, JsonValue::Number(n)) => {
                Value::Int(n.as_i64().ok_or_else(mismatch)?)
            }
            (FieldKind::UInt32 | FieldKind::UInt64, JsonValue::Number(n)) => {
                Value::UInt(n.as_u64().ok_or_else(mismatch)?)
            }
            (FieldKind::Float | FieldKind::Double, JsonValue::Number(n)) => {
                Value::Double(n.as_f64().ok_or_else(mismatch)?)
            }
            (FieldKind::Float | FieldKind::Double, JsonValue::String(s)) => {
                Value::Double(s.parse::<f64>().map_err(|_| mismatch())?)
            }
            (FieldKind::Message(descriptor), JsonValue::Object(_)) => {
                Value::Message(DynamicMessage::from_json(descriptor.clone(), json)?)
            }
            _ => return Err(mismatch()),
        };
        value.conform(field)
    }
}

fn json_kind(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

fn non_finite_literal(v: f64) -> &'static str {
    if v.is_nan() {
        "nan"
    } else if v.is_sign_negative() {
        "-inf"
    } else {
        "inf"
    }
}

fn write_float(v: f64, out: &mut String) {
    if v.is_finite() {
        let _ = write!(out, "{}", v);
    } else {
        out.push_str(non_finite_literal(v));
    }
}

/// Quote and C-escape a string the way debug output expects.
fn write_escaped(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            c if c.is_ascii_control() => {
                let _ = write!(out, "\\{:03o}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::UInt(v.into())
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Double(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<DynamicMessage> for Value {
    fn from(v: DynamicMessage) -> Self {
        Value::Message(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(value: Value, kind: FieldKind) -> String {
        let mut out = String::new();
        value.write_scalar(&kind, &mut out);
        out
    }

    #[test]
    fn strings_are_quoted_and_escaped() {
        assert_eq!(
            render(Value::from("a\"b\\c\nd\u{1}"), FieldKind::String),
            r#""a\"b\\c\nd\001""#
        );
        assert_eq!(render(Value::from("héllo"), FieldKind::String), "\"héllo\"");
    }

    #[test]
    fn floats_render_compactly() {
        assert_eq!(render(Value::Double(1.0), FieldKind::Double), "1");
        assert_eq!(render(Value::Double(0.5), FieldKind::Double), "0.5");
        assert_eq!(render(Value::Double(f64::from(0.1f32)), FieldKind::Float), "0.1");
        assert_eq!(render(Value::Double(f64::from(2.7f32)), FieldKind::Float), "2.7");
        assert_eq!(render(Value::Double(f64::INFINITY), FieldKind::Float), "inf");
        assert_eq!(render(Value::Double(f64::NAN), FieldKind::Double), "nan");
        assert_eq!(render(Value::Double(f64::NEG_INFINITY), FieldKind::Double), "-inf");
    }

    #[test]
    fn non_finite_doubles_survive_json() {
        let field = crate::MessageDescriptor::builder("t.D")
            .field("v", FieldKind::Double)
            .build()
            .expect("descriptor");
        let field = &field.fields()[0];
        let json = Value::Double(f64::INFINITY).to_json();
        assert_eq!(json, JsonValue::String("inf".into()));
        let back = Value::from_json(field, &json).expect("decode");
        assert_eq!(back, Value::Double(f64::INFINITY));
    }
}
