//! ---
//! tbus_section: "02-messaging-data-model"
//! tbus_subsection: "module"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Runtime message registry, dynamic messages and text format."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
use thiserror::Error;

/// Errors raised while resolving types or building messages.
#[derive(Debug, Error)]
pub enum FactoryError {
    /// No descriptor or alias is registered under the requested name.
    #[error("unknown message type [{0}]")]
    UnknownType(String),
    /// The textual initializer could not be applied to the message.
    #[error("invalid payload for message type [{type_name}]: {source}")]
    InvalidPayload {
        /// Canonical type the payload was applied to.
        type_name: String,
        /// Parse or assignment failure.
        #[source]
        source: TextFormatError,
    },
    /// A descriptor or alias with this name already exists.
    #[error("message type [{0}] is already registered")]
    DuplicateType(String),
    /// A descriptor failed structural validation.
    #[error("invalid message descriptor: {0}")]
    InvalidDescriptor(String),
    /// Encoded bytes could not be decoded.
    #[error("unable to decode message of type [{type_name}]: {source}")]
    Decode {
        /// Type the bytes were decoded as.
        type_name: String,
        /// Underlying JSON failure.
        #[source]
        source: serde_json::Error,
    },
    /// Decoded JSON did not fit the descriptor.
    #[error(transparent)]
    Field(#[from] FieldError),
}

/// Errors raised when reading or assigning individual fields.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    /// The descriptor has no field with this name.
    #[error("message type [{type_name}] has no field named [{field}]")]
    UnknownField {
        /// Type that was searched.
        type_name: String,
        /// Field that was requested.
        field: String,
    },
    /// The value kind does not match the field kind.
    #[error("field [{field}] expects {expected}, got {found}")]
    TypeMismatch {
        /// Field being assigned.
        field: String,
        /// Kind declared by the descriptor.
        expected: String,
        /// Kind of the offered value.
        found: String,
    },
    /// An integer does not fit the field's width.
    #[error("value {value} is out of range for {kind} field [{field}]")]
    OutOfRange {
        /// Field being assigned.
        field: String,
        /// Declared field kind.
        kind: String,
        /// Offending literal.
        value: String,
    },
    /// Two messages of different types were combined.
    #[error("message type mismatch: expected [{expected}], found [{found}]")]
    MessageTypeMismatch {
        /// Type of the destination.
        expected: String,
        /// Type of the source.
        found: String,
    },
}

/// A text-format parse failure with its 1-based position.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{line}:{column}: {reason}")]
pub struct TextFormatError {
    /// Line of the offending token.
    pub line: usize,
    /// Column of the offending token.
    pub column: usize,
    /// What went wrong.
    pub reason: TextErrorReason,
}

/// Reasons a text-format payload can be rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TextErrorReason {
    /// A character that cannot start any token.
    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),
    /// A quoted string without its closing quote.
    #[error("unterminated string")]
    UnterminatedString,
    /// An escape sequence that is not understood.
    #[error("invalid escape sequence \\{0}")]
    InvalidEscape(char),
    /// Input ended inside a nested message.
    #[error("unexpected end of input, expected {0}")]
    UnexpectedEnd(&'static str),
    /// A token that is not valid at this point.
    #[error("expected {expected}, found {found}")]
    Unexpected {
        /// What the grammar allows here.
        expected: &'static str,
        /// What was found instead.
        found: String,
    },
    /// A scalar literal that cannot be read as the field's kind.
    #[error("invalid {kind} literal {literal:?} for field [{field}]")]
    InvalidLiteral {
        /// Field being assigned.
        field: String,
        /// Declared field kind.
        kind: String,
        /// Offending literal.
        literal: String,
    },
    /// A singular field assigned twice.
    #[error("field [{0}] specified more than once")]
    DuplicateField(String),
    /// The field itself was rejected.
    #[error(transparent)]
    Field(#[from] FieldError),
}
