//! Shared error type across protobox crates.

use thiserror::Error;

/// Stable error codes (used by test vectors and the CLI exit report).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Unpack called on an Any without a type URL.
    EmptyAnyField,
    /// Type URL carries no type name.
    MalformedTypeUrl,
    /// Encoded type name differs from the target type.
    TypeMismatch,
    /// Well-known type JSON is not a lone `"value"` pair.
    MalformedWellKnownTypeJson,
    /// Any has a type URL but no payload, or its JSON object is invalid.
    MalformedAnyField,
    /// Text format grammar violation.
    MalformedText,
    /// Binary wire decoding failed.
    BinaryDecoding,
    /// JSON decoding failed.
    JsonDecoding,
    /// JSON encoding failed.
    JsonEncoding,
    /// Re-encoding needs a type that is not registered.
    AnyTypeUrlNotRegistered,
    /// Invalid configuration or options.
    Config,
}

impl ErrorCode {
    /// String representation used in vectors and CLI output.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::EmptyAnyField => "EMPTY_ANY_FIELD",
            ErrorCode::MalformedTypeUrl => "MALFORMED_TYPE_URL",
            ErrorCode::TypeMismatch => "TYPE_MISMATCH",
            ErrorCode::MalformedWellKnownTypeJson => "MALFORMED_WELL_KNOWN_TYPE_JSON",
            ErrorCode::MalformedAnyField => "MALFORMED_ANY_FIELD",
            ErrorCode::MalformedText => "MALFORMED_TEXT",
            ErrorCode::BinaryDecoding => "BINARY_DECODING",
            ErrorCode::JsonDecoding => "JSON_DECODING",
            ErrorCode::JsonEncoding => "JSON_ENCODING",
            ErrorCode::AnyTypeUrlNotRegistered => "ANY_TYPE_URL_NOT_REGISTERED",
            ErrorCode::Config => "CONFIG",
        }
    }
}

/// JSON decoding failure detail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JsonDecodingError {
    /// Content remains after the top-level value closed.
    #[error("trailing garbage after JSON value")]
    TrailingGarbage,
    /// Tokenizer or shape error.
    #[error("malformed JSON: {0}")]
    Malformed(String),
    /// Well-formed JSON carrying a value the message rejects.
    #[error("invalid JSON value: {0}")]
    InvalidValue(String),
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, ProtoboxError>;

/// Unified error type used by core and CLI.
#[derive(Debug, Error)]
pub enum ProtoboxError {
    #[error("empty Any field")]
    EmptyAnyField,
    #[error("malformed type url: {0:?}")]
    MalformedTypeUrl(String),
    #[error("type mismatch: Any holds {found}, target is {expected}")]
    TypeMismatch { expected: String, found: String },
    #[error("malformed well-known type JSON: {0}")]
    MalformedWellKnownTypeJson(String),
    #[error("malformed Any field: {0}")]
    MalformedAnyField(String),
    #[error("malformed text: {0}")]
    MalformedText(String),
    #[error("binary decoding: {0}")]
    BinaryDecoding(String),
    #[error("json decoding: {0}")]
    JsonDecoding(#[from] JsonDecodingError),
    #[error("json encoding: {0}")]
    JsonEncoding(String),
    #[error("Any type url not registered: {0}")]
    AnyTypeUrlNotRegistered(String),
    #[error("config: {0}")]
    Config(String),
}

impl ProtoboxError {
    /// Map the error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            ProtoboxError::EmptyAnyField => ErrorCode::EmptyAnyField,
            ProtoboxError::MalformedTypeUrl(_) => ErrorCode::MalformedTypeUrl,
            ProtoboxError::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            ProtoboxError::MalformedWellKnownTypeJson(_) => ErrorCode::MalformedWellKnownTypeJson,
            ProtoboxError::MalformedAnyField(_) => ErrorCode::MalformedAnyField,
            ProtoboxError::MalformedText(_) => ErrorCode::MalformedText,
            ProtoboxError::BinaryDecoding(_) => ErrorCode::BinaryDecoding,
            ProtoboxError::JsonDecoding(_) => ErrorCode::JsonDecoding,
            ProtoboxError::JsonEncoding(_) => ErrorCode::JsonEncoding,
            ProtoboxError::AnyTypeUrlNotRegistered(_) => ErrorCode::AnyTypeUrlNotRegistered,
            ProtoboxError::Config(_) => ErrorCode::Config,
        }
    }
}

/// Tokenizer errors from `serde_json` become [`JsonDecodingError::Malformed`].
pub(crate) fn malformed_json(e: serde_json::Error) -> ProtoboxError {
    ProtoboxError::JsonDecoding(JsonDecodingError::Malformed(e.to_string()))
}
