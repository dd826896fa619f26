//! Any conversion between binary (hex), JSON and text.

use bytes::Bytes;
use serde::Deserialize;

use protobox_core::error::{ProtoboxError, Result};
use protobox_core::protocol::text::{decode_text_with, encode_text};
use protobox_core::{AnyMessage, DecodeOptions, Message, MessageType, Registry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Binary wire form, written as lowercase hex.
    Binary,
    Json,
    Text,
}

/// Decode an Any from `input` in `format`.
pub fn decode_any(
    format: Format,
    input: &str,
    registry: &Registry,
    options: DecodeOptions,
) -> Result<AnyMessage> {
    match format {
        Format::Binary => {
            let raw = hex::decode(input.trim())
                .map_err(|e| ProtoboxError::BinaryDecoding(format!("invalid hex input: {e}")))?;
            AnyMessage::decode(Bytes::from(raw))
        }
        Format::Json => AnyMessage::from_json(input.trim()),
        Format::Text => decode_text_with(input, registry, options),
    }
}

/// Render `any` in `format`.
pub fn encode_any(format: Format, any: &AnyMessage) -> Result<String> {
    match format {
        Format::Binary => Ok(hex::encode(any.encode_to_bytes()?)),
        Format::Json => any.to_json(),
        Format::Text => encode_text(any),
    }
}

/// Decode `input` as `from` and re-render it as `to`.
pub fn convert(
    from: Format,
    to: Format,
    input: &str,
    registry: &Registry,
    options: DecodeOptions,
) -> Result<String> {
    let any = decode_any(from, input, registry, options)?;
    tracing::debug!(
        ?from,
        ?to,
        type_url = any.type_url().unwrap_or_default(),
        "decoded input"
    );
    encode_any(to, &any)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const DURATION_HEX: &str = "0a2c747970652e676f6f676c65617069732e636f6d2f676f6f676c652e70726f746f6275662e4475726174696f6e120808031080cab5ee01";

    #[test]
    fn binary_to_json() {
        let out = convert(
            Format::Binary,
            Format::Json,
            DURATION_HEX,
            Registry::global(),
            DecodeOptions::default(),
        )
        .unwrap();
        assert_eq!(
            out,
            r#"{"@type":"type.googleapis.com/google.protobuf.Duration","value":"3.500s"}"#
        );
    }

    #[test]
    fn json_to_binary() {
        let out = convert(
            Format::Json,
            Format::Binary,
            r#"{"@type":"type.googleapis.com/google.protobuf.Duration","value":"3.5s"}"#,
            Registry::global(),
            DecodeOptions::default(),
        )
        .unwrap();
        assert_eq!(out, DURATION_HEX);
    }

    #[test]
    fn bad_hex_is_binary_error() {
        let err = decode_any(
            Format::Binary,
            "zz",
            Registry::global(),
            DecodeOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.code().as_str(), "BINARY_DECODING");
    }
}
