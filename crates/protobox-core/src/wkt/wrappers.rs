//! Wrapper types. Each carries one `value` field (number 1) and uses the bare
//! scalar as its JSON form.

use bytes::{Buf, Bytes, BytesMut};
use serde_json::Value;

use crate::error::{malformed_json, JsonDecodingError, ProtoboxError, Result};
use crate::message::{Message, MessageType};
use crate::protocol::text::{TextDecoder, TextEncoder};
use crate::protocol::wire::{self, WireType};

fn invalid_json(type_name: &str, json: &str) -> ProtoboxError {
    ProtoboxError::JsonDecoding(JsonDecodingError::InvalidValue(format!(
        "{type_name}: unexpected JSON {json}"
    )))
}

fn encoding_error(e: serde_json::Error) -> ProtoboxError {
    ProtoboxError::JsonEncoding(e.to_string())
}

/// Merge every occurrence of field 1, skipping unknown fields.
fn merge_value_field(
    mut buf: Bytes,
    expected: WireType,
    mut read: impl FnMut(&mut Bytes) -> Result<()>,
) -> Result<()> {
    while buf.has_remaining() {
        let (field, wire_type) = wire::decode_key(&mut buf)?;
        if field == 1 {
            wire::check_wire_type(field, expected, wire_type)?;
            read(&mut buf)?;
        } else {
            wire::skip_field(wire_type, &mut buf)?;
        }
    }
    Ok(())
}

fn decode_value_text(
    dec: &mut TextDecoder<'_>,
    type_name: &str,
    mut read: impl FnMut(&mut TextDecoder<'_>) -> Result<()>,
) -> Result<()> {
    while let Some(name) = dec.next_field_name()? {
        if name != "value" {
            return Err(ProtoboxError::MalformedText(format!(
                "unknown field {name:?} in {type_name}"
            )));
        }
        read(dec)?;
    }
    Ok(())
}

/// `google.protobuf.StringValue`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringValue {
    pub value: String,
}

impl StringValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl Message for StringValue {
    fn encode_to(&self, buf: &mut BytesMut) -> Result<()> {
        if !self.value.is_empty() {
            wire::encode_string_field(1, &self.value, buf);
        }
        Ok(())
    }

    fn merge(&mut self, buf: Bytes) -> Result<()> {
        merge_value_field(buf, WireType::LengthDelimited, |b| {
            self.value = wire::decode_string(b)?;
            Ok(())
        })
    }

    fn merge_json(&mut self, json: &str) -> Result<()> {
        match serde_json::from_str::<Value>(json).map_err(malformed_json)? {
            Value::String(s) => self.value = s,
            Value::Null => self.value.clear(),
            _ => return Err(invalid_json(Self::TYPE_NAME, json)),
        }
        Ok(())
    }

    fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.value).map_err(encoding_error)
    }

    fn decode_text(&mut self, dec: &mut TextDecoder<'_>) -> Result<()> {
        decode_value_text(dec, Self::TYPE_NAME, |d| {
            self.value = d.read_string()?;
            Ok(())
        })
    }

    fn encode_text(&self, enc: &mut TextEncoder) -> Result<()> {
        if !self.value.is_empty() {
            enc.put_string("value", &self.value);
        }
        Ok(())
    }
}

impl MessageType for StringValue {
    const TYPE_NAME: &'static str = "google.protobuf.StringValue";
}

/// `google.protobuf.Int64Value`. JSON form is a decimal string; bare numbers
/// are accepted on input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Int64Value {
    pub value: i64,
}

impl Int64Value {
    pub fn new(value: i64) -> Self {
        Self { value }
    }
}

impl Message for Int64Value {
    fn encode_to(&self, buf: &mut BytesMut) -> Result<()> {
        if self.value != 0 {
            wire::encode_varint_field(1, self.value as u64, buf);
        }
        Ok(())
    }

    fn merge(&mut self, buf: Bytes) -> Result<()> {
        merge_value_field(buf, WireType::Varint, |b| {
            self.value = wire::decode_varint(b)? as i64;
            Ok(())
        })
    }

    fn merge_json(&mut self, json: &str) -> Result<()> {
        let parsed = match serde_json::from_str::<Value>(json).map_err(malformed_json)? {
            Value::String(s) => s.parse::<i64>().ok(),
            Value::Number(n) => n.as_i64(),
            Value::Null => Some(0),
            _ => None,
        };
        self.value = parsed.ok_or_else(|| invalid_json(Self::TYPE_NAME, json))?;
        Ok(())
    }

    fn to_json(&self) -> Result<String> {
        Ok(format!("\"{}\"", self.value))
    }

    fn decode_text(&mut self, dec: &mut TextDecoder<'_>) -> Result<()> {
        decode_value_text(dec, Self::TYPE_NAME, |d| {
            self.value = d.read_i64()?;
            Ok(())
        })
    }

    fn encode_text(&self, enc: &mut TextEncoder) -> Result<()> {
        if self.value != 0 {
            enc.put_i64("value", self.value);
        }
        Ok(())
    }
}

impl MessageType for Int64Value {
    const TYPE_NAME: &'static str = "google.protobuf.Int64Value";
}

/// `google.protobuf.BoolValue`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoolValue {
    pub value: bool,
}

impl BoolValue {
    pub fn new(value: bool) -> Self {
        Self { value }
    }
}

impl Message for BoolValue {
    fn encode_to(&self, buf: &mut BytesMut) -> Result<()> {
        if self.value {
            wire::encode_varint_field(1, 1, buf);
        }
        Ok(())
    }

    fn merge(&mut self, buf: Bytes) -> Result<()> {
        merge_value_field(buf, WireType::Varint, |b| {
            self.value = wire::decode_varint(b)? != 0;
            Ok(())
        })
    }

    fn merge_json(&mut self, json: &str) -> Result<()> {
        match serde_json::from_str::<Value>(json).map_err(malformed_json)? {
            Value::Bool(b) => self.value = b,
            Value::Null => self.value = false,
            _ => return Err(invalid_json(Self::TYPE_NAME, json)),
        }
        Ok(())
    }

    fn to_json(&self) -> Result<String> {
        Ok(self.value.to_string())
    }

    fn decode_text(&mut self, dec: &mut TextDecoder<'_>) -> Result<()> {
        decode_value_text(dec, Self::TYPE_NAME, |d| {
            self.value = d.read_bool()?;
            Ok(())
        })
    }

    fn encode_text(&self, enc: &mut TextEncoder) -> Result<()> {
        if self.value {
            enc.put_bool("value", true);
        }
        Ok(())
    }
}

impl MessageType for BoolValue {
    const TYPE_NAME: &'static str = "google.protobuf.BoolValue";
}

/// `google.protobuf.DoubleValue`. Non-finite values use the JSON strings
/// `"NaN"`, `"Infinity"` and `"-Infinity"`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DoubleValue {
    pub value: f64,
}

impl DoubleValue {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl Message for DoubleValue {
    fn encode_to(&self, buf: &mut BytesMut) -> Result<()> {
        if self.value != 0.0 || self.value.is_sign_negative() {
            wire::encode_double_field(1, self.value, buf);
        }
        Ok(())
    }

    fn merge(&mut self, buf: Bytes) -> Result<()> {
        merge_value_field(buf, WireType::Fixed64, |b| {
            self.value = wire::decode_double(b)?;
            Ok(())
        })
    }

    fn merge_json(&mut self, json: &str) -> Result<()> {
        let parsed = match serde_json::from_str::<Value>(json).map_err(malformed_json)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => match s.as_str() {
                "NaN" => Some(f64::NAN),
                "Infinity" => Some(f64::INFINITY),
                "-Infinity" => Some(f64::NEG_INFINITY),
                other => other.parse::<f64>().ok(),
            },
            Value::Null => Some(0.0),
            _ => None,
        };
        self.value = parsed.ok_or_else(|| invalid_json(Self::TYPE_NAME, json))?;
        Ok(())
    }

    fn to_json(&self) -> Result<String> {
        if self.value.is_nan() {
            Ok("\"NaN\"".into())
        } else if self.value == f64::INFINITY {
            Ok("\"Infinity\"".into())
        } else if self.value == f64::NEG_INFINITY {
            Ok("\"-Infinity\"".into())
        } else {
            serde_json::to_string(&self.value).map_err(encoding_error)
        }
    }

    fn decode_text(&mut self, dec: &mut TextDecoder<'_>) -> Result<()> {
        decode_value_text(dec, Self::TYPE_NAME, |d| {
            self.value = d.read_f64()?;
            Ok(())
        })
    }

    fn encode_text(&self, enc: &mut TextEncoder) -> Result<()> {
        if self.value != 0.0 || self.value.is_sign_negative() {
            enc.put_f64("value", self.value);
        }
        Ok(())
    }
}

impl MessageType for DoubleValue {
    const TYPE_NAME: &'static str = "google.protobuf.DoubleValue";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn int64_json_forms() {
        assert_eq!(Int64Value::from_json("\"-12\"").unwrap(), Int64Value::new(-12));
        assert_eq!(Int64Value::from_json("12").unwrap(), Int64Value::new(12));
        assert_eq!(Int64Value::new(9).to_json().unwrap(), "\"9\"");
        assert!(Int64Value::from_json("\"x\"").is_err());
    }

    #[test]
    fn double_special_values() {
        assert!(DoubleValue::from_json("\"NaN\"").unwrap().value.is_nan());
        assert_eq!(DoubleValue::new(f64::NEG_INFINITY).to_json().unwrap(), "\"-Infinity\"");
        assert_eq!(DoubleValue::from_json("2.5").unwrap(), DoubleValue::new(2.5));
    }

    #[test]
    fn binary_round_trips() {
        let s = StringValue::new("hello");
        assert_eq!(StringValue::decode(s.encode_to_bytes().unwrap()).unwrap(), s);
        let i = Int64Value::new(-1);
        assert_eq!(Int64Value::decode(i.encode_to_bytes().unwrap()).unwrap(), i);
        let b = BoolValue::new(true);
        assert_eq!(BoolValue::decode(b.encode_to_bytes().unwrap()).unwrap(), b);
        let d = DoubleValue::new(-0.25);
        assert_eq!(DoubleValue::decode(d.encode_to_bytes().unwrap()).unwrap(), d);
    }

    #[test]
    fn wrong_wire_type_rejected() {
        let mut buf = BytesMut::new();
        wire::encode_varint_field(1, 5, &mut buf);
        let err = StringValue::decode(buf.freeze()).unwrap_err();
        assert_eq!(err.code().as_str(), "BINARY_DECODING");
    }

    #[test]
    fn bool_rejects_string_json() {
        assert_eq!(
            BoolValue::from_json("\"true\"").unwrap_err().code().as_str(),
            "JSON_DECODING"
        );
    }
}
