//! `google.protobuf.Duration`. JSON form: `"<seconds>[.<fraction>]s"`.

use std::fmt;

use bytes::{Buf, Bytes, BytesMut};

use crate::error::{JsonDecodingError, ProtoboxError, Result};
use crate::message::{Message, MessageType};
use crate::protocol::text::{TextDecoder, TextEncoder};
use crate::protocol::wire::{self, WireType};

/// About 10,000 years, the range every protobuf runtime accepts.
const MAX_SECONDS: i64 = 315_576_000_000;
const NANOS_PER_SECOND: u32 = 1_000_000_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Duration {
    pub seconds: i64,
    /// Same sign as `seconds` (or zero), magnitude below one second.
    pub nanos: i32,
}

impl Duration {
    pub fn new(seconds: i64, nanos: i32) -> Self {
        Self { seconds, nanos }
    }

    fn is_valid(&self) -> bool {
        (-MAX_SECONDS..=MAX_SECONDS).contains(&self.seconds)
            && self.nanos.unsigned_abs() < NANOS_PER_SECOND
            && !(self.seconds > 0 && self.nanos < 0)
            && !(self.seconds < 0 && self.nanos > 0)
    }

    /// Parse the JSON string form, e.g. `3.5s` or `-0.000001s`.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || {
            ProtoboxError::JsonDecoding(JsonDecodingError::InvalidValue(format!(
                "invalid duration {s:?}"
            )))
        };
        let body = s.strip_suffix('s').ok_or_else(invalid)?;
        let (negative, body) = match body.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, body),
        };
        let (whole, frac) = match body.split_once('.') {
            Some((w, f)) => (w, Some(f)),
            None => (body, None),
        };
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let seconds: i64 = whole.parse().map_err(|_| invalid())?;
        let nanos: i32 = match frac {
            None => 0,
            Some(f) => {
                if f.is_empty() || f.len() > 9 || !f.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid());
                }
                format!("{f:0<9}").parse().map_err(|_| invalid())?
            }
        };
        let d = if negative {
            Self::new(-seconds, -nanos)
        } else {
            Self::new(seconds, nanos)
        };
        if !d.is_valid() {
            return Err(invalid());
        }
        Ok(d)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.seconds < 0 || self.nanos < 0 { "-" } else { "" };
        let secs = self.seconds.unsigned_abs();
        let nanos = self.nanos.unsigned_abs();
        if nanos == 0 {
            write!(f, "{sign}{secs}s")
        } else if nanos % 1_000_000 == 0 {
            write!(f, "{sign}{secs}.{:03}s", nanos / 1_000_000)
        } else if nanos % 1_000 == 0 {
            write!(f, "{sign}{secs}.{:06}s", nanos / 1_000)
        } else {
            write!(f, "{sign}{secs}.{nanos:09}s")
        }
    }
}

impl Message for Duration {
    fn encode_to(&self, buf: &mut BytesMut) -> Result<()> {
        if self.seconds != 0 {
            wire::encode_varint_field(1, self.seconds as u64, buf);
        }
        if self.nanos != 0 {
            wire::encode_varint_field(2, i64::from(self.nanos) as u64, buf);
        }
        Ok(())
    }

    fn merge(&mut self, mut buf: Bytes) -> Result<()> {
        while buf.has_remaining() {
            let (field, wire_type) = wire::decode_key(&mut buf)?;
            match field {
                1 => {
                    wire::check_wire_type(field, WireType::Varint, wire_type)?;
                    self.seconds = wire::decode_varint(&mut buf)? as i64;
                }
                2 => {
                    wire::check_wire_type(field, WireType::Varint, wire_type)?;
                    self.nanos = wire::decode_varint(&mut buf)? as i32;
                }
                _ => wire::skip_field(wire_type, &mut buf)?,
            }
        }
        Ok(())
    }

    fn merge_json(&mut self, json: &str) -> Result<()> {
        let s: String = serde_json::from_str(json).map_err(|e| {
            ProtoboxError::JsonDecoding(JsonDecodingError::InvalidValue(format!(
                "duration must be a JSON string: {e}"
            )))
        })?;
        *self = Self::parse(&s)?;
        Ok(())
    }

    fn to_json(&self) -> Result<String> {
        if !self.is_valid() {
            return Err(ProtoboxError::JsonEncoding(format!(
                "duration out of range: {}s {}ns",
                self.seconds, self.nanos
            )));
        }
        Ok(format!("\"{self}\""))
    }

    fn decode_text(&mut self, dec: &mut TextDecoder<'_>) -> Result<()> {
        while let Some(name) = dec.next_field_name()? {
            match name.as_str() {
                "seconds" => self.seconds = dec.read_i64()?,
                "nanos" => self.nanos = dec.read_i32()?,
                other => {
                    return Err(ProtoboxError::MalformedText(format!(
                        "unknown field {other:?} in {}",
                        Self::TYPE_NAME
                    )))
                }
            }
        }
        Ok(())
    }

    fn encode_text(&self, enc: &mut TextEncoder) -> Result<()> {
        if self.seconds != 0 {
            enc.put_i64("seconds", self.seconds);
        }
        if self.nanos != 0 {
            enc.put_i64("nanos", i64::from(self.nanos));
        }
        Ok(())
    }
}

impl MessageType for Duration {
    const TYPE_NAME: &'static str = "google.protobuf.Duration";
}
