//! The boxed message container (`google.protobuf.Any`).
//!
//! An [`AnyMessage`] holds a type URL and at most one payload representation.
//! Payloads produced by decoding stay in their wire form until
//! [`AnyMessage::unpack_to`] is called with a concrete target type; a packed
//! message is held as a value and handed back without a codec round trip.

mod json;
mod text;

use bytes::{Buf, Bytes, BytesMut};

use crate::error::{ProtoboxError, Result};
use crate::message::{DynMessage, Message, MessageType};
use crate::protocol::json as json_codec;
use crate::protocol::text::{TextDecoder, TextEncoder};
use crate::protocol::wire::{self, WireType};
use crate::registry::Registry;
use crate::type_url::{self, DEFAULT_TYPE_PREFIX};

/// Fully-qualified name of the container type itself.
pub const ANY_TYPE_NAME: &str = "google.protobuf.Any";

const TYPE_URL_FIELD: u32 = 1;
const VALUE_FIELD: u32 = 2;

/// Payload representation. At most one is ever present.
#[derive(Debug, Clone, Default)]
pub enum Payload {
    #[default]
    Empty,
    /// Message value from pack or eager text decoding.
    Held(Box<dyn DynMessage>),
    /// Binary encoding, decoded on unpack.
    RawBinary(Bytes),
    /// JSON object body without braces and without `@type`, decoded on unpack.
    RawJson(String),
}

impl PartialEq for Payload {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Payload::Empty, Payload::Empty) => true,
            (Payload::Held(a), Payload::Held(b)) => a.eq_dyn(b.as_ref()),
            (Payload::RawBinary(a), Payload::RawBinary(b)) => a == b,
            (Payload::RawJson(a), Payload::RawJson(b)) => a == b,
            _ => false,
        }
    }
}

/// Boxed message: type URL plus a lazily decoded payload.
///
/// Equality compares the URL and the payload representation as stored; a
/// packed message and its binary encoding are not equal until unpacked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnyMessage {
    type_url: Option<String>,
    payload: Payload,
}

impl AnyMessage {
    /// Empty Any (no type URL, no payload).
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap `msg` under the default `type.googleapis.com` prefix.
    pub fn pack<M: MessageType>(msg: M) -> Self {
        Self::pack_with_prefix(msg, DEFAULT_TYPE_PREFIX)
    }

    /// Wrap `msg` without serializing it.
    pub fn pack_with_prefix<M: MessageType>(msg: M, prefix: &str) -> Self {
        Self {
            type_url: Some(type_url::build(M::TYPE_NAME, prefix)),
            payload: Payload::Held(Box::new(msg)),
        }
    }

    /// Any carrying an already-encoded binary value.
    pub fn from_binary(type_url: impl Into<String>, value: Bytes) -> Self {
        Self {
            type_url: Some(type_url.into()),
            payload: Payload::RawBinary(value),
        }
    }

    /// Any carrying a JSON object body (no braces, no `@type`).
    pub fn from_json_fragment(type_url: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            type_url: Some(type_url.into()),
            payload: Payload::RawJson(fragment.into()),
        }
    }

    /// Any with a type URL and no payload. Unpacking it fails.
    pub fn with_type_url(type_url: impl Into<String>) -> Self {
        Self {
            type_url: Some(type_url.into()),
            payload: Payload::Empty,
        }
    }

    pub fn type_url(&self) -> Option<&str> {
        self.type_url.as_deref()
    }

    /// Type name embedded in the URL, if the URL is present and well formed.
    pub fn encoded_type_name(&self) -> Option<&str> {
        self.type_url
            .as_deref()
            .map(type_url::parse_type_name)
            .filter(|name| !name.is_empty())
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// No type URL and no payload.
    pub fn is_empty(&self) -> bool {
        self.type_url.is_none() && matches!(self.payload, Payload::Empty)
    }

    /// Whether the URL names `M`. Does not decode anything.
    pub fn is<M: MessageType>(&self) -> bool {
        self.encoded_type_name() == Some(M::TYPE_NAME)
    }

    /// Unpack into a fresh default `M`.
    pub fn unpack<M: MessageType>(&self) -> Result<M> {
        let mut target = M::default();
        self.unpack_to(&mut target)?;
        Ok(target)
    }

    /// Unpack into `target`.
    ///
    /// Held values of type `M` are cloned directly. Binary payloads are merged
    /// into `target`; JSON payloads are merged as an object, or for well-known
    /// types replace `target` from the lone `"value"`. On error the contents
    /// of `target` are unspecified.
    pub fn unpack_to<M: MessageType>(&self, target: &mut M) -> Result<()> {
        let encoded = self.checked_type_name()?;
        if encoded != M::TYPE_NAME {
            return Err(ProtoboxError::TypeMismatch {
                expected: M::TYPE_NAME.into(),
                found: encoded.into(),
            });
        }

        match &self.payload {
            Payload::Held(msg) => {
                if let Some(held) = msg.as_any().downcast_ref::<M>() {
                    tracing::trace!(type_name = encoded, "unpack fast path");
                    *target = held.clone();
                    return Ok(());
                }
                tracing::warn!(
                    type_name = encoded,
                    "held message is a different type with the same name; re-encoding"
                );
                target.merge(msg.encode_to_bytes()?)
            }
            Payload::RawBinary(bytes) => {
                tracing::trace!(type_name = encoded, len = bytes.len(), "unpack binary");
                target.merge(bytes.clone())
            }
            Payload::RawJson(fragment) => {
                tracing::trace!(type_name = encoded, "unpack json");
                if Registry::global().is_well_known_type(M::TYPE_NAME) {
                    let value = json_codec::extract_lone_value(fragment)?;
                    *target = M::from_json(value.get())?;
                    Ok(())
                } else {
                    merge_json_object(target, fragment)
                }
            }
            Payload::Empty => Err(ProtoboxError::MalformedAnyField(
                "type url is set but no payload is present".into(),
            )),
        }
    }

    /// URL present and carrying a type name.
    fn checked_type_name(&self) -> Result<&str> {
        let url = self
            .type_url
            .as_deref()
            .ok_or(ProtoboxError::EmptyAnyField)?;
        let name = type_url::parse_type_name(url);
        if name.is_empty() {
            return Err(ProtoboxError::MalformedTypeUrl(url.into()));
        }
        Ok(name)
    }

    /// Binary value field of the container, `None` when no payload is set.
    fn value_bytes(&self) -> Result<Option<Bytes>> {
        match &self.payload {
            Payload::Empty => Ok(None),
            Payload::RawBinary(bytes) => Ok(Some(bytes.clone())),
            Payload::Held(msg) => msg.encode_to_bytes().map(Some),
            Payload::RawJson(_) => self
                .decode_registered(Registry::global())?
                .encode_to_bytes()
                .map(Some),
        }
    }

    /// Finish a binary or plain-text merge.
    ///
    /// A merged `value` replaces the payload. Without one, the payload keeps
    /// its bytes: a held or JSON payload is re-encoded under its previous URL
    /// when the URL changed, so it never survives as a typed value under a
    /// different name. A URL with no payload at all denotes the empty
    /// encoding of its type.
    pub(super) fn settle_merged_value(
        &mut self,
        previous_url: Option<String>,
        value: Option<Bytes>,
    ) -> Result<()> {
        if let Some(value) = value {
            self.payload = Payload::RawBinary(value);
            return Ok(());
        }
        if self.type_url.is_none() {
            return Ok(());
        }
        let url_changed = self.type_url != previous_url;
        match self.payload {
            Payload::Empty => self.payload = Payload::RawBinary(Bytes::new()),
            Payload::Held(_) | Payload::RawJson(_) if url_changed => {
                let previous = AnyMessage {
                    type_url: previous_url,
                    payload: std::mem::take(&mut self.payload),
                };
                tracing::debug!(
                    from = previous.type_url.as_deref().unwrap_or_default(),
                    to = self.type_url.as_deref().unwrap_or_default(),
                    "type url replaced by merge; payload kept as bytes"
                );
                self.payload = Payload::RawBinary(previous.value_bytes()?.unwrap_or_default());
            }
            _ => {}
        }
        Ok(())
    }

    /// Decode a lazily held payload through `registry`.
    fn decode_registered(&self, registry: &Registry) -> Result<Box<dyn DynMessage>> {
        if let Payload::Held(held) = &self.payload {
            return Ok(held.clone());
        }
        let encoded = self.checked_type_name()?;
        let mut msg: Box<dyn DynMessage> = if encoded == ANY_TYPE_NAME {
            Box::new(AnyMessage::default())
        } else {
            registry
                .lookup(encoded)
                .ok_or_else(|| {
                    ProtoboxError::AnyTypeUrlNotRegistered(self.type_url.clone().unwrap_or_default())
                })?
                .new_message()
        };
        match &self.payload {
            Payload::Held(_) => {}
            Payload::RawBinary(bytes) => msg.merge(bytes.clone())?,
            Payload::RawJson(fragment) => {
                if registry.is_well_known_type(encoded) {
                    let value = json_codec::extract_lone_value(fragment)?;
                    msg.merge_json(value.get())?;
                } else {
                    merge_json_object(msg.as_mut(), fragment)?;
                }
            }
            Payload::Empty => {
                return Err(ProtoboxError::MalformedAnyField(
                    "type url is set but no payload is present".into(),
                ))
            }
        }
        Ok(msg)
    }
}

/// Re-wrap an object body and merge it as an ordinary JSON object.
fn merge_json_object<T: Message + ?Sized>(target: &mut T, fragment: &str) -> Result<()> {
    let object = json_codec::wrap_object(fragment);
    let raw = json_codec::parse_exact_object(&object)?;
    target.merge_json(raw.get())
}

impl Message for AnyMessage {
    fn encode_to(&self, buf: &mut BytesMut) -> Result<()> {
        if let Some(url) = self.type_url.as_deref().filter(|u| !u.is_empty()) {
            wire::encode_string_field(TYPE_URL_FIELD, url, buf);
        }
        let Some(value) = self.value_bytes()? else {
            return Ok(());
        };
        if !value.is_empty() {
            wire::encode_bytes_field(VALUE_FIELD, &value, buf);
        }
        Ok(())
    }

    fn merge(&mut self, mut buf: Bytes) -> Result<()> {
        let previous_url = self.type_url.clone();
        let mut value = None;
        while buf.has_remaining() {
            let (field, wire_type) = wire::decode_key(&mut buf)?;
            match field {
                TYPE_URL_FIELD => {
                    wire::check_wire_type(field, WireType::LengthDelimited, wire_type)?;
                    self.type_url = Some(wire::decode_string(&mut buf)?);
                }
                VALUE_FIELD => {
                    wire::check_wire_type(field, WireType::LengthDelimited, wire_type)?;
                    value = Some(wire::decode_length_delimited(&mut buf)?);
                }
                _ => wire::skip_field(wire_type, &mut buf)?,
            }
        }
        self.settle_merged_value(previous_url, value)
    }

    fn merge_json(&mut self, json: &str) -> Result<()> {
        self.merge_json_any(json)
    }

    fn to_json(&self) -> Result<String> {
        self.render_json()
    }

    fn decode_text(&mut self, dec: &mut TextDecoder<'_>) -> Result<()> {
        self.decode_text_any(dec)
    }

    fn encode_text(&self, enc: &mut TextEncoder) -> Result<()> {
        self.encode_text_any(enc)
    }
}

impl MessageType for AnyMessage {
    const TYPE_NAME: &'static str = ANY_TYPE_NAME;
}
