//! Message capability contract.
//!
//! Anything that can be boxed in an [`crate::AnyMessage`] implements
//! [`Message`] (object-safe codec hooks) and [`MessageType`] (static identity
//! and construction). [`DynMessage`] is blanket-implemented on top and is what
//! the container stores for held payloads.

use std::any::Any;
use std::fmt;

use bytes::{Bytes, BytesMut};

use crate::error::Result;
use crate::protocol::text::{TextDecoder, TextEncoder};

/// Codec hooks of a message value.
pub trait Message: fmt::Debug + Send + Sync + 'static {
    /// Append the binary encoding of `self` to `buf`.
    fn encode_to(&self, buf: &mut BytesMut) -> Result<()>;

    /// Merge binary-encoded fields from `buf` into `self`.
    ///
    /// An empty buffer is a valid no-op merge.
    fn merge(&mut self, buf: Bytes) -> Result<()>;

    /// Merge the message's JSON form into `self`.
    ///
    /// Ordinary messages receive a complete JSON object. Well-known types
    /// receive their bespoke form (e.g. `"3.5s"` for a duration).
    fn merge_json(&mut self, json: &str) -> Result<()>;

    /// Render the message's JSON form (mirror of [`Message::merge_json`]).
    fn to_json(&self) -> Result<String>;

    /// Decode text-format fields until the decoder reports the end of the
    /// current scope.
    fn decode_text(&mut self, dec: &mut TextDecoder<'_>) -> Result<()>;

    /// Emit text-format fields.
    fn encode_text(&self, enc: &mut TextEncoder) -> Result<()>;

    /// Binary encoding as a standalone buffer.
    fn encode_to_bytes(&self) -> Result<Bytes> {
        let mut buf = BytesMut::new();
        self.encode_to(&mut buf)?;
        Ok(buf.freeze())
    }
}

/// Concrete message type with a static fully-qualified name.
pub trait MessageType: Message + Default + Clone + PartialEq + Sized {
    /// Fully-qualified type name, e.g. `google.protobuf.Duration`.
    const TYPE_NAME: &'static str;

    /// Construct a fresh value from its JSON form.
    fn from_json(json: &str) -> Result<Self> {
        let mut msg = Self::default();
        msg.merge_json(json)?;
        Ok(msg)
    }

    /// Decode a fresh value from binary.
    fn decode(buf: Bytes) -> Result<Self> {
        let mut msg = Self::default();
        msg.merge(buf)?;
        Ok(msg)
    }
}

/// Type-erased view over any [`MessageType`].
pub trait DynMessage: Message {
    /// Fully-qualified type name of the concrete value.
    fn type_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn clone_box(&self) -> Box<dyn DynMessage>;
    /// Equal when `other` has the same concrete type and compares equal.
    fn eq_dyn(&self, other: &dyn DynMessage) -> bool;
}

impl<M: MessageType> DynMessage for M {
    fn type_name(&self) -> &'static str {
        M::TYPE_NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn DynMessage> {
        Box::new(self.clone())
    }

    fn eq_dyn(&self, other: &dyn DynMessage) -> bool {
        other.as_any().downcast_ref::<M>() == Some(self)
    }
}

impl Clone for Box<dyn DynMessage> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl PartialEq for dyn DynMessage {
    fn eq(&self, other: &Self) -> bool {
        self.eq_dyn(other)
    }
}
