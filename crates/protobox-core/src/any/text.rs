//! Text form of the Any container.
//!
//! Verbose form: `[<type-url>] { <message text> }`, decoded eagerly through
//! the decoder's registry. Plain form: `type_url: "..." value: "<bytes>"`.

use bytes::Bytes;

use super::{AnyMessage, Payload, ANY_TYPE_NAME};
use crate::error::{ProtoboxError, Result};
use crate::message::{DynMessage, Message};
use crate::protocol::text::{TextDecoder, TextEncoder};
use crate::registry::Registry;
use crate::type_url;

impl AnyMessage {
    pub(super) fn decode_text_any(&mut self, dec: &mut TextDecoder<'_>) -> Result<()> {
        let Some(url) = dec.next_type_url()? else {
            return self.decode_text_fields(dec);
        };
        let encoded = type_url::parse_type_name(&url);
        if encoded.is_empty() {
            return Err(ProtoboxError::MalformedText(format!(
                "malformed type url in verbose Any: {url}"
            )));
        }
        dec.begin_object()?;

        let held: Box<dyn DynMessage> = if encoded == ANY_TYPE_NAME {
            let mut nested = AnyMessage::default();
            nested.decode_text(dec)?;
            Box::new(nested)
        } else {
            // Text grammar is type dependent, so unknown types cannot be deferred.
            let desc = dec.registry().lookup(encoded).ok_or_else(|| {
                ProtoboxError::MalformedText(format!("unknown type in verbose Any: {url}"))
            })?;
            let mut msg = desc.new_message();
            msg.decode_text(dec)?;
            msg
        };
        tracing::trace!(type_url = %url, depth = dec.depth(), "decoded verbose Any");

        if let Some(extra) = dec.next_field_name()? {
            return Err(ProtoboxError::MalformedText(format!(
                "unexpected field {extra:?} after verbose Any value"
            )));
        }
        self.type_url = Some(url);
        self.payload = Payload::Held(held);
        Ok(())
    }

    fn decode_text_fields(&mut self, dec: &mut TextDecoder<'_>) -> Result<()> {
        let previous_url = self.type_url.clone();
        let mut value = None;
        while let Some(name) = dec.next_field_name()? {
            match name.as_str() {
                "type_url" => self.type_url = Some(dec.read_string()?),
                "value" => value = Some(Bytes::from(dec.read_bytes()?)),
                other => {
                    return Err(ProtoboxError::MalformedText(format!(
                        "unknown field {other:?} in google.protobuf.Any"
                    )))
                }
            }
        }
        self.settle_merged_value(previous_url, value)
    }

    pub(super) fn encode_text_any(&self, enc: &mut TextEncoder) -> Result<()> {
        let Some(url) = self.type_url.as_deref() else {
            return Ok(());
        };
        match &self.payload {
            Payload::Held(msg) => write_verbose(enc, url, msg.as_ref()),
            Payload::Empty => {
                enc.put_string("type_url", url);
                Ok(())
            }
            Payload::RawBinary(bytes) => match self.decode_registered(Registry::global()) {
                Ok(msg) => write_verbose(enc, url, msg.as_ref()),
                Err(
                    ProtoboxError::AnyTypeUrlNotRegistered(_)
                    | ProtoboxError::MalformedTypeUrl(_)
                    | ProtoboxError::BinaryDecoding(_),
                ) => {
                    // Opaque bytes stay printable in the plain form.
                    enc.put_string("type_url", url);
                    enc.put_bytes("value", bytes);
                    Ok(())
                }
                Err(e) => Err(e),
            },
            Payload::RawJson(_) => {
                let msg = self.decode_registered(Registry::global())?;
                write_verbose(enc, url, msg.as_ref())
            }
        }
    }
}

fn write_verbose(enc: &mut TextEncoder, url: &str, msg: &dyn DynMessage) -> Result<()> {
    enc.start_type_url(url);
    msg.encode_text(enc)?;
    enc.end_object();
    Ok(())
}
