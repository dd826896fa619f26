//! JSON form of the Any container: `{"@type": <url>, ...}`.

use super::{AnyMessage, Payload};
use crate::error::{ProtoboxError, Result};
use crate::message::DynMessage;
use crate::protocol::json as json_codec;
use crate::registry::Registry;

impl AnyMessage {
    /// Split the object into `@type` and a deferred body. No payload decoding
    /// happens here.
    pub(super) fn merge_json_any(&mut self, json: &str) -> Result<()> {
        let obj = json_codec::split_any_object(json)?;
        match obj.type_url {
            Some(url) => {
                tracing::trace!(type_url = %url, "deferring Any JSON body");
                self.type_url = Some(url);
                self.payload = Payload::RawJson(obj.fragment);
                Ok(())
            }
            None if obj.fragment.is_empty() => Ok(()),
            None => Err(ProtoboxError::MalformedAnyField(
                "JSON object has fields but no \"@type\"".into(),
            )),
        }
    }

    pub(super) fn render_json(&self) -> Result<String> {
        let Some(url) = self.type_url.as_deref() else {
            return Ok("{}".into());
        };
        match &self.payload {
            Payload::Empty => json_codec::render_any_object(url, ""),
            Payload::RawJson(fragment) => json_codec::render_any_object(url, fragment),
            Payload::Held(msg) => render_held(url, msg.as_ref()),
            Payload::RawBinary(_) => {
                let msg = self.decode_registered(Registry::global())?;
                render_held(url, msg.as_ref())
            }
        }
    }
}

fn render_held(url: &str, msg: &dyn DynMessage) -> Result<String> {
    let json = msg.to_json()?;
    if Registry::global().is_well_known_type(msg.type_name()) {
        json_codec::render_any_object(url, &format!("\"value\":{json}"))
    } else {
        json_codec::render_any_object(url, json_codec::object_body(&json)?)
    }
}
