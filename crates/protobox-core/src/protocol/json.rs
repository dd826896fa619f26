//! JSON fragments for Any (lazy `RawValue` handling).
//!
//! An Any's JSON object is `{"@type": <url>, ...}`. The decoder keeps every
//! key other than `@type` as raw JSON text, in input order, so the payload can
//! be decoded later once the caller names a concrete type.

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, IgnoredAny, MapAccess, Visitor};
use serde_json::value::RawValue;

use crate::error::{malformed_json, JsonDecodingError, ProtoboxError, Result};

/// Key carrying the type URL inside an Any JSON object.
pub const TYPE_KEY: &str = "@type";

/// Any JSON object split into its type URL and the remaining object body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnyObject {
    pub type_url: Option<String>,
    /// Object body without the enclosing braces and without `@type`.
    pub fragment: String,
}

impl<'de> Deserialize<'de> for AnyObject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(AnyObjectVisitor)
    }
}

struct AnyObjectVisitor;

impl<'de> Visitor<'de> for AnyObjectVisitor {
    type Value = AnyObject;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<AnyObject, A::Error> {
        let mut type_url = None;
        let mut fragment = String::new();
        while let Some(key) = map.next_key::<String>()? {
            if key == TYPE_KEY {
                if type_url.is_some() {
                    return Err(de::Error::duplicate_field(TYPE_KEY));
                }
                type_url = Some(map.next_value::<String>()?);
                continue;
            }
            let value: Box<RawValue> = map.next_value()?;
            if !fragment.is_empty() {
                fragment.push(',');
            }
            fragment.push_str(&serde_json::to_string(&key).map_err(de::Error::custom)?);
            fragment.push(':');
            fragment.push_str(value.get());
        }
        Ok(AnyObject { type_url, fragment })
    }
}

/// Parse an Any JSON object. Content after the closing brace is rejected.
pub fn split_any_object(text: &str) -> Result<AnyObject> {
    let mut de = serde_json::Deserializer::from_str(text);
    let obj = AnyObject::deserialize(&mut de).map_err(malformed_json)?;
    de.end()
        .map_err(|_| ProtoboxError::JsonDecoding(JsonDecodingError::TrailingGarbage))?;
    Ok(obj)
}

/// Re-wrap an object body into a full JSON object.
pub fn wrap_object(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len() + 2);
    out.push('{');
    out.push_str(fragment);
    out.push('}');
    out
}

/// Parse exactly one JSON object from `text`; trailing content is
/// [`JsonDecodingError::TrailingGarbage`].
pub fn parse_exact_object(text: &str) -> Result<&RawValue> {
    let mut de = serde_json::Deserializer::from_str(text);
    let raw = <&RawValue>::deserialize(&mut de).map_err(malformed_json)?;
    de.end()
        .map_err(|_| ProtoboxError::JsonDecoding(JsonDecodingError::TrailingGarbage))?;
    if !raw.get().starts_with('{') {
        return Err(ProtoboxError::JsonDecoding(JsonDecodingError::Malformed(
            "expected a JSON object".into(),
        )));
    }
    Ok(raw)
}

/// Body of a rendered JSON object, without braces and surrounding whitespace.
pub fn object_body(object: &str) -> Result<&str> {
    object
        .trim()
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .map(str::trim)
        .ok_or_else(|| ProtoboxError::JsonEncoding(format!("expected a JSON object, got {object}")))
}

/// Render `{"@type":<url>,<body>}`.
pub fn render_any_object(type_url: &str, body: &str) -> Result<String> {
    let url = serde_json::to_string(type_url)
        .map_err(|e| ProtoboxError::JsonEncoding(e.to_string()))?;
    let mut out = format!("{{\"{TYPE_KEY}\":{url}");
    if !body.is_empty() {
        out.push(',');
        out.push_str(body);
    }
    out.push('}');
    Ok(out)
}

/// Outcome of reading an object that should hold a single `"value"` key.
enum LoneValue {
    Value(Box<RawValue>),
    Missing,
    UnexpectedKey(String),
    ExtraKey(String),
}

struct LoneValueVisitor;

impl<'de> Visitor<'de> for LoneValueVisitor {
    type Value = LoneValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object with a single \"value\" key")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<LoneValue, A::Error> {
        let Some(key) = map.next_key::<String>()? else {
            return Ok(LoneValue::Missing);
        };
        let value: Box<RawValue> = map.next_value()?;
        let mut outcome = if key == "value" {
            LoneValue::Value(value)
        } else {
            LoneValue::UnexpectedKey(key)
        };
        // Drain the rest so the tokenizer can close the object cleanly.
        while let Some(extra) = map.next_key::<String>()? {
            map.next_value::<IgnoredAny>()?;
            if matches!(outcome, LoneValue::Value(_)) {
                outcome = LoneValue::ExtraKey(extra);
            }
        }
        Ok(outcome)
    }
}

/// Extract the raw JSON of the lone `"value"` pair in `fragment`.
///
/// Well-known types carry exactly one logical field in their Any form, so any
/// other key, a second key, or content after the pair is
/// [`ProtoboxError::MalformedWellKnownTypeJson`].
pub fn extract_lone_value(fragment: &str) -> Result<Box<RawValue>> {
    let wrapped = wrap_object(fragment);
    let mut de = serde_json::Deserializer::from_str(&wrapped);
    let outcome = (&mut de).deserialize_map(LoneValueVisitor).map_err(malformed_json)?;
    if de.end().is_err() {
        return Err(ProtoboxError::MalformedWellKnownTypeJson(
            "trailing content after \"value\"".into(),
        ));
    }
    match outcome {
        LoneValue::Value(v) => Ok(v),
        LoneValue::Missing => Err(ProtoboxError::MalformedWellKnownTypeJson(
            "missing \"value\" key".into(),
        )),
        LoneValue::UnexpectedKey(k) => Err(ProtoboxError::MalformedWellKnownTypeJson(format!(
            "expected \"value\", found {k:?}"
        ))),
        LoneValue::ExtraKey(k) => Err(ProtoboxError::MalformedWellKnownTypeJson(format!(
            "unexpected key {k:?} after \"value\""
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn split_keeps_order_and_nesting() {
        let obj = split_any_object(
            r#"{"fieldA":1,"@type":"type.googleapis.com/pkg.Foo","nested":{"a":[1,{"b":2}]},"fieldB":"x"}"#,
        )
        .unwrap();
        assert_eq!(obj.type_url.as_deref(), Some("type.googleapis.com/pkg.Foo"));
        assert_eq!(obj.fragment, r#""fieldA":1,"nested":{"a":[1,{"b":2}]},"fieldB":"x""#);
    }

    #[test]
    fn split_empty_object() {
        let obj = split_any_object("{}").unwrap();
        assert!(obj.type_url.is_none());
        assert!(obj.fragment.is_empty());
    }

    #[test]
    fn split_rejects_duplicate_type_and_trailing() {
        assert!(split_any_object(r#"{"@type":"a/b","@type":"a/c"}"#).is_err());
        let err = split_any_object(r#"{"@type":"a/b"} x"#).unwrap_err();
        assert!(matches!(
            err,
            ProtoboxError::JsonDecoding(JsonDecodingError::TrailingGarbage)
        ));
    }

    #[test]
    fn exact_object_detects_trailing_garbage() {
        let wrapped = wrap_object(r#""a":1},{"b":2"#);
        let err = parse_exact_object(&wrapped).unwrap_err();
        assert!(matches!(
            err,
            ProtoboxError::JsonDecoding(JsonDecodingError::TrailingGarbage)
        ));
    }

    #[test]
    fn lone_value_variants() {
        assert_eq!(extract_lone_value(r#""value":"3.5s""#).unwrap().get(), r#""3.5s""#);
        let cases = [
            r#""value":"3.5s","extra":1"#,
            r#""other":1"#,
            "",
            r#""value":1},{"x":2"#,
        ];
        for c in cases {
            let err = extract_lone_value(c).unwrap_err();
            assert_eq!(err.code().as_str(), "MALFORMED_WELL_KNOWN_TYPE_JSON", "case={c}");
        }
    }

    #[test]
    fn render_splices_body() {
        assert_eq!(
            render_any_object("t/pkg.Foo", r#""a":1"#).unwrap(),
            r#"{"@type":"t/pkg.Foo","a":1}"#
        );
        assert_eq!(render_any_object("t/pkg.Foo", "").unwrap(), r#"{"@type":"t/pkg.Foo"}"#);
        assert_eq!(object_body(" { \"a\": 1 } ").unwrap(), "\"a\": 1");
        assert!(object_body("[1]").is_err());
    }
}
