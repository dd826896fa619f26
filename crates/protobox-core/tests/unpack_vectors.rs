//! Any decode/unpack vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;

use bytes::Bytes;

use protobox_core::protocol::text::decode_text_with;
use protobox_core::wkt::{Duration, StringValue};
use protobox_core::{AnyMessage, DecodeOptions, Message, MessageType, Registry, Result};

mod vector_loader;
use fixtures::{fixture_registry, Foo, Sample};
use vector_loader::TestVector;

fn load(name: &str) -> TestVector {
    let s = fs::read_to_string(format!("tests/vectors/{name}")).unwrap();
    serde_json::from_str(&s).unwrap()
}

fn decode_source(v: &TestVector, registry: &Registry) -> Result<AnyMessage> {
    match v.source.format.as_str() {
        "binary" => AnyMessage::decode(Bytes::from(v.source.binary())),
        "json" => AnyMessage::from_json(&v.source.data),
        "text" => decode_text_with(&v.source.data, registry, DecodeOptions::default()),
        other => panic!("unknown source format {other}"),
    }
}

fn unpack_as<M: MessageType>(any: &AnyMessage) -> Result<String> {
    any.unpack::<M>()?.to_json()
}

fn unpack_target(any: &AnyMessage, target: &str) -> Result<String> {
    if target == Duration::TYPE_NAME {
        unpack_as::<Duration>(any)
    } else if target == AnyMessage::TYPE_NAME {
        unpack_as::<AnyMessage>(any)
    } else if target == StringValue::TYPE_NAME {
        unpack_as::<StringValue>(any)
    } else if target == Foo::TYPE_NAME {
        unpack_as::<Foo>(any)
    } else if target == Sample::TYPE_NAME {
        unpack_as::<Sample>(any)
    } else {
        panic!("no fixture for target {target}")
    }
}

#[test]
fn unpack_vectors() {
    let files = [
        "any_json_duration.json",
        "any_json_duration_extra_key.json",
        "any_json_duration_wrong_key.json",
        "any_json_sample_nested.json",
        "any_json_type_mismatch.json",
        "any_json_empty.json",
        "any_binary_duration.json",
        "any_binary_noslash.json",
        "any_binary_truncated_value.json",
        "any_binary_sample.json",
        "any_binary_type_only.json",
        "any_text_nested_any.json",
        "any_text_unknown_type.json",
        "any_text_extra_key.json",
        "any_text_plain_fields.json",
    ];
    let registry = fixture_registry();

    for f in files {
        let v = load(f);
        let res = decode_source(&v, &registry).and_then(|any| unpack_target(&any, &v.target));

        if let Some(err) = v.expect_error {
            let e = res.expect_err("expected error");
            assert_eq!(e.code().as_str(), err.code, "vector={}", v.description);
            continue;
        }

        let json = res.unwrap_or_else(|e| panic!("vector={}: {e}", v.description));
        let got: serde_json::Value = serde_json::from_str(&json).unwrap();
        let ex = v.expect.expect("missing expect block");
        assert_eq!(got, ex, "vector={}", v.description);
    }
}
