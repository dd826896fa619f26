#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use protobox_cli::convert::{convert, Format};
use protobox_core::{DecodeOptions, Registry};

#[test]
fn json_to_text_and_back() {
    let registry = Registry::with_well_known_types();
    let json = r#"{"@type":"type.googleapis.com/google.protobuf.StringValue","value":"hi"}"#;

    let text = convert(Format::Json, Format::Text, json, &registry, DecodeOptions::default())
        .expect("json -> text");
    assert!(
        text.starts_with("[type.googleapis.com/google.protobuf.StringValue]"),
        "text={text}"
    );

    let back = convert(Format::Text, Format::Json, &text, &registry, DecodeOptions::default())
        .expect("text -> json");
    assert_eq!(back, json);
}

#[test]
fn text_depth_limit_from_config() {
    let registry = Registry::with_well_known_types();
    let text = "[type.googleapis.com/google.protobuf.Any] { [type.googleapis.com/google.protobuf.Any] { } }";
    let options = DecodeOptions {
        message_depth_limit: 1,
    };
    let err = convert(Format::Text, Format::Json, text, &registry, options).unwrap_err();
    assert_eq!(err.code().as_str(), "MALFORMED_TEXT");
}
