#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use protobox_cli::config;
use protobox_cli::convert::Format;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
decode:
  message_depth_limt: 10 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "CONFIG");
}

#[test]
fn unknown_format_rejected() {
    let bad = r#"
version: 1
convert:
  from: yaml
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "CONFIG");
}

#[test]
fn unsupported_version_rejected() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.code().as_str(), "CONFIG");
}

#[test]
fn depth_limit_range_checked() {
    let bad = r#"
version: 1
decode:
  message_depth_limit: 0
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "CONFIG");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.decode.message_depth_limit, 100);
    assert_eq!(cfg.convert.from, Format::Json);
    assert_eq!(cfg.convert.to, Format::Text);
}

#[test]
fn ok_full_config() {
    let ok = r#"
version: 1
decode:
  message_depth_limit: 16
convert:
  from: binary
  to: json
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.decode.message_depth_limit, 16);
    assert_eq!(cfg.convert.from, Format::Binary);
    assert_eq!(cfg.convert.to, Format::Json);
}
