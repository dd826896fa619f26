//! Protocol modules (binary wire, JSON fragments, text format).
//!
//! These are the codec primitives the Any container builds on:
//! - `wire`: varint / length-delimited binary fields over `bytes::Buf`.
//! - `json`: Any object splitting and lone-`value` extraction on `RawValue`.
//! - `text`: text-format scanner, scoped decoder and encoder.
//!
//! All parsers are panic-free: malformed input is reported as `ProtoboxError`
//! instead of panicking or indexing raw buffers.

pub mod json;
pub mod text;
pub mod wire;
