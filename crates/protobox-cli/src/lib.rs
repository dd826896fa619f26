//! protobox command-line library.
//!
//! Holds the strict YAML config and the format conversion used by the
//! `protobox-cli` binary, so both can be exercised from integration tests.

pub mod config;
pub mod convert;
