//! JSON test vector loader shared by the Any vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct TestVector {
    pub description: String,
    pub source: SourceData,
    /// Fully-qualified name of the unpack target.
    pub target: String,
    /// Expected JSON form of the unpacked target.
    #[serde(default)]
    pub expect: Option<serde_json::Value>,
    #[serde(default)]
    pub expect_error: Option<ExpectError>,
}

#[derive(Debug, Deserialize)]
pub struct ExpectError {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct SourceData {
    /// `binary`, `json` or `text`.
    pub format: String,
    #[serde(default)]
    pub encoding: Option<String>,
    pub data: String,
}

impl SourceData {
    pub fn binary(&self) -> Vec<u8> {
        match self.encoding.as_deref() {
            Some("hex") => hex::decode(&self.data).expect("invalid hex in test vector"),
            other => panic!("unsupported binary encoding: {other:?}"),
        }
    }
}
