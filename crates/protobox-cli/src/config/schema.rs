use serde::Deserialize;

use protobox_core::error::{ProtoboxError, Result};
use protobox_core::DecodeOptions;

use crate::convert::Format;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    pub version: u32,

    #[serde(default)]
    pub decode: DecodeOptions,

    #[serde(default)]
    pub convert: ConvertSection,
}

impl CliConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ProtoboxError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }
        self.decode.validate()?;
        Ok(())
    }
}

/// Input and output formats of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConvertSection {
    #[serde(default = "default_from")]
    pub from: Format,

    #[serde(default = "default_to")]
    pub to: Format,
}

impl Default for ConvertSection {
    fn default() -> Self {
        Self {
            from: default_from(),
            to: default_to(),
        }
    }
}

fn default_from() -> Format {
    Format::Json
}
fn default_to() -> Format {
    Format::Text
}
