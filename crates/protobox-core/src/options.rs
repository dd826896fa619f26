//! Decoding options.

use serde::Deserialize;

use crate::error::{ProtoboxError, Result};

/// Limits applied while decoding text format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecodeOptions {
    /// Maximum number of nested message scopes (verbose Any levels included).
    #[serde(default = "default_message_depth_limit")]
    pub message_depth_limit: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            message_depth_limit: default_message_depth_limit(),
        }
    }
}

impl DecodeOptions {
    pub fn validate(&self) -> Result<()> {
        if !(1..=1000).contains(&self.message_depth_limit) {
            return Err(ProtoboxError::Config(
                "decode.message_depth_limit must be between 1 and 1000".into(),
            ));
        }
        Ok(())
    }
}

fn default_message_depth_limit() -> usize {
    100
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(DecodeOptions::default().validate().is_ok());
    }

    #[test]
    fn zero_depth_rejected() {
        let opts = DecodeOptions {
            message_depth_limit: 0,
        };
        assert_eq!(opts.validate().unwrap_err().code().as_str(), "CONFIG");
    }
}
