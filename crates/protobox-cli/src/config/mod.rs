//! CLI config loader (strict parsing).

pub mod schema;

use std::fs;

use protobox_core::error::{ProtoboxError, Result};

pub use schema::{CliConfig, ConvertSection};

pub fn load_from_file(path: &str) -> Result<CliConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| ProtoboxError::Config(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<CliConfig> {
    let cfg: CliConfig = serde_yaml::from_str(s)
        .map_err(|e| ProtoboxError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
