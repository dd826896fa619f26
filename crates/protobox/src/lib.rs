//! Top-level facade crate for protobox.
//!
//! Re-exports the core container types and the CLI library so users can depend on a single crate.

pub mod core {
    pub use protobox_core::*;
}

pub mod cli {
    pub use protobox_cli::*;
}

pub use protobox_core::{AnyMessage, Message, MessageType, ProtoboxError, Registry, Result};
