//! protobox core: the boxed message container (`google.protobuf.Any`) and the
//! codec primitives it relies on.
//!
//! An [`AnyMessage`] transports an arbitrary message opaquely. Decoding from
//! binary or JSON keeps the payload in wire form until a consumer unpacks it
//! into a concrete [`MessageType`]; text decoding resolves verbose
//! `[type-url] { ... }` payloads eagerly through a [`Registry`].
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `ProtoboxError`/`Result` so malformed
//! payloads never take the process down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod any;
pub mod error;
pub mod message;
pub mod options;
pub mod protocol;
pub mod registry;
pub mod type_url;
pub mod wkt;

pub use any::{AnyMessage, Payload, ANY_TYPE_NAME};
/// Shared result type.
pub use error::{ErrorCode, ProtoboxError, Result};
pub use message::{DynMessage, Message, MessageType};
pub use options::DecodeOptions;
pub use registry::{MessageDescriptor, Registry, TypeDescriptor};
