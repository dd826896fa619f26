//! Type URL build/parse.
//!
//! A type URL is `<prefix>/<fully.qualified.Name>`. Only the part after the
//! last `/` identifies the type; the prefix is opaque.

/// Prefix used by [`crate::AnyMessage::pack`].
pub const DEFAULT_TYPE_PREFIX: &str = "type.googleapis.com";

/// Join `prefix` and `type_name`. A trailing `/` on the prefix is not doubled.
pub fn build(type_name: &str, prefix: &str) -> String {
    let prefix = prefix.strip_suffix('/').unwrap_or(prefix);
    format!("{prefix}/{type_name}")
}

/// Type name embedded in `url`.
///
/// Empty when the URL has no `/` or nothing follows the last one; callers
/// treat that as malformed.
pub fn parse_type_name(url: &str) -> &str {
    match url.rfind('/') {
        Some(idx) => url.get(idx + 1..).unwrap_or(""),
        None => "",
    }
}
