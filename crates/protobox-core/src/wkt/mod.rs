//! Well-known types and their Any JSON adapter.
//!
//! A well-known type has a bespoke JSON form instead of a field-keyed object,
//! so inside an Any it is carried as `{"@type": ..., "value": <form>}`.

mod duration;
mod wrappers;

pub use duration::Duration;
pub use wrappers::{BoolValue, DoubleValue, Int64Value, StringValue};

const WELL_KNOWN_TYPES: &[&str] = &[
    "google.protobuf.Any",
    "google.protobuf.BoolValue",
    "google.protobuf.BytesValue",
    "google.protobuf.DoubleValue",
    "google.protobuf.Duration",
    "google.protobuf.FieldMask",
    "google.protobuf.FloatValue",
    "google.protobuf.Int32Value",
    "google.protobuf.Int64Value",
    "google.protobuf.ListValue",
    "google.protobuf.StringValue",
    "google.protobuf.Struct",
    "google.protobuf.Timestamp",
    "google.protobuf.UInt32Value",
    "google.protobuf.UInt64Value",
    "google.protobuf.Value",
];

/// Whether `name` uses the lone-`"value"` form inside an Any.
pub fn is_well_known_type(name: &str) -> bool {
    WELL_KNOWN_TYPES.binary_search(&name).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_is_sorted_for_binary_search() {
        assert!(WELL_KNOWN_TYPES.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn classification() {
        assert!(is_well_known_type("google.protobuf.Duration"));
        assert!(is_well_known_type("google.protobuf.Any"));
        assert!(!is_well_known_type("google.protobuf.Empty"));
        assert!(!is_well_known_type("pkg.Duration"));
    }
}
