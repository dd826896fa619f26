//! Message type registry.
//!
//! Maps fully-qualified type names to descriptors that can construct a default
//! instance. Only the verbose text path and re-encoding of lazily held
//! payloads consult it; binary and JSON decoding never need it.

use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

use crate::any::AnyMessage;
use crate::message::{DynMessage, MessageType};
use crate::wkt;

/// Object-safe constructor for a registered message type.
pub trait MessageDescriptor: Send + Sync {
    fn type_name(&self) -> &'static str;
    fn new_message(&self) -> Box<dyn DynMessage>;
}

/// Descriptor for a concrete [`MessageType`].
pub struct TypeDescriptor<M>(PhantomData<fn() -> M>);

impl<M> TypeDescriptor<M> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<M> Default for TypeDescriptor<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: MessageType> MessageDescriptor for TypeDescriptor<M> {
    fn type_name(&self) -> &'static str {
        M::TYPE_NAME
    }

    fn new_message(&self) -> Box<dyn DynMessage> {
        Box::new(M::default())
    }
}

/// Concurrent name -> descriptor map. Safe for concurrent reads and writes.
#[derive(Default)]
pub struct Registry {
    types: DashMap<&'static str, Arc<dyn MessageDescriptor>>,
}

static GLOBAL: OnceLock<Registry> = OnceLock::new();

impl Registry {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            types: DashMap::new(),
        }
    }

    /// Registry pre-populated with the bundled well-known types.
    pub fn with_well_known_types() -> Self {
        let r = Self::new();
        r.register::<AnyMessage>();
        r.register::<wkt::Duration>();
        r.register::<wkt::StringValue>();
        r.register::<wkt::Int64Value>();
        r.register::<wkt::BoolValue>();
        r.register::<wkt::DoubleValue>();
        r
    }

    /// Process-wide registry, seeded with the bundled well-known types.
    pub fn global() -> &'static Registry {
        GLOBAL.get_or_init(Registry::with_well_known_types)
    }

    pub fn register<M: MessageType>(&self) {
        self.register_descriptor(Arc::new(TypeDescriptor::<M>::new()));
    }

    pub fn register_descriptor(&self, desc: Arc<dyn MessageDescriptor>) {
        let name = desc.type_name();
        if self.types.insert(name, desc).is_some() {
            tracing::warn!(type_name = name, "registry entry replaced");
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn MessageDescriptor>> {
        self.types.get(name).map(|e| e.value().clone())
    }

    /// Whether `name` has a bespoke JSON form (see [`wkt::is_well_known_type`]).
    pub fn is_well_known_type(&self, name: &str) -> bool {
        wkt::is_well_known_type(name)
    }

    pub fn registered_types(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.types.iter().map(|e| *e.key()).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn global_has_well_known_types() {
        let r = Registry::global();
        assert!(r.lookup("google.protobuf.Duration").is_some());
        assert!(r.lookup("google.protobuf.Any").is_some());
        assert!(r.lookup("pkg.Unknown").is_none());
    }

    #[test]
    fn descriptor_builds_default_instance() {
        let r = Registry::new();
        r.register::<wkt::StringValue>();
        let msg = r.lookup("google.protobuf.StringValue").unwrap().new_message();
        assert_eq!(msg.type_name(), "google.protobuf.StringValue");
        assert!(msg.eq_dyn(&wkt::StringValue::default()));
        assert_eq!(r.registered_types(), vec!["google.protobuf.StringValue"]);
    }

    #[test]
    fn well_known_classification() {
        let r = Registry::new();
        assert!(r.is_well_known_type("google.protobuf.Duration"));
        assert!(!r.is_well_known_type("pkg.Foo"));
    }
}
