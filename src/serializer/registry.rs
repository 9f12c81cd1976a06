//! Process-wide serializer registry.
//!
//! Global mutable state with append-mostly semantics: built-ins are
//! registered once at first use, writes are rare and lock-guarded, reads are
//! lock-free once the map is in place (a `parking_lot::RwLock` read guard is
//! effectively free under the read-mostly access pattern this map sees).

use super::{JsonSerializer, PickleSerializer, Serializer};
use crate::error::{CacheError, CacheResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Produces a fresh serializer instance on demand. Kept separate from the
/// instance itself so a single registration can back many `Cache`s.
pub type SerializerFactory = Arc<dyn Fn() -> Arc<dyn Serializer> + Send + Sync>;

/// Name-to-factory mapping, initialized once with the built-in `json` and
/// `pickle` entries.
#[derive(Default)]
pub struct SerializerRegistry {
    factories: RwLock<HashMap<String, SerializerFactory>>,
}

impl SerializerRegistry {
    fn new() -> Self {
        let registry = Self {
            factories: RwLock::new(HashMap::new()),
        };
        registry.register("json", Arc::new(|| Arc::new(JsonSerializer) as Arc<dyn Serializer>));
        registry.register(
            "pickle",
            Arc::new(|| Arc::new(PickleSerializer) as Arc<dyn Serializer>),
        );
        registry
    }

    /// Process-wide singleton, lazily built on first access.
    pub fn global() -> &'static SerializerRegistry {
        static INSTANCE: OnceLock<SerializerRegistry> = OnceLock::new();
        INSTANCE.get_or_init(SerializerRegistry::new)
    }

    /// Registers `factory` under `name` (lower-cased). Idempotent: a second
    /// call with the same name overwrites the previous factory.
    pub fn register(&self, name: &str, factory: SerializerFactory) {
        self.factories
            .write()
            .insert(name.to_ascii_lowercase(), factory);
    }

    /// Builds a new instance of the serializer registered under `name`.
    pub fn get(&self, name: &str) -> CacheResult<Arc<dyn Serializer>> {
        let key = name.to_ascii_lowercase();
        self.factories
            .read()
            .get(&key)
            .map(|factory| factory())
            .ok_or_else(|| CacheError::Configuration(format!("unknown serializer: {name}")))
    }

    /// Names currently registered.
    pub fn list(&self) -> Vec<String> {
        self.factories.read().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::SerializerExt;

    #[test]
    fn built_ins_are_present() {
        let registry = SerializerRegistry::global();
        let mut names = registry.list();
        names.sort();
        assert_eq!(names, vec!["json".to_string(), "pickle".to_string()]);
    }

    #[test]
    fn unknown_name_is_a_configuration_error() {
        let registry = SerializerRegistry::global();
        let err = registry.get("does-not-exist").unwrap_err();
        assert!(matches!(err, CacheError::Configuration(_)));
    }

    #[test]
    fn custom_registration_is_idempotent_overwrite() {
        let registry = SerializerRegistry::new();
        registry.register(
            "json",
            Arc::new(|| Arc::new(JsonSerializer) as Arc<dyn Serializer>),
        );
        let instance = registry.get("JSON").unwrap();
        let bytes = instance.serialize(&42i32).unwrap();
        assert_eq!(instance.deserialize::<i32>(&bytes).unwrap(), 42);
    }
}
