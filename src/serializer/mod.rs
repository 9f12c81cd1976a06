//! Pluggable serialization.
//!
//! [`Serializer`] is the dyn-compatible trait stored in the process-wide
//! [`registry`]. Generic `Serialize`/`Deserialize` methods are not
//! object-safe, so, following the same callback pattern used by
//! `hitbox-backend`'s `Format` trait, [`Serializer`] exposes an
//! `erased_serde`-based pair of methods, and [`SerializerExt`] provides the
//! ergonomic generic `serialize`/`deserialize` call sites the rest of the
//! crate actually uses.

mod json;
mod pickle;
pub mod registry;

pub use json::JsonSerializer;
pub use pickle::PickleSerializer;
pub use registry::{SerializerFactory, SerializerRegistry};

use crate::error::{CacheError, CacheResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// A named, registered codec converting application values to and from
/// bytes. Implementations must be `Send + Sync` so a single instance can be
/// shared by every `Cache` that resolves it by name.
pub trait Serializer: Send + Sync + Debug {
    /// Serializes an already-erased value to bytes.
    fn serialize_erased(&self, value: &dyn erased_serde::Serialize) -> CacheResult<Vec<u8>>;

    /// Builds a deserializer over `bytes` and hands it to `f`, which is
    /// expected to call `erased_serde::deserialize` on it exactly once and
    /// stash the typed result. The callback indirection is what keeps this
    /// method free of a generic type parameter, preserving object safety.
    fn deserialize_erased(
        &self,
        bytes: &[u8],
        f: &mut dyn FnMut(&mut dyn erased_serde::Deserializer) -> CacheResult<()>,
    ) -> CacheResult<()>;

    /// The name this serializer is (or should be) registered under.
    fn name(&self) -> &'static str;
}

/// Ergonomic, generic front-end over [`Serializer`]. Blanket-implemented for
/// every `Serializer`, including trait objects.
pub trait SerializerExt: Serializer {
    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> CacheResult<Vec<u8>> {
        self.serialize_erased(&value)
    }

    fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> CacheResult<T> {
        let mut slot: Option<T> = None;
        self.deserialize_erased(bytes, &mut |deserializer| {
            let value: T = erased_serde::deserialize(deserializer)
                .map_err(|e| CacheError::Serialization(e.to_string()))?;
            slot = Some(value);
            Ok(())
        })?;
        slot.ok_or_else(|| {
            CacheError::Serialization("deserializer callback produced no value".to_string())
        })
    }
}

impl<S: Serializer + ?Sized> SerializerExt for S {}
