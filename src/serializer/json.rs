//! `json`-equivalent built-in serializer: restricted to values representable
//! as JSON (mappings with string keys, sequences, strings, numbers, booleans,
//! null).

use super::Serializer;
use crate::error::{CacheError, CacheResult};

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn serialize_erased(&self, value: &dyn erased_serde::Serialize) -> CacheResult<Vec<u8>> {
        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::new(&mut buf);
        let mut erased = <dyn erased_serde::Serializer>::erase(&mut ser);
        value
            .erased_serialize(&mut erased)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    fn deserialize_erased(
        &self,
        bytes: &[u8],
        f: &mut dyn FnMut(&mut dyn erased_serde::Deserializer) -> CacheResult<()>,
    ) -> CacheResult<()> {
        let mut de = serde_json::Deserializer::from_slice(bytes);
        let mut erased = <dyn erased_serde::Deserializer>::erase(&mut de);
        f(&mut erased)
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::SerializerExt;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn round_trips_a_struct() {
        let ser = JsonSerializer;
        let bytes = ser.serialize(&Point { x: 1, y: -2 }).unwrap();
        let back: Point = ser.deserialize(&bytes).unwrap();
        assert_eq!(back, Point { x: 1, y: -2 });
    }

    #[test]
    fn malformed_input_is_serialization_error() {
        let ser = JsonSerializer;
        let err = ser.deserialize::<Point>(b"not json").unwrap_err();
        assert!(matches!(err, CacheError::Serialization(_)));
    }
}
