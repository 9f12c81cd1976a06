//! `pickle`-equivalent built-in serializer: full-fidelity binary encoding of
//! any value the host's serde impl supports, backed by `bincode`.

use super::Serializer;
use crate::error::{CacheError, CacheResult};
use bincode::Options;

#[derive(Debug, Default, Clone, Copy)]
pub struct PickleSerializer;

impl Serializer for PickleSerializer {
    fn serialize_erased(&self, value: &dyn erased_serde::Serialize) -> CacheResult<Vec<u8>> {
        let mut buf = Vec::new();
        let mut ser = bincode::Serializer::new(&mut buf, bincode::options());
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
        let mut de = bincode::Deserializer::from_slice(bytes, bincode::options());
        let mut erased = <dyn erased_serde::Deserializer>::erase(&mut de);
        f(&mut erased)
    }

    fn name(&self) -> &'static str {
        "pickle"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::SerializerExt;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Blob {
        tag: String,
        bytes: Vec<u8>,
        maybe: Option<i64>,
    }

    #[test]
    fn round_trips_binary_data() {
        let ser = PickleSerializer;
        let original = Blob {
            tag: "t".into(),
            bytes: vec![0, 255, 16, 0],
            maybe: None,
        };
        let bytes = ser.serialize(&original).unwrap();
        let back: Blob = ser.deserialize(&bytes).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn truncated_input_is_serialization_error() {
        let ser = PickleSerializer;
        let err = ser.deserialize::<Blob>(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, CacheError::Serialization(_)));
    }
}
