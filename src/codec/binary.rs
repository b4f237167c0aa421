//! Bincode serializer
//!
//! Default serializer for any serde type.

use std::io::Write;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, ShelfError};

use super::Serializer;

/// Compact binary serializer backed by bincode
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeSerializer;

impl BincodeSerializer {
    pub fn new() -> Self {
        Self
    }
}

impl<V> Serializer<V> for BincodeSerializer
where
    V: Serialize + DeserializeOwned,
{
    fn serialize(&self, value: &V) -> Result<Vec<u8>> {
        bincode::serialize(value).map_err(encode_error)
    }

    fn serialize_into(&self, value: &V, writer: &mut dyn Write) -> Result<()> {
        bincode::serialize_into(writer, value).map_err(encode_error)
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<V> {
        bincode::deserialize(bytes).map_err(|e| ShelfError::Deserialization(e.to_string()))
    }
}

/// Keep stream failures distinguishable from encoding failures
fn encode_error(err: bincode::Error) -> ShelfError {
    match *err {
        bincode::ErrorKind::Io(e) => ShelfError::Io(e),
        other => ShelfError::Serialization(other.to_string()),
    }
}
