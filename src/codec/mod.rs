//! Codec Module
//!
//! The boundary between stored bytes and application values.
//!
//! ## Responsibilities
//! - Turn a value into the bytes written to a record file
//! - Turn those bytes back into a value
//! - Report failures as distinct error kinds
//!
//! The store never interprets record bytes itself. A serializer is handed to
//! each store when it is opened, so tests can swap in their own.

mod binary;

pub use binary::BincodeSerializer;

use std::io::Write;

use crate::error::Result;

/// Converts values of type `V` to and from bytes
///
/// Implementations must return `ShelfError::Serialization` when a value
/// cannot be encoded and `ShelfError::Deserialization` when bytes cannot be
/// decoded. The store relies on the latter to tell corrupt records apart from
/// I/O failures.
pub trait Serializer<V>: Send + Sync {
    /// Encode a value
    fn serialize(&self, value: &V) -> Result<Vec<u8>>;

    /// Encode a value straight into `writer`
    ///
    /// Stream failures should surface as `ShelfError::Io`. The default
    /// encodes to a buffer first, so nothing is written on an encode error.
    fn serialize_into(&self, value: &V, writer: &mut dyn Write) -> Result<()> {
        let bytes = self.serialize(value)?;
        writer.write_all(&bytes)?;
        Ok(())
    }

    /// Decode a value
    fn deserialize(&self, bytes: &[u8]) -> Result<V>;
}
