//! Serialization of fitted parameters.
//!
//! Fitted stages expose their learned state as plain-data parameter structs
//! (`Vec<f64>`, scalars, tree nodes) that are encoded with bincode.

use std::error::Error;

/// A trait for parameter representations that can be serialized to and from bytes.
///
/// Implementors should contain only plain numerical data, not `ndarray`
/// buffers or other runtime handles.
pub trait SerializableParams: Sized {
    /// The error type returned during (de)serialization.
    type Error: Error + Send + Sync + 'static;

    /// Serialize the parameters into a byte buffer.
    fn to_bytes(&self) -> Result<Vec<u8>, Self::Error>;

    /// Deserialize the parameters from a byte buffer.
    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error>;
}

impl<T> SerializableParams for T
where
    T: serde::Serialize + for<'de> serde::Deserialize<'de>,
{
    type Error = bincode::Error;

    fn to_bytes(&self) -> Result<Vec<u8>, Self::Error> {
        bincode::serialize(self)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error> {
        bincode::deserialize(bytes)
    }
}
