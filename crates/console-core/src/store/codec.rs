//! Value codecs between typed cells and string storage

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;

use super::StoreError;

/// Encodes cell values into the string form kept by a [`Storage`](super::Storage)
pub trait Codec<V>: Send + Sync {
    fn encode(&self, value: &V) -> Result<String, StoreError>;

    fn decode(&self, raw: &str) -> Result<V, StoreError>;
}

/// Plain strings, stored verbatim
#[derive(Debug, Clone, Copy, Default)]
pub struct StringCodec;

impl Codec<String> for StringCodec {
    fn encode(&self, value: &String) -> Result<String, StoreError> {
        Ok(value.clone())
    }

    fn decode(&self, raw: &str) -> Result<String, StoreError> {
        Ok(raw.to_string())
    }
}

/// JSON-serialized values
pub struct JsonCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for JsonCodec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JsonCodec")
    }
}

impl<T> Codec<T> for JsonCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> Result<String, StoreError> {
        Ok(serde_json::to_string(value)?)
    }

    fn decode(&self, raw: &str) -> Result<T, StoreError> {
        Ok(serde_json::from_str(raw)?)
    }
}
