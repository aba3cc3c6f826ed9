//! Value Codec Module
//!
//! Pluggable serializer used to snapshot values on `set` and to estimate
//! their memory footprint.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

// == Codec Error ==
/// Failure to snapshot a value.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The value could not be serialized
    #[error("failed to encode value: {0}")]
    Encode(String),

    /// The encoded form could not be read back
    #[error("failed to decode value: {0}")]
    Decode(String),
}

// == Value Codec ==
/// Turns a value into a detached snapshot and back.
///
/// The encoded length drives the store's size estimate.
pub trait ValueCodec<V>: Send + Sync {
    fn encode(&self, value: &V) -> Result<String, CodecError>;
    fn decode(&self, raw: &str) -> Result<V, CodecError>;
}

// == JSON Codec ==
/// Default codec backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<V> ValueCodec<V> for JsonCodec
where
    V: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &V) -> Result<String, CodecError> {
        serde_json::to_string(value).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(&self, raw: &str) -> Result<V, CodecError> {
        serde_json::from_str(raw).map_err(|e| CodecError::Decode(e.to_string()))
    }
}
