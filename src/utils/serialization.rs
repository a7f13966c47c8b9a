// Binary encoding for hashing inputs and wire payloads
use crate::error::{BlockchainError, Result};
use serde::{Deserialize, Serialize};

/// Serialize data using bincode 2.0 with standard configuration
pub fn serialize<T: Serialize + bincode::Encode>(data: &T) -> Result<Vec<u8>> {
    let config = bincode::config::standard();
    bincode::encode_to_vec(data, config)
        .map_err(|e| BlockchainError::Serialization(format!("Serialization failed: {e}")))
}

/// Most bytes a single decode may claim. Length prefixes beyond this are
/// rejected before anything is allocated.
pub const DECODE_LIMIT_BYTES: usize = 64 * 1024 * 1024;

/// Deserialize data using bincode 2.0 with standard configuration, bounded
/// by [`DECODE_LIMIT_BYTES`]
pub fn deserialize<T>(bytes: &[u8]) -> Result<T>
where
    T: for<'de> Deserialize<'de> + bincode::Decode<()>,
{
    let config = bincode::config::standard().with_limit::<DECODE_LIMIT_BYTES>();
    let (data, _) = bincode::decode_from_slice(bytes, config)
        .map_err(|e| BlockchainError::Serialization(format!("Deserialization failed: {e}")))?;
    Ok(data)
}
