//! Codec trait and implementations.
//!
//! A codec converts between protocol types and raw bytes. The rest of
//! the stack is written against the [`Codec`] trait so the wire format
//! can change (JSON today, a binary codec later) without touching the
//! handler or the rooms.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes protocol values to bytes and decodes them back.
///
/// `Send + Sync + 'static` because the codec is shared by every
/// connection handler task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] for malformed, truncated, or
    /// mistyped input.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// JSON codec via `serde_json`.
///
/// Human-readable, which is what you want while a client SDK is being
/// debugged against the server. Behind the `json` feature (default).
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{ClientCommand, CommandEnvelope, PlayerId};

    #[test]
    fn test_json_codec_round_trip() {
        let codec = JsonCodec;
        let env = CommandEnvelope {
            seq: 1,
            timestamp: 0,
            command: ClientCommand::Identify { player_id: PlayerId(5) },
        };
        let bytes = codec.encode(&env).unwrap();
        let decoded: CommandEnvelope = codec.decode(&bytes).unwrap();
        assert_eq!(env, decoded);
    }

    #[test]
    fn test_json_codec_decode_error() {
        let codec = JsonCodec;
        let result: Result<CommandEnvelope, _> = codec.decode(b"{{nope");
        assert!(result.is_err());
    }
}
