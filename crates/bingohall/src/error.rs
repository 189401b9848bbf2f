//! Unified error type for the Bingohall server.

use bingohall_protocol::ProtocolError;
use bingohall_room::RoomError;
use bingohall_transport::TransportError;

/// Top-level error wrapping the per-layer errors.
///
/// The `#[from]` attributes generate the `From` impls, so `?` converts
/// layer errors automatically in the server and handler code.
#[derive(Debug, thiserror::Error)]
pub enum BingohallError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid command).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (unknown room, closed phase, bad claim).
    #[error(transparent)]
    Room(#[from] RoomError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use bingohall_protocol::RoomId;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let top: BingohallError = err.into();
        assert!(matches!(top, BingohallError::Transport(_)));
        assert!(top.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidCommand("bad".into());
        let top: BingohallError = err.into();
        assert!(matches!(top, BingohallError::Protocol(_)));
    }

    #[test]
    fn test_from_room_error() {
        let err = RoomError::NotFound(RoomId(1));
        let top: BingohallError = err.into();
        assert!(matches!(top, BingohallError::Room(_)));
    }
}
