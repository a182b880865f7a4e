//! Unified error type for the relay server.

use roomrelay_protocol::ProtocolError;
use roomrelay_room::RoomError;
use roomrelay_transport::TransportError;

/// Top-level error that wraps every crate-specific error.
///
/// The `#[from]` attribute on each variant generates the `From` impls, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Binding, accepting or sending failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A packet could not be decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room operation was refused.
    #[error(transparent)]
    Room(#[from] RoomError),
}

#[cfg(test)]
mod tests {
    use roomrelay_protocol::RoomCode;
    use roomrelay_transport::ConnectionId;

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::UnknownConnection(ConnectionId::new(3));
        let relay_err: RelayError = err.into();
        assert!(matches!(relay_err, RelayError::Transport(_)));
        assert!(relay_err.to_string().contains("conn-3"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::UnknownCommand(9);
        let relay_err: RelayError = err.into();
        assert!(matches!(relay_err, RelayError::Protocol(_)));
    }

    #[test]
    fn test_from_room_error_keeps_reason_text() {
        let err = RoomError::InvalidRoomCode(RoomCode(12));
        let relay_err: RelayError = err.into();
        assert!(matches!(relay_err, RelayError::Room(_)));
        assert_eq!(relay_err.to_string(), "Invalid Room Code");
    }
}
