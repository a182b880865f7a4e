//! Error types for the room layer.

use roomrelay_protocol::RoomCode;
use roomrelay_transport::ConnectionId;

/// Errors that can occur during room operations.
///
/// Apart from [`UnknownConnection`](Self::UnknownConnection), the display
/// text of each variant is the reason sent back to the client in an
/// `Invalid` notice, so keep it short and human readable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// The client is already a member of a room.
    #[error("Client already in room")]
    AlreadyInRoom,

    /// No open room has this code.
    #[error("Invalid Room Code")]
    InvalidRoomCode(RoomCode),

    /// The client is not a member of any room.
    #[error("Client not in room")]
    NotInRoom,

    /// Hosts close their room; they can't leave it.
    #[error("Host attempted to leave room")]
    HostCannotLeave,

    /// Only the host may start the room.
    #[error("Guest attempted to start room")]
    GuestCannotStart,

    /// Only the host may close the room.
    #[error("Guest attempted to close room")]
    GuestCannotClose,

    /// Every code in the code space is taken.
    #[error("No room codes available")]
    CodeSpaceExhausted,

    /// The requested display name is over the configured limit.
    #[error("Name too long")]
    NameTooLong { len: usize, max: usize },

    /// The connection has no client record (event raced a disconnect).
    #[error("unknown connection {0}")]
    UnknownConnection(ConnectionId),
}

impl RoomError {
    /// Whether the offending client should be told about this error.
    ///
    /// An unknown connection has nobody to tell.
    pub fn is_reportable(&self) -> bool {
        !matches!(self, Self::UnknownConnection(_))
    }
}
