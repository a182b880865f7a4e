//! The room record and the per-client role it implies.

use roomrelay_protocol::RoomCode;
use roomrelay_transport::ConnectionId;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Where a client stands in the room state machine.
///
/// ```text
///          CreateRoom                 JoinRoom
///  Host ◀──────────── NoRoom ──────────────▶ Guest
///   │                   ▲  ▲                   │
///   └── CloseRoom ──────┘  └────── LeaveRoom ──┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    NoRoom,
    Guest(RoomCode),
    Host(RoomCode),
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// One open session: a host and its guests.
///
/// The host lives in its own field rather than at index 0 of a list, so
/// "who is host" can't drift. It is fixed at creation and never handed to a
/// guest; a room without its host is closed instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    code: RoomCode,
    host: ConnectionId,
    guests: Vec<ConnectionId>,
}

impl Room {
    /// Creates a room with `host` as its only member.
    pub fn new(code: RoomCode, host: ConnectionId) -> Self {
        Self {
            code,
            host,
            guests: Vec::new(),
        }
    }

    pub fn code(&self) -> RoomCode {
        self.code
    }

    pub fn host(&self) -> ConnectionId {
        self.host
    }

    /// Guests in join order.
    pub fn guests(&self) -> &[ConnectionId] {
        &self.guests
    }

    /// Host first, then guests in join order.
    pub fn members(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        std::iter::once(self.host).chain(self.guests.iter().copied())
    }

    /// Number of members, host included.
    pub fn member_count(&self) -> usize {
        1 + self.guests.len()
    }

    pub fn is_host(&self, connection: ConnectionId) -> bool {
        self.host == connection
    }

    pub(crate) fn add_guest(&mut self, connection: ConnectionId) {
        self.guests.push(connection);
    }

    /// Removes a guest, keeping the others in order. Returns `false` if
    /// `connection` was not a guest.
    pub(crate) fn remove_guest(&mut self, connection: ConnectionId) -> bool {
        match self.guests.iter().position(|&g| g == connection) {
            Some(index) => {
                self.guests.remove(index);
                true
            }
            None => false,
        }
    }
}
