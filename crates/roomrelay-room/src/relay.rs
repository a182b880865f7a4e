//! Relay routing: where an opaque packet goes.
//!
//! The relay never looks inside these packets. Direction is decided only by
//! the sender's role: the host talks to every guest, a guest talks to the
//! host.

use bytes::Bytes;
use roomrelay_transport::{ConnectionId, DeliveryMode};

use crate::{Outbox, Role, RoomError, RoomManager};

impl RoomManager {
    /// Queues `data` for the other side of the sender's room, unmodified and
    /// with the delivery mode it arrived with.
    ///
    /// Returns how many deliveries were queued (zero for a host alone in
    /// its room).
    ///
    /// # Errors
    /// [`RoomError::NotInRoom`] if the sender has no room, so the packet
    /// has nowhere to go. The caller drops it without replying.
    pub fn relay(
        &self,
        connection: ConnectionId,
        data: Bytes,
        mode: DeliveryMode,
        outbox: &mut Outbox,
    ) -> Result<usize, RoomError> {
        let (code, to_host) = match self.role(connection)? {
            Role::NoRoom => return Err(RoomError::NotInRoom),
            Role::Host(code) => (code, false),
            Role::Guest(code) => (code, true),
        };
        let room = self.rooms.get(code).ok_or(RoomError::NotInRoom)?;

        if to_host {
            outbox.forward(room.host(), data, mode);
            return Ok(1);
        }
        for &guest in room.guests() {
            outbox.forward(guest, data.clone(), mode);
        }
        Ok(room.guests().len())
    }
}
