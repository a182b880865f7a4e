//! Packets produced by an operation, waiting for the server loop to send.
//!
//! Room operations never call the transport. They push deliveries here and
//! return; the loop drains the outbox after each event. That keeps every
//! operation synchronous and lets tests inspect exactly what would go out.

use bytes::Bytes;
use roomrelay_protocol::Notice;
use roomrelay_transport::{ConnectionId, DeliveryMode};

/// One packet addressed to one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub connection: ConnectionId,
    pub data: Bytes,
    pub mode: DeliveryMode,
}

/// An ordered queue of deliveries.
#[derive(Debug, Default)]
pub struct Outbox {
    deliveries: Vec<Delivery>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a notice for one client. Notices are always reliable-ordered.
    pub fn notify(&mut self, connection: ConnectionId, notice: &Notice) {
        self.forward(connection, notice.encode(), DeliveryMode::ReliableOrdered);
    }

    /// Queues the same notice for every connection in `to`.
    ///
    /// The notice is encoded once; each delivery shares the buffer.
    pub fn broadcast<I>(&mut self, to: I, notice: &Notice)
    where
        I: IntoIterator<Item = ConnectionId>,
    {
        let data = notice.encode();
        for connection in to {
            self.forward(connection, data.clone(), DeliveryMode::ReliableOrdered);
        }
    }

    /// Queues raw bytes with an explicit delivery mode.
    pub fn forward(&mut self, connection: ConnectionId, data: Bytes, mode: DeliveryMode) {
        self.deliveries.push(Delivery {
            connection,
            data,
            mode,
        });
    }

    /// Removes and yields every queued delivery, oldest first.
    pub fn drain(&mut self) -> impl Iterator<Item = Delivery> + '_ {
        self.deliveries.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_shares_one_encoding() {
        let mut outbox = Outbox::new();
        let to = [ConnectionId::new(1), ConnectionId::new(2)];
        outbox.broadcast(to, &Notice::RoomStart);

        let deliveries: Vec<_> = outbox.drain().collect();
        assert_eq!(deliveries.len(), 2);
        assert_eq!(deliveries[0].data, deliveries[1].data);
        assert_eq!(deliveries[0].connection, ConnectionId::new(1));
        assert_eq!(deliveries[1].connection, ConnectionId::new(2));
        assert!(outbox.is_empty());
    }

    #[test]
    fn test_notify_is_reliable_ordered() {
        let mut outbox = Outbox::new();
        outbox.notify(ConnectionId::new(1), &Notice::RoomClosed);
        let delivery = outbox.drain().next().unwrap();
        assert_eq!(delivery.mode, DeliveryMode::ReliableOrdered);
        assert_eq!(Notice::decode(delivery.data), Ok(Notice::RoomClosed));
    }

    #[test]
    fn test_forward_keeps_mode_and_bytes() {
        let mut outbox = Outbox::new();
        let data = Bytes::from_static(&[4, 5, 6]);
        outbox.forward(ConnectionId::new(9), data.clone(), DeliveryMode::Unreliable);
        assert_eq!(
            outbox.drain().next(),
            Some(Delivery {
                connection: ConnectionId::new(9),
                data,
                mode: DeliveryMode::Unreliable,
            })
        );
    }
}
