//! Transport abstraction layer for roomrelay.
//!
//! The relay core never touches sockets. It consumes a [`Transport`]: a
//! source of [`TransportEvent`]s (connect, disconnect, receive, error) plus
//! a non-blocking `send`. Everything about framing, admission and per-peer
//! I/O lives behind this trait.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{CONNECTION_KEY_HEADER, CONNECTION_KEY_QUERY, WebSocketTransport};

use std::fmt;
use std::net::SocketAddr;

use bytes::Bytes;

/// Opaque identifier for a connection.
///
/// Assigned by the transport when a peer passes admission. The relay uses
/// it as the key of its client registry; it never outlives the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// The delivery guarantee requested for an outbound packet.
///
/// Relayed packets keep the mode they arrived with. Transports that cannot
/// honour a weaker guarantee deliver with a stronger one instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeliveryMode {
    /// Delivered in order, no loss.
    #[default]
    ReliableOrdered,

    /// Delivered (no loss), but may arrive out of order.
    ReliableUnordered,

    /// May be lost, may arrive out of order.
    Unreliable,
}

/// Something that happened on the transport.
///
/// Events for a single connection are surfaced in the order they happened:
/// `Connected` first, then any number of `Received`, then `Disconnected`.
#[derive(Debug)]
pub enum TransportEvent {
    /// A peer passed admission and is ready to exchange packets.
    Connected {
        connection: ConnectionId,
        peer: SocketAddr,
    },

    /// A peer went away (closed cleanly, errored, or was dropped).
    Disconnected {
        connection: ConnectionId,
        reason: String,
    },

    /// A packet arrived from a peer.
    Received {
        connection: ConnectionId,
        data: Bytes,
        mode: DeliveryMode,
    },

    /// A network error not tied to an admitted connection.
    Error {
        peer: Option<SocketAddr>,
        error: TransportError,
    },
}

/// A source of connection events with a way to talk back to peers.
///
/// The relay's server loop is the only consumer. It waits for a batch with
/// [`poll_events`](Self::poll_events), handles each event to completion,
/// and pushes replies through [`send`](Self::send).
pub trait Transport: Send + 'static {
    /// Waits until at least one event is pending, then appends every
    /// pending event to `events`.
    ///
    /// Returns the number of events appended. `0` means the transport has
    /// stopped and will never produce another event.
    async fn poll_events(&mut self, events: &mut Vec<TransportEvent>) -> usize;

    /// Queues `data` for delivery to `connection`.
    ///
    /// Never blocks. An `Err` means the packet was not queued; the caller
    /// decides whether that matters.
    fn send(
        &self,
        connection: ConnectionId,
        data: Bytes,
        mode: DeliveryMode,
    ) -> Result<(), TransportError>;

    /// Stops accepting new peers and disconnects every admitted one.
    async fn shutdown(&mut self) -> Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId::new(7);
        assert_eq!(id.to_string(), "conn-7");
    }

    #[test]
    fn test_connection_id_hash_works_as_map_key() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(ConnectionId::new(1), "alice");
        map.insert(ConnectionId::new(2), "bob");
        assert_eq!(map[&ConnectionId::new(1)], "alice");
    }

    #[test]
    fn test_delivery_mode_default_is_reliable_ordered() {
        assert_eq!(DeliveryMode::default(), DeliveryMode::ReliableOrdered);
    }
}
