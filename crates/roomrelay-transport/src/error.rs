use crate::ConnectionId;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding the listening socket failed.
    #[error("bind failed: {0}")]
    BindFailed(#[source] std::io::Error),

    /// Accepting an incoming connection failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// No admitted connection has this id (never existed, or already gone).
    #[error("unknown connection {0}")]
    UnknownConnection(ConnectionId),

    /// The connection is closing and no longer takes outbound packets.
    #[error("connection {0} closed")]
    ConnectionClosed(ConnectionId),

    /// The peer's outbound queue is full; the packet was not queued.
    #[error("outbound queue for {0} is full")]
    QueueFull(ConnectionId),

    /// The transport was shut down.
    #[error("transport shut down")]
    Shutdown,
}
