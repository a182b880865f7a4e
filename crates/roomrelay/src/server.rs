//! `RelayServer` builder and server loop.
//!
//! This is the entry point for running a relay. It ties the layers
//! together: transport events in, room operations in the middle, outbox
//! deliveries back out through the transport.

use std::future::Future;
use std::net::SocketAddr;

use roomrelay_protocol::Frame;
use roomrelay_room::{Outbox, RoomConfig, RoomManager};
use roomrelay_transport::{Transport, TransportEvent, WebSocketTransport};

use crate::RelayError;
use crate::dispatch::dispatch;

/// Builder for configuring and starting a relay server.
///
/// # Example
///
/// ```rust,ignore
/// use roomrelay::prelude::*;
///
/// let server = RelayServer::builder()
///     .bind("0.0.0.0:7777")
///     .connection_key("secret")
///     .build()
///     .await?;
/// server.run(tokio::signal::ctrl_c()).await
/// ```
pub struct RelayServerBuilder {
    bind_addr: String,
    connection_key: String,
    room_config: RoomConfig,
}

impl RelayServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            connection_key: String::new(),
            room_config: RoomConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the key clients must present to be admitted.
    pub fn connection_key(mut self, key: impl Into<String>) -> Self {
        self.connection_key = key.into();
        self
    }

    /// Sets the room configuration.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Binds the WebSocket listener and returns a server ready to run.
    pub async fn build(self) -> Result<RelayServer<WebSocketTransport>, RelayError> {
        let transport =
            WebSocketTransport::bind(&self.bind_addr, self.connection_key).await?;
        Ok(RelayServer::new(transport, self.room_config))
    }
}

impl Default for RelayServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A relay server: one transport and the room state it serves.
///
/// Call [`run()`](Self::run) to start handling events.
pub struct RelayServer<T: Transport = WebSocketTransport> {
    transport: T,
    manager: RoomManager,
}

impl RelayServer<WebSocketTransport> {
    /// Creates a new builder.
    pub fn builder() -> RelayServerBuilder {
        RelayServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.transport.local_addr()
    }
}

impl<T: Transport> RelayServer<T> {
    /// Wraps an already bound transport.
    pub fn new(transport: T, config: RoomConfig) -> Self {
        Self {
            transport,
            manager: RoomManager::new(config),
        }
    }

    /// Current room state.
    pub fn manager(&self) -> &RoomManager {
        &self.manager
    }

    /// Runs the event loop until `shutdown` resolves or the transport stops.
    ///
    /// Events are taken in batches and each one is handled to completion,
    /// including sending everything it produced, before the next. This loop
    /// is the only writer of room state.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) -> Result<(), RelayError> {
        tracing::info!("roomrelay server running");
        tokio::pin!(shutdown);

        let mut events = Vec::new();
        let mut outbox = Outbox::new();
        loop {
            let polled = tokio::select! {
                count = self.transport.poll_events(&mut events) => Some(count),
                () = &mut shutdown => None,
            };
            match polled {
                None => {
                    tracing::info!("shutdown requested");
                    break;
                }
                Some(0) => {
                    tracing::warn!("transport stopped");
                    break;
                }
                Some(_) => {}
            }

            for event in events.drain(..) {
                handle_event(&mut self.manager, event, &mut outbox);
                self.flush(&mut outbox);
            }
        }

        self.transport.shutdown().await?;
        tracing::info!(
            clients = self.manager.clients().len(),
            rooms = self.manager.rooms().len(),
            "roomrelay server stopped"
        );
        Ok(())
    }

    /// Hands every queued delivery to the transport.
    ///
    /// A failed send is not retried and does not undo the state change
    /// that produced it.
    fn flush(&self, outbox: &mut Outbox) {
        for delivery in outbox.drain() {
            let connection = delivery.connection;
            if let Err(e) = self.transport.send(connection, delivery.data, delivery.mode) {
                tracing::warn!(%connection, error = %e, "send failed");
            }
        }
    }
}

/// Applies one transport event to the room state.
pub(crate) fn handle_event(
    manager: &mut RoomManager,
    event: TransportEvent,
    outbox: &mut Outbox,
) {
    match event {
        TransportEvent::Connected { connection, peer } => {
            tracing::debug!(%connection, %peer, "peer admitted");
            manager.connect(connection, outbox);
        }
        TransportEvent::Disconnected { connection, reason } => {
            tracing::debug!(%connection, %reason, "peer gone");
            manager.disconnect(connection, outbox);
        }
        TransportEvent::Received {
            connection,
            data,
            mode,
        } => match Frame::decode(data) {
            Ok(Frame::Command { code, payload }) => {
                dispatch(manager, connection, code, payload, outbox);
            }
            Ok(Frame::Relay(data)) => {
                let len = data.len();
                match manager.relay(connection, data, mode, outbox) {
                    Ok(recipients) => {
                        tracing::debug!(%connection, len, recipients, "relayed");
                    }
                    Err(e) => {
                        tracing::debug!(%connection, len, error = %e, "dropping relay packet");
                    }
                }
            }
            Err(e) => {
                tracing::debug!(%connection, error = %e, "dropping malformed packet");
            }
        },
        TransportEvent::Error { peer, error } => {
            tracing::warn!(?peer, %error, "transport error");
        }
    }
}
