//! The client registry: one record per admitted connection.
//!
//! A "client" is the relay's record of a connected peer. It tracks:
//! - WHO the peer is (`ClientId`, handed out here)
//! - HOW to reach it (the transport's `ConnectionId`)
//! - WHAT it calls itself (display name, empty until set)
//! - WHERE it is (the room it belongs to, if any)
//!
//! # Concurrency note
//!
//! `ClientRegistry` is a plain `HashMap` with no locking. It is owned by
//! the [`RoomManager`](crate::RoomManager), which is owned by the single
//! server loop.

use std::collections::HashMap;

use roomrelay_protocol::{ClientId, MemberInfo, RoomCode};
use roomrelay_transport::ConnectionId;

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// A single connected peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    id: ClientId,
    connection: ConnectionId,
    name: String,
    pub(crate) room: Option<RoomCode>,
}

impl Client {
    /// The id announced to the peer in its `Id` notice.
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// The transport handle this client is reached through.
    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    /// Display name; empty until the peer sends `SetName`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The room this client belongs to, if any.
    pub fn room(&self) -> Option<RoomCode> {
        self.room
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    /// This client as a roster entry.
    pub fn member_info(&self) -> MemberInfo {
        MemberInfo {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// ClientRegistry
// ---------------------------------------------------------------------------

/// Maps live connections to their [`Client`] records.
///
/// ## Lifecycle
///
/// ```text
/// register() ──→ [NoRoom] ⇄ [Host | Guest] ──→ remove()
/// ```
///
/// Room membership is changed by the [`RoomManager`](crate::RoomManager);
/// the registry only creates and destroys records.
#[derive(Debug)]
pub struct ClientRegistry {
    clients: HashMap<ConnectionId, Client>,

    /// Next id to hand out. Ids are never reused within a process.
    next_id: u64,
}

impl ClientRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            clients: HashMap::new(),
            next_id: 1,
        }
    }

    /// Creates the record for a newly admitted connection.
    ///
    /// A connection the transport reports twice keeps its first record.
    pub fn register(&mut self, connection: ConnectionId) -> &Client {
        let next_id = &mut self.next_id;
        self.clients.entry(connection).or_insert_with(|| {
            let id = ClientId(*next_id);
            *next_id += 1;
            tracing::debug!(%connection, client = %id, "client registered");
            Client {
                id,
                connection,
                name: String::new(),
                room: None,
            }
        })
    }

    /// Drops the record for a connection and returns it.
    pub fn remove(&mut self, connection: ConnectionId) -> Option<Client> {
        self.clients.remove(&connection)
    }

    /// Looks up a client by connection.
    pub fn get(&self, connection: ConnectionId) -> Option<&Client> {
        self.clients.get(&connection)
    }

    pub(crate) fn get_mut(&mut self, connection: ConnectionId) -> Option<&mut Client> {
        self.clients.get_mut(&connection)
    }

    /// Number of connected clients.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Returns `true` if nobody is connected.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}
