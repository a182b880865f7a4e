//! Room manager: the lifecycle operations over both registries.
//!
//! `RoomManager` is the server's whole mutable state. Each operation checks
//! its preconditions first and returns a [`RoomError`] without touching
//! anything if one fails; on success it mutates the registries and queues
//! the notices that describe the change.

use roomrelay_protocol::{ClientId, MemberInfo, Notice, RoomCode};
use roomrelay_transport::ConnectionId;

use crate::{
    Client, ClientRegistry, Outbox, Role, Room, RoomConfig, RoomError,
    RoomRegistry,
};

/// Owns the client and room registries and keeps them consistent.
///
/// The invariant it maintains: a client's `room` is set iff the client is
/// a member (host or guest) of exactly that open room.
#[derive(Debug, Default)]
pub struct RoomManager {
    pub(crate) clients: ClientRegistry,
    pub(crate) rooms: RoomRegistry,
}

impl RoomManager {
    /// Creates a manager with no clients and no rooms.
    pub fn new(config: RoomConfig) -> Self {
        Self {
            clients: ClientRegistry::new(),
            rooms: RoomRegistry::new(config),
        }
    }

    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    pub fn client(&self, connection: ConnectionId) -> Option<&Client> {
        self.clients.get(connection)
    }

    pub fn room(&self, code: RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    /// Where `connection` stands in the room state machine.
    ///
    /// # Errors
    /// [`RoomError::UnknownConnection`] if there is no such client.
    pub fn role(&self, connection: ConnectionId) -> Result<Role, RoomError> {
        let client = self
            .clients
            .get(connection)
            .ok_or(RoomError::UnknownConnection(connection))?;
        let role = match client.room().and_then(|code| self.rooms.get(code)) {
            Some(room) if room.is_host(connection) => Role::Host(room.code()),
            Some(room) => Role::Guest(room.code()),
            None => Role::NoRoom,
        };
        Ok(role)
    }

    // -----------------------------------------------------------------------
    // Connection lifecycle
    // -----------------------------------------------------------------------

    /// Registers a newly admitted connection and sends it its `Id`.
    ///
    /// A connection that is already registered keeps its record and gets
    /// no second `Id`.
    pub fn connect(&mut self, connection: ConnectionId, outbox: &mut Outbox) -> ClientId {
        if let Some(existing) = self.clients.get(connection) {
            tracing::debug!(%connection, client = %existing.id(), "duplicate connect ignored");
            return existing.id();
        }
        let id = self.clients.register(connection).id();
        outbox.notify(connection, &Notice::Id(id));
        tracing::info!(
            %connection,
            client = %id,
            online = self.clients.len(),
            "client connected"
        );
        id
    }

    /// Cleans up after a connection that went away.
    ///
    /// A host's room is closed (the remaining guests get `RoomClosed`); a
    /// guest leaves (the remaining members get `MemberLeft`). The client
    /// record is removed last and returned. Nothing is queued for the
    /// departed connection itself.
    pub fn disconnect(
        &mut self,
        connection: ConnectionId,
        outbox: &mut Outbox,
    ) -> Option<Client> {
        match self.role(connection).ok()? {
            Role::Host(code) => self.close(code, Some(connection), outbox),
            Role::Guest(code) => self.depart(connection, code, outbox),
            Role::NoRoom => {}
        }
        let client = self.clients.remove(connection);
        tracing::info!(
            %connection,
            online = self.clients.len(),
            "client disconnected"
        );
        client
    }

    /// Sets the display name reported in later roster notices.
    pub fn set_name(
        &mut self,
        connection: ConnectionId,
        name: String,
    ) -> Result<(), RoomError> {
        let max = self.rooms.config().max_name_len;
        let client = self
            .clients
            .get_mut(connection)
            .ok_or(RoomError::UnknownConnection(connection))?;
        if name.len() > max {
            return Err(RoomError::NameTooLong {
                len: name.len(),
                max,
            });
        }
        tracing::debug!(%connection, %name, "client named");
        client.set_name(name);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Room commands
    // -----------------------------------------------------------------------

    /// Opens a room with `connection` as host and replies `RoomCode`.
    pub fn create_room(
        &mut self,
        connection: ConnectionId,
        outbox: &mut Outbox,
    ) -> Result<RoomCode, RoomError> {
        if self.role(connection)? != Role::NoRoom {
            return Err(RoomError::AlreadyInRoom);
        }
        let code = self.rooms.allocate_code()?;
        let inserted = self.rooms.insert(Room::new(code, connection));
        debug_assert!(inserted, "allocated code {code} was taken");
        self.assign(connection, Some(code));

        outbox.notify(connection, &Notice::RoomCode(code));
        tracing::info!(%connection, %code, rooms = self.rooms.len(), "room created");
        Ok(code)
    }

    /// Adds `connection` to room `code` as a guest.
    ///
    /// Existing members get `MemberJoined(joiner)`; the joiner gets
    /// `RoomMembers` with the roster as it was before the join. Then the
    /// joiner is appended.
    pub fn join_room(
        &mut self,
        connection: ConnectionId,
        code: RoomCode,
        outbox: &mut Outbox,
    ) -> Result<(), RoomError> {
        if self.role(connection)? != Role::NoRoom {
            return Err(RoomError::AlreadyInRoom);
        }
        let room = self.rooms.get(code).ok_or(RoomError::InvalidRoomCode(code))?;
        let joiner = self.member_info(connection)?;
        let roster: Vec<MemberInfo> = room
            .members()
            .filter_map(|member| self.clients.get(member).map(Client::member_info))
            .collect();

        outbox.broadcast(room.members(), &Notice::MemberJoined(joiner));
        outbox.notify(connection, &Notice::RoomMembers(roster));

        if let Some(room) = self.rooms.get_mut(code) {
            room.add_guest(connection);
        }
        self.assign(connection, Some(code));
        tracing::info!(%connection, %code, "client joined room");
        Ok(())
    }

    /// Removes a guest from its room; the remaining members get
    /// `MemberLeft`.
    pub fn leave_room(
        &mut self,
        connection: ConnectionId,
        outbox: &mut Outbox,
    ) -> Result<(), RoomError> {
        match self.role(connection)? {
            Role::NoRoom => Err(RoomError::NotInRoom),
            Role::Host(_) => Err(RoomError::HostCannotLeave),
            Role::Guest(code) => {
                self.depart(connection, code, outbox);
                Ok(())
            }
        }
    }

    /// Announces `RoomStart` to every member. The room stays open.
    pub fn start_room(
        &mut self,
        connection: ConnectionId,
        outbox: &mut Outbox,
    ) -> Result<(), RoomError> {
        match self.role(connection)? {
            Role::NoRoom => Err(RoomError::NotInRoom),
            Role::Guest(_) => Err(RoomError::GuestCannotStart),
            Role::Host(code) => {
                if let Some(room) = self.rooms.get(code) {
                    outbox.broadcast(room.members(), &Notice::RoomStart);
                    tracing::info!(%code, members = room.member_count(), "room started");
                }
                Ok(())
            }
        }
    }

    /// Closes the host's room: every member is released and told
    /// `RoomClosed`, and the code is freed.
    pub fn close_room(
        &mut self,
        connection: ConnectionId,
        outbox: &mut Outbox,
    ) -> Result<(), RoomError> {
        match self.role(connection)? {
            Role::NoRoom => Err(RoomError::NotInRoom),
            Role::Guest(_) => Err(RoomError::GuestCannotClose),
            Role::Host(code) => {
                self.close(code, None, outbox);
                Ok(())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn member_info(&self, connection: ConnectionId) -> Result<MemberInfo, RoomError> {
        self.clients
            .get(connection)
            .map(Client::member_info)
            .ok_or(RoomError::UnknownConnection(connection))
    }

    fn assign(&mut self, connection: ConnectionId, room: Option<RoomCode>) {
        if let Some(client) = self.clients.get_mut(connection) {
            client.room = room;
        }
    }

    fn depart(&mut self, connection: ConnectionId, code: RoomCode, outbox: &mut Outbox) {
        let Some(id) = self.clients.get(connection).map(Client::id) else {
            return;
        };
        if let Some(room) = self.rooms.get_mut(code) {
            room.remove_guest(connection);
            outbox.broadcast(room.members(), &Notice::MemberLeft(id));
        }
        self.assign(connection, None);
        tracing::info!(%connection, %code, "client left room");
    }

    /// Removes room `code` and releases its members. `departed` is skipped
    /// when notifying (its connection is already gone).
    fn close(&mut self, code: RoomCode, departed: Option<ConnectionId>, outbox: &mut Outbox) {
        let Some(room) = self.rooms.remove(code) else {
            return;
        };
        for member in room.members() {
            self.assign(member, None);
        }
        outbox.broadcast(
            room.members().filter(|&member| Some(member) != departed),
            &Notice::RoomClosed,
        );
        tracing::info!(
            %code,
            members = room.member_count(),
            rooms = self.rooms.len(),
            "room closed"
        );
    }
}
