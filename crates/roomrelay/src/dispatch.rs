//! Command dispatch: control packets to room operations.
//!
//! Each command code maps to one handler in [`HANDLERS`]. A handler reads its
//! own fields off the payload and calls into the [`RoomManager`]. What goes
//! back to the client is decided here, in one place:
//!
//! - unknown code or malformed fields: logged and dropped, no reply
//! - refused room operation: `Invalid(reason)` to the sender
//! - event for a connection with no client record: logged only

use bytes::Bytes;
use roomrelay_protocol::{CommandCode, Notice, PacketReader, RoomCode};
use roomrelay_room::{Outbox, RoomManager};
use roomrelay_transport::ConnectionId;

use crate::RelayError;

type Handler = fn(
    &mut RoomManager,
    ConnectionId,
    &mut PacketReader,
    &mut Outbox,
) -> Result<(), RelayError>;

const HANDLERS: &[(CommandCode, Handler)] = &[
    (CommandCode::CreateRoom, create_room as Handler),
    (CommandCode::JoinRoom, join_room as Handler),
    (CommandCode::LeaveRoom, leave_room as Handler),
    (CommandCode::StartRoom, start_room as Handler),
    (CommandCode::CloseRoom, close_room as Handler),
    (CommandCode::SetName, set_name as Handler),
];

fn handler_for(code: CommandCode) -> Option<Handler> {
    HANDLERS
        .iter()
        .find(|(entry, _)| *entry == code)
        .map(|&(_, handler)| handler)
}

/// Runs the command `code` for `connection` with the given field bytes.
pub(crate) fn dispatch(
    manager: &mut RoomManager,
    connection: ConnectionId,
    code: u8,
    payload: Bytes,
    outbox: &mut Outbox,
) {
    let handler = match CommandCode::try_from(code) {
        Ok(command) => handler_for(command),
        Err(e) => {
            tracing::debug!(%connection, error = %e, "dropping control packet");
            return;
        }
    };
    let Some(handler) = handler else {
        tracing::debug!(%connection, code, "no handler for command");
        return;
    };

    let mut reader = PacketReader::new(payload);
    match handler(manager, connection, &mut reader, outbox) {
        Ok(()) => {}
        Err(RelayError::Room(e)) if e.is_reportable() => {
            tracing::debug!(%connection, code, error = %e, "command refused");
            outbox.notify(connection, &Notice::Invalid(e.to_string()));
        }
        Err(RelayError::Room(e)) => {
            tracing::warn!(%connection, code, error = %e, "command from unknown connection");
        }
        Err(e) => {
            tracing::debug!(%connection, code, error = %e, "dropping malformed command");
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn create_room(
    manager: &mut RoomManager,
    connection: ConnectionId,
    _fields: &mut PacketReader,
    outbox: &mut Outbox,
) -> Result<(), RelayError> {
    manager.create_room(connection, outbox)?;
    Ok(())
}

fn join_room(
    manager: &mut RoomManager,
    connection: ConnectionId,
    fields: &mut PacketReader,
    outbox: &mut Outbox,
) -> Result<(), RelayError> {
    let code = RoomCode(fields.read_u32()?);
    manager.join_room(connection, code, outbox)?;
    Ok(())
}

fn leave_room(
    manager: &mut RoomManager,
    connection: ConnectionId,
    _fields: &mut PacketReader,
    outbox: &mut Outbox,
) -> Result<(), RelayError> {
    manager.leave_room(connection, outbox)?;
    Ok(())
}

fn start_room(
    manager: &mut RoomManager,
    connection: ConnectionId,
    _fields: &mut PacketReader,
    outbox: &mut Outbox,
) -> Result<(), RelayError> {
    manager.start_room(connection, outbox)?;
    Ok(())
}

fn close_room(
    manager: &mut RoomManager,
    connection: ConnectionId,
    _fields: &mut PacketReader,
    outbox: &mut Outbox,
) -> Result<(), RelayError> {
    manager.close_room(connection, outbox)?;
    Ok(())
}

fn set_name(
    manager: &mut RoomManager,
    connection: ConnectionId,
    fields: &mut PacketReader,
    _outbox: &mut Outbox,
) -> Result<(), RelayError> {
    let name = fields.read_string()?;
    manager.set_name(connection, name)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use roomrelay_protocol::{Command, Frame};
    use roomrelay_room::Role;

    use super::*;

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    /// Encodes `command` the way a client would, dispatches it, and returns
    /// the notices addressed back to the sender.
    fn send(manager: &mut RoomManager, connection: ConnectionId, command: Command) -> Vec<Notice> {
        let Frame::Command { code, payload } = Frame::decode(command.encode()).unwrap() else {
            panic!("commands encode as control packets");
        };
        let mut outbox = Outbox::new();
        dispatch(manager, connection, code, payload, &mut outbox);
        outbox
            .drain()
            .filter(|d| d.connection == connection)
            .map(|d| Notice::decode(d.data).unwrap())
            .collect()
    }

    fn connected(ids: &[u64]) -> RoomManager {
        let mut manager = RoomManager::default();
        let mut outbox = Outbox::new();
        for &id in ids {
            manager.connect(conn(id), &mut outbox);
        }
        manager
    }

    #[test]
    fn test_every_command_code_has_a_handler() {
        for code in 0..=5u8 {
            let command = CommandCode::try_from(code).unwrap();
            assert!(handler_for(command).is_some(), "{command:?}");
        }
        assert_eq!(HANDLERS.len(), 6);
    }

    #[test]
    fn test_create_room_replies_room_code() {
        let mut manager = connected(&[1]);
        let replies = send(&mut manager, conn(1), Command::CreateRoom);

        let [Notice::RoomCode(code)] = replies.as_slice() else {
            panic!("expected RoomCode, got {replies:?}");
        };
        assert_eq!(manager.role(conn(1)), Ok(Role::Host(*code)));
    }

    #[test]
    fn test_join_reads_room_code_field() {
        let mut manager = connected(&[1, 2]);
        let mut outbox = Outbox::new();
        let code = manager.create_room(conn(1), &mut outbox).unwrap();

        let replies = send(&mut manager, conn(2), Command::JoinRoom(code));
        assert!(matches!(replies.as_slice(), [Notice::RoomMembers(_)]));
        assert_eq!(manager.role(conn(2)), Ok(Role::Guest(code)));
    }

    #[test]
    fn test_refused_command_replies_invalid_with_reason() {
        let mut manager = connected(&[1]);
        let replies = send(&mut manager, conn(1), Command::JoinRoom(RoomCode(77)));
        assert_eq!(replies, vec![Notice::Invalid("Invalid Room Code".into())]);

        let replies = send(&mut manager, conn(1), Command::LeaveRoom);
        assert_eq!(replies, vec![Notice::Invalid("Client not in room".into())]);
    }

    #[test]
    fn test_guest_close_replies_invalid_and_nothing_else() {
        let mut manager = connected(&[1, 2]);
        let mut outbox = Outbox::new();
        let code = manager.create_room(conn(1), &mut outbox).unwrap();
        manager.join_room(conn(2), code, &mut outbox).unwrap();

        let replies = send(&mut manager, conn(2), Command::CloseRoom);
        assert_eq!(
            replies,
            vec![Notice::Invalid("Guest attempted to close room".into())]
        );
        assert!(manager.rooms().contains(code));
    }

    #[test]
    fn test_unknown_code_is_dropped_silently() {
        let mut manager = connected(&[1]);
        let mut outbox = Outbox::new();
        dispatch(&mut manager, conn(1), 42, Bytes::new(), &mut outbox);
        assert!(outbox.is_empty());
        assert_eq!(manager.role(conn(1)), Ok(Role::NoRoom));
    }

    #[test]
    fn test_truncated_join_is_dropped_silently() {
        let mut manager = connected(&[1]);
        let mut outbox = Outbox::new();
        let payload = Bytes::from_static(&[1, 2]);
        dispatch(&mut manager, conn(1), CommandCode::JoinRoom as u8, payload, &mut outbox);
        assert!(outbox.is_empty());
    }

    #[test]
    fn test_unknown_connection_gets_no_reply() {
        let mut manager = RoomManager::default();
        let replies = send(&mut manager, conn(9), Command::CreateRoom);
        assert!(replies.is_empty());
        assert!(manager.rooms().is_empty());
    }

    #[test]
    fn test_set_name_shows_up_in_roster() {
        let mut manager = connected(&[1, 2]);
        assert!(send(&mut manager, conn(1), Command::SetName("host".into())).is_empty());
        let mut outbox = Outbox::new();
        let code = manager.create_room(conn(1), &mut outbox).unwrap();

        let replies = send(&mut manager, conn(2), Command::JoinRoom(code));
        let [Notice::RoomMembers(roster)] = replies.as_slice() else {
            panic!("expected RoomMembers, got {replies:?}");
        };
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].name, "host");
    }

    #[test]
    fn test_long_name_replies_name_too_long() {
        let mut manager = connected(&[1]);
        let replies = send(&mut manager, conn(1), Command::SetName("x".repeat(33)));
        assert_eq!(replies, vec![Notice::Invalid("Name too long".into())]);
    }
}
