//! Core protocol types for roomrelay's wire format.
//!
//! Everything here travels on the wire. Inbound packets are first split by
//! [`Frame::decode`]; control packets then carry either a [`Command`]
//! (client → relay) or a [`Notice`] (relay → client).

use std::fmt;

use bytes::Bytes;

use crate::{PacketReader, PacketWriter, ProtocolError};

/// First byte of every control packet. Any other first byte marks a relay
/// packet.
pub const CONTROL_DISCRIMINATOR: u8 = 0;

/// Bytes in a control header: discriminator plus code.
pub const COMMAND_HEADER_LEN: usize = 2;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A process-unique identifier for a connected client.
///
/// Newtype over `u64` so it can't be mixed up with a [`RoomCode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

/// The code peers use to find a room. Drawn from a bounded range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomCode(pub u32);

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

/// One roster entry, as reported in `RoomMembers` and `MemberJoined`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    pub id: ClientId,
    pub name: String,
}

impl MemberInfo {
    fn write(&self, writer: &mut PacketWriter) {
        writer.put_u64(self.id.0).put_str(&self.name);
    }

    fn read(reader: &mut PacketReader) -> Result<Self, ProtocolError> {
        Ok(Self {
            id: ClientId(reader.read_u64()?),
            name: reader.read_string()?,
        })
    }
}

// ---------------------------------------------------------------------------
// Code tables
// ---------------------------------------------------------------------------

/// Control operations a client can ask the relay to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandCode {
    CreateRoom = 0,
    JoinRoom = 1,
    LeaveRoom = 2,
    StartRoom = 3,
    CloseRoom = 4,
    SetName = 5,
}

impl TryFrom<u8> for CommandCode {
    type Error = ProtocolError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => Self::CreateRoom,
            1 => Self::JoinRoom,
            2 => Self::LeaveRoom,
            3 => Self::StartRoom,
            4 => Self::CloseRoom,
            5 => Self::SetName,
            other => return Err(ProtocolError::UnknownCommand(other)),
        })
    }
}

/// Kinds of notice the relay sends back to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SendCode {
    Id = 0,
    RoomCode = 1,
    RoomMembers = 2,
    MemberJoined = 3,
    MemberLeft = 4,
    RoomStart = 5,
    RoomClosed = 6,
    Invalid = 7,
}

impl TryFrom<u8> for SendCode {
    type Error = ProtocolError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => Self::Id,
            1 => Self::RoomCode,
            2 => Self::RoomMembers,
            3 => Self::MemberJoined,
            4 => Self::MemberLeft,
            5 => Self::RoomStart,
            6 => Self::RoomClosed,
            7 => Self::Invalid,
            other => return Err(ProtocolError::UnknownSendCode(other)),
        })
    }
}

// ---------------------------------------------------------------------------
// Frame: control or relay?
// ---------------------------------------------------------------------------

/// An inbound packet after the first-byte split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Addressed to the relay. `code` is not validated here; the dispatcher
    /// owns the code table.
    Command { code: u8, payload: Bytes },

    /// Opaque traffic for the other side of the room, whole packet intact.
    Relay(Bytes),
}

impl Frame {
    /// Classifies a raw packet.
    ///
    /// # Errors
    /// [`ProtocolError::TooShort`] for an empty packet, or a control byte
    /// with no command code after it.
    pub fn decode(data: Bytes) -> Result<Self, ProtocolError> {
        match data.first() {
            None => Err(ProtocolError::TooShort { len: 0 }),
            Some(&CONTROL_DISCRIMINATOR) => {
                if data.len() < COMMAND_HEADER_LEN {
                    return Err(ProtocolError::TooShort { len: data.len() });
                }
                Ok(Self::Command {
                    code: data[1],
                    payload: data.slice(COMMAND_HEADER_LEN..),
                })
            }
            Some(_) => Ok(Self::Relay(data)),
        }
    }
}

// ---------------------------------------------------------------------------
// Command: client → relay
// ---------------------------------------------------------------------------

/// A control request, as a client builds it.
///
/// The relay reads command fields directly off the payload inside each
/// handler; this type exists for clients and tests that need to produce
/// well-formed packets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CreateRoom,
    JoinRoom(RoomCode),
    LeaveRoom,
    StartRoom,
    CloseRoom,
    SetName(String),
}

impl Command {
    /// The code this command travels under.
    pub fn code(&self) -> CommandCode {
        match self {
            Self::CreateRoom => CommandCode::CreateRoom,
            Self::JoinRoom(_) => CommandCode::JoinRoom,
            Self::LeaveRoom => CommandCode::LeaveRoom,
            Self::StartRoom => CommandCode::StartRoom,
            Self::CloseRoom => CommandCode::CloseRoom,
            Self::SetName(_) => CommandCode::SetName,
        }
    }

    /// Encodes the full control packet, header included.
    pub fn encode(&self) -> Bytes {
        let mut writer = PacketWriter::new();
        writer.put_u8(CONTROL_DISCRIMINATOR).put_u8(self.code() as u8);
        match self {
            Self::JoinRoom(code) => {
                writer.put_u32(code.0);
            }
            Self::SetName(name) => {
                writer.put_str(name);
            }
            Self::CreateRoom
            | Self::LeaveRoom
            | Self::StartRoom
            | Self::CloseRoom => {}
        }
        writer.finish()
    }
}

// ---------------------------------------------------------------------------
// Notice: relay → client
// ---------------------------------------------------------------------------

/// A control packet the relay sends to a client.
///
/// Field order per variant is fixed:
///
/// | Notice         | Fields                                      |
/// |----------------|---------------------------------------------|
/// | `Id`           | client id `u64`                             |
/// | `RoomCode`     | room code `u32`                             |
/// | `RoomMembers`  | count `u32`, then `(id u64, name string)*`  |
/// | `MemberJoined` | id `u64`, name string                       |
/// | `MemberLeft`   | id `u64`                                    |
/// | `RoomStart`    | none                                        |
/// | `RoomClosed`   | none                                        |
/// | `Invalid`      | reason string                               |
///
/// `RoomMembers` is the roster a joiner sees *before* it was added: host
/// first, then guests in join order, never the joiner itself. The joiner
/// already knows its own id from `Id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Id(ClientId),
    RoomCode(RoomCode),
    RoomMembers(Vec<MemberInfo>),
    MemberJoined(MemberInfo),
    MemberLeft(ClientId),
    RoomStart,
    RoomClosed,
    Invalid(String),
}

impl Notice {
    /// The code this notice travels under.
    pub fn code(&self) -> SendCode {
        match self {
            Self::Id(_) => SendCode::Id,
            Self::RoomCode(_) => SendCode::RoomCode,
            Self::RoomMembers(_) => SendCode::RoomMembers,
            Self::MemberJoined(_) => SendCode::MemberJoined,
            Self::MemberLeft(_) => SendCode::MemberLeft,
            Self::RoomStart => SendCode::RoomStart,
            Self::RoomClosed => SendCode::RoomClosed,
            Self::Invalid(_) => SendCode::Invalid,
        }
    }

    /// Encodes the full control packet, header included.
    pub fn encode(&self) -> Bytes {
        let mut writer = PacketWriter::new();
        writer.put_u8(CONTROL_DISCRIMINATOR).put_u8(self.code() as u8);
        match self {
            Self::Id(id) | Self::MemberLeft(id) => {
                writer.put_u64(id.0);
            }
            Self::RoomCode(code) => {
                writer.put_u32(code.0);
            }
            Self::RoomMembers(members) => {
                writer.put_u32(members.len() as u32);
                for member in members {
                    member.write(&mut writer);
                }
            }
            Self::MemberJoined(member) => member.write(&mut writer),
            Self::Invalid(reason) => {
                writer.put_str(reason);
            }
            Self::RoomStart | Self::RoomClosed => {}
        }
        writer.finish()
    }

    /// Decodes a notice packet (the client side of [`encode`](Self::encode)).
    pub fn decode(data: Bytes) -> Result<Self, ProtocolError> {
        let (code, payload) = match Frame::decode(data)? {
            Frame::Command { code, payload } => (code, payload),
            Frame::Relay(_) => return Err(ProtocolError::NotControl),
        };
        let mut reader = PacketReader::new(payload);
        Ok(match SendCode::try_from(code)? {
            SendCode::Id => Self::Id(ClientId(reader.read_u64()?)),
            SendCode::RoomCode => Self::RoomCode(RoomCode(reader.read_u32()?)),
            SendCode::RoomMembers => {
                let count = reader.read_u32()? as usize;
                // Every entry is at least 10 bytes; don't trust `count`
                // for the allocation.
                let mut members = Vec::with_capacity(count.min(reader.remaining() / 10));
                for _ in 0..count {
                    members.push(MemberInfo::read(&mut reader)?);
                }
                Self::RoomMembers(members)
            }
            SendCode::MemberJoined => {
                Self::MemberJoined(MemberInfo::read(&mut reader)?)
            }
            SendCode::MemberLeft => Self::MemberLeft(ClientId(reader.read_u64()?)),
            SendCode::RoomStart => Self::RoomStart,
            SendCode::RoomClosed => Self::RoomClosed,
            SendCode::Invalid => Self::Invalid(reader.read_string()?),
        })
    }
}

// =========================================================================
// Tests
// =========================================================================
