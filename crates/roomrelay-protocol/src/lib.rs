//! Wire protocol for roomrelay.
//!
//! This crate defines the bytes that clients and the relay exchange:
//!
//! - **Frames** ([`Frame`]): the first-byte split between *control*
//!   packets addressed to the relay and *relay* packets it forwards blindly.
//! - **Messages** ([`Command`], [`Notice`]): the typed control packets in
//!   each direction, with their code tables ([`CommandCode`], [`SendCode`]).
//! - **Codec** ([`PacketReader`], [`PacketWriter`]): little-endian field
//!   cursors the messages are built from.
//! - **Errors** ([`ProtocolError`]): what can go wrong while decoding.
//!
//! # Packet layout
//!
//! ```text
//! control: [0x00][code: u8][fields...]
//! relay:   [b != 0x00][opaque bytes...]        forwarded unmodified
//!
//! u32/u64  little-endian
//! string   u16 byte length + UTF-8
//! list     u32 count + items
//! ```
//!
//! The protocol layer knows nothing about rooms or connections. It only
//! turns bytes into typed values and back.

mod codec;
mod error;
mod types;

pub use codec::{MAX_STRING_LEN, PacketReader, PacketWriter};
pub use error::ProtocolError;
pub use types::{
    COMMAND_HEADER_LEN, CONTROL_DISCRIMINATOR, ClientId, Command, CommandCode,
    Frame, MemberInfo, Notice, RoomCode, SendCode,
};
