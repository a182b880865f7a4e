//! # roomrelay
//!
//! A relay server for small host/guest sessions.
//!
//! Clients connect with a shared key, then either open a room (becoming its
//! host) or join one by its code (becoming a guest). Control packets manage
//! the room; every other packet is forwarded untouched, from the host to all
//! guests or from a guest to the host. The relay never inspects what it
//! forwards.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roomrelay::prelude::*;
//!
//! # async fn start() -> Result<(), RelayError> {
//! let server = RelayServer::builder()
//!     .bind("0.0.0.0:7777")
//!     .connection_key("secret")
//!     .build()
//!     .await?;
//! server.run(std::future::pending()).await
//! # }
//! ```

mod dispatch;
mod error;
mod server;

pub use error::RelayError;
pub use server::{RelayServer, RelayServerBuilder};

/// Everything needed to run a relay or talk to one.
pub mod prelude {
    pub use crate::{RelayError, RelayServer, RelayServerBuilder};
    pub use roomrelay_protocol::{
        ClientId, Command, CommandCode, Frame, MemberInfo, Notice, ProtocolError,
        RoomCode, SendCode,
    };
    pub use roomrelay_room::{RoomConfig, RoomError};
    pub use roomrelay_transport::{
        CONNECTION_KEY_HEADER, CONNECTION_KEY_QUERY, ConnectionId, DeliveryMode,
        TransportError,
    };
}
