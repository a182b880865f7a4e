//! Room lifecycle management for roomrelay.
//!
//! Everything here is synchronous and owns no I/O. The server loop hands
//! each transport event to the [`RoomManager`], which mutates its two
//! registries and queues the resulting packets in an [`Outbox`] for the
//! loop to flush.
//!
//! # Key types
//!
//! - [`RoomManager`]: the lifecycle operations (create/join/leave/start/
//!   close), disconnect cleanup and relay routing
//! - [`ClientRegistry`] / [`Client`]: who is connected
//! - [`RoomRegistry`] / [`Room`]: which rooms exist, code allocation
//! - [`Role`]: a client's place in the state machine
//! - [`Outbox`]: packets produced by an operation, waiting to be sent
//! - [`RoomConfig`]: code space and limits

mod client;
mod config;
mod error;
mod manager;
mod outbox;
mod registry;
mod relay;
mod room;

pub use client::{Client, ClientRegistry};
pub use config::RoomConfig;
pub use error::RoomError;
pub use manager::RoomManager;
pub use outbox::{Delivery, Outbox};
pub use registry::RoomRegistry;
pub use room::{Role, Room};
