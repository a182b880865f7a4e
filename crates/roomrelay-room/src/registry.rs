//! The room registry: open rooms by code, and code allocation.

use std::collections::HashMap;

use rand::Rng;
use roomrelay_protocol::RoomCode;

use crate::{Room, RoomConfig, RoomError};

/// Every open room, keyed by its code.
///
/// A room is in here exactly as long as it is open; closing removes it and
/// frees the code for reuse.
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, Room>,
    config: RoomConfig,
}

impl RoomRegistry {
    /// Creates an empty registry.
    pub fn new(config: RoomConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Picks a code no open room uses.
    ///
    /// Draws uniformly from `0..code_space` up to `code_draw_attempts`
    /// times. If every draw collides, scans the space from a random offset
    /// so a free code is always found when one exists.
    ///
    /// # Errors
    /// [`RoomError::CodeSpaceExhausted`] when every code is taken.
    pub fn allocate_code(&self) -> Result<RoomCode, RoomError> {
        let space = self.config.code_space;
        if space == 0 || self.rooms.len() >= space as usize {
            return Err(RoomError::CodeSpaceExhausted);
        }

        let mut rng = rand::rng();
        for _ in 0..self.config.code_draw_attempts {
            let code = RoomCode(rng.random_range(0..space));
            if !self.rooms.contains_key(&code) {
                return Ok(code);
            }
        }

        let start = rng.random_range(0..space);
        tracing::debug!(
            attempts = self.config.code_draw_attempts,
            "random room code draws collided, scanning"
        );
        (0..space)
            .map(|offset| {
                RoomCode(((u64::from(start) + u64::from(offset)) % u64::from(space)) as u32)
            })
            .find(|code| !self.rooms.contains_key(code))
            .ok_or(RoomError::CodeSpaceExhausted)
    }

    /// Registers a room under its code, replacing nothing.
    ///
    /// Returns `false` (and drops `room`) if the code is already taken.
    pub fn insert(&mut self, room: Room) -> bool {
        let code = room.code();
        if self.rooms.contains_key(&code) {
            return false;
        }
        self.rooms.insert(code, room);
        true
    }

    pub fn get(&self, code: RoomCode) -> Option<&Room> {
        self.rooms.get(&code)
    }

    pub(crate) fn get_mut(&mut self, code: RoomCode) -> Option<&mut Room> {
        self.rooms.get_mut(&code)
    }

    /// Removes a room and returns it, freeing its code.
    pub fn remove(&mut self, code: RoomCode) -> Option<Room> {
        self.rooms.remove(&code)
    }

    pub fn contains(&self, code: RoomCode) -> bool {
        self.rooms.contains_key(&code)
    }

    /// Number of open rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}
