//! Room configuration.

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Limits for the room registry and client records.
///
/// The defaults suit a public relay; tests shrink `code_space` to make
/// exhaustion reachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomConfig {
    /// Room codes are drawn from `0..code_space`. This also caps the number
    /// of rooms open at once.
    pub code_space: u32,

    /// Random draws to try before falling back to a linear scan for a free
    /// code.
    pub code_draw_attempts: u32,

    /// Longest display name a client may set, in bytes.
    pub max_name_len: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            code_space: 10_000,
            code_draw_attempts: 32,
            max_name_len: 32,
        }
    }
}
