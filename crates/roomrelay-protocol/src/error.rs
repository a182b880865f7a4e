//! Error types for the protocol layer.

/// Errors that can occur while decoding a packet.
///
/// Every variant is a *protocol* error: the relay logs it and drops the
/// packet without replying.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The packet is shorter than the header its first byte announces.
    #[error("packet too short: {len} bytes")]
    TooShort { len: usize },

    /// A control packet carried a command code the relay does not know.
    #[error("unknown command code {0}")]
    UnknownCommand(u8),

    /// A notice carried a send code the client does not know.
    #[error("unknown send code {0}")]
    UnknownSendCode(u8),

    /// A field ran past the end of the packet.
    #[error("truncated field: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    /// A string field was not valid UTF-8.
    #[error("string field is not valid UTF-8")]
    InvalidUtf8,

    /// A notice was expected but the packet is a relay packet.
    #[error("expected a control packet")]
    NotControl,
}
