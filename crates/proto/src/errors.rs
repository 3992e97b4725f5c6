//! Protocol error types.

use thiserror::Error;

/// Errors raised while framing or unframing channel messages.
///
/// Peer absence (the parent closing its endpoint) is deliberately *not* an
/// error variant: it is reported in-band by [`crate::Channel`].
#[derive(Error, Debug)]
pub enum ProtoError {
    #[error("unknown message tag: 0x{0:02x}")]
    UnknownTag(u8),

    #[error("message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
