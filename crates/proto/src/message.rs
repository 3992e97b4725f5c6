//! Message tags and payload enumerations.

use bytes::Bytes;

use crate::errors::ProtoError;

/// Maximum string-message payload size (1 MB).
///
/// A base64-encoded DER certificate is a few kilobytes; anything near this
/// limit indicates a corrupt frame or a misbehaving peer.
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Message tags.
///
/// The tag identifies the logical channel and fixes the frame shape that
/// follows: [`MessageTag::CertSubmission`] carries a string payload, the
/// others carry an 8-byte signed value.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageTag {
    /// Lifecycle report (checker -> parent)
    RevokeResponse = 0x01,
    /// Instruction reply (parent -> checker)
    RevokeInstruction = 0x02,
    /// Base64 DER certificate hand-off for revocation (checker -> parent)
    CertSubmission = 0x03,
}

impl MessageTag {
    /// Whether this tag is followed by a length-prefixed string payload
    /// rather than a fixed-width value.
    pub fn carries_string(self) -> bool {
        matches!(self, MessageTag::CertSubmission)
    }
}

impl TryFrom<u8> for MessageTag {
    type Error = ProtoError;

    fn try_from(value: u8) -> Result<Self, ProtoError> {
        match value {
            0x01 => Ok(MessageTag::RevokeResponse),
            0x02 => Ok(MessageTag::RevokeInstruction),
            0x03 => Ok(MessageTag::CertSubmission),
            _ => Err(ProtoError::UnknownTag(value)),
        }
    }
}

/// A decoded channel message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Fixed-width value message.
    Value { tag: MessageTag, value: i64 },
    /// Length-prefixed string message.
    Text { tag: MessageTag, payload: Bytes },
}

impl Message {
    /// The tag of this message regardless of frame shape.
    pub fn tag(&self) -> MessageTag {
        match self {
            Message::Value { tag, .. } | Message::Text { tag, .. } => *tag,
        }
    }
}

/// Value payloads for [`MessageTag::RevokeResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeResponse {
    /// Certificate needs no action.
    Current,
    /// Certificate needs issuance, or is live and offered for revocation.
    Renewable,
}

impl RevokeResponse {
    /// Wire value of this response.
    pub fn value(self) -> i64 {
        match self {
            RevokeResponse::Current => 0,
            RevokeResponse::Renewable => 1,
        }
    }
}

/// Value payloads for [`MessageTag::RevokeInstruction`].
///
/// Any other wire value is a protocol violation by the parent; callers must
/// not reply to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeInstruction {
    /// Continue normally.
    Check,
    /// Stop without further action.
    Stop,
}

impl RevokeInstruction {
    /// Wire value of this instruction.
    pub fn value(self) -> i64 {
        match self {
            RevokeInstruction::Check => 0,
            RevokeInstruction::Stop => 1,
        }
    }

    /// Decode a wire value; `None` for values outside the closed enumeration.
    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            0 => Some(RevokeInstruction::Check),
            1 => Some(RevokeInstruction::Stop),
            _ => None,
        }
    }
}
