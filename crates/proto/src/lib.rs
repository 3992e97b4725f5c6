//! Framed IPC message protocol for certproc privilege-separated processes.
//!
//! Each certproc child process talks to the coordinating parent over one
//! dedicated, already-connected byte-stream endpoint. Messages are typed and
//! framed; stream semantics guarantee delivery in send order on a single
//! channel.
//!
//! # Wire Format
//!
//! ```text
//! Value message:   +--------------+----------------------------+
//!                  | Tag (1 byte) | Value (8 bytes, i64, native)|
//!                  +--------------+----------------------------+
//!
//! String message:  +--------------+------------------+-------------------+
//!                  | Tag (1 byte) | Length (4, native)| Payload (N bytes) |
//!                  +--------------+------------------+-------------------+
//! ```
//!
//! The tag identifies the logical channel and determines which frame shape
//! follows. Tag values are stable within one deployment; both halves of a
//! pipeline must be built from the same protocol revision.
//!
//! A peer closing its endpoint is a normal signal ("parent has moved on"),
//! not an error: reads observe it as [`Channel::recv`] returning `None`, and
//! writes observe it as [`SendStatus::PeerClosed`].

mod channel;
mod errors;
mod message;

pub use channel::{Channel, SendStatus};
pub use errors::ProtoError;
pub use message::{Message, MessageTag, RevokeInstruction, RevokeResponse, MAX_MESSAGE_SIZE};
