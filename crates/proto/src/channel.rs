//! Channel endpoint wrapper.
//!
//! Wraps one byte-stream endpoint and speaks the framed message protocol
//! over it. Reads and writes retry until the full frame is transferred
//! (`read_exact` / `write_all`); a peer that has gone away is surfaced
//! in-band rather than as an error.

use std::io;

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::errors::ProtoError;
use crate::message::{Message, MessageTag, MAX_MESSAGE_SIZE};

/// Outcome of a send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendStatus {
    /// The full frame was written.
    Sent,
    /// The peer has closed its endpoint; nothing was delivered. This is the
    /// normal "parent has moved on" signal and callers treat it as success.
    PeerClosed,
}

/// One endpoint of a parent/child message channel.
///
/// Closing the endpoint is the half-close signal the peer uses to detect
/// that this process has finished reporting; [`Channel::close`] consumes the
/// channel so it can only happen once, and dropping the channel closes the
/// endpoint as a backstop.
#[derive(Debug)]
pub struct Channel<S> {
    stream: S,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Channel<S> {
    /// Wrap an already-connected endpoint.
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    /// Send a value message.
    pub async fn send_value(
        &mut self,
        tag: MessageTag,
        value: i64,
    ) -> Result<SendStatus, ProtoError> {
        let mut buf = BytesMut::with_capacity(1 + 8);
        buf.put_u8(tag as u8);
        buf.put_slice(&value.to_ne_bytes());
        self.write_frame(&buf).await
    }

    /// Send a string message.
    pub async fn send_string(
        &mut self,
        tag: MessageTag,
        payload: &[u8],
    ) -> Result<SendStatus, ProtoError> {
        if payload.len() > MAX_MESSAGE_SIZE {
            return Err(ProtoError::MessageTooLarge {
                size: payload.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }

        let mut buf = BytesMut::with_capacity(1 + 4 + payload.len());
        buf.put_u8(tag as u8);
        buf.put_slice(&(payload.len() as u32).to_ne_bytes());
        buf.put_slice(payload);
        self.write_frame(&buf).await
    }

    /// Receive the next message.
    ///
    /// Returns `Ok(None)` when the peer has closed the channel, whether at a
    /// frame boundary or mid-frame: a short read whose cause is a full
    /// channel closure is the normal end-of-conversation signal.
    pub async fn recv(&mut self) -> Result<Option<Message>, ProtoError> {
        let mut tag_buf = [0u8; 1];
        match self.stream.read_exact(&mut tag_buf).await {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                trace!("channel closed by peer");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        }

        let tag = MessageTag::try_from(tag_buf[0])?;

        if tag.carries_string() {
            let mut len_buf = [0u8; 4];
            if self.read_or_eof(&mut len_buf).await?.is_none() {
                return Ok(None);
            }
            let len = u32::from_ne_bytes(len_buf) as usize;
            if len > MAX_MESSAGE_SIZE {
                return Err(ProtoError::MessageTooLarge {
                    size: len,
                    max: MAX_MESSAGE_SIZE,
                });
            }

            let mut payload = vec![0u8; len];
            if self.read_or_eof(&mut payload).await?.is_none() {
                return Ok(None);
            }

            Ok(Some(Message::Text {
                tag,
                payload: Bytes::from(payload),
            }))
        } else {
            let mut value_buf = [0u8; 8];
            if self.read_or_eof(&mut value_buf).await?.is_none() {
                return Ok(None);
            }
            let value = i64::from_ne_bytes(value_buf);

            Ok(Some(Message::Value { tag, value }))
        }
    }

    /// Close the endpoint. Consumes the channel: close happens exactly once.
    pub async fn close(mut self) -> Result<(), ProtoError> {
        match self.stream.shutdown().await {
            Ok(()) => Ok(()),
            // Already torn down by the peer
            Err(e) if is_peer_gone(&e) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_frame(&mut self, frame: &[u8]) -> Result<SendStatus, ProtoError> {
        let write = async {
            self.stream.write_all(frame).await?;
            self.stream.flush().await
        };
        match write.await {
            Ok(()) => Ok(SendStatus::Sent),
            Err(e) if is_peer_gone(&e) => {
                trace!("send observed closed channel");
                Ok(SendStatus::PeerClosed)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn read_or_eof(&mut self, buf: &mut [u8]) -> Result<Option<()>, ProtoError> {
        match self.stream.read_exact(buf).await {
            Ok(_) => Ok(Some(())),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn is_peer_gone(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::UnexpectedEof
            | io::ErrorKind::NotConnected
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{RevokeInstruction, RevokeResponse};

    #[tokio::test]
    async fn value_message_roundtrip() {
        let (a, b) = tokio::io::duplex(256);
        let mut tx = Channel::new(a);
        let mut rx = Channel::new(b);

        let status = tx
            .send_value(
                MessageTag::RevokeResponse,
                RevokeResponse::Renewable.value(),
            )
            .await
            .unwrap();
        assert_eq!(status, SendStatus::Sent);

        let msg = rx.recv().await.unwrap().unwrap();
        assert_eq!(
            msg,
            Message::Value {
                tag: MessageTag::RevokeResponse,
                value: 1,
            }
        );
    }

    #[tokio::test]
    async fn string_message_roundtrip() {
        let (a, b) = tokio::io::duplex(256);
        let mut tx = Channel::new(a);
        let mut rx = Channel::new(b);

        tx.send_string(MessageTag::CertSubmission, b"TUlJQg==")
            .await
            .unwrap();

        let msg = rx.recv().await.unwrap().unwrap();
        match msg {
            Message::Text { tag, payload } => {
                assert_eq!(tag, MessageTag::CertSubmission);
                assert_eq!(&payload[..], b"TUlJQg==");
            }
            other => panic!("expected string message, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn messages_arrive_in_send_order() {
        let (a, b) = tokio::io::duplex(1024);
        let mut tx = Channel::new(a);
        let mut rx = Channel::new(b);

        tx.send_value(MessageTag::RevokeResponse, 1).await.unwrap();
        tx.send_string(MessageTag::CertSubmission, b"payload")
            .await
            .unwrap();

        let first = rx.recv().await.unwrap().unwrap();
        assert_eq!(first.tag(), MessageTag::RevokeResponse);
        let second = rx.recv().await.unwrap().unwrap();
        assert_eq!(second.tag(), MessageTag::CertSubmission);
    }

    #[tokio::test]
    async fn recv_on_closed_channel_returns_none() {
        let (a, b) = tokio::io::duplex(256);
        let tx = Channel::new(a);
        let mut rx = Channel::new(b);

        tx.close().await.unwrap();

        assert!(rx.recv().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn recv_mid_frame_close_returns_none() {
        let (mut a, b) = tokio::io::duplex(256);
        let mut rx = Channel::new(b);

        // Tag only, then close: a truncated instruction frame
        tokio::io::AsyncWriteExt::write_all(&mut a, &[MessageTag::RevokeInstruction as u8])
            .await
            .unwrap();
        drop(a);

        assert!(rx.recv().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn send_after_peer_close_is_noop_success() {
        let (a, b) = tokio::io::duplex(256);
        let mut tx = Channel::new(a);
        drop(b);

        let status = tx
            .send_value(MessageTag::RevokeResponse, 0)
            .await
            .unwrap();
        assert_eq!(status, SendStatus::PeerClosed);
    }

    #[tokio::test]
    async fn unknown_tag_is_an_error() {
        let (mut a, b) = tokio::io::duplex(256);
        let mut rx = Channel::new(b);

        tokio::io::AsyncWriteExt::write_all(&mut a, &[0x7fu8, 0, 0, 0, 0, 0, 0, 0, 0])
            .await
            .unwrap();

        assert!(matches!(
            rx.recv().await,
            Err(ProtoError::UnknownTag(0x7f))
        ));
    }

    #[tokio::test]
    async fn oversized_string_send_is_rejected() {
        let (a, _b) = tokio::io::duplex(256);
        let mut tx = Channel::new(a);

        let payload = vec![b'A'; MAX_MESSAGE_SIZE + 1];
        assert!(matches!(
            tx.send_string(MessageTag::CertSubmission, &payload).await,
            Err(ProtoError::MessageTooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn instruction_roundtrip_through_channel() {
        let (a, b) = tokio::io::duplex(256);
        let mut parent = Channel::new(a);
        let mut child = Channel::new(b);

        parent
            .send_value(
                MessageTag::RevokeInstruction,
                RevokeInstruction::Check.value(),
            )
            .await
            .unwrap();

        match child.recv().await.unwrap().unwrap() {
            Message::Value { tag, value } => {
                assert_eq!(tag, MessageTag::RevokeInstruction);
                assert_eq!(
                    RevokeInstruction::from_value(value),
                    Some(RevokeInstruction::Check)
                );
            }
            other => panic!("expected value message, got {other:?}"),
        }
    }
}
