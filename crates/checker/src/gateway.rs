//! IPC gateway.
//!
//! Reports the lifecycle outcome to the coordinating parent and drives the
//! revocation hand-off. Owns the channel endpoint for the whole exchange:
//! on every exit path the endpoint is closed exactly once, before any other
//! teardown, because the half-close is the signal the parent uses to detect
//! that this process has finished reporting.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

use certproc_proto::{
    Channel, Message, MessageTag, ProtoError, RevokeInstruction, RevokeResponse, SendStatus,
};

use crate::inspect::CertificateFacts;
use crate::lifecycle::LifecycleOutcome;

/// Errors terminating the report exchange.
///
/// `CheckFailed` is a bad certificate; `ProtocolViolation` is a misbehaving
/// parent. The two must stay distinguishable in logs and exit paths.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("certificate check failed; nothing reported")]
    CheckFailed,

    #[error("parent violated the instruction protocol: {0}")]
    ProtocolViolation(String),

    #[error("internal invariant broken: {0}")]
    Internal(&'static str),

    #[error(transparent)]
    Proto(#[from] ProtoError),
}

/// Report `outcome` over the channel and run the exchange to completion.
///
/// Consumes the channel; it is closed exactly once whichever way the
/// exchange ends. A peer that has already gone away is a clean success on
/// every path.
pub async fn report<S: AsyncRead + AsyncWrite + Unpin>(
    mut channel: Channel<S>,
    outcome: LifecycleOutcome,
    facts: Option<&CertificateFacts>,
    revoke: bool,
) -> Result<(), ReportError> {
    let result = drive(&mut channel, outcome, facts, revoke).await;

    // Half-close first; errors from the exchange itself take precedence
    let closed = channel.close().await;
    result?;
    closed?;
    Ok(())
}

async fn drive<S: AsyncRead + AsyncWrite + Unpin>(
    channel: &mut Channel<S>,
    outcome: LifecycleOutcome,
    facts: Option<&CertificateFacts>,
    revoke: bool,
) -> Result<(), ReportError> {
    match (outcome, revoke) {
        // Nothing on disk: report and terminate without waiting
        (LifecycleOutcome::NoCertificate, false) => {
            info!("reporting: needs issuance");
            channel
                .send_value(
                    MessageTag::RevokeResponse,
                    RevokeResponse::Renewable.value(),
                )
                .await?;
            Ok(())
        }
        (LifecycleOutcome::NoCertificate, true) => {
            info!("reporting: nothing to revoke");
            channel
                .send_value(MessageTag::RevokeResponse, RevokeResponse::Current.value())
                .await?;
            Ok(())
        }

        // The diagnostic detail was already logged at decision time; the
        // channel carries only the closed enumeration, so a failed check is
        // reported by closing without a message
        (LifecycleOutcome::CoverageMismatch, _) => Err(ReportError::CheckFailed),

        // Revoke hand-off: the certificate is live and eligible
        (LifecycleOutcome::Current | LifecycleOutcome::Renewable, true) => {
            let facts = facts.ok_or(ReportError::Internal(
                "lifecycle outcome without certificate facts",
            ))?;

            if channel
                .send_value(
                    MessageTag::RevokeResponse,
                    RevokeResponse::Renewable.value(),
                )
                .await?
                == SendStatus::PeerClosed
            {
                return Ok(());
            }

            let encoded = BASE64.encode(&facts.der);
            info!(der_len = facts.der.len(), "submitting certificate for revocation");
            channel
                .send_string(MessageTag::CertSubmission, encoded.as_bytes())
                .await?;
            Ok(())
        }

        // Check mode: report, then block for exactly one instruction
        (outcome @ (LifecycleOutcome::Current | LifecycleOutcome::Renewable), false) => {
            let response = match outcome {
                LifecycleOutcome::Renewable => RevokeResponse::Renewable,
                _ => RevokeResponse::Current,
            };

            if channel
                .send_value(MessageTag::RevokeResponse, response.value())
                .await?
                == SendStatus::PeerClosed
            {
                debug!("parent already gone before report; exiting clean");
                return Ok(());
            }

            match channel.recv().await? {
                None => {
                    debug!("parent closed the channel instead of replying; exiting clean");
                    Ok(())
                }
                Some(Message::Value {
                    tag: MessageTag::RevokeInstruction,
                    value,
                }) => match RevokeInstruction::from_value(value) {
                    Some(RevokeInstruction::Check) => {
                        debug!("instruction: check acknowledged");
                        Ok(())
                    }
                    Some(RevokeInstruction::Stop) => {
                        debug!("instruction: stop");
                        Ok(())
                    }
                    None => Err(ReportError::ProtocolViolation(format!(
                        "unexpected instruction value {value}"
                    ))),
                },
                Some(other) => Err(ReportError::ProtocolViolation(format!(
                    "expected a revoke-instruction, got {:?}",
                    other.tag()
                ))),
            }
        }
    }
}
