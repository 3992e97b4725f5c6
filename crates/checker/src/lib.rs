//! certproc checker - certificate-lifecycle decision process
//!
//! One privilege-separated child of a multi-process ACME client. Given a
//! stored certificate, the authoritative domain list and a mode, it decides
//! whether the certificate is current, renewable, absent, or mismatched,
//! reports the outcome to the coordinating parent over a framed message
//! channel, and in revoke mode hands the certificate over for revocation.
//!
//! # Components
//!
//! - [`inspect`] - extracts expiry and domain-coverage facts from the
//!   stored certificate
//! - [`coverage`] - proves the certificate's domain coverage exactly
//!   matches the requested domain set
//! - [`lifecycle`] - combines the facts into one terminal outcome
//! - [`gateway`] - reports the outcome over the IPC channel and drives the
//!   revocation hand-off
//!
//! The process is single-threaded and drives one inherited channel
//! endpoint; it reads the certificate file and persists nothing.

pub mod coverage;
pub mod error;
pub mod gateway;
pub mod inspect;
pub mod lifecycle;

pub use coverage::{validate_coverage, CoverageResult};
pub use error::CheckError;
pub use gateway::{report, ReportError};
pub use inspect::{inspect_file, CertificateFacts};
pub use lifecycle::{evaluate, LifecycleOutcome, RENEWAL_WINDOW_SECS};
