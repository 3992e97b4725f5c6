//! Checker error types.

use std::path::PathBuf;

use thiserror::Error;

/// Structural certificate errors.
///
/// Every variant is fatal to the invocation and resolves to a
/// coverage-mismatch outcome; an unparseable certificate is never assumed
/// safe to skip.
#[derive(Error, Debug)]
pub enum CheckError {
    #[error("failed to read certificate {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse certificate PEM: {0}")]
    Pem(String),

    #[error("invalid X509 certificate: {0}")]
    X509(String),

    #[error("invalid certificate DER structure: {0}")]
    Der(String),

    #[error("expected exactly one subject-alt-name extension, found {0}")]
    SanCount(usize),

    #[error("malformed subject-alt-name extension")]
    MalformedSan,

    #[error("bad not-after time encoding: {0}")]
    Time(String),
}
