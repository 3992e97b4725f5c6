//! Certificate inspection.
//!
//! Derives the read-only facts the lifecycle decision needs from a stored
//! certificate: when it expires and which domain names it covers. The
//! expiry is decoded from the raw notAfter content octets rather than a
//! parser convenience accessor, so the decode path stays explicit and
//! testable.

use std::fs;
use std::path::Path;

use asn1_rs::{Any, Class, FromDer, Tag};
use tracing::debug;
use x509_parser::parse_x509_certificate;

use crate::error::CheckError;

pub mod san;
pub mod time;

use time::TimeEncoding;

/// Facts derived from one stored certificate, computed once per invocation.
#[derive(Debug, Clone)]
pub struct CertificateFacts {
    /// notAfter as unix seconds.
    pub expires_at: i64,
    /// Domain names asserted by the one SAN extension, emission order and
    /// duplicates preserved.
    pub covered: Vec<String>,
    /// DER serialization, retained for the revocation hand-off.
    pub der: Vec<u8>,
}

/// Load and inspect the certificate at `path`.
///
/// Returns `Ok(None)` when no certificate file is present; every parse or
/// decode problem is an `Err`, never silently skipped.
pub fn inspect_file(path: &Path) -> Result<Option<CertificateFacts>, CheckError> {
    if !path.exists() {
        debug!(path = %path.display(), "no certificate file present");
        return Ok(None);
    }

    let pem_bytes = fs::read(path).map_err(|e| CheckError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let pem = pem::parse(&pem_bytes).map_err(|e| CheckError::Pem(e.to_string()))?;
    let der = pem.contents().to_vec();

    let (_, cert) =
        parse_x509_certificate(&der).map_err(|e| CheckError::X509(e.to_string()))?;
    let covered = san::covered_domains(&cert)?;

    let (encoding, raw) = locate_not_after(&der)?;
    let expires_at = time::decode_not_after(encoding, raw)?;

    debug!(
        path = %path.display(),
        expires_at,
        covered = ?covered,
        "inspected certificate"
    );

    Ok(Some(CertificateFacts {
        expires_at,
        covered,
        der,
    }))
}

/// Walk the DER structure down to tbsCertificate.validity.notAfter and
/// return its encoding plus raw content octets.
///
/// Field order inside tbsCertificate is fixed by X.509: an optional
/// `[0]`-tagged version, then serial, signature algorithm, issuer, validity.
fn locate_not_after(der: &[u8]) -> Result<(TimeEncoding, &[u8]), CheckError> {
    let certificate = parse_sequence(der)?;
    let (_, tbs) = parse_any(certificate.data)?;
    if tbs.tag() != Tag::Sequence {
        return Err(CheckError::Der(format!(
            "tbsCertificate is not a sequence: {:?}",
            tbs.tag()
        )));
    }

    let (after_first, first) = parse_any(tbs.data)?;
    let after_serial = if first.header.class() == Class::ContextSpecific && first.tag() == Tag(0) {
        let (rest, _serial) = parse_any(after_first)?;
        rest
    } else {
        // No explicit version; the first field was the serial
        after_first
    };

    let (rest, _sig_alg) = parse_any(after_serial)?;
    let (rest, _issuer) = parse_any(rest)?;
    let (_, validity) = parse_any(rest)?;
    if validity.tag() != Tag::Sequence {
        return Err(CheckError::Der(format!(
            "validity is not a sequence: {:?}",
            validity.tag()
        )));
    }

    let (after_not_before, _not_before) = parse_any(validity.data)?;
    let (_, not_after) = parse_any(after_not_before)?;

    match not_after.tag() {
        Tag::UtcTime => Ok((TimeEncoding::Utc, not_after.data)),
        Tag::GeneralizedTime => Ok((TimeEncoding::Generalized, not_after.data)),
        tag => Err(CheckError::Der(format!(
            "unexpected notAfter tag: {tag:?}"
        ))),
    }
}

fn parse_sequence(input: &[u8]) -> Result<Any<'_>, CheckError> {
    let (_, any) = parse_any(input)?;
    if any.tag() != Tag::Sequence {
        return Err(CheckError::Der(format!(
            "expected a sequence, found {:?}",
            any.tag()
        )));
    }
    Ok(any)
}

fn parse_any(input: &[u8]) -> Result<(&[u8], Any<'_>), CheckError> {
    Any::from_der(input).map_err(|e| CheckError::Der(e.to_string()))
}
