//! Lifecycle decision engine.
//!
//! Combines expiry and coverage facts into one terminal outcome. The
//! outcome is computed once, consumed once by the IPC gateway, and never
//! mutated.

use std::path::Path;

use tracing::{error, info, warn};

use crate::coverage::{validate_coverage, CoverageResult};
use crate::inspect::{inspect_file, CertificateFacts};

/// Time before expiry below which a still-valid certificate is classified
/// renewable (30 days).
pub const RENEWAL_WINDOW_SECS: i64 = 30 * 24 * 60 * 60;

/// Terminal lifecycle outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleOutcome {
    /// No certificate file is present.
    NoCertificate,
    /// Coverage is exact and expiry is beyond the renewal window.
    Current,
    /// Coverage is exact and expiry is within the window, or renewal was
    /// forced.
    Renewable,
    /// Coverage does not exactly match the request, or the certificate
    /// could not be decoded. Fatal; never a renewal trigger.
    CoverageMismatch,
}

/// Evaluate the certificate at `path` against the requested domains.
///
/// Returns the outcome together with the inspected facts (present whenever
/// a certificate was readable), which the gateway needs for the revocation
/// hand-off. All diagnostic detail is logged here; the outcome itself
/// carries only the closed enumeration.
pub fn evaluate(
    path: &Path,
    requested: &[String],
    force: bool,
    revoke: bool,
    now: i64,
) -> (LifecycleOutcome, Option<CertificateFacts>) {
    let facts = match inspect_file(path) {
        Ok(Some(facts)) => facts,
        Ok(None) => {
            if revoke {
                // Caller error: there is nothing to revoke
                warn!(path = %path.display(), "revocation requested but no certificate found");
            } else {
                info!(path = %path.display(), "no certificate, issuance needed");
            }
            return (LifecycleOutcome::NoCertificate, None);
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "certificate could not be decoded");
            return (LifecycleOutcome::CoverageMismatch, None);
        }
    };

    match validate_coverage(&facts.covered, requested) {
        CoverageResult::Valid => {}
        CoverageResult::MissingDomain(name) => {
            error!(domain = %name, "certificate does not cover a requested domain");
            return (LifecycleOutcome::CoverageMismatch, Some(facts));
        }
        CoverageResult::UnknownDomain(name) => {
            error!(domain = %name, "certificate covers a domain that was not requested");
            return (LifecycleOutcome::CoverageMismatch, Some(facts));
        }
        CoverageResult::DuplicateDomain(name) => {
            error!(domain = %name, "certificate covers a domain twice");
            return (LifecycleOutcome::CoverageMismatch, Some(facts));
        }
        CoverageResult::MalformedExtension => {
            error!("certificate subject-alt-name extension is malformed");
            return (LifecycleOutcome::CoverageMismatch, Some(facts));
        }
    }

    let outcome = if force || now >= facts.expires_at - RENEWAL_WINDOW_SECS {
        LifecycleOutcome::Renewable
    } else {
        LifecycleOutcome::Current
    };

    info!(
        expires_at = facts.expires_at,
        forced = force,
        outcome = ?outcome,
        "certificate lifecycle decided"
    );

    (outcome, Some(facts))
}

/// Window comparison on already-derived facts; exposed for the boundary
/// tests.
pub fn within_renewal_window(expires_at: i64, now: i64) -> bool {
    now >= expires_at - RENEWAL_WINDOW_SECS
}
