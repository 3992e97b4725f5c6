//! Domain coverage extraction.
//!
//! Locates the certificate's subject-alt-name extension and splits it into
//! the set of asserted domain names. A certificate must carry exactly one
//! such extension; zero or several is a structural failure, never silently
//! resolved by taking the first match.

use tracing::trace;
use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::{GeneralName, ParsedExtension};
use x509_parser::oid_registry::OID_X509_EXT_SUBJECT_ALT_NAME;

use crate::error::CheckError;

/// Extract the covered domain names from a certificate's one SAN extension.
///
/// Entries are emitted in extension order with duplicates preserved;
/// non-domain entry kinds (IP addresses, emails, URIs) are silently skipped.
pub fn covered_domains(cert: &X509Certificate<'_>) -> Result<Vec<String>, CheckError> {
    // Single pass tracking the found count so zero/one/many is preserved
    let sans: Vec<_> = cert
        .extensions()
        .iter()
        .filter(|ext| ext.oid == OID_X509_EXT_SUBJECT_ALT_NAME)
        .collect();

    let ext = match sans.as_slice() {
        [one] => *one,
        other => return Err(CheckError::SanCount(other.len())),
    };

    let san = match ext.parsed_extension() {
        ParsedExtension::SubjectAlternativeName(san) => san,
        _ => return Err(CheckError::MalformedSan),
    };

    let rendered = san
        .general_names
        .iter()
        .map(render_general_name)
        .collect::<Vec<_>>()
        .join(", ");
    trace!(san = %rendered, "rendered subject-alt-name extension");

    // Tokenize the rendering so each entry survives as its own token,
    // duplicates included
    let domains = rendered
        .split(',')
        .map(str::trim_start)
        .filter_map(|token| token.strip_prefix("DNS:"))
        .map(str::to_string)
        .collect();

    Ok(domains)
}

/// Human-readable rendering of one SAN entry, `DNS:`-prefixed for domains.
fn render_general_name(name: &GeneralName<'_>) -> String {
    match name {
        GeneralName::DNSName(s) => format!("DNS:{s}"),
        GeneralName::RFC822Name(s) => format!("email:{s}"),
        GeneralName::URI(s) => format!("URI:{s}"),
        GeneralName::IPAddress(bytes) => format!("IP Address:{}", render_ip(bytes)),
        _ => "othername:<unsupported>".to_string(),
    }
}

fn render_ip(bytes: &[u8]) -> String {
    match bytes.len() {
        4 => format!("{}.{}.{}.{}", bytes[0], bytes[1], bytes[2], bytes[3]),
        16 => bytes
            .chunks(2)
            .map(|pair| format!("{:02X}{:02X}", pair[0], pair[1]))
            .collect::<Vec<_>>()
            .join(":"),
        _ => "<invalid>".to_string(),
    }
}
