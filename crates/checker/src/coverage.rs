//! Domain-set validation.
//!
//! Proves bijection between the domains a certificate asserts and the
//! domains the caller requested: every covered token matches exactly one
//! requested domain, no token is matched twice, and no requested domain is
//! left unmatched.

/// Outcome of coverage validation. Exactly one variant holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverageResult {
    /// Bijection holds.
    Valid,
    /// A requested domain is not asserted by the certificate.
    MissingDomain(String),
    /// The certificate asserts a domain nobody requested.
    UnknownDomain(String),
    /// The certificate asserts the same domain twice.
    DuplicateDomain(String),
    /// The SAN extension could not be decoded.
    MalformedExtension,
}

impl CoverageResult {
    /// Whether the bijection holds.
    pub fn is_valid(&self) -> bool {
        matches!(self, CoverageResult::Valid)
    }
}

/// Validate covered tokens against the requested domain list.
///
/// Tokens are consumed in emission order and matched case-sensitively.
/// The first unknown or duplicate token fails immediately; missing domains
/// are only reported once the full covered set has been consumed, so
/// "known but incomplete" is distinguished from "unknown entry".
pub fn validate_coverage(covered: &[String], requested: &[String]) -> CoverageResult {
    let mut matched = vec![0u32; requested.len()];

    for token in covered {
        match requested.iter().position(|domain| domain == token) {
            None => return CoverageResult::UnknownDomain(token.clone()),
            Some(i) if matched[i] > 0 => return CoverageResult::DuplicateDomain(token.clone()),
            Some(i) => matched[i] += 1,
        }
    }

    for (i, count) in matched.iter().enumerate() {
        if *count == 0 {
            return CoverageResult::MissingDomain(requested[i].clone());
        }
    }

    CoverageResult::Valid
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn owned(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn exact_match_is_valid() {
        let result = validate_coverage(
            &owned(&["a.example", "b.example"]),
            &owned(&["a.example", "b.example"]),
        );
        assert_eq!(result, CoverageResult::Valid);
    }

    #[test]
    fn order_does_not_matter() {
        let result = validate_coverage(
            &owned(&["b.example", "a.example"]),
            &owned(&["a.example", "b.example"]),
        );
        assert_eq!(result, CoverageResult::Valid);
    }

    #[test]
    fn requested_but_not_covered_is_missing() {
        let result = validate_coverage(
            &owned(&["a.example", "b.example"]),
            &owned(&["a.example", "b.example", "c.example"]),
        );
        assert_eq!(result, CoverageResult::MissingDomain("c.example".to_string()));
    }

    #[test]
    fn covered_but_not_requested_is_unknown() {
        let result = validate_coverage(
            &owned(&["a.example", "z.example"]),
            &owned(&["a.example"]),
        );
        assert_eq!(result, CoverageResult::UnknownDomain("z.example".to_string()));
    }

    #[test]
    fn double_coverage_is_duplicate() {
        let result = validate_coverage(
            &owned(&["a.example", "a.example"]),
            &owned(&["a.example"]),
        );
        assert_eq!(result, CoverageResult::DuplicateDomain("a.example".to_string()));
    }

    #[test]
    fn first_violation_in_token_order_wins() {
        // The unknown token comes before the duplicate one
        let result = validate_coverage(
            &owned(&["z.example", "a.example", "a.example"]),
            &owned(&["a.example"]),
        );
        assert_eq!(result, CoverageResult::UnknownDomain("z.example".to_string()));
    }

    #[test]
    fn matching_is_case_sensitive() {
        let result = validate_coverage(&owned(&["A.example"]), &owned(&["a.example"]));
        assert_eq!(result, CoverageResult::UnknownDomain("A.example".to_string()));
    }

    #[test]
    fn empty_covered_against_empty_request_is_valid() {
        let result = validate_coverage(&[], &[]);
        assert_eq!(result, CoverageResult::Valid);
    }

    proptest! {
        /// Valid iff the two sides are equal as sets with every entry used
        /// exactly once on both sides.
        #[test]
        fn bijection_property(
            requested in proptest::collection::hash_set("[a-d]\\.example", 0..5),
        ) {
            let requested: Vec<String> = requested.into_iter().collect();
            let mut covered = requested.clone();
            covered.reverse();

            prop_assert_eq!(
                validate_coverage(&covered, &requested),
                CoverageResult::Valid
            );
        }

        #[test]
        fn dropping_a_covered_entry_is_never_valid(
            requested in proptest::collection::hash_set("[a-d]\\.example", 1..5),
        ) {
            let requested: Vec<String> = requested.into_iter().collect();
            let covered = requested[1..].to_vec();

            prop_assert!(!validate_coverage(&covered, &requested).is_valid());
        }

        #[test]
        fn duplicating_a_covered_entry_is_never_valid(
            requested in proptest::collection::hash_set("[a-d]\\.example", 1..5),
        ) {
            let requested: Vec<String> = requested.into_iter().collect();
            let mut covered = requested.clone();
            covered.push(requested[0].clone());

            prop_assert!(!validate_coverage(&covered, &requested).is_valid());
        }
    }
}
