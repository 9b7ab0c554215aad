//! Credential classification.
//!
//! A request arrives with at most one bearer credential. The first decision
//! identity resolution makes is which scheme that credential belongs to,
//! and everything downstream branches on the answer, so the scheme is a sum
//! type rather than a boolean.

use serde::{Deserialize, Serialize};

/// Prefix that selects the demo scheme.
///
/// The same prefix is kept on demo subjects as a namespace tag, which is
/// what keeps demo users disjoint from verified users no matter what
/// identifier a demo caller picks.
pub const DEMO_SCHEME_PREFIX: &str = "demo:";

/// Minimum length of a demo identifier, in characters.
pub const DEMO_MIN_ID_LEN: usize = 8;

/// A classified credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// A demo credential: the raw identifier after the `demo:` prefix.
    Demo(String),
    /// A verified-scheme token, opaque until a verifier inspects it.
    Verified(String),
}

impl Credential {
    /// Classify a non-empty bearer string.
    ///
    /// The `demo:` prefix selects the demo scheme; everything else is a
    /// verified-scheme token. The prefix is decisive even when the
    /// remainder is empty, so `demo:` alone classifies as a (later
    /// rejected) demo credential rather than leaking into verification.
    pub fn classify(raw: &str) -> Self {
        match raw.strip_prefix(DEMO_SCHEME_PREFIX) {
            Some(id) => Self::Demo(id.to_string()),
            None => Self::Verified(raw.to_string()),
        }
    }

    /// The scheme this credential was classified into.
    pub fn scheme(&self) -> CredentialScheme {
        match self {
            Self::Demo(_) => CredentialScheme::Demo,
            Self::Verified(_) => CredentialScheme::Verified,
        }
    }
}

/// The two supported credential schemes.
///
/// Carried on audit records so demo and verified resolutions remain
/// distinguishable after the fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialScheme {
    Demo,
    Verified,
}

/// Extract the bearer token from an `Authorization` header value.
///
/// Returns `None` when the header is absent or does not carry the `Bearer`
/// prefix. Whether that amounts to a missing credential is the caller's
/// decision.
pub fn bearer_from_header(header: Option<&str>) -> Option<&str> {
    header.and_then(|value| value.strip_prefix("Bearer "))
}
