//! Identity resolution.
//!
//! Turns a bearer credential into an internal user record. Two schemes are
//! supported: demo credentials, accepted without cryptographic verification
//! and namespaced so they can never collide with real users, and verified
//! tokens, checked by a pluggable [`TokenVerifier`]. Both paths end in an
//! atomic upsert against an [`IdentityStore`], and every resolution appends
//! exactly one audit record, successful or not.

use std::env;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audit::{AuditEvent, AuditLog, AuditRecord, AuditSink};
use crate::credential::{Credential, CredentialScheme, DEMO_MIN_ID_LEN, DEMO_SCHEME_PREFIX};
use crate::error::{NotevaultError, Result};

/// Environment variable naming the audience verified tokens must be issued
/// for.
pub const TOKEN_AUDIENCE_ENV: &str = "NOTEVAULT_TOKEN_AUDIENCE";

/// Read the expected token audience from the environment.
///
/// Absence is not an error here: a resolver built without an audience
/// fails closed when the first verified-scheme credential arrives.
pub fn audience_from_env() -> Option<String> {
    env::var(TOKEN_AUDIENCE_ENV).ok().filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// The identifier a user is keyed by, everywhere: identity store, key
/// derivation, audit records. Verified subjects come from the token issuer;
/// demo subjects carry the `demo:` namespace prefix.
pub type SubjectId = String;

/// A user record as the rest of the service sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalUser {
    /// Store-assigned internal id. Assigned on first resolution and stable
    /// across logins.
    pub id: u64,
    /// The namespaced subject this user is keyed by.
    pub subject: SubjectId,
    pub email: String,
    pub name: String,
}

/// The profile an upsert writes. The subject is the identity key; email and
/// name are refreshed on every login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub subject: SubjectId,
    pub email: String,
    pub name: String,
}

/// Claims extracted from a successfully verified token.
#[derive(Debug, Clone, Default)]
pub struct TokenClaims {
    /// The issuer's stable subject identifier. A verified token without one
    /// is rejected; there is nothing to key the user by.
    pub subject: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
}

// ---------------------------------------------------------------------------
// Collaborator contracts
// ---------------------------------------------------------------------------

/// Why a verifier rejected a token.
///
/// The resolver maps these onto its own error taxonomy; implementations
/// only need to be precise about the failure class.
#[derive(Debug, Clone, Error)]
pub enum VerifyError {
    /// The token's validity window has ended.
    #[error("token used too late")]
    Expired,
    /// The token's validity window has not started yet.
    #[error("token used too early")]
    NotYetValid,
    /// The signature did not verify against the issuer's keys.
    #[error("signature verification failed")]
    InvalidSignature,
    /// Any other verifier-specific failure.
    #[error("{0}")]
    Other(String),
}

/// A failure inside an identity store.
#[derive(Debug, Clone, Error)]
#[error("identity store error: {0}")]
pub struct StoreError(pub String);

/// Verifies tokens of the verified scheme.
///
/// Implementations check the token's signature, validity window, and
/// audience against the issuer, then return the claims carried inside.
/// Verification must be self-contained: the resolver never retries and
/// never consults a second verifier.
pub trait TokenVerifier: Send + Sync {
    /// Verify `token` against `audience` and return its claims.
    fn verify(&self, token: &str, audience: &str) -> std::result::Result<TokenClaims, VerifyError>;
}

/// A store of internal user records, keyed by subject.
///
/// # Contract
/// - `upsert` is atomic per subject: under concurrent calls with the same
///   subject, exactly one record exists afterwards and no caller observes
///   a partially written record. Database implementations get this from a
///   unique constraint on the subject column.
/// - The internal id is assigned on first upsert and never changes.
/// - `email` and `name` are overwritten on every upsert.
pub trait IdentityStore: Send + Sync {
    /// Create or update the record for `profile.subject` and return it.
    fn upsert(&self, profile: &UserProfile) -> std::result::Result<InternalUser, StoreError>;
}

impl<S: IdentityStore + ?Sized> IdentityStore for Arc<S> {
    fn upsert(&self, profile: &UserProfile) -> std::result::Result<InternalUser, StoreError> {
        (**self).upsert(profile)
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Resolves bearer credentials into internal users.
///
/// Holds no per-request state; every call runs the same pipeline from
/// scratch. The audience is fixed at construction, and a resolver built
/// without one rejects every verified-scheme credential with a
/// configuration error rather than verifying against nothing.
pub struct IdentityResolver<V, S> {
    verifier: V,
    store: S,
    audience: Option<String>,
    audit: AuditLog,
}

impl<V: TokenVerifier, S: IdentityStore> IdentityResolver<V, S> {
    /// Build a resolver. `audience` is typically [`audience_from_env`].
    pub fn new(verifier: V, store: S, audience: Option<String>) -> Self {
        Self {
            verifier,
            store,
            audience,
            audit: AuditLog::new(),
        }
    }

    /// Resolve a presented credential into an internal user.
    ///
    /// The pipeline is: extract, classify, authenticate per scheme, upsert.
    /// Exactly one audit record is appended per call. A demo resolution is
    /// always recorded with the demo scheme tag, so an unverified entry can
    /// never masquerade as a verified one in the trail.
    pub fn resolve(&mut self, credential: Option<&str>) -> Result<InternalUser> {
        let raw = match credential {
            Some(raw) if !raw.is_empty() => raw,
            _ => return self.reject(None, NotevaultError::MissingCredential),
        };

        let parsed = Credential::classify(raw);
        let scheme = parsed.scheme();

        let profile = match parsed {
            Credential::Demo(id) => self.demo_profile(&id),
            Credential::Verified(token) => self.verified_profile(&token),
        };
        let profile = match profile {
            Ok(profile) => profile,
            Err(err) => return self.reject(Some(scheme), err),
        };

        let user = match self.store.upsert(&profile) {
            Ok(user) => user,
            Err(err) => {
                let err = NotevaultError::Unauthorized {
                    reason: err.to_string(),
                };
                return self.reject(Some(scheme), err);
            }
        };

        self.audit.append(AuditRecord::now(AuditEvent::CredentialResolved {
            scheme,
            subject: user.subject.clone(),
        }));
        Ok(user)
    }

    /// Build the profile for a demo credential.
    ///
    /// No cryptographic verification happens on this path. The subject is
    /// re-namespaced under the demo prefix, so a demo identifier chosen to
    /// match a real issuer subject still lands on a different user record
    /// and a different encryption key.
    fn demo_profile(&self, id: &str) -> Result<UserProfile> {
        if id.chars().count() < DEMO_MIN_ID_LEN {
            return Err(NotevaultError::InvalidCredential {
                reason: "demo identifier is too short",
            });
        }
        Ok(UserProfile {
            subject: format!("{DEMO_SCHEME_PREFIX}{id}"),
            email: format!("demo-{id}@demo.notevault"),
            name: "Demo User".to_string(),
        })
    }

    /// Verify a token and build the profile from its claims.
    fn verified_profile(&self, token: &str) -> Result<UserProfile> {
        let audience = self.audience.as_deref().ok_or(NotevaultError::Configuration(
            "token audience is not configured",
        ))?;

        let claims = self
            .verifier
            .verify(token, audience)
            .map_err(|err| match err {
                VerifyError::Expired => NotevaultError::TokenExpired,
                VerifyError::NotYetValid => NotevaultError::TokenNotYetValid,
                other => NotevaultError::Unauthorized {
                    reason: other.to_string(),
                },
            })?;

        let subject = match claims.subject {
            Some(subject) if !subject.is_empty() => subject,
            _ => {
                return Err(NotevaultError::InvalidCredential {
                    reason: "token carries no subject",
                })
            }
        };

        Ok(UserProfile {
            subject,
            email: claims.email.unwrap_or_default(),
            name: claims.name.unwrap_or_default(),
        })
    }

    /// Record a rejection and hand the error back to the caller.
    fn reject(
        &mut self,
        scheme: Option<CredentialScheme>,
        err: NotevaultError,
    ) -> Result<InternalUser> {
        self.audit.append(AuditRecord::now(AuditEvent::CredentialRejected {
            scheme,
            reason: audit_reason(&err),
        }));
        Err(err)
    }

    /// Read access to the resolution audit trail.
    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    /// Attach a sink that receives a copy of every audit record.
    pub fn add_audit_sink(&mut self, sink: Box<dyn AuditSink>) {
        self.audit.add_forward_sink(sink);
    }
}

/// The reason string recorded on a rejection. `Unauthorized` keeps its
/// detail out of the display form, so the audit trail pulls it out of the
/// variant here.
fn audit_reason(err: &NotevaultError) -> String {
    match err {
        NotevaultError::Unauthorized { reason } => format!("unauthorized: {reason}"),
        other => other.to_string(),
    }
}
