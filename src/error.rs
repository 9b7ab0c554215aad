//! Error types for notevault.
//!
//! Every error variant is a distinct failure mode in credential resolution
//! or note encryption. Messages are intentionally minimal: they signal
//! *what* failed without revealing *why* in ways that could leak
//! cryptographic state or verifier internals.

use thiserror::Error;

/// The single error type for all notevault operations.
#[derive(Debug, Error)]
pub enum NotevaultError {
    /// The service is misconfigured: a required secret or setting is absent.
    /// Never caused by caller input, and never blamed on the credential.
    #[error("configuration error: {0}")]
    Configuration(&'static str),

    /// No credential was presented where one is required.
    #[error("missing credential")]
    MissingCredential,

    /// A credential was presented but rejected before verification could
    /// succeed (too short, missing required claims, and so on).
    #[error("invalid credential: {reason}")]
    InvalidCredential {
        /// What structural check the credential failed.
        reason: &'static str,
    },

    /// The credential's validity window has ended.
    #[error("token expired")]
    TokenExpired,

    /// The credential's validity window has not started yet. Usually clock
    /// skew between the issuer and this host.
    #[error("token not yet valid")]
    TokenNotYetValid,

    /// Catch-all credential rejection. The underlying reason is carried for
    /// the audit trail but deliberately kept out of the display form.
    #[error("unauthorized")]
    Unauthorized {
        /// Internal detail, surfaced only through audit records.
        reason: String,
    },

    /// A stored envelope failed structural validation (bad base64url, wrong
    /// nonce or tag length). Reported before any key is touched.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(&'static str),

    /// The AEAD authentication check failed. This includes: wrong key,
    /// tampered ciphertext, or a corrupted GCM tag. The caller receives no
    /// partial plaintext and cannot tell these cases apart.
    #[error("authentication failed")]
    AuthenticationFailure,

    /// A cryptographic key was invalid (wrong length, malformed).
    #[error("invalid key")]
    InvalidKey,

    /// Encryption failed. The underlying `ring` operation returned an error.
    #[error("encryption failed")]
    Encryption,

    /// Key derivation (HKDF) failed.
    #[error("key derivation failed")]
    KeyDerivation,

    /// The system's random number generator failed to produce bytes.
    #[error("randomness source failed")]
    Randomness,
}

impl NotevaultError {
    /// True for errors that reject a presented (or absent) credential.
    ///
    /// Service callers map these to a 401-class response. Everything else
    /// is a service fault and maps to a 500-class response.
    pub fn is_credential_rejection(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential
                | Self::InvalidCredential { .. }
                | Self::TokenExpired
                | Self::TokenNotYetValid
                | Self::Unauthorized { .. }
        )
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, NotevaultError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_display_hides_reason() {
        let err = NotevaultError::Unauthorized {
            reason: "issuer certificate fetch failed".to_string(),
        };
        assert_eq!(err.to_string(), "unauthorized");
    }

    #[test]
    fn test_rejection_classifier() {
        assert!(NotevaultError::MissingCredential.is_credential_rejection());
        assert!(NotevaultError::TokenExpired.is_credential_rejection());
        assert!(!NotevaultError::Configuration("x").is_credential_rejection());
        assert!(!NotevaultError::AuthenticationFailure.is_credential_rejection());
    }
}
