//! Key material and per-user derivation.
//!
//! This module owns two responsibilities:
//! 1. Holding the server-wide secret in a type that is opaque,
//!    non-cloneable, and zeroised on drop.
//! 2. Deriving per-user encryption keys from that secret using HKDF-SHA256.
//!
//! This is one of exactly two modules permitted to import `ring` directly
//! (the other is `crypto`). The derivation logic lives here because it
//! operates on key material itself, not on ciphertexts.
//!
//! ## Derivation structure
//!
//! ```text
//! HKDF-SHA256(
//!     ikm  = server secret,
//!     salt = "notevault-salt",
//!     info = "user:{subject}"
//! )
//! ```
//!
//! The salt is a fixed constant because derivation must be deterministic:
//! the same user's key is re-derived on every request, so nothing per-user
//! is ever stored. All separation comes from the info string. Two distinct
//! subjects produce statistically independent keys, and knowing one derived
//! key reveals nothing about the secret or any other user's key.

use std::env;
use std::fmt;

use ring::hkdf;
use zeroize::ZeroizeOnDrop;

use crate::crypto::KEY_LEN;
use crate::error::{NotevaultError, Result};

/// Fixed HKDF salt. Changing it changes every derived key and makes all
/// previously stored ciphertexts unreadable.
pub(crate) const USER_KEY_SALT: &[u8] = b"notevault-salt";

/// Prefix of the HKDF info string. The full info is `user:{subject}`.
pub(crate) const USER_KEY_INFO_PREFIX: &str = "user:";

/// Environment variable the server secret is read from.
pub const SERVER_SECRET_ENV: &str = "NOTEVAULT_SERVER_SECRET";

// ---------------------------------------------------------------------------
// Server secret
// ---------------------------------------------------------------------------

/// The server-wide secret. This is the single piece of key material an
/// operator must manage; every per-user key is derived from it.
///
/// - Not `Clone`. Cannot be duplicated without explicit conversion.
/// - Zeroised on drop. Memory is overwritten before deallocation.
/// - `Debug` prints a redaction marker, never bytes.
#[derive(ZeroizeOnDrop)]
pub struct ServerSecret {
    bytes: Vec<u8>,
}

impl ServerSecret {
    /// Read the secret from [`SERVER_SECRET_ENV`].
    ///
    /// An unset or empty variable is a deployment fault. It is rejected
    /// here, once, at startup, rather than surfacing as a derivation error
    /// on the first request.
    pub fn from_env() -> Result<Self> {
        match env::var(SERVER_SECRET_ENV) {
            Ok(value) if !value.is_empty() => Ok(Self {
                bytes: value.into_bytes(),
            }),
            _ => Err(NotevaultError::Configuration(
                "server encryption secret is not set",
            )),
        }
    }

    /// Construct a secret from raw bytes. Rejects empty input.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(NotevaultError::Configuration(
                "server encryption secret is empty",
            ));
        }
        Ok(Self { bytes })
    }

    /// Borrow the raw secret bytes for use in HKDF derivation.
    ///
    /// `pub(crate)`: raw bytes never leave the crate.
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for ServerSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerSecret")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Derived key
// ---------------------------------------------------------------------------

/// A key derived for a single user.
///
/// - Not `Clone`. A derived key lives for exactly one seal or open call and
///   is dropped when the call returns; there is no key cache.
/// - Zeroised on drop.
/// - Raw bytes are never exposed outside the crate. Other modules access
///   derived keys only through `as_bytes()`, which is `pub(crate)`.
#[derive(ZeroizeOnDrop)]
pub struct DerivedKey {
    bytes: [u8; KEY_LEN],
}

impl DerivedKey {
    /// Borrow the raw key bytes for use in seal/open operations.
    ///
    /// `pub(crate)`: raw bytes never leave the crate.
    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Derive the encryption key for one user.
///
/// The `info` string is constructed as `user:{subject}`. The subject is the
/// namespaced identifier produced by identity resolution, so demo users and
/// verified users can never share a key even when their raw identifiers
/// collide.
///
/// # Security properties
/// - Deterministic: the same secret and subject always yield the same key,
///   which is what lets ciphertexts written yesterday be opened today.
/// - HKDF is one-way: a derived key reveals nothing about the secret.
/// - Different info strings produce statistically independent outputs.
/// - The output length is fixed at 256 bits (32 bytes).
pub fn derive_user_key(secret: &ServerSecret, subject: &str) -> Result<DerivedKey> {
    let info = format!("{}{}", USER_KEY_INFO_PREFIX, subject);

    // Extract phase: compress the operator secret into a pseudorandom key
    // under the fixed salt.
    let salt = hkdf::Salt::new(hkdf::HKDF_SHA256, USER_KEY_SALT);
    let prk = salt.extract(secret.as_bytes());

    // Expand phase: the info string scopes the output to one subject.
    let info_bytes = info.as_bytes();
    let info_slices = [info_bytes];
    let okm = prk
        .expand(&info_slices, hkdf::HKDF_SHA256)
        .map_err(|_| NotevaultError::KeyDerivation)?;

    let mut derived = [0u8; KEY_LEN];
    okm.fill(&mut derived)
        .map_err(|_| NotevaultError::KeyDerivation)?;

    Ok(DerivedKey { bytes: derived })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(bytes: &[u8]) -> ServerSecret {
        ServerSecret::from_bytes(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let s = secret(b"s3cr3t");
        let a = derive_user_key(&s, "demo:abcdef12").unwrap();
        let b = derive_user_key(&s, "demo:abcdef12").unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_distinct_subjects_distinct_keys() {
        let s = secret(b"s3cr3t");
        let a = derive_user_key(&s, "user-a").unwrap();
        let b = derive_user_key(&s, "user-b").unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_distinct_secrets_distinct_keys() {
        let a = derive_user_key(&secret(b"secret-one"), "user-a").unwrap();
        let b = derive_user_key(&secret(b"secret-two"), "user-a").unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(ServerSecret::from_bytes(Vec::new()).is_err());
    }

    #[test]
    fn test_debug_output_is_redacted() {
        let s = secret(b"super-secret-value");
        let debug = format!("{:?}", s);
        assert!(!debug.contains("super-secret-value"));
        assert!(debug.contains("[REDACTED]"));

        let key = derive_user_key(&s, "user-a").unwrap();
        assert!(format!("{:?}", key).contains("[REDACTED]"));
    }
}
