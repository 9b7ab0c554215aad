//! Low-level cryptographic operations.
//!
//! This module is one of exactly two places in the crate that import `ring`
//! directly (the other is `keys`). All other modules seal and open payloads
//! exclusively through the functions exposed here.
//!
//! Primitive choices:
//! - **Cipher**: AES-256-GCM (authenticated encryption)
//! - **Nonce**: 96-bit (12 bytes), generated fresh per seal via `SystemRandom`
//! - **Tag**: 128-bit (16 bytes), stored as its own envelope field
//! - **Key size**: 256 bits (32 bytes)

use ring::aead::{self, Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};

use crate::envelope::{self, CipherEnvelope};
use crate::error::{NotevaultError, Result};
use crate::keys::DerivedKey;

/// The AEAD algorithm used throughout notevault.
const ALGORITHM: &aead::Algorithm = &AES_256_GCM;

/// Size of the nonce in bytes (96 bits).
pub const NONCE_LEN: usize = 12;

/// Size of the GCM authentication tag in bytes (128 bits).
pub const TAG_LEN: usize = 16;

/// Size of a derived key in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// Generate a cryptographically secure random nonce.
///
/// Uses `ring::rand::SystemRandom`, the only source of randomness in the
/// crate. A fresh nonce is generated for every seal call. There is no nonce
/// caching and no counter-based generation.
fn generate_nonce() -> Result<[u8; NONCE_LEN]> {
    let rng = SystemRandom::new();
    let mut buf = [0u8; NONCE_LEN];
    rng.fill(&mut buf).map_err(|_| NotevaultError::Randomness)?;
    Ok(buf)
}

/// Encrypt a note body under one user's derived key.
///
/// Returns the storage-form envelope: nonce, tag, and ciphertext as three
/// separate base64url fields. Empty plaintext is valid input and produces
/// an empty ciphertext field with a real tag over it.
pub fn seal(key: &DerivedKey, plaintext: &[u8]) -> Result<CipherEnvelope> {
    let unbound =
        UnboundKey::new(ALGORITHM, key.as_bytes()).map_err(|_| NotevaultError::InvalidKey)?;
    let sealing = LessSafeKey::new(unbound);

    let nonce_bytes = generate_nonce()?;
    let nonce = Nonce::assume_unique_for_key(nonce_bytes);

    // `seal_in_place_separate_tag` encrypts the buffer in place and hands
    // back the GCM tag on its own, matching the envelope layout.
    let mut in_out = plaintext.to_vec();
    let tag = sealing
        .seal_in_place_separate_tag(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| NotevaultError::Encryption)?;

    Ok(envelope::encode(&nonce_bytes, tag.as_ref(), &in_out))
}

/// Decrypt an envelope under one user's derived key.
///
/// Fails closed: if the key is wrong or any envelope field has been
/// altered, the GCM authentication check fails and the caller receives no
/// partial plaintext. Structural problems (bad base64url, wrong nonce or
/// tag length) are reported as `MalformedEnvelope` before any key is used.
pub fn open(key: &DerivedKey, sealed: &CipherEnvelope) -> Result<Vec<u8>> {
    let decoded = envelope::decode(sealed)?;

    let unbound =
        UnboundKey::new(ALGORITHM, key.as_bytes()).map_err(|_| NotevaultError::InvalidKey)?;
    let opening = LessSafeKey::new(unbound);

    let nonce = Nonce::assume_unique_for_key(decoded.nonce);

    // `ring` expects the tag appended to the ciphertext.
    let mut in_out = decoded.ciphertext;
    in_out.extend_from_slice(&decoded.tag);

    let plaintext = opening
        .open_in_place(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| NotevaultError::AuthenticationFailure)?;

    Ok(plaintext.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{derive_user_key, ServerSecret};

    fn key() -> DerivedKey {
        let secret = ServerSecret::from_bytes(b"unit test secret".to_vec()).unwrap();
        derive_user_key(&secret, "unit-test-user").unwrap()
    }

    #[test]
    fn test_tag_length_matches_algorithm() {
        assert_eq!(TAG_LEN, ALGORITHM.tag_len());
    }

    #[test]
    fn test_seal_open_round_trip() {
        let key = key();
        let sealed = seal(&key, b"plain body").unwrap();
        assert_eq!(open(&key, &sealed).unwrap(), b"plain body");
    }

    #[test]
    fn test_nonce_is_fresh_per_seal() {
        let key = key();
        let a = seal(&key, b"same body").unwrap();
        let b = seal(&key, b"same body").unwrap();
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_empty_plaintext_round_trip() {
        let key = key();
        let sealed = seal(&key, b"").unwrap();
        assert_eq!(sealed.ciphertext, "");
        assert!(open(&key, &sealed).unwrap().is_empty());
    }
}
