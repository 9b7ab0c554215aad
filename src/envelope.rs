//! The stored ciphertext envelope.
//!
//! A sealed note is three independent base64url strings: the nonce (`iv`),
//! the GCM authentication tag (`authTag`), and the ciphertext body. The
//! fields stay separate because that is the shape of the storage schema the
//! service writes to, and because it lets each field be validated on its
//! own: a decode failure names the field that is corrupt.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::crypto::{NONCE_LEN, TAG_LEN};
use crate::error::{NotevaultError, Result};

/// A sealed payload in storage form.
///
/// All three fields are base64url without padding. The envelope carries no
/// key material and no record of which user sealed it; pairing an envelope
/// with the right subject is the caller's contract, and a mismatch surfaces
/// as an authentication failure on open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherEnvelope {
    /// The 12-byte AES-GCM nonce, generated fresh for this envelope.
    pub iv: String,
    /// The 16-byte GCM authentication tag.
    #[serde(rename = "authTag")]
    pub auth_tag: String,
    /// The encrypted note body. Empty plaintext encodes as an empty string.
    pub ciphertext: String,
}

/// An envelope decoded back to raw bytes, ready for the AEAD open call.
pub(crate) struct DecodedEnvelope {
    pub nonce: [u8; NONCE_LEN],
    pub tag: [u8; TAG_LEN],
    pub ciphertext: Vec<u8>,
}

/// Encode raw seal output into storage form.
pub(crate) fn encode(nonce: &[u8; NONCE_LEN], tag: &[u8], ciphertext: &[u8]) -> CipherEnvelope {
    CipherEnvelope {
        iv: URL_SAFE_NO_PAD.encode(nonce),
        auth_tag: URL_SAFE_NO_PAD.encode(tag),
        ciphertext: URL_SAFE_NO_PAD.encode(ciphertext),
    }
}

/// Decode an envelope, validating structure before any cryptography runs.
///
/// None of these checks touch a key, so a malformed envelope is always
/// distinguishable from a failed authentication.
pub(crate) fn decode(envelope: &CipherEnvelope) -> Result<DecodedEnvelope> {
    let nonce_bytes = URL_SAFE_NO_PAD
        .decode(&envelope.iv)
        .map_err(|_| NotevaultError::MalformedEnvelope("iv is not valid base64url"))?;
    let nonce: [u8; NONCE_LEN] = nonce_bytes
        .try_into()
        .map_err(|_| NotevaultError::MalformedEnvelope("iv must decode to 12 bytes"))?;

    let tag_bytes = URL_SAFE_NO_PAD
        .decode(&envelope.auth_tag)
        .map_err(|_| NotevaultError::MalformedEnvelope("authTag is not valid base64url"))?;
    let tag: [u8; TAG_LEN] = tag_bytes
        .try_into()
        .map_err(|_| NotevaultError::MalformedEnvelope("authTag must decode to 16 bytes"))?;

    let ciphertext = URL_SAFE_NO_PAD
        .decode(&envelope.ciphertext)
        .map_err(|_| NotevaultError::MalformedEnvelope("ciphertext is not valid base64url"))?;

    Ok(DecodedEnvelope {
        nonce,
        tag,
        ciphertext,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> CipherEnvelope {
        encode(&[7u8; NONCE_LEN], &[9u8; TAG_LEN], b"opaque bytes")
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let decoded = decode(&valid()).unwrap();
        assert_eq!(decoded.nonce, [7u8; NONCE_LEN]);
        assert_eq!(decoded.tag, [9u8; TAG_LEN]);
        assert_eq!(decoded.ciphertext, b"opaque bytes");
    }

    #[test]
    fn test_empty_ciphertext_is_valid() {
        let envelope = encode(&[0u8; NONCE_LEN], &[0u8; TAG_LEN], b"");
        assert_eq!(envelope.ciphertext, "");
        assert!(decode(&envelope).unwrap().ciphertext.is_empty());
    }

    #[test]
    fn test_rejections_name_the_field() {
        let mut bad = valid();
        bad.iv = "***".to_string();
        match decode(&bad) {
            Err(NotevaultError::MalformedEnvelope(reason)) => {
                assert!(reason.contains("iv"))
            }
            other => panic!("expected malformed envelope, got {:?}", other.err()),
        }

        let mut bad = valid();
        bad.auth_tag = URL_SAFE_NO_PAD.encode([1u8; 4]);
        match decode(&bad) {
            Err(NotevaultError::MalformedEnvelope(reason)) => {
                assert!(reason.contains("authTag"))
            }
            other => panic!("expected malformed envelope, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_wrong_nonce_length_rejected() {
        let mut bad = valid();
        bad.iv = URL_SAFE_NO_PAD.encode([7u8; NONCE_LEN - 1]);
        assert!(matches!(
            decode(&bad),
            Err(NotevaultError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn test_padded_base64_rejected() {
        // Storage form is unpadded base64url. Padded input is structural
        // corruption, not an alternate spelling.
        let mut bad = valid();
        bad.iv = format!("{}==", bad.iv);
        assert!(matches!(
            decode(&bad),
            Err(NotevaultError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn test_serde_field_names_match_storage_schema() {
        let json = serde_json::to_value(valid()).unwrap();
        assert!(json.get("iv").is_some());
        assert!(json.get("authTag").is_some());
        assert!(json.get("ciphertext").is_some());
        assert!(json.get("auth_tag").is_none());
    }
}
