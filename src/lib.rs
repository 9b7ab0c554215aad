//! # notevault
//!
//! Per-user encryption at rest and dual-mode identity resolution for a
//! note service.
//!
//! Every note body is sealed with a key derived from one server-wide
//! secret and the owning user's stable subject identifier, so no per-user
//! key material is ever stored and a leaked database row is unreadable
//! without the secret. Identity resolution turns bearer credentials into
//! internal user records through a fail-closed pipeline with two schemes:
//! verified tokens checked by a pluggable verifier, and namespaced demo
//! credentials that skip verification but can never collide with real
//! users.
//!
//! ## Public API
//!
//! The public surface of this crate is intentionally narrow. Most callers
//! need only [`NoteVault`] and [`ServerSecret`] for encryption, plus
//! [`identity::IdentityResolver`] wired to their own verifier and store.
//! `ring` is imported by exactly two modules, `crypto` and `keys`;
//! everything else goes through them.
//!
//! ## Example
//!
//! ```
//! use notevault::{NoteVault, ServerSecret};
//!
//! # fn main() -> notevault::Result<()> {
//! let secret = ServerSecret::from_bytes(b"a long random operator secret".to_vec())?;
//! let vault = NoteVault::new(secret);
//!
//! let sealed = vault.seal("demo:abcdef12", b"draft: call the plumber")?;
//! let body = vault.open("demo:abcdef12", &sealed)?;
//! assert_eq!(body, b"draft: call the plumber");
//!
//! // Another user's key cannot open it.
//! assert!(vault.open("demo:someone-else", &sealed).is_err());
//! # Ok(())
//! # }
//! ```

// Module declarations.
pub mod audit;
pub mod credential;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod identity;
pub mod keys;
pub mod store;
pub mod vault;

// Root re-exports: the types nearly every caller touches.
pub use error::{NotevaultError, Result};
pub use keys::ServerSecret;
pub use vault::NoteVault;
