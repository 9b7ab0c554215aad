//! The note vault facade.
//!
//! Ties derivation and sealing together behind the two-call surface the
//! service uses: seal on write, open on read. A user's key exists only for
//! the duration of a call. The vault also owns the audit trail for the one
//! place a read failure is deliberately absorbed: bulk listing.

use crate::audit::{AuditEvent, AuditLog, AuditRecord, AuditSink};
use crate::crypto;
use crate::envelope::CipherEnvelope;
use crate::error::Result;
use crate::keys::{derive_user_key, ServerSecret};

/// Per-user encryption at rest, driven by one server secret.
pub struct NoteVault {
    secret: ServerSecret,
    audit: AuditLog,
}

impl NoteVault {
    /// Build a vault around a server secret.
    pub fn new(secret: ServerSecret) -> Self {
        Self {
            secret,
            audit: AuditLog::new(),
        }
    }

    /// Seal a note body for one user.
    ///
    /// The user's key is derived, used, and dropped inside this call.
    pub fn seal(&self, subject: &str, plaintext: &[u8]) -> Result<CipherEnvelope> {
        let key = derive_user_key(&self.secret, subject)?;
        crypto::seal(&key, plaintext)
    }

    /// Open a sealed note for one user. Fails closed: any tampering, any
    /// wrong subject, any structural damage is an error.
    pub fn open(&self, subject: &str, sealed: &CipherEnvelope) -> Result<Vec<u8>> {
        let key = derive_user_key(&self.secret, subject)?;
        crypto::open(&key, sealed)
    }

    /// Open a sealed note during a bulk read, substituting empty content on
    /// failure.
    ///
    /// This is the single place in the crate where a decryption failure is
    /// absorbed instead of propagated: one unreadable record does not fail
    /// a whole listing. The substitution is never silent. Every call that
    /// falls back appends an `UnreadableNote` audit record carrying
    /// `note_ref`, which is how operators find notes that need attention.
    /// Anything that must distinguish "empty" from "unreadable" uses
    /// [`NoteVault::open`] instead.
    pub fn open_or_empty(
        &mut self,
        subject: &str,
        note_ref: &str,
        sealed: &CipherEnvelope,
    ) -> Vec<u8> {
        match self.open(subject, sealed) {
            Ok(plaintext) => plaintext,
            Err(err) => {
                self.audit.append(AuditRecord::now(AuditEvent::UnreadableNote {
                    subject: subject.to_string(),
                    note_ref: note_ref.to_string(),
                    reason: err.to_string(),
                }));
                Vec::new()
            }
        }
    }

    /// Read access to the vault's audit trail.
    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    /// Attach a sink that receives a copy of every audit record.
    pub fn add_audit_sink(&mut self, sink: Box<dyn AuditSink>) {
        self.audit.add_forward_sink(sink);
    }
}
