//! Cross-user isolation.

use notevault::error::NotevaultError;
use notevault::{NoteVault, ServerSecret};

#[test]
fn test_users_cannot_open_each_others_notes() {
    // Threat Model: blast radius of a leaked envelope. User B obtains user
    // A's stored row (IDOR, misdirected backup, log spill). Possession of
    // the envelope is worthless without A's derived key.
    let vault = NoteVault::new(ServerSecret::from_bytes(b"isolation secret".to_vec()).unwrap());

    let sealed_a = vault.seal("issuer-sub-a", b"alpha private").unwrap();
    let sealed_b = vault.seal("issuer-sub-b", b"bravo private").unwrap();

    // Each owner reads their own note.
    assert_eq!(vault.open("issuer-sub-a", &sealed_a).unwrap(), b"alpha private");
    assert_eq!(vault.open("issuer-sub-b", &sealed_b).unwrap(), b"bravo private");

    // Neither can read the other's. The authentication tag check MUST fail.
    assert!(
        matches!(
            vault.open("issuer-sub-b", &sealed_a),
            Err(NotevaultError::AuthenticationFailure)
        ),
        "user B opened user A's note"
    );
    assert!(matches!(
        vault.open("issuer-sub-a", &sealed_b),
        Err(NotevaultError::AuthenticationFailure)
    ));
}

#[test]
fn test_demo_namespace_isolates_lookalike_subjects() {
    // A demo caller who picks an identifier equal to a real issuer subject
    // still derives a different key, because the stored demo subject keeps
    // its namespace prefix.
    let vault = NoteVault::new(ServerSecret::from_bytes(b"isolation secret".to_vec()).unwrap());

    let real_subject = "108835960871234567890";
    let sealed_real = vault.seal(real_subject, b"real user note").unwrap();

    let demo_subject = format!("demo:{real_subject}");
    assert!(vault.open(&demo_subject, &sealed_real).is_err());
}

#[test]
fn test_different_secrets_isolate_deployments() {
    // Two deployments with different server secrets share no keys, even
    // for the same subject.
    let vault_a = NoteVault::new(ServerSecret::from_bytes(b"deployment-a".to_vec()).unwrap());
    let vault_b = NoteVault::new(ServerSecret::from_bytes(b"deployment-b".to_vec()).unwrap());

    let sealed = vault_a.seal("user-1", b"pinned to deployment a").unwrap();
    assert!(vault_b.open("user-1", &sealed).is_err());
}
