use std::sync::OnceLock;

use proptest::prelude::*;
use sealnote_core::codec::{EncryptedEnvelope, NONCE_LENGTH, TAG_LENGTH};
use sealnote_core::crypto::DerivedKey;
use sealnote_core::{CipherCodec, NoteError};

const PASSWORD: &str = "correct-horse";

/// Argon2 dominates test time, so property and tamper tests share one key.
fn shared_key() -> &'static DerivedKey {
    static KEY: OnceLock<DerivedKey> = OnceLock::new();
    KEY.get_or_init(|| {
        CipherCodec::new()
            .derive_key(PASSWORD)
            .expect("key derivation should succeed")
    })
}

fn sample_envelope() -> EncryptedEnvelope {
    CipherCodec::new()
        .seal(b"# hello\n\nbody", shared_key())
        .expect("encryption should succeed")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn round_trip_any_plaintext(plaintext in proptest::collection::vec(any::<u8>(), 0..2048)) {
        let codec = CipherCodec::new();
        let envelope = codec.seal(&plaintext, shared_key()).unwrap();
        prop_assert_eq!(envelope.ciphertext().len(), plaintext.len());

        let parsed = EncryptedEnvelope::from_slice(&envelope.to_bytes()).unwrap();
        let decrypted = codec.unseal(&parsed, shared_key()).unwrap();
        prop_assert_eq!(decrypted.as_slice(), plaintext.as_slice());
    }
}

#[test]
fn test_literal_example_shape() {
    let codec = CipherCodec::new();
    let envelope = codec
        .encrypt(b"# hello\n\nbody", PASSWORD)
        .expect("encryption should succeed");

    let value: serde_json::Value =
        serde_json::from_str(&envelope.to_json()).expect("record should be JSON");
    let object = value.as_object().expect("record should be an object");
    assert_eq!(object.len(), 3);
    assert_eq!(object["iv"].as_str().unwrap().len(), 24);
    assert_eq!(object["content"].as_str().unwrap().len(), 26);
    assert_eq!(object["tag"].as_str().unwrap().len(), 32);

    let decrypted = codec
        .decrypt_bytes(&envelope.to_bytes(), PASSWORD)
        .expect("decryption should succeed");
    assert_eq!(decrypted.as_slice(), b"# hello\n\nbody");
}

#[test]
fn test_empty_password_round_trips() {
    let codec = CipherCodec::new();
    let envelope = codec
        .encrypt(b"# hello\n\nbody", "")
        .expect("encryption should succeed");

    let decrypted = codec
        .decrypt_bytes(&envelope.to_bytes(), "")
        .expect("decryption should succeed");
    assert_eq!(decrypted.as_slice(), b"# hello\n\nbody");
    assert!(matches!(
        codec.decrypt(&envelope, PASSWORD),
        Err(NoteError::Decryption)
    ));
}

#[test]
fn test_same_plaintext_encrypts_differently() {
    let first = sample_envelope();
    let second = sample_envelope();

    assert_ne!(first.nonce(), second.nonce());
    assert_ne!(first.ciphertext(), second.ciphertext());
    assert_ne!(first.to_json(), second.to_json());
}

#[test]
fn test_wrong_password_is_decryption_error() {
    let envelope = CipherCodec::new()
        .encrypt(b"secret", PASSWORD)
        .expect("encryption should succeed");

    let result = CipherCodec::new().decrypt(&envelope, "correct-horsf");
    assert!(matches!(result, Err(NoteError::Decryption)));
}

#[test]
fn test_every_field_bit_flip_is_detected() {
    let codec = CipherCodec::new();
    let envelope = sample_envelope();

    let mut flips = 0;
    for bit in 0..NONCE_LENGTH * 8 {
        let mut nonce = *envelope.nonce();
        nonce[bit / 8] ^= 1 << (bit % 8);
        let tampered = EncryptedEnvelope::from_parts(
            nonce,
            envelope.ciphertext().to_vec(),
            *envelope.auth_tag(),
        );
        assert!(matches!(
            codec.unseal(&tampered, shared_key()),
            Err(NoteError::Decryption)
        ));
        flips += 1;
    }
    for bit in 0..envelope.ciphertext().len() * 8 {
        let mut ciphertext = envelope.ciphertext().to_vec();
        ciphertext[bit / 8] ^= 1 << (bit % 8);
        let tampered =
            EncryptedEnvelope::from_parts(*envelope.nonce(), ciphertext, *envelope.auth_tag());
        assert!(matches!(
            codec.unseal(&tampered, shared_key()),
            Err(NoteError::Decryption)
        ));
        flips += 1;
    }
    for bit in 0..TAG_LENGTH * 8 {
        let mut tag = *envelope.auth_tag();
        tag[bit / 8] ^= 1 << (bit % 8);
        let tampered =
            EncryptedEnvelope::from_parts(*envelope.nonce(), envelope.ciphertext().to_vec(), tag);
        assert!(matches!(
            codec.unseal(&tampered, shared_key()),
            Err(NoteError::Decryption)
        ));
        flips += 1;
    }
    assert_eq!(flips, (12 + 13 + 16) * 8);
}

#[test]
fn test_every_serialized_bit_flip_is_rejected() {
    let codec = CipherCodec::new();
    let bytes = sample_envelope().to_bytes();

    for index in 0..bytes.len() {
        for bit in 0..8 {
            let mut tampered = bytes.clone();
            tampered[index] ^= 1 << bit;

            let outcome = EncryptedEnvelope::from_slice(&tampered)
                .and_then(|envelope| codec.unseal(&envelope, shared_key()));
            assert!(
                outcome.is_err(),
                "flip of bit {} in byte {} was accepted",
                bit,
                index
            );
        }
    }
}

#[test]
fn test_uppercase_hex_is_rejected() {
    let mut record: serde_json::Value =
        serde_json::from_str(&sample_envelope().to_json()).expect("record should be JSON");
    for field in ["iv", "content", "tag"] {
        let upper = record[field].as_str().unwrap().to_uppercase();
        record[field] = serde_json::Value::String(upper);
    }
    let shouted = record.to_string();

    let result = CipherCodec::new().decrypt_bytes(shouted.as_bytes(), PASSWORD);
    assert!(matches!(result, Err(NoteError::Decryption)));
    assert!(matches!(
        EncryptedEnvelope::from_json(&shouted),
        Err(NoteError::EnvelopeParse(_))
    ));
}

#[test]
fn test_ciphertext_never_contains_plaintext() {
    let envelope = CipherCodec::new()
        .seal(b"marker: PLAINTEXT_MARKER_123", shared_key())
        .expect("encryption should succeed");

    let on_disk = String::from_utf8(envelope.to_bytes()).expect("record is utf-8");
    assert!(!on_disk.contains("PLAINTEXT_MARKER_123"));
    assert!(!on_disk.contains(&hex::encode("PLAINTEXT_MARKER_123")));
}
