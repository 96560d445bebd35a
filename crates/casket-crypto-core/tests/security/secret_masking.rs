//! Secret-holding types must never print key material.

use casket_crypto_core::{agree, decrypt, encrypt, generate_keypair, Curve};

#[test]
fn key_pair_debug_omits_private_scalar() {
    let pair = generate_keypair(Curve::P256).unwrap();
    let debug = format!("{pair:?}");
    assert!(debug.contains("public_len: 64"), "{debug}");
    assert!(!debug.contains("private"), "{debug}");
}

#[test]
fn shared_secret_display_is_masked() {
    let a = generate_keypair(Curve::Curve25519).unwrap();
    let b = generate_keypair(Curve::Curve25519).unwrap();
    let secret = agree(Curve::Curve25519, &a.private, &b.public).unwrap();
    assert_eq!(format!("{secret}"), "SecretBytes<32>(***)");
    assert_eq!(format!("{secret:?}"), "SecretBytes<32>(***)");
}

#[test]
fn decrypted_plaintext_debug_is_masked() {
    let key = [7u8; 32];
    let nonce = [1u8; 12];
    let sealed = encrypt(&key, &nonce, &[], b"hunter2").unwrap();
    let opened = decrypt(&key, &nonce, &[], &sealed.ciphertext, &sealed.tag).unwrap();
    let debug = format!("{opened:?}");
    assert_eq!(debug, "SecretBuffer(***)");
    assert!(!debug.contains("hunter2"));
}
