//! NIST SP 800-38D: AES-GCM test cases 1, 2, 13 and 14 (all-zero key and IV).

use casket_crypto_core::{decrypt, encrypt, CryptoError};

use super::hex;

/// Test case 1: AES-128, empty plaintext.
#[test]
fn test_case_1_aes128_empty() {
    let sealed = encrypt(&[0u8; 16], &[0u8; 12], &[], &[]).unwrap();
    assert!(sealed.ciphertext.is_empty());
    assert_eq!(sealed.tag.to_vec(), hex("58e2fccefa7e3061367f1d57a4e7455a"));
}

/// Test case 2: AES-128, one zero block.
#[test]
fn test_case_2_aes128_one_block() {
    let sealed = encrypt(&[0u8; 16], &[0u8; 12], &[], &[0u8; 16]).unwrap();
    assert_eq!(sealed.ciphertext, hex("0388dace60b6a392f328c2b971b2fe78"));
    assert_eq!(sealed.tag.to_vec(), hex("ab6e47d42cec13bdf53a67b21257bddf"));
}

/// Test case 13: AES-256, empty plaintext.
#[test]
fn test_case_13_aes256_empty() {
    let sealed = encrypt(&[0u8; 32], &[0u8; 12], &[], &[]).unwrap();
    assert_eq!(sealed.tag.to_vec(), hex("530f8afbc74536b9a963b4f1c4cb738b"));
}

/// Test case 14: AES-256, one zero block, and the matching decryption.
#[test]
fn test_case_14_aes256_one_block() {
    let key = [0u8; 32];
    let nonce = [0u8; 12];
    let sealed = encrypt(&key, &nonce, &[], &[0u8; 16]).unwrap();
    assert_eq!(sealed.ciphertext, hex("cea7403d4d606b6e074ec5d3baf39d18"));
    assert_eq!(sealed.tag.to_vec(), hex("d0d1c8a799996bf0265b98b5d48ab919"));

    let opened = decrypt(&key, &nonce, &[], &sealed.ciphertext, &sealed.tag).unwrap();
    assert_eq!(opened.expose(), &[0u8; 16]);
}

#[test]
fn flipped_tag_bit_is_decryption_error() {
    let key = [0u8; 32];
    let nonce = [0u8; 12];
    let ciphertext = hex("cea7403d4d606b6e074ec5d3baf39d18");
    let mut tag = hex("d0d1c8a799996bf0265b98b5d48ab919");
    tag[15] ^= 0x80;

    let result = decrypt(&key, &nonce, &[], &ciphertext, &tag);
    assert!(matches!(result, Err(CryptoError::Decryption)));
}
