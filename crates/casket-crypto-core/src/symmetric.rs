//! AES-GCM authenticated encryption with caller-supplied nonces.
//!
//! This module provides:
//! - [`encrypt`]: encrypt plaintext, returning [`SealedData`] (ciphertext + detached tag)
//! - [`decrypt`]: authenticate and decrypt, returning [`SecretBuffer`]
//!
//! The key length selects the cipher: 16 bytes for AES-128-GCM, 32 bytes for
//! AES-256-GCM. Nonces are chosen by the secure-channel protocol above the
//! vault (counter-based), so they are passed in rather than generated here.

use crate::error::CryptoError;
use crate::memory::SecretBuffer;
use ring::aead;
use zeroize::Zeroize;

/// AES-GCM nonce length in bytes (96 bits).
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length in bytes (128 bits).
pub const TAG_LEN: usize = 16;

/// AES-128 key length in bytes.
pub const AES128_KEY_LEN: usize = 16;

/// AES-256 key length in bytes.
pub const AES256_KEY_LEN: usize = 32;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Ciphertext with its detached authentication tag.
#[must_use = "encrypted data must be stored or transmitted"]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SealedData {
    /// Encrypted data (same length as the plaintext).
    pub ciphertext: Vec<u8>,
    /// 128-bit authentication tag.
    pub tag: [u8; TAG_LEN],
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn cipher_key(key: &[u8]) -> Result<aead::LessSafeKey, CryptoError> {
    let algorithm = match key.len() {
        AES128_KEY_LEN => &aead::AES_128_GCM,
        AES256_KEY_LEN => &aead::AES_256_GCM,
        other => {
            return Err(CryptoError::Encryption(format!(
                "invalid key length: {other} bytes (expected {AES128_KEY_LEN} or {AES256_KEY_LEN})"
            )))
        }
    };
    let unbound = aead::UnboundKey::new(algorithm, key)
        .map_err(|_| CryptoError::Encryption("failed to create AES-GCM key".into()))?;
    Ok(aead::LessSafeKey::new(unbound))
}

fn nonce(nonce: &[u8]) -> Result<aead::Nonce, CryptoError> {
    aead::Nonce::try_assume_unique_for_key(nonce).map_err(|_| {
        CryptoError::Encryption(format!(
            "invalid nonce length: {} bytes (expected {NONCE_LEN})",
            nonce.len()
        ))
    })
}

// ---------------------------------------------------------------------------
// Core encryption
// ---------------------------------------------------------------------------

/// Encrypt `plaintext` under `key` and `nonce`, authenticating `aad`.
///
/// # Errors
///
/// Returns `CryptoError::Encryption` if the key is not 16 or 32 bytes, the
/// nonce is not 12 bytes, or the cipher fails.
pub fn encrypt(
    key: &[u8],
    nonce_bytes: &[u8],
    aad: &[u8],
    plaintext: &[u8],
) -> Result<SealedData, CryptoError> {
    let key = cipher_key(key)?;
    let nonce = nonce(nonce_bytes)?;

    let mut in_out = plaintext.to_vec();
    let Ok(tag) = key.seal_in_place_separate_tag(nonce, aead::Aad::from(aad), &mut in_out) else {
        in_out.zeroize();
        return Err(CryptoError::Encryption("AES-GCM encryption failed".into()));
    };

    let mut tag_bytes = [0u8; TAG_LEN];
    tag_bytes.copy_from_slice(tag.as_ref());

    Ok(SealedData {
        ciphertext: in_out,
        tag: tag_bytes,
    })
}

/// Authenticate and decrypt `ciphertext` with its detached `tag`.
///
/// The intermediate buffer is zeroized once the plaintext has been copied
/// into the returned [`SecretBuffer`].
///
/// # Errors
///
/// Returns `CryptoError::Encryption` for a bad key, nonce, or tag length.
/// Returns `CryptoError::Decryption` if the tag does not verify (tampered
/// data, wrong key, nonce, or AAD).
pub fn decrypt(
    key: &[u8],
    nonce_bytes: &[u8],
    aad: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
) -> Result<SecretBuffer, CryptoError> {
    if tag.len() != TAG_LEN {
        return Err(CryptoError::Encryption(format!(
            "invalid tag length: {} bytes (expected {TAG_LEN})",
            tag.len()
        )));
    }
    let key = cipher_key(key)?;
    let nonce = nonce(nonce_bytes)?;

    let mut ct_tag = Vec::with_capacity(ciphertext.len().saturating_add(TAG_LEN));
    ct_tag.extend_from_slice(ciphertext);
    ct_tag.extend_from_slice(tag);

    let opened = key.open_in_place(nonce, aead::Aad::from(aad), &mut ct_tag);
    let result = match opened {
        Ok(plaintext) => SecretBuffer::new(plaintext),
        Err(_) => Err(CryptoError::Decryption),
    };
    ct_tag.zeroize();
    result
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
