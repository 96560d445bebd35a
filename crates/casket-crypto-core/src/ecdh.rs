//! Elliptic-curve key pairs and Diffie-Hellman agreement.
//!
//! This module provides:
//! - [`Curve`]: the supported curves and their fixed encodings
//! - [`generate_keypair`]: a fresh key pair, private half in [`SecretBytes`]
//! - [`agree`]: ECDH between a held private key and a raw peer public key
//!
//! # Public key encodings
//!
//! ```text
//! P-256       x (32 bytes) || y (32 bytes)    uncompressed point, no 0x04 prefix
//! Curve25519  u (32 bytes)                    RFC 7748 little-endian
//! ```
//!
//! Both curves produce a 32-byte shared secret.

use crate::error::CryptoError;
use crate::memory::SecretBytes;
use p256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::Zeroize;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// P-256 raw public key length (x || y).
pub const P256_PUBLIC_KEY_LEN: usize = 64;

/// Curve25519 public key length.
pub const CURVE25519_PUBLIC_KEY_LEN: usize = 32;

/// Private scalar length for both curves.
pub const PRIVATE_KEY_LEN: usize = 32;

/// Shared secret length for both curves.
pub const SHARED_SECRET_LEN: usize = 32;

/// SEC1 tag for an uncompressed point.
const SEC1_UNCOMPRESSED_TAG: u8 = 0x04;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Elliptic curve used for static and ephemeral key slots.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Curve {
    /// NIST P-256 (secp256r1).
    #[default]
    P256,
    /// Curve25519 (X25519 key agreement).
    Curve25519,
}

impl Curve {
    /// Fixed length of this curve's raw public key.
    #[must_use]
    pub const fn public_key_len(self) -> usize {
        match self {
            Self::P256 => P256_PUBLIC_KEY_LEN,
            Self::Curve25519 => CURVE25519_PUBLIC_KEY_LEN,
        }
    }

    /// Stable identifier (used in configuration files).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::P256 => "p256",
            Self::Curve25519 => "curve25519",
        }
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A freshly generated key pair.
#[must_use = "the private half is lost if the key pair is dropped"]
pub struct KeyPair {
    /// Curve the pair belongs to.
    pub curve: Curve,
    /// Raw public key, exactly [`Curve::public_key_len`] bytes.
    pub public: Vec<u8>,
    /// Private scalar, zeroized on drop.
    pub private: SecretBytes<PRIVATE_KEY_LEN>,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("curve", &self.curve)
            .field("public_len", &self.public.len())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Key generation
// ---------------------------------------------------------------------------

/// Generate a key pair on `curve` from the OS CSPRNG.
///
/// # Errors
///
/// Returns [`CryptoError::KeyGeneration`] if the encoded public key does not
/// have the curve's fixed length.
pub fn generate_keypair(curve: Curve) -> Result<KeyPair, CryptoError> {
    match curve {
        Curve::P256 => generate_p256(),
        Curve::Curve25519 => Ok(generate_x25519()),
    }
}

fn generate_p256() -> Result<KeyPair, CryptoError> {
    let secret = p256::SecretKey::random(&mut OsRng);
    let encoded = secret.public_key().to_encoded_point(false);
    let public = strip_sec1_tag(encoded.as_bytes())
        .ok_or_else(|| CryptoError::KeyGeneration("unexpected P-256 point encoding".into()))?;

    let mut scalar = secret.to_bytes();
    let private = SecretBytes::from_slice(scalar.as_slice());
    scalar.as_mut_slice().zeroize();

    Ok(KeyPair {
        curve: Curve::P256,
        public,
        private: private?,
    })
}

fn generate_x25519() -> KeyPair {
    let secret = StaticSecret::random_from_rng(OsRng);
    let public = X25519PublicKey::from(&secret).to_bytes().to_vec();

    let mut scalar = secret.to_bytes();
    let private = SecretBytes::new(scalar);
    scalar.zeroize();

    KeyPair {
        curve: Curve::Curve25519,
        public,
        private,
    }
}

/// Derive the raw public key belonging to `private` on `curve`.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidKeyMaterial`] if `private` is not a valid
/// scalar for the curve.
pub fn public_key(
    curve: Curve,
    private: &SecretBytes<PRIVATE_KEY_LEN>,
) -> Result<Vec<u8>, CryptoError> {
    match curve {
        Curve::P256 => {
            let secret = p256::SecretKey::from_slice(private.expose())
                .map_err(|_| CryptoError::InvalidKeyMaterial("invalid P-256 scalar".into()))?;
            let encoded = secret.public_key().to_encoded_point(false);
            strip_sec1_tag(encoded.as_bytes())
                .ok_or_else(|| {
                    CryptoError::InvalidKeyMaterial("unexpected P-256 point encoding".into())
                })
        }
        Curve::Curve25519 => {
            let secret = StaticSecret::from(*private.expose());
            Ok(X25519PublicKey::from(&secret).to_bytes().to_vec())
        }
    }
}

// ---------------------------------------------------------------------------
// Key agreement
// ---------------------------------------------------------------------------

/// Compute the ECDH shared secret between `private` and `peer_public`.
///
/// The private key is only borrowed; the same key may be used for any number
/// of agreements.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidKeyMaterial`] if `peer_public` has the wrong
/// length or is not a valid point, and [`CryptoError::KeyAgreement`] if the
/// result is degenerate (X25519 low-order input).
pub fn agree(
    curve: Curve,
    private: &SecretBytes<PRIVATE_KEY_LEN>,
    peer_public: &[u8],
) -> Result<SecretBytes<SHARED_SECRET_LEN>, CryptoError> {
    if peer_public.len() != curve.public_key_len() {
        return Err(CryptoError::InvalidKeyMaterial(format!(
            "invalid {curve} public key length: {} bytes (expected {})",
            peer_public.len(),
            curve.public_key_len()
        )));
    }

    match curve {
        Curve::P256 => agree_p256(private, peer_public),
        Curve::Curve25519 => agree_x25519(private, peer_public),
    }
}

fn agree_p256(
    private: &SecretBytes<PRIVATE_KEY_LEN>,
    peer_public: &[u8],
) -> Result<SecretBytes<SHARED_SECRET_LEN>, CryptoError> {
    let mut sec1 = Vec::with_capacity(P256_PUBLIC_KEY_LEN.saturating_add(1));
    sec1.push(SEC1_UNCOMPRESSED_TAG);
    sec1.extend_from_slice(peer_public);

    let point = p256::EncodedPoint::from_bytes(&sec1)
        .map_err(|_| CryptoError::InvalidKeyMaterial("malformed P-256 point".into()))?;
    let peer = Option::<p256::PublicKey>::from(p256::PublicKey::from_encoded_point(&point))
        .ok_or_else(|| CryptoError::InvalidKeyMaterial("P-256 point not on curve".into()))?;

    let secret = p256::SecretKey::from_slice(private.expose())
        .map_err(|_| CryptoError::InvalidKeyMaterial("invalid P-256 scalar".into()))?;

    let shared = p256::ecdh::diffie_hellman(secret.to_nonzero_scalar(), peer.as_affine());
    SecretBytes::from_slice(shared.raw_secret_bytes().as_slice())
}

fn agree_x25519(
    private: &SecretBytes<PRIVATE_KEY_LEN>,
    peer_public: &[u8],
) -> Result<SecretBytes<SHARED_SECRET_LEN>, CryptoError> {
    let mut peer_bytes = [0u8; CURVE25519_PUBLIC_KEY_LEN];
    peer_bytes.copy_from_slice(peer_public);
    let peer = X25519PublicKey::from(peer_bytes);

    let secret = StaticSecret::from(*private.expose());
    let shared = secret.diffie_hellman(&peer);
    if !shared.was_contributory() {
        return Err(CryptoError::KeyAgreement(
            "X25519 peer key is a low-order point".into(),
        ));
    }
    Ok(SecretBytes::new(shared.to_bytes()))
}

/// Drop the SEC1 `0x04` prefix from an uncompressed P-256 point.
fn strip_sec1_tag(encoded: &[u8]) -> Option<Vec<u8>> {
    match encoded.split_first() {
        Some((&SEC1_UNCOMPRESSED_TAG, rest)) if rest.len() == P256_PUBLIC_KEY_LEN => {
            Some(rest.to_vec())
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
