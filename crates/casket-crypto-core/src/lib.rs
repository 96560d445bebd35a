//! `casket-crypto-core`: host-software cryptographic primitives for CASKET.
//!
//! The software Backend Provider of `casket-vault` is built on this crate:
//! randomness, P-256 / Curve25519 key agreement, SHA-256, HKDF-SHA256, and
//! AES-GCM. No I/O, no logging, no global state.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod error;
pub mod memory;

pub mod random;

pub mod ecdh;

pub mod digest;

pub mod kdf;
pub mod symmetric;

pub use digest::{sha256, Sha256Stream, SHA256_DIGEST_LEN};
pub use ecdh::{agree, generate_keypair, Curve, KeyPair, PRIVATE_KEY_LEN, SHARED_SECRET_LEN};
pub use error::CryptoError;
pub use kdf::{hkdf_sha256, MAX_HKDF_OUTPUT_LEN};
pub use memory::{LockedRegion, SecretBuffer, SecretBytes};
pub use random::fill_random;
pub use symmetric::{decrypt, encrypt, SealedData, NONCE_LEN, TAG_LEN};
