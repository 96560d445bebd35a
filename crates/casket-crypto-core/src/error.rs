//! Cryptographic error types for `casket-crypto-core`.

use thiserror::Error;

/// Errors produced by host-software cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The operating system CSPRNG could not fill the request.
    #[error("random generation failed: {0}")]
    Random(String),

    /// Key pair generation failed.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// Invalid key material (wrong length, point not on curve, zero scalar).
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// Elliptic-curve Diffie-Hellman failed (low-order or invalid peer point).
    #[error("key agreement failed: {0}")]
    KeyAgreement(String),

    /// SHA-256 computation failed or a digest session was misused.
    #[error("hash error: {0}")]
    Hash(String),

    /// HKDF extract/expand failed (output length out of range).
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// AES-GCM encryption failure or invalid key/nonce/tag length.
    #[error("encryption error: {0}")]
    Encryption(String),

    /// Authentication tag verification failed: ciphertext tampered or wrong key.
    #[error("decryption failed: authentication tag mismatch")]
    Decryption,

    /// Secure memory allocation failure.
    #[error("secure memory error: {0}")]
    SecureMemory(String),
}
