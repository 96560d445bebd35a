//! Vault error taxonomy for `casket-vault`.
//!
//! Every operation returns one of these as an explicit value. Backend-internal
//! failures (`CryptoError`, element driver status codes) are mapped into this
//! taxonomy by the operation that observed them.

use casket_crypto_core::Curve;
use thiserror::Error;

use crate::capability::Capability;
use crate::config::Interface;
use crate::identity::BackendId;

/// Errors produced by vault operations.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum VaultError {
    /// Unknown enum value (role, capability, backend code) or an absent
    /// required argument.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A fixed-length buffer had the wrong length, or a bounded length was
    /// exceeded.
    #[error("size mismatch: {0}")]
    SizeMismatch(String),

    /// The configured transport is not offered by the target backend.
    #[error("{backend} does not support the {interface} interface")]
    UnsupportedInterface {
        /// Backend that rejected the transport.
        backend: BackendId,
        /// Requested transport.
        interface: Interface,
    },

    /// The capability is not implemented by the backend it is bound to.
    #[error("{backend} does not implement {capability}")]
    UnsupportedCapability {
        /// Requested capability.
        capability: Capability,
        /// Backend the capability was bound to.
        backend: BackendId,
    },

    /// No backend is bound to the capability.
    #[error("no backend bound to {0}")]
    UnboundCapability(Capability),

    /// The backend bound to key capabilities does not offer the curve.
    #[error("{backend} does not support curve {curve}")]
    UnsupportedCurve {
        /// Configured curve.
        curve: Curve,
        /// Backend bound to key generation/agreement.
        backend: BackendId,
    },

    /// Configuration document unreadable, unparseable, or inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// The backend session could not be opened.
    #[error("backend initialization failed: {0}")]
    BackendInitFailure(String),

    /// The backend could not produce random bytes.
    #[error("random generation failed: {0}")]
    RandomGenerationFailure(String),

    /// Key generation, public key read, or key agreement failed.
    #[error("key operation failed: {0}")]
    KeyOperationFailure(String),

    /// Hash session start/update/finalize failed, or the digest buffer was
    /// not 32 bytes.
    #[error("hash failed: {0}")]
    HashFailure(String),

    /// HKDF failed.
    #[error("key derivation failed: {0}")]
    DerivationFailure(String),

    /// AES-GCM failed for a reason other than tag mismatch.
    #[error("encryption failed: {0}")]
    EncryptionFailure(String),

    /// AES-GCM tag mismatch on decryption.
    #[error("authentication failed: tag mismatch")]
    AuthenticationFailure,

    /// A scoped working buffer could not be obtained.
    #[error("resource acquisition failed: {0}")]
    ResourceAcquireFailure(String),

    /// A scoped working buffer or backend session could not be released.
    #[error("resource release failed: {0}")]
    ResourceReleaseFailure(String),
}
