//! The contract every Backend Provider implements.
//!
//! Each method corresponds to one [`Capability`]. Default implementations
//! return [`VaultError::UnsupportedCapability`], so a provider only writes the
//! capabilities it actually has and everything else fails closed.
//!
//! The vault has already validated buffer lengths by the time a backend method
//! runs; backends still map their own internal failures to the taxonomy
//! category of the capability (`RandomGenerationFailure` for
//! [`Backend::fill_random`], `KeyOperationFailure` for key methods, and so on).

use std::fmt;

use casket_crypto_core::{Curve, SealedData, SecretBuffer};

use crate::capability::Capability;
use crate::config::TransportConfig;
use crate::error::VaultError;
use crate::identity::BackendId;
use crate::key_store::KeyRole;
use crate::peer_key::PeerKeyRecord;

/// Largest single random request when a backend declares nothing smaller.
pub const DEFAULT_MAX_RANDOM_SIZE: usize = 1024;

/// A Backend Provider: one secure element or one software library.
pub trait Backend: fmt::Debug {
    /// Identity used for dispatch.
    fn id(&self) -> BackendId;

    /// Error for a capability this backend does not implement.
    fn unsupported(&self, capability: Capability) -> VaultError {
        VaultError::UnsupportedCapability {
            capability,
            backend: self.id(),
        }
    }

    /// Curve of the keys this backend generates.
    fn curve(&self) -> Curve;

    /// Largest number of bytes one [`Backend::fill_random`] call may ask for.
    fn max_random_size(&self) -> usize {
        DEFAULT_MAX_RANDOM_SIZE
    }

    /// Open the backend session. Host software has nothing to open.
    ///
    /// # Errors
    ///
    /// [`VaultError::UnsupportedInterface`], [`VaultError::InvalidParameter`]
    /// (missing transport) or [`VaultError::BackendInitFailure`].
    fn open(&mut self, transport: Option<&TransportConfig>) -> Result<(), VaultError> {
        let _ = transport;
        Ok(())
    }

    /// Release the backend session. Must be idempotent.
    ///
    /// # Errors
    ///
    /// [`VaultError::ResourceReleaseFailure`] if the session could not be closed.
    fn close(&mut self) -> Result<(), VaultError> {
        Ok(())
    }

    /// Fill `out` with random bytes.
    ///
    /// # Errors
    ///
    /// [`VaultError::RandomGenerationFailure`]; contents of `out` are then
    /// unspecified.
    fn fill_random(&mut self, out: &mut [u8]) -> Result<(), VaultError> {
        let _ = out;
        Err(self.unsupported(Capability::Random))
    }

    /// Create or overwrite the key pair for `role`.
    ///
    /// # Errors
    ///
    /// [`VaultError::KeyOperationFailure`].
    fn generate_key(&mut self, role: KeyRole) -> Result<(), VaultError> {
        let _ = role;
        Err(self.unsupported(Capability::KeyGenerate))
    }

    /// Copy the public half of `role` into `out` (exactly the public key length).
    ///
    /// # Errors
    ///
    /// [`VaultError::KeyOperationFailure`] if the slot is empty.
    fn read_public(&self, role: KeyRole, out: &mut [u8]) -> Result<(), VaultError> {
        let _ = (role, out);
        Err(self.unsupported(Capability::KeyReadPublic))
    }

    /// ECDH between the private half of `role` and `peer`, written to `out`
    /// (exactly 32 bytes). Must not alter the slot.
    ///
    /// # Errors
    ///
    /// [`VaultError::KeyOperationFailure`].
    fn agree(
        &mut self,
        role: KeyRole,
        peer: &PeerKeyRecord,
        out: &mut [u8],
    ) -> Result<(), VaultError> {
        let _ = (role, peer, out);
        Err(self.unsupported(Capability::KeyAgreement))
    }

    /// Bytes of opaque session context a hash of `message_len` bytes needs.
    fn hash_context_len(&self, message_len: usize) -> usize {
        message_len
    }

    /// Begin a hash session whose state lives in `context`.
    ///
    /// # Errors
    ///
    /// [`VaultError::HashFailure`].
    fn hash_start(&mut self, context: &mut [u8]) -> Result<(), VaultError> {
        let _ = context;
        Err(self.unsupported(Capability::Hash))
    }

    /// Feed `data` into the session held in `context`.
    ///
    /// # Errors
    ///
    /// [`VaultError::HashFailure`].
    fn hash_update(&mut self, context: &mut [u8], data: &[u8]) -> Result<(), VaultError> {
        let _ = (context, data);
        Err(self.unsupported(Capability::Hash))
    }

    /// Finish the session held in `context`, writing 32 bytes to `digest`.
    ///
    /// # Errors
    ///
    /// [`VaultError::HashFailure`].
    fn hash_finalize(&mut self, context: &mut [u8], digest: &mut [u8]) -> Result<(), VaultError> {
        let _ = (context, digest);
        Err(self.unsupported(Capability::Hash))
    }

    /// HKDF-SHA256 into `out`.
    ///
    /// # Errors
    ///
    /// [`VaultError::DerivationFailure`].
    fn derive(
        &mut self,
        salt: &[u8],
        ikm: &[u8],
        info: &[u8],
        out: &mut [u8],
    ) -> Result<(), VaultError> {
        let _ = (salt, ikm, info, out);
        Err(self.unsupported(Capability::Derive))
    }

    /// AES-GCM encrypt with a detached tag.
    ///
    /// # Errors
    ///
    /// [`VaultError::EncryptionFailure`].
    fn seal(
        &mut self,
        key: &[u8],
        nonce: &[u8],
        aad: &[u8],
        plaintext: &[u8],
    ) -> Result<SealedData, VaultError> {
        let _ = (key, nonce, aad, plaintext);
        Err(self.unsupported(Capability::AuthenticatedEncrypt))
    }

    /// AES-GCM authenticate and decrypt.
    ///
    /// # Errors
    ///
    /// [`VaultError::AuthenticationFailure`] on tag mismatch,
    /// [`VaultError::EncryptionFailure`] otherwise.
    fn unseal(
        &mut self,
        key: &[u8],
        nonce: &[u8],
        aad: &[u8],
        ciphertext: &[u8],
        tag: &[u8],
    ) -> Result<SecretBuffer, VaultError> {
        let _ = (key, nonce, aad, ciphertext, tag);
        Err(self.unsupported(Capability::AuthenticatedEncrypt))
    }
}
