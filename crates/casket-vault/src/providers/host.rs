//! Host-software Backend Provider on top of `casket-crypto-core`.
//!
//! Private scalars live in [`SecretBytes`] inside this provider's key store and
//! are zeroized when overwritten or dropped. Hashing keeps its running state in
//! the provider rather than in the caller's context buffer, so it asks for a
//! zero-length context.

use casket_crypto_core::{
    agree, decrypt, ecdh, encrypt, fill_random, generate_keypair, hkdf_sha256, CryptoError, Curve,
    SealedData, SecretBuffer, SecretBytes, Sha256Stream, PRIVATE_KEY_LEN,
};

use crate::backend::Backend;
use crate::error::VaultError;
use crate::identity::BackendId;
use crate::key_store::{KeyRole, KeyStore};
use crate::peer_key::PeerKeyRecord;

/// Largest single random request served by the host CSPRNG.
pub const HOST_MAX_RANDOM_SIZE: usize = 65_536;

/// Software cryptography on the host CPU.
#[derive(Debug)]
pub struct HostBackend {
    keys: KeyStore<SecretBytes<PRIVATE_KEY_LEN>>,
    stream: Option<Sha256Stream>,
}

impl HostBackend {
    /// Provider generating keys on `curve`.
    #[must_use]
    pub const fn new(curve: Curve) -> Self {
        Self {
            keys: KeyStore::new(BackendId::HOST_SOFTWARE, curve),
            stream: None,
        }
    }

    /// Install an existing private scalar as the key for `role`.
    ///
    /// Lets a long-term identity survive restarts; the public half is
    /// recomputed from the scalar.
    ///
    /// # Errors
    ///
    /// [`VaultError::KeyOperationFailure`] if `private` is not a valid scalar
    /// for the curve.
    pub fn import_private(
        &mut self,
        role: KeyRole,
        private: SecretBytes<PRIVATE_KEY_LEN>,
    ) -> Result<(), VaultError> {
        let public = ecdh::public_key(self.keys.curve(), &private).map_err(key_failure)?;
        self.keys.install(role, public, private)?;
        tracing::debug!(%role, "imported host key");
        Ok(())
    }
}

fn key_failure(e: CryptoError) -> VaultError {
    VaultError::KeyOperationFailure(e.to_string())
}

fn hash_failure(e: CryptoError) -> VaultError {
    VaultError::HashFailure(e.to_string())
}

impl Backend for HostBackend {
    fn id(&self) -> BackendId {
        BackendId::HOST_SOFTWARE
    }

    fn curve(&self) -> Curve {
        self.keys.curve()
    }

    fn max_random_size(&self) -> usize {
        HOST_MAX_RANDOM_SIZE
    }

    fn fill_random(&mut self, out: &mut [u8]) -> Result<(), VaultError> {
        fill_random(out).map_err(|e| VaultError::RandomGenerationFailure(e.to_string()))
    }

    fn generate_key(&mut self, role: KeyRole) -> Result<(), VaultError> {
        let pair = generate_keypair(self.keys.curve()).map_err(key_failure)?;
        self.keys.install(role, pair.public, pair.private)?;
        Ok(())
    }

    fn read_public(&self, role: KeyRole, out: &mut [u8]) -> Result<(), VaultError> {
        self.keys.copy_public(role, out)
    }

    fn agree(
        &mut self,
        role: KeyRole,
        peer: &PeerKeyRecord,
        out: &mut [u8],
    ) -> Result<(), VaultError> {
        let slot = self.keys.slot(role)?;
        let secret =
            agree(self.keys.curve(), slot.private(), peer.public_key()).map_err(key_failure)?;
        if out.len() != secret.expose().len() {
            return Err(VaultError::SizeMismatch(format!(
                "shared secret buffer is {} bytes (expected {})",
                out.len(),
                secret.expose().len()
            )));
        }
        out.copy_from_slice(secret.expose());
        Ok(())
    }

    fn hash_context_len(&self, _message_len: usize) -> usize {
        0
    }

    fn hash_start(&mut self, _context: &mut [u8]) -> Result<(), VaultError> {
        self.stream = Some(Sha256Stream::new());
        Ok(())
    }

    fn hash_update(&mut self, _context: &mut [u8], data: &[u8]) -> Result<(), VaultError> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| VaultError::HashFailure("no hash session started".into()))?;
        stream.update(data);
        Ok(())
    }

    fn hash_finalize(&mut self, _context: &mut [u8], digest: &mut [u8]) -> Result<(), VaultError> {
        let stream = self
            .stream
            .take()
            .ok_or_else(|| VaultError::HashFailure("no hash session started".into()))?;
        stream.finish(digest).map_err(hash_failure)
    }

    fn derive(
        &mut self,
        salt: &[u8],
        ikm: &[u8],
        info: &[u8],
        out: &mut [u8],
    ) -> Result<(), VaultError> {
        hkdf_sha256(salt, ikm, info, out).map_err(|e| VaultError::DerivationFailure(e.to_string()))
    }

    fn seal(
        &mut self,
        key: &[u8],
        nonce: &[u8],
        aad: &[u8],
        plaintext: &[u8],
    ) -> Result<SealedData, VaultError> {
        encrypt(key, nonce, aad, plaintext)
            .map_err(|e| VaultError::EncryptionFailure(e.to_string()))
    }

    fn unseal(
        &mut self,
        key: &[u8],
        nonce: &[u8],
        aad: &[u8],
        ciphertext: &[u8],
        tag: &[u8],
    ) -> Result<SecretBuffer, VaultError> {
        decrypt(key, nonce, aad, ciphertext, tag).map_err(|e| match e {
            CryptoError::Decryption => VaultError::AuthenticationFailure,
            other => VaultError::EncryptionFailure(other.to_string()),
        })
    }
}
