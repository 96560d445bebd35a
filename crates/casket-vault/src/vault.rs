//! The vault facade: one entry point for every capability.
//!
//! Each operation validates its arguments, resolves the bound provider through
//! the [`CapabilityRegistry`], and delegates. Length checks run before the
//! provider is called, so a rejected call never starts a hardware transaction.
//!
//! Fixed-length outputs are written into caller buffers of exactly the
//! declared size; the `*_bytes`/owned variants wrap those for convenience.

use casket_crypto_core::{
    Curve, SealedData, SecretBuffer, SecretBytes, MAX_HKDF_OUTPUT_LEN, NONCE_LEN,
    SHA256_DIGEST_LEN, SHARED_SECRET_LEN, TAG_LEN,
};
use zeroize::Zeroize;

use crate::backend::Backend;
use crate::capability::Capability;
use crate::config::VaultConfig;
use crate::error::VaultError;
use crate::hash_session;
use crate::identity::BackendId;
use crate::key_store::KeyRole;
use crate::peer_key::PeerKeyRecord;
use crate::providers::host::HostBackend;
use crate::registry::CapabilityRegistry;
use crate::scratch::{HeapScratch, ScratchAllocator};

/// AES-GCM key lengths accepted by [`Vault::encrypt`].
const AEAD_KEY_LENS: [usize; 2] = [16, 32];

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Collects a configuration and the provider instances it refers to.
#[derive(Debug)]
pub struct VaultBuilder {
    config: VaultConfig,
    providers: Vec<Box<dyn Backend>>,
    scratch: Box<dyn ScratchAllocator>,
}

impl VaultBuilder {
    /// Add a provider. One per backend identity referenced by the bindings.
    #[must_use]
    pub fn backend(mut self, backend: impl Backend + 'static) -> Self {
        self.providers.push(Box::new(backend));
        self
    }

    /// Replace the default heap allocator for hash working buffers.
    #[must_use]
    pub fn scratch(mut self, allocator: impl ScratchAllocator + 'static) -> Self {
        self.scratch = Box::new(allocator);
        self
    }

    /// Validate the configuration and wire the registry. No provider is called.
    ///
    /// # Errors
    ///
    /// Everything [`VaultConfig::validate`] and [`CapabilityRegistry::new`]
    /// return.
    pub fn build(self) -> Result<Vault, VaultError> {
        self.config.validate()?;
        let registry =
            CapabilityRegistry::new(&self.config.bindings, self.config.curve, self.providers)?;
        Ok(Vault {
            config: self.config,
            registry,
            scratch: self.scratch,
            initialized: false,
        })
    }

    /// [`VaultBuilder::build`] followed by [`Vault::init`].
    ///
    /// # Errors
    ///
    /// Configuration errors, then whatever [`Vault::init`] returns.
    pub fn init(self) -> Result<Vault, VaultError> {
        let mut vault = self.build()?;
        vault.init()?;
        Ok(vault)
    }
}

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

/// Uniform cryptographic API over the configured Backend Providers.
///
/// Synchronous and single-owner: every method takes `&mut self`, so concurrent
/// use of one vault needs external locking.
#[derive(Debug)]
pub struct Vault {
    config: VaultConfig,
    registry: CapabilityRegistry,
    scratch: Box<dyn ScratchAllocator>,
    initialized: bool,
}

impl Vault {
    /// Start building a vault for `config`.
    #[must_use]
    pub fn builder(config: VaultConfig) -> VaultBuilder {
        VaultBuilder {
            config,
            providers: Vec::new(),
            scratch: Box::new(HeapScratch),
        }
    }

    /// Initialized vault with every capability on host software.
    ///
    /// # Errors
    ///
    /// Whatever [`VaultBuilder::init`] returns.
    pub fn host(curve: Curve) -> Result<Self, VaultError> {
        Self::builder(VaultConfig::host_only(curve))
            .backend(HostBackend::new(curve))
            .init()
    }

    /// Configuration the vault was built from.
    #[must_use]
    pub const fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Curve of the key slots.
    #[must_use]
    pub const fn curve(&self) -> Curve {
        self.config.curve
    }

    /// Exact public key length for [`Vault::read_public`] and [`Vault::agree`].
    #[must_use]
    pub const fn public_key_len(&self) -> usize {
        self.config.curve.public_key_len()
    }

    /// Returns `true` between a successful [`Vault::init`] and [`Vault::free`].
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Identity of the backend serving `capability`.
    ///
    /// # Errors
    ///
    /// [`VaultError::UnsupportedCapability`] if the bound backend cannot serve it.
    pub fn backend_for(&self, capability: Capability) -> Result<BackendId, VaultError> {
        self.registry.resolve(capability)
    }

    // -- Lifecycle ---------------------------------------------------------

    /// Open every provider's session, the `Init` backend first, each with its
    /// configured transport.
    ///
    /// If one provider fails, those already opened are closed again and the
    /// failure is returned.
    ///
    /// # Errors
    ///
    /// - [`VaultError::UnsupportedInterface`] if a transport names a bus the
    ///   element does not offer
    /// - [`VaultError::InvalidParameter`] if an element has no transport
    /// - [`VaultError::BackendInitFailure`] for a hardware or driver fault
    pub fn init(&mut self) -> Result<(), VaultError> {
        self.registry.resolve(Capability::Init)?;
        if self.initialized {
            return Ok(());
        }

        let mut opened = 0usize;
        let mut failure = None;
        for provider in self.registry.providers_mut() {
            let transport = self.config.transport_for(provider.id());
            match provider.open(transport) {
                Ok(()) => opened = opened.saturating_add(1),
                Err(e) => {
                    tracing::warn!(backend = %provider.id(), error = %e, "backend init failed");
                    failure = Some(e);
                    break;
                }
            }
        }

        if let Some(e) = failure {
            for provider in self.registry.providers_mut().take(opened) {
                if let Err(close_err) = provider.close() {
                    tracing::warn!(
                        backend = %provider.id(),
                        error = %close_err,
                        "rollback close failed"
                    );
                }
            }
            return Err(e);
        }

        self.initialized = true;
        tracing::debug!(curve = %self.config.curve, "vault initialized");
        Ok(())
    }

    /// Close every provider's session. Idempotent; the first close failure is
    /// returned after all providers have been asked to close.
    ///
    /// # Errors
    ///
    /// [`VaultError::ResourceReleaseFailure`] if a session could not be closed.
    pub fn free(&mut self) -> Result<(), VaultError> {
        let mut first_error = None;
        for provider in self.registry.providers_mut() {
            if let Err(e) = provider.close() {
                tracing::warn!(backend = %provider.id(), error = %e, "backend close failed");
                first_error.get_or_insert(e);
            }
        }
        if self.initialized {
            tracing::debug!("vault freed");
        }
        self.initialized = false;
        first_error.map_or(Ok(()), Err)
    }

    // -- Randomness --------------------------------------------------------

    /// Fill `out` with random bytes from the bound backend.
    ///
    /// # Errors
    ///
    /// - [`VaultError::SizeMismatch`] if `out` is empty or longer than the
    ///   backend's ceiling (no backend call is made)
    /// - [`VaultError::RandomGenerationFailure`] from the backend
    pub fn random(&mut self, out: &mut [u8]) -> Result<(), VaultError> {
        let backend = self.registry.provider_mut(Capability::Random)?;
        let max = backend.max_random_size();
        if out.is_empty() || out.len() > max {
            return Err(VaultError::SizeMismatch(format!(
                "random request of {} bytes outside 1..={max}",
                out.len()
            )));
        }
        backend.fill_random(out)
    }

    /// `len` random bytes.
    ///
    /// # Errors
    ///
    /// As [`Vault::random`].
    pub fn random_bytes(&mut self, len: usize) -> Result<Vec<u8>, VaultError> {
        let mut out = vec![0u8; len];
        self.random(&mut out)?;
        Ok(out)
    }

    // -- Keys --------------------------------------------------------------

    /// Generate (or regenerate) the key pair for `role`.
    ///
    /// # Errors
    ///
    /// [`VaultError::KeyOperationFailure`] from the backend.
    pub fn generate(&mut self, role: KeyRole) -> Result<(), VaultError> {
        let backend = self.registry.provider_mut(Capability::KeyGenerate)?;
        backend.generate_key(role)?;
        tracing::debug!(%role, backend = %backend.id(), "key generated");
        Ok(())
    }

    /// Copy the public key of `role` into `out`.
    ///
    /// # Errors
    ///
    /// - [`VaultError::SizeMismatch`] if `out` is not exactly
    ///   [`Vault::public_key_len`] bytes
    /// - [`VaultError::KeyOperationFailure`] if no key was generated for `role`
    pub fn read_public(&self, role: KeyRole, out: &mut [u8]) -> Result<(), VaultError> {
        self.check_public_len(out.len(), "public key buffer")?;
        self.registry
            .provider(Capability::KeyReadPublic)?
            .read_public(role, out)
    }

    /// The public key of `role`.
    ///
    /// # Errors
    ///
    /// As [`Vault::read_public`].
    pub fn public_key(&self, role: KeyRole) -> Result<Vec<u8>, VaultError> {
        let mut out = vec![0u8; self.public_key_len()];
        self.read_public(role, &mut out)?;
        Ok(out)
    }

    /// ECDH between the key of `role` and `peer_public`, written to `out`.
    ///
    /// # Errors
    ///
    /// - [`VaultError::SizeMismatch`] if `peer_public` is not
    ///   [`Vault::public_key_len`] bytes or `out` is not 32 bytes (no backend
    ///   call is made)
    /// - [`VaultError::KeyOperationFailure`] from the backend
    pub fn agree(
        &mut self,
        role: KeyRole,
        peer_public: &[u8],
        out: &mut [u8],
    ) -> Result<(), VaultError> {
        self.check_public_len(peer_public.len(), "peer public key")?;
        if out.len() != SHARED_SECRET_LEN {
            return Err(VaultError::SizeMismatch(format!(
                "shared secret buffer is {} bytes (expected {SHARED_SECRET_LEN})",
                out.len()
            )));
        }
        let record = PeerKeyRecord::encode(peer_public)?;
        self.registry
            .provider_mut(Capability::KeyAgreement)?
            .agree(role, &record, out)
    }

    /// ECDH returning the shared secret in zeroize-on-drop storage.
    ///
    /// # Errors
    ///
    /// As [`Vault::agree`].
    pub fn agree_secret(
        &mut self,
        role: KeyRole,
        peer_public: &[u8],
    ) -> Result<SecretBytes<SHARED_SECRET_LEN>, VaultError> {
        let mut out = [0u8; SHARED_SECRET_LEN];
        let result = self.agree(role, peer_public, &mut out);
        let secret = SecretBytes::new(out);
        out.zeroize();
        result.map(|()| secret)
    }

    fn check_public_len(&self, len: usize, what: &str) -> Result<(), VaultError> {
        if len == self.public_key_len() {
            Ok(())
        } else {
            Err(VaultError::SizeMismatch(format!(
                "{what} is {len} bytes (expected {} for {})",
                self.public_key_len(),
                self.config.curve
            )))
        }
    }

    // -- Hashing -----------------------------------------------------------

    /// SHA-256 of `message` into `out`.
    ///
    /// # Errors
    ///
    /// - [`VaultError::HashFailure`] if `out` is not 32 bytes (before any
    ///   working buffer is acquired) or a session step fails
    /// - [`VaultError::ResourceAcquireFailure`] /
    ///   [`VaultError::ResourceReleaseFailure`] from the working buffer
    pub fn hash(&mut self, message: &[u8], out: &mut [u8]) -> Result<(), VaultError> {
        if out.len() != SHA256_DIGEST_LEN {
            return Err(VaultError::HashFailure(format!(
                "digest buffer is {} bytes (expected {SHA256_DIGEST_LEN})",
                out.len()
            )));
        }
        let backend = self.registry.provider_mut(Capability::Hash)?;
        hash_session::digest(backend, &mut *self.scratch, message, out)
    }

    /// SHA-256 of `message`.
    ///
    /// # Errors
    ///
    /// As [`Vault::hash`].
    pub fn sha256(&mut self, message: &[u8]) -> Result<[u8; SHA256_DIGEST_LEN], VaultError> {
        let mut out = [0u8; SHA256_DIGEST_LEN];
        self.hash(message, &mut out)?;
        Ok(out)
    }

    // -- Derivation and AEAD -----------------------------------------------

    /// HKDF-SHA256 of `ikm` with `salt` and `info`, filling `out`.
    ///
    /// # Errors
    ///
    /// - [`VaultError::SizeMismatch`] if `out` is empty or longer than 8160 bytes
    /// - [`VaultError::DerivationFailure`] from the backend
    pub fn derive(
        &mut self,
        salt: &[u8],
        ikm: &[u8],
        info: &[u8],
        out: &mut [u8],
    ) -> Result<(), VaultError> {
        if out.is_empty() || out.len() > MAX_HKDF_OUTPUT_LEN {
            return Err(VaultError::SizeMismatch(format!(
                "derived output of {} bytes outside 1..={MAX_HKDF_OUTPUT_LEN}",
                out.len()
            )));
        }
        self.registry
            .provider_mut(Capability::Derive)?
            .derive(salt, ikm, info, out)
    }

    /// AES-GCM encrypt `plaintext` into `ciphertext` (same length) and `tag`
    /// (16 bytes).
    ///
    /// # Errors
    ///
    /// - [`VaultError::SizeMismatch`] for a key not 16/32 bytes, a nonce not
    ///   12 bytes, or output buffers of the wrong length
    /// - [`VaultError::EncryptionFailure`] from the backend
    pub fn encrypt(
        &mut self,
        key: &[u8],
        nonce: &[u8],
        aad: &[u8],
        plaintext: &[u8],
        ciphertext: &mut [u8],
        tag: &mut [u8],
    ) -> Result<(), VaultError> {
        check_aead_params(key, nonce)?;
        check_len("ciphertext buffer", ciphertext.len(), plaintext.len())?;
        check_len("tag buffer", tag.len(), TAG_LEN)?;

        let sealed = self.seal(key, nonce, aad, plaintext)?;
        ciphertext.copy_from_slice(&sealed.ciphertext);
        tag.copy_from_slice(&sealed.tag);
        Ok(())
    }

    /// AES-GCM authenticate and decrypt `ciphertext` into `plaintext` (same
    /// length).
    ///
    /// # Errors
    ///
    /// - [`VaultError::SizeMismatch`] for bad key, nonce, tag, or output lengths
    /// - [`VaultError::AuthenticationFailure`] if the tag does not verify
    /// - [`VaultError::EncryptionFailure`] for other backend failures
    pub fn decrypt(
        &mut self,
        key: &[u8],
        nonce: &[u8],
        aad: &[u8],
        ciphertext: &[u8],
        tag: &[u8],
        plaintext: &mut [u8],
    ) -> Result<(), VaultError> {
        check_len("plaintext buffer", plaintext.len(), ciphertext.len())?;
        let opened = self.unseal(key, nonce, aad, ciphertext, tag)?;
        plaintext.copy_from_slice(opened.expose());
        Ok(())
    }

    /// AES-GCM encrypt, returning ciphertext and detached tag.
    ///
    /// # Errors
    ///
    /// As [`Vault::encrypt`].
    pub fn seal(
        &mut self,
        key: &[u8],
        nonce: &[u8],
        aad: &[u8],
        plaintext: &[u8],
    ) -> Result<SealedData, VaultError> {
        check_aead_params(key, nonce)?;
        self.registry
            .provider_mut(Capability::AuthenticatedEncrypt)?
            .seal(key, nonce, aad, plaintext)
    }

    /// AES-GCM authenticate and decrypt, returning the plaintext in
    /// zeroize-on-drop storage.
    ///
    /// # Errors
    ///
    /// As [`Vault::decrypt`].
    pub fn unseal(
        &mut self,
        key: &[u8],
        nonce: &[u8],
        aad: &[u8],
        ciphertext: &[u8],
        tag: &[u8],
    ) -> Result<SecretBuffer, VaultError> {
        check_aead_params(key, nonce)?;
        check_len("tag", tag.len(), TAG_LEN)?;
        self.registry
            .provider_mut(Capability::AuthenticatedEncrypt)?
            .unseal(key, nonce, aad, ciphertext, tag)
    }
}

impl Drop for Vault {
    fn drop(&mut self) {
        if self.initialized {
            if let Err(e) = self.free() {
                tracing::warn!(error = %e, "vault free on drop failed");
            }
        }
    }
}

fn check_len(what: &str, actual: usize, expected: usize) -> Result<(), VaultError> {
    if actual == expected {
        Ok(())
    } else {
        Err(VaultError::SizeMismatch(format!(
            "{what} is {actual} bytes (expected {expected})"
        )))
    }
}

fn check_aead_params(key: &[u8], nonce: &[u8]) -> Result<(), VaultError> {
    if !AEAD_KEY_LENS.contains(&key.len()) {
        return Err(VaultError::SizeMismatch(format!(
            "AES-GCM key is {} bytes (expected 16 or 32)",
            key.len()
        )));
    }
    check_len("nonce", nonce.len(), NONCE_LEN)
}
