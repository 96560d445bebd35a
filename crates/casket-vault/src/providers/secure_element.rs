//! Secure-element Backend Provider.
//!
//! The vendor library is reached through [`ElementDriver`], a thin trait over
//! the element's command set. The provider owns the key store (which records
//! only public halves and slot handles), the session flag, and the translation
//! of driver status codes into [`VaultError`].
//!
//! Private keys never leave the element: generation returns only the public
//! half, and agreement sends the peer record in and gets the shared secret out.

use std::fmt;

use casket_crypto_core::{Curve, SHA256_DIGEST_LEN};

use crate::backend::{Backend, DEFAULT_MAX_RANDOM_SIZE};
use crate::config::TransportConfig;
use crate::error::VaultError;
use crate::identity::{BackendId, Vendor};
use crate::key_store::{KeyRole, KeyStore};
use crate::peer_key::PeerKeyRecord;

// ---------------------------------------------------------------------------
// Driver interface
// ---------------------------------------------------------------------------

/// Status code reported by an element driver on failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DriverStatus(pub u16);

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "driver status {:#06x}", self.0)
    }
}

/// Hardware key slot identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotHandle(pub u16);

impl SlotHandle {
    /// Element slot holding the key for `role` on a part from `vendor`.
    #[must_use]
    pub const fn for_role(vendor: Vendor, role: KeyRole) -> Self {
        match (vendor, role) {
            (Vendor::Infineon, KeyRole::Static) => Self(0xE0F0),
            (Vendor::Infineon, KeyRole::Ephemeral) => Self(0xE0F1),
            (_, KeyRole::Static) => Self(0x0000),
            (_, KeyRole::Ephemeral) => Self(0x0002),
        }
    }
}

impl fmt::Display for SlotHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// Command set of a secure element, as exposed by its vendor library.
///
/// Every call is synchronous and may block for a bus transaction.
pub trait ElementDriver: fmt::Debug {
    /// Open the application context over `transport`.
    ///
    /// # Errors
    ///
    /// A driver status code.
    fn open(&mut self, transport: &TransportConfig) -> Result<(), DriverStatus>;

    /// Close the application context.
    ///
    /// # Errors
    ///
    /// A driver status code.
    fn close(&mut self) -> Result<(), DriverStatus>;

    /// Fill `out` from the element's TRNG.
    ///
    /// # Errors
    ///
    /// A driver status code.
    fn random(&mut self, out: &mut [u8]) -> Result<(), DriverStatus>;

    /// Generate a P-256 key pair into `slot`, writing the raw public key to
    /// `public` and returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// A driver status code.
    fn generate_keypair(
        &mut self,
        slot: SlotHandle,
        public: &mut [u8],
    ) -> Result<usize, DriverStatus>;

    /// ECDH between `slot` and the encoded peer record, writing the shared
    /// secret to `secret`.
    ///
    /// # Errors
    ///
    /// A driver status code.
    fn ecdh(
        &mut self,
        slot: SlotHandle,
        peer_record: &[u8],
        secret: &mut [u8],
    ) -> Result<(), DriverStatus>;

    /// Begin a SHA-256 session held in `context`.
    ///
    /// # Errors
    ///
    /// A driver status code.
    fn hash_start(&mut self, context: &mut [u8]) -> Result<(), DriverStatus>;

    /// Feed `data` into the session held in `context`.
    ///
    /// # Errors
    ///
    /// A driver status code.
    fn hash_update(&mut self, context: &mut [u8], data: &[u8]) -> Result<(), DriverStatus>;

    /// Finish the session held in `context`.
    ///
    /// # Errors
    ///
    /// A driver status code.
    fn hash_finalize(&mut self, context: &mut [u8], digest: &mut [u8]) -> Result<(), DriverStatus>;
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// A secure element, driven through `D`.
#[derive(Debug)]
pub struct SecureElementBackend<D> {
    id: BackendId,
    driver: D,
    keys: KeyStore<SlotHandle>,
    session_open: bool,
}

impl<D: ElementDriver> SecureElementBackend<D> {
    /// Provider for the element `id`.
    ///
    /// # Errors
    ///
    /// [`VaultError::InvalidParameter`] if `id` is not a secure element.
    pub fn new(id: BackendId, driver: D) -> Result<Self, VaultError> {
        if !id.is_secure_element() {
            return Err(VaultError::InvalidParameter(format!(
                "{id} is not a secure element"
            )));
        }
        Ok(Self {
            id,
            driver,
            keys: KeyStore::new(id, Curve::P256),
            session_open: false,
        })
    }

    /// Returns `true` while the element session is open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.session_open
    }

    /// The underlying driver.
    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    fn ensure_open(&self, fail: fn(String) -> VaultError) -> Result<(), VaultError> {
        if self.session_open {
            Ok(())
        } else {
            Err(fail(format!("{} session is not open", self.id)))
        }
    }
}

impl<D: ElementDriver> Backend for SecureElementBackend<D> {
    fn id(&self) -> BackendId {
        self.id
    }

    fn curve(&self) -> Curve {
        Curve::P256
    }

    fn max_random_size(&self) -> usize {
        DEFAULT_MAX_RANDOM_SIZE
    }

    fn open(&mut self, transport: Option<&TransportConfig>) -> Result<(), VaultError> {
        let transport = transport.ok_or_else(|| {
            VaultError::InvalidParameter(format!("no transport configured for {}", self.id))
        })?;
        if transport.backend != self.id {
            return Err(VaultError::InvalidParameter(format!(
                "transport for {} given to {}",
                transport.backend, self.id
            )));
        }
        if !self.id.supported_interfaces().contains(&transport.interface) {
            return Err(VaultError::UnsupportedInterface {
                backend: self.id,
                interface: transport.interface,
            });
        }
        if self.session_open {
            return Ok(());
        }

        self.driver.open(transport).map_err(|status| {
            tracing::warn!(backend = %self.id, %status, "secure element open failed");
            VaultError::BackendInitFailure(format!("{}: {status}", self.id))
        })?;
        self.session_open = true;
        tracing::debug!(
            backend = %self.id,
            interface = %transport.interface,
            "secure element session opened"
        );
        Ok(())
    }

    fn close(&mut self) -> Result<(), VaultError> {
        if !self.session_open {
            return Ok(());
        }
        // The session is considered gone even if the driver reports failure.
        self.session_open = false;
        self.driver
            .close()
            .map_err(|status| {
                VaultError::ResourceReleaseFailure(format!("{}: {status}", self.id))
            })?;
        tracing::debug!(backend = %self.id, "secure element session closed");
        Ok(())
    }

    fn fill_random(&mut self, out: &mut [u8]) -> Result<(), VaultError> {
        self.ensure_open(VaultError::RandomGenerationFailure)?;
        self.driver
            .random(out)
            .map_err(|status| VaultError::RandomGenerationFailure(status.to_string()))
    }

    fn generate_key(&mut self, role: KeyRole) -> Result<(), VaultError> {
        self.ensure_open(VaultError::KeyOperationFailure)?;
        let slot = SlotHandle::for_role(self.id.vendor(), role);
        let mut public = vec![0u8; self.keys.public_key_len()];
        // The hardware slot may be overwritten even when the driver reports a
        // failure, so any error from here on leaves the role without a key.
        let written = match self.driver.generate_keypair(slot, &mut public) {
            Ok(written) => written,
            Err(status) => {
                self.keys.invalidate(role);
                return Err(VaultError::KeyOperationFailure(format!(
                    "generate {role} in slot {slot}: {status}"
                )));
            }
        };
        public.truncate(written);
        self.keys.install(role, public, slot)?;
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
        self.ensure_open(VaultError::KeyOperationFailure)?;
        let slot = *self.keys.slot(role)?.private();
        self.driver
            .ecdh(slot, peer.as_bytes(), out)
            .map_err(|status| {
                VaultError::KeyOperationFailure(format!("ecdh with {role} slot {slot}: {status}"))
            })
    }

    fn hash_context_len(&self, message_len: usize) -> usize {
        message_len
    }

    fn hash_start(&mut self, context: &mut [u8]) -> Result<(), VaultError> {
        self.ensure_open(VaultError::HashFailure)?;
        self.driver
            .hash_start(context)
            .map_err(|status| VaultError::HashFailure(format!("start: {status}")))
    }

    fn hash_update(&mut self, context: &mut [u8], data: &[u8]) -> Result<(), VaultError> {
        self.driver
            .hash_update(context, data)
            .map_err(|status| VaultError::HashFailure(format!("update: {status}")))
    }

    fn hash_finalize(&mut self, context: &mut [u8], digest: &mut [u8]) -> Result<(), VaultError> {
        if digest.len() != SHA256_DIGEST_LEN {
            return Err(VaultError::HashFailure(format!(
                "digest buffer is {} bytes (expected {SHA256_DIGEST_LEN})",
                digest.len()
            )));
        }
        self.driver
            .hash_finalize(context, digest)
            .map_err(|status| VaultError::HashFailure(format!("finalize: {status}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Interface;
    use crate::providers::emulated::{EmulatedElement, Fault};
    use crate::providers::host::HostBackend;

    fn optiga() -> SecureElementBackend<EmulatedElement> {
        SecureElementBackend::new(BackendId::OPTIGA_TRUST_X, EmulatedElement::new()).unwrap()
    }

    fn i2c() -> TransportConfig {
        TransportConfig::new(BackendId::OPTIGA_TRUST_X, Interface::I2c).with_address(0x30)
    }

    #[test]
    fn rejects_host_identity() {
        let result = SecureElementBackend::new(BackendId::HOST_SOFTWARE, EmulatedElement::new());
        assert!(matches!(result, Err(VaultError::InvalidParameter(_))));
    }

    #[test]
    fn optiga_slots_follow_vendor_layout() {
        assert_eq!(SlotHandle::for_role(Vendor::Infineon, KeyRole::Static), SlotHandle(0xE0F0));
        assert_eq!(SlotHandle::for_role(Vendor::Infineon, KeyRole::Ephemeral), SlotHandle(0xE0F1));
        assert_ne!(
            SlotHandle::for_role(Vendor::Microchip, KeyRole::Static),
            SlotHandle::for_role(Vendor::Microchip, KeyRole::Ephemeral)
        );
    }

    #[test]
    fn open_requires_transport() {
        let mut element = optiga();
        assert!(matches!(element.open(None), Err(VaultError::InvalidParameter(_))));
        assert!(!element.is_open());
    }

    #[test]
    fn open_rejects_unsupported_interface_without_touching_driver() {
        let mut element = optiga();
        let spi = TransportConfig::new(BackendId::OPTIGA_TRUST_X, Interface::Spi);
        assert_eq!(
            element.open(Some(&spi)),
            Err(VaultError::UnsupportedInterface {
                backend: BackendId::OPTIGA_TRUST_X,
                interface: Interface::Spi,
            })
        );
        assert_eq!(element.driver().probe().calls(), 0);
    }

    #[test]
    fn driver_open_failure_is_backend_init_failure() {
        let mut element = optiga();
        element.driver().probe().inject(Fault::Open);
        assert!(matches!(
            element.open(Some(&i2c())),
            Err(VaultError::BackendInitFailure(_))
        ));
        assert!(!element.is_open());
    }

    #[test]
    fn operations_need_an_open_session() {
        let mut element = optiga();
        assert!(matches!(
            element.fill_random(&mut [0u8; 8]),
            Err(VaultError::RandomGenerationFailure(_))
        ));
        assert!(matches!(
            element.generate_key(KeyRole::Static),
            Err(VaultError::KeyOperationFailure(_))
        ));
        assert!(matches!(element.hash_start(&mut []), Err(VaultError::HashFailure(_))));
    }

    #[test]
    fn close_is_idempotent() {
        let mut element = optiga();
        element.open(Some(&i2c())).unwrap();
        element.close().unwrap();
        element.close().unwrap();
        assert!(!element.is_open());
    }

    #[test]
    fn close_failure_is_release_failure_and_still_closes() {
        let mut element = optiga();
        element.open(Some(&i2c())).unwrap();
        element.driver().probe().inject(Fault::Close);
        assert!(matches!(
            element.close(),
            Err(VaultError::ResourceReleaseFailure(_))
        ));
        assert!(!element.is_open());
        assert!(element.close().is_ok());
    }

    #[test]
    fn generated_key_is_readable_and_agreement_uses_slot() {
        let mut element = optiga();
        element.open(Some(&i2c())).unwrap();
        element.generate_key(KeyRole::Ephemeral).unwrap();

        let mut public = [0u8; 64];
        element.read_public(KeyRole::Ephemeral, &mut public).unwrap();
        assert!(public.iter().any(|&b| b != 0));

        let mut peer = HostBackend::new(Curve::P256);
        peer.generate_key(KeyRole::Static).unwrap();
        let mut peer_public = [0u8; 64];
        peer.read_public(KeyRole::Static, &mut peer_public).unwrap();

        let mut ours = [0u8; 32];
        let mut theirs = [0u8; 32];
        element
            .agree(KeyRole::Ephemeral, &PeerKeyRecord::encode(&peer_public).unwrap(), &mut ours)
            .unwrap();
        peer.agree(KeyRole::Static, &PeerKeyRecord::encode(&public).unwrap(), &mut theirs)
            .unwrap();
        assert_eq!(ours, theirs);
    }

    #[test]
    fn driver_key_failure_is_key_operation_failure_and_empties_slot() {
        let mut element = optiga();
        element.open(Some(&i2c())).unwrap();
        element.generate_key(KeyRole::Static).unwrap();
        element.generate_key(KeyRole::Ephemeral).unwrap();

        element.driver().probe().inject(Fault::GenerateKey);
        assert!(matches!(
            element.generate_key(KeyRole::Static),
            Err(VaultError::KeyOperationFailure(_))
        ));
        element.driver().probe().clear_all();

        assert!(matches!(
            element.read_public(KeyRole::Static, &mut [0u8; 64]),
            Err(VaultError::KeyOperationFailure(_))
        ));
        assert!(element.read_public(KeyRole::Ephemeral, &mut [0u8; 64]).is_ok());
    }
}
