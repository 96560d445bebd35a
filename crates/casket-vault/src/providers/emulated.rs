//! Software stand-in for a secure element, for bench testing without hardware.
//!
//! [`EmulatedElement`] implements [`ElementDriver`] with host primitives and
//! behaves like a part with two P-256 key slots and a context-buffer hash
//! engine: the hash context holds the message bytes fed so far, so it must be
//! as long as the message. Private scalars stay inside the emulator.
//!
//! An [`EmulatorProbe`] shared with the emulator counts driver calls and injects
//! failures into chosen commands.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
use std::sync::Arc;

use casket_crypto_core::{
    agree, fill_random, generate_keypair, sha256, Curve, SecretBytes, PRIVATE_KEY_LEN,
};

use crate::config::TransportConfig;
use crate::peer_key::PeerKeyRecord;
use crate::providers::secure_element::{DriverStatus, ElementDriver, SlotHandle};

/// Status for an injected fault.
pub const STATUS_INJECTED: DriverStatus = DriverStatus(0x8001);
/// Status for a command issued before `open`.
pub const STATUS_NOT_OPEN: DriverStatus = DriverStatus(0x8002);
/// Status for an output buffer of the wrong size.
pub const STATUS_BAD_LENGTH: DriverStatus = DriverStatus(0x8003);
/// Status for an empty key slot.
pub const STATUS_EMPTY_SLOT: DriverStatus = DriverStatus(0x8004);
/// Status for a malformed peer record or invalid point.
pub const STATUS_BAD_PEER: DriverStatus = DriverStatus(0x8005);
/// Status for hash data that does not fit the context buffer.
pub const STATUS_CONTEXT_OVERFLOW: DriverStatus = DriverStatus(0x8006);
/// Status for a hash command without a started session.
pub const STATUS_NO_SESSION: DriverStatus = DriverStatus(0x8007);
/// Status for an internal primitive failure.
pub const STATUS_INTERNAL: DriverStatus = DriverStatus(0x80FF);

/// A driver command that can be made to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    /// `open`.
    Open,
    /// `close`.
    Close,
    /// `random`.
    Random,
    /// `generate_keypair`.
    GenerateKey,
    /// `ecdh`.
    Agreement,
    /// `hash_start`.
    HashStart,
    /// `hash_update`.
    HashUpdate,
    /// `hash_finalize`.
    HashFinalize,
}

impl Fault {
    const fn bit(self) -> u16 {
        match self {
            Self::Open => 0x01,
            Self::Close => 0x02,
            Self::Random => 0x04,
            Self::GenerateKey => 0x08,
            Self::Agreement => 0x10,
            Self::HashStart => 0x20,
            Self::HashUpdate => 0x40,
            Self::HashFinalize => 0x80,
        }
    }
}

/// Call counter and fault switchboard shared with an [`EmulatedElement`].
#[derive(Debug, Default)]
pub struct EmulatorProbe {
    calls: AtomicUsize,
    faults: AtomicU16,
}

impl EmulatorProbe {
    /// Driver commands issued so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make `fault`'s command fail until cleared.
    pub fn inject(&self, fault: Fault) {
        self.faults.fetch_or(fault.bit(), Ordering::SeqCst);
    }

    /// Let `fault`'s command succeed again.
    pub fn clear(&self, fault: Fault) {
        self.faults.fetch_and(!fault.bit(), Ordering::SeqCst);
    }

    /// Clear every injected fault.
    pub fn clear_all(&self) {
        self.faults.store(0, Ordering::SeqCst);
    }

    fn enter(&self, command: Fault) -> Result<(), DriverStatus> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.faults.load(Ordering::SeqCst) & command.bit() == 0 {
            Ok(())
        } else {
            Err(STATUS_INJECTED)
        }
    }
}

/// Emulated two-slot P-256 element.
#[derive(Debug, Default)]
pub struct EmulatedElement {
    probe: Arc<EmulatorProbe>,
    open: bool,
    slots: BTreeMap<SlotHandle, SecretBytes<PRIVATE_KEY_LEN>>,
    hash_fed: Option<usize>,
}

impl EmulatedElement {
    /// Closed element with empty slots.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the call counter and fault switchboard.
    #[must_use]
    pub fn probe(&self) -> Arc<EmulatorProbe> {
        Arc::clone(&self.probe)
    }

    fn command(&self, command: Fault) -> Result<(), DriverStatus> {
        self.probe.enter(command)?;
        if self.open {
            Ok(())
        } else {
            Err(STATUS_NOT_OPEN)
        }
    }
}

impl ElementDriver for EmulatedElement {
    fn open(&mut self, _transport: &TransportConfig) -> Result<(), DriverStatus> {
        self.probe.enter(Fault::Open)?;
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), DriverStatus> {
        self.probe.enter(Fault::Close)?;
        self.open = false;
        self.hash_fed = None;
        Ok(())
    }

    fn random(&mut self, out: &mut [u8]) -> Result<(), DriverStatus> {
        self.command(Fault::Random)?;
        fill_random(out).map_err(|_| STATUS_INTERNAL)
    }

    fn generate_keypair(
        &mut self,
        slot: SlotHandle,
        public: &mut [u8],
    ) -> Result<usize, DriverStatus> {
        self.command(Fault::GenerateKey)?;
        let pair = generate_keypair(Curve::P256).map_err(|_| STATUS_INTERNAL)?;
        let out = public.get_mut(..pair.public.len()).ok_or(STATUS_BAD_LENGTH)?;
        out.copy_from_slice(&pair.public);
        self.slots.insert(slot, pair.private);
        Ok(pair.public.len())
    }

    fn ecdh(
        &mut self,
        slot: SlotHandle,
        peer_record: &[u8],
        secret: &mut [u8],
    ) -> Result<(), DriverStatus> {
        self.command(Fault::Agreement)?;
        let record = PeerKeyRecord::decode(peer_record).map_err(|_| STATUS_BAD_PEER)?;
        let private = self.slots.get(&slot).ok_or(STATUS_EMPTY_SLOT)?;
        let shared = agree(Curve::P256, private, record.public_key()).map_err(|_| STATUS_BAD_PEER)?;
        if secret.len() != shared.expose().len() {
            return Err(STATUS_BAD_LENGTH);
        }
        secret.copy_from_slice(shared.expose());
        Ok(())
    }

    fn hash_start(&mut self, context: &mut [u8]) -> Result<(), DriverStatus> {
        self.command(Fault::HashStart)?;
        context.fill(0);
        self.hash_fed = Some(0);
        Ok(())
    }

    fn hash_update(&mut self, context: &mut [u8], data: &[u8]) -> Result<(), DriverStatus> {
        self.command(Fault::HashUpdate)?;
        let fed = self.hash_fed.ok_or(STATUS_NO_SESSION)?;
        let end = fed.checked_add(data.len()).ok_or(STATUS_CONTEXT_OVERFLOW)?;
        let window = context.get_mut(fed..end).ok_or(STATUS_CONTEXT_OVERFLOW)?;
        window.copy_from_slice(data);
        self.hash_fed = Some(end);
        Ok(())
    }

    fn hash_finalize(&mut self, context: &mut [u8], digest: &mut [u8]) -> Result<(), DriverStatus> {
        self.command(Fault::HashFinalize)?;
        let fed = self.hash_fed.take().ok_or(STATUS_NO_SESSION)?;
        let message = context.get(..fed).ok_or(STATUS_CONTEXT_OVERFLOW)?;
        let hash = sha256(message);
        if digest.len() != hash.len() {
            return Err(STATUS_BAD_LENGTH);
        }
        digest.copy_from_slice(&hash);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Interface;
    use crate::identity::BackendId;

    fn opened() -> EmulatedElement {
        let mut element = EmulatedElement::new();
        element
            .open(&TransportConfig::new(BackendId::ATECC608A, Interface::Swi))
            .unwrap();
        element
    }

    #[test]
    fn commands_before_open_fail() {
        let mut element = EmulatedElement::new();
        assert_eq!(element.random(&mut [0u8; 4]), Err(STATUS_NOT_OPEN));
        assert_eq!(element.probe().calls(), 1);
    }

    #[test]
    fn injected_fault_fails_only_its_command() {
        let mut element = opened();
        let probe = element.probe();
        probe.inject(Fault::Random);

        assert_eq!(element.random(&mut [0u8; 4]), Err(STATUS_INJECTED));
        assert!(element.hash_start(&mut [0u8; 4]).is_ok());

        probe.clear(Fault::Random);
        assert!(element.random(&mut [0u8; 4]).is_ok());
    }

    #[test]
    fn hash_context_must_hold_the_message() {
        let mut element = opened();
        let mut context = [0u8; 3];
        element.hash_start(&mut context).unwrap();
        assert_eq!(
            element.hash_update(&mut context, b"abcd"),
            Err(STATUS_CONTEXT_OVERFLOW)
        );
    }

    #[test]
    fn hash_matches_sha256() {
        let mut element = opened();
        let mut context = [0u8; 3];
        let mut digest = [0u8; 32];
        element.hash_start(&mut context).unwrap();
        element.hash_update(&mut context, b"abc").unwrap();
        element.hash_finalize(&mut context, &mut digest).unwrap();
        assert_eq!(digest, sha256(b"abc"));
    }

    #[test]
    fn ecdh_on_empty_slot_fails() {
        let mut element = opened();
        let record = PeerKeyRecord::encode(&[1u8; 64]).unwrap();
        assert_eq!(
            element.ecdh(SlotHandle(0), record.as_bytes(), &mut [0u8; 32]),
            Err(STATUS_EMPTY_SLOT)
        );
    }

    #[test]
    fn ecdh_rejects_raw_key_without_envelope() {
        let mut element = opened();
        let mut public = [0u8; 64];
        element.generate_keypair(SlotHandle(0), &mut public).unwrap();
        assert_eq!(
            element.ecdh(SlotHandle(0), &public, &mut [0u8; 32]),
            Err(STATUS_BAD_PEER)
        );
    }
}
