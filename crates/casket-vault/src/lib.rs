//! `casket-vault`: capability dispatch and resource lifecycle for CASKET.
//!
//! One synchronous cryptographic API (random, key slots, ECDH, SHA-256, HKDF,
//! AES-GCM) over Backend Providers that may be secure elements or host
//! software, each capability bound to exactly one provider by a validated
//! configuration.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod backend;
pub mod capability;
pub mod config;
pub mod error;
pub mod identity;
pub mod registry;

pub mod key_store;

pub mod hash_session;
pub mod scratch;

pub mod peer_key;

pub mod providers;

pub mod vault;

pub use backend::{Backend, DEFAULT_MAX_RANDOM_SIZE};
pub use capability::Capability;
pub use config::{BindingTable, Interface, TransportConfig, VaultConfig};
pub use error::VaultError;
pub use hash_session::{HashSession, SessionState};
pub use identity::{BackendId, ExecutionClass, Vendor};
pub use key_store::{KeyRole, KeySlot, KeyStore};
pub use peer_key::PeerKeyRecord;
pub use providers::host::HostBackend;
pub use providers::secure_element::{DriverStatus, ElementDriver, SecureElementBackend, SlotHandle};
pub use registry::CapabilityRegistry;
pub use scratch::{with_scratch, HeapScratch, ScratchAllocator};
pub use vault::{Vault, VaultBuilder};

pub use casket_crypto_core::Curve;

// Bench doubles: an emulated secure element with fault injection and a
// counting scratch allocator. Off in builds without the `emulation` feature.
#[cfg(feature = "emulation")]
pub use providers::emulated::{EmulatedElement, EmulatorProbe, Fault};
#[cfg(feature = "emulation")]
pub use scratch::{ScratchStats, TrackingScratch};
