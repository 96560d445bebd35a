//! Vault configuration: curve, capability bindings, and transports.
//!
//! Read once at startup (from JSON or built in code) and validated before a
//! [`Vault`](crate::Vault) is constructed, so that an impossible
//! capability/backend combination is a configuration error rather than a
//! call-time surprise.
//!
//! ```json
//! {
//!   "curve": "p256",
//!   "bindings": {
//!     "init": "optiga-trust-x",
//!     "random": "optiga-trust-x",
//!     "keyGenerate": "optiga-trust-x",
//!     "keyReadPublic": "optiga-trust-x",
//!     "keyAgreement": "optiga-trust-x",
//!     "hash": "optiga-trust-x",
//!     "derive": "host-software",
//!     "authenticatedEncrypt": "host-software"
//!   },
//!   "transports": [
//!     { "backend": "optiga-trust-x", "interface": "i2c", "address": 48 }
//!   ]
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::Path;

use casket_crypto_core::Curve;
use serde::{Deserialize, Serialize};

use crate::capability::Capability;
use crate::error::VaultError;
use crate::identity::BackendId;

// ── Transports ─────────────────────────────────────────────────────

/// Bus used to reach a secure element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interface {
    /// I²C.
    I2c,
    /// SPI.
    Spi,
    /// Single-wire interface.
    Swi,
    /// UART.
    Uart,
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::I2c => "i2c",
            Self::Spi => "spi",
            Self::Swi => "swi",
            Self::Uart => "uart",
        })
    }
}

/// Out-of-band setup for one backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportConfig {
    /// Backend this transport belongs to.
    pub backend: BackendId,
    /// Bus type.
    pub interface: Interface,
    /// Bus address, when the bus is addressed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<u16>,
    /// Driver-specific configuration blob, passed through untouched.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<u8>,
}

impl TransportConfig {
    /// Transport with no address and no options.
    #[must_use]
    pub const fn new(backend: BackendId, interface: Interface) -> Self {
        Self {
            backend,
            interface,
            address: None,
            options: Vec::new(),
        }
    }

    /// Set the bus address.
    #[must_use]
    pub fn with_address(mut self, address: u16) -> Self {
        self.address = Some(address);
        self
    }
}

// ── Binding table ──────────────────────────────────────────────────

/// Capability → backend binding, one backend per capability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BindingTable {
    bindings: BTreeMap<Capability, BackendId>,
}

impl BindingTable {
    /// Empty table (fails validation until every capability is bound).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every capability bound to `backend`.
    #[must_use]
    pub fn uniform(backend: BackendId) -> Self {
        Capability::ALL
            .into_iter()
            .fold(Self::new(), |table, capability| table.bind(capability, backend))
    }

    /// Bind `capability` to `backend`, replacing any earlier binding.
    #[must_use]
    pub fn bind(mut self, capability: Capability, backend: BackendId) -> Self {
        self.bindings.insert(capability, backend);
        self
    }

    /// Backend bound to `capability`, if any.
    #[must_use]
    pub fn get(&self, capability: Capability) -> Option<BackendId> {
        self.bindings.get(&capability).copied()
    }

    /// Distinct backends referenced by the table.
    #[must_use]
    pub fn backends(&self) -> BTreeSet<BackendId> {
        self.bindings.values().copied().collect()
    }

    /// Check the table against what each identity can provide.
    ///
    /// Rules, in order:
    /// 1. every capability is bound, to a backend able to provide it
    /// 2. key-slot capabilities share one backend, which offers `curve`
    /// 3. at most one secure element is referenced, and if one is, `Init`
    ///    is bound to it (its session must be opened before use)
    ///
    /// # Errors
    ///
    /// - [`VaultError::UnboundCapability`] for a missing binding
    /// - [`VaultError::UnsupportedCapability`] for e.g. HKDF on a secure element
    /// - [`VaultError::UnsupportedCurve`] for Curve25519 on a secure element
    /// - [`VaultError::Config`] for the structural rules 2 and 3
    pub fn validate(&self, curve: Curve) -> Result<(), VaultError> {
        for capability in Capability::ALL {
            let backend = self
                .get(capability)
                .ok_or(VaultError::UnboundCapability(capability))?;
            if !backend.supports(capability) {
                return Err(VaultError::UnsupportedCapability {
                    capability,
                    backend,
                });
            }
        }

        let key_backends: BTreeSet<BackendId> = Capability::KEY_SLOT
            .into_iter()
            .filter_map(|capability| self.get(capability))
            .collect();
        if key_backends.len() != 1 {
            return Err(VaultError::Config(
                "keyGenerate, keyReadPublic and keyAgreement must be bound to the same backend"
                    .into(),
            ));
        }
        if let Some(&backend) = key_backends.first() {
            if !backend.supports_curve(curve) {
                return Err(VaultError::UnsupportedCurve { curve, backend });
            }
        }

        let elements: Vec<BackendId> = self
            .backends()
            .into_iter()
            .filter(|id| id.is_secure_element())
            .collect();
        match elements.as_slice() {
            [] => Ok(()),
            [element] if self.get(Capability::Init) == Some(*element) => Ok(()),
            [element] => Err(VaultError::Config(format!(
                "{element} is referenced but init is not bound to it"
            ))),
            _ => Err(VaultError::Config(
                "at most one secure element may be bound".into(),
            )),
        }
    }
}

// ── Top-level configuration ────────────────────────────────────────

/// Complete vault configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultConfig {
    /// Curve for static and ephemeral key slots.
    #[serde(default)]
    pub curve: Curve,

    /// Capability → backend binding table.
    pub bindings: BindingTable,

    /// Transport setup for backends that need it.
    #[serde(default)]
    pub transports: Vec<TransportConfig>,
}

impl VaultConfig {
    /// Configuration binding every capability to host software.
    #[must_use]
    pub fn host_only(curve: Curve) -> Self {
        Self {
            curve,
            bindings: BindingTable::uniform(BackendId::HOST_SOFTWARE),
            transports: Vec::new(),
        }
    }

    /// Parse a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Config`] if the document is not valid JSON or
    /// names unknown capabilities, backends, curves, or interfaces.
    pub fn from_json(json: &str) -> Result<Self, VaultError> {
        serde_json::from_str(json).map_err(|e| VaultError::Config(e.to_string()))
    }

    /// Read and parse a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Config`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, VaultError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| VaultError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&contents)
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Config`] if serialization fails.
    pub fn to_json(&self) -> Result<String, VaultError> {
        serde_json::to_string_pretty(self).map_err(|e| VaultError::Config(e.to_string()))
    }

    /// Validate bindings and transports.
    ///
    /// # Errors
    ///
    /// Everything [`BindingTable::validate`] returns, plus
    /// [`VaultError::Config`] for duplicate transports or transports naming a
    /// backend the table never references.
    pub fn validate(&self) -> Result<(), VaultError> {
        self.bindings.validate(self.curve)?;

        let referenced = self.bindings.backends();
        let mut seen = BTreeSet::new();
        for transport in &self.transports {
            if !referenced.contains(&transport.backend) {
                return Err(VaultError::Config(format!(
                    "transport given for unbound backend {}",
                    transport.backend
                )));
            }
            if !seen.insert(transport.backend) {
                return Err(VaultError::Config(format!(
                    "duplicate transport for {}",
                    transport.backend
                )));
            }
        }
        Ok(())
    }

    /// Transport configured for `backend`, if any.
    #[must_use]
    pub fn transport_for(&self, backend: BackendId) -> Option<&TransportConfig> {
        self.transports.iter().find(|t| t.backend == backend)
    }
}

// ── Tests ──────────────────────────────────────────────────────────
