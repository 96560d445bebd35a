//! The cryptographic capabilities a vault exposes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One category of operation routed through the vault.
///
/// Each capability is bound to exactly one backend by the
/// [`BindingTable`](crate::config::BindingTable).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    /// Backend session setup and teardown.
    Init,
    /// Random byte generation.
    Random,
    /// Key pair generation into a key slot.
    KeyGenerate,
    /// Reading the public half of a key slot.
    KeyReadPublic,
    /// ECDH between a key slot and a peer public key.
    KeyAgreement,
    /// SHA-256.
    Hash,
    /// HKDF-SHA256.
    Derive,
    /// AES-GCM encrypt/decrypt.
    AuthenticatedEncrypt,
}

impl Capability {
    /// Number of capabilities.
    pub const COUNT: usize = 8;

    /// Every capability, in routing-table order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Init,
        Self::Random,
        Self::KeyGenerate,
        Self::KeyReadPublic,
        Self::KeyAgreement,
        Self::Hash,
        Self::Derive,
        Self::AuthenticatedEncrypt,
    ];

    /// Capabilities that operate on key slots. They must share one backend,
    /// since that backend owns the slots.
    pub const KEY_SLOT: [Self; 3] = [Self::KeyGenerate, Self::KeyReadPublic, Self::KeyAgreement];

    /// Position in [`Capability::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Init => 0,
            Self::Random => 1,
            Self::KeyGenerate => 2,
            Self::KeyReadPublic => 3,
            Self::KeyAgreement => 4,
            Self::Hash => 5,
            Self::Derive => 6,
            Self::AuthenticatedEncrypt => 7,
        }
    }

    /// Returns `true` for capabilities only host software can provide.
    #[must_use]
    pub const fn is_host_only(self) -> bool {
        matches!(self, Self::Derive | Self::AuthenticatedEncrypt)
    }

    /// Stable identifier (matches the configuration file spelling).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Random => "random",
            Self::KeyGenerate => "keyGenerate",
            Self::KeyReadPublic => "keyReadPublic",
            Self::KeyAgreement => "keyAgreement",
            Self::Hash => "hash",
            Self::Derive => "derive",
            Self::AuthenticatedEncrypt => "authenticatedEncrypt",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
