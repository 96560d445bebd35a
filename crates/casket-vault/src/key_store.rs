//! Key slots: one static and one ephemeral key pair per backend.
//!
//! A [`KeyStore`] is owned by exactly one Backend Provider and is generic over
//! the private half `K` it records:
//!
//! - host software stores the private scalar itself (`SecretBytes<32>`,
//!   zeroized on drop)
//! - a secure element stores only the handle of the hardware slot holding it
//!
//! Either way the store never hands the private half to a caller; only the
//! owning backend reads it, through [`KeySlot::private`].
//!
//! Installing a new key for a role drops the previous one. A backend whose
//! generation failed after the private half may already have been replaced
//! clears the slot with [`KeyStore::invalidate`], so the public half on record
//! always belongs to the private half in the slot.

use casket_crypto_core::Curve;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::VaultError;
use crate::identity::BackendId;

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// Which key slot an operation targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyRole {
    /// Long-term identity key.
    Static,
    /// Per-handshake key.
    Ephemeral,
}

impl KeyRole {
    /// Both roles.
    pub const ALL: [Self; 2] = [Self::Static, Self::Ephemeral];

    /// Wire code of the role (`0` static, `1` ephemeral).
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Static => 0,
            Self::Ephemeral => 1,
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Static => 0,
            Self::Ephemeral => 1,
        }
    }
}

impl TryFrom<u8> for KeyRole {
    type Error = VaultError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Static),
            1 => Ok(Self::Ephemeral),
            other => Err(VaultError::InvalidParameter(format!(
                "unknown key role {other}"
            ))),
        }
    }
}

impl fmt::Display for KeyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Static => "static",
            Self::Ephemeral => "ephemeral",
        })
    }
}

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

/// One populated key slot.
pub struct KeySlot<K> {
    role: KeyRole,
    location: BackendId,
    public: Vec<u8>,
    private: K,
}

impl<K> KeySlot<K> {
    /// Role this slot serves.
    #[must_use]
    pub const fn role(&self) -> KeyRole {
        self.role
    }

    /// Backend that owns the private half.
    #[must_use]
    pub const fn location(&self) -> BackendId {
        self.location
    }

    /// Public half, exactly the curve's public key length.
    #[must_use]
    pub fn public_bytes(&self) -> &[u8] {
        &self.public
    }

    /// Private half (or its hardware handle). Only the owning backend calls this.
    #[must_use]
    pub const fn private(&self) -> &K {
        &self.private
    }
}

impl<K> fmt::Debug for KeySlot<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySlot")
            .field("role", &self.role)
            .field("location", &self.location)
            .field("public_len", &self.public.len())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// The static and ephemeral slots of one backend.
pub struct KeyStore<K> {
    owner: BackendId,
    curve: Curve,
    slots: [Option<KeySlot<K>>; 2],
}

impl<K> KeyStore<K> {
    /// Empty store for `owner`, holding keys on `curve`.
    #[must_use]
    pub const fn new(owner: BackendId, curve: Curve) -> Self {
        Self {
            owner,
            curve,
            slots: [None, None],
        }
    }

    /// Curve of every key in this store.
    #[must_use]
    pub const fn curve(&self) -> Curve {
        self.curve
    }

    /// Fixed public key length for this store's curve.
    #[must_use]
    pub const fn public_key_len(&self) -> usize {
        self.curve.public_key_len()
    }

    /// Record a freshly generated key pair for `role`, replacing the old one.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::KeyOperationFailure`] if the backend produced a
    /// public key of the wrong length. The slot for `role` is left empty: the
    /// previous public half no longer describes the backend's private half.
    pub fn install(
        &mut self,
        role: KeyRole,
        public: Vec<u8>,
        private: K,
    ) -> Result<&KeySlot<K>, VaultError> {
        if public.len() != self.public_key_len() {
            self.invalidate(role);
            return Err(VaultError::KeyOperationFailure(format!(
                "{} produced a {}-byte public key (expected {})",
                self.owner,
                public.len(),
                self.public_key_len()
            )));
        }

        let slot = self.slots[role.index()].insert(KeySlot {
            role,
            location: self.owner,
            public,
            private,
        });
        Ok(&*slot)
    }

    /// Empty the slot for `role`, dropping both halves.
    ///
    /// Later reads and agreements on `role` fail with
    /// [`VaultError::KeyOperationFailure`] until a key is installed again.
    pub fn invalidate(&mut self, role: KeyRole) {
        if self.slots[role.index()].take().is_some() {
            tracing::debug!(owner = %self.owner, %role, "key slot invalidated");
        }
    }

    /// The populated slot for `role`.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::KeyOperationFailure`] if no key was generated for
    /// `role` yet.
    pub fn slot(&self, role: KeyRole) -> Result<&KeySlot<K>, VaultError> {
        self.slots[role.index()]
            .as_ref()
            .ok_or_else(|| {
                VaultError::KeyOperationFailure(format!("no {role} key has been generated"))
            })
    }

    /// Returns `true` if `role` holds a key.
    #[must_use]
    pub const fn is_populated(&self, role: KeyRole) -> bool {
        self.slots[role.index()].is_some()
    }

    /// Copy the public half of `role` into `out`.
    ///
    /// The length check comes first, so a wrong-sized buffer is reported
    /// the same way whether or not the slot is populated.
    ///
    /// # Errors
    ///
    /// - [`VaultError::SizeMismatch`] if `out` is not exactly the public key length
    /// - [`VaultError::KeyOperationFailure`] if the slot is empty
    pub fn copy_public(&self, role: KeyRole, out: &mut [u8]) -> Result<(), VaultError> {
        if out.len() != self.public_key_len() {
            return Err(VaultError::SizeMismatch(format!(
                "public key buffer is {} bytes (expected {})",
                out.len(),
                self.public_key_len()
            )));
        }
        out.copy_from_slice(self.slot(role)?.public_bytes());
        Ok(())
    }
}

impl<K> fmt::Debug for KeyStore<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyStore")
            .field("owner", &self.owner)
            .field("curve", &self.curve)
            .field("static", &self.is_populated(KeyRole::Static))
            .field("ephemeral", &self.is_populated(KeyRole::Ephemeral))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
