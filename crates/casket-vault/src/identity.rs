//! Backend identities: execution class, vendor, and part.
//!
//! An identity is a packed code:
//!
//! ```text
//! 0xF000  execution class   0x1000 secure element, 0x2000 host software
//! 0x0F00  vendor            0x0100 Microchip, 0x0200 Infineon
//! 0x00FF  part / library variant
//! ```
//!
//! Only the identities listed in [`BackendId::KNOWN`] can be constructed, so
//! the capability and transport tables below are exhaustive.

use casket_crypto_core::Curve;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::capability::Capability;
use crate::config::Interface;
use crate::error::VaultError;

const CLASS_MASK: u32 = 0x0000_F000;
const VENDOR_MASK: u32 = 0x0000_0F00;
const PART_MASK: u32 = 0x0000_00FF;

const CLASS_SECURE_ELEMENT: u32 = 0x0000_1000;
const CLASS_HOST: u32 = 0x0000_2000;

const VENDOR_MICROCHIP: u32 = 0x0000_0100;
const VENDOR_INFINEON: u32 = 0x0000_0200;

/// Where a backend executes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExecutionClass {
    /// A hardware part that owns its private keys.
    SecureElement,
    /// A software library on the host CPU.
    Host,
}

/// Manufacturer of a secure element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Vendor {
    /// Microchip (ATECC family).
    Microchip,
    /// Infineon (OPTIGA family).
    Infineon,
    /// No vendor (host software).
    Unspecified,
}

/// Identity of a Backend Provider, used for capability dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BackendId(u32);

impl BackendId {
    /// Microchip ATECC508A.
    pub const ATECC508A: Self = Self(CLASS_SECURE_ELEMENT | VENDOR_MICROCHIP | 0x01);
    /// Microchip ATECC608A.
    pub const ATECC608A: Self = Self(CLASS_SECURE_ELEMENT | VENDOR_MICROCHIP | 0x02);
    /// Infineon OPTIGA Trust X.
    pub const OPTIGA_TRUST_X: Self = Self(CLASS_SECURE_ELEMENT | VENDOR_INFINEON | 0x01);
    /// Host software cryptographic library.
    pub const HOST_SOFTWARE: Self = Self(CLASS_HOST | 0x01);

    /// Every identity this crate can dispatch to.
    pub const KNOWN: [Self; 4] = [
        Self::ATECC508A,
        Self::ATECC608A,
        Self::OPTIGA_TRUST_X,
        Self::HOST_SOFTWARE,
    ];

    /// Look up a known identity by its packed code.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidParameter`] for unknown codes.
    pub fn from_code(code: u32) -> Result<Self, VaultError> {
        Self::KNOWN
            .into_iter()
            .find(|id| id.0 == code)
            .ok_or_else(|| VaultError::InvalidParameter(format!("unknown backend code {code:#x}")))
    }

    /// Look up a known identity by name (`"optiga-trust-x"`, ...).
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidParameter`] for unknown names.
    pub fn from_name(name: &str) -> Result<Self, VaultError> {
        Self::KNOWN
            .into_iter()
            .find(|id| id.name() == name)
            .ok_or_else(|| VaultError::InvalidParameter(format!("unknown backend \"{name}\"")))
    }

    /// Packed code.
    #[must_use]
    pub const fn code(self) -> u32 {
        self.0
    }

    /// Execution class encoded in the identity.
    #[must_use]
    pub const fn class(self) -> ExecutionClass {
        if self.0 & CLASS_MASK == CLASS_SECURE_ELEMENT {
            ExecutionClass::SecureElement
        } else {
            ExecutionClass::Host
        }
    }

    /// Vendor encoded in the identity.
    #[must_use]
    pub const fn vendor(self) -> Vendor {
        match self.0 & VENDOR_MASK {
            VENDOR_MICROCHIP => Vendor::Microchip,
            VENDOR_INFINEON => Vendor::Infineon,
            _ => Vendor::Unspecified,
        }
    }

    /// Part or library variant number.
    #[must_use]
    pub const fn part(self) -> u32 {
        self.0 & PART_MASK
    }

    /// Returns `true` for hardware secure elements.
    #[must_use]
    pub const fn is_secure_element(self) -> bool {
        matches!(self.class(), ExecutionClass::SecureElement)
    }

    /// Stable name used in configuration files and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self.0 {
            x if x == Self::ATECC508A.0 => "atecc508a",
            x if x == Self::ATECC608A.0 => "atecc608a",
            x if x == Self::OPTIGA_TRUST_X.0 => "optiga-trust-x",
            _ => "host-software",
        }
    }

    /// Whether this identity can ever provide `capability`.
    ///
    /// Secure elements have no host-side HKDF or AES-GCM primitive.
    #[must_use]
    pub const fn supports(self, capability: Capability) -> bool {
        !(self.is_secure_element() && capability.is_host_only())
    }

    /// Whether this identity can generate and agree keys on `curve`.
    #[must_use]
    pub const fn supports_curve(self, curve: Curve) -> bool {
        !self.is_secure_element() || matches!(curve, Curve::P256)
    }

    /// Transports a secure element can be reached over. Host software has none.
    #[must_use]
    pub const fn supported_interfaces(self) -> &'static [Interface] {
        match self.vendor() {
            Vendor::Infineon => &[Interface::I2c],
            Vendor::Microchip => &[Interface::I2c, Interface::Swi],
            Vendor::Unspecified => &[],
        }
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:#06x})", self.name(), self.0)
    }
}

impl Serialize for BackendId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Configuration files may name a backend or give its packed code.
#[derive(Deserialize)]
#[serde(untagged)]
enum BackendIdRepr {
    Code(u32),
    Name(String),
}

impl<'de> Deserialize<'de> for BackendId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let parsed = match BackendIdRepr::deserialize(deserializer)? {
            BackendIdRepr::Code(code) => Self::from_code(code),
            BackendIdRepr::Name(name) => Self::from_name(&name),
        };
        parsed.map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_decode_class_vendor_and_part() {
        assert_eq!(BackendId::ATECC608A.code(), 0x1102);
        assert_eq!(BackendId::ATECC608A.class(), ExecutionClass::SecureElement);
        assert_eq!(BackendId::ATECC608A.vendor(), Vendor::Microchip);
        assert_eq!(BackendId::ATECC608A.part(), 2);

        assert_eq!(BackendId::OPTIGA_TRUST_X.vendor(), Vendor::Infineon);
        assert_eq!(BackendId::HOST_SOFTWARE.class(), ExecutionClass::Host);
        assert_eq!(BackendId::HOST_SOFTWARE.vendor(), Vendor::Unspecified);
    }

    #[test]
    fn from_code_rejects_unknown_identity() {
        assert!(matches!(
            BackendId::from_code(0x1303),
            Err(VaultError::InvalidParameter(_))
        ));
        assert_eq!(BackendId::from_code(0x2001).unwrap(), BackendId::HOST_SOFTWARE);
    }

    #[test]
    fn names_roundtrip() {
        for id in BackendId::KNOWN {
            assert_eq!(BackendId::from_name(id.name()).unwrap(), id);
        }
    }

    #[test]
    fn secure_elements_lack_host_only_capabilities() {
        for id in [BackendId::ATECC508A, BackendId::ATECC608A, BackendId::OPTIGA_TRUST_X] {
            assert!(!id.supports(Capability::Derive));
            assert!(!id.supports(Capability::AuthenticatedEncrypt));
            assert!(id.supports(Capability::Hash));
            assert!(!id.supports_curve(Curve::Curve25519));
        }
        for capability in Capability::ALL {
            assert!(BackendId::HOST_SOFTWARE.supports(capability));
        }
    }

    #[test]
    fn optiga_only_speaks_i2c() {
        assert_eq!(
            BackendId::OPTIGA_TRUST_X.supported_interfaces(),
            &[Interface::I2c]
        );
        assert!(BackendId::HOST_SOFTWARE.supported_interfaces().is_empty());
    }

    #[test]
    fn deserializes_from_name_or_code() {
        let by_name: BackendId = serde_json::from_str("\"optiga-trust-x\"").unwrap();
        let by_code: BackendId = serde_json::from_str("4609").unwrap();
        assert_eq!(by_name, BackendId::OPTIGA_TRUST_X);
        assert_eq!(by_code, BackendId::OPTIGA_TRUST_X);
        assert!(serde_json::from_str::<BackendId>("\"tpm-9000\"").is_err());
    }

    #[test]
    fn serializes_as_name() {
        let json = serde_json::to_string(&BackendId::ATECC508A).unwrap();
        assert_eq!(json, "\"atecc508a\"");
    }

    #[test]
    fn display_shows_name_and_four_digit_code() {
        assert_eq!(BackendId::OPTIGA_TRUST_X.to_string(), "optiga-trust-x (0x1201)");
        assert_eq!(BackendId::ATECC608A.to_string(), "atecc608a (0x1102)");
        assert_eq!(BackendId::HOST_SOFTWARE.to_string(), "host-software (0x2001)");
    }
}
