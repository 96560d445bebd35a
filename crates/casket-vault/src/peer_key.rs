//! Peer public key record: the envelope secure-element ECDH commands expect.
//!
//! Layout (byte offsets, no padding):
//!
//! ```text
//! 0     format tag          0x03 (bit string)
//! 1     remaining length    bytes after this field: 2 + key length
//! 2     unused bits         0x00
//! 3     point format        0x04 (uncompressed)
//! 4..   raw public key      64 bytes for P-256 (x || y)
//! ```
//!
//! A record is built from the caller's raw key on every agreement call and
//! dropped when the call returns.

use crate::error::VaultError;

/// Offset of the format tag.
pub const FORMAT_TAG_OFFSET: usize = 0;
/// Offset of the remaining-length byte.
pub const LENGTH_OFFSET: usize = 1;
/// Offset of the unused-bits byte.
pub const UNUSED_BITS_OFFSET: usize = 2;
/// Offset of the point format byte.
pub const POINT_FORMAT_OFFSET: usize = 3;
/// Offset of the raw key bytes.
pub const KEY_OFFSET: usize = 4;

/// DER bit string tag.
pub const BIT_STRING_TAG: u8 = 0x03;
/// Unused bits in the bit string (always zero for key material).
pub const NO_UNUSED_BITS: u8 = 0x00;
/// SEC1 uncompressed point marker.
pub const UNCOMPRESSED_POINT: u8 = 0x04;

/// Bytes counted by the length field besides the key itself.
const LENGTH_OVERHEAD: u8 = 2;

/// Longest key the one-byte length field can describe.
pub const MAX_KEY_LEN: usize = 253;

/// An encoded peer public key record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeerKeyRecord {
    bytes: Vec<u8>,
}

impl PeerKeyRecord {
    /// Wrap a raw public key.
    ///
    /// # Errors
    ///
    /// - [`VaultError::InvalidParameter`] if `public_key` is empty
    /// - [`VaultError::SizeMismatch`] if it is longer than [`MAX_KEY_LEN`]
    pub fn encode(public_key: &[u8]) -> Result<Self, VaultError> {
        if public_key.is_empty() {
            return Err(VaultError::InvalidParameter("empty peer public key".into()));
        }
        let key_len = u8::try_from(public_key.len())
            .ok()
            .filter(|len| usize::from(*len) <= MAX_KEY_LEN)
            .ok_or_else(|| {
                VaultError::SizeMismatch(format!(
                    "peer public key is {} bytes (at most {MAX_KEY_LEN})",
                    public_key.len()
                ))
            })?;

        let mut bytes = Vec::with_capacity(KEY_OFFSET.saturating_add(public_key.len()));
        bytes.push(BIT_STRING_TAG);
        bytes.push(key_len.saturating_add(LENGTH_OVERHEAD));
        bytes.push(NO_UNUSED_BITS);
        bytes.push(UNCOMPRESSED_POINT);
        bytes.extend_from_slice(public_key);
        Ok(Self { bytes })
    }

    /// Parse a record, checking every header field.
    ///
    /// # Errors
    ///
    /// - [`VaultError::SizeMismatch`] if `bytes` is shorter than the header or
    ///   the length field disagrees with the actual length
    /// - [`VaultError::InvalidParameter`] for a wrong tag, unused-bits value,
    ///   point format, or an empty key
    pub fn decode(bytes: &[u8]) -> Result<Self, VaultError> {
        let Some(key) = bytes.get(KEY_OFFSET..) else {
            return Err(VaultError::SizeMismatch(format!(
                "peer key record is {} bytes (header alone is {KEY_OFFSET})",
                bytes.len()
            )));
        };

        if bytes[FORMAT_TAG_OFFSET] != BIT_STRING_TAG {
            return Err(VaultError::InvalidParameter(format!(
                "peer key record tag {:#04x} (expected {BIT_STRING_TAG:#04x})",
                bytes[FORMAT_TAG_OFFSET]
            )));
        }
        let declared = usize::from(bytes[LENGTH_OFFSET]);
        let actual = bytes.len().saturating_sub(UNUSED_BITS_OFFSET);
        if declared != actual {
            return Err(VaultError::SizeMismatch(format!(
                "peer key record declares {declared} remaining bytes, has {actual}"
            )));
        }
        if bytes[UNUSED_BITS_OFFSET] != NO_UNUSED_BITS {
            return Err(VaultError::InvalidParameter(
                "peer key record has unused bits".into(),
            ));
        }
        if bytes[POINT_FORMAT_OFFSET] != UNCOMPRESSED_POINT {
            return Err(VaultError::InvalidParameter(format!(
                "peer key record point format {:#04x} (expected {UNCOMPRESSED_POINT:#04x})",
                bytes[POINT_FORMAT_OFFSET]
            )));
        }
        if key.is_empty() {
            return Err(VaultError::InvalidParameter("empty peer public key".into()));
        }

        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    /// Full encoded record.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The raw public key carried by the record.
    #[must_use]
    pub fn public_key(&self) -> &[u8] {
        self.bytes.get(KEY_OFFSET..).unwrap_or_default()
    }

    /// Encoded length (header plus key).
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always `false`: a record carries at least the header and one key byte.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
