//! HKDF-SHA256 (RFC 5869) extract-and-expand.

use crate::error::CryptoError;
use ring::hkdf;

/// Largest output HKDF-SHA256 can produce (255 blocks of 32 bytes).
pub const MAX_HKDF_OUTPUT_LEN: usize = 8160;

/// Output length marker for `ring::hkdf::Prk::expand`.
struct OkmLen(usize);

impl hkdf::KeyType for OkmLen {
    fn len(&self) -> usize {
        self.0
    }
}

/// Derive `out.len()` bytes of keying material from `ikm`.
///
/// An empty `salt` is treated as the RFC 5869 default (a zero-filled block);
/// `info` may be empty.
///
/// # Errors
///
/// Returns [`CryptoError::KeyDerivation`] if `out` is empty or longer than
/// [`MAX_HKDF_OUTPUT_LEN`].
pub fn hkdf_sha256(
    salt: &[u8],
    ikm: &[u8],
    info: &[u8],
    out: &mut [u8],
) -> Result<(), CryptoError> {
    if out.is_empty() || out.len() > MAX_HKDF_OUTPUT_LEN {
        return Err(CryptoError::KeyDerivation(format!(
            "output length {} outside 1..={MAX_HKDF_OUTPUT_LEN}",
            out.len()
        )));
    }

    let prk = hkdf::Salt::new(hkdf::HKDF_SHA256, salt).extract(ikm);
    let info_parts = [info];
    let okm = prk
        .expand(&info_parts, OkmLen(out.len()))
        .map_err(|_| CryptoError::KeyDerivation("HKDF expand failed".into()))?;
    okm.fill(out)
        .map_err(|_| CryptoError::KeyDerivation("HKDF fill failed".into()))
}
