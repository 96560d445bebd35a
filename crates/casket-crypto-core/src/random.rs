//! Operating-system CSPRNG access.

use crate::error::CryptoError;
use rand::rngs::OsRng;
use rand::RngCore;

/// Fill `out` with bytes from the OS CSPRNG.
///
/// An empty `out` is a no-op; bounds on request size belong to the caller.
///
/// # Errors
///
/// Returns [`CryptoError::Random`] if the OS entropy source fails.
pub fn fill_random(out: &mut [u8]) -> Result<(), CryptoError> {
    OsRng
        .try_fill_bytes(out)
        .map_err(|e| CryptoError::Random(format!("CSPRNG fill failed: {e}")))
}
