//! SHA-256, one-shot and streaming.

use crate::error::CryptoError;
use ring::digest;

/// SHA-256 digest length in bytes.
pub const SHA256_DIGEST_LEN: usize = 32;

/// Hash `message` in one call.
#[must_use]
pub fn sha256(message: &[u8]) -> [u8; SHA256_DIGEST_LEN] {
    let mut out = [0u8; SHA256_DIGEST_LEN];
    out.copy_from_slice(digest::digest(&digest::SHA256, message).as_ref());
    out
}

/// Incremental SHA-256 computation.
///
/// Consumed by [`Sha256Stream::finish`], so a finished stream cannot be
/// updated again.
#[derive(Clone)]
pub struct Sha256Stream {
    context: digest::Context,
}

impl Sha256Stream {
    /// Start a new digest computation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            context: digest::Context::new(&digest::SHA256),
        }
    }

    /// Absorb `data`.
    pub fn update(&mut self, data: &[u8]) {
        self.context.update(data);
    }

    /// Finish the computation and write the digest into `out`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Hash`] if `out` is not exactly 32 bytes.
    pub fn finish(self, out: &mut [u8]) -> Result<(), CryptoError> {
        if out.len() != SHA256_DIGEST_LEN {
            return Err(CryptoError::Hash(format!(
                "digest buffer is {} bytes (expected {SHA256_DIGEST_LEN})",
                out.len()
            )));
        }
        out.copy_from_slice(self.context.finish().as_ref());
        Ok(())
    }
}

impl Default for Sha256Stream {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Sha256Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Sha256Stream")
    }
}
