//! Hash sessions: start, update, finalize against a backend.
//!
//! A session is bound to one message whose total length is declared at start.
//! Its opaque context lives in a working buffer supplied by the caller, sized
//! by [`Backend::hash_context_len`]. [`digest`] runs the whole protocol with
//! the buffer acquired and released through [`with_scratch`].

use casket_crypto_core::SHA256_DIGEST_LEN;

use crate::backend::Backend;
use crate::error::VaultError;
use crate::scratch::{with_scratch, ScratchAllocator};

/// Where a session is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Started; accepts updates until the declared length is reached.
    Open,
    /// Finalized; the digest has been written.
    Finalized,
}

/// One in-flight digest computation.
pub struct HashSession<'a> {
    backend: &'a mut dyn Backend,
    context: &'a mut [u8],
    message_len: usize,
    fed: usize,
    state: SessionState,
}

impl<'a> HashSession<'a> {
    /// Start a session for a message of exactly `message_len` bytes.
    ///
    /// # Errors
    ///
    /// - [`VaultError::SizeMismatch`] if `context` is smaller than the backend
    ///   needs for `message_len`
    /// - whatever the backend's `hash_start` returns
    pub fn start(
        backend: &'a mut dyn Backend,
        context: &'a mut [u8],
        message_len: usize,
    ) -> Result<Self, VaultError> {
        let needed = backend.hash_context_len(message_len);
        if context.len() < needed {
            return Err(VaultError::SizeMismatch(format!(
                "hash context is {} bytes ({needed} needed)",
                context.len()
            )));
        }
        backend.hash_start(context)?;
        Ok(Self {
            backend,
            context,
            message_len,
            fed: 0,
            state: SessionState::Open,
        })
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Bytes still expected before finalize.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.message_len.saturating_sub(self.fed)
    }

    /// Feed the next chunk of the message.
    ///
    /// # Errors
    ///
    /// [`VaultError::HashFailure`] if the session is finalized or `data` would
    /// exceed the declared length, otherwise whatever the backend's `hash_update` returns.
    pub fn update(&mut self, data: &[u8]) -> Result<(), VaultError> {
        self.ensure_open()?;
        if data.len() > self.remaining() {
            return Err(VaultError::HashFailure(format!(
                "update of {} bytes exceeds the {} bytes left in the session",
                data.len(),
                self.remaining()
            )));
        }
        self.backend.hash_update(self.context, data)?;
        self.fed = self.fed.saturating_add(data.len());
        Ok(())
    }

    /// Finish the session, writing the digest to `out`.
    ///
    /// # Errors
    ///
    /// [`VaultError::HashFailure`] if the session is already finalized, `out`
    /// is not 32 bytes, or the message was not fed completely, otherwise
    /// whatever the backend's `hash_finalize` returns.
    pub fn finalize(&mut self, out: &mut [u8]) -> Result<(), VaultError> {
        self.ensure_open()?;
        if out.len() != SHA256_DIGEST_LEN {
            return Err(VaultError::HashFailure(format!(
                "digest buffer is {} bytes (expected {SHA256_DIGEST_LEN})",
                out.len()
            )));
        }
        if self.remaining() != 0 {
            return Err(VaultError::HashFailure(format!(
                "finalize with {} of {} message bytes missing",
                self.remaining(),
                self.message_len
            )));
        }
        self.backend.hash_finalize(self.context, out)?;
        self.state = SessionState::Finalized;
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), VaultError> {
        match self.state {
            SessionState::Open => Ok(()),
            SessionState::Finalized => Err(VaultError::HashFailure(
                "hash session already finalized".into(),
            )),
        }
    }
}

/// Hash `message` into `out` on `backend`, with the session context taken from
/// `allocator` for the duration of the call.
///
/// # Errors
///
/// - [`VaultError::HashFailure`] if `out` is not 32 bytes, before any buffer
///   is acquired
/// - acquisition errors from `allocator`
/// - the first failure of start, update, finalize, or release
pub fn digest(
    backend: &mut dyn Backend,
    allocator: &mut dyn ScratchAllocator,
    message: &[u8],
    out: &mut [u8],
) -> Result<(), VaultError> {
    if out.len() != SHA256_DIGEST_LEN {
        return Err(VaultError::HashFailure(format!(
            "digest buffer is {} bytes (expected {SHA256_DIGEST_LEN})",
            out.len()
        )));
    }

    let context_len = backend.hash_context_len(message.len());
    with_scratch(allocator, context_len, |context| {
        let mut session = HashSession::start(backend, context, message.len())?;
        session.update(message)?;
        session.finalize(out)
    })
}
