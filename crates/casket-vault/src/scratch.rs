//! Scoped working buffers.
//!
//! Secure-element hash sessions keep their state in a caller-supplied context
//! buffer. [`with_scratch`] acquires one from a [`ScratchAllocator`], runs the
//! work, and releases it exactly once on every exit path:
//!
//! - work succeeded, release succeeded: the work's value
//! - work succeeded, release failed: the release error
//! - work failed: the work's error (release is still attempted, its outcome
//!   is dropped)

use std::fmt;

use zeroize::Zeroize;

use crate::error::VaultError;

/// Source of working buffers.
pub trait ScratchAllocator: fmt::Debug {
    /// Obtain a zero-filled buffer of exactly `len` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::ResourceAcquireFailure`] if no buffer is available.
    fn acquire(&mut self, len: usize) -> Result<Vec<u8>, VaultError>;

    /// Give a buffer back.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::ResourceReleaseFailure`] if the buffer could not
    /// be returned.
    fn release(&mut self, buffer: Vec<u8>) -> Result<(), VaultError>;
}

/// Heap allocator; buffers are zeroized before being freed.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapScratch;

impl ScratchAllocator for HeapScratch {
    fn acquire(&mut self, len: usize) -> Result<Vec<u8>, VaultError> {
        let mut buffer = Vec::new();
        buffer.try_reserve_exact(len).map_err(|e| {
            VaultError::ResourceAcquireFailure(format!("cannot allocate {len} bytes: {e}"))
        })?;
        buffer.resize(len, 0);
        Ok(buffer)
    }

    fn release(&mut self, mut buffer: Vec<u8>) -> Result<(), VaultError> {
        buffer.zeroize();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// A buffer borrowed from an allocator, released on [`Scratch::release`] or
/// on drop, whichever comes first.
struct Scratch<'a> {
    allocator: &'a mut dyn ScratchAllocator,
    buffer: Option<Vec<u8>>,
}

impl Scratch<'_> {
    fn as_mut_slice(&mut self) -> &mut [u8] {
        self.buffer.as_deref_mut().unwrap_or_default()
    }

    fn release(mut self) -> Result<(), VaultError> {
        match self.buffer.take() {
            Some(buffer) => self.allocator.release(buffer),
            None => Ok(()),
        }
    }
}

impl Drop for Scratch<'_> {
    fn drop(&mut self) {
        // Only reached on unwind; the error has nowhere to go.
        if let Some(buffer) = self.buffer.take() {
            if let Err(e) = self.allocator.release(buffer) {
                tracing::warn!(error = %e, "scratch buffer release failed during unwind");
            }
        }
    }
}

/// Run `work` with a `len`-byte buffer from `allocator`.
///
/// # Errors
///
/// The acquisition error if no buffer could be obtained (`work` is not run),
/// otherwise the first error of `work` then release.
pub fn with_scratch<T, F>(
    allocator: &mut dyn ScratchAllocator,
    len: usize,
    work: F,
) -> Result<T, VaultError>
where
    F: FnOnce(&mut [u8]) -> Result<T, VaultError>,
{
    let buffer = allocator.acquire(len)?;
    let mut scratch = Scratch {
        allocator,
        buffer: Some(buffer),
    };

    let outcome = work(scratch.as_mut_slice());
    let released = scratch.release();

    match (outcome, released) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => {
            tracing::warn!(error = %e, len, "scratch release failed after successful work");
            Err(e)
        }
        (Err(e), _) => Err(e),
    }
}

// ---------------------------------------------------------------------------
// Tracking allocator
// ---------------------------------------------------------------------------

#[cfg(any(test, feature = "emulation"))]
pub use tracking::{ScratchStats, TrackingScratch};

/// Counting allocator for bench tests, built with the `emulation` feature.
#[cfg(any(test, feature = "emulation"))]
mod tracking {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::{HeapScratch, ScratchAllocator};
    use crate::error::VaultError;

    /// Shared counters of a [`TrackingScratch`].
    #[derive(Debug, Default)]
    pub struct ScratchStats {
        acquired: AtomicUsize,
        released: AtomicUsize,
        outstanding: AtomicUsize,
        fail_acquire: AtomicBool,
        fail_release: AtomicBool,
    }

    impl ScratchStats {
        /// Buffers handed out so far.
        #[must_use]
        pub fn acquired(&self) -> usize {
            self.acquired.load(Ordering::SeqCst)
        }

        /// Buffers given back so far (including failed releases).
        #[must_use]
        pub fn released(&self) -> usize {
            self.released.load(Ordering::SeqCst)
        }

        /// Buffers handed out and not yet given back.
        #[must_use]
        pub fn outstanding(&self) -> usize {
            self.outstanding.load(Ordering::SeqCst)
        }

        /// Make every later acquisition fail.
        pub fn fail_acquire(&self, fail: bool) {
            self.fail_acquire.store(fail, Ordering::SeqCst);
        }

        /// Make every later release report failure (the buffer is still freed).
        pub fn fail_release(&self, fail: bool) {
            self.fail_release.store(fail, Ordering::SeqCst);
        }
    }

    /// Heap allocator that counts acquisitions and releases and can be told to
    /// fail. Used to verify buffer discipline from outside the vault.
    #[derive(Debug, Default, Clone)]
    pub struct TrackingScratch {
        stats: Arc<ScratchStats>,
    }

    impl TrackingScratch {
        /// New allocator with zeroed counters.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Handle to the counters, valid after the allocator is moved into a vault.
        #[must_use]
        pub fn stats(&self) -> Arc<ScratchStats> {
            Arc::clone(&self.stats)
        }
    }

    impl ScratchAllocator for TrackingScratch {
        fn acquire(&mut self, len: usize) -> Result<Vec<u8>, VaultError> {
            if self.stats.fail_acquire.load(Ordering::SeqCst) {
                return Err(VaultError::ResourceAcquireFailure(
                    "injected acquire failure".into(),
                ));
            }
            let buffer = HeapScratch.acquire(len)?;
            self.stats.acquired.fetch_add(1, Ordering::SeqCst);
            self.stats.outstanding.fetch_add(1, Ordering::SeqCst);
            Ok(buffer)
        }

        fn release(&mut self, buffer: Vec<u8>) -> Result<(), VaultError> {
            self.stats.released.fetch_add(1, Ordering::SeqCst);
            self.stats.outstanding.fetch_sub(1, Ordering::SeqCst);
            HeapScratch.release(buffer)?;
            if self.stats.fail_release.load(Ordering::SeqCst) {
                return Err(VaultError::ResourceReleaseFailure(
                    "injected release failure".into(),
                ));
            }
            Ok(())
        }
    }
}
