//! Backend Providers.
//!
//! - [`host`]: software cryptography on the host CPU
//! - [`secure_element`]: a hardware element behind an [`secure_element::ElementDriver`]
//! - `emulated`: an in-process element driver for bench testing, built with
//!   the `emulation` feature

#[cfg(any(test, feature = "emulation"))]
pub mod emulated;
pub mod host;
pub mod secure_element;
