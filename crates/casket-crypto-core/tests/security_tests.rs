#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

//! Security validation test suite for casket-crypto-core.
//!
//! These integration tests verify security-critical properties:
//! - CSPRNG entropy quality via Shannon entropy
//! - Secret types never print their contents

mod security;
