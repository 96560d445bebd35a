#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

//! Known-answer tests for the host-software primitives.
//!
//! - SHA-256: FIPS 180-4 examples
//! - HKDF-SHA256: RFC 5869 Appendix A
//! - AES-GCM: NIST SP 800-38D (GCM test cases)
//! - X25519: RFC 7748 Section 6.1

mod kat_vectors;
