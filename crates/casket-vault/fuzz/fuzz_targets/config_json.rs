//! Fuzz target for vault configuration parsing and validation.
//!
//! Feeds arbitrary strings to `VaultConfig::from_json` and validates whatever
//! parses. Must never panic.
//!
//! # Usage
//!
//! ```sh
//! # Install cargo-fuzz (requires nightly Rust):
//! cargo +nightly install cargo-fuzz
//!
//! # Run from the casket-vault crate directory:
//! cd crates/casket-vault
//! cargo +nightly fuzz run config_json -- -max_len=8192
//! ```

#![no_main]

use casket_vault::VaultConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(config) = VaultConfig::from_json(s) {
            let _ = config.validate();
            let _ = config.to_json();
        }
    }
});
