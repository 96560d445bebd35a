//! Fuzz target for the peer public key record decoder.
//!
//! Feeds arbitrary bytes to `PeerKeyRecord::decode`. Must never panic, and any
//! accepted record must re-encode to the same bytes.
//!
//! # Usage
//!
//! ```sh
//! # Install cargo-fuzz (requires nightly Rust):
//! cargo +nightly install cargo-fuzz
//!
//! # Run from the casket-vault crate directory:
//! cd crates/casket-vault
//! cargo +nightly fuzz run peer_key_record -- -max_len=512
//! ```

#![no_main]

use casket_vault::PeerKeyRecord;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(record) = PeerKeyRecord::decode(data) {
        assert_eq!(record.as_bytes(), data);
        let again = PeerKeyRecord::encode(record.public_key());
        assert_eq!(again.ok(), Some(record));
    }
});
