//! RFC 7748 Section 6.1: X25519 Alice and Bob through the crate's ECDH API.

use casket_crypto_core::ecdh::public_key;
use casket_crypto_core::{agree, Curve, SecretBytes};

use super::hex;

const ALICE_PRIVATE: &str = "77076d0a7318a57d3c16c17251b26645df4c2f87ebc0992ab177fba51db92c2a";
const ALICE_PUBLIC: &str = "8520f0098930a754748b7ddcb43ef75a0dbf3a0d26381af4eba4a98eaa9b4e6a";
const BOB_PRIVATE: &str = "5dab087e624a8a4b79e17f8b83800ee66f3bb1292618b6fd1c2f8b27ff88e0eb";
const BOB_PUBLIC: &str = "de9edb7d7b7dc1b4d35b61c2ece435373f8343c85b78674dadfc7e146f882b4f";
const SHARED: &str = "4a5d9d5ba4ce2de1728e3bf480350f25e07e21c947d19e3376f09b3c1e161742";

fn private(hex_str: &str) -> SecretBytes<32> {
    SecretBytes::from_slice(&hex(hex_str)).unwrap()
}

#[test]
fn public_keys_match() {
    assert_eq!(
        public_key(Curve::Curve25519, &private(ALICE_PRIVATE)).unwrap(),
        hex(ALICE_PUBLIC)
    );
    assert_eq!(
        public_key(Curve::Curve25519, &private(BOB_PRIVATE)).unwrap(),
        hex(BOB_PUBLIC)
    );
}

#[test]
fn shared_secret_matches_from_both_sides() {
    let alice = agree(Curve::Curve25519, &private(ALICE_PRIVATE), &hex(BOB_PUBLIC)).unwrap();
    let bob = agree(Curve::Curve25519, &private(BOB_PRIVATE), &hex(ALICE_PUBLIC)).unwrap();

    assert_eq!(alice.expose().to_vec(), hex(SHARED));
    assert_eq!(bob.expose().to_vec(), hex(SHARED));
}

#[test]
fn all_zero_peer_is_rejected() {
    let result = agree(Curve::Curve25519, &private(ALICE_PRIVATE), &[0u8; 32]);
    assert!(result.is_err());
}
