//! RFC 5869 Appendix A: HKDF-SHA256 test case 3 (case 1 lives beside the
//! implementation).

use casket_crypto_core::hkdf_sha256;

use super::hex;

/// Test case 3: zero-length salt and info.
#[test]
fn rfc5869_test_case_3() {
    let ikm = [0x0bu8; 22];
    let mut okm = [0u8; 42];

    hkdf_sha256(&[], &ikm, &[], &mut okm).unwrap();

    assert_eq!(
        okm.to_vec(),
        hex("8da4e775a563c18f715f802a063c5a31b8a11f5c5ee1879ec3454e5f3c738d2d9d201395faa4b61a96c8")
    );
}
