mod aes_gcm;
mod hkdf;
mod sha256;
mod x25519;

/// Decode a hex string from a test vector.
pub fn hex(s: &str) -> Vec<u8> {
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
        .collect()
}
