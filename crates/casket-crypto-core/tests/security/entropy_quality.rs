//! Entropy quality tests for CSPRNG outputs.
//!
//! Smoke tests that `fill_random`, key generation, and `SecretBytes::random`
//! are not producing degenerate output. Shannon entropy for uniform bytes
//! approaches 8.0 bits/byte only for large samples, so small samples use
//! relaxed thresholds:
//!
//! | Sample size | Expected entropy | Our threshold |
//! |-------------|------------------|---------------|
//! | 32 bytes    | ~4.88            | 4.0           |
//! | 1 KB        | ~7.81            | 7.5           |
//! | 64 KB       | ~7.997           | 7.99          |

use casket_crypto_core::{fill_random, generate_keypair, Curve, SecretBytes};

/// Shannon entropy of a byte slice (bits per byte).
#[allow(clippy::cast_precision_loss)]
fn shannon_entropy(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mut freq = [0u64; 256];
    for &b in data {
        freq[b as usize] = freq[b as usize].saturating_add(1);
    }
    let len = data.len() as f64;
    freq.iter()
        .filter(|&&f| f > 0)
        .map(|&f| {
            let p = f as f64 / len;
            -p * p.log2()
        })
        .sum()
}

#[test]
fn fill_random_1kb_entropy() {
    let mut buf = vec![0u8; 1024];
    fill_random(&mut buf).unwrap();
    let entropy = shannon_entropy(&buf);
    assert!(entropy > 7.5, "1 KB entropy too low: {entropy:.4}");
}

/// Largest single request the host backend accepts.
#[test]
fn fill_random_64kb_entropy() {
    let mut buf = vec![0u8; 65_536];
    fill_random(&mut buf).unwrap();
    let entropy = shannon_entropy(&buf);
    assert!(entropy > 7.99, "64 KB entropy too low: {entropy:.4}");
}

#[test]
fn secret_bytes_32_random_entropy() {
    let key = SecretBytes::<32>::random().unwrap();
    let entropy = shannon_entropy(key.expose());
    assert!(entropy > 4.0, "32-byte key entropy too low: {entropy:.4}");
}

#[test]
fn generated_private_keys_are_distinct() {
    for curve in [Curve::P256, Curve::Curve25519] {
        let a = generate_keypair(curve).unwrap();
        let b = generate_keypair(curve).unwrap();
        assert_ne!(a.private.expose(), b.private.expose(), "{curve}");
        assert_ne!(a.public, b.public, "{curve}");
    }
}

#[test]
fn consecutive_fills_differ() {
    let mut a = [0u8; 256];
    let mut b = [0u8; 256];
    fill_random(&mut a).unwrap();
    fill_random(&mut b).unwrap();
    assert_ne!(a, b);
}
