#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

//! Integration tests for SHA-256 through the vault.
//!
//! Every hash call that acquires a working buffer must release it exactly
//! once, whether the session succeeds or fails at start, update, or finalize.

use std::sync::Arc;

use casket_crypto_core::sha256;
use casket_vault::{
    BackendId, BindingTable, Capability, Curve, EmulatedElement, EmulatorProbe, Fault,
    HostBackend, Interface, ScratchStats, SecureElementBackend, TrackingScratch, TransportConfig,
    Vault, VaultConfig, VaultError,
};

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

struct Bench {
    vault: Vault,
    probe: Arc<EmulatorProbe>,
    stats: Arc<ScratchStats>,
}

fn element_bench() -> Bench {
    let element = EmulatedElement::new();
    let probe = element.probe();
    let scratch = TrackingScratch::new();
    let stats = scratch.stats();

    let config = VaultConfig {
        curve: Curve::P256,
        bindings: BindingTable::uniform(BackendId::ATECC608A)
            .bind(Capability::Derive, BackendId::HOST_SOFTWARE)
            .bind(Capability::AuthenticatedEncrypt, BackendId::HOST_SOFTWARE),
        transports: vec![TransportConfig::new(BackendId::ATECC608A, Interface::I2c)],
    };
    let vault = Vault::builder(config)
        .backend(HostBackend::new(Curve::P256))
        .backend(SecureElementBackend::new(BackendId::ATECC608A, element).unwrap())
        .scratch(scratch)
        .init()
        .unwrap();

    Bench { vault, probe, stats }
}

fn host_bench() -> (Vault, Arc<ScratchStats>) {
    let scratch = TrackingScratch::new();
    let stats = scratch.stats();
    let vault = Vault::builder(VaultConfig::host_only(Curve::P256))
        .backend(HostBackend::new(Curve::P256))
        .scratch(scratch)
        .init()
        .unwrap();
    (vault, stats)
}

// ---------------------------------------------------------------------------
// Digest values
// ---------------------------------------------------------------------------

#[test]
fn element_digest_matches_host_digest() {
    let mut bench = element_bench();
    let (mut host, _) = host_bench();
    let message = b"The quick brown fox jumps over the lazy dog";

    let on_element = bench.vault.sha256(message).unwrap();
    let on_host = host.sha256(message).unwrap();

    assert_eq!(on_element, on_host);
    assert_eq!(on_element, sha256(message));
}

#[test]
fn empty_message_digest() {
    let mut bench = element_bench();
    let digest = bench.vault.sha256(&[]).unwrap();
    assert_eq!(digest, sha256(&[]));
}

#[test]
fn hash_is_served_by_bound_element() {
    let mut bench = element_bench();
    let before = bench.probe.calls();

    bench.vault.sha256(b"abc").unwrap();

    // start, update, finalize
    assert_eq!(bench.probe.calls(), before + 3);
}

// ---------------------------------------------------------------------------
// Working buffer discipline
// ---------------------------------------------------------------------------

#[test]
fn success_releases_context_exactly_once() {
    let mut bench = element_bench();
    bench.vault.sha256(b"message").unwrap();

    assert_eq!(bench.stats.acquired(), 1);
    assert_eq!(bench.stats.released(), 1);
    assert_eq!(bench.stats.outstanding(), 0);
}

#[test]
fn host_hash_also_balances_its_context() {
    let (mut vault, stats) = host_bench();
    for message in [&b""[..], b"a", b"abc"] {
        vault.sha256(message).unwrap();
    }
    assert_eq!(stats.acquired(), 3);
    assert_eq!(stats.released(), 3);
    assert_eq!(stats.outstanding(), 0);
}

#[test]
fn each_session_fault_releases_context_exactly_once() {
    for fault in [Fault::HashStart, Fault::HashUpdate, Fault::HashFinalize] {
        let mut bench = element_bench();
        bench.probe.inject(fault);

        let result = bench.vault.sha256(b"message");

        assert!(
            matches!(result, Err(VaultError::HashFailure(_))),
            "{fault:?}: {result:?}"
        );
        assert_eq!(bench.stats.acquired(), 1, "{fault:?}");
        assert_eq!(bench.stats.released(), 1, "{fault:?}");
        assert_eq!(bench.stats.outstanding(), 0, "{fault:?}");
    }
}

#[test]
fn session_failure_takes_precedence_over_release_failure() {
    let mut bench = element_bench();
    bench.probe.inject(Fault::HashUpdate);
    bench.stats.fail_release(true);

    let result = bench.vault.sha256(b"message");

    assert!(matches!(result, Err(VaultError::HashFailure(_))));
    assert_eq!(bench.stats.released(), 1);
}

#[test]
fn release_failure_after_success_is_reported() {
    let mut bench = element_bench();
    bench.stats.fail_release(true);

    let result = bench.vault.sha256(b"message");

    assert!(matches!(result, Err(VaultError::ResourceReleaseFailure(_))));
    assert_eq!(bench.stats.outstanding(), 0);
}

#[test]
fn acquire_failure_never_reaches_element() {
    let mut bench = element_bench();
    bench.stats.fail_acquire(true);
    let before = bench.probe.calls();

    let result = bench.vault.sha256(b"message");

    assert!(matches!(result, Err(VaultError::ResourceAcquireFailure(_))));
    assert_eq!(bench.probe.calls(), before);
    assert_eq!(bench.stats.released(), 0);
}

#[test]
fn bad_digest_length_never_acquires() {
    let mut bench = element_bench();
    let before = bench.probe.calls();

    for len in [0usize, 16, 31, 33, 64] {
        let mut out = vec![0u8; len];
        assert!(matches!(
            bench.vault.hash(b"message", &mut out),
            Err(VaultError::HashFailure(_))
        ));
    }

    assert_eq!(bench.stats.acquired(), 0);
    assert_eq!(bench.probe.calls(), before);
}

#[test]
fn vault_recovers_after_transient_fault() {
    let mut bench = element_bench();
    bench.probe.inject(Fault::HashFinalize);
    assert!(bench.vault.sha256(b"retry").is_err());

    bench.probe.clear(Fault::HashFinalize);
    assert_eq!(bench.vault.sha256(b"retry").unwrap(), sha256(b"retry"));
    assert_eq!(bench.stats.outstanding(), 0);
}
