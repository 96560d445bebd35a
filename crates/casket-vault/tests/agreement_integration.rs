#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

//! End-to-end key agreement between two independent vaults.
//!
//! Each side generates a key pair, exports its public half, and agrees with
//! the other's. Both must arrive at the same 32-byte shared secret, and the
//! secret must be usable as HKDF input for an AES-GCM session key.

use casket_vault::{
    BackendId, BindingTable, Capability, Curve, EmulatedElement, HostBackend, Interface, KeyRole,
    SecureElementBackend, TransportConfig, Vault, VaultConfig,
};

fn atecc_vault() -> Vault {
    let config = VaultConfig {
        curve: Curve::P256,
        bindings: BindingTable::uniform(BackendId::ATECC508A)
            .bind(Capability::Derive, BackendId::HOST_SOFTWARE)
            .bind(Capability::AuthenticatedEncrypt, BackendId::HOST_SOFTWARE),
        transports: vec![TransportConfig::new(BackendId::ATECC508A, Interface::Swi)],
    };
    Vault::builder(config)
        .backend(HostBackend::new(Curve::P256))
        .backend(SecureElementBackend::new(BackendId::ATECC508A, EmulatedElement::new()).unwrap())
        .init()
        .unwrap()
}

fn optiga_vault() -> Vault {
    let config = VaultConfig {
        curve: Curve::P256,
        bindings: BindingTable::uniform(BackendId::OPTIGA_TRUST_X)
            .bind(Capability::Derive, BackendId::HOST_SOFTWARE)
            .bind(Capability::AuthenticatedEncrypt, BackendId::HOST_SOFTWARE),
        transports: vec![
            TransportConfig::new(BackendId::OPTIGA_TRUST_X, Interface::I2c).with_address(0x30),
        ],
    };
    Vault::builder(config)
        .backend(HostBackend::new(Curve::P256))
        .backend(
            SecureElementBackend::new(BackendId::OPTIGA_TRUST_X, EmulatedElement::new()).unwrap(),
        )
        .init()
        .unwrap()
}

/// Both sides generate `role`, swap public keys, and agree.
fn exchange(a: &mut Vault, b: &mut Vault, role: KeyRole) -> ([u8; 32], [u8; 32]) {
    a.generate(role).unwrap();
    b.generate(role).unwrap();
    let a_pub = a.public_key(role).unwrap();
    let b_pub = b.public_key(role).unwrap();

    let mut a_secret = [0u8; 32];
    let mut b_secret = [0u8; 32];
    a.agree(role, &b_pub, &mut a_secret).unwrap();
    b.agree(role, &a_pub, &mut b_secret).unwrap();
    (a_secret, b_secret)
}

#[test]
fn host_to_host_p256() {
    let mut a = Vault::host(Curve::P256).unwrap();
    let mut b = Vault::host(Curve::P256).unwrap();
    let (s1, s2) = exchange(&mut a, &mut b, KeyRole::Static);
    assert_eq!(s1, s2);
    assert_ne!(s1, [0u8; 32]);
}

#[test]
fn host_to_host_curve25519() {
    let mut a = Vault::host(Curve::Curve25519).unwrap();
    let mut b = Vault::host(Curve::Curve25519).unwrap();
    let (s1, s2) = exchange(&mut a, &mut b, KeyRole::Ephemeral);
    assert_eq!(s1, s2);
}

#[test]
fn element_to_host() {
    let mut device = optiga_vault();
    let mut gateway = Vault::host(Curve::P256).unwrap();
    let (s1, s2) = exchange(&mut device, &mut gateway, KeyRole::Ephemeral);
    assert_eq!(s1, s2);
}

#[test]
fn element_to_element_across_vendors() {
    let mut microchip = atecc_vault();
    let mut infineon = optiga_vault();
    let (s1, s2) = exchange(&mut microchip, &mut infineon, KeyRole::Static);
    assert_eq!(s1, s2);
}

#[test]
fn static_and_ephemeral_secrets_differ() {
    let mut a = optiga_vault();
    let mut b = Vault::host(Curve::P256).unwrap();
    let (static_secret, _) = exchange(&mut a, &mut b, KeyRole::Static);
    let (ephemeral_secret, _) = exchange(&mut a, &mut b, KeyRole::Ephemeral);
    assert_ne!(static_secret, ephemeral_secret);
}

#[test]
fn shared_secret_keys_an_aead_channel() {
    let mut device = optiga_vault();
    let mut gateway = Vault::host(Curve::P256).unwrap();
    let (device_secret, gateway_secret) = exchange(&mut device, &mut gateway, KeyRole::Ephemeral);

    let mut device_key = [0u8; 32];
    let mut gateway_key = [0u8; 32];
    device
        .derive(b"casket", &device_secret, b"session key", &mut device_key)
        .unwrap();
    gateway
        .derive(b"casket", &gateway_secret, b"session key", &mut gateway_key)
        .unwrap();
    assert_eq!(device_key, gateway_key);

    let nonce = device.random_bytes(12).unwrap();
    let sealed = device
        .seal(&device_key, &nonce, b"telemetry", b"temperature=21.5")
        .unwrap();
    let opened = gateway
        .unseal(&gateway_key, &nonce, b"telemetry", &sealed.ciphertext, &sealed.tag)
        .unwrap();
    assert_eq!(opened.expose(), b"temperature=21.5");
}

#[test]
fn agree_secret_helper_matches_buffer_api() {
    let mut a = optiga_vault();
    let mut b = Vault::host(Curve::P256).unwrap();
    let (s1, _) = exchange(&mut a, &mut b, KeyRole::Static);
    let b_pub = b.public_key(KeyRole::Static).unwrap();

    let secret = a.agree_secret(KeyRole::Static, &b_pub).unwrap();
    assert_eq!(secret.expose(), &s1);
}
