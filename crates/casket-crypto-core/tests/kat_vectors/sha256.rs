//! FIPS 180-4 SHA-256 examples, one-shot and streamed.

use casket_crypto_core::{sha256, Sha256Stream};

use super::hex;

#[test]
fn empty_message() {
    assert_eq!(
        sha256(b"").to_vec(),
        hex("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
    );
}

#[test]
fn abc() {
    assert_eq!(
        sha256(b"abc").to_vec(),
        hex("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
    );
}

#[test]
fn two_block_message_streamed() {
    let message = b"abcdbcdecdefdefgefghfghighijhijkijkljklmklmnlmnomnopnopq";
    let mut stream = Sha256Stream::new();
    for chunk in message.chunks(7) {
        stream.update(chunk);
    }
    let mut out = [0u8; 32];
    stream.finish(&mut out).unwrap();

    assert_eq!(
        out.to_vec(),
        hex("248d6a61d20638b8e5c026930c3e6039a33ce45964ff2167f6ecedd419db06c1")
    );
    assert_eq!(out, sha256(message));
}
