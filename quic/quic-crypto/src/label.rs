// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! TLS 1.3 HKDF-Expand-Label, and the draft-17 Initial secret derivation
//! that seeds it.
//!
//! Grounded on the `ring::hkdf` usage pattern found across QUIC
//! implementations that build on `ring` rather than a dedicated HKDF
//! crate: `ring::hkdf::Prk::expand` doesn't accept an arbitrary output
//! length directly, so a zero-sized `KeyType` wrapper stands in for it.

use ring::hkdf;

//= https://www.rfc-editor.org/rfc/rfc9001#section-5.2
//# initial_salt = 0x9c108f98520a5c5c32968e950e8a2c5fe06d6c38
//
// This is the draft-17 Initial salt, distinct from the RFC 9001 final
// salt; this core speaks draft-17 on the wire and must derive Initial
// keys the same way a draft-17 peer does.
pub const INITIAL_SALT: [u8; 20] = hex_literal::hex!("9c108f98520a5c5c32968e950e8a2c5fe06d6c38");

const LABEL_PREFIX: &[u8] = b"tls13 ";

pub const CLIENT_INITIAL_LABEL: &[u8] = b"client in";
pub const SERVER_INITIAL_LABEL: &[u8] = b"server in";
pub const KEY_LABEL: &[u8] = b"quic key";
pub const IV_LABEL: &[u8] = b"quic iv";
pub const HP_LABEL: &[u8] = b"quic hp";

/// Hides an output length behind `ring::hkdf::KeyType` so `Prk::expand`
/// will fill a buffer of arbitrary size rather than one of its built-in
/// fixed-length key types.
struct OutputLen(usize);

impl hkdf::KeyType for OutputLen {
    fn len(&self) -> usize {
        self.0
    }
}

/// TLS 1.3's `HKDF-Expand-Label(Secret, Label, Context, Length)` with an
/// empty context, as QUIC key derivation always uses it.
pub fn hkdf_expand_label(prk: &hkdf::Prk, label: &[u8], out: &mut [u8]) {
    let len = (out.len() as u16).to_be_bytes();
    let label_len = [(LABEL_PREFIX.len() + label.len()) as u8];
    let context_len = [0u8];
    let info = [&len[..], &label_len, LABEL_PREFIX, label, &context_len];

    prk.expand(&info, OutputLen(out.len()))
        .expect("info component lengths are all fixed and within ring's limits")
        .fill(out)
        .expect("OutputLen::len matches the destination slice length");
}

/// Derives the client and server Initial secrets from a connection ID,
/// per the two-step `Initial Secret` / `client in`+`server in` process.
pub fn initial_secrets(destination_cid: &[u8]) -> (hkdf::Prk, hkdf::Prk) {
    let salt = hkdf::Salt::new(hkdf::HKDF_SHA256, &INITIAL_SALT);
    let initial_secret = salt.extract(destination_cid);

    let mut client = [0u8; 32];
    let mut server = [0u8; 32];
    hkdf_expand_label(&initial_secret, CLIENT_INITIAL_LABEL, &mut client);
    hkdf_expand_label(&initial_secret, SERVER_INITIAL_LABEL, &mut server);

    (
        hkdf::Prk::new_less_safe(hkdf::HKDF_SHA256, &client),
        hkdf::Prk::new_less_safe(hkdf::HKDF_SHA256, &server),
    )
}
