// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Per-epoch directional AEAD and header-protection contexts.
//!
//! A [`CryptoPair`] is the thing that turns a plaintext header + payload
//! into a datagram, and back. It holds up to two [`DirectionalKeys`]
//! (send, receive), each either absent (not yet installed) or a fully
//! keyed AEAD_AES_128_GCM context plus its paired AES-128 header-
//! protection key, the same key/iv/header-protection triple `ring`-
//! backed QUIC implementations derive for every epoch.

use crate::label::{self, HP_LABEL, IV_LABEL, KEY_LABEL};
use alloc::vec::Vec;
use displaydoc::Display;
use ring::aead;
use ring::hkdf;
use zeroize::Zeroize;

/// The AEAD tag length for AEAD_AES_128_GCM, the only cipher suite this
/// core ever installs.
pub const AEAD_TAG_SIZE: usize = 16;

const NONCE_LEN: usize = 12;
const SAMPLE_LEN: usize = 16;
/// Fixed packet-number wire length this revision assumes on both send
/// and receive; see the header-protection sample-offset non-goal.
const PN_LEN: usize = 2;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Display)]
#[non_exhaustive]
pub enum CryptoError {
    /// this direction has no key installed
    NotSet,
    /// AEAD seal or open failed (authentication failure or malformed input)
    Decrypt,
    /// a packet shorter than the minimum header-protection sample was presented
    SampleTooShort,
}

/// Which half of a [`CryptoPair`] a traffic secret installs.
///
/// Named after the TLS key-schedule callback's own vocabulary
/// (`update_traffic_key_cb(direction, epoch, secret)`) rather than
/// "send"/"receive", since the callback fires once per direction and the
/// caller has to pick one of these two variants, not a `CryptoPair` half
/// directly.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

/// The negotiated AEAD/key-schedule algorithm a traffic secret was
/// derived under. This core only ever installs AES-128-GCM with a
/// SHA-256 key schedule, but the traffic-key callback's contract names
/// an algorithm alongside every secret, so the type exists to carry it
/// even though a single variant is all that's implemented.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[non_exhaustive]
pub enum Algorithm {
    Aes128GcmSha256,
}

#[cfg(feature = "std")]
impl std::error::Error for CryptoError {}

/// One direction's installed keys: an AEAD context plus the header-
/// protection key derived alongside it, and the base IV the AEAD nonce
/// is computed from per packet.
struct DirectionalKeys {
    aead: aead::LessSafeKey,
    iv: [u8; NONCE_LEN],
    header_protection: aead::quic::HeaderProtectionKey,
}

impl DirectionalKeys {
    fn from_secret(secret: &hkdf::Prk) -> Self {
        let mut key_bytes = [0u8; 16];
        let mut iv = [0u8; NONCE_LEN];
        let mut hp_bytes = [0u8; 16];

        label::hkdf_expand_label(secret, KEY_LABEL, &mut key_bytes);
        label::hkdf_expand_label(secret, IV_LABEL, &mut iv);
        label::hkdf_expand_label(secret, HP_LABEL, &mut hp_bytes);

        let unbound = aead::UnboundKey::new(&aead::AES_128_GCM, &key_bytes)
            .expect("AES_128_GCM accepts a 16-byte key");
        let aead = aead::LessSafeKey::new(unbound);
        let header_protection =
            aead::quic::HeaderProtectionKey::new(&aead::quic::AES_128, &hp_bytes)
                .expect("AES_128 header protection accepts a 16-byte key");

        key_bytes.zeroize();
        hp_bytes.zeroize();

        Self {
            aead,
            iv,
            header_protection,
        }
    }

    fn nonce_for(&self, packet_number: u64) -> aead::Nonce {
        let mut bytes = self.iv;
        let pn_bytes = packet_number.to_be_bytes();
        for (byte, pn_byte) in bytes[NONCE_LEN - 8..].iter_mut().zip(pn_bytes.iter()) {
            *byte ^= pn_byte;
        }
        aead::Nonce::assume_unique_for_key(bytes)
    }

    /// Derives the 5-byte header-protection mask from `sample` and XORs
    /// it over the first header byte's low nibble and the two packet-
    /// number bytes immediately preceding `sample`'s caller-supplied
    /// offset. The XOR is its own inverse, so this same function both
    /// applies and removes protection.
    fn apply_mask(&self, first_byte: &mut u8, pn_bytes: &mut [u8], sample: &[u8]) -> Result<(), CryptoError> {
        let mask = self
            .header_protection
            .new_mask(sample)
            .map_err(|_| CryptoError::SampleTooShort)?;

        *first_byte ^= mask[0] & 0x0f;
        for (byte, mask_byte) in pn_bytes.iter_mut().zip(&mask[1..]) {
            *byte ^= mask_byte;
        }
        Ok(())
    }
}

impl Drop for DirectionalKeys {
    fn drop(&mut self) {
        self.iv.zeroize();
    }
}

/// The two directional contexts (send, receive) for one encryption
/// level. Either half may be absent; [`CryptoPair::is_valid`] reports
/// whether both are installed, which this revision always does in
/// lock-step (the same secret installation call seeds both).
#[derive(Default)]
pub struct CryptoPair {
    send: Option<DirectionalKeys>,
    receive: Option<DirectionalKeys>,
}

impl CryptoPair {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives this epoch's Initial keys from the destination connection
    /// ID the client chose, per the fixed draft-17 salt.
    ///
    /// `is_client` selects which of the two derived secrets (`client in`
    /// / `server in`) this endpoint sends with versus receives with: a
    /// client sends under the client secret and reads under the server
    /// secret, and a server does the reverse.
    pub fn setup_initial(destination_cid: &[u8], is_client: bool) -> Self {
        let (client_secret, server_secret) = label::initial_secrets(destination_cid);
        let (send_secret, receive_secret) = if is_client {
            (&client_secret, &server_secret)
        } else {
            (&server_secret, &client_secret)
        };

        Self {
            send: Some(DirectionalKeys::from_secret(send_secret)),
            receive: Some(DirectionalKeys::from_secret(receive_secret)),
        }
    }

    /// Installs one direction's traffic secret, as handed back by the TLS
    /// engine's key-update callback (`update_traffic_key_cb(direction,
    /// epoch, secret)`). Replaces whatever was previously installed for
    /// that direction at this epoch; the other direction, if already
    /// installed, is untouched.
    pub fn setup(&mut self, direction: Direction, _algorithm: Algorithm, secret: &[u8]) {
        let prk = hkdf::Prk::new_less_safe(hkdf::HKDF_SHA256, secret);
        let keys = DirectionalKeys::from_secret(&prk);
        match direction {
            Direction::Encrypt => self.send = Some(keys),
            Direction::Decrypt => self.receive = Some(keys),
        }
    }

    /// Reverts to the invalid state, dropping (and zeroizing) both
    /// directions' keys.
    pub fn teardown(&mut self) {
        self.send = None;
        self.receive = None;
    }

    pub fn is_valid(&self) -> bool {
        self.send.is_some() && self.receive.is_some()
    }

    pub fn aead_tag_size(&self) -> usize {
        AEAD_TAG_SIZE
    }

    /// Seals `payload` in place (appending the AEAD tag) and applies
    /// header protection to `header`'s first byte and trailing 2-byte
    /// packet number, using `header` as associated data.
    ///
    /// `header` must already hold the plaintext, truncated packet number
    /// in its final [`PN_LEN`] bytes.
    pub fn encrypt_packet(
        &self,
        packet_number: u64,
        header: &mut [u8],
        payload: &mut Vec<u8>,
    ) -> Result<(), CryptoError> {
        let keys = self.send.as_ref().ok_or(CryptoError::NotSet)?;

        let nonce = keys.nonce_for(packet_number);
        keys.aead
            .seal_in_place_append_tag(nonce, aead::Aad::from(&*header), payload)
            .map_err(|_| CryptoError::Decrypt)?;

        //= https://www.rfc-editor.org/rfc/rfc9001#section-5.4.2
        //# the Packet Number field is assumed to be 4 bytes long for the
        //# purposes of determining the sample offset
        //
        // This core fixes the on-wire packet number at PN_LEN bytes, so the
        // "4 bytes after the start of the Packet Number field" sample
        // offset lands PN_LEN bytes short of the header, i.e. 4 - PN_LEN
        // bytes into the just-sealed payload.
        let sample_offset = 4 - PN_LEN;
        let sample = payload
            .get(sample_offset..sample_offset + SAMPLE_LEN)
            .ok_or(CryptoError::SampleTooShort)?;

        let (first_byte, rest) = header.split_first_mut().ok_or(CryptoError::SampleTooShort)?;
        let pn_bytes = &mut rest[rest.len() - PN_LEN..];
        keys.apply_mask(first_byte, pn_bytes, sample)
    }

    /// Reverses header protection and then opens the AEAD payload of a
    /// single received datagram slice.
    ///
    /// `pn_offset` is the byte offset of the [`PN_LEN`]-byte packet
    /// number field within `packet`. The packet number recovered is used
    /// directly as this revision's 64-bit packet number, with no previous-
    /// largest-PN reconstruction performed; see the module docs.
    pub fn decrypt_packet<'p>(
        &self,
        packet: &'p mut [u8],
        pn_offset: usize,
    ) -> Result<(&'p [u8], &'p mut [u8], u64), CryptoError> {
        let keys = self.receive.as_ref().ok_or(CryptoError::NotSet)?;

        let header_len = pn_offset + PN_LEN;
        let sample_start = header_len + (4 - PN_LEN);
        let sample_end = sample_start
            .checked_add(SAMPLE_LEN)
            .filter(|&end| end <= packet.len())
            .ok_or(CryptoError::SampleTooShort)?;

        let (head, rest) = packet.split_at_mut(sample_start);
        let sample = &rest[..SAMPLE_LEN];
        let (first_byte, pn_bytes) = head.split_first_mut().expect("header_len >= pn_offset + PN_LEN >= 1");
        let pn_bytes = &mut pn_bytes[pn_offset - 1..header_len - 1];
        keys.apply_mask(first_byte, pn_bytes, sample)?;
        let _ = sample_end;

        let packet_number = u16::from_be_bytes([packet[pn_offset], packet[pn_offset + 1]]) as u64;
        let nonce = keys.nonce_for(packet_number);

        let (header, ciphertext) = packet.split_at_mut(header_len);
        let plaintext = keys
            .aead
            .open_in_place(nonce, aead::Aad::from(&*header), ciphertext)
            .map_err(|_| CryptoError::Decrypt)?;

        Ok((header, plaintext, packet_number))
    }
}
