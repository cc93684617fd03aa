// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The fixed, role-specific transport-parameter blobs this core hands
//! the TLS engine via [`crate::tls::TlsEndpoint::push_handshake_extension`].
//!
//! A full implementation would encode these from a transport-parameter
//! codec, out of scope here. This revision carries the fixed byte
//! strings aioquic's reference connection hardcodes, which is enough to
//! drive a real peer's handshake since the values themselves are never
//! interpreted by this core.

/// The experimental `quic_transport_parameters` extension codepoint in
/// force for draft-17, superseded by `0x0039` once the transport
/// parameters extension was assigned its final RFC 9000 codepoint.
pub const QUIC_TRANSPORT_PARAMETERS_EXTENSION_TYPE: u16 = 0xffa5;

pub const CLIENT_TRANSPORT_PARAMETERS: &[u8] = &hex_literal::hex!(
    "ff00001100310005000480100000000600048010000000070004801000000004000481000000000100024258000800024064000a00010a"
);

pub const SERVER_TRANSPORT_PARAMETERS: &[u8] = &hex_literal::hex!(
    "ff00001104ff000011004500050004801000000006000480100000000700048010000000040004810000000001000242580002001000000000000000000000000000000000000800024064000a00010a"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_blobs_are_non_empty_and_distinct() {
        assert!(!CLIENT_TRANSPORT_PARAMETERS.is_empty());
        assert!(!SERVER_TRANSPORT_PARAMETERS.is_empty());
        assert_ne!(CLIENT_TRANSPORT_PARAMETERS, SERVER_TRANSPORT_PARAMETERS);
    }
}
