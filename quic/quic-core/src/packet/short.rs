// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use super::{HeaderError, PACKET_FIXED_BIT, PACKET_LONG_HEADER_BIT};
use crate::connection_id::ConnectionId;
use quic_codec::Buffer;

//= https://www.rfc-editor.org/rfc/rfc9000#section-17.3
//# Short Header Packet {
//#   Header Form (1) = 0,
//#   Fixed Bit (1) = 1,
//#   Spin Bit (1),
//#   Reserved Bits (2),
//#   Key Phase (1),
//#   Packet Number Length (2),
//#   Destination Connection ID (0..160),
//#   Packet Number (8..32),
//#   Packet Payload (..),
//# }
//
// This core emits and expects 1-RTT short headers only, with a fixed
// 2-byte packet number and no key-phase bit (post-handshake key updates
// are out of scope).

#[derive(Debug, Clone)]
pub struct ShortHeader {
    pub destination_cid: ConnectionId,
}

/// Parses a short header whose destination CID is exactly `host_cid_len`
/// bytes (short headers carry no explicit CID length, so the reader must
/// already know it).
pub(super) fn parse(buffer: &mut Buffer, host_cid_len: usize) -> Result<ShortHeader, HeaderError> {
    let first_byte = buffer.pull_uint8()?;
    debug_assert_eq!(first_byte & PACKET_LONG_HEADER_BIT, 0);
    debug_assert_eq!(first_byte & PACKET_FIXED_BIT, PACKET_FIXED_BIT);

    let destination_cid = ConnectionId::from_bytes(buffer.pull_bytes(host_cid_len)?)
        .map_err(|_| HeaderError::TooShort(host_cid_len))?;

    Ok(ShortHeader { destination_cid })
}

/// Writes the first byte and destination CID of a short header; the
/// packet number follows immediately and is written by the caller, since
/// unlike the long header there is no length field to reserve.
pub fn emit(
    buffer: &mut Buffer,
    pn_len: u8,
    destination_cid: &ConnectionId,
) -> Result<(), HeaderError> {
    debug_assert!((1..=4).contains(&pn_len));
    let first_byte = PACKET_FIXED_BIT | (pn_len - 1);
    buffer.push_uint8(first_byte)?;
    buffer.push_bytes(destination_cid.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_then_parse_is_identity() {
        let cid = ConnectionId::from_bytes(&[9, 9, 9, 9, 9, 9, 9, 9]).unwrap();
        let mut buf = Buffer::with_capacity(32);
        emit(&mut buf, 2, &cid).unwrap();
        buf.push_uint16(42).unwrap();

        let written = buf.data().to_vec();
        let mut reader = Buffer::from_slice(&written);
        let header = parse(&mut reader, cid.len()).unwrap();
        assert_eq!(header.destination_cid.as_bytes(), cid.as_bytes());
        assert_eq!(reader.pull_uint16().unwrap(), 42);
        assert!(reader.eof());
    }
}
