// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use super::{HeaderError, PACKET_FIXED_BIT, PACKET_LONG_HEADER_BIT};
use crate::connection_id::ConnectionId;
use quic_codec::{Buffer, HeaderLengthMark, VarInt};

//= https://www.rfc-editor.org/rfc/rfc9000#section-17.2
//# Long Header Packet {
//#   Header Form (1) = 1,
//#   Fixed Bit (1) = 1,
//#   Long Packet Type (2),
//#   Type-Specific Bits (4),
//#   Version (32),
//#   Destination Connection ID Length (8),
//#   Destination Connection ID (0..160),
//#   Source Connection ID Length (8),
//#   Source Connection ID (0..160),
//# }
//
// This core only implements the Initial and Handshake packet types of the
// draft-17 wire format; 0-RTT and Retry are rejected on sight.

const LONG_PACKET_TYPE_MASK: u8 = 0x30;
const INITIAL_TYPE_BITS: u8 = 0x00;
const ZERO_RTT_TYPE_BITS: u8 = 0x10;
const HANDSHAKE_TYPE_BITS: u8 = 0x20;
const RETRY_TYPE_BITS: u8 = 0x30;

pub const DESTINATION_CONNECTION_ID_MAX_LEN: usize = 20;

/// Which long-header packet type this core accepts.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum LongPacketType {
    Initial,
    Handshake,
}

impl LongPacketType {
    fn type_bits(self) -> u8 {
        match self {
            LongPacketType::Initial => INITIAL_TYPE_BITS,
            LongPacketType::Handshake => HANDSHAKE_TYPE_BITS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LongHeader {
    pub version: u32,
    pub packet_type: LongPacketType,
    pub destination_cid: ConnectionId,
    pub source_cid: ConnectionId,
    /// The decoded `length` varint: the number of bytes that follow the
    /// header (packet number plus AEAD-protected payload, including its
    /// tag).
    pub rest_length: usize,
}

pub(super) fn parse(buffer: &mut Buffer) -> Result<LongHeader, HeaderError> {
    let first_byte = buffer.pull_uint8()?;
    debug_assert_eq!(first_byte & PACKET_LONG_HEADER_BIT, PACKET_LONG_HEADER_BIT);
    debug_assert_eq!(first_byte & PACKET_FIXED_BIT, PACKET_FIXED_BIT);

    let packet_type = match first_byte & LONG_PACKET_TYPE_MASK {
        INITIAL_TYPE_BITS => LongPacketType::Initial,
        HANDSHAKE_TYPE_BITS => LongPacketType::Handshake,
        ZERO_RTT_TYPE_BITS | RETRY_TYPE_BITS => {
            return Err(HeaderError::UnsupportedLongPacketType(first_byte))
        }
        _ => unreachable!("a two-bit mask has only four outcomes"),
    };

    let version = buffer.pull_uint32()?;

    let dcid_len = buffer.pull_uint8()? as usize;
    let destination_cid = ConnectionId::from_bytes(buffer.pull_bytes(dcid_len)?)
        .map_err(|_| HeaderError::TooShort(dcid_len))?;

    let scid_len = buffer.pull_uint8()? as usize;
    let source_cid = ConnectionId::from_bytes(buffer.pull_bytes(scid_len)?)
        .map_err(|_| HeaderError::TooShort(scid_len))?;

    if packet_type == LongPacketType::Initial {
        let token_len = VarInt::decode(buffer)?.as_u64() as usize;
        buffer.pull_bytes(token_len)?;
    }

    let rest_length = VarInt::decode(buffer)?.as_u64() as usize;

    Ok(LongHeader {
        version,
        packet_type,
        destination_cid,
        source_cid,
        rest_length,
    })
}

/// Writes everything up to and including the reserved length/packet-number
/// slot; returns the mark needed to patch that slot once the payload
/// length is known, alongside the header's total size so far (which also
/// serves as the AEAD associated-data boundary and the header-protection
/// packet-number offset).
pub fn emit(
    buffer: &mut Buffer,
    version: u32,
    packet_type: LongPacketType,
    pn_len: u8,
    destination_cid: &ConnectionId,
    source_cid: &ConnectionId,
) -> Result<(HeaderLengthMark, usize), super::HeaderError> {
    debug_assert!((1..=4).contains(&pn_len));

    let first_byte =
        PACKET_LONG_HEADER_BIT | PACKET_FIXED_BIT | packet_type.type_bits() | (pn_len - 1);
    buffer.push_uint8(first_byte)?;
    buffer.push_uint32(version)?;

    buffer.push_uint8(destination_cid.len() as u8)?;
    buffer.push_bytes(destination_cid.as_bytes())?;

    buffer.push_uint8(source_cid.len() as u8)?;
    buffer.push_bytes(source_cid.as_bytes())?;

    if packet_type == LongPacketType::Initial {
        // No address-validation token in this core: a zero-length token.
        VarInt::ZERO.encode(buffer)?;
    }

    let mark = buffer.reserve_header_length()?;
    let header_size = buffer.tell();
    Ok((mark, header_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_then_parse_is_identity() {
        let dcid = ConnectionId::from_bytes(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        let scid = ConnectionId::from_bytes(&[8, 7, 6, 5, 4, 3, 2, 1]).unwrap();

        let mut buf = Buffer::with_capacity(64);
        let (mark, header_size) = emit(
            &mut buf,
            super::super::PROTOCOL_VERSION_DRAFT_17,
            LongPacketType::Initial,
            2,
            &dcid,
            &scid,
        )
        .unwrap();
        buf.patch_header_length(mark, 0x4000 | 20, 7).unwrap();
        assert_eq!(buf.tell(), header_size);

        let written = buf.data().to_vec();
        let mut reader = Buffer::from_slice(&written);
        let header = parse(&mut reader).unwrap();
        assert_eq!(header.version, super::super::PROTOCOL_VERSION_DRAFT_17);
        assert_eq!(header.packet_type, LongPacketType::Initial);
        assert_eq!(header.destination_cid.as_bytes(), dcid.as_bytes());
        assert_eq!(header.source_cid.as_bytes(), scid.as_bytes());
        assert_eq!(header.rest_length, 20);
    }

    #[test]
    fn rejects_retry_and_zero_rtt() {
        let mut buf = Buffer::with_capacity(8);
        buf.push_uint8(0xF0).unwrap();
        buf.push_uint32(super::super::PROTOCOL_VERSION_DRAFT_17)
            .unwrap();
        let written = buf.data().to_vec();
        let mut reader = Buffer::from_slice(&written);
        assert!(matches!(
            parse(&mut reader),
            Err(HeaderError::UnsupportedLongPacketType(0xF0))
        ));
    }
}
