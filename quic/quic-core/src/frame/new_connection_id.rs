// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The NEW_CONNECTION_ID frame (0x18).
//!
//! Active connection migration and connection ID rotation are out of
//! scope for this core, so a received NEW_CONNECTION_ID is parsed only
//! far enough to be validated and skipped, its sequence number, prior-
//! retirement threshold, and stateless reset token are never retained.

use super::FrameError;
use quic_codec::{Buffer, VarInt};

/// The stateless reset token is always exactly 16 bytes.
pub const STATELESS_RESET_TOKEN_LEN: usize = core::mem::size_of::<u128>();

//= https://www.rfc-editor.org/rfc/rfc9000#section-19.15
//# NEW_CONNECTION_ID Frame {
//#   Type (i) = 0x18,
//#   Sequence Number (i),
//#   Retire Prior To (i),
//#   Length (8),
//#   Connection ID (8..160),
//#   Stateless Reset Token (128),
//# }
#[derive(Debug, Clone, Copy)]
pub struct NewConnectionId<'a> {
    pub sequence_number: u64,
    pub retire_prior_to: u64,
    pub connection_id: &'a [u8],
    pub stateless_reset_token: &'a [u8],
}

impl<'a> NewConnectionId<'a> {
    pub fn parse(buffer: &'a mut Buffer) -> Result<Self, FrameError> {
        let sequence_number = VarInt::decode(buffer)?.as_u64();
        let retire_prior_to = VarInt::decode(buffer)?.as_u64();
        let length = buffer.pull_uint8()? as usize;
        let connection_id = buffer.pull_bytes(length)?;
        let stateless_reset_token = buffer.pull_bytes(STATELESS_RESET_TOKEN_LEN)?;

        Ok(Self {
            sequence_number,
            retire_prior_to,
            connection_id,
            stateless_reset_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_discards_a_well_formed_frame() {
        let mut buf = Buffer::with_capacity(64);
        VarInt::new(1).unwrap().encode(&mut buf).unwrap();
        VarInt::new(0).unwrap().encode(&mut buf).unwrap();
        buf.push_uint8(8).unwrap();
        buf.push_bytes(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        buf.push_bytes(&[0u8; STATELESS_RESET_TOKEN_LEN]).unwrap();

        let written = buf.data().to_vec();
        let mut reader = Buffer::from_slice(&written);
        let frame = NewConnectionId::parse(&mut reader).unwrap();
        assert_eq!(frame.sequence_number, 1);
        assert_eq!(frame.connection_id, &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert!(reader.eof());
    }
}
