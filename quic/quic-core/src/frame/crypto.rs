// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The CRYPTO frame (0x06).
//!
//! TLS handshake bytes travel in CRYPTO frames, addressed by a stream
//! offset within that epoch's handshake byte stream. This core only
//! reassembles the contiguous, already-in-order case: a CRYPTO frame
//! whose offset does not match the next expected offset is rejected
//! rather than buffered for later reordering, since out-of-order
//! handshake delivery is out of scope for this revision.

use super::{FrameError, CRYPTO_TAG};
use quic_codec::{Buffer, VarInt};

//= https://www.rfc-editor.org/rfc/rfc9000#section-19.6
//# CRYPTO Frame {
//#   Type (i) = 0x06,
//#   Offset (i),
//#   Length (i),
//#   Crypto Data (..),
//# }
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Crypto<'a> {
    pub offset: u64,
    pub data: &'a [u8],
}

impl<'a> Crypto<'a> {
    /// Parses a CRYPTO frame's offset, length, and data out of `buffer`,
    /// which must be positioned just past the 0x06 tag.
    ///
    /// Rejects a non-zero offset and an empty payload; this core only
    /// ever sees a single contiguous CRYPTO frame per flight in its
    /// supported handshake shapes; see [`FrameError::NonZeroCryptoOffset`]
    /// and [`FrameError::EmptyCryptoFrame`].
    pub fn parse(buffer: &'a mut Buffer) -> Result<Self, FrameError> {
        let offset = VarInt::decode(buffer)?.as_u64();
        if offset != 0 {
            return Err(FrameError::NonZeroCryptoOffset(offset));
        }
        let length = VarInt::decode(buffer)?.as_u64() as usize;
        let data = buffer.pull_bytes(length)?;
        if data.is_empty() {
            return Err(FrameError::EmptyCryptoFrame);
        }
        Ok(Self { offset, data })
    }

    pub fn emit(buffer: &mut Buffer, data: &[u8]) -> Result<(), FrameError> {
        VarInt::try_from(CRYPTO_TAG as u64)
            .expect("tag fits in a varint")
            .encode(buffer)?;
        VarInt::ZERO.encode(buffer)?;
        VarInt::try_from(data.len() as u64)
            .map_err(|_| FrameError::EmptyCryptoFrame)?
            .encode(buffer)?;
        buffer.push_bytes(data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_then_parse_is_identity() {
        let mut buf = Buffer::with_capacity(64);
        Crypto::emit(&mut buf, b"client hello bytes").unwrap();

        let written = buf.data().to_vec();
        let mut reader = Buffer::from_slice(&written);
        let tag = VarInt::decode(&mut reader).unwrap().as_u64();
        assert_eq!(tag, CRYPTO_TAG as u64);
        let frame = Crypto::parse(&mut reader).unwrap();
        assert_eq!(frame.offset, 0);
        assert_eq!(frame.data, b"client hello bytes");
    }

    #[test]
    fn rejects_nonzero_offset() {
        let mut buf = Buffer::with_capacity(32);
        VarInt::new(4).unwrap().encode(&mut buf).unwrap();
        VarInt::new(3).unwrap().encode(&mut buf).unwrap();
        buf.push_bytes(b"abc").unwrap();

        let written = buf.data().to_vec();
        let mut reader = Buffer::from_slice(&written);
        assert!(matches!(
            Crypto::parse(&mut reader),
            Err(FrameError::NonZeroCryptoOffset(4))
        ));
    }
}
