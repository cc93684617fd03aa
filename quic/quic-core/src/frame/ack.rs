// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The ACK frame (0x02).
//!
//! This core only ever emits the 0x02 form (no ECN counts), and only
//! ever decodes it for completeness; an endpoint that does only
//! handshake bring-up has no use for the acknowledgments it receives
//! beyond knowing the peer saw its flight, so [`Ack::parse`] discards
//! the range detail into a single descending iterator rather than
//! reconstructing a full [`crate::range_set::RangeSet`].

use super::{FrameError, ACK_TAG};
use crate::range_set::RangeSet;
use alloc::vec::Vec;
use quic_codec::{Buffer, VarInt};

//= https://www.rfc-editor.org/rfc/rfc9000#section-19.3
//# ACK Frame {
//#   Type (i) = 0x02..0x03,
//#   Largest Acknowledged (i),
//#   ACK Delay (i),
//#   ACK Range Count (i),
//#   First ACK Range (i),
//#   ACK Range (..) ...,
//# }
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Ack {
    pub largest_acknowledged: u64,
    pub ack_delay: u64,
    pub ranges: Vec<core::ops::Range<u64>>,
}

impl Ack {
    pub fn parse(buffer: &mut Buffer) -> Result<Self, FrameError> {
        let largest_acknowledged = VarInt::decode(buffer)?.as_u64();
        let ack_delay = VarInt::decode(buffer)?.as_u64();
        let ack_range_count = VarInt::decode(buffer)?.as_u64();
        let first_ack_range = VarInt::decode(buffer)?.as_u64();

        let mut ranges = Vec::new();
        let mut smallest = largest_acknowledged.saturating_sub(first_ack_range);
        let mut largest = largest_acknowledged;
        ranges.push(smallest..largest + 1);

        //= https://www.rfc-editor.org/rfc/rfc9000#section-19.3.1
        //# Each ACK Range consists of alternating Gap and ACK Range Length
        //# values, with Gap measuring the number of contiguous unacknowledged
        //# packets preceding the ACK Range.
        for _ in 0..ack_range_count {
            let gap = VarInt::decode(buffer)?.as_u64();
            let length = VarInt::decode(buffer)?.as_u64();
            largest = smallest.saturating_sub(gap + 2);
            smallest = largest.saturating_sub(length);
            ranges.push(smallest..largest + 1);
        }

        Ok(Self {
            largest_acknowledged,
            ack_delay,
            ranges,
        })
    }

    /// Encodes an ACK frame covering every packet number in `received`,
    /// descending from its largest value. `ack_delay` is always encoded
    /// as zero: this core has no retransmission timer to measure it
    /// against, and aioquic's reference connection does the same.
    pub fn emit(buffer: &mut Buffer, received: &RangeSet) -> Result<(), FrameError> {
        debug_assert!(!received.is_empty(), "nothing to acknowledge");

        let mut descending = received.iter_descending();
        let largest_range = descending.next().expect("checked non-empty above");

        VarInt::try_from(ACK_TAG as u64)
            .expect("tag fits in a varint")
            .encode(buffer)?;
        VarInt::try_from(largest_range.end - 1)
            .map_err(|_| FrameError::UnknownType(largest_range.end - 1))?
            .encode(buffer)?;
        VarInt::ZERO.encode(buffer)?;

        let remaining: Vec<_> = descending.collect();
        VarInt::try_from(remaining.len() as u64)
            .expect("range count fits in a varint")
            .encode(buffer)?;
        VarInt::try_from(largest_range.end - 1 - largest_range.start)
            .map_err(|_| FrameError::UnknownType(largest_range.end))?
            .encode(buffer)?;

        let mut previous_smallest = largest_range.start;
        for range in remaining {
            let gap = previous_smallest - range.end - 1;
            let length = range.end - 1 - range.start;
            VarInt::try_from(gap)
                .map_err(|_| FrameError::UnknownType(gap))?
                .encode(buffer)?;
            VarInt::try_from(length)
                .map_err(|_| FrameError::UnknownType(length))?
                .encode(buffer)?;
            previous_smallest = range.start;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_then_parse_single_range_round_trips() {
        let received: RangeSet = (0u64..=5).collect();
        let mut buf = Buffer::with_capacity(64);
        Ack::emit(&mut buf, &received).unwrap();

        let written = buf.data().to_vec();
        let mut reader = Buffer::from_slice(&written);
        let tag = VarInt::decode(&mut reader).unwrap().as_u64();
        assert_eq!(tag, ACK_TAG as u64);
        let ack = Ack::parse(&mut reader).unwrap();
        assert_eq!(ack.largest_acknowledged, 5);
        assert_eq!(ack.ack_delay, 0);
        assert_eq!(ack.ranges, vec![0..6]);
    }

    #[test]
    fn emit_then_parse_gapped_ranges_round_trips() {
        let mut received = RangeSet::new();
        received.extend([0u64, 1, 2, 5, 6, 10]);
        let mut buf = Buffer::with_capacity(64);
        Ack::emit(&mut buf, &received).unwrap();

        let written = buf.data().to_vec();
        let mut reader = Buffer::from_slice(&written);
        VarInt::decode(&mut reader).unwrap();
        let ack = Ack::parse(&mut reader).unwrap();
        assert_eq!(ack.largest_acknowledged, 10);
        assert_eq!(ack.ranges, vec![10..11, 5..7, 0..3]);
    }
}
