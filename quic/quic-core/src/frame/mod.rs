// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The frame codec.
//!
//! Only the subset this core's handshake-and-ACK connection needs is
//! implemented: PADDING, PING, ACK, CRYPTO, and NEW_CONNECTION_ID. Every
//! other frame type is a parse-time [`FrameError::UnknownType`]; the
//! caller logs it and abandons the rest of that packet's payload, per the
//! non-fatal error policy for this revision.

pub mod ack;
pub mod crypto;
pub mod new_connection_id;

use displaydoc::Display;
use quic_codec::{BufferError, VarIntError};

pub use ack::Ack;
pub use crypto::Crypto;
pub use new_connection_id::NewConnectionId;

//= https://www.rfc-editor.org/rfc/rfc9000#section-19
//# A frame type determines the format and semantics of the frame.
pub const PADDING_TAG: u8 = 0x00;
pub const PING_TAG: u8 = 0x01;
pub const ACK_TAG: u8 = 0x02;
pub const CRYPTO_TAG: u8 = 0x06;
pub const NEW_CONNECTION_ID_TAG: u8 = 0x18;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Display)]
#[non_exhaustive]
pub enum FrameError {
    /// {0}
    Buffer(BufferError),
    /// frame type {0} is not recognized by this core
    UnknownType(u64),
    /// a CRYPTO frame at a non-zero stream offset was received; out-of-order handshake data is out of scope
    NonZeroCryptoOffset(u64),
    /// a CRYPTO frame carried zero bytes of handshake data
    EmptyCryptoFrame,
    /// a varint field within a frame could not be decoded
    MalformedVarInt,
}

impl From<BufferError> for FrameError {
    fn from(err: BufferError) -> Self {
        FrameError::Buffer(err)
    }
}

impl From<VarIntError> for FrameError {
    fn from(err: VarIntError) -> Self {
        match err {
            VarIntError::Buffer(err) => FrameError::Buffer(err),
            VarIntError::ValueTooLarge(..) => FrameError::MalformedVarInt,
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FrameError {}

/// One decoded frame, or the classification needed for the two frame
/// types this core doesn't retain any data for (PADDING is decoded away
/// entirely at the call site since it carries no tag-following bytes to
/// skip; it is listed here for completeness of the match in callers).
#[derive(Debug)]
pub enum Frame<'a> {
    Padding,
    Ping,
    Ack(Ack),
    Crypto(Crypto<'a>),
    NewConnectionId(NewConnectionId<'a>),
}

impl<'a> Frame<'a> {
    /// PADDING and ACK-only payloads are the only ones that don't require
    /// a retransmittable response; everything else is "ack-eliciting" in
    /// RFC terms. This core only needs the binary ack-only/not-ack-only
    /// distinction `datagram_received` uses to decide whether to set
    /// `send_ack`.
    pub fn elicits_ack(&self) -> bool {
        !matches!(self, Frame::Padding | Frame::Ack(_))
    }
}

/// Walks every frame in a decrypted packet payload, invoking `on_frame`
/// for each, and reports whether the payload contained anything other
/// than PADDING and ACK frames.
///
/// An unrecognized frame type is logged and stops the walk for the rest
/// of this packet's payload rather than aborting the connection; the
/// frames already handed to `on_frame` still apply.
pub fn walk_payload(
    buffer: &mut quic_codec::Buffer,
    mut on_frame: impl for<'f> FnMut(Frame<'f>) -> Result<(), FrameError>,
) -> Result<bool, FrameError> {
    let mut ack_eliciting = false;

    while !buffer.eof() {
        let tag = quic_codec::VarInt::decode(buffer)?.as_u64();

        let frame = if tag > u8::MAX as u64 {
            tracing::warn!(frame_type = tag, "unrecognized frame type; abandoning payload");
            break;
        } else {
            match tag as u8 {
                PADDING_TAG => Frame::Padding,
                PING_TAG => Frame::Ping,
                ACK_TAG => Frame::Ack(Ack::parse(buffer)?),
                CRYPTO_TAG => Frame::Crypto(Crypto::parse(buffer)?),
                NEW_CONNECTION_ID_TAG => Frame::NewConnectionId(NewConnectionId::parse(buffer)?),
                _ => {
                    tracing::warn!(frame_type = tag, "unrecognized frame type; abandoning payload");
                    break;
                }
            }
        };

        ack_eliciting |= frame.elicits_ack();
        on_frame(frame)?;
    }

    Ok(ack_eliciting)
}
