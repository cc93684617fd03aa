// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use alloc::{vec, vec::Vec};
use displaydoc::Display;

/// A panic-free error returned by [`Buffer`] operations.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Display)]
#[non_exhaustive]
pub enum BufferError {
    /// write of {requested} byte(s) at offset {offset} exceeds buffer capacity of {capacity}
    CapacityExceeded {
        offset: usize,
        requested: usize,
        capacity: usize,
    },
    /// read of {requested} byte(s) at offset {offset} exceeds the written extent ({written})
    UnexpectedEof {
        offset: usize,
        requested: usize,
        written: usize,
    },
    /// seek target {target} is outside the buffer's capacity of {capacity}
    InvalidSeek { target: usize, capacity: usize },
}

#[cfg(feature = "std")]
impl std::error::Error for BufferError {}

/// A cursor over a fixed-capacity byte region.
///
/// `Buffer` backs both directions of wire I/O: constructed from an existing
/// slice it behaves as a decoder (reads cannot run past the bytes supplied
/// at construction); constructed with a capacity it behaves as an encoder
/// (writes cannot run past that capacity). The same cursor (`tell`/`seek`)
/// and the same byte-level primitives serve either use, which is what lets
/// the packet header codec reserve space for a length field, write the
/// payload that determines that length, and come back to patch it in place
/// without a second serialization pass.
#[derive(Clone, Debug)]
pub struct Buffer {
    data: Vec<u8>,
    position: usize,
    /// High-water mark: the number of bytes that are valid to read.
    written: usize,
}

/// A reserved slot for a 2-byte length field followed by a 2-byte packet
/// number, returned by [`Buffer::reserve_header_length`].
///
/// Holding this instead of a bare offset makes the "come back and patch"
/// pattern a single matched pair of calls instead of a naked `seek`.
#[derive(Clone, Copy, Debug)]
pub struct HeaderLengthMark(usize);

impl Buffer {
    /// Creates a write cursor over `capacity` zeroed bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: alloc::vec![0u8; capacity],
            position: 0,
            written: 0,
        }
    }

    /// Creates a read cursor over an existing, already-written byte slice.
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self {
            data: bytes.to_vec(),
            position: 0,
            written: bytes.len(),
        }
    }

    /// The current cursor offset.
    #[inline]
    pub fn tell(&self) -> usize {
        self.position
    }

    /// The buffer's fixed capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// True once the cursor has consumed every written byte.
    #[inline]
    pub fn eof(&self) -> bool {
        self.position >= self.written
    }

    /// Moves the cursor to an absolute offset within capacity.
    ///
    /// Does not change the written extent; seeking backward to patch a
    /// field and then seeking forward again is the intended use.
    pub fn seek(&mut self, offset: usize) -> Result<(), BufferError> {
        if offset > self.data.len() {
            return Err(BufferError::InvalidSeek {
                target: offset,
                capacity: self.data.len(),
            });
        }
        self.position = offset;
        Ok(())
    }

    /// The bytes written so far, from offset 0 up to the current cursor
    /// position. Used by the "finalize length then seek back" emission
    /// pattern: callers capture `tell()` at interesting offsets and slice
    /// this span themselves.
    pub fn data(&self) -> &[u8] {
        &self.data[..self.position]
    }

    /// Writes `bytes` at the cursor and advances it.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Result<(), BufferError> {
        let end = self
            .position
            .checked_add(bytes.len())
            .filter(|&end| end <= self.data.len())
            .ok_or(BufferError::CapacityExceeded {
                offset: self.position,
                requested: bytes.len(),
                capacity: self.data.len(),
            })?;
        self.data[self.position..end].copy_from_slice(bytes);
        self.position = end;
        self.written = self.written.max(self.position);
        Ok(())
    }

    /// Reads `n` bytes at the cursor and advances it.
    pub fn pull_bytes(&mut self, n: usize) -> Result<&[u8], BufferError> {
        let start = self.position;
        let end = start
            .checked_add(n)
            .filter(|&end| end <= self.written)
            .ok_or(BufferError::UnexpectedEof {
                offset: start,
                requested: n,
                written: self.written,
            })?;
        self.position = end;
        Ok(&self.data[start..end])
    }

    /// Remaining unread bytes without advancing the cursor.
    pub fn peek_remaining(&self) -> &[u8] {
        &self.data[self.position..self.written]
    }

    pub fn push_uint8(&mut self, value: u8) -> Result<(), BufferError> {
        self.push_bytes(&[value])
    }

    pub fn pull_uint8(&mut self) -> Result<u8, BufferError> {
        Ok(self.pull_bytes(1)?[0])
    }

    pub fn push_uint16(&mut self, value: u16) -> Result<(), BufferError> {
        self.push_bytes(&value.to_be_bytes())
    }

    pub fn pull_uint16(&mut self) -> Result<u16, BufferError> {
        let bytes = self.pull_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn push_uint32(&mut self, value: u32) -> Result<(), BufferError> {
        self.push_bytes(&value.to_be_bytes())
    }

    pub fn pull_uint32(&mut self) -> Result<u32, BufferError> {
        let bytes = self.pull_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn push_uint64(&mut self, value: u64) -> Result<(), BufferError> {
        self.push_bytes(&value.to_be_bytes())
    }

    pub fn pull_uint64(&mut self) -> Result<u64, BufferError> {
        let bytes = self.pull_bytes(8)?;
        let mut array = [0u8; 8];
        array.copy_from_slice(bytes);
        Ok(u64::from_be_bytes(array))
    }

    /// Reserves a 2-byte length field immediately followed by a 2-byte
    /// packet number, to be filled in once the payload length is known.
    /// Pairs with [`Buffer::patch_header_length`].
    pub fn reserve_header_length(&mut self) -> Result<HeaderLengthMark, BufferError> {
        let mark = HeaderLengthMark(self.position);
        self.push_uint16(0)?;
        self.push_uint16(0)?;
        Ok(mark)
    }

    /// Patches the length and packet-number fields reserved by
    /// [`Buffer::reserve_header_length`], then restores the cursor to
    /// where it was before this call.
    pub fn patch_header_length(
        &mut self,
        mark: HeaderLengthMark,
        length: u16,
        packet_number: u16,
    ) -> Result<(), BufferError> {
        let resume = self.position;
        self.seek(mark.0)?;
        self.push_uint16(length)?;
        self.push_uint16(packet_number)?;
        self.seek(resume)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips() {
        let mut buf = Buffer::with_capacity(16);
        buf.push_uint8(0xAB).unwrap();
        buf.push_uint16(0x1234).unwrap();
        buf.push_uint32(0xDEAD_BEEF).unwrap();
        buf.push_bytes(b"hi").unwrap();
        assert_eq!(buf.tell(), 9);

        let written = buf.data().to_vec();
        let mut reader = Buffer::from_slice(&written);
        assert_eq!(reader.pull_uint8().unwrap(), 0xAB);
        assert_eq!(reader.pull_uint16().unwrap(), 0x1234);
        assert_eq!(reader.pull_uint32().unwrap(), 0xDEAD_BEEF);
        assert_eq!(reader.pull_bytes(2).unwrap(), b"hi");
        assert!(reader.eof());
    }

    #[test]
    fn write_past_capacity_fails() {
        let mut buf = Buffer::with_capacity(2);
        assert!(buf.push_uint32(1).is_err());
    }

    #[test]
    fn read_past_written_extent_fails() {
        let mut reader = Buffer::from_slice(&[1, 2]);
        assert!(reader.pull_bytes(3).is_err());
    }

    #[test]
    fn patch_in_place_after_seek_back() {
        let mut buf = Buffer::with_capacity(32);
        buf.push_bytes(b"hdr").unwrap();
        let mark = buf.reserve_header_length().unwrap();
        buf.push_bytes(b"payload-bytes").unwrap();
        let end = buf.tell();
        buf.patch_header_length(mark, 0x4000 | 13, 7).unwrap();
        assert_eq!(buf.tell(), end);
        let written = buf.data().to_vec();
        let mut reader = Buffer::from_slice(&written);
        reader.pull_bytes(3).unwrap();
        assert_eq!(reader.pull_uint16().unwrap(), 0x4000 | 13);
        assert_eq!(reader.pull_uint16().unwrap(), 7);
    }
}
