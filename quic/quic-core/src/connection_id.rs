// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Connection identifiers.
//!
//! Each endpoint selects the connection ID its peer must use to address it.
//! This core picks a fixed 8-byte length for the IDs it generates, well
//! within the wire-format maximum of 20 bytes a peer's CID may carry.

use displaydoc::Display;

/// The length, in bytes, of connection IDs generated by this core.
pub const HOST_CONNECTION_ID_LEN: usize = 8;

/// The wire-format maximum length of a connection ID.
pub const MAX_CONNECTION_ID_LEN: usize = 20;

/// A connection ID could not be built from the given bytes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Display)]
pub enum ConnectionIdError {
    /// connection id length {0} exceeds the wire-format maximum of 20
    TooLong(usize),
}

#[cfg(feature = "std")]
impl std::error::Error for ConnectionIdError {}

/// An opaque, 0-20 byte connection identifier.
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct ConnectionId {
    bytes: [u8; MAX_CONNECTION_ID_LEN],
    len: u8,
}

impl core::fmt::Debug for ConnectionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ConnectionId({:02x?})", self.as_bytes())
    }
}

impl ConnectionId {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConnectionIdError> {
        if bytes.len() > MAX_CONNECTION_ID_LEN {
            return Err(ConnectionIdError::TooLong(bytes.len()));
        }
        let mut array = [0u8; MAX_CONNECTION_ID_LEN];
        array[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            bytes: array,
            len: bytes.len() as u8,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Draws a cryptographically random `HOST_CONNECTION_ID_LEN`-byte ID.
    #[cfg(feature = "rand")]
    pub fn random(rng: &mut dyn rand::RngCore) -> Self {
        let mut bytes = [0u8; HOST_CONNECTION_ID_LEN];
        rng.fill_bytes(&mut bytes);
        Self::from_bytes(&bytes).expect("HOST_CONNECTION_ID_LEN is within MAX_CONNECTION_ID_LEN")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_overlong_ids() {
        let bytes = [0u8; MAX_CONNECTION_ID_LEN + 1];
        assert_eq!(
            ConnectionId::from_bytes(&bytes).unwrap_err(),
            ConnectionIdError::TooLong(MAX_CONNECTION_ID_LEN + 1)
        );
    }

    #[test]
    fn round_trips_bytes() {
        let cid = ConnectionId::from_bytes(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        assert_eq!(cid.as_bytes(), &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(cid.len(), 8);
    }
}
