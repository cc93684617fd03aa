// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! AEAD packet protection and header protection for the QUIC draft-17
//! wire format, backed by `ring`.
//!
//! This crate knows how to turn a plaintext header and payload into a
//! protected datagram and back, for one encryption level at a time. It
//! does not know about packet or frame structure, connection IDs, or the
//! TLS handshake that drives key installation; those live in
//! `quic-core` and `quic-transport` respectively.
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

pub mod label;
pub mod pair;

pub use pair::{Algorithm, CryptoError, CryptoPair, Direction, AEAD_TAG_SIZE};
