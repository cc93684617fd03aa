// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Wire-format primitives shared by every layer of the QUIC implementation.
//!
//! This crate knows nothing about QUIC packets or frames; it only provides
//! the cursor-based [`Buffer`] that reads and writes fixed-width big-endian
//! integers and raw byte spans over a fixed-capacity region, and the
//! [`varint`] self-describing integer encoding QUIC layers everything else
//! on top of.
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

pub mod buffer;
pub mod varint;

pub use buffer::{Buffer, BufferError};
pub use varint::{VarInt, VarIntError};
