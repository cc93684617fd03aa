// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

pub mod connection_id;
pub mod epoch;
pub mod frame;
pub mod packet;
pub mod range_set;

pub use connection_id::{ConnectionId, ConnectionIdError};
pub use epoch::Epoch;
pub use range_set::RangeSet;
