// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The three parallel per-epoch records the connection drives in
//! lock-step.
//!
//! Three separate maps keyed by epoch (crypto pairs, range sets,
//! packet-number counters) is exactly the shape that turns into a bug
//! the day one of them is updated and another isn't; a fixed-size array
//! of one record per epoch makes "every epoch has exactly one of each"
//! structural instead of an invariant callers have to maintain by hand.

use core::ops::{Index, IndexMut};
use quic_core::{Epoch, RangeSet};
use quic_crypto::{Algorithm, CryptoPair, Direction};

use crate::tls::TrafficKeySink;

/// One epoch's crypto pair, received-packet-number log, and outbound
/// packet-number counter.
#[derive(Default)]
pub struct EpochState {
    pub crypto: CryptoPair,
    pub received: RangeSet,
    pub next_send_pn: u64,
}

/// A fixed-size, epoch-indexed array of [`EpochState`], the structural
/// form of "the three crypto pairs, three range sets, three packet-number
/// counters are created together and share their epoch key".
#[derive(Default)]
pub struct EpochTable([EpochState; Epoch::COUNT]);

impl EpochTable {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Index<Epoch> for EpochTable {
    type Output = EpochState;

    fn index(&self, epoch: Epoch) -> &EpochState {
        &self.0[epoch.as_index()]
    }
}

impl IndexMut<Epoch> for EpochTable {
    fn index_mut(&mut self, epoch: Epoch) -> &mut EpochState {
        &mut self.0[epoch.as_index()]
    }
}

impl TrafficKeySink for EpochTable {
    fn install_traffic_key(
        &mut self,
        direction: Direction,
        epoch: Epoch,
        algorithm: Algorithm,
        secret: &[u8],
    ) {
        self[epoch].crypto.setup(direction, algorithm, secret);
    }
}
