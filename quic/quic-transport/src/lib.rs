// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The QUIC connection-layer state machine: datagram ingestion, CRYPTO-
//! frame routing to an external TLS engine, per-epoch packet-number
//! tracking, and outbound datagram assembly.
//!
//! This crate draws its wire codec from [`quic_core`] and its AEAD and
//! header-protection contexts from [`quic_crypto`]; it owns none of the
//! byte-level encoding itself. TLS 1.3 handshake processing is external
//! to this crate; see [`tls::TlsEndpoint`] for the contract a caller's
//! TLS engine must satisfy.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

pub mod connection;
pub mod epoch_state;
pub mod tls;
pub mod transport_parameters;

pub use connection::{ConfigError, Connection, PendingDatagrams, Role};
pub use tls::{Algorithm, Direction, TlsEndpoint, TlsError, TrafficKeySink};

#[cfg(any(test, feature = "testing"))]
pub use tls::null;
