// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The contract this core expects from an external TLS 1.3 engine.
//!
//! The TLS state machine itself is out of scope (§1 of the design): this
//! module only fixes the shape of the black box the connection talks to.
//! A real implementation backs [`TlsEndpoint`] with a TLS 1.3 library's
//! handshake state machine; [`null::NullTls`] is a fixed-byte test double
//! used by this crate's own tests.

use alloc::vec::Vec;
use displaydoc::Display;
pub use quic_crypto::{Algorithm, Direction};
use quic_core::Epoch;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Display)]
#[non_exhaustive]
pub enum TlsError {
    /// the external TLS engine rejected a handshake message it was given
    Rejected,
}

#[cfg(feature = "std")]
impl std::error::Error for TlsError {}

/// The sink a TLS engine's `update_traffic_key_cb(direction, epoch,
/// secret)` callback installs keys through, per connection.
///
/// An explicit trait object the connection owns and lends to the TLS
/// engine for the duration of one `handle_message` call, rather than a
/// closure holding a reference to connection internals for the whole
/// handshake.
pub trait TrafficKeySink {
    fn install_traffic_key(
        &mut self,
        direction: Direction,
        epoch: Epoch,
        algorithm: Algorithm,
        secret: &[u8],
    );
}

/// The contract between the connection and an external TLS 1.3 engine.
///
/// `handle_message` is the engine's only entry point: it synchronously
/// consumes handshake bytes addressed to it (or, at connection start, an
/// empty slice to prime the first flight), appends any response bytes to
/// `output`, and may call back into `sink` zero or more times to install
/// newly available traffic secrets.
pub trait TlsEndpoint {
    fn handle_message(
        &mut self,
        input: &[u8],
        output: &mut Vec<u8>,
        sink: &mut dyn TrafficKeySink,
    ) -> Result<(), TlsError>;

    /// The injection point for the QUIC transport parameters extension;
    /// called once at connection construction with this endpoint's
    /// role-specific opaque blob (see [`crate::transport_parameters`]).
    fn push_handshake_extension(&mut self, extension_type: u16, data: &[u8]);
}

/// A fixed-byte test double standing in for a real TLS 1.3 engine.
///
/// Performs no real cryptographic negotiation, instead advancing through
/// a three-state handshake (`Start` -> `SentHello` -> `Done`) that emits
/// fixed ClientHello/ServerHello-shaped bytes and installs fixed traffic
/// secrets, enough to exercise every epoch transition the connection
/// state machine drives. Both directions of a given epoch are installed
/// from the same fixed secret, a real TLS 1.3 key schedule never does
/// this, but a null double has no reason to keep them distinct.
#[cfg(any(test, feature = "testing"))]
pub mod null {
    use super::*;

    pub const CLIENT_HELLO: &[u8] = b"null-tls/client-hello";
    pub const SERVER_HELLO: &[u8] = b"null-tls/server-hello";

    const HANDSHAKE_SECRET: [u8; 32] = [0x11; 32];
    const ONE_RTT_SECRET: [u8; 32] = [0x22; 32];

    #[derive(Debug, Clone, Copy, Eq, PartialEq)]
    enum State {
        Start,
        SentHello,
        Done,
    }

    #[derive(Debug)]
    pub struct NullTls {
        is_client: bool,
        state: State,
        extensions: Vec<(u16, Vec<u8>)>,
    }

    impl NullTls {
        pub fn new(is_client: bool) -> Self {
            Self {
                is_client,
                state: State::Start,
                extensions: Vec::new(),
            }
        }

        pub fn is_handshake_done(&self) -> bool {
            self.state == State::Done
        }

        pub fn handshake_extensions(&self) -> &[(u16, Vec<u8>)] {
            &self.extensions
        }
    }

    fn install_epoch(sink: &mut dyn TrafficKeySink, epoch: Epoch, secret: &[u8]) {
        sink.install_traffic_key(Direction::Encrypt, epoch, Algorithm::Aes128GcmSha256, secret);
        sink.install_traffic_key(Direction::Decrypt, epoch, Algorithm::Aes128GcmSha256, secret);
    }

    impl TlsEndpoint for NullTls {
        fn handle_message(
            &mut self,
            input: &[u8],
            output: &mut Vec<u8>,
            sink: &mut dyn TrafficKeySink,
        ) -> Result<(), TlsError> {
            match (self.is_client, self.state) {
                (true, State::Start) => {
                    output.extend_from_slice(CLIENT_HELLO);
                    self.state = State::SentHello;
                }
                (false, State::Start) => {
                    if input != CLIENT_HELLO {
                        return Err(TlsError::Rejected);
                    }
                    output.extend_from_slice(SERVER_HELLO);
                    install_epoch(sink, Epoch::Handshake, &HANDSHAKE_SECRET);
                    install_epoch(sink, Epoch::OneRtt, &ONE_RTT_SECRET);
                    self.state = State::Done;
                }
                (true, State::SentHello) => {
                    if input != SERVER_HELLO {
                        return Err(TlsError::Rejected);
                    }
                    install_epoch(sink, Epoch::Handshake, &HANDSHAKE_SECRET);
                    install_epoch(sink, Epoch::OneRtt, &ONE_RTT_SECRET);
                    self.state = State::Done;
                }
                (_, State::Done) | (false, State::SentHello) => {
                    // Nothing left to negotiate; a real engine would route
                    // post-handshake messages (session tickets, key
                    // updates) here, both out of scope for this core.
                }
            }
            Ok(())
        }

        fn push_handshake_extension(&mut self, extension_type: u16, data: &[u8]) {
            self.extensions.push((extension_type, data.to_vec()));
        }
    }
}
