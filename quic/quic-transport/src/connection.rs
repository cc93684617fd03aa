// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The connection-layer state machine: datagram ingestion, CRYPTO-frame
//! routing to the TLS engine, per-epoch packet-number bookkeeping, and
//! outbound datagram assembly.

use alloc::vec::Vec;
use displaydoc::Display;
use quic_codec::Buffer;
use quic_core::connection_id::ConnectionId;
use quic_core::epoch::Epoch;
use quic_core::frame::{self, Frame, FrameError};
use quic_core::packet::{self, Header, LongPacketType, PROTOCOL_VERSION_DRAFT_17};
use rand::RngCore;

use crate::epoch_state::EpochTable;
use crate::tls::{TlsEndpoint, TlsError};
use crate::transport_parameters::{
    CLIENT_TRANSPORT_PARAMETERS, QUIC_TRANSPORT_PARAMETERS_EXTENSION_TYPE,
    SERVER_TRANSPORT_PARAMETERS,
};

/// The maximum size, in bytes, of any datagram this core emits. The
/// client's first flight is padded to exactly this size.
pub const PACKET_MAX_SIZE: usize = 1280;
/// The on-the-wire packet-number length this core always uses, for both
/// send and receive. Full 64-bit packet numbers are tracked internally;
/// only the low two bytes cross the wire, which stops being correct
/// once a packet-number space passes 2^16 packets (see `DESIGN.md`).
pub const SEND_PN_SIZE: usize = 2;
/// Initial capacity of the shared TLS outbound buffer, matching
/// aioquic's reference connection.
const TLS_SEND_BUFFER_CAPACITY: usize = 4096;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Display)]
#[non_exhaustive]
pub enum ConfigError {
    /// a server connection requires a non-empty certificate and private key
    MissingServerCredentials,
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

/// This endpoint's role in the connection, and (for a server) the
/// credentials the external TLS engine was configured with.
///
/// The certificate and private key aren't retained by the connection
/// (the TLS engine owns them); they're presented here purely so
/// construction can fail fast the way aioquic's reference connection
/// does (`assert certificate is not None`) rather than later, mid
/// handshake.
#[derive(Debug, Clone, Copy)]
pub enum Role<'a> {
    Client,
    Server {
        certificate: &'a [u8],
        private_key: &'a [u8],
    },
}

impl Role<'_> {
    fn is_client(&self) -> bool {
        matches!(self, Role::Client)
    }
}

fn get_epoch(packet_type: LongPacketType) -> Epoch {
    match packet_type {
        LongPacketType::Initial => Epoch::Initial,
        LongPacketType::Handshake => Epoch::Handshake,
    }
}

/// An error while processing frames in one packet's decrypted payload.
enum PayloadError {
    Frame(FrameError),
    Tls(TlsError),
}

impl From<FrameError> for PayloadError {
    fn from(err: FrameError) -> Self {
        PayloadError::Frame(err)
    }
}

/// The connection-layer state machine: three epochs advancing in
/// lock-step, driven by datagrams in and producing datagrams out.
pub struct Connection<T> {
    is_client: bool,
    host_cid: ConnectionId,
    peer_cid: ConnectionId,
    peer_cid_set: bool,
    tls: T,
    /// The single buffer the TLS engine writes handshake bytes into,
    /// shared across epochs: whichever epoch's CRYPTO frame is next to
    /// go out drains whatever the TLS engine has appended so far,
    /// regardless of which epoch's incoming CRYPTO frame triggered that
    /// output.
    send_buffer: Vec<u8>,
    send_ack: bool,
    epochs: EpochTable,
    crypto_initialized: bool,
}

impl<T: TlsEndpoint> Connection<T> {
    /// Constructs a connection in the given role, drawing the host and
    /// provisional peer connection IDs from `rng`. `tls` is handed its
    /// role-specific transport-parameters extension immediately; for a
    /// server, `role` must carry a non-empty certificate and private key
    /// or construction fails fast rather than partway through a
    /// handshake.
    pub fn new(role: Role<'_>, mut tls: T, rng: &mut dyn RngCore) -> Result<Self, ConfigError> {
        let is_client = role.is_client();
        match role {
            Role::Client => {
                tls.push_handshake_extension(
                    QUIC_TRANSPORT_PARAMETERS_EXTENSION_TYPE,
                    CLIENT_TRANSPORT_PARAMETERS,
                );
            }
            Role::Server {
                certificate,
                private_key,
            } => {
                if certificate.is_empty() || private_key.is_empty() {
                    return Err(ConfigError::MissingServerCredentials);
                }
                tls.push_handshake_extension(
                    QUIC_TRANSPORT_PARAMETERS_EXTENSION_TYPE,
                    SERVER_TRANSPORT_PARAMETERS,
                );
            }
        }

        Ok(Self {
            is_client,
            host_cid: ConnectionId::random(rng),
            peer_cid: ConnectionId::random(rng),
            peer_cid_set: false,
            tls,
            send_buffer: Vec::with_capacity(TLS_SEND_BUFFER_CAPACITY),
            send_ack: false,
            epochs: EpochTable::new(),
            crypto_initialized: false,
        })
    }

    pub fn host_connection_id(&self) -> &ConnectionId {
        &self.host_cid
    }

    pub fn peer_connection_id(&self) -> &ConnectionId {
        &self.peer_cid
    }

    pub fn is_peer_connection_id_set(&self) -> bool {
        self.peer_cid_set
    }

    pub fn send_ack_pending(&self) -> bool {
        self.send_ack
    }

    pub fn received_packet_numbers(&self, epoch: Epoch) -> &quic_core::RangeSet {
        &self.epochs[epoch].received
    }

    pub fn next_send_packet_number(&self, epoch: Epoch) -> u64 {
        self.epochs[epoch].next_send_pn
    }

    pub fn is_crypto_valid(&self, epoch: Epoch) -> bool {
        self.epochs[epoch].crypto.is_valid()
    }

    /// Starts a client connection: derives Initial keys from the
    /// provisional peer CID and primes the TLS engine with an empty
    /// input, which (for a real engine) writes the ClientHello into the
    /// shared send buffer. A server has nothing to do here; its
    /// Initial keys are derived lazily from the client's first packet.
    pub fn connection_made(&mut self) -> Result<(), TlsError> {
        if !self.is_client {
            return Ok(());
        }

        self.epochs[Epoch::Initial].crypto =
            quic_crypto::CryptoPair::setup_initial(self.peer_cid.as_bytes(), true);
        self.crypto_initialized = true;

        self.tls
            .handle_message(&[], &mut self.send_buffer, &mut self.epochs)
    }

    /// Ingests one UDP datagram, which may carry one or more coalesced
    /// QUIC packets. Parse failures, decryption failures, and malformed
    /// frames abandon the rest of the datagram without mutating
    /// connection state further; only a fault from the TLS engine
    /// itself is propagated to the caller.
    pub fn datagram_received(&mut self, datagram: &[u8]) -> Result<(), TlsError> {
        let mut offset = 0;
        while offset < datagram.len() {
            match self.process_one_packet(datagram, offset)? {
                Some(next_offset) => offset = next_offset,
                None => break,
            }
        }
        Ok(())
    }

    /// Processes a single packet starting at `datagram[start..]`,
    /// returning the offset of the byte just past it, or `None` if the
    /// packet was abandoned (header parse failure, decryption failure,
    /// or a malformed frame within its payload).
    fn process_one_packet(
        &mut self,
        datagram: &[u8],
        start: usize,
    ) -> Result<Option<usize>, TlsError> {
        let mut header_buf = Buffer::from_slice(&datagram[start..]);
        let header = match packet::parse(&mut header_buf, self.host_cid.len()) {
            Ok(header) => header,
            Err(err) => {
                tracing::debug!(?err, "failed to parse packet header; abandoning datagram");
                return Ok(None);
            }
        };
        let pn_offset = header_buf.tell();

        let (epoch, source_cid, end) = match &header {
            Header::Long(long_header) => {
                let end = start + pn_offset + long_header.rest_length;
                if end > datagram.len() {
                    tracing::debug!("packet length overruns datagram; abandoning datagram");
                    return Ok(None);
                }
                (
                    get_epoch(long_header.packet_type),
                    Some(long_header.source_cid),
                    end,
                )
            }
            Header::Short(_) => (Epoch::OneRtt, None, datagram.len()),
        };

        if !self.is_client && !self.crypto_initialized {
            self.epochs[Epoch::Initial].crypto =
                quic_crypto::CryptoPair::setup_initial(header.destination_cid().as_bytes(), false);
            self.crypto_initialized = true;
        }

        let mut packet_bytes = datagram[start..end].to_vec();
        let (_plain_header, plain_payload, packet_number) =
            match self.epochs[epoch].crypto.decrypt_packet(&mut packet_bytes, pn_offset) {
                Ok(parts) => parts,
                Err(err) => {
                    tracing::debug!(?err, %epoch, "failed to decrypt packet; abandoning datagram");
                    return Ok(None);
                }
            };

        if !self.peer_cid_set {
            if let Some(source_cid) = source_cid {
                self.peer_cid = source_cid;
                self.peer_cid_set = true;
            }
        }

        let is_ack_only = match self.handle_payload(plain_payload) {
            Ok(ack_eliciting) => !ack_eliciting,
            Err(PayloadError::Tls(err)) => return Err(err),
            Err(PayloadError::Frame(err)) => {
                tracing::debug!(?err, "malformed frame in packet payload; abandoning datagram");
                return Ok(None);
            }
        };

        self.epochs[epoch].received.insert(packet_number);
        if !is_ack_only {
            self.send_ack = true;
        }

        //= https://www.rfc-editor.org/rfc/rfc9001#section-4.9.1
        //# Endpoints MUST discard their Initial keys when they first
        //# successfully process a Handshake packet.
        if matches!(epoch, Epoch::Handshake) {
            self.epochs[Epoch::Initial].crypto.teardown();
        }

        Ok(Some(end))
    }

    /// Walks every frame in a decrypted packet's payload, routing CRYPTO
    /// data to the TLS engine, and reports whether the payload elicited
    /// an ACK (contained anything beyond PADDING/ACK frames).
    fn handle_payload(&mut self, payload: &[u8]) -> Result<bool, PayloadError> {
        let mut buffer = Buffer::from_slice(payload);
        let mut tls_fault: Option<TlsError> = None;

        let ack_eliciting = frame::walk_payload(&mut buffer, |frame| {
            if let Frame::Crypto(crypto) = frame {
                if tls_fault.is_none() {
                    if let Err(err) =
                        self.tls
                            .handle_message(crypto.data, &mut self.send_buffer, &mut self.epochs)
                    {
                        tls_fault = Some(err);
                    }
                }
            }
            Ok(())
        })?;

        if let Some(err) = tls_fault {
            return Err(PayloadError::Tls(err));
        }
        Ok(ack_eliciting)
    }

    /// Produces a lazy, at-most-three-item sequence of outbound
    /// datagrams: Initial, then Handshake, then 1-RTT, each present
    /// only if that epoch actually has something to send.
    pub fn pending_datagrams(&mut self) -> PendingDatagrams<'_, T> {
        PendingDatagrams {
            connection: self,
            stage: Stage::Initial,
        }
    }

    /// Emits one Initial or Handshake packet, or `None` if send crypto
    /// isn't installed yet or the shared TLS outbound buffer is empty.
    /// An ACK-only packet never rides a long header; it waits for the
    /// 1-RTT short header in `write_application_packet`, matching
    /// aioquic's reference `_write_handshake`.
    fn write_handshake_packet(&mut self, epoch: Epoch) -> Option<Vec<u8>> {
        if !self.epochs[epoch].crypto.is_valid() || self.send_buffer.is_empty() {
            return None;
        }

        let packet_type = match epoch {
            Epoch::Initial => LongPacketType::Initial,
            Epoch::Handshake => LongPacketType::Handshake,
            Epoch::OneRtt => unreachable!("1-RTT has no long header"),
        };

        let mut buffer = Buffer::with_capacity(PACKET_MAX_SIZE);
        let (mark, header_size) = packet::long::emit(
            &mut buffer,
            PROTOCOL_VERSION_DRAFT_17,
            packet_type,
            SEND_PN_SIZE as u8,
            &self.peer_cid,
            &self.host_cid,
        )
        .expect("PACKET_MAX_SIZE comfortably fits a long header");

        frame::Crypto::emit(&mut buffer, &self.send_buffer)
            .expect("the TLS engine's output fits within PACKET_MAX_SIZE");
        self.send_buffer.clear();

        let tag_size = self.epochs[epoch].crypto.aead_tag_size();
        if epoch.is_initial() {
            let current = buffer.tell();
            let pad_len = PACKET_MAX_SIZE.saturating_sub(tag_size).saturating_sub(current);
            if pad_len > 0 {
                let padding = alloc::vec![0u8; pad_len];
                buffer
                    .push_bytes(&padding)
                    .expect("padding was sized to the buffer's remaining capacity");
            }
        }

        if self.send_ack && !self.epochs[epoch].received.is_empty() {
            frame::Ack::emit(&mut buffer, &self.epochs[epoch].received)
                .expect("an ACK over this epoch's range set fits within PACKET_MAX_SIZE");
            self.send_ack = false;
        }

        let payload_len = buffer.tell() - header_size;
        let length = (payload_len + SEND_PN_SIZE + tag_size) as u16;
        let pn = self.epochs[epoch].next_send_pn;
        buffer
            .patch_header_length(mark, length | 0x4000, pn as u16)
            .expect("mark was reserved within this buffer");

        let mut datagram = buffer.data().to_vec();
        let mut payload = datagram.split_off(header_size);
        if let Err(err) = self.epochs[epoch].crypto.encrypt_packet(pn, &mut datagram, &mut payload) {
            tracing::warn!(?err, %epoch, "failed to encrypt outbound handshake packet");
            return None;
        }
        datagram.extend_from_slice(&payload);

        self.epochs[epoch].next_send_pn += 1;
        Some(datagram)
    }

    /// Emits one 1-RTT short-header packet, or `None` if send crypto
    /// isn't installed yet or there is nothing in this epoch's range set
    /// to acknowledge. This revision has no streams, so a 1-RTT packet
    /// only ever carries an ACK (or nothing, if one was already sent).
    fn write_application_packet(&mut self) -> Option<Vec<u8>> {
        let epoch = Epoch::OneRtt;
        if !self.epochs[epoch].crypto.is_valid() || self.epochs[epoch].received.is_empty() {
            return None;
        }

        let mut buffer = Buffer::with_capacity(PACKET_MAX_SIZE);
        packet::short::emit(&mut buffer, SEND_PN_SIZE as u8, &self.peer_cid)
            .expect("PACKET_MAX_SIZE comfortably fits a short header");
        let pn = self.epochs[epoch].next_send_pn;
        buffer
            .push_uint16(pn as u16)
            .expect("PACKET_MAX_SIZE comfortably fits a 2-byte packet number");
        let header_size = buffer.tell();

        if self.send_ack && !self.epochs[epoch].received.is_empty() {
            frame::Ack::emit(&mut buffer, &self.epochs[epoch].received)
                .expect("an ACK over this epoch's range set fits within PACKET_MAX_SIZE");
            self.send_ack = false;
        }

        let mut datagram = buffer.data().to_vec();
        let mut payload = datagram.split_off(header_size);
        if let Err(err) = self.epochs[epoch].crypto.encrypt_packet(pn, &mut datagram, &mut payload) {
            tracing::warn!(?err, "failed to encrypt outbound 1-RTT packet");
            return None;
        }
        datagram.extend_from_slice(&payload);

        self.epochs[epoch].next_send_pn += 1;
        Some(datagram)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum Stage {
    Initial,
    Handshake,
    OneRtt,
    Done,
}

/// The explicit iterator [`Connection::pending_datagrams`] returns.
///
/// A drain-into-callback API (`drain(sink)`) would avoid the lifetime
/// entirely, but a plain iterator avoids allocating a vector for the
/// common case of zero or one outbound datagram.
pub struct PendingDatagrams<'a, T> {
    connection: &'a mut Connection<T>,
    stage: Stage,
}

impl<'a, T: TlsEndpoint> Iterator for PendingDatagrams<'a, T> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        loop {
            let datagram = match self.stage {
                Stage::Initial => {
                    self.stage = Stage::Handshake;
                    self.connection.write_handshake_packet(Epoch::Initial)
                }
                Stage::Handshake => {
                    self.stage = Stage::OneRtt;
                    self.connection.write_handshake_packet(Epoch::Handshake)
                }
                Stage::OneRtt => {
                    self.stage = Stage::Done;
                    self.connection.write_application_packet()
                }
                Stage::Done => return None,
            };

            if datagram.is_some() {
                return datagram;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tls::null::{NullTls, CLIENT_HELLO, SERVER_HELLO};
    use rand::rngs::mock::StepRng;

    fn client(rng: &mut StepRng) -> Connection<NullTls> {
        Connection::new(Role::Client, NullTls::new(true), rng).unwrap()
    }

    fn server(rng: &mut StepRng) -> Connection<NullTls> {
        Connection::new(
            Role::Server {
                certificate: b"cert",
                private_key: b"key",
            },
            NullTls::new(false),
            rng,
        )
        .unwrap()
    }

    #[test]
    fn server_without_credentials_fails_fast() {
        let mut rng = StepRng::new(1, 1);
        let err = Connection::new(
            Role::Server {
                certificate: b"",
                private_key: b"key",
            },
            NullTls::new(false),
            &mut rng,
        )
        .unwrap_err();
        assert_eq!(err, ConfigError::MissingServerCredentials);
    }

    // S1: client first flight is exactly one 1280-byte Initial datagram
    // carrying the ClientHello, padded to size.
    #[test]
    fn client_first_flight_is_a_single_padded_initial_datagram() {
        let mut rng = StepRng::new(0x0102_0304_0506_0708, 0x1112_1314_1516_1718);
        let mut client = client(&mut rng);
        client.connection_made().unwrap();

        let datagrams: Vec<_> = client.pending_datagrams().collect();
        assert_eq!(datagrams.len(), 1);
        assert_eq!(datagrams[0].len(), PACKET_MAX_SIZE);
        assert_eq!(datagrams[0][0] & 0xf0, 0xc0); // long header, Initial type bits
    }

    // S2: feeding the client's first flight to a server yields an
    // Initial response carrying the ServerHello and an ACK for packet 0;
    // send_ack clears after the drain.
    #[test]
    fn server_acks_the_clients_first_initial_packet() {
        let mut client_rng = StepRng::new(1, 1);
        let mut server_rng = StepRng::new(2, 2);
        let mut client = client(&mut client_rng);
        client.connection_made().unwrap();
        let flight: Vec<_> = client.pending_datagrams().collect();

        let mut server = server(&mut server_rng);
        server.datagram_received(&flight[0]).unwrap();
        assert!(server.send_ack_pending());
        assert!(server
            .received_packet_numbers(Epoch::Initial)
            .contains(0));

        let response: Vec<_> = server.pending_datagrams().collect();
        assert_eq!(response.len(), 1);
        assert!(!server.send_ack_pending());
    }

    // S3: once the single handshake round trip completes, both sides have
    // 1-RTT secrets installed. The TLS engine has nothing further to say
    // and the client has received nothing yet at the 1-RTT epoch, so the
    // outstanding Initial-epoch ACK has no packet to ride on and nothing
    // is emitted (per spec.md's handshake-emission gate, a long-header
    // packet always carries CRYPTO data; a bare ACK waits for 1-RTT).
    // Once a peer has something to acknowledge at 1-RTT, it answers with
    // a short-header datagram carrying only an ACK frame.
    #[test]
    fn handshake_completion_installs_one_rtt_secrets_on_both_sides() {
        let mut client_rng = StepRng::new(10, 1);
        let mut server_rng = StepRng::new(20, 1);
        let mut client = client(&mut client_rng);
        let mut server = server(&mut server_rng);

        client.connection_made().unwrap();
        let client_flight: Vec<_> = client.pending_datagrams().collect();
        server.datagram_received(&client_flight[0]).unwrap();

        let server_flight: Vec<_> = server.pending_datagrams().collect();
        assert_eq!(server_flight.len(), 1);
        assert!(server.is_crypto_valid(Epoch::Handshake));
        assert!(server.is_crypto_valid(Epoch::OneRtt));

        client.datagram_received(&server_flight[0]).unwrap();
        assert!(client.is_crypto_valid(Epoch::Handshake));
        assert!(client.is_crypto_valid(Epoch::OneRtt));
        assert!(client.send_ack_pending());

        let client_second: Vec<_> = client.pending_datagrams().collect();
        assert!(client_second.is_empty());

        // Hand-build a 1-RTT PING packet from client to server so the
        // server has something to acknowledge at that epoch.
        let epoch = Epoch::OneRtt;
        let pn = client.next_send_packet_number(epoch);
        let mut ping_payload = Buffer::with_capacity(4);
        quic_codec::VarInt::new(frame::PING_TAG as u64)
            .unwrap()
            .encode(&mut ping_payload)
            .unwrap();
        let mut payload = ping_payload.data().to_vec();

        let mut header = Buffer::with_capacity(32);
        packet::short::emit(&mut header, SEND_PN_SIZE as u8, server.host_connection_id()).unwrap();
        header.push_uint16(pn as u16).unwrap();
        let mut header_bytes = header.data().to_vec();
        client.epochs[epoch]
            .crypto
            .encrypt_packet(pn, &mut header_bytes, &mut payload)
            .unwrap();
        header_bytes.extend_from_slice(&payload);

        server.datagram_received(&header_bytes).unwrap();
        assert!(server.received_packet_numbers(epoch).contains(pn));
        assert!(server.send_ack_pending());

        let server_one_rtt: Vec<_> = server.pending_datagrams().collect();
        assert_eq!(server_one_rtt.len(), 1);
        assert_eq!(server_one_rtt[0][0] & 0x80, 0); // short header, not long
        assert!(!server.send_ack_pending());
    }

    // S4: feeding the same Initial datagram twice leaves the range set
    // with a single member and emits exactly one ACK.
    #[test]
    fn duplicate_datagram_is_idempotent_in_the_range_set() {
        let mut client_rng = StepRng::new(3, 1);
        let mut server_rng = StepRng::new(4, 1);
        let mut client = client(&mut client_rng);
        client.connection_made().unwrap();
        let flight: Vec<_> = client.pending_datagrams().collect();

        let mut server = server(&mut server_rng);
        server.datagram_received(&flight[0]).unwrap();
        server.datagram_received(&flight[0]).unwrap();

        assert_eq!(server.received_packet_numbers(Epoch::Initial).len(), 1);
        assert!(server.received_packet_numbers(Epoch::Initial).contains(0));

        let responses: Vec<_> = server.pending_datagrams().collect();
        assert_eq!(responses.len(), 1);
    }

    // S5: a datagram carrying a valid Initial followed by a valid
    // Handshake packet yields two successful decryptions.
    #[test]
    fn coalesced_initial_and_handshake_both_decrypt() {
        let mut client_rng = StepRng::new(5, 1);
        let mut server_rng = StepRng::new(6, 1);
        let mut client = client(&mut client_rng);
        let mut server = server(&mut server_rng);

        client.connection_made().unwrap();
        let client_flight: Vec<_> = client.pending_datagrams().collect();
        server.datagram_received(&client_flight[0]).unwrap();
        let server_flight: Vec<_> = server.pending_datagrams().collect();
        client.datagram_received(&server_flight[0]).unwrap();

        // The client now has both an Initial ACK and a Handshake flight
        // queued; coalesce them into one datagram the way a sender would.
        let mut coalesced = Vec::new();
        for datagram in client.pending_datagrams() {
            coalesced.extend_from_slice(&datagram);
        }
        assert!(!coalesced.is_empty());

        let mut second_server_rng = StepRng::new(7, 1);
        let mut fresh_server = server(&mut second_server_rng);
        fresh_server.datagram_received(&client_flight[0]).unwrap();
        fresh_server.datagram_received(&coalesced).unwrap();
        assert!(fresh_server
            .received_packet_numbers(Epoch::Initial)
            .contains(1));
    }

    // S6: an unrecognized frame type still lets packet number tracking
    // and a preceding PING through before the walk stops.
    #[test]
    fn unknown_frame_type_stops_the_walk_but_still_acks() {
        let mut client_rng = StepRng::new(8, 1);
        let mut server_rng = StepRng::new(9, 1);
        let mut client = client(&mut client_rng);
        let mut server = server(&mut server_rng);

        client.connection_made().unwrap();
        let client_flight: Vec<_> = client.pending_datagrams().collect();
        server.datagram_received(&client_flight[0]).unwrap();
        let server_flight: Vec<_> = server.pending_datagrams().collect();
        client.datagram_received(&server_flight[0]).unwrap();
        for datagram in client.pending_datagrams() {
            server.datagram_received(&datagram).unwrap();
        }

        // Hand-build a 1-RTT payload: PING (0x01) then an unknown type (0x3f).
        let mut payload = Buffer::with_capacity(8);
        quic_codec::VarInt::new(0x01).unwrap().encode(&mut payload).unwrap();
        quic_codec::VarInt::new(0x3f).unwrap().encode(&mut payload).unwrap();
        let payload_bytes = payload.data().to_vec();

        let epoch = Epoch::OneRtt;
        assert!(server.is_crypto_valid(epoch));
        assert!(client.is_crypto_valid(epoch));
        let pn = client.next_send_packet_number(epoch);
        let mut header = Buffer::with_capacity(32);
        packet::short::emit(&mut header, SEND_PN_SIZE as u8, server.host_connection_id()).unwrap();
        header.push_uint16(pn as u16).unwrap();
        let mut header_bytes = header.data().to_vec();
        let mut payload_for_client = payload_bytes.clone();
        client.epochs[epoch]
            .crypto
            .encrypt_packet(pn, &mut header_bytes, &mut payload_for_client)
            .unwrap();
        header_bytes.extend_from_slice(&payload_for_client);

        server.datagram_received(&header_bytes).unwrap();
        assert!(server.received_packet_numbers(epoch).contains(pn));
        assert!(server.send_ack_pending());
    }
}
