// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! End-to-end exercises of the connection state machine through its
//! public API only, using the fixed-byte `NullTls` double in place of a
//! real TLS 1.3 engine.

use quic_core::Epoch;
use quic_transport::tls::null::NullTls;
use quic_transport::{Connection, Role};
use rand::rngs::mock::StepRng;

fn client(seed: u64) -> Connection<NullTls> {
    let mut rng = StepRng::new(seed, 1);
    Connection::new(Role::Client, NullTls::new(true), &mut rng).unwrap()
}

fn server(seed: u64) -> Connection<NullTls> {
    let mut rng = StepRng::new(seed, 1);
    Connection::new(
        Role::Server {
            certificate: b"test-certificate",
            private_key: b"test-private-key",
        },
        NullTls::new(false),
        &mut rng,
    )
    .unwrap()
}

#[test]
fn client_first_flight_is_one_padded_initial_datagram() {
    let mut client = client(1);
    client.connection_made().unwrap();

    let flight: Vec<_> = client.pending_datagrams().collect();
    assert_eq!(flight.len(), 1);
    assert_eq!(flight[0].len(), quic_transport::connection::PACKET_MAX_SIZE);
}

#[test]
fn server_processes_the_clients_first_flight_and_installs_handshake_secrets() {
    let mut client = client(2);
    let mut server = server(3);

    client.connection_made().unwrap();
    let flight: Vec<_> = client.pending_datagrams().collect();

    server.datagram_received(&flight[0]).unwrap();
    assert!(server.is_crypto_valid(Epoch::Handshake));
    assert!(server.is_crypto_valid(Epoch::OneRtt));
    assert!(server.send_ack_pending());
    assert!(server.received_packet_numbers(Epoch::Initial).contains(0));

    let response: Vec<_> = server.pending_datagrams().collect();
    assert_eq!(response.len(), 1);
    assert!(!server.send_ack_pending());
}

#[test]
fn duplicate_first_flight_does_not_grow_the_receive_set() {
    let mut client = client(4);
    let mut server = server(5);

    client.connection_made().unwrap();
    let flight: Vec<_> = client.pending_datagrams().collect();

    server.datagram_received(&flight[0]).unwrap();
    server.datagram_received(&flight[0]).unwrap();

    assert_eq!(server.received_packet_numbers(Epoch::Initial).len(), 1);
    let responses: Vec<_> = server.pending_datagrams().collect();
    assert_eq!(responses.len(), 1);
}

#[test]
fn coalescing_the_clients_two_datagrams_still_decrypts_both() {
    let mut client = client(6);
    let mut server = server(7);

    client.connection_made().unwrap();
    let first_flight: Vec<_> = client.pending_datagrams().collect();
    server.datagram_received(&first_flight[0]).unwrap();
    let server_flight: Vec<_> = server.pending_datagrams().collect();
    client.datagram_received(&server_flight[0]).unwrap();

    let mut coalesced = Vec::new();
    for datagram in client.pending_datagrams() {
        coalesced.extend_from_slice(&datagram);
    }
    assert!(!coalesced.is_empty());

    let mut fresh_server = server(8);
    fresh_server.datagram_received(&first_flight[0]).unwrap();
    fresh_server.datagram_received(&coalesced).unwrap();

    assert!(fresh_server.received_packet_numbers(Epoch::Initial).len() >= 2);
}

#[test]
fn handshake_completes_with_one_rtt_secrets_on_both_ends() {
    let mut client = client(9);
    let mut server = server(10);

    client.connection_made().unwrap();
    let first_flight: Vec<_> = client.pending_datagrams().collect();
    server.datagram_received(&first_flight[0]).unwrap();
    let server_flight: Vec<_> = server.pending_datagrams().collect();
    client.datagram_received(&server_flight[0]).unwrap();

    assert!(client.is_crypto_valid(Epoch::OneRtt));
    assert!(server.is_crypto_valid(Epoch::OneRtt));
}
