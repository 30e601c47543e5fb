use std::net::{TcpListener, TcpStream};
use std::thread;

use log::info;
use meshwire_core::KeyPair;
use meshwire_net::dispatch::record_session;
use meshwire_net::{accept, dial};
use meshwire_peerstore::PeerStore;
use meshwire_secio::{FrameConfig, HandshakeConfig};

fn peer_a_keys() -> KeyPair {
    KeyPair::rsa_from_pkcs8(
        include_bytes!("../../secio/test-fixtures/peer-a-private.pk8"),
        include_bytes!("../../secio/test-fixtures/peer-a-public.der").to_vec(),
    )
    .expect("fixture key decodes")
}

fn peer_b_keys() -> KeyPair {
    KeyPair::rsa_from_pkcs8(
        include_bytes!("../../secio/test-fixtures/peer-b-private.pk8"),
        include_bytes!("../../secio/test-fixtures/peer-b-public.der").to_vec(),
    )
    .expect("fixture key decodes")
}

fn main() {
    env_logger::init();

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let server_store = PeerStore::new();
    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let session = accept(
            stream,
            peer_b_keys(),
            &server_store,
            FrameConfig::default(),
            HandshakeConfig::default(),
        )
        .unwrap();
        info!("server authenticated peer {}", session.remote_peer_id);
        record_session(&server_store, session);
    });

    let client_store = PeerStore::new();
    let stream = TcpStream::connect(addr).unwrap();
    let session = dial(
        stream,
        &peer_a_keys(),
        &client_store,
        FrameConfig::default(),
        HandshakeConfig::default(),
    )
    .unwrap();
    info!("client authenticated peer {}", session.remote_peer_id);
    record_session(&client_store, session);

    server.join().unwrap();
}
