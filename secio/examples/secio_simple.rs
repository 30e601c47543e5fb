use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

use log::info;
use meshwire_core::KeyPair;
use meshwire_peerstore::PeerStore;
use meshwire_secio::{handshake, FrameConfig, HandshakeConfig};

fn peer_a_keys() -> KeyPair {
    KeyPair::rsa_from_pkcs8(
        include_bytes!("../test-fixtures/peer-a-private.pk8"),
        include_bytes!("../test-fixtures/peer-a-public.der").to_vec(),
    )
    .expect("fixture key decodes")
}

fn peer_b_keys() -> KeyPair {
    KeyPair::rsa_from_pkcs8(
        include_bytes!("../test-fixtures/peer-b-private.pk8"),
        include_bytes!("../test-fixtures/peer-b-public.der").to_vec(),
    )
    .expect("fixture key decodes")
}

fn main() {
    env_logger::init();

    if std::env::args().nth(1).as_deref() == Some("server") {
        info!("starting server...");
        server();
    } else {
        info!("starting client...");
        client();
    }
}

fn server() {
    let listener = TcpListener::bind("127.0.0.1:1337").unwrap();
    let peer_store = Arc::new(PeerStore::new());
    for stream in listener.incoming() {
        let stream = stream.unwrap();
        let peer_store = peer_store.clone();
        thread::spawn(move || {
            let mut session = handshake(
                stream,
                &peer_b_keys(),
                &peer_store,
                HandshakeConfig::default(),
                FrameConfig::default(),
            )
            .unwrap();
            info!("authenticated peer {}", session.remote_peer_id);
            loop {
                let data = match session.channel.read() {
                    Ok(data) => data,
                    Err(e) => {
                        info!("connection closed: {}", e);
                        return;
                    }
                };
                session.channel.write(&data).unwrap();
            }
        });
    }
}

fn client() {
    let stream = TcpStream::connect("127.0.0.1:1337").unwrap();
    let peer_store = PeerStore::new();
    let mut session = handshake(
        stream,
        &peer_a_keys(),
        &peer_store,
        HandshakeConfig::default(),
        FrameConfig::default(),
    )
    .unwrap();
    info!("authenticated peer {}", session.remote_peer_id);

    session.channel.write(b"hello world").unwrap();
    let echoed = session.channel.read().unwrap();
    info!("received: {:?}", String::from_utf8_lossy(&echoed));
}
