//! The secio [`ProtocolHandler`] registered with the Protocol Dispatcher (spec §4.3; grounded on
//! `libp2p_secio_can_handle` / `libp2p_secio_handle_message` / `libp2p_secio_shutdown` and on
//! `include/libp2p/net/protocol.h`'s `CanHandle`/`HandleMessage`/`Shutdown` shape, which
//! `multistream_select::dispatch::ProtocolHandler` already mirrors directly).

use std::io::{Read, Write};

use meshwire_core::KeyPair;
use meshwire_peerstore::PeerStore;
use meshwire_secio::{handshake, FrameConfig, HandshakeConfig, Session};
use multistream_select::{DispatchOutcome, ProtocolHandler};

/// The raw stream plus the eventual handshake outcome, threaded through the Dispatcher the same
/// way the C reference threads a `SessionContext` through `HandleMessage` (spec §4.3).
pub struct ConnectionContext<T> {
    stream: Option<T>,
    pub result: Option<Session<T>>,
}

impl<T> ConnectionContext<T> {
    pub fn new(stream: T) -> ConnectionContext<T> {
        ConnectionContext {
            stream: Some(stream),
            result: None,
        }
    }
}

/// Recognizes the negotiated secio protocol identifier and runs the handshake over the
/// connection's raw stream (spec §4.3: "each handler returns ... continue, stop, or fatal error").
///
/// Holds a `&'a PeerStore` because the handshake itself must evict any stale session for the
/// remote's peer-id as soon as Phase 1 learns it, independent of whether the handshake that
/// follows succeeds or fails (spec §4.4 Phase 1, §7).
pub struct SecioHandler<'a> {
    local_keys: KeyPair,
    peer_store: &'a PeerStore,
    handshake_config: HandshakeConfig,
    frame_config: FrameConfig,
}

impl<'a> SecioHandler<'a> {
    pub fn new(
        local_keys: KeyPair,
        peer_store: &'a PeerStore,
        handshake_config: HandshakeConfig,
        frame_config: FrameConfig,
    ) -> SecioHandler<'a> {
        SecioHandler {
            local_keys,
            peer_store,
            handshake_config,
            frame_config,
        }
    }
}

impl<'a, T: Read + Write> ProtocolHandler<ConnectionContext<T>> for SecioHandler<'a> {
    type Error = meshwire_secio::SecioError;

    fn can_handle(&self, payload: &[u8]) -> bool {
        // Matches `libp2p_secio_can_handle`'s `incoming_size >= 11` sanity floor plus a prefix
        // check against the identifier, rather than exact equality, so a trailing `\n` or a
        // future versioned suffix still dispatches here.
        payload.len() >= 11 && payload.starts_with(b"/ipfs/secio")
    }

    fn handle(&mut self, _payload: &[u8], session: &mut ConnectionContext<T>) -> DispatchOutcome<Self::Error> {
        let stream = match session.stream.take() {
            Some(s) => s,
            None => {
                return DispatchOutcome::Error(meshwire_secio::SecioError::Transport(
                    "connection stream already consumed".into(),
                ))
            }
        };
        match handshake(stream, &self.local_keys, self.peer_store, self.handshake_config, self.frame_config) {
            Ok(established) => {
                session.result = Some(established);
                DispatchOutcome::Stop
            }
            Err(e) => DispatchOutcome::Error(e),
        }
    }
}

/// Registers a [`PeerStore`] replacement of the handshake's resulting session once dispatch has
/// produced one. Split out from [`SecioHandler::handle`] because the peer store update needs
/// `T: meshwire_secio::session::CloseStream`-equivalent bounds that the handler itself is generic
/// over and doesn't need.
pub fn record_session<T>(peer_store: &PeerStore, session: Session<T>)
where
    T: Send + 'static,
    Session<T>: meshwire_peerstore::PeerSession,
{
    let peer_id = session.remote_peer_id.clone();
    peer_store.replace_session(&peer_id, Box::new(session));
}
