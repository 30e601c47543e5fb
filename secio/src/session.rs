//! The handshake's end product: a [`Session`] pairing a negotiated [`SecureChannel`] with the
//! remote peer's identity and the algorithms both sides agreed on (spec §3, "Session").

use std::io::{Read, Write};
use std::net::TcpStream;

use meshwire_core::PeerId;
use meshwire_peerstore::PeerSession;

use crate::secure_channel::SecureChannel;

/// Lets [`Session`] tear its stream down when the peer store replaces it with a fresher
/// connection (spec §7), without requiring every possible `T` in `Session<T>` to support shutdown.
/// Mirrors `multistream_select::frame::SetReadTimeout`'s one-trait-per-concern pattern.
pub trait CloseStream {
    fn close_stream(&mut self);
}

impl CloseStream for TcpStream {
    fn close_stream(&mut self) {
        let _ = self.shutdown(std::net::Shutdown::Both);
    }
}

/// A completed, authenticated secio session over a byte stream (spec §3, §4.4 Phase 6).
pub struct Session<T> {
    pub remote_peer_id: PeerId,
    pub chosen_curve: String,
    pub chosen_cipher: String,
    pub chosen_hash: String,
    pub channel: SecureChannel<T>,
}

impl<T> Session<T> {
    pub fn new(
        remote_peer_id: PeerId,
        chosen_curve: String,
        chosen_cipher: String,
        chosen_hash: String,
        channel: SecureChannel<T>,
    ) -> Session<T> {
        Session {
            remote_peer_id,
            chosen_curve,
            chosen_cipher,
            chosen_hash,
            channel,
        }
    }
}

impl<T: CloseStream> PeerSession for Session<T>
where
    T: Send + Read + Write,
{
    fn close(&mut self) {
        self.channel.get_mut().close_stream();
    }
}
