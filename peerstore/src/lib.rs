// Copyright 2017 Parity Technologies (UK) Ltd.
//
// Permission is hereby granted, free of charge, to any person obtaining a
// copy of this software and associated documentation files (the "Software"),
// to deal in the Software without restriction, including without limitation
// the rights to use, copy, modify, merge, publish, distribute, sublicense,
// and/or sell copies of the Software, and to permit persons to whom the
// Software is furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS
// OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
// FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
// DEALINGS IN THE SOFTWARE.

//! A keyed store of peers (spec §3, "Peer Entry"; spec §9, "Cyclic reference: Session ↔ Peer").
//!
//! `meshwire-secio` depends on this crate to look up and replace peer entries during the
//! handshake; this crate does not depend back on `meshwire-secio`, so a `Session` is recorded
//! here only behind the small [`PeerSession`] trait object, avoiding a crate cycle (spec §9's
//! suggested resolution: "Sessions reference peers by peer-id lookup; the peer-store owns peer
//! records").

use std::collections::HashMap;
use std::sync::Mutex;

use log::debug;
use meshwire_core::PeerId;

/// Whatever a concrete session type needs to expose to the peer store: the ability to be torn
/// down when replaced by a fresher connection to the same peer (spec §7, "An existing peer whose
/// session is being replaced must have its prior session fully torn down").
pub trait PeerSession: Send {
    fn close(&mut self);
}

/// Connection-state tag carried by a [`PeerEntry`] (spec §3).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
}

/// A peer record: its id, its active session (if any), and a connection-state tag (spec §3).
pub struct PeerEntry {
    pub peer_id: PeerId,
    pub state: ConnectionState,
    session: Option<Box<dyn PeerSession>>,
}

impl PeerEntry {
    pub fn new(peer_id: PeerId) -> Self {
        PeerEntry {
            peer_id,
            state: ConnectionState::Connecting,
            session: None,
        }
    }
}

/// A shared, mutable map of peers keyed by peer id. Every operation is serialized behind an
/// internal lock (spec §5, "shared mutable; all insert/lookup/replace operations must be
/// externally serialized" — here "externally" relative to the map's own internals means "by
/// whichever thread calls in", which the lock enforces for the duration of each call).
pub struct PeerStore {
    peers: Mutex<HashMap<PeerId, PeerEntry>>,
}

impl PeerStore {
    pub fn new() -> Self {
        PeerStore {
            peers: Mutex::new(HashMap::new()),
        }
    }

    /// True if a peer with this id is already known.
    pub fn contains(&self, peer_id: &PeerId) -> bool {
        self.peers.lock().unwrap().contains_key(peer_id)
    }

    /// Inserts a brand-new peer entry. Used on handshake success for a peer id that wasn't
    /// already present (spec §4.4 Phase 1: "otherwise queue a new peer for insertion on handshake
    /// success").
    pub fn insert(&self, entry: PeerEntry) {
        let mut peers = self.peers.lock().unwrap();
        peers.insert(entry.peer_id.clone(), entry);
    }

    /// Replaces an existing peer's session with a new one, tearing down whatever session was
    /// there before — regardless of why the replacement happened (spec §7, §8 scenario 6).
    pub fn replace_session(&self, peer_id: &PeerId, session: Box<dyn PeerSession>) {
        let mut peers = self.peers.lock().unwrap();
        match peers.get_mut(peer_id) {
            Some(entry) => {
                if let Some(mut old) = entry.session.take() {
                    debug!("replacing session for existing peer {}", peer_id);
                    old.close();
                }
                entry.session = Some(session);
                entry.state = ConnectionState::Connected;
            }
            None => {
                let mut entry = PeerEntry::new(peer_id.clone());
                entry.session = Some(session);
                entry.state = ConnectionState::Connected;
                peers.insert(peer_id.clone(), entry);
            }
        }
    }

    pub fn set_state(&self, peer_id: &PeerId, state: ConnectionState) {
        if let Some(entry) = self.peers.lock().unwrap().get_mut(peer_id) {
            entry.state = state;
        }
    }

    /// Tears down and clears an existing peer's session without installing a replacement (spec
    /// §4.4 Phase 1, §7: "An existing peer whose session is being replaced must have its prior
    /// session fully torn down regardless of handshake outcome"). Called as soon as a handshake
    /// attempt's remote peer-id is known, before the rest of the handshake runs, so a stale
    /// session is torn down even if this attempt itself goes on to fail.
    pub fn evict_session(&self, peer_id: &PeerId) {
        let mut peers = self.peers.lock().unwrap();
        if let Some(entry) = peers.get_mut(peer_id) {
            if let Some(mut old) = entry.session.take() {
                debug!("evicting stale session for peer {} ahead of a new handshake attempt", peer_id);
                old.close();
            }
            entry.state = ConnectionState::Connecting;
        }
    }
}

impl Default for PeerStore {
    fn default() -> Self {
        Self::new()
    }
}
