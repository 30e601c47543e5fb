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

//! Ties the Frame Transport, Multistream Negotiator, Protocol Dispatcher, Secio Handshake and
//! Secure Channel together end to end over a real byte stream (spec §2, "Data flow for a
//! connection").
//!
//! [`dial`] and [`accept`] are the two entry points a TCP listener/dialer loop calls: both take
//! the raw stream through multistream negotiation of `/ipfs/secio/1.0.0` and return the resulting
//! authenticated [`meshwire_secio::Session`]. Both also take `&PeerStore`, which the handshake
//! itself consults to evict any stale session for the remote's peer-id as soon as it's known
//! (spec §4.4 Phase 1, §7) — unconditionally, even if the handshake that follows fails. Neither
//! function installs the *new* session into the store on success, though — call
//! [`dispatch::record_session`] with the returned session once the caller has decided it's worth
//! keeping, the same way the teacher leaves session bookkeeping to the swarm layer rather than the
//! transport upgrade itself.

pub mod dispatch;

use std::io::{Read, Write};

use log::info;
use meshwire_core::{CoreError, KeyPair};
use meshwire_peerstore::PeerStore;
use meshwire_secio::{FrameConfig, HandshakeConfig, Session};
use multistream_select::{negotiate_as_dialer, negotiate_as_listener, DispatchOutcome, Dispatcher, FrameTransport};

use dispatch::{ConnectionContext, SecioHandler};

/// The only sub-protocol this core negotiates past `/multistream/1.0.0` (spec §6).
pub const SECIO_PROTOCOL_ID: &str = "/ipfs/secio/1.0.0\n";

/// Dials out: negotiates `/multistream/1.0.0` then `/ipfs/secio/1.0.0` as the proposing side, then
/// runs the secio handshake directly on the underlying stream (spec §4.2, "dialer"; spec §4.4
/// preconditions).
pub fn dial<T: Read + Write>(
    stream: T,
    local_keys: &KeyPair,
    peer_store: &PeerStore,
    frame_config: FrameConfig,
    handshake_config: HandshakeConfig,
) -> Result<Session<T>, CoreError> {
    let mut transport = FrameTransport::new(stream, frame_config);
    negotiate_as_dialer(&mut transport, SECIO_PROTOCOL_ID)
        .map_err(|e| CoreError::Protocol(e.to_string()))?;
    let stream = transport.into_inner();

    let session = meshwire_secio::handshake(stream, local_keys, peer_store, handshake_config, frame_config)
        .map_err(CoreError::from)?;
    info!("dialed and authenticated peer {}", session.remote_peer_id);
    Ok(session)
}

/// Accepts an inbound connection: negotiates as the listening side, then runs the agreed protocol
/// identifier through the Protocol Dispatcher to complete the secio handshake (spec §4.3, §4.4).
pub fn accept<T: Read + Write>(
    stream: T,
    local_keys: KeyPair,
    peer_store: &PeerStore,
    frame_config: FrameConfig,
    handshake_config: HandshakeConfig,
) -> Result<Session<T>, CoreError> {
    let mut transport = FrameTransport::new(stream, frame_config);
    let negotiated = negotiate_as_listener(&mut transport, &[SECIO_PROTOCOL_ID])
        .map_err(|e| CoreError::Protocol(e.to_string()))?;
    let stream = transport.into_inner();

    let mut dispatcher: Dispatcher<'_, ConnectionContext<T>, meshwire_secio::SecioError> = Dispatcher::new();
    dispatcher.register(Box::new(SecioHandler::new(local_keys, peer_store, handshake_config, frame_config)));

    let mut ctx = ConnectionContext::new(stream);
    match dispatcher.dispatch(negotiated.as_bytes(), &mut ctx) {
        Some(DispatchOutcome::Stop) => {}
        Some(DispatchOutcome::Error(e)) => return Err(CoreError::from(e)),
        Some(DispatchOutcome::Continue) | None => {
            return Err(CoreError::Protocol(format!(
                "no registered handler claimed negotiated protocol {:?}",
                negotiated
            )))
        }
    }

    let session = ctx
        .result
        .ok_or_else(|| CoreError::Protocol("handshake handler produced no session".into()))?;
    info!("accepted and authenticated peer {}", session.remote_peer_id);
    Ok(session)
}
