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

//! A mutually-authenticated Diffie-Hellman handshake (secio) that upgrades a plain byte stream
//! into an authenticated, encrypted one.
//!
//! # Usage
//!
//! Once the Multistream Negotiator has agreed on `/ipfs/secio/1.0.0` for a given stream, call
//! [`handshake`] with a local long-term [`meshwire_core::KeyPair`]:
//!
//! ```no_run
//! use std::net::TcpStream;
//! use meshwire_core::KeyPair;
//! use meshwire_peerstore::PeerStore;
//! use meshwire_secio::{handshake, FrameConfig, HandshakeConfig};
//!
//! # fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let keys = KeyPair::rsa_from_pkcs8(include_bytes!("../test-fixtures/peer-a-private.pk8"),
//!     include_bytes!("../test-fixtures/peer-a-public.der").to_vec())?;
//! let stream = TcpStream::connect("127.0.0.1:4001")?;
//! let peer_store = PeerStore::new();
//! let session = handshake(stream, &keys, &peer_store, HandshakeConfig::default(), FrameConfig::default())?;
//! println!("talking to {}", session.remote_peer_id);
//! # Ok(())
//! # }
//! ```
//!
//! `peer_store` is consulted as soon as the remote's peer-id is known: any stale session already
//! held for that peer is torn down immediately, regardless of whether this handshake attempt goes
//! on to succeed. The returned [`Session`] carries the negotiated [`SecureChannel`], which is the
//! only path left open on that stream from this point on — there is no way back to plaintext.

mod algo_support;
mod codec;
mod crypto;
mod error;
mod handshake;
mod secure_channel;
mod session;
mod structs_proto;
pub mod stream_cipher;

pub use codec::HandshakeConfig;
pub use error::SecioError;
pub use handshake::handshake;
pub use multistream_select::FrameConfig;
pub use secure_channel::SecureChannel;
pub use session::Session;
