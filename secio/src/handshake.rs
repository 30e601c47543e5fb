//! Orchestrates the six phases of the secio handshake (spec §4.4), run identically by whichever
//! side the Multistream Negotiator just finished talking to — the handshake itself is symmetric,
//! with all asymmetry folded into the `order` computed in Phase 2.
//!
//! Grounded on `libp2p_secio_handshake` end to end; see `SPEC_FULL.md`'s "SUPPLEMENTED BEHAVIOR"
//! section for the specific quirks (corpus byte order, cross-wired order hashing) reproduced here.

use std::io::{Read, Write};

use log::debug;
use meshwire_core::{KeyPair, PeerId, PublicKey};
use meshwire_peerstore::PeerStore;
use multistream_select::FrameConfig;
use ring::rand::{SecureRandom, SystemRandom};

use crate::algo_support::{self, SUPPORTED_CIPHERS, SUPPORTED_EXCHANGES, SUPPORTED_HASHES};
use crate::codec::{HandshakeConfig, PlaintextFramer};
use crate::crypto::{self, EphemeralKeyPair};
use crate::error::SecioError;
use crate::secure_channel::SecureChannel;
use crate::session::Session;
use crate::structs_proto::{Exchange, Propose};

const NONCE_LEN: usize = 16;

fn generate_nonce() -> Result<[u8; NONCE_LEN], SecioError> {
    let rng = SystemRandom::new();
    let mut nonce = [0u8; NONCE_LEN];
    rng.fill(&mut nonce)
        .map_err(|_| SecioError::Resource("failed to generate handshake nonce".into()))?;
    Ok(nonce)
}

/// Runs a full secio handshake over `stream`, consuming it and returning an established
/// [`Session`] on success (spec §4.4). `stream` must already be past multistream negotiation of
/// `/ipfs/secio/1.0.0` (spec §4.4 preconditions).
///
/// As soon as Phase 1 decodes the remote's peer-id, any stale session already held for that peer
/// in `peer_store` is torn down unconditionally — independent of whether the rest of this
/// handshake goes on to succeed or fail (spec §4.4 Phase 1, §7).
pub fn handshake<T: Read + Write>(
    stream: T,
    local_keys: &KeyPair,
    peer_store: &PeerStore,
    handshake_config: HandshakeConfig,
    frame_config: FrameConfig,
) -> Result<Session<T>, SecioError> {
    let mut framer = PlaintextFramer::new(stream, handshake_config);

    // Phase 1 — Propose exchange.
    let local_nonce = generate_nonce()?;
    let local_public_key = local_keys.public_key();
    let local_propose = Propose {
        rand: local_nonce.to_vec(),
        public_key: local_public_key.encode_tagged(),
        exchanges: SUPPORTED_EXCHANGES.to_string(),
        ciphers: SUPPORTED_CIPHERS.to_string(),
        hashes: SUPPORTED_HASHES.to_string(),
    };
    let local_propose_bytes = local_propose.encode();
    framer.write_frame(&local_propose_bytes)?;

    let remote_propose_bytes = framer.read_frame()?;
    let remote_propose = Propose::decode(&remote_propose_bytes)?;
    if remote_propose.rand.len() != NONCE_LEN {
        return Err(SecioError::Decode("remote nonce was not 16 bytes".into()));
    }
    let remote_public_key = PublicKey::decode_tagged(&remote_propose.public_key)?;
    let remote_peer_id = PeerId::from_public_key(&remote_public_key);
    debug!("secio: remote peer id {}", remote_peer_id);
    peer_store.evict_session(&remote_peer_id);

    // Phase 2 — deterministic role assignment.
    let order = algo_support::determine_order(
        &local_propose.public_key,
        &local_nonce,
        &remote_propose.public_key,
        &remote_propose.rand,
    )?;

    // Phase 3 — algorithm selection.
    let chosen_curve =
        algo_support::select_best(order, &local_propose.exchanges, &remote_propose.exchanges, "exchange")?
            .to_string();
    let chosen_cipher =
        algo_support::select_best(order, &local_propose.ciphers, &remote_propose.ciphers, "cipher")?.to_string();
    let chosen_hash =
        algo_support::select_best(order, &local_propose.hashes, &remote_propose.hashes, "hash")?.to_string();

    // Phase 4 — ephemeral DH and signed Exchange.
    let ephemeral = EphemeralKeyPair::generate(&chosen_curve)?;
    let mut corpus_to_sign = Vec::with_capacity(
        local_propose_bytes.len() + remote_propose_bytes.len() + ephemeral.public_tail().len(),
    );
    corpus_to_sign.extend_from_slice(&local_propose_bytes);
    corpus_to_sign.extend_from_slice(&remote_propose_bytes);
    corpus_to_sign.extend_from_slice(ephemeral.public_tail());
    let signature = local_keys.sign(&corpus_to_sign)?;

    let exchange_out = Exchange {
        epubkey: ephemeral.public_tail().to_vec(),
        signature,
    };
    framer.write_frame(&exchange_out.encode())?;

    let exchange_in_bytes = framer.read_frame()?;
    let exchange_in = Exchange::decode(&exchange_in_bytes)?;

    let mut corpus_to_verify = Vec::with_capacity(
        remote_propose_bytes.len() + local_propose_bytes.len() + exchange_in.epubkey.len(),
    );
    corpus_to_verify.extend_from_slice(&remote_propose_bytes);
    corpus_to_verify.extend_from_slice(&local_propose_bytes);
    corpus_to_verify.extend_from_slice(&exchange_in.epubkey);
    if !remote_public_key.verify(&corpus_to_verify, &exchange_in.signature) {
        return Err(SecioError::SignatureVerificationFailed);
    }

    let shared_secret = ephemeral.agree(&chosen_curve, &exchange_in.epubkey)?;

    // Phase 5 — key stretching.
    let (k1, k2) = crypto::stretch_keys(&chosen_cipher, &shared_secret)?;
    let (local_key, remote_key) = if order > 0 { (k1, k2) } else { (k2, k1) };

    let mut channel = SecureChannel::new(
        framer.into_inner(),
        frame_config,
        &chosen_cipher,
        &chosen_hash,
        &local_key,
        &remote_key,
    )?;

    // Phase 6 — nonce liveness verification.
    channel.write(&remote_propose.rand)?;
    let echoed = channel.read()?;
    if echoed != local_nonce {
        return Err(SecioError::NonceMismatch);
    }

    debug!("secio: handshake complete with {}", remote_peer_id);
    Ok(Session::new(remote_peer_id, chosen_curve, chosen_cipher, chosen_hash, channel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{TcpListener, TcpStream};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    use meshwire_peerstore::PeerSession;

    fn peer_a_keys() -> KeyPair {
        KeyPair::rsa_from_pkcs8(
            include_bytes!("../test-fixtures/peer-a-private.pk8"),
            include_bytes!("../test-fixtures/peer-a-public.der").to_vec(),
        )
        .unwrap()
    }

    fn peer_b_keys() -> KeyPair {
        KeyPair::rsa_from_pkcs8(
            include_bytes!("../test-fixtures/peer-b-private.pk8"),
            include_bytes!("../test-fixtures/peer-b-public.der").to_vec(),
        )
        .unwrap()
    }

    #[test]
    fn two_distinct_peers_complete_a_handshake_and_exchange_data() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let server_store = PeerStore::new();
            let mut session = handshake(
                stream,
                &peer_b_keys(),
                &server_store,
                HandshakeConfig::default(),
                FrameConfig::default(),
            )
            .unwrap();
            let received = session.channel.read().unwrap();
            assert_eq!(received, b"hello".to_vec());
            session.remote_peer_id
        });

        let client_store = PeerStore::new();
        let client_stream = TcpStream::connect(addr).unwrap();
        let mut client_session = handshake(
            client_stream,
            &peer_a_keys(),
            &client_store,
            HandshakeConfig::default(),
            FrameConfig::default(),
        )
        .unwrap();
        client_session.channel.write(b"hello").unwrap();

        let server_saw_peer_id = server.join().unwrap();
        assert_eq!(server_saw_peer_id, peer_a_keys().to_peer_id());
        assert_eq!(client_session.chosen_cipher, "AES-256");
        assert_eq!(client_session.chosen_hash, "SHA256");
    }

    #[test]
    fn mismatched_algorithm_lists_fail_negotiation() {
        // Two ends that can't agree on anything still run Phases 1-2 identically; Phase 3 must
        // fail cleanly with `NoCommonAlgorithm` rather than panicking or hanging.
        assert!(algo_support::select_best(1, "AES-256", "AES-128", "cipher").is_err());
    }

    struct TrackedSession(Arc<AtomicBool>);

    impl PeerSession for TrackedSession {
        fn close(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn a_failed_handshake_still_evicts_the_peer_s_stale_session() {
        // The remote's Propose is enough to know its peer-id; the peer store must be cleared of
        // any stale session for that peer-id even though the handshake below never makes it past
        // Phase 4 (spec §4.4 Phase 1, §7 — unconditional on handshake outcome).
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server_keys = peer_b_keys();
        let server_peer_id = server_keys.to_peer_id();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut framer = PlaintextFramer::new(stream, HandshakeConfig::default());
            let _client_propose = framer.read_frame().unwrap();

            let propose = Propose {
                rand: [7u8; NONCE_LEN].to_vec(),
                public_key: server_keys.public_key().encode_tagged(),
                exchanges: SUPPORTED_EXCHANGES.to_string(),
                ciphers: SUPPORTED_CIPHERS.to_string(),
                hashes: SUPPORTED_HASHES.to_string(),
            };
            framer.write_frame(&propose.encode()).unwrap();
            // Drop the connection instead of completing the Exchange phase.
        });

        let peer_store = PeerStore::new();
        let closed_flag = Arc::new(AtomicBool::new(false));
        peer_store.replace_session(&server_peer_id, Box::new(TrackedSession(closed_flag.clone())));

        let client_stream = TcpStream::connect(addr).unwrap();
        let result = handshake(
            client_stream,
            &peer_a_keys(),
            &peer_store,
            HandshakeConfig::default(),
            FrameConfig::default(),
        );

        assert!(result.is_err());
        assert!(closed_flag.load(Ordering::SeqCst));

        server.join().unwrap();
    }
}
