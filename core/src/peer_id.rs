use std::fmt;

use ring::digest;

use crate::keys::PublicKey;

/// Identifier of a remote peer, derived as a cryptographic hash of its long-term public key
/// (spec §3, "Invariants across the model").
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PeerId(Vec<u8>);

impl PeerId {
    /// Hashes the key's tagged `{type, data}` encoding (spec §6, "Long-term public key encoding")
    /// with SHA-256, the same hash the handshake already uses for nonce-order hashing.
    pub fn from_public_key(key: &PublicKey) -> PeerId {
        let tagged = key.encode_tagged();
        let digest = digest::digest(&digest::SHA256, &tagged);
        PeerId(digest.as_ref().to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(&self.0).into_string())
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId({})", self)
    }
}
