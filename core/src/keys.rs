//! Long-term asymmetric keys used to authenticate a handshake.
//!
//! Only RSA is implemented (spec §6: "`type` is an integer (0 = RSA in this core)"), but nothing
//! here assumes RSA beyond the `KeyPairInner` enum — the design accepts any signer, per spec §4.4
//! preconditions, by adding a variant and a `PublicKey`/`KeyPair` match arm.

use std::sync::Arc;

use ring::rand::SystemRandom;
use ring::signature::{self, RsaKeyPair};

use crate::error::CoreError;
use crate::peer_id::PeerId;

/// Key-type tag used in the wire encoding of a `PublicKey` (spec §6).
pub const KEY_TYPE_RSA: i32 = 0;

/// A long-term public key, tagged with its key type so it round-trips over the wire as
/// `{type, data}` (spec §6, "Long-term public key encoding").
#[derive(Clone, PartialEq, Eq)]
pub enum PublicKey {
    /// DER-encoded `RSAPublicKey` (PKCS#1, not SubjectPublicKeyInfo — the format
    /// `ring::signature::RSA_PKCS1_*` verification expects directly).
    Rsa(Vec<u8>),
}

impl PublicKey {
    /// Encodes as the tagged `{type, data}` record described in spec §6.
    pub fn encode_tagged(&self) -> Vec<u8> {
        match self {
            PublicKey::Rsa(der) => {
                let mut out = Vec::with_capacity(der.len() + 5);
                out.extend_from_slice(&KEY_TYPE_RSA.to_be_bytes());
                out.extend_from_slice(der);
                out
            }
        }
    }

    /// Decodes a tagged `{type, data}` record produced by [`PublicKey::encode_tagged`].
    pub fn decode_tagged(bytes: &[u8]) -> Result<PublicKey, CoreError> {
        if bytes.len() < 4 {
            return Err(CoreError::Protocol("public key record too short".into()));
        }
        let mut tag = [0u8; 4];
        tag.copy_from_slice(&bytes[..4]);
        let key_type = i32::from_be_bytes(tag);
        match key_type {
            KEY_TYPE_RSA => Ok(PublicKey::Rsa(bytes[4..].to_vec())),
            other => Err(CoreError::Protocol(format!("unsupported key type {}", other))),
        }
    }

    pub fn verify(&self, msg: &[u8], signature: &[u8]) -> bool {
        match self {
            PublicKey::Rsa(der) => {
                let key = signature::UnparsedPublicKey::new(
                    &signature::RSA_PKCS1_2048_8192_SHA256,
                    der.as_slice(),
                );
                key.verify(msg, signature).is_ok()
            }
        }
    }

    pub fn into_peer_id(self) -> PeerId {
        PeerId::from_public_key(&self)
    }
}

#[derive(Clone)]
enum KeyPairInner {
    Rsa {
        public_der: Vec<u8>,
        private: Arc<RsaKeyPair>,
    },
}

/// A local node's long-term private/public keypair.
///
/// # Generating offline keys with OpenSSL
///
/// ```ignore
/// openssl genrsa -out key.pem 2048
/// openssl pkcs8 -topk8 -nocrypt -in key.pem -outform DER -out key.pk8
/// openssl rsa -in key.pem -RSAPublicKey_out -outform DER -out key-pub.der
/// ```
#[derive(Clone)]
pub struct KeyPair {
    inner: KeyPairInner,
}

impl KeyPair {
    /// Builds a `KeyPair` from a PKCS8-encoded RSA private key and the matching DER-encoded
    /// PKCS#1 `RSAPublicKey`.
    pub fn rsa_from_pkcs8(private_pkcs8: &[u8], public_der: Vec<u8>) -> Result<KeyPair, CoreError> {
        let private = RsaKeyPair::from_pkcs8(private_pkcs8)
            .map_err(|e| CoreError::Resource(format!("invalid RSA pkcs8 key: {}", e)))?;
        Ok(KeyPair {
            inner: KeyPairInner::Rsa {
                public_der,
                private: Arc::new(private),
            },
        })
    }

    pub fn public_key(&self) -> PublicKey {
        match &self.inner {
            KeyPairInner::Rsa { public_der, .. } => PublicKey::Rsa(public_der.clone()),
        }
    }

    pub fn to_peer_id(&self) -> PeerId {
        self.public_key().into_peer_id()
    }

    /// Signs `msg`, returning the raw PKCS#1v1.5/SHA-256 signature bytes (spec §4.4 Phase 4).
    pub fn sign(&self, msg: &[u8]) -> Result<Vec<u8>, CoreError> {
        match &self.inner {
            KeyPairInner::Rsa { private, .. } => {
                let rng = SystemRandom::new();
                let mut sig = vec![0u8; private.public_modulus_len()];
                private
                    .sign(&signature::RSA_PKCS1_SHA256, &rng, msg, &mut sig)
                    .map_err(|_| CoreError::Crypto("RSA signing failed".into()))?;
                Ok(sig)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_keypair() -> KeyPair {
        KeyPair::rsa_from_pkcs8(
            include_bytes!("../test-fixtures/rsa-2048-private.pk8"),
            include_bytes!("../test-fixtures/rsa-2048-public.der").to_vec(),
        )
        .unwrap()
    }

    #[test]
    fn sign_then_verify_round_trips() {
        let kp = test_keypair();
        let msg = b"some handshake corpus bytes";
        let sig = kp.sign(msg).unwrap();
        assert!(kp.public_key().verify(msg, &sig));
    }

    #[test]
    fn tampered_signature_fails_verification() {
        let kp = test_keypair();
        let msg = b"some handshake corpus bytes";
        let mut sig = kp.sign(msg).unwrap();
        sig[0] ^= 0xFF;
        assert!(!kp.public_key().verify(msg, &sig));
    }

    #[test]
    fn public_key_tagged_round_trip() {
        let kp = test_keypair();
        let pk = kp.public_key();
        let tagged = pk.encode_tagged();
        let decoded = PublicKey::decode_tagged(&tagged).unwrap();
        assert!(pk == decoded);
    }
}
