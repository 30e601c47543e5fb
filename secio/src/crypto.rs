//! Ephemeral Diffie-Hellman and HMAC-based key stretching (spec §4.4 Phases 4-5).

use hmac::{Hmac, Mac};
use ring::agreement;
use ring::rand::SystemRandom;
use sha2::Sha256;

use crate::algo_support::{cipher_sizes, STRETCHED_MAC_KEY_SIZE};
use crate::error::SecioError;

type HmacSha256 = Hmac<Sha256>;

/// An ephemeral keypair on the agreed curve, held only for the duration of one handshake (spec
/// §3, "Ephemeral keys ... must be zeroed and released on every exit path").
pub struct EphemeralKeyPair {
    private: agreement::EphemeralPrivateKey,
    /// Canonical uncompressed point encoding, leading `0x04` byte included (spec §6).
    pub public_bytes: Vec<u8>,
}

fn curve_algorithm(curve: &str) -> Result<&'static agreement::Algorithm, SecioError> {
    match curve {
        "P-256" => Ok(&agreement::ECDH_P256),
        "P-384" => Ok(&agreement::ECDH_P384),
        other => Err(SecioError::Decode(format!("unsupported curve {}", other))),
    }
}

impl EphemeralKeyPair {
    /// Generates a fresh ephemeral keypair on the given curve (spec §4.4 Phase 4, step 1).
    pub fn generate(curve: &str) -> Result<EphemeralKeyPair, SecioError> {
        let algorithm = curve_algorithm(curve)?;
        let rng = SystemRandom::new();
        let private = agreement::EphemeralPrivateKey::generate(algorithm, &rng)
            .map_err(|_| SecioError::KeyAgreementFailed)?;
        let public = private
            .compute_public_key()
            .map_err(|_| SecioError::KeyAgreementFailed)?;
        Ok(EphemeralKeyPair {
            private,
            public_bytes: public.as_ref().to_vec(),
        })
    }

    /// The wire tail of the public key: the canonical encoding with its leading `0x04` byte
    /// stripped (spec §6, "on the wire the leading byte is stripped").
    pub fn public_tail(&self) -> &[u8] {
        &self.public_bytes[1..]
    }

    /// Performs ECDH against the peer's tail-only public key, re-prepending the `0x04` byte the
    /// wire format strips before handing it to `ring::agreement` (spec §6, "the receiver prepends
    /// it back before DH").
    pub fn agree(self, curve: &str, remote_tail: &[u8]) -> Result<Vec<u8>, SecioError> {
        let algorithm = curve_algorithm(curve)?;
        let mut remote_full = Vec::with_capacity(remote_tail.len() + 1);
        remote_full.push(0x04);
        remote_full.extend_from_slice(remote_tail);
        let peer_public = agreement::UnparsedPublicKey::new(algorithm, remote_full);
        agreement::agree_ephemeral(
            self.private,
            &peer_public,
            ring::error::Unspecified,
            |shared| Ok(shared.to_vec()),
        )
        .map_err(|_| SecioError::KeyAgreementFailed)
    }
}

/// A `{iv, cipher_key, mac_key}` triple used for one direction of the Secure Channel (spec §3,
/// "Directional Key").
#[derive(Clone)]
pub struct DirectionalKey {
    pub iv: Vec<u8>,
    pub cipher_key: Vec<u8>,
    pub mac_key: Vec<u8>,
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    let result = mac.finalize().into_bytes();
    let mut out = [0u8; 32];
    out.copy_from_slice(&result);
    out
}

/// HMAC-based key expansion (spec §4.4 Phase 5). The stretching HMAC is hardcoded to SHA-256
/// regardless of the chosen hash, matching the reference exactly (spec §9: "an implementer must
/// match the reference to interoperate").
pub fn stretch_keys(cipher: &str, secret: &[u8]) -> Result<(DirectionalKey, DirectionalKey), SecioError> {
    let (iv_size, cipher_size) =
        cipher_sizes(cipher).ok_or_else(|| SecioError::Decode(format!("unsupported cipher {}", cipher)))?;
    let mac_size = STRETCHED_MAC_KEY_SIZE;
    let half_size = iv_size + cipher_size + mac_size;
    let output_size = 2 * half_size;

    const SEED: &[u8] = b"key expansion";
    let mut output = Vec::with_capacity(output_size);
    let mut a = hmac_sha256(secret, SEED);
    while output.len() < output_size {
        let mut block_input = Vec::with_capacity(a.len() + SEED.len());
        block_input.extend_from_slice(&a);
        block_input.extend_from_slice(SEED);
        let b = hmac_sha256(secret, &block_input);
        let take = (output_size - output.len()).min(b.len());
        output.extend_from_slice(&b[..take]);
        a = hmac_sha256(secret, &a);
    }

    let (first_half, second_half) = output.split_at(half_size);
    let k1 = split_directional_key(first_half, iv_size, cipher_size);
    let k2 = split_directional_key(second_half, iv_size, cipher_size);
    Ok((k1, k2))
}

fn split_directional_key(bytes: &[u8], iv_size: usize, cipher_size: usize) -> DirectionalKey {
    let (iv, rest) = bytes.split_at(iv_size);
    let (cipher_key, mac_key) = rest.split_at(cipher_size);
    DirectionalKey {
        iv: iv.to_vec(),
        cipher_key: cipher_key.to_vec(),
        mac_key: mac_key.to_vec(),
    }
}
