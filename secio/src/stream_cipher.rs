//! The AES-CTR keystream wrapper used by the Secure Channel (spec §3, "two AES-CTR streaming
//! states, one per direction"; spec §4.5).
//!
//! `aes-ctr` keeps the counter and keystream-remainder state inside the cipher object itself, so
//! a single long-lived instance per direction reproduces the reference's persistent
//! `aes_encode_nonce_offset` / `aes_decode_stream_block` fields without this crate tracking that
//! state by hand.

use aes_ctr::cipher::generic_array::GenericArray;
use aes_ctr::cipher::stream::{NewStreamCipher, SyncStreamCipher};
use aes_ctr::{Aes128Ctr, Aes256Ctr};

use crate::error::SecioError;

/// A keystream cipher over one direction of the Secure Channel, selected by the key length agreed
/// during algorithm selection (spec §4.4 Phase 3, §4.4 Phase 5).
#[derive(Debug)]
pub enum AesCtr {
    Aes128(Box<Aes128Ctr>),
    Aes256(Box<Aes256Ctr>),
}

impl AesCtr {
    /// Builds a cipher from a cipher name (`"AES-128"` / `"AES-256"`), a key of the matching
    /// length, and a 16-byte IV used as the initial counter block.
    pub fn new(cipher: &str, key: &[u8], iv: &[u8]) -> Result<AesCtr, SecioError> {
        if iv.len() != 16 {
            return Err(SecioError::Decode("AES-CTR IV must be 16 bytes".into()));
        }
        let nonce = GenericArray::from_slice(iv);
        match cipher {
            "AES-128" => {
                if key.len() != 16 {
                    return Err(SecioError::Decode("AES-128 key must be 16 bytes".into()));
                }
                let key = GenericArray::from_slice(key);
                Ok(AesCtr::Aes128(Box::new(Aes128Ctr::new(key, nonce))))
            }
            "AES-256" => {
                if key.len() != 32 {
                    return Err(SecioError::Decode("AES-256 key must be 32 bytes".into()));
                }
                let key = GenericArray::from_slice(key);
                Ok(AesCtr::Aes256(Box::new(Aes256Ctr::new(key, nonce))))
            }
            other => Err(SecioError::Decode(format!("unsupported cipher {}", other))),
        }
    }

    /// Applies the keystream in place, advancing the per-direction counter (spec §5, "The CTR
    /// counter and MAC are strictly sequential per direction").
    pub fn apply_keystream(&mut self, data: &mut [u8]) {
        match self {
            AesCtr::Aes128(cipher) => cipher.apply_keystream(data),
            AesCtr::Aes256(cipher) => cipher.apply_keystream(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_then_decrypt_recovers_plaintext() {
        let key = [7u8; 32];
        let iv = [3u8; 16];
        let mut encryptor = AesCtr::new("AES-256", &key, &iv).unwrap();
        let mut decryptor = AesCtr::new("AES-256", &key, &iv).unwrap();

        let plaintext = b"hello secure channel".to_vec();
        let mut buf = plaintext.clone();
        encryptor.apply_keystream(&mut buf);
        assert_ne!(buf, plaintext);
        decryptor.apply_keystream(&mut buf);
        assert_eq!(buf, plaintext);
    }

    #[test]
    fn counter_advances_so_replays_differ() {
        let key = [1u8; 16];
        let iv = [2u8; 16];
        let mut cipher = AesCtr::new("AES-128", &key, &iv).unwrap();

        let mut first = b"aaaaaaaaaaaaaaaa".to_vec();
        cipher.apply_keystream(&mut first);
        let mut second = b"aaaaaaaaaaaaaaaa".to_vec();
        cipher.apply_keystream(&mut second);
        assert_ne!(first, second);
    }

    #[test]
    fn rejects_mismatched_key_length() {
        let key = [1u8; 16];
        let iv = [2u8; 16];
        match AesCtr::new("AES-256", &key, &iv) {
            Err(SecioError::Decode(_)) => {}
            other => panic!("expected Decode error, got {:?}", other),
        }
    }
}
