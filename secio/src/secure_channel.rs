//! The framed AES-CTR + HMAC transport installed after a successful handshake (spec §4.5).

use std::io::{Read, Write};

use hmac::{Hmac, Mac};
use multistream_select::{FrameConfig, FrameTransport};
use sha2::{Sha256, Sha512};

use crate::algo_support::mac_output_size;
use crate::crypto::DirectionalKey;
use crate::error::SecioError;
use crate::stream_cipher::AesCtr;

/// HMAC variant selected by the chosen hash, used only for per-frame authentication (spec §4.5;
/// key-stretching's own HMAC is always SHA-256 regardless, see `crypto::stretch_keys`).
enum ChannelMac {
    Sha256(Hmac<Sha256>),
    Sha512(Hmac<Sha512>),
}

impl ChannelMac {
    fn new(hash: &str, key: &[u8]) -> Result<ChannelMac, SecioError> {
        match hash {
            "SHA256" => Ok(ChannelMac::Sha256(
                Hmac::<Sha256>::new_from_slice(key).expect("HMAC accepts keys of any length"),
            )),
            "SHA512" => Ok(ChannelMac::Sha512(
                Hmac::<Sha512>::new_from_slice(key).expect("HMAC accepts keys of any length"),
            )),
            other => Err(SecioError::Decode(format!("unsupported hash {}", other))),
        }
    }

    fn compute(&self, data: &[u8]) -> Vec<u8> {
        match self {
            ChannelMac::Sha256(mac) => {
                let mut mac = mac.clone();
                mac.update(data);
                mac.finalize().into_bytes().to_vec()
            }
            ChannelMac::Sha512(mac) => {
                let mut mac = mac.clone();
                mac.update(data);
                mac.finalize().into_bytes().to_vec()
            }
        }
    }

    /// Constant-time tag comparison (spec §4.5, "constant-time compare required for security").
    fn verify(&self, data: &[u8], tag: &[u8]) -> bool {
        match self {
            ChannelMac::Sha256(mac) => {
                let mut mac = mac.clone();
                mac.update(data);
                mac.verify_slice(tag).is_ok()
            }
            ChannelMac::Sha512(mac) => {
                let mut mac = mac.clone();
                mac.update(data);
                mac.verify_slice(tag).is_ok()
            }
        }
    }
}

/// Wraps a varint-framed transport with encrypt-then-MAC on write and verify-then-decrypt on read
/// (spec §4.5). Once constructed there is no path back to plaintext on the same transport (spec
/// §3, "no reverting to plaintext once secure" is enforced by `SecureChannel` taking ownership of
/// the `FrameTransport`).
pub struct SecureChannel<T> {
    transport: FrameTransport<T>,
    local_cipher: AesCtr,
    local_mac: ChannelMac,
    remote_cipher: AesCtr,
    remote_mac: ChannelMac,
    mac_size: usize,
}

impl<T: Read + Write> SecureChannel<T> {
    pub fn new(
        inner: T,
        frame_config: FrameConfig,
        cipher: &str,
        hash: &str,
        local: &DirectionalKey,
        remote: &DirectionalKey,
    ) -> Result<SecureChannel<T>, SecioError> {
        let mac_size =
            mac_output_size(hash).ok_or_else(|| SecioError::Decode(format!("unsupported hash {}", hash)))?;
        Ok(SecureChannel {
            transport: FrameTransport::new(inner, frame_config),
            local_cipher: AesCtr::new(cipher, &local.cipher_key, &local.iv)?,
            local_mac: ChannelMac::new(hash, &local.mac_key)?,
            remote_cipher: AesCtr::new(cipher, &remote.cipher_key, &remote.iv)?,
            remote_mac: ChannelMac::new(hash, &remote.mac_key)?,
            mac_size,
        })
    }

    /// Encrypts `plaintext`, appends its MAC, and writes the result as one Frame Transport
    /// payload (spec §4.5, "Write path").
    pub fn write(&mut self, plaintext: &[u8]) -> Result<(), SecioError> {
        let mut ciphertext = plaintext.to_vec();
        self.local_cipher.apply_keystream(&mut ciphertext);
        let tag = self.local_mac.compute(&ciphertext);
        ciphertext.extend_from_slice(&tag);
        self.transport.write(&ciphertext)?;
        Ok(())
    }

    /// Reads one Frame Transport payload, verifies its MAC, and decrypts the remainder (spec
    /// §4.5, "Read path").
    pub fn read(&mut self) -> Result<Vec<u8>, SecioError> {
        let frame = self.transport.read()?;
        if frame.len() < self.mac_size {
            return Err(SecioError::Decode("frame shorter than MAC size".into()));
        }
        let (ciphertext, tag) = frame.split_at(frame.len() - self.mac_size);
        if !self.remote_mac.verify(ciphertext, tag) {
            return Err(SecioError::MacVerificationFailed);
        }
        let mut plaintext = ciphertext.to_vec();
        self.remote_cipher.apply_keystream(&mut plaintext);
        Ok(plaintext)
    }

    /// Direct access to the underlying stream, used to tear the connection down when a session is
    /// replaced (spec §7).
    pub fn get_mut(&mut self) -> &mut T {
        self.transport.get_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn key(byte: u8, iv_size: usize, cipher_size: usize) -> DirectionalKey {
        DirectionalKey {
            iv: vec![byte; iv_size],
            cipher_key: vec![byte.wrapping_add(1); cipher_size],
            mac_key: vec![byte.wrapping_add(2); 20],
        }
    }

    #[derive(Default)]
    struct Loopback {
        buf: Vec<u8>,
        pos: usize,
    }

    impl Read for Loopback {
        fn read(&mut self, out: &mut [u8]) -> std::io::Result<usize> {
            let n = (self.buf.len() - self.pos).min(out.len());
            out[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    impl Write for Loopback {
        fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
            self.buf.extend_from_slice(data);
            Ok(data.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_then_read_round_trips_plaintext() {
        let local = key(1, 16, 16);
        let remote = key(9, 16, 16);

        let mut writer_side =
            SecureChannel::new(Loopback::default(), FrameConfig::default(), "AES-128", "SHA256", &local, &remote)
                .unwrap();
        writer_side.write(b"hello across the wire").unwrap();

        let wire = std::mem::replace(&mut writer_side.transport, FrameTransport::new(Loopback::default(), FrameConfig::default()))
            .into_inner()
            .buf;

        let mut reader_side = SecureChannel::new(
            Cursor::new(wire),
            FrameConfig::default(),
            "AES-128",
            "SHA256",
            &remote,
            &local,
        )
        .unwrap();
        let received = reader_side.read().unwrap();
        assert_eq!(received, b"hello across the wire".to_vec());
    }

    #[test]
    fn tampered_ciphertext_fails_mac_verification() {
        let local = key(1, 16, 16);
        let remote = key(9, 16, 16);
        let mut writer_side =
            SecureChannel::new(Loopback::default(), FrameConfig::default(), "AES-128", "SHA256", &local, &remote)
                .unwrap();
        writer_side.write(b"integrity matters").unwrap();
        let mut wire = std::mem::replace(&mut writer_side.transport, FrameTransport::new(Loopback::default(), FrameConfig::default()))
            .into_inner()
            .buf;
        let last = wire.len() - 1;
        wire[last] ^= 0xFF;

        let mut reader_side = SecureChannel::new(
            Cursor::new(wire),
            FrameConfig::default(),
            "AES-128",
            "SHA256",
            &remote,
            &local,
        )
        .unwrap();
        match reader_side.read() {
            Err(SecioError::MacVerificationFailed) => {}
            other => panic!("expected MacVerificationFailed, got {:?}", other),
        }
    }
}
