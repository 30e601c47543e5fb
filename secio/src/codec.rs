//! 32-bit big-endian length-prefixed framing, exclusive to the plaintext phase of the handshake
//! (spec §4.1 "Note on a format quirk"; grounded on `libp2p_secio_unencrypted_read` /
//! `libp2p_secio_unencrypted_write` in the original C).
//!
//! This is deliberately a separate framing discipline from `multistream_select::frame`'s
//! varint-length framing: the handshake's Propose/Exchange exchange predates secio's own secure
//! channel and reproduces the reference's 4-byte network-order length prefix, including its
//! "spurious leading `\n`" quirk, rather than the varint framing used everywhere else.

use std::convert::TryFrom;
use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use crate::error::SecioError;

/// Tunables for the plaintext handshake framing (spec §6, "Timeouts").
#[derive(Clone, Copy, Debug)]
pub struct HandshakeConfig {
    pub read_timeout: Duration,
    pub max_plaintext_frame_len: usize,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        HandshakeConfig {
            read_timeout: Duration::from_secs(10),
            max_plaintext_frame_len: 8 * 1024 * 1024,
        }
    }
}

/// Lets the handshake bound its blocking reads by a timeout, same contract as
/// `multistream_select::frame::SetReadTimeout`, kept local so this crate doesn't need to depend on
/// `multistream-select`'s framing module just for this trait.
pub trait SetReadTimeout {
    fn set_read_timeout(&self, dur: Option<Duration>) -> io::Result<()>;
}

impl SetReadTimeout for TcpStream {
    fn set_read_timeout(&self, dur: Option<Duration>) -> io::Result<()> {
        TcpStream::set_read_timeout(self, dur)
    }
}

/// A spurious `\n` (0x0A) that the reference's 32-bit length reader silently discards — but only
/// when it is the very first byte of the length field (`libp2p_secio_unencrypted_read`:
/// `if (read == 0 && size[0] == 10)`).
const SPURIOUS_LEADING_BYTE: u8 = 0x0A;

/// A handshake-phase framed reader/writer over a raw byte stream (spec §4.4, §6).
pub struct PlaintextFramer<T> {
    inner: T,
    config: HandshakeConfig,
}

impl<T> PlaintextFramer<T> {
    pub fn new(inner: T, config: HandshakeConfig) -> Self {
        PlaintextFramer { inner, config }
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read + Write> PlaintextFramer<T> {
    /// Writes a 4-byte big-endian length prefix followed by `payload`. A zero-length payload is a
    /// no-op, matching `libp2p_secio_unencrypted_write`'s `if (data_length > 0)` guard.
    pub fn write_frame(&mut self, payload: &[u8]) -> Result<(), SecioError> {
        if payload.is_empty() {
            return Ok(());
        }
        let len = u32::try_from(payload.len())
            .map_err(|_| SecioError::Decode("plaintext frame too large to encode".into()))?;
        self.inner.write_all(&len.to_be_bytes())?;
        self.inner.write_all(payload)?;
        Ok(())
    }

    /// Reads a 4-byte big-endian length prefix, skipping a spurious leading `0x0A` byte, then
    /// exactly that many payload bytes.
    pub fn read_frame(&mut self) -> Result<Vec<u8>, SecioError> {
        let len = self.read_length_prefix()?;
        if len == 0 {
            return Err(SecioError::Decode("zero-length plaintext frame".into()));
        }
        let len = len as usize;
        if len > self.config.max_plaintext_frame_len {
            return Err(SecioError::Decode(format!(
                "declared plaintext frame length {} exceeds maximum {}",
                len, self.config.max_plaintext_frame_len
            )));
        }
        let mut buf = vec![0u8; len];
        self.read_exact_filling(&mut buf)?;
        Ok(buf)
    }

    fn read_length_prefix(&mut self) -> Result<u32, SecioError> {
        let mut length_bytes = [0u8; 4];
        let mut filled = 0;
        while filled < 4 {
            let mut one = [0u8; 1];
            self.read_exact_filling(&mut one)?;
            if filled == 0 && one[0] == SPURIOUS_LEADING_BYTE {
                continue;
            }
            length_bytes[filled] = one[0];
            filled += 1;
        }
        Ok(u32::from_be_bytes(length_bytes))
    }

    fn read_exact_filling(&mut self, buf: &mut [u8]) -> Result<(), SecioError> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.inner.read(&mut buf[filled..])?;
            if n == 0 {
                return Err(SecioError::Transport("stream closed mid-frame".into()));
            }
            filled += n;
        }
        Ok(())
    }
}

impl<T: Read + Write + SetReadTimeout> PlaintextFramer<T> {
    pub fn arm_timeout(&self) -> io::Result<()> {
        self.inner.set_read_timeout(Some(self.config.read_timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    impl SetReadTimeout for Cursor<Vec<u8>> {
        fn set_read_timeout(&self, _dur: Option<Duration>) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_then_read_round_trips() {
        let mut writer = PlaintextFramer::new(Cursor::new(Vec::new()), HandshakeConfig::default());
        writer.write_frame(b"propose-bytes").unwrap();
        let buf = writer.into_inner().into_inner();

        let mut reader = PlaintextFramer::new(Cursor::new(buf), HandshakeConfig::default());
        assert_eq!(reader.read_frame().unwrap(), b"propose-bytes".to_vec());
    }

    #[test]
    fn leading_spurious_newline_is_skipped() {
        let mut buf = vec![SPURIOUS_LEADING_BYTE];
        buf.extend_from_slice(&5u32.to_be_bytes());
        buf.extend_from_slice(b"hello");
        let mut reader = PlaintextFramer::new(Cursor::new(buf), HandshakeConfig::default());
        assert_eq!(reader.read_frame().unwrap(), b"hello".to_vec());
    }

    #[test]
    fn newline_only_skipped_as_first_byte() {
        // A 0x0A as the *second* length byte must NOT be treated as spurious.
        let declared_len: u32 = 0x00_0A_00_05;
        let mut buf = declared_len.to_be_bytes().to_vec();
        buf.resize(4 + declared_len as usize, 0);
        let mut reader = PlaintextFramer::new(Cursor::new(buf), HandshakeConfig::default());
        assert_eq!(reader.read_frame().unwrap().len(), declared_len as usize);
    }

    #[test]
    fn zero_length_frame_is_rejected() {
        let buf = 0u32.to_be_bytes().to_vec();
        let mut reader = PlaintextFramer::new(Cursor::new(buf), HandshakeConfig::default());
        match reader.read_frame() {
            Err(SecioError::Decode(_)) => {}
            other => panic!("expected Decode error, got {:?}", other),
        }
    }

    #[test]
    fn oversized_declared_length_is_rejected() {
        let config = HandshakeConfig {
            read_timeout: Duration::from_secs(1),
            max_plaintext_frame_len: 4,
        };
        let mut buf = 5u32.to_be_bytes().to_vec();
        buf.extend_from_slice(b"hello");
        let mut reader = PlaintextFramer::new(Cursor::new(buf), config);
        match reader.read_frame() {
            Err(SecioError::Decode(_)) => {}
            other => panic!("expected Decode error, got {:?}", other),
        }
    }
}
