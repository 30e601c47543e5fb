//! Length-prefixed framing over a raw byte stream (spec §4.1).
//!
//! This is the varint-framed discipline used by the Multistream Negotiator and by every
//! post-handshake exchange, including the Secure Channel (spec §4.1, "Note on a format quirk" —
//! the *other* framing, a 32-bit big-endian length used only during the plaintext phase of the
//! secio handshake, lives in `meshwire-secio::codec` since it is exclusive to that phase).

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use unsigned_varint::{decode, encode};

use crate::error::MultistreamError;

/// A varint is rejected as malformed past this many bytes (spec §8, "A varint longer than 10
/// bytes is rejected as malformed").
const MAX_VARINT_BYTES: usize = 10;

/// Tunables for the Frame Transport (spec §6, "Timeouts").
#[derive(Clone, Copy, Debug)]
pub struct FrameConfig {
    /// Per-syscall read timeout.
    pub read_timeout: Duration,
    /// A declared frame length above this is rejected before allocation (spec §8).
    pub max_frame_len: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        FrameConfig {
            read_timeout: Duration::from_secs(5),
            max_frame_len: 8 * 1024 * 1024,
        }
    }
}

/// Lets the Frame Transport bound each blocking read by the configured timeout (spec §5,
/// "bounded by a per-read timeout"). Implemented for `TcpStream`; test fixtures that don't need a
/// real timeout can implement it as a no-op.
pub trait SetReadTimeout {
    fn set_read_timeout(&self, dur: Option<Duration>) -> io::Result<()>;
}

impl SetReadTimeout for TcpStream {
    fn set_read_timeout(&self, dur: Option<Duration>) -> io::Result<()> {
        TcpStream::set_read_timeout(self, dur)
    }
}

/// Length-prefixed read/write over a reliable byte stream, varint-framed (spec §4.1, §6).
pub struct FrameTransport<T> {
    inner: T,
    config: FrameConfig,
}

impl<T> FrameTransport<T> {
    pub fn new(inner: T, config: FrameConfig) -> Self {
        FrameTransport { inner, config }
    }

    /// Consumes the transport, returning the underlying stream. Used when handing the same
    /// socket off to a different framing discipline (e.g. the Secure Channel takes ownership of
    /// a fresh `FrameTransport` around the same stream once a plaintext handshake completes).
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Direct access to the underlying stream, e.g. to tear it down out-of-band on session
    /// replacement (spec §7, "an existing peer whose session is being replaced must have its
    /// prior session fully torn down").
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}

impl<T: Read + Write> FrameTransport<T> {
    /// Prepends a varint length and writes the payload. A zero-length payload is a no-op
    /// returning `Ok(())` (spec §4.1, §8).
    pub fn write(&mut self, payload: &[u8]) -> Result<(), MultistreamError> {
        if payload.is_empty() {
            return Ok(());
        }
        let mut buf = encode::u64_buffer();
        let prefix = encode::u64(payload.len() as u64, &mut buf);
        self.inner.write_all(prefix)?;
        self.inner.write_all(payload)?;
        Ok(())
    }

    /// Reads one varint-length prefix, then exactly that many payload bytes.
    pub fn read(&mut self) -> Result<Vec<u8>, MultistreamError> {
        let len = self.read_varint_len()?;
        if len > self.config.max_frame_len {
            return Err(MultistreamError::FrameTooLarge {
                declared: len,
                max: self.config.max_frame_len,
            });
        }
        if len == 0 {
            return Ok(Vec::new());
        }
        let mut buf = vec![0u8; len];
        self.read_exact_with_timeout(&mut buf)?;
        Ok(buf)
    }

    fn read_varint_len(&mut self) -> Result<usize, MultistreamError> {
        let mut buf = [0u8; MAX_VARINT_BYTES];
        for i in 0..MAX_VARINT_BYTES {
            self.read_exact_with_timeout(&mut buf[i..i + 1])?;
            if buf[i] & 0x80 == 0 {
                let (value, _) =
                    decode::u64(&buf[..=i]).map_err(|_| MultistreamError::MalformedVarint)?;
                return Ok(value as usize);
            }
        }
        Err(MultistreamError::MalformedVarint)
    }

    fn read_exact_with_timeout(&mut self, buf: &mut [u8]) -> Result<(), MultistreamError> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.inner.read(&mut buf[filled..])?;
            if n == 0 {
                return Err(MultistreamError::PrematureClose);
            }
            filled += n;
        }
        Ok(())
    }
}

impl<T: Read + Write + SetReadTimeout> FrameTransport<T> {
    /// Applies the configured read timeout to the underlying stream before the next `read()`.
    /// Call once after construction (or whenever the caller-supplied timeout changes); the
    /// underlying `set_read_timeout` sticks until changed again, so this need not be called
    /// before every frame.
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
    fn zero_length_frame_round_trips() {
        let mut t = FrameTransport::new(Cursor::new(Vec::new()), FrameConfig::default());
        t.write(b"").unwrap();
        assert!(t.into_inner().into_inner().is_empty());
    }

    #[test]
    fn write_then_read_round_trips() {
        let mut writer = FrameTransport::new(Cursor::new(Vec::new()), FrameConfig::default());
        writer.write(b"hello").unwrap();
        let buf = writer.into_inner().into_inner();

        let mut reader = FrameTransport::new(Cursor::new(buf), FrameConfig::default());
        assert_eq!(reader.read().unwrap(), b"hello".to_vec());
    }

    #[test]
    fn oversized_frame_is_rejected_before_allocation() {
        let mut buf = Vec::new();
        let mut out = encode::u64_buffer();
        let prefix = encode::u64(16 * 1024 * 1024, &mut out);
        buf.extend_from_slice(prefix);
        let mut t = FrameTransport::new(Cursor::new(buf), FrameConfig::default());
        match t.read() {
            Err(MultistreamError::FrameTooLarge { .. }) => {}
            other => panic!("expected FrameTooLarge, got {:?}", other),
        }
    }

    #[test]
    fn truncated_varint_is_malformed() {
        // 10 bytes, all with the continuation bit set: never terminates.
        let buf = vec![0xFFu8; 10];
        let mut t = FrameTransport::new(Cursor::new(buf), FrameConfig::default());
        match t.read() {
            Err(MultistreamError::MalformedVarint) => {}
            other => panic!("expected MalformedVarint, got {:?}", other),
        }
    }

    #[test]
    fn premature_close_is_reported() {
        // Declares a 5-byte payload but only provides 2.
        let mut buf = Vec::new();
        let mut out = encode::u64_buffer();
        let prefix = encode::u64(5, &mut out);
        buf.extend_from_slice(prefix);
        buf.extend_from_slice(b"ab");
        let mut t = FrameTransport::new(Cursor::new(buf), FrameConfig::default());
        match t.read() {
            Err(MultistreamError::PrematureClose) => {}
            other => panic!("expected PrematureClose, got {:?}", other),
        }
    }
}
