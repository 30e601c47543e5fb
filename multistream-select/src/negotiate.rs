//! Multistream protocol-identifier negotiation (spec §4.2).
//!
//! Both the `/multistream/1.0.0` handshake and every subsequent sub-protocol pick use the same
//! dance: write a proposed identifier as one frame, read the peer's identifier as one frame, and
//! the protocol is selected if the two match.

use std::io::{Read, Write};

use log::{debug, trace};

use crate::error::MultistreamError;
use crate::frame::FrameTransport;

/// The fixed multistream version identifier (spec §6).
pub const MULTISTREAM_PROTOCOL_ID: &str = "/multistream/1.0.0\n";

/// Exchanges and verifies one protocol identifier: writes `proposed`, reads the peer's frame back,
/// and errors with [`MultistreamError::IdentifierMismatch`] unless the two are equal (spec §4.2).
/// Used symmetrically by both the listener and the dialer for every identifier in the
/// negotiation chain, including the `/multistream/1.0.0` line itself.
pub fn propose_and_expect_echo<T: Read + Write>(
    transport: &mut FrameTransport<T>,
    proposed: &str,
) -> Result<(), MultistreamError> {
    transport.write(proposed.as_bytes())?;
    let echoed = transport.read()?;
    let echoed_str = String::from_utf8_lossy(&echoed).into_owned();
    if echoed.as_slice() != proposed.as_bytes() {
        return Err(MultistreamError::IdentifierMismatch {
            expected: proposed.to_owned(),
            got: echoed_str,
        });
    }
    Ok(())
}

/// Listener-side entry point: performs the `/multistream/1.0.0` handshake, then negotiates one
/// sub-protocol from `candidates` in order, returning the first one the peer echoes back.
pub fn negotiate_as_listener<T: Read + Write>(
    transport: &mut FrameTransport<T>,
    candidates: &[&str],
) -> Result<String, MultistreamError> {
    propose_and_expect_echo(transport, MULTISTREAM_PROTOCOL_ID)?;
    debug!("multistream version agreed");
    for candidate in candidates {
        match propose_and_expect_echo(transport, candidate) {
            Ok(()) => {
                trace!("selected sub-protocol {}", candidate);
                return Ok((*candidate).to_owned());
            }
            Err(MultistreamError::IdentifierMismatch { .. }) => continue,
            Err(e) => return Err(e),
        }
    }
    Err(MultistreamError::IdentifierMismatch {
        expected: candidates.join(","),
        got: String::new(),
    })
}

/// Dialer-side entry point (spec §4.2, "Client-side helper"): reads the peer's identifier first
/// (the convention is that the side accepting a connection speaks first), checks it looks like a
/// multistream greeting, then echoes it back before proposing `protocol`.
pub fn negotiate_as_dialer<T: Read + Write>(
    transport: &mut FrameTransport<T>,
    protocol: &str,
) -> Result<(), MultistreamError> {
    let greeting = transport.read()?;
    let greeting_str = String::from_utf8_lossy(&greeting).into_owned();
    if !greeting_str.contains("multistream") {
        return Err(MultistreamError::NotMultistream(greeting_str));
    }
    transport.write(&greeting)?;
    propose_and_expect_echo(transport, protocol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameConfig;
    use std::io::Cursor;

    #[test]
    fn mismatched_identifier_is_rejected() {
        let mut buf = Vec::new();
        {
            let mut t = FrameTransport::new(Cursor::new(Vec::new()), FrameConfig::default());
            t.write(b"/something/else\n").unwrap();
            buf = t.into_inner().into_inner();
        }
        let mut t = FrameTransport::new(Cursor::new(buf), FrameConfig::default());
        match propose_and_expect_echo(&mut t, "/multistream/1.0.0\n") {
            Err(MultistreamError::IdentifierMismatch { .. }) => {}
            other => panic!("expected IdentifierMismatch, got {:?}", other),
        }
    }
}
