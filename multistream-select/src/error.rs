use std::fmt;
use std::io;

use meshwire_core::CoreError;

/// Errors produced by the Frame Transport and the Multistream Negotiator (spec §4.1, §4.2).
#[derive(Debug)]
pub enum MultistreamError {
    /// The underlying stream returned an I/O error (includes read timeouts).
    Io(io::Error),
    /// The stream closed before the declared frame length could be satisfied.
    PrematureClose,
    /// A varint length prefix did not terminate within 10 bytes, or had no bytes at all.
    MalformedVarint,
    /// A frame's declared length exceeded the configured cap.
    FrameTooLarge { declared: usize, max: usize },
    /// The peer echoed back a different identifier than the one proposed.
    IdentifierMismatch { expected: String, got: String },
    /// The peer's opening line didn't look like a multistream identifier at all.
    NotMultistream(String),
}

impl fmt::Display for MultistreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MultistreamError::Io(e) => write!(f, "I/O error: {}", e),
            MultistreamError::PrematureClose => write!(f, "stream closed before frame was complete"),
            MultistreamError::MalformedVarint => write!(f, "malformed varint length prefix"),
            MultistreamError::FrameTooLarge { declared, max } => {
                write!(f, "frame length {} exceeds cap of {} bytes", declared, max)
            }
            MultistreamError::IdentifierMismatch { expected, got } => write!(
                f,
                "protocol identifier mismatch: proposed {:?}, peer echoed {:?}",
                expected, got
            ),
            MultistreamError::NotMultistream(line) => {
                write!(f, "peer's opening line {:?} is not a multistream identifier", line)
            }
        }
    }
}

impl std::error::Error for MultistreamError {}

impl From<io::Error> for MultistreamError {
    fn from(e: io::Error) -> Self {
        MultistreamError::Io(e)
    }
}

impl From<MultistreamError> for CoreError {
    fn from(e: MultistreamError) -> Self {
        match e {
            MultistreamError::Io(_)
            | MultistreamError::PrematureClose
            | MultistreamError::MalformedVarint
            | MultistreamError::FrameTooLarge { .. } => CoreError::Transport(e.to_string()),
            MultistreamError::IdentifierMismatch { .. } | MultistreamError::NotMultistream(_) => {
                CoreError::Protocol(e.to_string())
            }
        }
    }
}
