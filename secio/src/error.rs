use std::fmt;
use std::io;

use meshwire_core::CoreError;
use multistream_select::MultistreamError;

/// Everything that can make a secio handshake or an established secure channel fail (spec §7).
///
/// Every variant here is terminal: per spec §7 ("Propagation policy"), a failed handshake closes
/// the byte stream and discards all ephemeral/derived material; there is no partial-handshake
/// state an application can observe.
#[derive(Debug)]
pub enum SecioError {
    /// The underlying stream errored, timed out, or a frame couldn't be read (wraps the plaintext
    /// 32-bit framing and the varint Secure Channel framing alike).
    Transport(String),
    /// A Propose/Exchange record failed to decode, or had a field of the wrong size.
    Decode(String),
    /// No common exchange/cipher/hash across the two advertised lists (spec §4.4 Phase 3).
    NoCommonAlgorithm { which: &'static str },
    /// `order == 0`: the handshake is being run against ourselves (spec §4.4 Phase 2, §9).
    SelfConnection,
    /// The peer's `Exchange` signature didn't verify under its long-term public key.
    SignatureVerificationFailed,
    /// The Secure Channel's HMAC check failed on an inbound frame.
    MacVerificationFailed,
    /// Ephemeral Diffie-Hellman agreement failed.
    KeyAgreementFailed,
    /// The post-handshake nonce liveness check (spec §4.4 Phase 6) didn't match.
    NonceMismatch,
    /// RNG or allocation failure.
    Resource(String),
}

impl fmt::Display for SecioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecioError::Transport(msg) => write!(f, "transport error: {}", msg),
            SecioError::Decode(msg) => write!(f, "decode error: {}", msg),
            SecioError::NoCommonAlgorithm { which } => {
                write!(f, "no common {} between local and remote proposals", which)
            }
            SecioError::SelfConnection => write!(f, "refusing to complete a handshake with ourselves"),
            SecioError::SignatureVerificationFailed => write!(f, "exchange signature verification failed"),
            SecioError::MacVerificationFailed => write!(f, "secure channel MAC verification failed"),
            SecioError::KeyAgreementFailed => write!(f, "ephemeral key agreement failed"),
            SecioError::NonceMismatch => write!(f, "post-handshake nonce liveness check failed"),
            SecioError::Resource(msg) => write!(f, "resource error: {}", msg),
        }
    }
}

impl std::error::Error for SecioError {}

impl From<io::Error> for SecioError {
    fn from(e: io::Error) -> Self {
        SecioError::Transport(e.to_string())
    }
}

impl From<MultistreamError> for SecioError {
    fn from(e: MultistreamError) -> Self {
        SecioError::Transport(e.to_string())
    }
}

impl From<CoreError> for SecioError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Transport(m) => SecioError::Transport(m),
            CoreError::Protocol(m) => SecioError::Decode(m),
            CoreError::Negotiation(m) => SecioError::Decode(m),
            CoreError::Crypto(m) => SecioError::Decode(m),
            CoreError::Resource(m) => SecioError::Resource(m),
        }
    }
}

impl From<SecioError> for CoreError {
    fn from(e: SecioError) -> Self {
        match e {
            SecioError::Transport(m) => CoreError::Transport(m),
            SecioError::Decode(m) => CoreError::Protocol(m),
            SecioError::NoCommonAlgorithm { which } => {
                CoreError::Negotiation(format!("no common {}", which))
            }
            SecioError::SelfConnection => CoreError::Negotiation("self-connection".into()),
            SecioError::SignatureVerificationFailed
            | SecioError::MacVerificationFailed
            | SecioError::KeyAgreementFailed
            | SecioError::NonceMismatch => CoreError::Crypto(e.to_string()),
            SecioError::Resource(m) => CoreError::Resource(m),
        }
    }
}
