use std::error::Error;
use std::fmt;

/// Cross-cutting error taxonomy shared by every layer of the core (spec §7).
///
/// Each crate defines its own local error enum for the failures specific to its layer and
/// converts into one of these variants at the point where the error crosses into a caller that
/// doesn't care about the originating layer (e.g. a `ProtocolHandler::handle` return value).
#[derive(Debug)]
pub enum CoreError {
    /// Underlying stream closed, timed out, or a frame's length prefix was malformed or
    /// unsatisfiable.
    Transport(String),
    /// Unexpected identifier, unknown record field, decoder failure.
    Protocol(String),
    /// Empty intersection of supported algorithms, or a self-connection (`order == 0`).
    Negotiation(String),
    /// Signature verification failure, MAC verification failure, DH failure, nonce mismatch.
    Crypto(String),
    /// Allocation failure, RNG failure.
    Resource(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::Transport(msg) => write!(f, "transport error: {}", msg),
            CoreError::Protocol(msg) => write!(f, "protocol error: {}", msg),
            CoreError::Negotiation(msg) => write!(f, "negotiation error: {}", msg),
            CoreError::Crypto(msg) => write!(f, "crypto error: {}", msg),
            CoreError::Resource(msg) => write!(f, "resource error: {}", msg),
        }
    }
}

impl Error for CoreError {}
