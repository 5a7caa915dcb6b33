//! Error types shared by the codec and both bridge clients.

use std::{io, time::Duration};

use thiserror::Error;

/// Result type for bridge operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the bridge clients.
#[derive(Error, Debug)]
pub enum Error {
    /// Connect refused, connection reset and other transport failures.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The bridge closed the connection while a reply was pending.
    #[error("connection closed by the bridge")]
    ConnectionClosed,

    /// No reply arrived within the configured timeout.
    #[error("no reply from the bridge within {0:?}")]
    TimedOut(Duration),

    /// A reply line that matches no grammar expected for the command sent.
    #[error("malformed reply: {0:?}")]
    MalformedReply(String),

    /// An error reported by the router.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Binary or text decoding failed. Reader failures during decoding
    /// become [`Error::Io`] instead.
    #[error(transparent)]
    Codec(CodecError),

    /// Invalid client configuration.
    #[error("configuration error: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Returns the router error if this is one.
    pub fn as_protocol(&self) -> Option<&ProtocolError> {
        match self {
            Error::Protocol(e) => Some(e),
            _ => None,
        }
    }

    pub(crate) fn malformed(line: impl Into<String>) -> Self {
        Error::MalformedReply(line.into())
    }
}

impl From<CodecError> for Error {
    fn from(error: CodecError) -> Self {
        match error {
            CodecError::Io { kind, message } => Error::Io(io::Error::new(kind, message)),
            other => Error::Codec(other),
        }
    }
}

/// Router-reported error conditions.
///
/// Each variant carries the message text the router sent along with it.
/// SAM result codes are noted on each variant; BOB `ERROR` lines always map
/// to [`ProtocolError::Router`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// `NOVERSION`
    #[error("protocol version not supported: {0}")]
    ProtocolNotSupported(String),

    /// `INVALID_ID`
    #[error("session id not valid: {0}")]
    SessionIdNotValid(String),

    /// `DUPLICATED_ID`
    #[error("session id already used: {0}")]
    SessionIdAlreadyUsed(String),

    /// `DUPLICATED_DEST`
    #[error("destination already used: {0}")]
    DestinationAlreadyUsed(String),

    /// `INVALID_KEY`
    #[error("key not valid: {0}")]
    KeyNotValid(String),

    /// `KEY_NOT_FOUND`
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// `CANT_REACH_PEER`
    #[error("peer not reachable: {0}")]
    PeerNotReachable(String),

    /// `PEER_NOT_FOUND`
    #[error("peer not found: {0}")]
    PeerNotFound(String),

    /// `TIMEOUT`
    #[error("router timeout: {0}")]
    Timeout(String),

    /// `I2P_ERROR`, BOB `ERROR` lines and unrecognized result codes.
    #[error("router error: {0}")]
    Router(String),
}

impl ProtocolError {
    /// Maps a SAM `RESULT=` code to its error variant.
    ///
    /// Returns `None` for `OK`, which is not an error.
    pub fn from_result_code(code: &str, message: impl Into<String>) -> Option<Self> {
        let message = message.into();
        let error = match code {
            "OK" => return None,
            "NOVERSION" => Self::ProtocolNotSupported(message),
            "INVALID_ID" => Self::SessionIdNotValid(message),
            "DUPLICATED_ID" => Self::SessionIdAlreadyUsed(message),
            "DUPLICATED_DEST" => Self::DestinationAlreadyUsed(message),
            "INVALID_KEY" => Self::KeyNotValid(message),
            "KEY_NOT_FOUND" => Self::KeyNotFound(message),
            "CANT_REACH_PEER" => Self::PeerNotReachable(message),
            "PEER_NOT_FOUND" => Self::PeerNotFound(message),
            "TIMEOUT" => Self::Timeout(message),
            _ => Self::Router(message),
        };
        Some(error)
    }

    /// The message text carried by this error.
    pub fn message(&self) -> &str {
        match self {
            Self::ProtocolNotSupported(m)
            | Self::SessionIdNotValid(m)
            | Self::SessionIdAlreadyUsed(m)
            | Self::DestinationAlreadyUsed(m)
            | Self::KeyNotValid(m)
            | Self::KeyNotFound(m)
            | Self::PeerNotReachable(m)
            | Self::PeerNotFound(m)
            | Self::Timeout(m)
            | Self::Router(m) => m,
        }
    }
}

/// Decoding failures for I2P data structures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Fewer bytes were available than the structure requires.
    #[error("truncated {structure}: expected {expected} bytes, {available} available")]
    TruncatedInput {
        structure: &'static str,
        expected: usize,
        available: usize,
    },

    /// The text form is not valid I2P Base64.
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// A certificate payload longer than its 2-byte length field allows.
    #[error("certificate payload of {len} bytes exceeds {max}")]
    PayloadTooLarge { len: usize, max: usize },

    /// The reader failed while a structure was being decoded.
    #[error("read failed: {message}")]
    Io { kind: io::ErrorKind, message: String },
}

impl From<io::Error> for CodecError {
    fn from(error: io::Error) -> Self {
        CodecError::Io {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}
