//! Error types
//!
//! Crate-wide error taxonomy. Startup failures abort the server; protocol
//! failures terminate only the offending connection; delivery failures are
//! logged at the dispatch site and never surface here.

use std::io;

/// Convenience result type for crate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug)]
pub enum Error {
    /// I/O error on a socket or listener
    Io(io::Error),

    /// Failed to bind the listening endpoint, including the single
    /// next-port retry
    Bind {
        /// Address of the final bind attempt
        addr: String,
        /// Underlying bind failure
        source: io::Error,
    },

    /// Protocol violation on a single connection
    Protocol(ProtocolError),
}

/// Error type for per-connection protocol violations
#[derive(Debug)]
pub enum ProtocolError {
    /// Frame was not a well-formed message
    Malformed(String),

    /// Frame exceeded the configured maximum length
    FrameTooLarge(usize),

    /// Peer closed the connection before completing registration
    ConnectionClosed,

    /// Registration frame did not arrive in time
    RegistrationTimeout,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Bind { addr, source } => {
                write!(f, "Failed to bind {}: {}", addr, source)
            }
            Error::Protocol(e) => write!(f, "Protocol error: {}", e),
        }
    }
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolError::Malformed(detail) => write!(f, "Malformed message: {}", detail),
            ProtocolError::FrameTooLarge(len) => {
                write!(f, "Frame exceeds maximum length: {} bytes", len)
            }
            ProtocolError::ConnectionClosed => {
                write!(f, "Connection closed before registration")
            }
            ProtocolError::RegistrationTimeout => write!(f, "Registration timed out"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Bind { source, .. } => Some(source),
            Error::Protocol(e) => Some(e),
        }
    }
}

impl std::error::Error for ProtocolError {}

impl Error {
    /// Classify an error coming out of a frame read
    ///
    /// The codec smuggles protocol violations through `io::Error` as
    /// `InvalidData`; everything else is transport failure.
    pub(crate) fn from_read(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::InvalidData {
            return match e.into_inner() {
                Some(inner) => match inner.downcast::<ProtocolError>() {
                    Ok(protocol) => Error::Protocol(*protocol),
                    Err(other) => Error::Protocol(ProtocolError::Malformed(other.to_string())),
                },
                None => Error::Protocol(ProtocolError::Malformed("invalid data".to_string())),
            };
        }
        Error::Io(e)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Error::Protocol(e)
    }
}

impl From<serde_json::Error> for ProtocolError {
    fn from(e: serde_json::Error) -> Self {
        ProtocolError::Malformed(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Protocol(ProtocolError::Malformed(e.to_string()))
    }
}
