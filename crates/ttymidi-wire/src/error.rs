//! Error types for framing and translation.

use thiserror::Error;

/// Recoverable framing failures. The framer has already reset when one of
/// these is returned; the caller just keeps pulling frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame exceeds {limit} bytes, dropped")]
    FrameTooLarge { limit: usize },

    #[error("status byte {status:#04X} interrupted a frame, {} byte(s) abandoned", abandoned.len())]
    MalformedFrame { status: u8, abandoned: Vec<u8> },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Framing error: {0}")]
    Frame(#[from] FrameError),

    #[error("{kind} has no wire representation")]
    EncodeContract { kind: &'static str },
}

impl Error {
    /// Framing errors leave the stream usable; everything else ends it.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Frame(_))
    }

    /// End of the byte stream, as opposed to a transport failure.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
