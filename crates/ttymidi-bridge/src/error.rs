//! Error types for the bridge runner.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Wire error: {0}")]
    Wire(ttymidi_wire::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("{0} endpoint disconnected")]
    Disconnected(&'static str),

    #[error("{0} worker panicked")]
    WorkerPanicked(&'static str),
}

impl From<ttymidi_wire::Error> for Error {
    fn from(e: ttymidi_wire::Error) -> Self {
        match e {
            ttymidi_wire::Error::Io(io) => Error::Io(io),
            other => Error::Wire(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
