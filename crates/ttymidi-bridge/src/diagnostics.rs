//! Out-of-band reports for traffic that never reaches the sink.

use std::fmt;

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::debug;
use ttymidi_wire::FrameError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Vendor text block received from the serial side.
    TextComment(Vec<u8>),
    /// Framing error; the partial frame was discarded.
    FrameDropped(FrameError),
    /// Complete frame that decodes to no known message.
    Unrecognized(Vec<u8>),
    /// Outbound message with no wire form, skipped.
    EncodeRejected { kind: &'static str },
    /// Outbound frame longer than the configured maximum, skipped.
    FrameTooLarge { len: usize, limit: usize },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::TextComment(text) => {
                write!(f, "text comment: {}", String::from_utf8_lossy(text))
            }
            Diagnostic::FrameDropped(e) => write!(f, "frame dropped: {e}"),
            Diagnostic::Unrecognized(raw) => write!(f, "unrecognized: {raw:02X?}"),
            Diagnostic::EncodeRejected { kind } => write!(f, "encode rejected: {kind}"),
            Diagnostic::FrameTooLarge { len, limit } => {
                write!(f, "frame too large: {len} bytes, limit {limit}")
            }
        }
    }
}

/// Bounded channel for diagnostics. The receiver is yours to drain.
pub fn diagnostics_channel(capacity: usize) -> (Sender<Diagnostic>, Receiver<Diagnostic>) {
    bounded(capacity)
}

/// Never blocks a worker: a full or closed channel drops the report.
#[derive(Clone, Default)]
pub(crate) struct DiagnosticSender {
    sender: Option<Sender<Diagnostic>>,
}

impl DiagnosticSender {
    pub(crate) fn new(sender: Option<Sender<Diagnostic>>) -> Self {
        Self { sender }
    }

    pub(crate) fn emit(&self, diagnostic: Diagnostic) {
        if let Some(sender) = &self.sender {
            if let Err(e) = sender.try_send(diagnostic) {
                debug!("Diagnostics channel full or disconnected: {}", e);
            }
        }
    }
}
