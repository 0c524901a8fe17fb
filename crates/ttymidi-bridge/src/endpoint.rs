//! Event bus seams: where inbound messages go and outbound messages come from.

use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use tracing::{info, warn};
use ttymidi_wire::WireMessage;

use crate::error::{Error, Result};

const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_millis(100);

/// Receives every decoded inbound message, once, in arrival order.
///
/// Must not block indefinitely. An error ends the inbound direction.
pub trait MessageSink {
    fn accept(&mut self, msg: WireMessage) -> Result<()>;
}

impl<F: FnMut(WireMessage)> MessageSink for F {
    fn accept(&mut self, msg: WireMessage) -> Result<()> {
        self(msg);
        Ok(())
    }
}

/// Supplies outbound messages.
pub trait MessageSource {
    /// Append every message available now to `out`, waiting at most `timeout`
    /// for the first one. Returns [`Error::Disconnected`] once no more
    /// messages can ever arrive.
    fn poll(&mut self, out: &mut Vec<WireMessage>, timeout: Duration) -> Result<()>;
}

/// Bridge side of a [`bus_channel`], inbound.
pub struct ChannelSink {
    sender: Sender<WireMessage>,
    send_timeout: Duration,
}

impl ChannelSink {
    pub fn new(sender: Sender<WireMessage>) -> Self {
        Self {
            sender,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    /// How long to wait on a full bus before dropping the message.
    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }
}

impl MessageSink for ChannelSink {
    fn accept(&mut self, msg: WireMessage) -> Result<()> {
        match self.sender.send_timeout(msg, self.send_timeout) {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Timeout(msg)) => {
                warn!("Event bus full, dropping {}", msg);
                Ok(())
            }
            Err(SendTimeoutError::Disconnected(_)) => Err(Error::Disconnected("sink")),
        }
    }
}

/// Bridge side of a [`bus_channel`], outbound.
pub struct ChannelSource {
    receiver: Receiver<WireMessage>,
}

impl ChannelSource {
    pub fn new(receiver: Receiver<WireMessage>) -> Self {
        Self { receiver }
    }
}

impl MessageSource for ChannelSource {
    fn poll(&mut self, out: &mut Vec<WireMessage>, timeout: Duration) -> Result<()> {
        match self.receiver.recv_timeout(timeout) {
            Ok(msg) => {
                out.push(msg);
                out.extend(self.receiver.try_iter());
                Ok(())
            }
            Err(RecvTimeoutError::Timeout) => Ok(()),
            Err(RecvTimeoutError::Disconnected) => Err(Error::Disconnected("source")),
        }
    }
}

/// Both ends of an in-process event bus.
///
/// Hand `sink` and `source` to the bridge; the application reads serial
/// traffic from `from_serial` and queues outbound traffic on `to_serial`.
pub struct Bus {
    pub sink: ChannelSink,
    pub source: ChannelSource,
    pub from_serial: Receiver<WireMessage>,
    pub to_serial: Sender<WireMessage>,
}

pub fn bus_channel(capacity: usize) -> Bus {
    let (inbound_tx, inbound_rx) = bounded(capacity);
    let (outbound_tx, outbound_rx) = bounded(capacity);
    Bus {
        sink: ChannelSink::new(inbound_tx),
        source: ChannelSource::new(outbound_rx),
        from_serial: inbound_rx,
        to_serial: outbound_tx,
    }
}

/// Logs each message and discards it.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl MessageSink for TracingSink {
    fn accept(&mut self, msg: WireMessage) -> Result<()> {
        info!("Serial {}", msg);
        Ok(())
    }
}

/// Never yields anything; for inbound-only bridges.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSource;

impl MessageSource for NullSource {
    fn poll(&mut self, _out: &mut Vec<WireMessage>, timeout: Duration) -> Result<()> {
        std::thread::sleep(timeout);
        Ok(())
    }
}
