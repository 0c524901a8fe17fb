//! Serial MIDI to event bus bridge.
//!
//! Two workers share a [`CancellationToken`]:
//! - **inbound**: serial bytes → [`Framer`](ttymidi_wire::Framer) →
//!   [`decode`](ttymidi_wire::decode) → [`MessageSink`]
//! - **outbound**: [`MessageSource`] → [`encode`](ttymidi_wire::encode) →
//!   [`ByteSink`], flushed per message
//!
//! Vendor text comments, unrecognized frames and framing errors never reach
//! the sink; they are logged and reported as [`Diagnostic`]s.

pub mod error;
pub use error::{Error, Result};

mod cancel;
pub use cancel::CancellationToken;

mod config;
pub use config::{
    BridgeConfig, DEFAULT_BYTE_QUEUE_CAPACITY, DEFAULT_POLL_INTERVAL_MS, DEFAULT_SERIAL_DEVICE,
};

mod diagnostics;
pub use diagnostics::{diagnostics_channel, Diagnostic};

mod stats;
pub use stats::{BridgeStats, StatsSnapshot};

mod endpoint;
pub use endpoint::{
    bus_channel, Bus, ChannelSink, ChannelSource, MessageSink, MessageSource, NullSource,
    TracingSink,
};

mod transport;
pub use transport::{ByteSink, PumpedSource, SerialPort};

mod bridge;
pub use bridge::{Bridge, BridgeBuilder, BridgeExit, BridgeHandle, DirectionExit};
