//! # ttymidi - serial MIDI bridge
//!
//! Bridges a byte-oriented serial line carrying MIDI (plus a vendor text
//! extension) to a structured, bidirectional event bus.
//!
//! ## Architecture
//!
//! ttymidi is an umbrella crate over:
//! - **ttymidi-wire** - message model, byte-stream framer, decode/encode
//! - **ttymidi-bridge** - inbound/outbound workers, serial reader pump,
//!   sink/source seams, cancellation, diagnostics
//!
//! ## Quick Start
//!
//! ```no_run
//! use ttymidi::prelude::*;
//!
//! # fn main() -> ttymidi::Result<()> {
//! let bus = bus_channel(256);
//! let handle = Bridge::builder()
//!     .serial_device("/dev/ttyUSB0")
//!     .build()?
//!     .spawn_serial(bus.sink, bus.source)?;
//!
//! bus.to_serial
//!     .send(WireMessage::note_on(0, 60, 100))
//!     .ok();
//! for msg in bus.from_serial.iter().take(16) {
//!     println!("{msg}");
//! }
//!
//! handle.shutdown().into_result()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - `bridge`
//! - `bridge` - worker threads and serial transport; without it only the
//!   wire layer is built

/// Re-export of ttymidi-wire for direct access
pub use ttymidi_wire as wire;

pub use ttymidi_wire::{
    decode, decode_bytes, encode, encode_into, ByteSource, ChannelVoice, ChannelVoiceKind,
    FrameError, FrameParser, Framer, FramerConfig, RawFrame, ReadSource, SystemCommon,
    SystemRealtime, WireMessage,
};

/// Bridge runner and transports.
#[cfg(feature = "bridge")]
pub use ttymidi_bridge as bridge;

#[cfg(feature = "bridge")]
pub use ttymidi_bridge::{
    bus_channel, diagnostics_channel, Bridge, BridgeBuilder, BridgeConfig, BridgeExit,
    BridgeHandle, ByteSink, CancellationToken, Diagnostic, DirectionExit, MessageSink,
    MessageSource, PumpedSource, SerialPort, StatsSnapshot, TracingSink,
};

mod error;
pub use error::{Error, Result};

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{decode, encode, Framer, FramerConfig, WireMessage};

    #[cfg(feature = "bridge")]
    pub use crate::{bus_channel, Bridge, BridgeConfig, CancellationToken, MessageSink, MessageSource};
}
