//! MIDI wire layer for serial links.
//!
//! Turns an unbounded byte stream into discrete frames, frames into typed
//! [`WireMessage`]s, and messages back into minimal wire bytes.
//!
//! - **Framing**: [`FrameParser`] (push bytes, pop frames) and [`Framer`]
//!   (pulls from a [`ByteSource`], iterates frames)
//! - **Translation**: [`decode`] / [`encode`], pure and stateless
//! - **Vendor text**: `FF 00 00 <len> <text>` blocks become
//!   [`WireMessage::TextComment`]
//!
//! # Example
//!
//! ```
//! use ttymidi_wire::{decode, encode, Framer, FramerConfig, ReadSource, WireMessage};
//!
//! let bytes: &[u8] = &[0x90, 0x40, 0x7F, 0xF8];
//! let messages: Vec<WireMessage> = Framer::new(ReadSource::new(bytes), FramerConfig::default())
//!     .filter_map(|frame| frame.ok())
//!     .map(|frame| decode(&frame))
//!     .collect();
//!
//! assert_eq!(messages[0], WireMessage::note_on(0, 64, 127));
//! assert_eq!(encode(&messages[0]).unwrap(), vec![0x90, 0x40, 0x7F]);
//! ```

pub mod error;
pub use error::{Error, FrameError, Result};

mod message;
pub use message::{
    ChannelVoice, ChannelVoiceKind, SystemCommon, SystemRealtime, WireMessage, MAX_14BIT,
    MAX_TEXT_LEN, PITCH_BEND_CENTER,
};

pub mod frame;
pub use frame::RawFrame;

mod framer;
pub use framer::{
    ByteSource, FrameParser, Framer, FramerConfig, ReadSource, DEFAULT_MAX_FRAME_SIZE,
};

mod translate;
pub use translate::{decode, decode_bytes, encode, encode_into};
