//! Shared helpers for integration tests.

#![allow(dead_code)]

use ttymidi::{decode, Framer, FramerConfig, ReadSource, WireMessage};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Frame and decode a whole byte stream, skipping framing errors.
pub fn decode_stream(bytes: &[u8], config: FramerConfig) -> Vec<WireMessage> {
    Framer::new(ReadSource::new(bytes), config)
        .filter_map(|frame| frame.ok())
        .map(|frame| decode(&frame))
        .collect()
}
