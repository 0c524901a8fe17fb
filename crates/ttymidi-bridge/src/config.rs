//! Bridge configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use ttymidi_wire::{FramerConfig, DEFAULT_MAX_FRAME_SIZE, MAX_TEXT_LEN};

use crate::error::{Error, Result};

pub const DEFAULT_SERIAL_DEVICE: &str = "/dev/ttyUSB0";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
pub const DEFAULT_BYTE_QUEUE_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Character device opened by [`Bridge::spawn_serial`](crate::Bridge::spawn_serial).
    /// Line settings (baud rate, raw mode) must already be applied.
    pub serial_device: PathBuf,
    /// Largest sysex frame accepted, 0xF0 and 0xF7 included.
    pub max_frame_size: usize,
    /// Vendor text blocks longer than this are clamped.
    pub max_text_size: usize,
    /// Upper bound on how long a worker waits before rechecking cancellation.
    pub poll_interval_ms: u64,
    /// Bytes buffered between the serial reader pump and the inbound worker.
    pub byte_queue_capacity: usize,
    pub running_status: bool,
    /// Log every received byte in hex and forward nothing.
    pub raw_dump: bool,
    /// Log vendor text comments at info level.
    pub log_text_comments: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            serial_device: PathBuf::from(DEFAULT_SERIAL_DEVICE),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            max_text_size: MAX_TEXT_LEN,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            byte_queue_capacity: DEFAULT_BYTE_QUEUE_CAPACITY,
            running_status: true,
            raw_dump: false,
            log_text_comments: true,
        }
    }
}

impl BridgeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_frame_size < 2 {
            return Err(Error::InvalidConfig(format!(
                "max_frame_size must fit at least F0 F7, got {}",
                self.max_frame_size
            )));
        }
        if self.max_text_size == 0 {
            return Err(Error::InvalidConfig(
                "max_text_size must be non-zero".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::InvalidConfig(
                "poll_interval_ms must be non-zero".to_string(),
            ));
        }
        if self.byte_queue_capacity == 0 {
            return Err(Error::InvalidConfig(
                "byte_queue_capacity must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn framer_config(&self) -> FramerConfig {
        FramerConfig {
            max_frame_size: self.max_frame_size,
            max_text_size: self.max_text_size,
            running_status: self.running_status,
        }
    }
}
