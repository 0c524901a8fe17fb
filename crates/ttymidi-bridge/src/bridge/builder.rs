//! Fluent configuration for [`Bridge`].

use std::path::PathBuf;
use std::time::Duration;

use crossbeam_channel::Sender;

use super::Bridge;
use crate::config::BridgeConfig;
use crate::diagnostics::Diagnostic;
use crate::error::Result;

#[derive(Default)]
pub struct BridgeBuilder {
    config: BridgeConfig,
    diagnostics: Option<Sender<Diagnostic>>,
}

impl BridgeBuilder {
    /// Replace every setting at once, e.g. with one loaded from a file.
    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn serial_device(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.serial_device = path.into();
        self
    }

    pub fn max_frame_size(mut self, bytes: usize) -> Self {
        self.config.max_frame_size = bytes;
        self
    }

    pub fn max_text_size(mut self, bytes: usize) -> Self {
        self.config.max_text_size = bytes;
        self
    }

    /// Rounded down to whole milliseconds.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn byte_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.byte_queue_capacity = capacity;
        self
    }

    pub fn running_status(mut self, enabled: bool) -> Self {
        self.config.running_status = enabled;
        self
    }

    /// Log raw serial bytes and forward nothing.
    pub fn raw_dump(mut self) -> Self {
        self.config.raw_dump = true;
        self
    }

    /// Stop logging vendor text comments. They still go to diagnostics.
    pub fn quiet(mut self) -> Self {
        self.config.log_text_comments = false;
        self
    }

    /// Receive text comments, dropped frames and rejected messages.
    pub fn diagnostics(mut self, sender: Sender<Diagnostic>) -> Self {
        self.diagnostics = Some(sender);
        self
    }

    pub fn build(self) -> Result<Bridge> {
        let mut bridge = Bridge::new(self.config)?;
        bridge.diagnostics = self.diagnostics;
        Ok(bridge)
    }
}
