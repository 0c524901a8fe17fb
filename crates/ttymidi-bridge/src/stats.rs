//! Lock-free traffic counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Updated by the workers, readable from anywhere.
#[derive(Debug, Default)]
pub struct BridgeStats {
    frames_received: AtomicU64,
    messages_forwarded: AtomicU64,
    text_comments: AtomicU64,
    unrecognized: AtomicU64,
    frames_dropped: AtomicU64,
    messages_written: AtomicU64,
    bytes_written: AtomicU64,
    encode_rejections: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub frames_received: u64,
    pub messages_forwarded: u64,
    pub text_comments: u64,
    pub unrecognized: u64,
    pub frames_dropped: u64,
    pub messages_written: u64,
    pub bytes_written: u64,
    pub encode_rejections: u64,
}

#[inline]
fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl BridgeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            messages_forwarded: self.messages_forwarded.load(Ordering::Relaxed),
            text_comments: self.text_comments.load(Ordering::Relaxed),
            unrecognized: self.unrecognized.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            messages_written: self.messages_written.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            encode_rejections: self.encode_rejections.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn record_frame(&self) {
        bump(&self.frames_received);
    }

    pub(crate) fn record_forwarded(&self) {
        bump(&self.messages_forwarded);
    }

    pub(crate) fn record_text(&self) {
        bump(&self.text_comments);
    }

    pub(crate) fn record_unrecognized(&self) {
        bump(&self.unrecognized);
    }

    pub(crate) fn record_dropped(&self) {
        bump(&self.frames_dropped);
    }

    pub(crate) fn record_written(&self, bytes: usize) {
        bump(&self.messages_written);
        self.bytes_written
            .fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        bump(&self.encode_rejections);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot() {
        let stats = BridgeStats::new();
        stats.record_frame();
        stats.record_frame();
        stats.record_forwarded();
        stats.record_written(3);
        stats.record_written(5);
        stats.record_rejected();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.frames_received, 2);
        assert_eq!(snapshot.messages_forwarded, 1);
        assert_eq!(snapshot.messages_written, 2);
        assert_eq!(snapshot.bytes_written, 8);
        assert_eq!(snapshot.encode_rejections, 1);
        assert_eq!(snapshot.frames_dropped, 0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let snapshot = StatsSnapshot {
            frames_received: 7,
            bytes_written: 42,
            ..Default::default()
        };
        let bytes = bincode::serialize(&snapshot).unwrap();
        assert_eq!(bincode::deserialize::<StatsSnapshot>(&bytes).unwrap(), snapshot);
    }
}
