//! Raw frames and the per-status length table.

use smallvec::SmallVec;

/// One complete unit cut from the byte stream. Boundaries only, no meaning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RawFrame {
    /// Status byte followed by its data bytes.
    Short(SmallVec<[u8; 3]>),
    /// Complete `F0 ... F7` block, delimiters included.
    SysEx(Vec<u8>),
    /// Body of a vendor text block; marker and length byte stripped.
    Text(Vec<u8>),
}

impl RawFrame {
    pub fn short(bytes: &[u8]) -> Self {
        Self::Short(SmallVec::from_slice(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Short(bytes) => bytes.as_slice(),
            Self::SysEx(bytes) | Self::Text(bytes) => bytes.as_slice(),
        }
    }

    /// Leading status byte. Text frames have none.
    pub fn status(&self) -> Option<u8> {
        match self {
            Self::Short(bytes) => bytes.first().copied(),
            Self::SysEx(_) => Some(0xF0),
            Self::Text(_) => None,
        }
    }
}

/// How many data bytes a status byte expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameLen {
    Fixed(usize),
    /// Runs until 0xF7.
    SysEx,
    /// No defined payload; emitted alone and reported as unrecognized.
    Undefined,
}

pub fn frame_len(status: u8) -> FrameLen {
    match status {
        0x80..=0xEF => match status & 0xF0 {
            0xC0 | 0xD0 => FrameLen::Fixed(1),
            _ => FrameLen::Fixed(2),
        },
        0xF0 => FrameLen::SysEx,
        0xF1 | 0xF3 => FrameLen::Fixed(1),
        0xF2 => FrameLen::Fixed(2),
        0xF6 | 0xF8..=0xFE => FrameLen::Fixed(0),
        // Serial links reuse 0xFF as the first byte of the `FF 00 00` text marker.
        0xFF => FrameLen::Fixed(2),
        _ => FrameLen::Undefined,
    }
}

#[inline]
pub fn is_status(byte: u8) -> bool {
    byte & 0x80 != 0
}

/// Real-time bytes may appear anywhere, even inside another frame.
#[inline]
pub fn is_realtime(byte: u8) -> bool {
    (0xF8..=0xFE).contains(&byte)
}
