//! Typed representation of one discrete MIDI or vendor message.
//!
//! Values are built fresh per inbound frame and never mutated afterwards.
//! 14-bit quantities (pitch bend, song position) are stored unsigned; the
//! signed pitch bend view is only offered through the `*_signed` helpers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pitch bend value with no bend applied.
pub const PITCH_BEND_CENTER: u16 = 8192;

/// Largest value carried by two 7-bit data bytes.
pub const MAX_14BIT: u16 = 0x3FFF;

/// Longest text payload accepted from the vendor text extension.
pub const MAX_TEXT_LEN: usize = 1023;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelVoiceKind {
    NoteOff,
    NoteOn,
    PolyPressure,
    ControlChange,
    ProgramChange,
    ChannelPressure,
    PitchBend,
}

impl ChannelVoiceKind {
    /// Looks up the kind from a status byte, ignoring the channel nibble.
    pub fn from_status(status: u8) -> Option<Self> {
        match status & 0xF0 {
            0x80 => Some(Self::NoteOff),
            0x90 => Some(Self::NoteOn),
            0xA0 => Some(Self::PolyPressure),
            0xB0 => Some(Self::ControlChange),
            0xC0 => Some(Self::ProgramChange),
            0xD0 => Some(Self::ChannelPressure),
            0xE0 => Some(Self::PitchBend),
            _ => None,
        }
    }

    #[inline]
    pub fn status_nibble(self) -> u8 {
        match self {
            Self::NoteOff => 0x80,
            Self::NoteOn => 0x90,
            Self::PolyPressure => 0xA0,
            Self::ControlChange => 0xB0,
            Self::ProgramChange => 0xC0,
            Self::ChannelPressure => 0xD0,
            Self::PitchBend => 0xE0,
        }
    }

    /// Number of data bytes following the status byte.
    #[inline]
    pub fn data_len(self) -> usize {
        match self {
            Self::ProgramChange | Self::ChannelPressure => 1,
            _ => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::NoteOff => "Note off",
            Self::NoteOn => "Note on",
            Self::PolyPressure => "Pressure change",
            Self::ControlChange => "Controller change",
            Self::ProgramChange => "Program change",
            Self::ChannelPressure => "Channel press",
            Self::PitchBend => "Pitch bend",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelVoice {
    pub kind: ChannelVoiceKind,
    /// 0-15
    pub channel: u8,
    pub data1: u8,
    /// `None` for program change and channel pressure.
    pub data2: Option<u8>,
}

impl ChannelVoice {
    /// Channel is clamped to 15 and data bytes masked to 7 bits. `data2` is
    /// dropped for kinds that carry a single data byte.
    pub fn new(kind: ChannelVoiceKind, channel: u8, data1: u8, data2: u8) -> Self {
        Self {
            kind,
            channel: channel.min(15),
            data1: data1 & 0x7F,
            data2: (kind.data_len() == 2).then_some(data2 & 0x7F),
        }
    }

    #[inline]
    pub fn status(&self) -> u8 {
        self.kind.status_nibble() | (self.channel & 0x0F)
    }

    /// Unsigned 14-bit bend (0-16383, 8192 = center).
    pub fn bend(&self) -> Option<u16> {
        match self.kind {
            ChannelVoiceKind::PitchBend => {
                let low = u16::from(self.data1 & 0x7F);
                let high = u16::from(self.data2.unwrap_or(0) & 0x7F);
                Some(low | (high << 7))
            }
            _ => None,
        }
    }

    /// Signed bend (-8192 to 8191, 0 = center).
    pub fn bend_signed(&self) -> Option<i16> {
        self.bend()
            .map(|bend| bend as i16 - PITCH_BEND_CENTER as i16)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemCommon {
    MtcQuarterFrame(u8),
    /// Beats since song start, 14-bit.
    SongPosition(u16),
    SongSelect(u8),
    TuneRequest,
}

impl SystemCommon {
    #[inline]
    pub fn status(&self) -> u8 {
        match self {
            Self::MtcQuarterFrame(_) => 0xF1,
            Self::SongPosition(_) => 0xF2,
            Self::SongSelect(_) => 0xF3,
            Self::TuneRequest => 0xF6,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::MtcQuarterFrame(_) => "MTC quarter frame",
            Self::SongPosition(_) => "Song position",
            Self::SongSelect(_) => "Song select",
            Self::TuneRequest => "Tune request",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemRealtime {
    Clock,
    Start,
    Continue,
    Stop,
    ActiveSensing,
}

impl SystemRealtime {
    pub fn from_status(status: u8) -> Option<Self> {
        match status {
            0xF8 => Some(Self::Clock),
            0xFA => Some(Self::Start),
            0xFB => Some(Self::Continue),
            0xFC => Some(Self::Stop),
            0xFE => Some(Self::ActiveSensing),
            _ => None,
        }
    }

    #[inline]
    pub fn status(&self) -> u8 {
        match self {
            Self::Clock => 0xF8,
            Self::Start => 0xFA,
            Self::Continue => 0xFB,
            Self::Stop => 0xFC,
            Self::ActiveSensing => 0xFE,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Clock => "Clock",
            Self::Start => "Start",
            Self::Continue => "Continue",
            Self::Stop => "Stop",
            Self::ActiveSensing => "Active sense",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WireMessage {
    ChannelVoice(ChannelVoice),
    /// Payload without the 0xF0/0xF7 delimiters.
    SysEx { payload: Vec<u8> },
    SystemCommon(SystemCommon),
    SystemRealtime(SystemRealtime),
    /// Vendor debug text (`FF 00 00 <len> <text>`). Not MIDI.
    TextComment { text: Vec<u8> },
    /// Bytes kept for diagnostics. Never re-encoded.
    Unrecognized { raw: Vec<u8> },
}

impl WireMessage {
    pub fn note_on(channel: u8, note: u8, velocity: u8) -> Self {
        Self::channel_voice(ChannelVoiceKind::NoteOn, channel, note, velocity)
    }

    pub fn note_off(channel: u8, note: u8, velocity: u8) -> Self {
        Self::channel_voice(ChannelVoiceKind::NoteOff, channel, note, velocity)
    }

    pub fn poly_pressure(channel: u8, note: u8, pressure: u8) -> Self {
        Self::channel_voice(ChannelVoiceKind::PolyPressure, channel, note, pressure)
    }

    pub fn control_change(channel: u8, control: u8, value: u8) -> Self {
        Self::channel_voice(ChannelVoiceKind::ControlChange, channel, control, value)
    }

    pub fn program_change(channel: u8, program: u8) -> Self {
        Self::channel_voice(ChannelVoiceKind::ProgramChange, channel, program, 0)
    }

    pub fn channel_pressure(channel: u8, pressure: u8) -> Self {
        Self::channel_voice(ChannelVoiceKind::ChannelPressure, channel, pressure, 0)
    }

    /// `bend`: unsigned 14-bit (0 to 16383, 8192 = center).
    pub fn pitch_bend(channel: u8, bend: u16) -> Self {
        let bend = bend.min(MAX_14BIT);
        Self::channel_voice(
            ChannelVoiceKind::PitchBend,
            channel,
            (bend & 0x7F) as u8,
            (bend >> 7) as u8,
        )
    }

    /// `value`: signed 14-bit (-8192 to 8191).
    pub fn pitch_bend_signed(channel: u8, value: i16) -> Self {
        let unsigned = (i32::from(value) + i32::from(PITCH_BEND_CENTER)).clamp(0, 16383) as u16;
        Self::pitch_bend(channel, unsigned)
    }

    pub fn sysex(payload: impl Into<Vec<u8>>) -> Self {
        let mut payload = payload.into();
        for byte in &mut payload {
            *byte &= 0x7F;
        }
        Self::SysEx { payload }
    }

    pub fn quarter_frame(value: u8) -> Self {
        Self::SystemCommon(SystemCommon::MtcQuarterFrame(value & 0x7F))
    }

    pub fn song_position(beats: u16) -> Self {
        Self::SystemCommon(SystemCommon::SongPosition(beats.min(MAX_14BIT)))
    }

    pub fn song_select(song: u8) -> Self {
        Self::SystemCommon(SystemCommon::SongSelect(song & 0x7F))
    }

    pub fn tune_request() -> Self {
        Self::SystemCommon(SystemCommon::TuneRequest)
    }

    pub fn realtime(kind: SystemRealtime) -> Self {
        Self::SystemRealtime(kind)
    }

    /// Text longer than [`MAX_TEXT_LEN`] is cut.
    pub fn text_comment(text: impl Into<Vec<u8>>) -> Self {
        let mut text = text.into();
        text.truncate(MAX_TEXT_LEN);
        Self::TextComment { text }
    }

    fn channel_voice(kind: ChannelVoiceKind, channel: u8, data1: u8, data2: u8) -> Self {
        Self::ChannelVoice(ChannelVoice::new(kind, channel, data1, data2))
    }

    pub fn channel(&self) -> Option<u8> {
        match self {
            Self::ChannelVoice(cv) => Some(cv.channel),
            _ => None,
        }
    }

    pub fn bend(&self) -> Option<u16> {
        match self {
            Self::ChannelVoice(cv) => cv.bend(),
            _ => None,
        }
    }

    pub fn bend_signed(&self) -> Option<i16> {
        match self {
            Self::ChannelVoice(cv) => cv.bend_signed(),
            _ => None,
        }
    }

    #[inline]
    pub fn is_realtime(&self) -> bool {
        matches!(self, Self::SystemRealtime(_))
    }

    /// Whether the message belongs on the event bus. Text comments and
    /// unrecognized bytes are local diagnostics only.
    #[inline]
    pub fn is_forwardable(&self) -> bool {
        !matches!(self, Self::TextComment { .. } | Self::Unrecognized { .. })
    }

    pub fn text_lossy(&self) -> Option<String> {
        match self {
            Self::TextComment { text } => Some(String::from_utf8_lossy(text).into_owned()),
            _ => None,
        }
    }

    /// Variant name, used in logs and contract errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::ChannelVoice(_) => "ChannelVoice",
            Self::SysEx { .. } => "SysEx",
            Self::SystemCommon(_) => "SystemCommon",
            Self::SystemRealtime(_) => "SystemRealtime",
            Self::TextComment { .. } => "TextComment",
            Self::Unrecognized { .. } => "Unrecognized",
        }
    }
}

impl From<ChannelVoice> for WireMessage {
    fn from(cv: ChannelVoice) -> Self {
        Self::ChannelVoice(cv)
    }
}

impl From<SystemCommon> for WireMessage {
    fn from(msg: SystemCommon) -> Self {
        Self::SystemCommon(msg)
    }
}

impl From<SystemRealtime> for WireMessage {
    fn from(msg: SystemRealtime) -> Self {
        Self::SystemRealtime(msg)
    }
}

fn write_hex(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    for byte in bytes {
        write!(f, " {:02X}", byte)?;
    }
    Ok(())
}

impl fmt::Display for WireMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChannelVoice(cv) => {
                write!(f, "{} ch={}", cv.kind.name(), cv.channel)?;
                match (cv.bend(), cv.data2) {
                    (Some(bend), _) => write!(f, " {:04X}", bend),
                    (None, Some(data2)) => write!(f, " {:02X} {:02X}", cv.data1, data2),
                    (None, None) => write!(f, " {:02X}", cv.data1),
                }
            }
            Self::SysEx { payload } => {
                write!(f, "Sysex len={:04X}", payload.len())?;
                write_hex(f, payload)
            }
            Self::SystemCommon(common) => match common {
                SystemCommon::MtcQuarterFrame(v) | SystemCommon::SongSelect(v) => {
                    write!(f, "{} {:02X}", common.name(), v)
                }
                SystemCommon::SongPosition(v) => write!(f, "{} {:04X}", common.name(), v),
                SystemCommon::TuneRequest => f.write_str(common.name()),
            },
            Self::SystemRealtime(rt) => f.write_str(rt.name()),
            Self::TextComment { text } => {
                write!(
                    f,
                    "Text len={:04X} {}",
                    text.len(),
                    String::from_utf8_lossy(text)
                )
            }
            Self::Unrecognized { raw } => {
                f.write_str("Unrecognized")?;
                write_hex(f, raw)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_clamp_and_mask() {
        let msg = WireMessage::note_on(200, 0xFF, 0x80);
        assert_eq!(
            msg,
            WireMessage::ChannelVoice(ChannelVoice {
                kind: ChannelVoiceKind::NoteOn,
                channel: 15,
                data1: 0x7F,
                data2: Some(0),
            })
        );
    }

    #[test]
    fn test_sysex_payload_masked() {
        let msg = WireMessage::sysex(vec![0x80, 0x01, 0xFF]);
        assert_eq!(
            msg,
            WireMessage::SysEx {
                payload: vec![0x00, 0x01, 0x7F]
            }
        );
        let bytes = crate::encode(&msg).unwrap();
        assert_eq!(bytes, vec![0xF0, 0x00, 0x01, 0x7F, 0xF7]);
        assert_eq!(crate::decode_bytes(&bytes), msg);
    }

    #[test]
    fn test_single_data_kinds_drop_data2() {
        let WireMessage::ChannelVoice(cv) = WireMessage::program_change(3, 42) else {
            panic!("expected channel voice");
        };
        assert_eq!(cv.data2, None);
        assert_eq!(cv.status(), 0xC3);

        let WireMessage::ChannelVoice(cv) = WireMessage::channel_pressure(9, 100) else {
            panic!("expected channel voice");
        };
        assert_eq!(cv.data2, None);
        assert_eq!(cv.status(), 0xD9);
    }

    #[test]
    fn test_pitch_bend_signed_offset() {
        let msg = WireMessage::pitch_bend_signed(0, -8192);
        assert_eq!(msg.bend(), Some(0));
        assert_eq!(msg.bend_signed(), Some(-8192));

        let msg = WireMessage::pitch_bend_signed(0, 0);
        assert_eq!(msg.bend(), Some(PITCH_BEND_CENTER));

        let msg = WireMessage::pitch_bend_signed(0, 8191);
        assert_eq!(msg.bend(), Some(MAX_14BIT));

        // Out of range clamps
        let msg = WireMessage::pitch_bend_signed(0, i16::MAX);
        assert_eq!(msg.bend(), Some(MAX_14BIT));
        let msg = WireMessage::pitch_bend_signed(0, i16::MIN);
        assert_eq!(msg.bend(), Some(0));
    }

    #[test]
    fn test_pitch_bend_split() {
        let WireMessage::ChannelVoice(cv) = WireMessage::pitch_bend(1, 0x2001) else {
            panic!("expected channel voice");
        };
        assert_eq!(cv.data1, 0x01);
        assert_eq!(cv.data2, Some(0x40));
        assert_eq!(cv.bend(), Some(0x2001));
    }

    #[test]
    fn test_forwardable() {
        assert!(WireMessage::note_on(0, 60, 100).is_forwardable());
        assert!(WireMessage::sysex(vec![1, 2]).is_forwardable());
        assert!(!WireMessage::text_comment("hi").is_forwardable());
        assert!(!WireMessage::Unrecognized { raw: vec![0xF4] }.is_forwardable());
    }

    #[test]
    fn test_text_comment_truncates() {
        let msg = WireMessage::text_comment(vec![b'a'; 2000]);
        let WireMessage::TextComment { text } = msg else {
            panic!("expected text comment");
        };
        assert_eq!(text.len(), MAX_TEXT_LEN);
    }

    #[test]
    fn test_display() {
        insta::assert_snapshot!(WireMessage::note_on(0, 0x40, 0x7F), @"Note on ch=0 40 7F");
        insta::assert_snapshot!(WireMessage::program_change(2, 5), @"Program change ch=2 05");
        insta::assert_snapshot!(WireMessage::pitch_bend(0, 0x2000), @"Pitch bend ch=0 2000");
        insta::assert_snapshot!(WireMessage::sysex(vec![1, 2, 3]), @"Sysex len=0003 01 02 03");
        insta::assert_snapshot!(WireMessage::song_position(16), @"Song position 0010");
        insta::assert_snapshot!(WireMessage::realtime(SystemRealtime::Clock), @"Clock");
        insta::assert_snapshot!(WireMessage::text_comment("hello"), @"Text len=0005 hello");
        insta::assert_snapshot!(WireMessage::Unrecognized { raw: vec![0xF4] }, @"Unrecognized F4");
    }
}
