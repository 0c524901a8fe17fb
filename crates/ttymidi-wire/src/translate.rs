//! Stateless conversion between raw frames and [`WireMessage`]s.

use crate::error::{Error, Result};
use crate::frame::RawFrame;
use crate::message::{ChannelVoice, ChannelVoiceKind, SystemCommon, SystemRealtime, WireMessage};

/// Never fails: anything that is not a well-formed message comes back as
/// [`WireMessage::Unrecognized`].
pub fn decode(frame: &RawFrame) -> WireMessage {
    match frame {
        RawFrame::Text(text) => WireMessage::text_comment(text.as_slice()),
        RawFrame::Short(_) | RawFrame::SysEx(_) => decode_bytes(frame.as_bytes()),
    }
}

/// Decode one complete MIDI message held in `bytes`.
pub fn decode_bytes(bytes: &[u8]) -> WireMessage {
    let unrecognized = || WireMessage::Unrecognized {
        raw: bytes.to_vec(),
    };

    let Some((&status, data)) = bytes.split_first() else {
        return unrecognized();
    };
    if status & 0x80 == 0 {
        return unrecognized();
    }

    if status == 0xF0 {
        return match data.split_last() {
            Some((&0xF7, payload)) if payload.iter().all(|b| b & 0x80 == 0) => {
                WireMessage::sysex(payload)
            }
            _ => unrecognized(),
        };
    }

    if data.iter().any(|b| b & 0x80 != 0) {
        return unrecognized();
    }

    if let Some(kind) = ChannelVoiceKind::from_status(status) {
        if data.len() != kind.data_len() {
            return unrecognized();
        }
        return WireMessage::ChannelVoice(ChannelVoice {
            kind,
            channel: status & 0x0F,
            data1: data[0],
            data2: data.get(1).copied(),
        });
    }

    match (status, data) {
        (0xF1, &[value]) => SystemCommon::MtcQuarterFrame(value).into(),
        (0xF2, &[low, high]) => {
            SystemCommon::SongPosition(u16::from(low) | (u16::from(high) << 7)).into()
        }
        (0xF3, &[song]) => SystemCommon::SongSelect(song).into(),
        (0xF6, &[]) => SystemCommon::TuneRequest.into(),
        (_, &[]) => SystemRealtime::from_status(status)
            .map(WireMessage::from)
            .unwrap_or_else(unrecognized),
        _ => unrecognized(),
    }
}

/// Minimal wire form of `msg`.
pub fn encode(msg: &WireMessage) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(match msg {
        WireMessage::SysEx { payload } => payload.len() + 2,
        _ => 3,
    });
    encode_into(msg, &mut out)?;
    Ok(out)
}

/// Appends the wire form of `msg` to `out`. Text comments and unrecognized
/// bytes have no outbound form and leave `out` untouched.
pub fn encode_into(msg: &WireMessage, out: &mut Vec<u8>) -> Result<()> {
    match msg {
        WireMessage::ChannelVoice(cv) => {
            out.push(cv.status());
            out.push(cv.data1 & 0x7F);
            if cv.kind.data_len() == 2 {
                out.push(cv.data2.unwrap_or(0) & 0x7F);
            }
        }
        WireMessage::SysEx { payload } => {
            out.reserve(payload.len() + 2);
            out.push(0xF0);
            out.extend(payload.iter().map(|b| b & 0x7F));
            out.push(0xF7);
        }
        WireMessage::SystemCommon(common) => {
            out.push(common.status());
            match *common {
                SystemCommon::MtcQuarterFrame(value) | SystemCommon::SongSelect(value) => {
                    out.push(value & 0x7F)
                }
                SystemCommon::SongPosition(value) => {
                    out.push((value & 0x7F) as u8);
                    out.push(((value >> 7) & 0x7F) as u8);
                }
                SystemCommon::TuneRequest => {}
            }
        }
        WireMessage::SystemRealtime(rt) => out.push(rt.status()),
        WireMessage::TextComment { .. } | WireMessage::Unrecognized { .. } => {
            return Err(Error::EncodeContract {
                kind: msg.kind_name(),
            })
        }
    }
    Ok(())
}
