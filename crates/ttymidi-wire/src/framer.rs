//! Byte stream framing.
//!
//! [`FrameParser`] is the state machine: bytes go in one at a time, complete
//! frames (or recoverable framing errors) come out in order. [`Framer`] drives
//! a parser from a [`ByteSource`] and is also an iterator over frames.
//!
//! Interleaving policy:
//! - real-time bytes (0xF8-0xFE) are emitted on their own and do not disturb
//!   the frame they interrupt
//! - any other status byte arriving early abandons the frame in progress and
//!   framing restarts from it
//! - after a channel message, further data bytes reuse its status (running
//!   status) unless disabled

use std::collections::VecDeque;
use std::io::{self, Read};
use std::mem;

use smallvec::{smallvec, SmallVec};
use tracing::debug;

use crate::error::{Error, FrameError, Result};
use crate::frame::{frame_len, is_realtime, is_status, FrameLen, RawFrame};
use crate::message::MAX_TEXT_LEN;

/// Largest sysex frame, delimiters included.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1024;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FramerConfig {
    pub max_frame_size: usize,
    /// Text length bytes above this are clamped.
    pub max_text_size: usize,
    pub running_status: bool,
}

impl Default for FramerConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            max_text_size: MAX_TEXT_LEN,
            running_status: true,
        }
    }
}

/// Polled one byte at a time by the framer.
pub trait ByteSource {
    /// `Ok(None)` means nothing arrived within the source's poll window; the
    /// framer keeps its partial state and the caller may simply poll again.
    /// End of stream is reported as [`io::ErrorKind::UnexpectedEof`].
    fn poll_byte(&mut self) -> io::Result<Option<u8>>;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn poll_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).poll_byte()
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn poll_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).poll_byte()
    }
}

/// Adapts any [`Read`] into a byte source.
pub struct ReadSource<R> {
    reader: R,
}

impl<R: Read> ReadSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> ByteSource for ReadSource<R> {
    fn poll_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match self.reader.read(&mut byte) {
                Ok(0) => return Err(io::ErrorKind::UnexpectedEof.into()),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) =>
                {
                    return Ok(None)
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[derive(Debug)]
enum State {
    /// Dropping data bytes until a status byte shows up. `skip_eox` swallows
    /// the 0xF7 closing a sysex that already overflowed.
    Resyncing { skip_eox: bool },
    /// Between channel messages; data bytes reuse `status`.
    Running(u8),
    Framing { needed: usize, bytes: SmallVec<[u8; 3]> },
    SysEx(Vec<u8>),
    TextLength,
    Text { remaining: usize, text: Vec<u8> },
}

pub struct FrameParser {
    config: FramerConfig,
    state: State,
    ready: VecDeque<std::result::Result<RawFrame, FrameError>>,
}

impl FrameParser {
    pub fn new(config: FramerConfig) -> Self {
        Self {
            config,
            state: State::Resyncing { skip_eox: false },
            ready: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &FramerConfig {
        &self.config
    }

    /// Feed one byte. Anything it completes is queued for [`pop`](Self::pop).
    pub fn push(&mut self, byte: u8) {
        match &mut self.state {
            // Text bodies are verbatim, status bits included.
            State::TextLength => {
                let len = usize::from(byte).min(self.config.max_text_size);
                if len == 0 {
                    self.state = State::Resyncing { skip_eox: false };
                    self.ready.push_back(Ok(RawFrame::Text(Vec::new())));
                } else {
                    self.state = State::Text {
                        remaining: len,
                        text: Vec::with_capacity(len),
                    };
                }
                return;
            }
            State::Text { remaining, text } => {
                text.push(byte);
                *remaining -= 1;
                if *remaining == 0 {
                    let text = mem::take(text);
                    self.state = State::Resyncing { skip_eox: false };
                    self.ready.push_back(Ok(RawFrame::Text(text)));
                }
                return;
            }
            _ => {}
        }

        if is_realtime(byte) {
            self.ready.push_back(Ok(RawFrame::short(&[byte])));
        } else if is_status(byte) {
            self.start_status(byte);
        } else {
            self.push_data(byte);
        }
    }

    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.push(byte);
        }
    }

    /// Next completed frame or framing error, oldest first.
    pub fn pop(&mut self) -> Option<std::result::Result<RawFrame, FrameError>> {
        self.ready.pop_front()
    }

    /// Drop any partial frame and queued output.
    pub fn reset(&mut self) {
        self.state = State::Resyncing { skip_eox: false };
        self.ready.clear();
    }

    /// No partial frame is being assembled.
    pub fn is_idle(&self) -> bool {
        matches!(self.state, State::Resyncing { .. } | State::Running(_))
    }

    fn start_status(&mut self, status: u8) {
        let previous = mem::replace(&mut self.state, State::Resyncing { skip_eox: false });

        if status == 0xF7 {
            match previous {
                State::SysEx(mut bytes) => {
                    bytes.push(0xF7);
                    self.ready.push_back(Ok(RawFrame::SysEx(bytes)));
                    return;
                }
                State::Resyncing { skip_eox: true } => return,
                _ => {}
            }
        }

        let abandoned = match previous {
            State::Framing { bytes, .. } => Some(bytes.into_vec()),
            State::SysEx(bytes) => Some(bytes),
            _ => None,
        };
        if let Some(abandoned) = abandoned {
            debug!(
                "Status {:02X} interrupted a frame, dropping {} byte(s)",
                status,
                abandoned.len()
            );
            self.ready
                .push_back(Err(FrameError::MalformedFrame { status, abandoned }));
        }

        match frame_len(status) {
            FrameLen::SysEx => self.state = State::SysEx(vec![0xF0]),
            FrameLen::Fixed(0) | FrameLen::Undefined => {
                self.ready.push_back(Ok(RawFrame::short(&[status])));
            }
            FrameLen::Fixed(needed) => {
                self.state = State::Framing {
                    needed,
                    bytes: smallvec![status],
                }
            }
        }
    }

    fn push_data(&mut self, byte: u8) {
        let max_frame_size = self.config.max_frame_size;
        match &mut self.state {
            // Text bytes never get here; `push` consumes them first.
            State::Resyncing { .. } | State::TextLength | State::Text { .. } => {}
            State::Running(status) => {
                let status = *status;
                let needed = match frame_len(status) {
                    FrameLen::Fixed(needed) => needed,
                    _ => 0,
                };
                let bytes: SmallVec<[u8; 3]> = smallvec![status, byte];
                if bytes.len() > needed {
                    self.complete(bytes);
                } else {
                    self.state = State::Framing { needed, bytes };
                }
            }
            State::Framing { needed, bytes } => {
                bytes.push(byte);
                if bytes.len() > *needed {
                    let bytes = mem::take(bytes);
                    self.complete(bytes);
                }
            }
            State::SysEx(bytes) => {
                // Leave room for the terminator.
                if bytes.len() + 2 > max_frame_size {
                    debug!("Sysex exceeds {} bytes, dropping", max_frame_size);
                    self.state = State::Resyncing { skip_eox: true };
                    self.ready.push_back(Err(FrameError::FrameTooLarge {
                        limit: max_frame_size,
                    }));
                } else {
                    bytes.push(byte);
                }
            }
        }
    }

    fn complete(&mut self, bytes: SmallVec<[u8; 3]>) {
        let status = bytes[0];
        if status == 0xFF && bytes[1..] == [0x00, 0x00] {
            self.state = State::TextLength;
            return;
        }
        self.state = if self.config.running_status && status < 0xF0 {
            State::Running(status)
        } else {
            State::Resyncing { skip_eox: false }
        };
        self.ready.push_back(Ok(RawFrame::Short(bytes)));
    }
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new(FramerConfig::default())
    }
}

/// Pulls bytes from a [`ByteSource`] and yields frames.
///
/// As an iterator it yields recoverable framing errors in place and keeps
/// going, ends cleanly at end of stream, and ends after any other I/O error.
pub struct Framer<S> {
    source: S,
    parser: FrameParser,
    finished: bool,
}

impl<S: ByteSource> Framer<S> {
    pub fn new(source: S, config: FramerConfig) -> Self {
        Self {
            source,
            parser: FrameParser::new(config),
            finished: false,
        }
    }

    /// `Ok(None)` when the source went idle; partial state is kept, so calling
    /// again resumes where framing left off.
    pub fn next_frame(&mut self) -> Result<Option<RawFrame>> {
        loop {
            if let Some(item) = self.parser.pop() {
                return item.map(Some).map_err(Error::from);
            }
            match self.source.poll_byte()? {
                Some(byte) => self.parser.push(byte),
                None => return Ok(None),
            }
        }
    }

    pub fn parser(&self) -> &FrameParser {
        &self.parser
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: ByteSource> Iterator for Framer<S> {
    type Item = Result<RawFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            match self.next_frame() {
                Ok(Some(frame)) => return Some(Ok(frame)),
                Ok(None) => continue,
                Err(e) if e.is_recoverable() => return Some(Err(e)),
                Err(e) if e.is_end_of_stream() => {
                    self.finished = true;
                    return None;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

impl<S: ByteSource> std::iter::FusedIterator for Framer<S> {}
