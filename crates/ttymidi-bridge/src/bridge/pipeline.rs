//! The two worker loops.

use std::sync::Arc;

use tracing::{debug, error, info, warn};
use ttymidi_wire::{decode, encode_into, ByteSource, Framer, WireMessage, DEFAULT_MAX_FRAME_SIZE};

use super::DirectionExit;
use crate::cancel::CancellationToken;
use crate::config::BridgeConfig;
use crate::diagnostics::{Diagnostic, DiagnosticSender};
use crate::endpoint::{MessageSink, MessageSource};
use crate::error::{Error, Result};
use crate::stats::BridgeStats;
use crate::transport::ByteSink;

/// State shared by both workers.
#[derive(Clone)]
pub(crate) struct WorkerContext {
    pub(crate) config: BridgeConfig,
    pub(crate) cancel: CancellationToken,
    pub(crate) stats: Arc<BridgeStats>,
    pub(crate) diagnostics: DiagnosticSender,
}

/// Serial to sink.
pub(crate) fn run_inbound<B, S>(source: B, mut sink: S, ctx: &WorkerContext) -> Result<DirectionExit>
where
    B: ByteSource,
    S: MessageSink,
{
    if ctx.config.raw_dump {
        return run_raw_dump(source, ctx);
    }

    let mut framer = Framer::new(source, ctx.config.framer_config());
    while !ctx.cancel.is_cancelled() {
        let frame = match framer.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => continue,
            Err(e) if e.is_recoverable() => {
                ctx.stats.record_dropped();
                debug!("Serial {}", e);
                if let ttymidi_wire::Error::Frame(frame_error) = e {
                    ctx.diagnostics.emit(Diagnostic::FrameDropped(frame_error));
                }
                continue;
            }
            Err(e) if e.is_end_of_stream() => {
                info!("Serial stream closed");
                return Ok(DirectionExit::Closed);
            }
            Err(e) => {
                error!("Serial read failed: {}", e);
                return Err(e.into());
            }
        };

        ctx.stats.record_frame();
        match decode(&frame) {
            WireMessage::TextComment { text } => {
                ctx.stats.record_text();
                if ctx.config.log_text_comments {
                    info!(
                        "Serial text len={:04} {}",
                        text.len(),
                        String::from_utf8_lossy(&text)
                    );
                }
                ctx.diagnostics.emit(Diagnostic::TextComment(text));
            }
            WireMessage::Unrecognized { raw } => {
                ctx.stats.record_unrecognized();
                debug!("Serial unrecognized {:02X?}", raw);
                ctx.diagnostics.emit(Diagnostic::Unrecognized(raw));
            }
            msg => {
                debug!("Serial  {}", msg);
                if let Err(e) = sink.accept(msg) {
                    error!("Sink rejected message: {}", e);
                    return Err(e);
                }
                ctx.stats.record_forwarded();
            }
        }
    }

    debug!("Inbound worker cancelled");
    Ok(DirectionExit::Cancelled)
}

fn run_raw_dump<B: ByteSource>(mut source: B, ctx: &WorkerContext) -> Result<DirectionExit> {
    while !ctx.cancel.is_cancelled() {
        match source.poll_byte() {
            Ok(Some(byte)) => info!("{:02X}", byte),
            Ok(None) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                info!("Serial stream closed");
                return Ok(DirectionExit::Closed);
            }
            Err(e) => {
                error!("Serial read failed: {}", e);
                return Err(e.into());
            }
        }
    }
    Ok(DirectionExit::Cancelled)
}

/// Source to serial. One write and one flush per message.
pub(crate) fn run_outbound<M, K>(mut source: M, mut writer: K, ctx: &WorkerContext) -> Result<DirectionExit>
where
    M: MessageSource,
    K: ByteSink,
{
    let poll_interval = ctx.config.poll_interval();
    let max_frame_size = ctx.config.max_frame_size;
    let mut pending: Vec<WireMessage> = Vec::new();
    let mut bytes = Vec::with_capacity(DEFAULT_MAX_FRAME_SIZE);

    while !ctx.cancel.is_cancelled() {
        let closed = match source.poll(&mut pending, poll_interval) {
            Ok(()) => false,
            Err(Error::Disconnected(_)) => true,
            Err(e) => {
                error!("Message source failed: {}", e);
                return Err(e);
            }
        };

        for msg in pending.drain(..) {
            bytes.clear();
            if let Err(e) = encode_into(&msg, &mut bytes) {
                warn!("Skipping outbound message: {}", e);
                ctx.stats.record_rejected();
                ctx.diagnostics.emit(Diagnostic::EncodeRejected {
                    kind: msg.kind_name(),
                });
                continue;
            }
            if bytes.len() > max_frame_size {
                warn!(
                    "Skipping outbound {}: {} bytes exceeds {}",
                    msg.kind_name(),
                    bytes.len(),
                    max_frame_size
                );
                ctx.stats.record_rejected();
                ctx.diagnostics.emit(Diagnostic::FrameTooLarge {
                    len: bytes.len(),
                    limit: max_frame_size,
                });
                continue;
            }
            if let Err(e) = writer.write_all(&bytes).and_then(|()| writer.flush()) {
                error!("Serial write failed: {}", e);
                return Err(e.into());
            }
            ctx.stats.record_written(bytes.len());
            debug!("Bus     {}", msg);
        }

        if closed {
            info!("Message source closed");
            return Ok(DirectionExit::Closed);
        }
    }

    debug!("Outbound worker cancelled");
    Ok(DirectionExit::Cancelled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::time::Duration;
    use ttymidi_wire::{FrameError, ReadSource};

    use crate::diagnostics::diagnostics_channel;
    use crate::endpoint::bus_channel;

    fn context() -> (WorkerContext, crossbeam_channel::Receiver<Diagnostic>) {
        let (tx, rx) = diagnostics_channel(64);
        let ctx = WorkerContext {
            config: BridgeConfig {
                poll_interval_ms: 10,
                ..Default::default()
            },
            cancel: CancellationToken::new(),
            stats: Arc::new(BridgeStats::new()),
            diagnostics: DiagnosticSender::new(Some(tx)),
        };
        (ctx, rx)
    }

    fn inbound(bytes: &[u8], ctx: &WorkerContext) -> (Result<DirectionExit>, Vec<WireMessage>) {
        let mut seen = Vec::new();
        let exit = run_inbound(ReadSource::new(bytes), |msg: WireMessage| seen.push(msg), ctx);
        (exit, seen)
    }

    #[test]
    fn test_inbound_forwards_until_eof() {
        let (ctx, _diag) = context();
        let (exit, seen) = inbound(&[0x90, 0xF8, 0x40, 0x7F, 0xB0, 0x07, 0x64], &ctx);

        assert!(matches!(exit, Ok(DirectionExit::Closed)));
        assert_eq!(
            seen,
            vec![
                WireMessage::realtime(ttymidi_wire::SystemRealtime::Clock),
                WireMessage::note_on(0, 64, 127),
                WireMessage::control_change(0, 7, 100),
            ]
        );
        assert_eq!(ctx.stats.snapshot().messages_forwarded, 3);
    }

    #[test]
    fn test_inbound_text_never_forwarded() {
        let (ctx, diag) = context();
        let (_, seen) = inbound(
            &[0xFF, 0x00, 0x00, 0x05, b'h', b'e', b'l', b'l', b'o', 0xC0, 0x05],
            &ctx,
        );

        assert_eq!(seen, vec![WireMessage::program_change(0, 5)]);
        assert_eq!(diag.try_recv().unwrap(), Diagnostic::TextComment(b"hello".to_vec()));
        assert_eq!(ctx.stats.snapshot().text_comments, 1);
    }

    #[test]
    fn test_inbound_reports_dropped_frames() {
        let (ctx, diag) = context();
        let (_, seen) = inbound(&[0x90, 0x40, 0xB0, 0x07, 0x64, 0xF4], &ctx);

        assert_eq!(seen, vec![WireMessage::control_change(0, 7, 100)]);
        assert_eq!(
            diag.try_recv().unwrap(),
            Diagnostic::FrameDropped(FrameError::MalformedFrame {
                status: 0xB0,
                abandoned: vec![0x90, 0x40],
            })
        );
        assert_eq!(diag.try_recv().unwrap(), Diagnostic::Unrecognized(vec![0xF4]));

        let stats = ctx.stats.snapshot();
        assert_eq!(stats.frames_dropped, 1);
        assert_eq!(stats.unrecognized, 1);
    }

    #[test]
    fn test_inbound_sink_failure_is_fatal() {
        let (ctx, _diag) = context();
        let bus = bus_channel(4);
        drop(bus.from_serial);

        let exit = run_inbound(ReadSource::new(&[0xF8u8][..]), bus.sink, &ctx);
        assert!(matches!(exit, Err(Error::Disconnected("sink"))));
    }

    #[test]
    fn test_raw_dump_forwards_nothing() {
        let (mut ctx, _diag) = context();
        ctx.config.raw_dump = true;
        let (exit, seen) = inbound(&[0x90, 0x40, 0x7F], &ctx);

        assert!(matches!(exit, Ok(DirectionExit::Closed)));
        assert!(seen.is_empty());
        assert_eq!(ctx.stats.snapshot().frames_received, 0);
    }

    #[derive(Default)]
    struct RecordingWriter {
        bytes: Vec<u8>,
        flushed_at: Vec<usize>,
    }

    impl io::Write for RecordingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.bytes.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushed_at.push(self.bytes.len());
            Ok(())
        }
    }

    #[test]
    fn test_outbound_writes_in_order_and_flushes() {
        let (ctx, diag) = context();
        let bus = bus_channel(8);
        bus.to_serial.send(WireMessage::note_on(1, 60, 100)).unwrap();
        bus.to_serial.send(WireMessage::text_comment("skip me")).unwrap();
        bus.to_serial.send(WireMessage::sysex(vec![0x7E, 0x01])).unwrap();
        bus.to_serial.send(WireMessage::program_change(1, 3)).unwrap();
        drop(bus.to_serial);

        let mut writer = RecordingWriter::default();
        let exit = run_outbound(bus.source, &mut writer, &ctx);

        assert!(matches!(exit, Ok(DirectionExit::Closed)));
        assert_eq!(
            writer.bytes,
            vec![0x91, 60, 100, 0xF0, 0x7E, 0x01, 0xF7, 0xC1, 3]
        );
        assert_eq!(writer.flushed_at, vec![3, 7, 9]);
        assert_eq!(
            diag.try_recv().unwrap(),
            Diagnostic::EncodeRejected {
                kind: "TextComment"
            }
        );

        let stats = ctx.stats.snapshot();
        assert_eq!(stats.messages_written, 3);
        assert_eq!(stats.bytes_written, 9);
        assert_eq!(stats.encode_rejections, 1);
    }

    #[test]
    fn test_outbound_skips_oversized_sysex() {
        let (mut ctx, diag) = context();
        ctx.config.max_frame_size = 16;
        let bus = bus_channel(8);
        bus.to_serial.send(WireMessage::sysex(vec![0x01; 14])).unwrap();
        bus.to_serial.send(WireMessage::sysex(vec![0x02; 15])).unwrap();
        bus.to_serial.send(WireMessage::realtime(ttymidi_wire::SystemRealtime::Stop)).unwrap();
        drop(bus.to_serial);

        let mut writer = RecordingWriter::default();
        let exit = run_outbound(bus.source, &mut writer, &ctx);

        assert!(matches!(exit, Ok(DirectionExit::Closed)));
        let mut expected = vec![0xF0];
        expected.extend([0x01; 14]);
        expected.extend([0xF7, 0xFC]);
        assert_eq!(writer.bytes, expected);
        assert_eq!(writer.flushed_at, vec![16, 17]);
        assert_eq!(
            diag.try_recv().unwrap(),
            Diagnostic::FrameTooLarge { len: 17, limit: 16 }
        );

        let stats = ctx.stats.snapshot();
        assert_eq!(stats.messages_written, 2);
        assert_eq!(stats.encode_rejections, 1);
    }

    #[test]
    fn test_outbound_stops_when_cancelled() {
        let (ctx, _diag) = context();
        let bus = bus_channel(8);
        ctx.cancel.cancel();

        let exit = run_outbound(bus.source, Vec::<u8>::new(), &ctx);
        assert!(matches!(exit, Ok(DirectionExit::Cancelled)));
        drop(bus.to_serial);
    }

    #[test]
    fn test_outbound_write_failure_is_fatal() {
        struct Unplugged;
        impl io::Write for Unplugged {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::ErrorKind::BrokenPipe.into())
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let (ctx, _diag) = context();
        let bus = bus_channel(8);
        bus.to_serial.send(WireMessage::tune_request()).unwrap();

        let exit = run_outbound(bus.source, Unplugged, &ctx);
        assert!(matches!(exit, Err(Error::Io(_))));
    }

    #[test]
    fn test_inbound_idle_source_observes_cancel() {
        struct Idle;
        impl ByteSource for Idle {
            fn poll_byte(&mut self) -> io::Result<Option<u8>> {
                std::thread::sleep(Duration::from_millis(1));
                Ok(None)
            }
        }

        let (ctx, _diag) = context();
        let cancel = ctx.cancel.clone();
        let worker = std::thread::spawn(move || run_inbound(Idle, |_msg: WireMessage| {}, &ctx));
        std::thread::sleep(Duration::from_millis(20));
        cancel.cancel();

        assert!(matches!(worker.join().unwrap(), Ok(DirectionExit::Cancelled)));
    }
}
