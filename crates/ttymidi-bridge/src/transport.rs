//! Serial transport: a reader pump for the inbound side and byte sinks for
//! the outbound side.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use tracing::{debug, info};
use ttymidi_wire::ByteSource;

use crate::error::Result;

const PUMP_CHUNK: usize = 64;

/// Written by the outbound worker.
pub trait ByteSink {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;
}

impl<W: Write> ByteSink for W {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        Write::write_all(self, bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        Write::flush(self)
    }
}

/// Byte source fed by a dedicated reader thread.
///
/// The pump owns the blocking `read()`; [`poll_byte`](ByteSource::poll_byte)
/// waits at most `poll_interval` on the queue, so a worker holding this
/// source notices cancellation even while the line is silent.
pub struct PumpedSource {
    bytes: Receiver<io::Result<u8>>,
    poll_interval: Duration,
}

impl PumpedSource {
    /// Spawns the reader thread. It exits after end of stream, after a read
    /// error, or on the first read that completes once this source is gone.
    pub fn spawn<R>(reader: R, capacity: usize, poll_interval: Duration) -> Result<Self>
    where
        R: Read + Send + 'static,
    {
        let (sender, bytes) = bounded(capacity);
        thread::Builder::new()
            .name("ttymidi-serial-reader".to_string())
            .spawn(move || reader_pump(reader, sender))?;
        Ok(Self {
            bytes,
            poll_interval,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

fn reader_pump<R: Read>(mut reader: R, sender: Sender<io::Result<u8>>) {
    let mut buf = [0u8; PUMP_CHUNK];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => {
                let _ = sender.send(Err(io::ErrorKind::UnexpectedEof.into()));
                break;
            }
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!("Serial read failed: {}", e);
                let _ = sender.send(Err(e));
                break;
            }
        };
        for &byte in &buf[..n] {
            if sender.send(Ok(byte)).is_err() {
                debug!("Serial reader detached, stopping pump");
                return;
            }
        }
    }
}

impl ByteSource for PumpedSource {
    fn poll_byte(&mut self) -> io::Result<Option<u8>> {
        match self.bytes.recv_timeout(self.poll_interval) {
            Ok(Ok(byte)) => Ok(Some(byte)),
            Ok(Err(e)) => Err(e),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "serial reader stopped",
            )),
        }
    }
}

/// An open serial character device.
#[derive(Debug)]
pub struct SerialPort {
    path: PathBuf,
    file: File,
}

impl SerialPort {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        info!("Opened serial device {}", path.display());
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read side behind a reader pump, write side as a plain file handle.
    pub fn split(self, capacity: usize, poll_interval: Duration) -> Result<(PumpedSource, File)> {
        let writer = self.file.try_clone()?;
        let source = PumpedSource::spawn(self.file, capacity, poll_interval)?;
        Ok((source, writer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::Instant;

    #[test]
    fn test_pump_delivers_then_eof() {
        let reader = Cursor::new(vec![0x90, 0x40, 0x7F]);
        let mut source = PumpedSource::spawn(reader, 16, Duration::from_millis(500)).unwrap();

        assert_eq!(source.poll_byte().unwrap(), Some(0x90));
        assert_eq!(source.poll_byte().unwrap(), Some(0x40));
        assert_eq!(source.poll_byte().unwrap(), Some(0x7F));
        let err = source.poll_byte().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    struct Silent;

    impl Read for Silent {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            thread::sleep(Duration::from_secs(60));
            Ok(0)
        }
    }

    #[test]
    fn test_idle_poll_is_bounded() {
        let mut source = PumpedSource::spawn(Silent, 16, Duration::from_millis(20)).unwrap();
        let start = Instant::now();
        assert_eq!(source.poll_byte().unwrap(), None);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_pump_forwards_read_errors() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::ErrorKind::BrokenPipe.into())
            }
        }

        let mut source = PumpedSource::spawn(Broken, 4, Duration::from_millis(500)).unwrap();
        assert_eq!(source.poll_byte().unwrap_err().kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_write_is_byte_sink() {
        fn send(sink: &mut impl ByteSink, bytes: &[u8]) {
            sink.write_all(bytes).unwrap();
            sink.flush().unwrap();
        }

        let mut out: Vec<u8> = Vec::new();
        send(&mut out, &[0xF8]);
        send(&mut out, &[0x90, 0x40, 0x7F]);
        assert_eq!(out, vec![0xF8, 0x90, 0x40, 0x7F]);
    }

    #[test]
    fn test_open_missing_device() {
        let err = SerialPort::open("/nonexistent/ttymidi-test-device").unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }
}
