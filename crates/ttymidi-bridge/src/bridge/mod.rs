//! Bridge runner: one inbound and one outbound worker over a shared
//! cancellation token.
//!
//! ```no_run
//! use ttymidi_bridge::{bus_channel, Bridge};
//!
//! # fn main() -> ttymidi_bridge::Result<()> {
//! let bus = bus_channel(256);
//! let handle = Bridge::builder()
//!     .serial_device("/dev/ttyACM0")
//!     .build()?
//!     .spawn_serial(bus.sink, bus.source)?;
//!
//! while let Ok(msg) = bus.from_serial.recv() {
//!     println!("{msg}");
//! }
//! handle.shutdown().into_result()
//! # }
//! ```

mod builder;
mod pipeline;

pub use builder::BridgeBuilder;

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;
use tracing::{debug, info};
use ttymidi_wire::ByteSource;

use crate::cancel::CancellationToken;
use crate::config::BridgeConfig;
use crate::diagnostics::{Diagnostic, DiagnosticSender};
use crate::endpoint::{MessageSink, MessageSource};
use crate::error::{Error, Result};
use crate::stats::{BridgeStats, StatsSnapshot};
use crate::transport::{ByteSink, SerialPort};
use pipeline::{run_inbound, run_outbound, WorkerContext};

/// How a direction ended without failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionExit {
    Cancelled,
    /// Serial end of stream (inbound) or message source gone (outbound).
    Closed,
}

/// Per-direction results, reported separately.
#[derive(Debug)]
pub struct BridgeExit {
    pub inbound: Result<DirectionExit>,
    pub outbound: Result<DirectionExit>,
}

impl BridgeExit {
    /// First failure, inbound first.
    pub fn into_result(self) -> Result<()> {
        self.inbound?;
        self.outbound?;
        Ok(())
    }
}

/// A validated, not yet running bridge.
pub struct Bridge {
    config: BridgeConfig,
    diagnostics: Option<Sender<Diagnostic>>,
    cancel: CancellationToken,
}

impl Bridge {
    pub fn builder() -> BridgeBuilder {
        BridgeBuilder::default()
    }

    pub fn new(config: BridgeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            diagnostics: None,
            cancel: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Token the workers will observe. Cancelling it before spawning makes
    /// both workers exit on their first loop turn.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Opens `serial_device`, puts the read side behind a reader pump and
    /// starts both workers.
    pub fn spawn_serial<S, M>(self, sink: S, source: M) -> Result<BridgeHandle>
    where
        S: MessageSink + Send + 'static,
        M: MessageSource + Send + 'static,
    {
        let port = SerialPort::open(&self.config.serial_device)?;
        let (serial_in, serial_out) =
            port.split(self.config.byte_queue_capacity, self.config.poll_interval())?;
        self.spawn(serial_in, serial_out, sink, source)
    }

    /// Starts both workers on caller-provided transports.
    ///
    /// Shutdown latency is bounded only if `serial_in` returns within a
    /// bounded time; wrap blocking readers in a
    /// [`PumpedSource`](crate::PumpedSource).
    pub fn spawn<B, K, S, M>(self, serial_in: B, serial_out: K, sink: S, source: M) -> Result<BridgeHandle>
    where
        B: ByteSource + Send + 'static,
        K: ByteSink + Send + 'static,
        S: MessageSink + Send + 'static,
        M: MessageSource + Send + 'static,
    {
        let stats = Arc::new(BridgeStats::new());
        let ctx = WorkerContext {
            config: self.config,
            cancel: self.cancel.clone(),
            stats: Arc::clone(&stats),
            diagnostics: DiagnosticSender::new(self.diagnostics),
        };

        let inbound_ctx = ctx.clone();
        let inbound = thread::Builder::new()
            .name("ttymidi-inbound".to_string())
            .spawn(move || run_inbound(serial_in, sink, &inbound_ctx))?;

        let outbound = match thread::Builder::new()
            .name("ttymidi-outbound".to_string())
            .spawn(move || run_outbound(source, serial_out, &ctx))
        {
            Ok(outbound) => outbound,
            Err(e) => {
                self.cancel.cancel();
                let _ = inbound.join();
                return Err(e.into());
            }
        };

        info!("Bridge running");
        Ok(BridgeHandle {
            cancel: self.cancel,
            stats,
            inbound: Some(inbound),
            outbound: Some(outbound),
        })
    }
}

/// Owns both worker threads. Dropping it cancels and joins them.
pub struct BridgeHandle {
    cancel: CancellationToken,
    stats: Arc<BridgeStats>,
    inbound: Option<JoinHandle<Result<DirectionExit>>>,
    outbound: Option<JoinHandle<Result<DirectionExit>>>,
}

impl BridgeHandle {
    /// For cancelling from elsewhere (e.g. a signal handler) while another
    /// thread sits in [`wait`](Self::wait).
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Both workers have returned.
    pub fn is_finished(&self) -> bool {
        let done = |worker: &Option<JoinHandle<_>>| worker.as_ref().map_or(true, |w| w.is_finished());
        done(&self.inbound) && done(&self.outbound)
    }

    pub fn shutdown(self) -> BridgeExit {
        debug!("Bridge shutdown requested");
        self.cancel.cancel();
        self.wait()
    }

    /// Blocks until both workers return on their own or are cancelled.
    pub fn wait(mut self) -> BridgeExit {
        let exit = BridgeExit {
            inbound: join(self.inbound.take(), "inbound"),
            outbound: join(self.outbound.take(), "outbound"),
        };
        info!("Bridge stopped");
        exit
    }
}

fn join(worker: Option<JoinHandle<Result<DirectionExit>>>, name: &'static str) -> Result<DirectionExit> {
    match worker {
        Some(worker) => worker.join().unwrap_or(Err(Error::WorkerPanicked(name))),
        None => Ok(DirectionExit::Cancelled),
    }
}

impl Drop for BridgeHandle {
    fn drop(&mut self) {
        if self.inbound.is_none() && self.outbound.is_none() {
            return;
        }
        self.cancel.cancel();
        let _ = join(self.inbound.take(), "inbound");
        let _ = join(self.outbound.take(), "outbound");
    }
}
