use crate::core::decoder::Utf8ChunkDecoder;
use crate::domain::model::{BridgePhase, ConnectionState, PortFilter, ReadOutcome, SerialOptions};
use crate::domain::ports::{PortRequester, SerialPort, SerialReader, StateSink};
use crate::utils::error::{BridgeError, Result};
use std::future::Future;
use std::ops::{Deref, DerefMut};
use tokio::sync::watch;

/// Connects a serial scanner to two host state slots.
///
/// `run` walks `Idle -> Requesting -> Connected -> Disconnected`. Every call
/// starts over from device selection; there is no reconnect.
pub struct ScannerBridge<R: PortRequester> {
    requester: R,
    filters: Vec<PortFilter>,
    phase: watch::Sender<BridgePhase>,
}

impl<R: PortRequester> ScannerBridge<R> {
    pub fn new(requester: R) -> Self {
        let (phase, _) = watch::channel(BridgePhase::Idle);
        Self {
            requester,
            filters: Vec::new(),
            phase,
        }
    }

    pub fn with_filters(mut self, filters: Vec<PortFilter>) -> Self {
        self.filters = filters;
        self
    }

    pub fn phase(&self) -> BridgePhase {
        *self.phase.borrow()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<BridgePhase> {
        self.phase.subscribe()
    }

    /// Connects and pumps decoded text into `scanned` until the port stops
    /// being readable.
    ///
    /// Returns an error only when the connect step fails; neither sink is
    /// written in that case. Read errors end the current reader and are logged.
    pub async fn run<C, S>(&self, connected: &C, scanned: &S) -> Result<()>
    where
        C: StateSink + ?Sized,
        S: StateSink + ?Sized,
    {
        self.set_phase(BridgePhase::Requesting);

        let mut port = match self.connect().await {
            Ok(port) => port,
            Err(e) => {
                tracing::warn!("Scanner connect failed: {}", e);
                self.set_phase(BridgePhase::Idle);
                return Err(e);
            }
        };

        let device = port.name();
        tracing::info!("Scanner connected on {}", device);
        connected.publish(ConnectionState::Connected.as_str());
        self.set_phase(BridgePhase::Connected);

        let mut total_fragments = 0usize;
        while port.is_readable() {
            let reader = match port.reader() {
                Ok(reader) => reader,
                Err(e) => {
                    tracing::error!("Could not acquire reader for {}: {}", device, e);
                    break;
                }
            };

            // The decoder lives exactly as long as this reader.
            let mut lease = ReaderLease::new(reader);
            let mut decoder = Utf8ChunkDecoder::new();

            match pump(&mut *lease, &mut decoder, scanned).await {
                Ok(fragments) => {
                    tracing::debug!("Reader on {} finished after {} reads", device, fragments);
                    total_fragments += fragments;
                }
                Err(e) => {
                    tracing::error!("Read from {} failed: {}", device, e);
                }
            }

            if !decoder.pending().is_empty() {
                tracing::debug!(
                    "Dropping {} undecoded trailing bytes",
                    decoder.pending().len()
                );
            }
        }

        connected.publish(ConnectionState::Disconnected.as_str());
        self.set_phase(BridgePhase::Disconnected);
        tracing::info!(
            "Scanner on {} disconnected ({} fragments received)",
            device,
            total_fragments
        );

        Ok(())
    }

    /// Like `run`, but stops early once `shutdown` completes. The read loop is
    /// dropped, which releases the reader, and a connected bridge still
    /// publishes `disconnected` once.
    pub async fn run_until<C, S, F>(&self, connected: &C, scanned: &S, shutdown: F) -> Result<()>
    where
        C: StateSink + ?Sized,
        S: StateSink + ?Sized,
        F: Future<Output = ()>,
    {
        let finished = {
            let run = self.run(connected, scanned);
            tokio::pin!(run);
            tokio::select! {
                result = &mut run => Some(result),
                _ = shutdown => None,
            }
        };

        if let Some(result) = finished {
            return result;
        }

        match self.phase() {
            BridgePhase::Connected => {
                connected.publish(ConnectionState::Disconnected.as_str());
                self.set_phase(BridgePhase::Disconnected);
                tracing::info!("Scanner disconnected on shutdown");
            }
            BridgePhase::Requesting => self.set_phase(BridgePhase::Idle),
            BridgePhase::Idle | BridgePhase::Disconnected => {}
        }
        Ok(())
    }

    async fn connect(&self) -> Result<R::Port> {
        let mut port = self.requester.request_port(&self.filters).await?;
        let options = SerialOptions::default();

        tracing::debug!("Opening {} at {} baud", port.name(), options.baud_rate);
        port.open(options).await.map_err(|e| {
            if e.is_terminal_connect_error() {
                e
            } else {
                BridgeError::device_open(port.name(), e.to_string())
            }
        })?;

        Ok(port)
    }

    fn set_phase(&self, phase: BridgePhase) {
        self.phase.send_replace(phase);
    }
}

/// Reads until the stream reports done. Errors are returned to the caller,
/// which logs them and moves on.
async fn pump<R, S>(reader: &mut R, decoder: &mut Utf8ChunkDecoder, scanned: &S) -> Result<usize>
where
    R: SerialReader + ?Sized,
    S: StateSink + ?Sized,
{
    let mut fragments = 0;
    loop {
        match reader.read().await? {
            ReadOutcome::Data(bytes) => {
                let text = decoder.decode(&bytes);
                tracing::debug!("Read {} bytes: {:?}", bytes.len(), text);
                scanned.publish(&text);
                fragments += 1;
            }
            ReadOutcome::Done => return Ok(fragments),
        }
    }
}

/// Releases the reader lock when dropped, whichever way the read loop ends.
struct ReaderLease<'a> {
    reader: Box<dyn SerialReader + 'a>,
}

impl<'a> ReaderLease<'a> {
    fn new(reader: Box<dyn SerialReader + 'a>) -> Self {
        Self { reader }
    }
}

impl<'a> Deref for ReaderLease<'a> {
    type Target = dyn SerialReader + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.reader
    }
}

impl<'a> DerefMut for ReaderLease<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.reader
    }
}

impl Drop for ReaderLease<'_> {
    fn drop(&mut self) {
        self.reader.release_lock();
    }
}
