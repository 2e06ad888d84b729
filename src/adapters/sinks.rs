use crate::core::scan::registration_id;
use crate::domain::model::{ScanFragment, ScanRecord};
use crate::domain::ports::StateSink;
use crate::utils::error::Result;
use std::io::Write;
use std::sync::Mutex;
use tokio::sync::{mpsc, watch};

/// Observable slot: keeps the last value, wakes every subscriber.
#[derive(Debug)]
pub struct WatchSink {
    tx: watch::Sender<String>,
}

impl WatchSink {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(String::new());
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.tx.subscribe()
    }

    pub fn value(&self) -> String {
        self.tx.borrow().clone()
    }
}

impl Default for WatchSink {
    fn default() -> Self {
        Self::new()
    }
}

impl StateSink for WatchSink {
    fn publish(&self, value: &str) {
        self.tx.send_replace(value.to_string());
    }
}

pub struct CallbackSink<F> {
    callback: F,
}

impl<F> CallbackSink<F>
where
    F: Fn(String) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> StateSink for CallbackSink<F>
where
    F: Fn(String) + Send + Sync,
{
    fn publish(&self, value: &str) {
        (self.callback)(value.to_string())
    }
}

/// Forwards every write, so consumers see each value rather than the latest.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl StateSink for ChannelSink {
    fn publish(&self, value: &str) {
        if self.tx.send(value.to_string()).is_err() {
            tracing::debug!("Channel sink receiver dropped, discarding value");
        }
    }
}

/// Publishes to each sink in order.
pub struct FanoutSink {
    sinks: Vec<Box<dyn StateSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Box<dyn StateSink>>) -> Self {
        Self { sinks }
    }
}

impl StateSink for FanoutSink {
    fn publish(&self, value: &str) {
        for sink in &self.sinks {
            sink.publish(value);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Plain,
    Json,
}

impl OutputFormat {
    pub const VALUES: [&'static str; 2] = ["plain", "json"];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "plain" => Some(Self::Plain),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Writes each scan to an output stream (stdout in the CLI).
pub struct ScanPrinter<W> {
    out: Mutex<W>,
    format: OutputFormat,
    registration_ids: bool,
}

impl<W: Write + Send> ScanPrinter<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self {
            out: Mutex::new(out),
            format,
            registration_ids: false,
        }
    }

    /// Print the parsed registration id instead of the raw text; scans that
    /// are not a registration id are skipped.
    pub fn registration_ids(mut self, enabled: bool) -> Self {
        self.registration_ids = enabled;
        self
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    fn render(&self, value: &str) -> Result<Option<String>> {
        // A read whose bytes were all held back by the decoder.
        if value.is_empty() {
            return Ok(None);
        }

        let text = if self.registration_ids {
            match registration_id(&ScanFragment::from(value.to_string())) {
                Some(id) => id.to_string(),
                None => {
                    tracing::warn!("Scan {:?} is not a registration id", value);
                    return Ok(None);
                }
            }
        } else {
            value.to_string()
        };

        let line = match self.format {
            OutputFormat::Plain => text.trim_end_matches(&['\r', '\n'][..]).to_string(),
            OutputFormat::Json => serde_json::to_string(&ScanRecord::now(text))?,
        };
        Ok(Some(line))
    }
}

impl<W: Write + Send> StateSink for ScanPrinter<W> {
    fn publish(&self, value: &str) {
        let line = match self.render(value) {
            Ok(Some(line)) => line,
            Ok(None) => return,
            Err(e) => {
                tracing::error!("Failed to render scan: {}", e);
                return;
            }
        };

        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
            tracing::error!("Failed to write scan: {}", e);
        }
    }
}
