#![allow(dead_code)]

use async_trait::async_trait;
use scanner_bridge::core::{
    PortFilter, PortRequester, ReadOutcome, SerialOptions, SerialPort, SerialReader, StateSink,
};
use scanner_bridge::{BridgeError, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// Everything observable about one bridge run, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Connected(String),
    Scanned(String),
    Acquired,
    Released,
    Opened(u32),
}

#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<Event>>>);

impl EventLog {
    pub fn push(&self, event: Event) {
        self.lock().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.lock().clone()
    }

    pub fn scanned(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Scanned(v) => Some(v),
                _ => None,
            })
            .collect()
    }

    pub fn connected(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Connected(v) => Some(v),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, event: &Event) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Event>> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub struct RecordingSink {
    log: EventLog,
    make: fn(String) -> Event,
}

impl RecordingSink {
    pub fn connected(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            make: Event::Connected,
        }
    }

    pub fn scanned(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            make: Event::Scanned,
        }
    }
}

impl StateSink for RecordingSink {
    fn publish(&self, value: &str) {
        self.log.push((self.make)(value.to_string()));
    }
}

/// What a scripted reader does on each read.
#[derive(Debug, Clone)]
pub enum Step {
    Data(Vec<u8>),
    Done,
    /// Read error; the port stays readable for the next acquisition.
    Fail,
    /// Read error after which the port is gone.
    FailFatal,
    Panic,
    /// Never completes, like a scanner waiting for the next barcode.
    Hang,
}

pub fn data(bytes: &[u8]) -> Step {
    Step::Data(bytes.to_vec())
}

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    PermissionDenied,
    NoDevice,
    Open,
}

impl Failure {
    fn into_error(self) -> BridgeError {
        match self {
            Failure::PermissionDenied => BridgeError::PermissionDenied {
                message: "user denied access".to_string(),
            },
            Failure::NoDevice => BridgeError::NoDeviceSelected,
            Failure::Open => BridgeError::device_open("scripted", "device busy"),
        }
    }
}

pub struct ScriptedRequester {
    port: Mutex<Option<ScriptedPort>>,
    request_failure: Option<Failure>,
    seen_filters: Arc<Mutex<Vec<PortFilter>>>,
}

impl ScriptedRequester {
    /// One inner `Vec<Step>` per reader acquisition. The port is readable
    /// while scripts remain.
    pub fn new(log: &EventLog, acquisitions: Vec<Vec<Step>>) -> Self {
        Self {
            port: Mutex::new(Some(ScriptedPort {
                log: log.clone(),
                acquisitions: acquisitions.into(),
                open_failure: None,
                open: false,
            })),
            request_failure: None,
            seen_filters: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Filters passed to `request_port`, shared so they stay visible after
    /// the requester moves into a bridge.
    pub fn filter_log(&self) -> Arc<Mutex<Vec<PortFilter>>> {
        self.seen_filters.clone()
    }

    pub fn failing_request(log: &EventLog, failure: Failure) -> Self {
        let mut requester = Self::new(log, vec![vec![data(b"never")]]);
        requester.request_failure = Some(failure);
        requester
    }

    pub fn failing_open(log: &EventLog, failure: Failure) -> Self {
        let requester = Self::new(log, vec![vec![data(b"never")]]);
        if let Some(port) = requester.port.lock().unwrap().as_mut() {
            port.open_failure = Some(failure);
        }
        requester
    }
}

#[async_trait]
impl PortRequester for ScriptedRequester {
    type Port = ScriptedPort;

    async fn request_port(&self, filters: &[PortFilter]) -> Result<ScriptedPort> {
        self.seen_filters.lock().unwrap().extend_from_slice(filters);
        if let Some(failure) = self.request_failure {
            return Err(failure.into_error());
        }
        self.port
            .lock()
            .unwrap()
            .take()
            .ok_or(BridgeError::NoDeviceSelected)
    }
}

pub struct ScriptedPort {
    log: EventLog,
    acquisitions: VecDeque<Vec<Step>>,
    open_failure: Option<Failure>,
    open: bool,
}

#[async_trait]
impl SerialPort for ScriptedPort {
    fn name(&self) -> String {
        "scripted".to_string()
    }

    async fn open(&mut self, options: SerialOptions) -> Result<()> {
        if let Some(failure) = self.open_failure {
            return Err(failure.into_error());
        }
        self.log.push(Event::Opened(options.baud_rate));
        self.open = true;
        Ok(())
    }

    fn is_readable(&self) -> bool {
        self.open && !self.acquisitions.is_empty()
    }

    fn reader(&mut self) -> Result<Box<dyn SerialReader + '_>> {
        let steps = self
            .acquisitions
            .pop_front()
            .ok_or_else(|| BridgeError::read("no more acquisitions"))?;
        self.log.push(Event::Acquired);
        Ok(Box::new(ScriptedReader {
            steps: steps.into(),
            remaining: &mut self.acquisitions,
            log: self.log.clone(),
        }))
    }
}

pub struct ScriptedReader<'a> {
    steps: VecDeque<Step>,
    remaining: &'a mut VecDeque<Vec<Step>>,
    log: EventLog,
}

#[async_trait]
impl SerialReader for ScriptedReader<'_> {
    async fn read(&mut self) -> Result<ReadOutcome> {
        tokio::task::yield_now().await;
        match self.steps.pop_front().unwrap_or(Step::Done) {
            Step::Data(bytes) => Ok(ReadOutcome::Data(bytes)),
            Step::Done => Ok(ReadOutcome::Done),
            Step::Fail => Err(BridgeError::read("framing error")),
            Step::FailFatal => {
                self.remaining.clear();
                Err(BridgeError::read("device lost"))
            }
            Step::Panic => panic!("scripted reader panic"),
            Step::Hang => std::future::pending().await,
        }
    }

    fn release_lock(&mut self) {
        self.log.push(Event::Released);
    }
}
