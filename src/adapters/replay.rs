//! A file standing in for a scanner: every line of the file arrives as one
//! read, then the stream ends and the port becomes unreadable.

use crate::adapters::stream::{Chunking, StreamReader};
use crate::domain::model::{PortFilter, SerialOptions};
use crate::domain::ports::{PortRequester, SerialPort, SerialReader};
use crate::utils::error::{BridgeError, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs::File;
use tokio::io::BufReader;

#[derive(Debug, Clone)]
pub struct ReplayPortRequester {
    path: PathBuf,
}

impl ReplayPortRequester {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PortRequester for ReplayPortRequester {
    type Port = ReplayPort;

    async fn request_port(&self, filters: &[PortFilter]) -> Result<ReplayPort> {
        if !filters.is_empty() {
            tracing::debug!("Replay source ignores {} port filters", filters.len());
        }
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            return Err(BridgeError::NoDeviceSelected);
        }
        Ok(ReplayPort::new(self.path.clone()))
    }
}

pub struct ReplayPort {
    path: PathBuf,
    name: String,
    file: Option<BufReader<File>>,
    readable: bool,
}

impl ReplayPort {
    pub fn new(path: PathBuf) -> Self {
        let name = format!("replay:{}", path.display());
        Self {
            path,
            name,
            file: None,
            readable: false,
        }
    }
}

#[async_trait]
impl SerialPort for ReplayPort {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn open(&mut self, options: SerialOptions) -> Result<()> {
        tracing::debug!("Replaying {} (baud rate {} ignored)", self.name, options.baud_rate);

        let file = File::open(&self.path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => BridgeError::PermissionDenied {
                message: format!("{}: {}", self.path.display(), e),
            },
            _ => BridgeError::device_open(self.name.clone(), e.to_string()),
        })?;

        self.file = Some(BufReader::new(file));
        self.readable = true;
        Ok(())
    }

    fn is_readable(&self) -> bool {
        self.file.is_some() && self.readable
    }

    fn reader(&mut self) -> Result<Box<dyn SerialReader + '_>> {
        let Self {
            name,
            file,
            readable,
            ..
        } = self;
        let file = file
            .as_mut()
            .ok_or_else(|| BridgeError::read(format!("{} is not open", name)))?;

        Ok(Box::new(StreamReader::new(
            file,
            readable,
            Chunking::Lines,
            name.as_str(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ReadOutcome;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_missing_file_is_no_device() {
        let requester = ReplayPortRequester::new("/nonexistent/scans.txt");
        let err = requester.request_port(&[]).await.err().unwrap();
        assert!(matches!(err, BridgeError::NoDeviceSelected));
    }

    #[tokio::test]
    async fn test_replays_lines_then_ends() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"A1234\nB5678").unwrap();

        let requester = ReplayPortRequester::new(temp_file.path());
        let mut port = requester.request_port(&[]).await.unwrap();
        assert!(!port.is_readable());

        port.open(SerialOptions::default()).await.unwrap();
        assert!(port.is_readable());

        {
            let mut reader = port.reader().unwrap();
            assert_eq!(reader.read().await.unwrap(), ReadOutcome::Data(b"A1234\n".to_vec()));
            assert_eq!(reader.read().await.unwrap(), ReadOutcome::Data(b"B5678".to_vec()));
            assert_eq!(reader.read().await.unwrap(), ReadOutcome::Done);
            reader.release_lock();
        }

        assert!(!port.is_readable());
    }
}
