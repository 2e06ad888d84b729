use crate::domain::model::ReadOutcome;
use crate::domain::ports::SerialReader;
use crate::utils::error::{BridgeError, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

const READ_BUFFER_SIZE: usize = 4096;

/// How a byte stream is cut into reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chunking {
    /// Whatever the OS hands back in one read.
    Raw,
    /// One read per `\n`-terminated line.
    Lines,
}

/// Reader over any async byte stream. Ending the stream, or hitting an error
/// that is not transient, clears the owning port's `readable` flag.
pub(crate) struct StreamReader<'a, T> {
    stream: &'a mut T,
    readable: &'a mut bool,
    chunking: Chunking,
    buf: Vec<u8>,
    device: &'a str,
}

impl<'a, T> StreamReader<'a, T> {
    pub(crate) fn new(
        stream: &'a mut T,
        readable: &'a mut bool,
        chunking: Chunking,
        device: &'a str,
    ) -> Self {
        tracing::trace!("Reader acquired on {}", device);
        Self {
            stream,
            readable,
            chunking,
            buf: vec![0; READ_BUFFER_SIZE],
            device,
        }
    }
}

#[async_trait]
impl<'a, T> SerialReader for StreamReader<'a, T>
where
    T: AsyncBufRead + Unpin + Send,
{
    async fn read(&mut self) -> Result<ReadOutcome> {
        let result = match self.chunking {
            Chunking::Raw => self
                .stream
                .read(&mut self.buf)
                .await
                .map(|n| self.buf[..n].to_vec()),
            Chunking::Lines => {
                let mut line = Vec::new();
                match self.stream.read_until(b'\n', &mut line).await {
                    Ok(_) => Ok(line),
                    Err(e) if !line.is_empty() => {
                        tracing::warn!(
                            "Dropping {} bytes of a partial line on {}",
                            line.len(),
                            self.device
                        );
                        Err(std::io::Error::new(
                            e.kind(),
                            format!("{} after {} bytes of a partial line", e, line.len()),
                        ))
                    }
                    Err(e) => Err(e),
                }
            }
        };

        match result {
            Ok(bytes) if bytes.is_empty() => {
                *self.readable = false;
                Ok(ReadOutcome::Done)
            }
            Ok(bytes) => Ok(ReadOutcome::Data(bytes)),
            Err(e) => {
                if !is_transient(&e) {
                    *self.readable = false;
                }
                Err(BridgeError::read(format!("{}: {}", self.device, e)))
            }
        }
    }

    fn release_lock(&mut self) {
        tracing::trace!("Reader released on {}", self.device);
    }
}

/// Errors after which the port can hand out a fresh reader.
fn is_transient(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::Interrupted | ErrorKind::TimedOut | ErrorKind::WouldBlock
    )
}
