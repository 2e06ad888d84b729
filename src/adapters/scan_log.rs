use crate::domain::model::ScanRecord;
use crate::domain::ports::StateSink;
use crate::utils::error::Result;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

/// Appends every scan to a CSV file as `timestamp,text`.
pub struct CsvScanLog {
    writer: Mutex<csv::Writer<File>>,
}

impl CsvScanLog {
    /// Opens `path` for appending; the header row is written only when the
    /// file is new or empty.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let needs_header = file.metadata()?.len() == 0;

        let writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);

        tracing::debug!("Logging scans to {}", path.display());
        Ok(Self {
            writer: Mutex::new(writer),
        })
    }

    pub fn append(&self, record: &ScanRecord) -> Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        writer.serialize(record)?;
        writer.flush()?;
        Ok(())
    }
}

impl StateSink for CsvScanLog {
    fn publish(&self, value: &str) {
        if let Err(e) = self.append(&ScanRecord::now(value)) {
            tracing::error!("Failed to log scan: {}", e);
        }
    }
}
