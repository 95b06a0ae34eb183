//! Append-only CSV files for collected leads.
//!
//! The header row is written only by the append that creates the file.
//! Appends through one sink are serialized, and writes run on the blocking
//! pool so the async executor never touches the disk.

use leadbot_core::error::ToolError;
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Timestamp format used in every lead row (local time).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time, formatted for a lead row.
pub fn timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// One CSV file with a fixed header. Clones share the write lock.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
    header: &'static [&'static str],
    lock: Arc<Mutex<()>>,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>, header: &'static [&'static str]) -> Self {
        Self {
            path: path.into(),
            header,
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &[&'static str] {
        self.header
    }

    /// Append one record. `record` must have one field per header column.
    pub async fn append(&self, record: Vec<String>) -> Result<(), ToolError> {
        if record.len() != self.header.len() {
            return Err(ToolError::ExecutionFailed {
                tool_name: "csv_sink".into(),
                reason: format!(
                    "record has {} fields, header has {}",
                    record.len(),
                    self.header.len()
                ),
            });
        }

        let _guard = self.lock.lock().await;
        let path = self.path.clone();
        let header = self.header;
        tokio::task::spawn_blocking(move || write_record(&path, header, &record))
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "csv_sink".into(),
                reason: format!("write task failed: {e}"),
            })?
    }
}

fn write_record(path: &Path, header: &[&str], record: &[String]) -> Result<(), ToolError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| write_failed(path, e))?;
    }

    let (file, is_new) = match OpenOptions::new().append(true).create_new(true).open(path) {
        Ok(file) => (file, true),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            let file = OpenOptions::new()
                .append(true)
                .open(path)
                .map_err(|e| write_failed(path, e))?;
            (file, false)
        }
        Err(e) => return Err(write_failed(path, e)),
    };

    let mut writer = csv::Writer::from_writer(file);
    if is_new {
        writer.write_record(header).map_err(|e| write_failed(path, e))?;
    }
    writer.write_record(record).map_err(|e| write_failed(path, e))?;
    writer.flush().map_err(|e| write_failed(path, e))?;

    debug!(path = %path.display(), new_file = is_new, "Appended lead record");
    Ok(())
}

fn write_failed(path: &Path, error: impl std::fmt::Display) -> ToolError {
    ToolError::ExecutionFailed {
        tool_name: "csv_sink".into(),
        reason: format!("{}: {error}", path.display()),
    }
}
