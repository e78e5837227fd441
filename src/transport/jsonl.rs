//! # JSON Lines Capture
//!
//! Appends every transmitted message to a file, one JSON object per line:
//!
//! ```text
//! {"timestamp":"2024-08-01T12:00:00.100Z","pgn":127488,"priority":2,"data":"00 70 17 FF FF 7F FF FF"}
//! ```

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::Transport;
use crate::error::Result;
use crate::n2k::N2kMessage;

/// One captured message
#[derive(Debug, Serialize)]
struct Record<'a> {
    timestamp: String,
    pgn: u32,
    priority: u8,
    data: &'a str,
}

/// Transport writing a JSONL capture file
#[derive(Debug)]
pub struct JsonlTransport {
    writer: BufWriter<File>,
    path: PathBuf,
    written: u64,
    failures: u64,
}

impl JsonlTransport {
    /// Open (or create) the capture file in append mode
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        info!("Capturing NMEA 2000 messages to {}", path.display());

        Ok(Self {
            writer: BufWriter::new(file),
            path,
            written: 0,
            failures: 0,
        })
    }

    /// Capture file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records written
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Number of records lost to I/O errors
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Flush buffered records to disk
    ///
    /// # Errors
    ///
    /// Returns error if the flush fails
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn write_record(&mut self, message: &N2kMessage) -> std::io::Result<()> {
        let data = message.to_hex();
        let record = Record {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            pgn: message.pgn,
            priority: message.priority,
            data: &data,
        };
        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer.write_all(b"\n")
    }
}

impl Transport for JsonlTransport {
    fn send(&mut self, message: &N2kMessage) {
        match self.write_record(message) {
            Ok(()) => self.written += 1,
            Err(e) => {
                self.failures += 1;
                warn!("Failed to capture PGN {}: {}", message.pgn, e);
            }
        }
    }
}

impl Drop for JsonlTransport {
    fn drop(&mut self) {
        if let Err(e) = self.writer.flush() {
            warn!("Failed to flush {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::n2k::protocol::PGN_FLUID_LEVEL;
    use tempfile::tempdir;

    #[test]
    fn test_writes_one_line_per_message() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("capture.jsonl");

        let mut transport = JsonlTransport::open(&path).unwrap();
        let msg = N2kMessage::new(PGN_FLUID_LEVEL, 6, vec![0x10, 0xFF]).unwrap();
        transport.send(&msg);
        transport.send(&msg);
        transport.flush().unwrap();
        assert_eq!(transport.written(), 2);
        assert_eq!(transport.failures(), 0);

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["pgn"], 127505);
        assert_eq!(value["priority"], 6);
        assert_eq!(value["data"], "10 FF");
        assert!(value["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_appends_to_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("capture.jsonl");
        let msg = N2kMessage::new(PGN_FLUID_LEVEL, 6, vec![0x00]).unwrap();

        {
            let mut transport = JsonlTransport::open(&path).unwrap();
            transport.send(&msg);
        }
        {
            let mut transport = JsonlTransport::open(&path).unwrap();
            assert_eq!(transport.path(), path.as_path());
            transport.send(&msg);
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn test_open_in_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let result = JsonlTransport::open(dir.path().join("missing").join("capture.jsonl"));
        assert!(result.is_err());
    }
}
