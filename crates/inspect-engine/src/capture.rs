//! Capture files
//!
//! A capture file is a JSON-lines recording of an event stream. The first
//! line is a [`CaptureHeader`]; every following non-empty line is a
//! [`CaptureRecord`].

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;
use tracing::debug;

/// Magic string identifying a capture file
pub const CAPTURE_MAGIC: &str = "inspect-capture";

/// Supported capture format version
pub const CAPTURE_VERSION: u32 = 1;

/// First line of a capture file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureHeader {
    /// Always [`CAPTURE_MAGIC`]
    pub magic: String,
    /// Format version
    pub version: u32,
    /// When the capture was written
    pub created_at: DateTime<Utc>,
}

impl Default for CaptureHeader {
    fn default() -> Self {
        Self {
            magic: CAPTURE_MAGIC.to_string(),
            version: CAPTURE_VERSION,
            created_at: Utc::now(),
        }
    }
}

/// One recorded event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRecord {
    /// Timestamp in nanoseconds since the Unix epoch
    pub ts: u64,
    /// Event source name
    pub source: String,
    /// Numeric event type
    pub event_type: u16,
    /// Event data
    pub data: String,
}

impl CaptureRecord {
    /// Create a record
    pub fn new(
        ts: u64,
        source: impl Into<String>,
        event_type: u16,
        data: impl Into<String>,
    ) -> Self {
        Self {
            ts,
            source: source.into(),
            event_type,
            data: data.into(),
        }
    }
}

/// Reads a capture file
#[derive(Debug)]
pub struct CaptureReader {
    header: CaptureHeader,
    records: Vec<CaptureRecord>,
}

impl CaptureReader {
    /// Open and fully parse a capture file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader = Self::from_reader(BufReader::new(file))?;
        debug!(
            "Loaded {} records from {}",
            reader.records.len(),
            path.display()
        );
        Ok(reader)
    }

    /// Parse a capture from any buffered reader
    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        let mut lines = reader.lines().enumerate();

        let header_line = match lines.next() {
            Some((_, line)) => read_line(1, line)?,
            None => return Err(Error::malformed(1, "missing header")),
        };
        let header: CaptureHeader = serde_json::from_str(&header_line)
            .map_err(|e| Error::malformed(1, format!("invalid header: {}", e)))?;
        if header.magic != CAPTURE_MAGIC {
            return Err(Error::malformed(
                1,
                format!("unknown magic {:?}", header.magic),
            ));
        }
        if header.version != CAPTURE_VERSION {
            return Err(Error::malformed(
                1,
                format!("unsupported version {}", header.version),
            ));
        }

        let mut records = Vec::new();
        for (idx, line) in lines {
            let line = read_line(idx + 1, line)?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line)
                .map_err(|e| Error::malformed(idx + 1, e.to_string()))?;
            records.push(record);
        }

        Ok(Self { header, records })
    }

    /// The file header
    pub fn header(&self) -> &CaptureHeader {
        &self.header
    }

    /// The recorded events
    pub fn records(&self) -> &[CaptureRecord] {
        &self.records
    }

    /// Consume the reader, returning the records
    pub fn into_records(self) -> Vec<CaptureRecord> {
        self.records
    }
}

/// Undecodable text is a format error, anything else is I/O
fn read_line(line: usize, read: std::io::Result<String>) -> Result<String> {
    read.map_err(|e| match e.kind() {
        ErrorKind::InvalidData => Error::malformed(line, e.to_string()),
        _ => Error::Io(e),
    })
}

/// Writes a capture file
pub struct CaptureWriter<W: Write> {
    out: W,
    written: usize,
}

impl CaptureWriter<BufWriter<File>> {
    /// Create (or truncate) a capture file at `path`
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> CaptureWriter<W> {
    /// Start a capture on `out`, writing the header immediately
    pub fn new(mut out: W) -> Result<Self> {
        serde_json::to_writer(&mut out, &CaptureHeader::default())?;
        out.write_all(b"\n")?;
        Ok(Self { out, written: 0 })
    }

    /// Append one record
    pub fn write(&mut self, record: &CaptureRecord) -> Result<()> {
        serde_json::to_writer(&mut self.out, record)?;
        self.out.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Number of records written so far
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush and return the underlying writer
    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}
