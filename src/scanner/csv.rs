//! Reads recorded Livox-Viewer CSV streams.

use super::{Flow, ScanCode, Sink};
use crate::{Error, LidarPoint, Result, Timestamp};
use log::{debug, warn};
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Comma-separated field positions of the columns we consume.
const TIMESTAMP_FIELD: usize = 7;
const REFLECTIVITY_FIELD: usize = 11;
const X_FIELD: usize = 13;

/// A scanner over a Livox-Viewer CSV export.
///
/// The first line is a header; data rows carry the timestamp (decimal
/// nanoseconds), the reflectivity, and the millimeter coordinates at fixed
/// comma positions. Rows that fail to parse are logged and skipped; one bad
/// row does not poison the scan.
#[derive(Debug)]
pub struct CsvScanner {
    path: PathBuf,
    reader: Option<BufReader<File>>,
    at_eof: bool,
}

impl CsvScanner {
    /// Creates a scanner for a CSV file; the file is opened by `init`.
    pub fn new<P: AsRef<Path>>(path: P) -> CsvScanner {
        CsvScanner {
            path: path.as_ref().to_path_buf(),
            reader: None,
            at_eof: false,
        }
    }

    /// Opens the file and skips the header line.
    pub fn init(&mut self) -> Result<()> {
        if self.reader.is_some() {
            debug!("csv scanner for {} already initialized", self.path.display());
            return Ok(());
        }
        debug!("initializing csv scanner for {}", self.path.display());
        self.open()
    }

    fn open(&mut self) -> Result<()> {
        let file = File::open(&self.path)
            .map_err(|e| Error::SourceUnavailable(format!("{}: {e}", self.path.display())))?;
        let mut reader = BufReader::new(file);
        let mut header = String::new();
        reader
            .read_line(&mut header)
            .map_err(|e| Error::SourceUnavailable(format!("{}: {e}", self.path.display())))?;
        self.reader = Some(reader);
        self.at_eof = false;
        Ok(())
    }

    /// Streams rows to the sink.
    ///
    /// Resumes from the current position; when called again after EOF, the
    /// reader rewinds past the header and replays the file.
    pub fn scan(&mut self, sink: &mut Sink<'_>) -> Result<ScanCode> {
        if self.reader.is_none() {
            self.open()?;
        }
        if self.at_eof {
            self.rewind()?;
        }
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| Error::Scan("csv scanner has no open file".to_string()))?;

        let mut line = String::new();
        loop {
            line.clear();
            let read = reader
                .read_line(&mut line)
                .map_err(|e| Error::Scan(format!("csv read failed: {e}")))?;
            if read == 0 {
                debug!("csv stream reached eof");
                self.at_eof = true;
                return Ok(ScanCode::Eof);
            }
            let row = line.trim_end();
            if row.is_empty() {
                continue;
            }
            match parse_row(row) {
                Some(point) => {
                    if sink(point) == Flow::Pause {
                        return Ok(ScanCode::Paused);
                    }
                }
                None => warn!("skipping malformed csv row: {row}"),
            }
        }
    }

    /// Closes the file.
    pub fn stop(&mut self) {
        debug!("closing csv scanner for {}", self.path.display());
        self.reader = None;
        self.at_eof = false;
    }

    fn rewind(&mut self) -> Result<()> {
        if let Some(reader) = self.reader.as_mut() {
            reader
                .seek(SeekFrom::Start(0))
                .map_err(|e| Error::Scan(format!("csv rewind failed: {e}")))?;
            let mut header = String::new();
            reader
                .read_line(&mut header)
                .map_err(|e| Error::Scan(format!("csv rewind failed: {e}")))?;
            self.at_eof = false;
        }
        Ok(())
    }
}

/// Parses one data row, by 0-indexed comma count: timestamp at 7,
/// reflectivity at 11, coordinates at 13, 14, 15.
fn parse_row(row: &str) -> Option<LidarPoint> {
    let fields: Vec<&str> = row.split(',').collect();
    if fields.len() < X_FIELD + 3 {
        return None;
    }
    let timestamp: Timestamp = fields[TIMESTAMP_FIELD].trim().parse().ok()?;
    let reflectivity: u8 = fields[REFLECTIVITY_FIELD].trim().parse().ok()?;
    let x: f64 = fields[X_FIELD].trim().parse().ok()?;
    let y: f64 = fields[X_FIELD + 1].trim().parse().ok()?;
    let z: f64 = fields[X_FIELD + 2].trim().parse().ok()?;
    Some(LidarPoint::new(timestamp, reflectivity, x, y, z))
}
