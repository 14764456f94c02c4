//! Point sources.
//!
//! A [Scanner] produces a lazy, single-consumer sequence of [LidarPoint]
//! values in timestamp order. Delivery is synchronous: [scan](Scanner::scan)
//! blocks, handing each point to the sink on the calling thread, until the
//! sink asks to pause, the source runs dry, or something breaks:
//!
//! ```no_run
//! use lidar_anomaly::scanner::{Flow, ScanCode, Scanner};
//!
//! let mut scanner = Scanner::from_path("capture.csv").unwrap();
//! scanner.init().unwrap();
//! let mut seen = 0;
//! let code = scanner
//!     .scan(&mut |point| {
//!         seen += 1;
//!         if seen < 1000 { Flow::Continue } else { Flow::Pause }
//!     })
//!     .unwrap();
//! assert_eq!(ScanCode::Paused, code);
//! // a later scan resumes exactly where the sink paused
//! ```
//!
//! File scanners remember their position across a pause and rewind when
//! scanned again after the end of the stream.

mod csv;
mod device;
mod lvx;

pub use self::csv::CsvScanner;
pub use self::device::DeviceScanner;
pub use self::lvx::LvxScanner;

use crate::{Error, LidarPoint, Result, Timestamp};
use std::path::{Path, PathBuf};

/// How a completed scan ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanCode {
    /// The sink paused the scan; the source is still open and positioned.
    Paused,
    /// The source is exhausted. Scanning again rewinds file sources.
    Eof,
}

/// A sink's verdict after each delivered point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Keep the points coming.
    Continue,
    /// Return from `scan` at the next opportunity, keeping the position.
    Pause,
}

/// The per-point callback installed for the duration of a scan.
pub type Sink<'a> = dyn FnMut(LidarPoint) -> Flow + 'a;

/// A point source: a recorded file or the live sensor.
#[derive(Debug)]
pub enum Scanner {
    /// Livox-Viewer CSV recording.
    Csv(CsvScanner),
    /// LVX binary recording.
    Lvx(LvxScanner),
    /// Live sensor on the local network.
    Device(DeviceScanner),
}

impl Scanner {
    /// Creates a file scanner, picking the reader from the extension.
    ///
    /// `.csv` and `.lvx` (case-insensitive) are recognized; anything else
    /// fails with [Error::UnsupportedFile].
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Scanner> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("csv") => Ok(Scanner::Csv(CsvScanner::new(path))),
            Some("lvx") => Ok(Scanner::Lvx(LvxScanner::new(path))),
            _ => Err(Error::UnsupportedFile(PathBuf::from(path))),
        }
    }

    /// Creates a live-sensor scanner for a broadcast code.
    pub fn device(broadcast_code: &str) -> Scanner {
        Scanner::Device(DeviceScanner::new(broadcast_code))
    }

    /// Acquires the underlying source.
    ///
    /// Idempotent: initializing an already-initialized scanner succeeds with
    /// no effect beyond a log line. Failure to open the source is
    /// [Error::SourceUnavailable].
    pub fn init(&mut self) -> Result<()> {
        match self {
            Scanner::Csv(scanner) => scanner.init(),
            Scanner::Lvx(scanner) => scanner.init(),
            Scanner::Device(scanner) => scanner.init(),
        }
    }

    /// Delivers points to the sink until it pauses, the source ends, or a
    /// read fails.
    ///
    /// Returns [ScanCode::Paused] when the sink stopped the scan and
    /// [ScanCode::Eof] at the end of the stream; read and parse-structure
    /// failures are [Error::Scan].
    pub fn scan(&mut self, sink: &mut Sink<'_>) -> Result<ScanCode> {
        match self {
            Scanner::Csv(scanner) => scanner.scan(sink),
            Scanner::Lvx(scanner) => scanner.scan(sink),
            Scanner::Device(scanner) => scanner.scan(sink),
        }
    }

    /// Releases the underlying source.
    pub fn stop(&mut self) {
        match self {
            Scanner::Csv(scanner) => scanner.stop(),
            Scanner::Lvx(scanner) => scanner.stop(),
            Scanner::Device(scanner) => scanner.stop(),
        }
    }
}

/// Livox ethernet point-packet header, shared by the LVX container and the
/// live sensor's UDP stream.
#[derive(Clone, Copy, Debug)]
pub(crate) struct EthPacket {
    pub data_type: u8,
    pub timestamp: Timestamp,
}

/// Bytes in an ethernet packet header: version, slot, index, reserved,
/// error code, timestamp type, data type, 8-byte timestamp.
pub(crate) const ETH_HEADER_LEN: usize = 18;

/// Data-type code of the extended cartesian point packet, the only variant
/// this system consumes.
pub(crate) const EXTEND_CARTESIAN: u8 = 2;

/// Bytes per extended cartesian raw point: three i32 millimeters, one
/// reflectivity byte, one tag byte.
pub(crate) const EXTEND_RAW_POINT_LEN: usize = 14;

impl EthPacket {
    /// Parses a packet header, returning `None` on a short buffer.
    pub(crate) fn parse(bytes: &[u8]) -> Option<EthPacket> {
        if bytes.len() < ETH_HEADER_LEN {
            return None;
        }
        let mut stamp = [0u8; 8];
        stamp.copy_from_slice(&bytes[10..18]);
        Some(EthPacket {
            data_type: bytes[9],
            timestamp: Timestamp::from_le_bytes(stamp),
        })
    }

    /// Point payload length in bytes for a data-type code.
    ///
    /// Unknown codes are a container-format error.
    pub(crate) fn payload_len(data_type: u8) -> Result<usize> {
        // points-per-packet × bytes-per-point for each published data type
        let len = match data_type {
            0 => 100 * 13, // cartesian
            1 => 100 * 9,  // spherical
            2 => 96 * EXTEND_RAW_POINT_LEN,
            3 => 96 * 10, // extended spherical
            4 => 48 * 28, // dual extended cartesian
            5 => 48 * 20, // dual extended spherical
            6 => 24,      // imu
            other => {
                return Err(Error::InvalidLvx(format!(
                    "unknown packet data type {other}"
                )))
            }
        };
        Ok(len)
    }

    /// Parses one extended cartesian point from its 14-byte record.
    pub(crate) fn extend_cartesian_point(&self, bytes: &[u8]) -> Option<LidarPoint> {
        if bytes.len() < EXTEND_RAW_POINT_LEN {
            return None;
        }
        let x = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let y = i32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let z = i32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        let reflectivity = bytes[12];
        Some(LidarPoint::new(
            self.timestamp,
            reflectivity,
            f64::from(x),
            f64::from(y),
            f64::from(z),
        ))
    }
}
