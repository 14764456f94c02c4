//! Point timestamps with nanosecond resolution.
//!
//! A [Timestamp] is a (seconds, nanoseconds) pair with the nanoseconds kept
//! below one second. The sensor transmits timestamps as an 8-byte
//! little-endian nanosecond counter, and recorded CSV streams carry the same
//! counter as a decimal string; both views round-trip losslessly:
//!
//! ```
//! use lidar_anomaly::Timestamp;
//! let timestamp: Timestamp = "1500000000".parse().unwrap();
//! assert_eq!(1, timestamp.seconds());
//! assert_eq!(500_000_000, timestamp.nanoseconds());
//! assert_eq!(timestamp, Timestamp::from_le_bytes(timestamp.to_le_bytes()));
//! ```

use crate::{Error, Result};
use std::fmt;
use std::ops::Add;
use std::str::FromStr;

const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// A point-of-capture timestamp.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    seconds: u64,
    nanoseconds: u32,
}

impl Timestamp {
    /// Creates a new timestamp, normalizing nanosecond overflow.
    ///
    /// # Examples
    ///
    /// ```
    /// # use lidar_anomaly::Timestamp;
    /// let timestamp = Timestamp::new(1, 2_500_000_000);
    /// assert_eq!(3, timestamp.seconds());
    /// assert_eq!(500_000_000, timestamp.nanoseconds());
    /// ```
    pub fn new(seconds: u64, nanoseconds: u64) -> Timestamp {
        Timestamp {
            seconds: seconds + nanoseconds / NANOS_PER_SECOND,
            nanoseconds: (nanoseconds % NANOS_PER_SECOND) as u32,
        }
    }

    /// Creates a timestamp from a nanosecond counter.
    pub fn from_nanos(nanos: u64) -> Timestamp {
        Timestamp::new(0, nanos)
    }

    /// Creates a timestamp from the sensor's 8-byte little-endian counter.
    pub fn from_le_bytes(bytes: [u8; 8]) -> Timestamp {
        Timestamp::from_nanos(u64::from_le_bytes(bytes))
    }

    /// Returns the whole seconds of this timestamp.
    pub fn seconds(&self) -> u64 {
        self.seconds
    }

    /// Returns the sub-second nanoseconds, always below 10⁹.
    pub fn nanoseconds(&self) -> u32 {
        self.nanoseconds
    }

    /// Returns this timestamp as a nanosecond counter.
    pub fn as_nanos(&self) -> u64 {
        self.seconds * NANOS_PER_SECOND + u64::from(self.nanoseconds)
    }

    /// Returns this timestamp as the sensor's 8-byte little-endian counter.
    pub fn to_le_bytes(&self) -> [u8; 8] {
        self.as_nanos().to_le_bytes()
    }
}

impl FromStr for Timestamp {
    type Err = Error;

    /// Parses a decimal nanosecond counter.
    ///
    /// Signs, fractions, and anything else `u64` rejects fail with
    /// [Error::InvalidTimestamp].
    fn from_str(s: &str) -> Result<Timestamp> {
        s.parse::<u64>()
            .map(Timestamp::from_nanos)
            .map_err(|_| Error::InvalidTimestamp(s.to_string()))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_nanos())
    }
}

impl Add<u64> for Timestamp {
    type Output = Timestamp;

    /// Adds nanoseconds, carrying into the seconds.
    fn add(self, nanos: u64) -> Timestamp {
        Timestamp::new(self.seconds, u64::from(self.nanoseconds) + nanos)
    }
}
