//! Attributed points as delivered by the sensor.
//!
//! A [LidarPoint] is a [Point] with the capture [Timestamp] and the pulse
//! reflectivity. Scanners produce these; the characterizer consumes them and
//! keeps only the coordinates once a point is routed.

use crate::{Point, Timestamp};

/// Column header mandated by the Livox Viewer for CSV exports.
pub const LIVOX_CSV_HEADER: &str = "Version,Slot ID,LiDAR Index,Rsvd,Error Code,Timestamp Type,\
                                    Data Type,Timestamp,X,Y,Z,Reflectivity,Tag,\
                                    Ori_x,Ori_y,Ori_z,Ori_radius,Ori_theta,Ori_phi";

/// A timestamped, reflective point.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LidarPoint {
    /// The time at which the point was captured.
    pub timestamp: Timestamp,

    /// The pulse return magnitude, 0–255.
    pub reflectivity: u8,

    /// The x coordinate in millimeters.
    pub x: f64,

    /// The y coordinate in millimeters.
    pub y: f64,

    /// The z coordinate in millimeters.
    pub z: f64,
}

impl LidarPoint {
    /// Creates a new lidar point.
    ///
    /// # Examples
    ///
    /// ```
    /// use lidar_anomaly::{LidarPoint, Timestamp};
    /// let point = LidarPoint::new(Timestamp::from_nanos(10), 128, 1., 2., 3.);
    /// ```
    pub fn new(timestamp: Timestamp, reflectivity: u8, x: f64, y: f64, z: f64) -> LidarPoint {
        LidarPoint {
            timestamp,
            reflectivity,
            x,
            y,
            z,
        }
    }

    /// Creates a lidar point at a position, with a zero timestamp.
    ///
    /// Used when re-emitting stored points, e.g. for CSV export.
    pub fn at(position: Point, reflectivity: u8) -> LidarPoint {
        LidarPoint {
            timestamp: Timestamp::default(),
            reflectivity,
            x: position.x,
            y: position.y,
            z: position.z,
        }
    }

    /// Returns the coordinates of this point.
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y, self.z)
    }

    /// Formats this point as a Livox-Viewer CSV row.
    ///
    /// Nineteen comma-separated columns matching [LIVOX_CSV_HEADER]: the
    /// leading columns are the fixed packet metadata the viewer expects, the
    /// trailing `Ori_*` columns carry the integer-truncated coordinates.
    pub fn livox_csv_row(&self) -> String {
        format!(
            "5,1,1,0,0x00000000,0,2,{},{},{},{},{},0,{},{},{},0,0,0",
            self.timestamp,
            self.x,
            self.y,
            self.z,
            self.reflectivity,
            self.x as i64,
            self.y as i64,
            self.z as i64,
        )
    }
}
