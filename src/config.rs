//! Tunables and their defaults.
//!
//! The scan windows, the reflectivity gate, and the background distance are
//! runtime-settable on the [Characterizer](crate::Characterizer) (command
//! line and the shell's `set` command); the rest are fixed at build time.
//! Distances are in the sensor's millimeter point units unless noted.

use std::f64::consts::PI;

/// Radians per degree.
pub const RAD_PER_DEG: f64 = PI / 180.;

/// Broadcast code of the lab's Livox Horizon unit, used when `-b default`
/// is requested.
pub const DEFAULT_BROADCAST_CODE: &str = "3WEDH7600101621";

/// Default object scan window in milliseconds.
pub const DEFAULT_OBJECT_FRAME_MS: u32 = 250;

/// Default background scan window in milliseconds.
pub const DEFAULT_BACKGROUND_FRAME_MS: u32 = 2000;

/// Default minimum reflectivity for a point to be considered at all.
pub const DEFAULT_MIN_REFLECTIVITY: f64 = 0.0;

/// Default distance under which a point is considered background.
///
/// The command line documents this option in meters and the value is used as
/// given, matching the recorded sessions this pipeline was tuned on.
pub const DEFAULT_BACKGROUND_DISTANCE: f64 = 0.04;

/// Minimum points for an initial cluster to be kept.
pub const MIN_CLUSTER_POINTS: usize = 20;

/// Minimum points for a face to be kept.
pub const MIN_FACE_POINTS: usize = 15;

/// Maximum distance (mm) between points of the same cluster.
pub const CLUSTER_POINT_PROXIMITY: f64 = 20.;

/// Maximum distance (mm) between points of the same face.
pub const FACE_POINT_PROXIMITY: f64 = 30.;

/// Maximum angle (radians) between normals of points on the same face.
pub const MAX_NORMAL_VECT_ANGLE_OC: f64 = 3. * RAD_PER_DEG;

/// Maximum angle (radians) between matched face normals still reported as
/// similar by the anomaly detector.
pub const MAX_NORMAL_VECT_ANGLE_AD: f64 = 1.5 * RAD_PER_DEG;

/// Difference (mm) between bounding-box extents at which two shapes stop
/// being similar. Deltas must stay strictly under this bound.
pub const MAX_DIMENSION_DELTA: f64 = 40.;

/// Octree leaves subdivide beyond this many points.
pub const MAX_POINTS: usize = 100;
