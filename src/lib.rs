//! Detects geometric anomalies in objects scanned by a
//! [LiDAR](https://en.wikipedia.org/wiki/Lidar) sensor.
//!
//! Points stream from a [Scanner] (the live sensor or a recorded `.csv` /
//! `.lvx` file) into a [Characterizer], which learns a static background
//! and collects the transient foreground into an object buffer. The buffer
//! is characterized as planar faces inside a minimum-volume oriented
//! bounding box, and characterized objects are compared against stored
//! reference models to report missing faces and off-dimension geometry.
//!
//! # Characterizing an object
//!
//! The characterizer is the sink a scanner feeds; windows are delimited by
//! the stream's own timestamps:
//!
//! ```no_run
//! use lidar_anomaly::{CharacterizedObject, Characterizer, Scanner};
//!
//! let mut scanner = Scanner::from_path("capture.lvx").unwrap();
//! scanner.init().unwrap();
//! let mut characterizer = Characterizer::new();
//!
//! characterizer.begin_background();
//! scanner.scan(&mut |point| characterizer.feed(&point)).unwrap();
//!
//! characterizer.begin_object();
//! scanner.scan(&mut |point| characterizer.feed(&point)).unwrap();
//! let object = CharacterizedObject::characterize(characterizer.take_object()).unwrap();
//! println!("{} faces", object.faces().len());
//! ```
//!
//! # Detecting anomalies
//!
//! ```no_run
//! use lidar_anomaly::anomaly;
//! # let (object, model) = unimplemented!();
//! let report = anomaly::compare(&object, &model);
//! println!("similar: {}", report.similar);
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    unused_import_braces,
    unused_qualifications
)]

pub mod anomaly;
pub mod app;
pub mod characterizer;
pub mod config;
pub mod dbscan;
pub mod geometry;
pub mod model;
pub mod scanner;

mod bbox;
mod bounds;
mod error;
mod face;
mod kernel;
mod lidar_point;
mod object;
mod octree;
mod point;
mod registry;
mod timestamp;

pub use crate::anomaly::AnomalyReport;
pub use crate::bbox::BBox;
pub use crate::bounds::Bounds;
pub use crate::characterizer::Characterizer;
pub use crate::error::Error;
pub use crate::face::Face;
pub use crate::kernel::Kernel;
pub use crate::lidar_point::{LidarPoint, LIVOX_CSV_HEADER};
pub use crate::model::Model;
pub use crate::object::CharacterizedObject;
pub use crate::octree::Octree;
pub use crate::point::{Point, Vector};
pub use crate::registry::Registry;
pub use crate::scanner::Scanner;
pub use crate::timestamp::Timestamp;

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, Error>;
