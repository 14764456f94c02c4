//! Query kernels for octree neighbor searches.
//!
//! A [Kernel] is a shape with a center and a radius that filters octree
//! points. Circle and Square test only the Y and Z coordinates: the sensor
//! looks down the X axis, so occlusion-style tests against the background are
//! naturally planar. Sphere and Cube test all three axes.
//!
//! ```
//! use lidar_anomaly::{Kernel, Point};
//! let kernel = Kernel::circle(Point::default(), 1.);
//! // x is ignored by the planar kernels
//! assert!(kernel.contains(&Point::new(100., 0.5, 0.5)));
//! ```

use crate::Point;

/// A neighbor-search shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Kernel {
    /// A circle in the YZ plane.
    Circle {
        /// The center of the circle.
        center: Point,
        /// The radius of the circle.
        radius: f64,
    },
    /// An axis-aligned square in the YZ plane.
    Square {
        /// The center of the square.
        center: Point,
        /// Half the side length.
        radius: f64,
    },
    /// A sphere.
    Sphere {
        /// The center of the sphere.
        center: Point,
        /// The radius of the sphere.
        radius: f64,
    },
    /// An axis-aligned cube.
    Cube {
        /// The center of the cube.
        center: Point,
        /// Half the edge length.
        radius: f64,
    },
}

impl Kernel {
    /// Creates a circle kernel in the YZ plane.
    pub fn circle(center: Point, radius: f64) -> Kernel {
        Kernel::Circle { center, radius }
    }

    /// Creates a square kernel in the YZ plane.
    pub fn square(center: Point, radius: f64) -> Kernel {
        Kernel::Square { center, radius }
    }

    /// Creates a sphere kernel.
    pub fn sphere(center: Point, radius: f64) -> Kernel {
        Kernel::Sphere { center, radius }
    }

    /// Creates a cube kernel.
    pub fn cube(center: Point, radius: f64) -> Kernel {
        Kernel::Cube { center, radius }
    }

    /// Returns true if the point lies inside the kernel.
    ///
    /// Containment is inclusive, so a zero-radius kernel still hits points at
    /// exactly its center.
    pub fn contains(&self, p: &Point) -> bool {
        match *self {
            Kernel::Circle { center, radius } => {
                (p.z - center.z).powi(2) + (p.y - center.y).powi(2) <= radius * radius
            }
            Kernel::Square { center, radius } => {
                (p.y - center.y).abs() <= radius && (p.z - center.z).abs() <= radius
            }
            Kernel::Sphere { center, radius } => {
                (p.z - center.z).powi(2) + (p.y - center.y).powi(2) + (p.x - center.x).powi(2)
                    <= radius * radius
            }
            Kernel::Cube { center, radius } => {
                (p.x - center.x).abs() <= radius
                    && (p.y - center.y).abs() <= radius
                    && (p.z - center.z).abs() <= radius
            }
        }
    }

    /// Returns true if an octant cube may hold points inside the kernel.
    ///
    /// The octant is given by its center and half-edge. Planar kernels
    /// overlap on Y and Z only; spatial kernels on all three axes. The test
    /// is against the kernel's bounding box, so it may report false
    /// positives, never false negatives.
    pub fn overlaps(&self, octant_center: &Point, octant_half_edge: f64) -> bool {
        let (center, radius, planar) = self.parts();
        if octant_center.z + octant_half_edge < center.z - radius
            || octant_center.y + octant_half_edge < center.y - radius
            || octant_center.z - octant_half_edge > center.z + radius
            || octant_center.y - octant_half_edge > center.y + radius
        {
            return false;
        }
        if planar {
            return true;
        }
        octant_center.x + octant_half_edge >= center.x - radius
            && octant_center.x - octant_half_edge <= center.x + radius
    }

    fn parts(&self) -> (Point, f64, bool) {
        match *self {
            Kernel::Circle { center, radius } | Kernel::Square { center, radius } => {
                (center, radius, true)
            }
            Kernel::Sphere { center, radius } | Kernel::Cube { center, radius } => {
                (center, radius, false)
            }
        }
    }
}
