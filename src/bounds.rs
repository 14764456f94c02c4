//! Minimum and maximum bounds in three dimensions.

use crate::{Point, Vector};

/// An axis-aligned bounding box as a (min, max) corner pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    /// The minimum values.
    pub min: Vector,

    /// The maximum values.
    pub max: Vector,
}

impl Bounds {
    /// Grows the bounds to encompass this point.
    ///
    /// # Examples
    ///
    /// ```
    /// # use lidar_anomaly::{Bounds, Point};
    /// let mut bounds = Bounds::default();
    /// bounds.grow(&Point::new(1., 2., 3.));
    /// assert_eq!(1., bounds.min.x);
    /// assert_eq!(3., bounds.max.z);
    /// ```
    pub fn grow(&mut self, point: &Point) {
        if point.x < self.min.x {
            self.min.x = point.x;
        }
        if point.y < self.min.y {
            self.min.y = point.y;
        }
        if point.z < self.min.z {
            self.min.z = point.z;
        }
        if point.x > self.max.x {
            self.max.x = point.x;
        }
        if point.y > self.max.y {
            self.max.y = point.y;
        }
        if point.z > self.max.z {
            self.max.z = point.z;
        }
    }

    /// Returns the bounds of a set of points.
    pub fn of<'a, I>(points: I) -> Bounds
    where
        I: IntoIterator<Item = &'a Point>,
    {
        let mut bounds = Bounds::default();
        for point in points {
            bounds.grow(point);
        }
        bounds
    }

    /// Returns the center of these bounds.
    pub fn center(&self) -> Point {
        (self.min + self.max) / 2.
    }

    /// Returns the extent along each axis.
    ///
    /// Empty (default) bounds report zero extents.
    pub fn extents(&self) -> Vector {
        if self.min.x > self.max.x {
            Vector::default()
        } else {
            self.max - self.min
        }
    }
}

impl Default for Bounds {
    fn default() -> Bounds {
        Bounds {
            min: Vector {
                x: f64::INFINITY,
                y: f64::INFINITY,
                z: f64::INFINITY,
            },
            max: Vector {
                x: f64::NEG_INFINITY,
                y: f64::NEG_INFINITY,
                z: f64::NEG_INFINITY,
            },
        }
    }
}
