//! Three-dimensional points in sensor-local cartesian space.
//!
//! Coordinates are double-precision millimeters. A [Point] doubles as a free
//! vector from the origin when a direction is intended; [Vector] is provided
//! as an alias for those call sites:
//!
//! ```
//! use lidar_anomaly::{Point, Vector};
//! let normal: Vector = Point::new(1., 0., 0.).cross(&Point::new(0., 1., 0.));
//! assert_eq!(normal, Point::new(0., 0., 1.));
//! ```

use crate::geometry::Rotation;
use nalgebra::Vector3;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Two points closer than this on every axis compare equal.
const EQUALITY_TOLERANCE: f64 = f64::EPSILON * 100.;

/// A three-dimensional point, in millimeters.
#[derive(Clone, Copy, Debug, Default)]
pub struct Point {
    /// The x coordinate. The sensor points down this axis.
    pub x: f64,

    /// The y coordinate.
    pub y: f64,

    /// The z coordinate.
    pub z: f64,
}

/// A [Point] used as a direction from the origin.
pub type Vector = Point;

impl Point {
    /// Creates a new point.
    ///
    /// # Examples
    ///
    /// ```
    /// # use lidar_anomaly::Point;
    /// let point = Point::new(1., 2., 3.);
    /// ```
    pub fn new(x: f64, y: f64, z: f64) -> Point {
        Point { x, y, z }
    }

    /// Returns the scalar (dot) product with another point.
    ///
    /// # Examples
    ///
    /// ```
    /// # use lidar_anomaly::Point;
    /// assert_eq!(0., Point::new(1., 0., 0.).dot(&Point::new(0., 1., 0.)));
    /// ```
    pub fn dot(&self, other: &Point) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Returns the cross product with another point.
    pub fn cross(&self, other: &Point) -> Vector {
        Vector {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Returns the 3D euclidean distance to another point.
    ///
    /// # Examples
    ///
    /// ```
    /// # use lidar_anomaly::Point;
    /// let distance = Point::new(0., 3., 4.).distance(&Point::default());
    /// assert_eq!(5., distance);
    /// ```
    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2) + (self.z - other.z).powi(2))
            .sqrt()
    }

    /// Returns the length of this point taken as a vector from the origin.
    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Returns the angle in radians between this vector and another.
    ///
    /// Both are taken as free vectors from the origin. The result lies in
    /// [0, π]; it is meaningless if either vector is zero.
    pub fn angle_to(&self, other: &Vector) -> f64 {
        let cosine = self.dot(other) / (self.norm() * other.norm());
        cosine.clamp(-1., 1.).acos()
    }

    /// Rotates this point by a rotation matrix.
    ///
    /// # Examples
    ///
    /// ```
    /// # use lidar_anomaly::Point;
    /// use lidar_anomaly::geometry;
    /// let rotation = geometry::rotation_from_degrees(&Point::new(0., 0., 90.));
    /// let rotated = Point::new(1., 0., 0.).rotate(&rotation);
    /// assert!(rotated.distance(&Point::new(0., 1., 0.)) < 1e-12);
    /// ```
    pub fn rotate(&self, rotation: &Rotation) -> Point {
        let rotated = rotation * Vector3::new(self.x, self.y, self.z);
        Point {
            x: rotated.x,
            y: rotated.y,
            z: rotated.z,
        }
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Point) -> bool {
        (self.x - other.x).abs() <= EQUALITY_TOLERANCE
            && (self.y - other.y).abs() <= EQUALITY_TOLERANCE
            && (self.z - other.z).abs() <= EQUALITY_TOLERANCE
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, other: Point) -> Point {
        Point {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, other: Point) -> Point {
        Point {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl Mul for Point {
    type Output = Point;
    fn mul(self, other: Point) -> Point {
        Point {
            x: self.x * other.x,
            y: self.y * other.y,
            z: self.z * other.z,
        }
    }
}

impl Div for Point {
    type Output = Point;
    fn div(self, other: Point) -> Point {
        Point {
            x: self.x / other.x,
            y: self.y / other.y,
            z: self.z / other.z,
        }
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, factor: f64) -> Point {
        Point {
            x: self.x * factor,
            y: self.y * factor,
            z: self.z * factor,
        }
    }
}

impl Div<f64> for Point {
    type Output = Point;
    fn div(self, divisor: f64) -> Point {
        Point {
            x: self.x / divisor,
            y: self.y / divisor,
            z: self.z / divisor,
        }
    }
}

impl Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        Point {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addition_is_associative() {
        let p = Point::new(1., 2., 3.);
        let q = Point::new(-4., 5., 0.5);
        let r = Point::new(0.25, -1., 7.);
        assert_eq!((p + q) + r, p + (q + r));
    }

    #[test]
    fn addition_identity() {
        let p = Point::new(1., 2., 3.);
        assert_eq!(p, p + Point::default());
    }

    #[test]
    fn dot_is_commutative() {
        let p = Point::new(1., 2., 3.);
        let q = Point::new(-4., 5., 0.5);
        assert_eq!(p.dot(&q), q.dot(&p));
        assert_eq!(0., p.dot(&Point::default()));
    }

    #[test]
    fn cross_is_orthogonal() {
        let p = Point::new(1., 2., 3.);
        let q = Point::new(-4., 5., 0.5);
        assert!(p.cross(&q).dot(&p).abs() < 1e-12);
        assert!(p.cross(&q).dot(&q).abs() < 1e-12);
    }

    #[test]
    fn equality_has_tolerance() {
        let p = Point::new(1., 2., 3.);
        let q = Point::new(1. + f64::EPSILON, 2., 3.);
        assert_eq!(p, q);
        assert_ne!(p, Point::new(1.1, 2., 3.));
    }

    #[test]
    fn angle_between_axes() {
        let x = Point::new(1., 0., 0.);
        let y = Point::new(0., 2., 0.);
        assert!((x.angle_to(&y) - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert!(x.angle_to(&x).abs() < 1e-12);
    }
}
