//! Oriented bounding boxes, reduced to their extents.
//!
//! A [BBox] records the axis-aligned extents of a point set after some
//! rotation; the rotation itself is kept separately by whoever performed the
//! search (see [geometry::minimum_bbox](crate::geometry::minimum_bbox)).

use crate::geometry::Rotation;
use crate::{Bounds, Point, Vector};

/// The extents of a (possibly rotated) tight bounding box.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BBox {
    extents: Vector,
}

impl BBox {
    /// Creates a bounding box from its extents.
    pub fn from_extents(extents: Vector) -> BBox {
        BBox { extents }
    }

    /// Returns the tight axis-aligned box of a point set.
    ///
    /// # Examples
    ///
    /// ```
    /// # use lidar_anomaly::{BBox, Point};
    /// let bbox = BBox::axis_aligned(&[Point::new(0., 0., 0.), Point::new(1., 2., 3.)]);
    /// assert_eq!(6., bbox.volume());
    /// ```
    pub fn axis_aligned(points: &[Point]) -> BBox {
        BBox {
            extents: Bounds::of(points).extents(),
        }
    }

    /// Returns the tight box of a point set after rotating every point.
    pub fn of(points: &[Point], rotation: &Rotation) -> BBox {
        let mut bounds = Bounds::default();
        for point in points {
            bounds.grow(&point.rotate(rotation));
        }
        BBox {
            extents: bounds.extents(),
        }
    }

    /// Returns the extents along each (rotated) axis.
    pub fn extents(&self) -> Vector {
        self.extents
    }

    /// Returns the enclosed volume.
    pub fn volume(&self) -> f64 {
        self.extents.x * self.extents.y * self.extents.z
    }

    /// Returns true if this box beats an incumbent under the search order.
    ///
    /// Strictly smaller volume wins; equal volumes fall back to the
    /// lexicographic comparison of (Δx, Δy, Δz), so the search has a single
    /// best orientation to converge on.
    pub fn improves(&self, incumbent: &BBox) -> bool {
        let (va, vb) = (self.volume(), incumbent.volume());
        if va < vb {
            return true;
        }
        if va > vb {
            return false;
        }
        lex_less(&self.extents, &incumbent.extents)
    }
}

/// Strict lexicographic order on coordinate triples.
pub(crate) fn lex_less(a: &Vector, b: &Vector) -> bool {
    if a.x != b.x {
        return a.x < b.x;
    }
    if a.y != b.y {
        return a.y < b.y;
    }
    a.z < b.z
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry;

    #[test]
    fn volume() {
        let bbox = BBox::from_extents(Vector::new(2., 3., 4.));
        assert_eq!(24., bbox.volume());
    }

    #[test]
    fn smaller_volume_improves() {
        let small = BBox::from_extents(Vector::new(1., 1., 1.));
        let large = BBox::from_extents(Vector::new(2., 1., 1.));
        assert!(small.improves(&large));
        assert!(!large.improves(&small));
    }

    #[test]
    fn equal_volume_breaks_ties_lexicographically() {
        let a = BBox::from_extents(Vector::new(1., 2., 3.));
        let b = BBox::from_extents(Vector::new(2., 1., 3.));
        assert_eq!(a.volume(), b.volume());
        assert!(a.improves(&b));
        assert!(!b.improves(&a));
        assert!(!a.improves(&a));
    }

    #[test]
    fn rotated_box_of_unit_square() {
        let points = [
            Point::new(0., 0., 0.),
            Point::new(0., 1., 0.),
            Point::new(0., 0., 1.),
            Point::new(0., 1., 1.),
        ];
        let rotation = geometry::rotation_from_degrees(&Vector::new(45., 0., 0.));
        let rotated = BBox::of(&points, &rotation);
        let side = 2f64.sqrt();
        assert!((rotated.extents().y - side).abs() < 1e-12);
        assert!((rotated.extents().z - side).abs() < 1e-12);
    }
}
