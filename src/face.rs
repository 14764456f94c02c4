//! A planar face of a characterized object.

use crate::{geometry, BBox, Point, Vector};

/// A set of points sharing a surface orientation, with the minimum-volume
/// oriented box that encloses them.
#[derive(Clone, Debug, PartialEq)]
pub struct Face {
    points: Vec<Point>,
    normal: Vector,
    bbox: BBox,
    rotation: Vector,
}

impl Face {
    /// Creates a face from its points, computing the normal and the minimum
    /// oriented bounding box.
    pub fn new(points: Vec<Point>) -> Face {
        let normal = geometry::normal(&points).unwrap_or_default();
        let (bbox, rotation) = geometry::minimum_bbox(&points);
        Face {
            points,
            normal,
            bbox,
            rotation,
        }
    }

    /// Returns the points of this face.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Returns the plane normal fitted to the points.
    pub fn normal(&self) -> &Vector {
        &self.normal
    }

    /// Returns the minimum oriented bounding box of the points.
    pub fn bbox(&self) -> &BBox {
        &self.bbox
    }

    /// Returns the rotation angles (degrees, X then Y then Z) achieving the
    /// minimum box.
    pub fn rotation_degrees(&self) -> &Vector {
        &self.rotation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_of_a_plate() {
        let mut points = Vec::new();
        for j in 0..10 {
            for k in 0..10 {
                points.push(Point::new(0., j as f64, k as f64));
            }
        }
        let face = Face::new(points);
        assert_eq!(100, face.points().len());
        assert!(face.normal().x.abs() > 0.99);
        assert!(face.bbox().extents().x < 1e-9);
    }
}
