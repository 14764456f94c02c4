//! Centroids, surface normals, rotations, and the minimum-volume oriented
//! bounding box search.
//!
//! Normals come from the economy SVD of the mean-centered 3×N coordinate
//! matrix: the left singular vector of the smallest singular value. The
//! minimum-box search sweeps Euler angles coarse-then-fine; the sweep is
//! data-parallel and reduces under a total order, so its result does not
//! depend on the number of worker threads.

use crate::{config, BBox, Kernel, Octree, Point, Vector};
use nalgebra::{Matrix3xX, Rotation3, Vector3};
use rayon::prelude::*;

/// A 3×3 rotation.
pub type Rotation = Rotation3<f64>;

/// Returns the arithmetic mean of the given points.
///
/// # Examples
///
/// ```
/// use lidar_anomaly::{geometry, Point};
/// let centroid = geometry::centroid(&[Point::new(0., 0., 0.), Point::new(2., 4., 6.)]);
/// assert_eq!(Point::new(1., 2., 3.), centroid);
/// ```
pub fn centroid(points: &[Point]) -> Point {
    let mut sum = Point::default();
    for point in points {
        sum = sum + *point;
    }
    sum / points.len() as f64
}

/// Returns the normal of the plane best fitting the given points.
///
/// Needs at least three points; returns `None` otherwise, or when the
/// decomposition fails to converge.
pub fn normal(points: &[Point]) -> Option<Vector> {
    if points.len() < 3 {
        return None;
    }
    let mut coordinates = Matrix3xX::zeros(points.len());
    for (i, point) in points.iter().enumerate() {
        coordinates[(0, i)] = point.x;
        coordinates[(1, i)] = point.y;
        coordinates[(2, i)] = point.z;
    }
    let mean: Vector3<f64> = coordinates.column_mean();
    for mut column in coordinates.column_iter_mut() {
        column -= mean;
    }
    let svd = coordinates.svd(true, false);
    let u = svd.u?;
    // singular values are sorted descending, the normal is the last column
    Some(Vector::new(u[(0, 2)], u[(1, 2)], u[(2, 2)]))
}

/// Computes a normal for every point from its ε-neighborhood.
///
/// The neighborhood is a sphere query against `index`, which must be built
/// over `points` in order. Points with fewer than three neighbors get `None`:
/// no reliable normal exists for them. Normals are oriented so their X
/// component is nonnegative.
pub fn normals(points: &[Point], index: &Octree, distance: f64) -> Vec<Option<Vector>> {
    points
        .par_iter()
        .map(|point| {
            let neighbors = index.search(&Kernel::sphere(*point, distance));
            if neighbors.len() < 3 {
                return None;
            }
            let neighborhood: Vec<Point> = neighbors.iter().map(|&i| index.get(i)).collect();
            normal(&neighborhood).map(orient)
        })
        .collect()
}

/// Flips a normal so its X component is nonnegative.
fn orient(normal: Vector) -> Vector {
    if normal.x < 0. {
        -normal
    } else {
        normal
    }
}

/// Returns the coefficients (a, b, c, d) of the plane with the given normal
/// through the given point, as in ax + by + cz + d = 0.
pub fn plane(normal: &Vector, centroid: &Point) -> [f64; 4] {
    [normal.x, normal.y, normal.z, -normal.dot(centroid)]
}

/// Builds a rotation from per-axis angles in degrees.
///
/// ZYX intrinsic composition: γ around X, then β around Y, then α around Z,
/// with `degrees` = (γ, β, α).
pub fn rotation_from_degrees(degrees: &Vector) -> Rotation {
    Rotation::from_euler_angles(
        degrees.x * config::RAD_PER_DEG,
        degrees.y * config::RAD_PER_DEG,
        degrees.z * config::RAD_PER_DEG,
    )
}

/// Finds the minimum-volume oriented bounding box of a point set.
///
/// Coarse pass over ten-degree steps in [0°, 90°) per axis, then a fine pass
/// in unit steps within ±10° of the coarse winner. Returns the winning
/// extents and the rotation angles (degrees) that achieve them.
///
/// The candidate order is total (volume, then extents, then angles), so the
/// parallel sweep returns the same winner for any worker count.
pub fn minimum_bbox(points: &[Point]) -> (BBox, Vector) {
    let baseline = (BBox::axis_aligned(points), Vector::default());

    let coarse: Vec<Vector> = angle_grid(0, 90, 10);
    let best = sweep(points, &coarse, baseline);

    let fine: Vec<Vector> = fine_grid(&best.1);
    sweep(points, &fine, best)
}

fn angle_grid(from: i32, to: i32, step: i32) -> Vec<Vector> {
    let mut grid = Vec::new();
    let mut i = from;
    while i < to {
        let mut j = from;
        while j < to {
            let mut k = from;
            while k < to {
                if i != 0 || j != 0 || k != 0 {
                    grid.push(Vector::new(f64::from(i), f64::from(j), f64::from(k)));
                }
                k += step;
            }
            j += step;
        }
        i += step;
    }
    grid
}

fn fine_grid(around: &Vector) -> Vec<Vector> {
    let (x, y, z) = (around.x as i32, around.y as i32, around.z as i32);
    let mut grid = Vec::with_capacity(20 * 20 * 20);
    for i in x - 10..x + 10 {
        for j in y - 10..y + 10 {
            for k in z - 10..z + 10 {
                if i != x || j != y || k != z {
                    grid.push(Vector::new(f64::from(i), f64::from(j), f64::from(k)));
                }
            }
        }
    }
    grid
}

fn sweep(points: &[Point], angles: &[Vector], incumbent: (BBox, Vector)) -> (BBox, Vector) {
    angles
        .par_iter()
        .map(|angles| {
            let rotation = rotation_from_degrees(angles);
            (BBox::of(points, &rotation), *angles)
        })
        .reduce(|| incumbent.clone(), pick)
}

/// Picks the better of two candidates under the (volume, extents, angles)
/// total order.
fn pick(a: (BBox, Vector), b: (BBox, Vector)) -> (BBox, Vector) {
    if b.0.improves(&a.0) {
        return b;
    }
    if a.0.improves(&b.0) {
        return a;
    }
    // identical boxes, settle on the smaller angles
    if crate::bbox::lex_less(&b.1, &a.1) {
        b
    } else {
        a
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tilted_box(extents: (f64, f64, f64), tilt: &Vector) -> Vec<Point> {
        let rotation = rotation_from_degrees(tilt);
        let mut points = Vec::new();
        let steps = 6;
        for i in 0..=steps {
            for j in 0..=steps {
                for k in 0..=steps {
                    let point = Point::new(
                        extents.0 * i as f64 / steps as f64,
                        extents.1 * j as f64 / steps as f64,
                        extents.2 * k as f64 / steps as f64,
                    );
                    points.push(point.rotate(&rotation));
                }
            }
        }
        points
    }

    #[test]
    fn centroid_of_cube_corners() {
        let points = [
            Point::new(0., 0., 0.),
            Point::new(1., 0., 0.),
            Point::new(0., 1., 0.),
            Point::new(0., 0., 1.),
            Point::new(1., 1., 0.),
            Point::new(1., 0., 1.),
            Point::new(0., 1., 1.),
            Point::new(1., 1., 1.),
        ];
        assert_eq!(Point::new(0.5, 0.5, 0.5), centroid(&points));
    }

    #[test]
    fn normal_of_flat_plane() {
        let mut points = Vec::new();
        for i in 0..5 {
            for j in 0..5 {
                points.push(Point::new(i as f64, j as f64, 0.));
            }
        }
        let normal = normal(&points).unwrap();
        assert_relative_eq!(normal.z.abs(), 1., epsilon = 1e-9);
        assert_relative_eq!(normal.x, 0., epsilon = 1e-9);
    }

    #[test]
    fn normal_needs_three_points() {
        assert!(normal(&[Point::default(), Point::new(1., 0., 0.)]).is_none());
    }

    #[test]
    fn plane_through_centroid() {
        let n = Vector::new(0., 0., 1.);
        let c = Point::new(1., 2., 3.);
        let coefficients = plane(&n, &c);
        assert_eq!([0., 0., 1., -3.], coefficients);
        // the centroid satisfies the plane equation
        let value =
            coefficients[0] * c.x + coefficients[1] * c.y + coefficients[2] * c.z + coefficients[3];
        assert_relative_eq!(value, 0.);
    }

    #[test]
    fn rotation_preserves_length() {
        let point = Point::new(3., -4., 12.);
        for angles in [
            Vector::new(30., 0., 0.),
            Vector::new(0., 45., 0.),
            Vector::new(10., 20., 30.),
            Vector::new(-15., 170., 99.),
        ] {
            let rotated = point.rotate(&rotation_from_degrees(&angles));
            assert_relative_eq!(rotated.norm(), point.norm(), max_relative = 1e-12);
        }
    }

    #[test]
    fn minimum_bbox_of_axis_aligned_box() {
        let points = tilted_box((10., 20., 30.), &Vector::default());
        let (bbox, angles) = minimum_bbox(&points);
        assert_relative_eq!(bbox.volume(), 6000., max_relative = 1e-9);
        assert_eq!(Vector::default(), angles);
    }

    #[test]
    fn minimum_bbox_recovers_tilt() {
        let points = tilted_box((10., 20., 30.), &Vector::new(0., 0., 25.));
        let (bbox, _) = minimum_bbox(&points);
        assert_relative_eq!(bbox.volume(), 6000., max_relative = 0.05);
    }

    #[test]
    fn minimum_bbox_is_monotone_under_insertion() {
        let mut points = tilted_box((10., 10., 10.), &Vector::new(5., 10., 15.));
        let (before, _) = minimum_bbox(&points);
        points.push(Point::new(100., 100., 100.));
        let (after, _) = minimum_bbox(&points);
        assert!(after.volume() >= before.volume());
    }

    #[test]
    fn sweep_is_deterministic() {
        let points = tilted_box((10., 20., 30.), &Vector::new(12., 7., 33.));
        let first = minimum_bbox(&points);
        let second = minimum_bbox(&points);
        assert_eq!(first, second);
    }
}
