//! A bounded spatial index over a point arena.
//!
//! The octree owns its points and recursively subdivides a cube over them.
//! Leaves hold at most [MAX_POINTS](crate::config::MAX_POINTS) arena indices;
//! inserting into a full leaf creates eight half-radius octants and
//! redistributes. Neighbor queries take a [Kernel] and return arena indices,
//! to be resolved against [points](Octree::points):
//!
//! ```
//! use lidar_anomaly::{Kernel, Octree, Point};
//! let octree = Octree::build(vec![
//!     Point::new(0., 0., 0.),
//!     Point::new(10., 10., 10.),
//! ]);
//! let near_origin = octree.search(&Kernel::sphere(Point::default(), 1.));
//! assert_eq!(vec![0], near_origin);
//! ```
//!
//! Queries are read-only and safe to run from many threads at once; building
//! and inserting are not, and must be serialized by the owner.

use crate::{config, Bounds, Kernel, Point};

/// A cubic octree holding a point arena.
#[derive(Clone, Debug)]
pub struct Octree {
    arena: Vec<Point>,
    root: Node,
}

#[derive(Clone, Debug)]
struct Node {
    center: Point,
    half_edge: f64,
    points: Vec<usize>,
    children: Option<Box<[Node; 8]>>,
}

impl Octree {
    /// Builds an octree over a point cloud.
    ///
    /// The root covers the minimum bounding cube of the cloud (cubic, not
    /// tight). The cloud becomes the octree's arena; query results index
    /// into it.
    pub fn build(points: Vec<Point>) -> Octree {
        let bounds = Bounds::of(&points);
        let (center, half_edge) = if points.is_empty() {
            (Point::default(), 0.)
        } else {
            let extents = bounds.extents();
            let half = (extents.x.max(extents.y).max(extents.z)) / 2.;
            (bounds.center(), half)
        };
        let mut root = Node::new(center, half_edge);
        for index in 0..points.len() {
            root.insert(&points, index);
        }
        Octree {
            arena: points,
            root,
        }
    }

    /// Inserts a point, returning its arena index.
    ///
    /// The point should lie within the root cube: the tree does not regrow,
    /// and queries may miss outliers filed under the nearest octant.
    pub fn insert(&mut self, point: Point) -> usize {
        let index = self.arena.len();
        self.arena.push(point);
        self.root.insert(&self.arena, index);
        index
    }

    /// Returns the arena indices of all points inside the kernel.
    pub fn search(&self, kernel: &Kernel) -> Vec<usize> {
        let mut found = Vec::new();
        self.root.neighbors(&self.arena, kernel, &mut found);
        found
    }

    /// Returns the point arena.
    pub fn points(&self) -> &[Point] {
        &self.arena
    }

    /// Returns the point at an arena index.
    pub fn get(&self, index: usize) -> Point {
        self.arena[index]
    }

    /// Returns the number of indexed points.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Returns true if the octree holds no points.
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Returns the axis-aligned bounds of the root cube.
    pub fn bounds(&self) -> Bounds {
        let offset = Point::new(self.root.half_edge, self.root.half_edge, self.root.half_edge);
        Bounds {
            min: self.root.center - offset,
            max: self.root.center + offset,
        }
    }
}

impl Node {
    fn new(center: Point, half_edge: f64) -> Node {
        Node {
            center,
            half_edge,
            points: Vec::new(),
            children: None,
        }
    }

    fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    fn insert(&mut self, arena: &[Point], index: usize) {
        if let Some(children) = self.children.as_mut() {
            let octant = child_index(&arena[index], &self.center);
            children[octant].insert(arena, index);
        } else if self.points.len() < config::MAX_POINTS {
            self.points.push(index);
        } else {
            self.subdivide(arena);
            self.insert(arena, index);
        }
    }

    /// Splits a full leaf into eight octants and redistributes its points.
    fn subdivide(&mut self, arena: &[Point]) {
        let offset = self.half_edge / 2.;
        let children = std::array::from_fn(|octant| {
            let center = Point {
                x: self.center.x + if octant & 1 != 0 { offset } else { -offset },
                y: self.center.y + if octant & 2 != 0 { offset } else { -offset },
                z: self.center.z + if octant & 4 != 0 { offset } else { -offset },
            };
            Node::new(center, offset)
        });
        self.children = Some(Box::new(children));
        let points = std::mem::take(&mut self.points);
        for index in points {
            self.insert(arena, index);
        }
    }

    fn neighbors(&self, arena: &[Point], kernel: &Kernel, found: &mut Vec<usize>) {
        if self.is_leaf() {
            for &index in &self.points {
                if kernel.contains(&arena[index]) {
                    found.push(index);
                }
            }
        } else if let Some(children) = self.children.as_ref() {
            for child in children.iter() {
                if kernel.overlaps(&child.center, child.half_edge) {
                    child.neighbors(arena, kernel, found);
                }
            }
        }
    }
}

/// Octant index from the sign of (x − cx, y − cy, z − cz), one bit per axis.
fn child_index(point: &Point, center: &Point) -> usize {
    let mut octant = 0;
    if point.x >= center.x {
        octant |= 1;
    }
    if point.y >= center.y {
        octant |= 2;
    }
    if point.z >= center.z {
        octant |= 4;
    }
    octant
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lattice(n: usize, step: f64) -> Vec<Point> {
        let mut points = Vec::new();
        for i in 0..n {
            for j in 0..n {
                for k in 0..n {
                    points.push(Point::new(i as f64 * step, j as f64 * step, k as f64 * step));
                }
            }
        }
        points
    }

    fn check_invariants(node: &Node) {
        if node.is_leaf() {
            assert!(node.points.len() <= config::MAX_POINTS);
        } else {
            assert!(node.points.is_empty(), "internal node holds points");
            for child in node.children.as_ref().unwrap().iter() {
                check_invariants(child);
            }
        }
    }

    #[test]
    fn empty_build() {
        let octree = Octree::build(Vec::new());
        assert!(octree.is_empty());
        assert!(octree
            .search(&Kernel::sphere(Point::default(), 100.))
            .is_empty());
    }

    #[test]
    fn every_point_is_findable_at_zero_radius() {
        let points = lattice(8, 1.);
        let octree = Octree::build(points.clone());
        for point in &points {
            let hits = octree.search(&Kernel::sphere(*point, 0.));
            assert!(hits.iter().any(|&i| octree.get(i) == *point));
        }
    }

    #[test]
    fn leaves_stay_bounded() {
        let octree = Octree::build(lattice(12, 1.));
        check_invariants(&octree.root);
    }

    #[test]
    fn inserts_keep_the_invariant() {
        let mut octree = Octree::build(lattice(4, 1.));
        for i in 0..500 {
            octree.insert(Point::new(
                (i % 4) as f64 + 0.1,
                ((i / 4) % 4) as f64 + 0.2,
                ((i / 16) % 4) as f64 + 0.3,
            ));
        }
        check_invariants(&octree.root);
        assert_eq!(4 * 4 * 4 + 500, octree.len());
    }

    #[test]
    fn sphere_search_respects_radius() {
        let octree = Octree::build(lattice(10, 1.));
        let hits = octree.search(&Kernel::sphere(Point::new(5., 5., 5.), 1.));
        // center, six axis neighbors
        assert_eq!(7, hits.len());
    }

    #[test]
    fn circle_search_spans_the_x_axis() {
        let octree = Octree::build(lattice(10, 1.));
        let hits = octree.search(&Kernel::circle(Point::new(0., 5., 5.), 0.5));
        // one (y, z) column, all x values
        assert_eq!(10, hits.len());
    }

    #[test]
    fn root_cube_is_cubic() {
        let octree = Octree::build(vec![Point::new(0., 0., 0.), Point::new(10., 2., 4.)]);
        let bounds = octree.bounds();
        let extents = bounds.extents();
        assert_eq!(extents.x, extents.y);
        assert_eq!(extents.y, extents.z);
        assert_eq!(10., extents.x);
    }
}
