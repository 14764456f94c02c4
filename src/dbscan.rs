//! Density-based clustering over point clouds.
//!
//! Two flavors share the usual skeleton of core points, noise, and expansion
//! through reachable ε-neighborhoods:
//!
//! - [cluster] groups by spatial proximity alone and isolates physical
//!   clusters from scanner noise;
//! - [cluster_by_normal] additionally requires neighboring points to share a
//!   surface orientation, which decomposes a cluster into planar faces.
//!
//! Cluster labels (0 unclassified, −1 noise, ids from 1) live in a working
//! vector, not on the points. Points are visited in index order, so for a
//! fixed input the assignment is deterministic.

use crate::{geometry, Kernel, Octree, Point, Vector};

const UNCLASSIFIED: i32 = 0;
const NOISE: i32 = -1;

/// Clusters points by spatial proximity.
///
/// A point is core when at least `min_points` points (itself included) lie
/// within `max_distance`. Returns the clusters as index lists, in discovery
/// order; unclustered points are noise.
///
/// # Examples
///
/// ```
/// use lidar_anomaly::{dbscan, Point};
/// let mut points = vec![];
/// for i in 0..10 {
///     points.push(Point::new(i as f64 * 0.1, 0., 0.));
///     points.push(Point::new(100. + i as f64 * 0.1, 0., 0.));
/// }
/// let clusters = dbscan::cluster(&points, 0.5, 3);
/// assert_eq!(2, clusters.len());
/// ```
pub fn cluster(points: &[Point], max_distance: f64, min_points: usize) -> Vec<Vec<usize>> {
    let index = Octree::build(points.to_vec());
    let mut labels = vec![UNCLASSIFIED; points.len()];
    let mut clusters = Vec::new();
    for seed in 0..points.len() {
        if labels[seed] != UNCLASSIFIED {
            continue;
        }
        let cluster_id = clusters.len() as i32 + 1;
        let neighborhood = |p: usize| index.search(&Kernel::sphere(points[p], max_distance));
        if let Some(members) = expand(seed, cluster_id, min_points, &neighborhood, &mut labels) {
            clusters.push(members);
        }
    }
    clusters
}

/// Clusters points by spatial proximity and shared surface orientation.
///
/// Every point first gets a normal from its spatial ε-neighborhood (none if
/// it has fewer than three neighbors; such points are skipped entirely). A
/// point belongs to a seed's neighborhood when it is within `max_distance`
/// *and* its normal is within `max_normal_angle` radians of the seed's.
pub fn cluster_by_normal(
    points: &[Point],
    max_distance: f64,
    min_points: usize,
    max_normal_angle: f64,
) -> Vec<Vec<usize>> {
    let index = Octree::build(points.to_vec());
    let normals = geometry::normals(points, &index, max_distance);
    let mut labels = vec![UNCLASSIFIED; points.len()];
    let mut clusters = Vec::new();
    for seed in 0..points.len() {
        if labels[seed] != UNCLASSIFIED || normals[seed].is_none() {
            continue;
        }
        let cluster_id = clusters.len() as i32 + 1;
        let neighborhood = |p: usize| {
            let Some(normal) = normals[p] else {
                return Vec::new();
            };
            oriented_neighborhood(
                &index,
                &normals,
                points[p],
                &normal,
                max_distance,
                max_normal_angle,
            )
        };
        if let Some(members) = expand(seed, cluster_id, min_points, &neighborhood, &mut labels) {
            clusters.push(members);
        }
    }
    clusters
}

/// Spatial neighbors of `center` whose normals agree with `normal`.
fn oriented_neighborhood(
    index: &Octree,
    normals: &[Option<Vector>],
    center: Point,
    normal: &Vector,
    max_distance: f64,
    max_normal_angle: f64,
) -> Vec<usize> {
    index
        .search(&Kernel::sphere(center, max_distance))
        .into_iter()
        .filter(|&i| match normals[i] {
            Some(other) => normal.angle_to(&other) <= max_normal_angle,
            None => false,
        })
        .collect()
}

/// Grows one cluster from a seed, relabeling as it goes.
///
/// Returns the member indices, or `None` (and marks the seed as noise) when
/// the seed is not a core point.
fn expand<F>(
    seed: usize,
    cluster_id: i32,
    min_points: usize,
    neighborhood: &F,
    labels: &mut [i32],
) -> Option<Vec<usize>>
where
    F: Fn(usize) -> Vec<usize>,
{
    let seeds = neighborhood(seed);
    if seeds.len() < min_points {
        labels[seed] = NOISE;
        return None;
    }

    let mut members = seeds.clone();
    for &i in &seeds {
        labels[i] = cluster_id;
    }
    let mut frontier: Vec<usize> = seeds.into_iter().filter(|&i| i != seed).collect();
    let mut next = 0;
    while next < frontier.len() {
        let current = frontier[next];
        next += 1;
        let reachable = neighborhood(current);
        if reachable.len() < min_points {
            continue;
        }
        for i in reachable {
            if labels[i] == UNCLASSIFIED || labels[i] == NOISE {
                if labels[i] == UNCLASSIFIED {
                    frontier.push(i);
                }
                labels[i] = cluster_id;
                members.push(i);
            }
        }
    }
    Some(members)
}
