//! Compares a characterized object against a reference model.
//!
//! The comparison is geometric: overall bounding-box extents, face counts,
//! and a greedy pairing of faces by closest bounding-box volume. The pairing
//! is a fast, stable heuristic, not a globally optimal assignment; ties
//! prefer the earlier model face, then the earlier object face.
//!
//! ```no_run
//! use lidar_anomaly::anomaly;
//! # let object = unimplemented!();
//! # let model = unimplemented!();
//! let report = anomaly::compare(&object, &model);
//! if !report.similar {
//!     println!("{} face(s) missing", report.delta_faces);
//! }
//! ```

use crate::{config, CharacterizedObject, Model, Vector};
use log::debug;
use std::f64::consts::PI;

/// The outcome of one extent comparison.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Comparison {
    /// True when every extent delta is strictly under the dimension
    /// tolerance.
    pub similar: bool,

    /// Model extents minus object extents, componentwise and signed.
    pub deltas: Vector,
}

/// The comparison of one matched face pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceComparison {
    /// True when the pair agrees in extents and orientation.
    pub similar: bool,

    /// Index of the matched model face.
    pub model_face: usize,

    /// Index of the matched object face.
    pub object_face: usize,

    /// Model face extents minus object face extents.
    pub deltas: Vector,

    /// Acute angle in radians between the face normals.
    pub normal_angle: f64,
}

/// A structured difference report between an object and a model.
#[derive(Clone, Debug, PartialEq)]
pub struct AnomalyReport {
    /// The final verdict: similar overall, on every matched face, and the
    /// object actually has faces.
    pub similar: bool,

    /// The whole-object extent comparison.
    pub general: Comparison,

    /// Model face count minus object face count.
    pub delta_faces: i64,

    /// The matched face pairs, in match order.
    pub face_comparisons: Vec<FaceComparison>,

    /// Model faces left without a partner.
    pub unmatched_model_faces: Vec<usize>,

    /// Object faces left without a partner.
    pub unmatched_object_faces: Vec<usize>,
}

/// Compares an object to a model, yielding an [AnomalyReport].
pub fn compare(object: &CharacterizedObject, model: &Model) -> AnomalyReport {
    let general_deltas = model.bbox().extents() - object.bbox().extents();
    let general = Comparison {
        similar: within_tolerance(&general_deltas),
        deltas: general_deltas,
    };

    let model_faces = model.faces();
    let object_faces = object.faces();
    let delta_faces = model_faces.len() as i64 - object_faces.len() as i64;

    // volume-delta matrix, model faces on rows
    let volumes: Vec<Vec<f64>> = model_faces
        .iter()
        .map(|m| {
            object_faces
                .iter()
                .map(|o| (m.bbox().volume() - o.bbox().volume()).abs())
                .collect()
        })
        .collect();

    let rounds = model_faces.len().min(object_faces.len());
    let mut model_used = vec![false; model_faces.len()];
    let mut object_used = vec![false; object_faces.len()];
    let mut face_comparisons = Vec::with_capacity(rounds);

    for _ in 0..rounds {
        let mut best: Option<(usize, usize)> = None;
        for (i, row) in volumes.iter().enumerate() {
            if model_used[i] {
                continue;
            }
            for (j, &delta) in row.iter().enumerate() {
                if object_used[j] {
                    continue;
                }
                // strict comparison keeps the earliest pair on ties
                if best.is_none_or(|(bi, bj)| delta < volumes[bi][bj]) {
                    best = Some((i, j));
                }
            }
        }
        let Some((model_face, object_face)) = best else {
            break;
        };
        model_used[model_face] = true;
        object_used[object_face] = true;

        let deltas =
            model_faces[model_face].bbox().extents() - object_faces[object_face].bbox().extents();
        let normal_angle = acute_angle(
            model_faces[model_face].normal(),
            object_faces[object_face].normal(),
        );
        face_comparisons.push(FaceComparison {
            similar: within_tolerance(&deltas) && normal_angle <= config::MAX_NORMAL_VECT_ANGLE_AD,
            model_face,
            object_face,
            deltas,
            normal_angle,
        });
    }

    let locally_similar = face_comparisons.iter().all(|c| c.similar);
    let similar = general.similar && locally_similar && !object_faces.is_empty();
    debug!(
        "compared object ({} faces) against model ({} faces): {}",
        object_faces.len(),
        model_faces.len(),
        if similar { "similar" } else { "different" }
    );

    AnomalyReport {
        similar,
        general,
        delta_faces,
        face_comparisons,
        unmatched_model_faces: unused(&model_used),
        unmatched_object_faces: unused(&object_used),
    }
}

/// A delta as large as the tolerance already counts as an anomaly: a cube
/// stretched by exactly the tolerance must be flagged, not waved through.
fn within_tolerance(deltas: &Vector) -> bool {
    deltas.x.abs() < config::MAX_DIMENSION_DELTA
        && deltas.y.abs() < config::MAX_DIMENSION_DELTA
        && deltas.z.abs() < config::MAX_DIMENSION_DELTA
}

/// Angle between two face orientations, sign-insensitive.
fn acute_angle(a: &Vector, b: &Vector) -> f64 {
    let angle = a.angle_to(b);
    angle.min(PI - angle)
}

fn unused(used: &[bool]) -> Vec<usize> {
    used.iter()
        .enumerate()
        .filter(|(_, &u)| !u)
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Face, Point};

    /// A rectangular plate in the YZ plane at a given x.
    fn plate(x: f64, width: f64, height: f64) -> Face {
        let mut points = Vec::new();
        for j in 0..12 {
            for k in 0..12 {
                points.push(Point::new(
                    x,
                    width * j as f64 / 11.,
                    height * k as f64 / 11.,
                ));
            }
        }
        Face::new(points)
    }

    fn boxy(widths: (f64, f64)) -> CharacterizedObject {
        CharacterizedObject::assemble(vec![
            plate(0., widths.0, 100.),
            plate(100., widths.1, 100.),
        ])
    }

    #[test]
    fn identity_is_similar() {
        let object = boxy((100., 100.));
        let report = compare(&object, &object);
        assert!(report.similar);
        assert_eq!(0, report.delta_faces);
        assert_eq!(Vector::default(), report.general.deltas);
        assert_eq!(2, report.face_comparisons.len());
        for comparison in &report.face_comparisons {
            assert!(comparison.similar);
            assert_eq!(Vector::default(), comparison.deltas);
            assert!(comparison.normal_angle < 1e-9);
        }
        assert!(report.unmatched_model_faces.is_empty());
        assert!(report.unmatched_object_faces.is_empty());
    }

    #[test]
    fn general_deltas_flip_sign_when_swapped() {
        let small = boxy((100., 100.));
        let large = boxy((160., 160.));
        let forward = compare(&small, &large);
        let backward = compare(&large, &small);
        assert_eq!(forward.general.deltas, -backward.general.deltas);
        assert!(!forward.similar);
        assert!(!backward.similar);
    }

    #[test]
    fn missing_face_shows_in_delta() {
        let object = CharacterizedObject::assemble(vec![plate(0., 100., 100.)]);
        let model = boxy((100., 100.));
        let report = compare(&object, &model);
        assert_eq!(1, report.delta_faces);
        assert_eq!(1, report.face_comparisons.len());
        assert_eq!(1, report.unmatched_model_faces.len());
        assert!(report.unmatched_object_faces.is_empty());
    }

    #[test]
    fn empty_object_is_never_similar() {
        let object = CharacterizedObject::assemble(vec![]);
        let model = CharacterizedObject::assemble(vec![]);
        let report = compare(&object, &model);
        assert!(!report.similar, "an object without faces cannot match");
        assert!(report.general.similar, "but its box deltas are zero");
    }

    /// A plate with a checkerboard ripple, so its minimum box has volume.
    fn rippled_plate(x: f64, width: f64, height: f64) -> Face {
        let mut points = Vec::new();
        for j in 0..12 {
            for k in 0..12 {
                points.push(Point::new(
                    x + ((j + k) % 2) as f64,
                    width * j as f64 / 11.,
                    height * k as f64 / 11.,
                ));
            }
        }
        Face::new(points)
    }

    #[test]
    fn matching_pairs_closest_volumes_first() {
        // model: one large and one small face; object: slightly-off copies
        let model = CharacterizedObject::assemble(vec![
            rippled_plate(0., 200., 200.),
            rippled_plate(100., 50., 50.),
        ]);
        let object = CharacterizedObject::assemble(vec![
            rippled_plate(0., 49., 50.),
            rippled_plate(100., 201., 200.),
        ]);
        let report = compare(&object, &model);
        let pairs: Vec<(usize, usize)> = report
            .face_comparisons
            .iter()
            .map(|c| (c.model_face, c.object_face))
            .collect();
        assert!(pairs.contains(&(0, 1)), "large goes with large: {pairs:?}");
        assert!(pairs.contains(&(1, 0)), "small goes with small: {pairs:?}");
    }

    #[test]
    fn stretched_dimension_breaks_similarity() {
        let object = boxy((100., 100.));
        let model = boxy((160., 160.));
        let report = compare(&object, &model);
        assert!(!report.similar);
        let dissimilar = report.face_comparisons.iter().filter(|c| !c.similar).count();
        assert_eq!(2, dissimilar);
    }
}
