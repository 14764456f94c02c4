//! End-to-end scenarios: scan windows, characterization, persistence, and
//! anomaly detection against synthetic geometry.

use lidar_anomaly::anomaly;
use lidar_anomaly::scanner::{Flow, ScanCode, Scanner};
use lidar_anomaly::{dbscan, CharacterizedObject, Characterizer, Error, LidarPoint, Point, Registry, Timestamp};
use std::io::Write;

/// A lattice over the six faces of an axis-aligned box, n points per axis
/// per face.
fn box_surface(extents: (f64, f64, f64), n: usize) -> Vec<Point> {
    let (ex, ey, ez) = extents;
    let mut points = Vec::new();
    let t = |k: usize, e: f64| e * k as f64 / (n - 1) as f64;
    for i in 0..n {
        for j in 0..n {
            points.push(Point::new(0., t(i, ey), t(j, ez)));
            points.push(Point::new(ex, t(i, ey), t(j, ez)));
            points.push(Point::new(t(i, ex), 0., t(j, ez)));
            points.push(Point::new(t(i, ex), ey, t(j, ez)));
            points.push(Point::new(t(i, ex), t(j, ey), 0.));
            points.push(Point::new(t(i, ex), t(j, ey), ez));
        }
    }
    points
}

fn feed_object(characterizer: &mut Characterizer, points: &[Point]) {
    characterizer.begin_object();
    for (i, point) in points.iter().enumerate() {
        let lidar_point =
            LidarPoint::new(Timestamp::from_nanos(i as u64), 255, point.x, point.y, point.z);
        assert_eq!(Flow::Continue, characterizer.feed(&lidar_point));
    }
    characterizer.flush();
}

fn characterize(points: &[Point]) -> CharacterizedObject {
    let mut characterizer = Characterizer::new();
    feed_object(&mut characterizer, points);
    CharacterizedObject::characterize(characterizer.take_object()).unwrap()
}

#[test]
fn cube_characterization() {
    // 2400 surface points plus one far outlier
    let mut points = box_surface((100., 100., 100.), 20);
    assert_eq!(2400, points.len());
    points.push(Point::new(10_000., 10_000., 10_000.));

    let clusters = dbscan::cluster(&points, 20., 20);
    let dominant = clusters.iter().map(Vec::len).max().unwrap();
    assert_eq!(2400, dominant, "the outlier stays out of the cube cluster");

    let object = characterize(&points);
    assert!(object.faces().len() >= 6, "got {} faces", object.faces().len());
    let extents = object.bbox().extents();
    for extent in [extents.x, extents.y, extents.z] {
        assert!((extent - 100.).abs() <= 1., "extent {extent} is not ~100mm");
    }
}

#[test]
fn empty_scan_defines_nothing() {
    let mut characterizer = Characterizer::new();
    characterizer.begin_object();
    characterizer.flush();
    let registry = Registry::new();
    let result = CharacterizedObject::characterize(characterizer.take_object());
    assert!(matches!(result, Err(Error::InsufficientPoints)));
    assert_eq!(0, registry.objects().count());
}

#[test]
fn background_rejection_by_distance() {
    let mut characterizer = Characterizer::new();
    characterizer.set_back_frame(1);
    characterizer.begin_background();
    // 1000 points on the plane x = 0
    let mut fed = 0;
    for j in 0..32 {
        for k in 0..32 {
            if fed == 1000 {
                break;
            }
            let point = LidarPoint::new(
                Timestamp::from_nanos(fed),
                255,
                0.,
                f64::from(j),
                f64::from(k),
            );
            characterizer.feed(&point);
            fed += 1;
        }
    }
    characterizer.flush();
    assert!(characterizer.has_background());

    let probe = LidarPoint::new(Timestamp::from_nanos(0), 255, 1., 0., 0.);

    characterizer.set_back_distance(0.5);
    characterizer.begin_object();
    characterizer.feed(&probe);
    assert_eq!(1, characterizer.object_points().len());

    characterizer.set_back_distance(2.0);
    characterizer.begin_object();
    characterizer.feed(&probe);
    assert_eq!(0, characterizer.object_points().len());
}

#[test]
fn window_cutoff_pauses_the_scanner() {
    // four rows: 0, 0.5ms, just inside 1ms, and one at the window edge
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "{}", lidar_anomaly::LIVOX_CSV_HEADER).unwrap();
    for (timestamp, x) in [(0u64, 1.), (500_000, 2.), (999_999, 3.), (1_000_000, 4.)] {
        writeln!(
            file,
            "5,1,1,0,0x00000000,0,2,{timestamp},0,0,0,200,0,{x},0,0,0,0,0"
        )
        .unwrap();
    }

    let mut scanner = Scanner::from_path(file.path()).unwrap();
    scanner.init().unwrap();
    let mut characterizer = Characterizer::new();
    characterizer.set_obj_frame(1);
    characterizer.begin_object();
    let code = scanner
        .scan(&mut |point| characterizer.feed(&point))
        .unwrap();
    assert_eq!(ScanCode::Paused, code);
    assert_eq!(3, characterizer.object_points().len());
    // the machine is idle again: further points are dropped
    let late = LidarPoint::new(Timestamp::from_nanos(2_000_000), 255, 9., 9., 9.);
    assert_eq!(Flow::Continue, characterizer.feed(&late));
    assert_eq!(3, characterizer.object_points().len());
    scanner.stop();
}

#[test]
fn saved_objects_load_identically() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("cube.bin");
    let object = characterize(&box_surface((100., 100., 100.), 14));

    let mut registry = Registry::new();
    registry.add_object(Some("cube".to_string()), object).unwrap();
    registry.save_object("cube", &path).unwrap();
    registry.load_object("cube-copy", &path).unwrap();

    let original = registry.object("cube").unwrap();
    let loaded = registry.object("cube-copy").unwrap();
    assert_eq!(original, loaded);
    assert_eq!(original.bbox(), loaded.bbox());
    assert_eq!(original.faces().len(), loaded.faces().len());
    for (a, b) in original.faces().iter().zip(loaded.faces()) {
        assert_eq!(a.bbox(), b.bbox());
        assert_eq!(a.normal(), b.normal());
        assert_eq!(a.rotation_degrees(), b.rotation_degrees());
    }
}

/// A lattice over the six faces of an axis-aligned box with a fixed step on
/// every axis, so differently-sized boxes share their surface density.
fn box_lattice(extents: (f64, f64, f64), step: f64) -> Vec<Point> {
    let (ex, ey, ez) = extents;
    let count = |e: f64| (e / step) as usize + 1;
    let (nx, ny, nz) = (count(ex), count(ey), count(ez));
    let at = |k: usize| k as f64 * step;
    let mut points = Vec::new();
    for j in 0..ny {
        for k in 0..nz {
            points.push(Point::new(0., at(j), at(k)));
            points.push(Point::new(ex, at(j), at(k)));
        }
    }
    for i in 0..nx {
        for k in 0..nz {
            points.push(Point::new(at(i), 0., at(k)));
            points.push(Point::new(at(i), ey, at(k)));
        }
    }
    for i in 0..nx {
        for j in 0..ny {
            points.push(Point::new(at(i), at(j), 0.));
            points.push(Point::new(at(i), at(j), ez));
        }
    }
    points
}

#[test]
fn stretched_cube_is_flagged() {
    // a 100mm reference cube against an object stretched to 140mm in z: the
    // 40mm deviation sits right at the dimension tolerance and must be
    // reported as an anomaly
    let model = characterize(&box_lattice((100., 100., 100.), 5.));
    let object = characterize(&box_lattice((100., 100., 140.), 5.));

    let report = anomaly::compare(&object, &model);
    assert!(!report.similar);
    assert!(
        (report.general.deltas.z + 40.).abs() <= 1.,
        "expected ~-40mm z delta, got {}",
        report.general.deltas.z
    );
    assert!((report.general.deltas.x).abs() <= 1.);
    assert!((report.general.deltas.y).abs() <= 1.);
    assert_eq!(6, report.face_comparisons.len());
    let dissimilar = report
        .face_comparisons
        .iter()
        .filter(|c| !c.similar)
        .count();
    assert!(dissimilar >= 2, "got {dissimilar} dissimilar pairs");
}
