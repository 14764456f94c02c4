//! Characterized objects: faces plus an oriented bounding box.
//!
//! [characterize](CharacterizedObject::characterize) runs the full pipeline
//! over a raw object buffer: isolate the dominant spatial cluster, decompose
//! it into faces by surface orientation, then fit minimum oriented boxes to
//! each face and to the whole.
//!
//! Objects serialize to a little-endian binary record (the box extents, the
//! face count, then each face's points) and to Livox-Viewer CSV, one
//! reflectivity shade per face.

use crate::{config, dbscan, geometry, lidar_point, BBox, Error, Face, LidarPoint, Point, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::{debug, info};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// An object characterized as planar faces inside an oriented box.
#[derive(Clone, Debug, PartialEq)]
pub struct CharacterizedObject {
    faces: Vec<Face>,
    bbox: BBox,
}

impl CharacterizedObject {
    /// Characterizes a buffer of scanned points.
    ///
    /// Fails with [Error::InsufficientPoints] when no cluster or no face
    /// forms; nothing is partially built in that case.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use lidar_anomaly::{CharacterizedObject, Point};
    /// # let points: Vec<Point> = vec![];
    /// let object = CharacterizedObject::characterize(points).unwrap();
    /// println!("{} faces", object.faces().len());
    /// ```
    pub fn characterize(points: Vec<Point>) -> Result<CharacterizedObject> {
        let clusters = dbscan::cluster(
            &points,
            config::CLUSTER_POINT_PROXIMITY,
            config::MIN_CLUSTER_POINTS,
        );
        // largest cluster wins, first on ties
        let mut dominant: Option<&Vec<usize>> = None;
        for cluster in &clusters {
            if dominant.is_none_or(|best| cluster.len() > best.len()) {
                dominant = Some(cluster);
            }
        }
        let dominant = dominant.ok_or(Error::InsufficientPoints)?;
        debug!(
            "dominant cluster holds {} of {} points ({} clusters)",
            dominant.len(),
            points.len(),
            clusters.len()
        );

        let cluster_points: Vec<Point> = dominant.iter().map(|&i| points[i]).collect();
        let face_clusters = dbscan::cluster_by_normal(
            &cluster_points,
            config::FACE_POINT_PROXIMITY,
            config::MIN_FACE_POINTS,
            config::MAX_NORMAL_VECT_ANGLE_OC,
        );
        if face_clusters.is_empty() {
            return Err(Error::InsufficientPoints);
        }

        let faces: Vec<Face> = face_clusters
            .into_iter()
            .map(|indices| Face::new(indices.into_iter().map(|i| cluster_points[i]).collect()))
            .collect();
        info!("characterized object with {} faces", faces.len());

        Ok(CharacterizedObject::assemble(faces))
    }

    /// Builds an object from complete faces, fitting the object-level box
    /// over the union of their points.
    pub(crate) fn assemble(faces: Vec<Face>) -> CharacterizedObject {
        let union: Vec<Point> = faces.iter().flat_map(|f| f.points().iter().copied()).collect();
        let (bbox, _) = geometry::minimum_bbox(&union);
        CharacterizedObject { faces, bbox }
    }

    /// Rebuilds an object from a stored box and complete faces.
    pub(crate) fn restore(bbox: BBox, faces: Vec<Face>) -> CharacterizedObject {
        CharacterizedObject { faces, bbox }
    }

    /// Returns the faces of this object.
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Returns the minimum oriented bounding box of the whole object.
    pub fn bbox(&self) -> &BBox {
        &self.bbox
    }

    /// Returns the total number of points across all faces.
    pub fn total_points(&self) -> usize {
        self.faces.iter().map(|f| f.points().len()).sum()
    }

    /// Writes the binary record of this object.
    pub fn write_to<W: Write>(&self, write: &mut W) -> Result<()> {
        write_bbox(write, &self.bbox)?;
        write.write_u64::<LittleEndian>(self.faces.len() as u64)?;
        for face in &self.faces {
            write_face(write, face)?;
        }
        Ok(())
    }

    /// Reads an object from its binary record.
    ///
    /// Stored faces carry only their points; boxes, rotations, and normals
    /// are refitted on load. The search is deterministic, so a loaded object
    /// describes identically to the one saved.
    pub fn read_from<R: Read>(read: &mut R) -> Result<CharacterizedObject> {
        let bbox = read_bbox(read)?;
        let nfaces = read.read_u64::<LittleEndian>()?;
        let mut faces = Vec::with_capacity(nfaces as usize);
        for _ in 0..nfaces {
            faces.push(Face::new(read_face_points(read)?));
        }
        Ok(CharacterizedObject { faces, bbox })
    }

    /// Saves this object to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut write = BufWriter::new(File::create(path)?);
        self.write_to(&mut write)
    }

    /// Loads an object from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<CharacterizedObject> {
        let mut read = BufReader::new(File::open(path)?);
        CharacterizedObject::read_from(&mut read)
    }

    /// Writes this object as Livox-Viewer CSV, one reflectivity shade per
    /// face so the viewer colors them apart.
    pub fn write_livox_csv<W: Write>(&self, write: &mut W) -> Result<()> {
        writeln!(write, "{}", lidar_point::LIVOX_CSV_HEADER)?;
        for (index, face) in self.faces.iter().enumerate() {
            let shade = (255 / self.faces.len().max(1) * index) as u8;
            for point in face.points() {
                writeln!(write, "{}", LidarPoint::at(*point, shade).livox_csv_row())?;
            }
        }
        Ok(())
    }

    /// Saves this object as Livox-Viewer CSV.
    pub fn save_livox_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut write = BufWriter::new(File::create(path)?);
        self.write_livox_csv(&mut write)
    }
}

pub(crate) fn write_bbox<W: Write>(write: &mut W, bbox: &BBox) -> Result<()> {
    let extents = bbox.extents();
    write.write_f64::<LittleEndian>(extents.x)?;
    write.write_f64::<LittleEndian>(extents.y)?;
    write.write_f64::<LittleEndian>(extents.z)?;
    Ok(())
}

pub(crate) fn read_bbox<R: Read>(read: &mut R) -> Result<BBox> {
    let x = read.read_f64::<LittleEndian>()?;
    let y = read.read_f64::<LittleEndian>()?;
    let z = read.read_f64::<LittleEndian>()?;
    Ok(BBox::from_extents(Point::new(x, y, z)))
}

pub(crate) fn write_face<W: Write>(write: &mut W, face: &Face) -> Result<()> {
    write.write_u64::<LittleEndian>(face.points().len() as u64)?;
    for point in face.points() {
        write.write_f64::<LittleEndian>(point.x)?;
        write.write_f64::<LittleEndian>(point.y)?;
        write.write_f64::<LittleEndian>(point.z)?;
    }
    Ok(())
}

pub(crate) fn read_face_points<R: Read>(read: &mut R) -> Result<Vec<Point>> {
    let npoints = read.read_u64::<LittleEndian>()?;
    let mut points = Vec::with_capacity(npoints as usize);
    for _ in 0..npoints {
        let x = read.read_f64::<LittleEndian>()?;
        let y = read.read_f64::<LittleEndian>()?;
        let z = read.read_f64::<LittleEndian>()?;
        points.push(Point::new(x, y, z));
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// The six lattice faces of an axis-aligned cube, n points per axis.
    fn cube_surface(edge: f64, n: usize) -> Vec<Point> {
        let mut points = Vec::new();
        let step = edge / (n - 1) as f64;
        for i in 0..n {
            for j in 0..n {
                let (a, b) = (i as f64 * step, j as f64 * step);
                points.push(Point::new(0., a, b));
                points.push(Point::new(edge, a, b));
                points.push(Point::new(a, 0., b));
                points.push(Point::new(a, edge, b));
                points.push(Point::new(a, b, 0.));
                points.push(Point::new(a, b, edge));
            }
        }
        points
    }

    #[test]
    fn empty_buffer_is_insufficient() {
        assert!(matches!(
            CharacterizedObject::characterize(Vec::new()),
            Err(Error::InsufficientPoints)
        ));
    }

    #[test]
    fn sparse_points_are_insufficient() {
        let points = (0..30)
            .map(|i| Point::new(i as f64 * 1000., 0., 0.))
            .collect();
        assert!(matches!(
            CharacterizedObject::characterize(points),
            Err(Error::InsufficientPoints)
        ));
    }

    #[test]
    fn binary_round_trip() {
        let object = CharacterizedObject::characterize(cube_surface(100., 14)).unwrap();
        let mut buffer = Vec::new();
        object.write_to(&mut buffer).unwrap();
        let loaded = CharacterizedObject::read_from(&mut Cursor::new(buffer)).unwrap();
        assert_eq!(object, loaded);
    }

    #[test]
    fn livox_csv_has_header_and_all_points() {
        let object = CharacterizedObject::characterize(cube_surface(100., 14)).unwrap();
        let mut buffer = Vec::new();
        object.write_livox_csv(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lidar_point::LIVOX_CSV_HEADER, lines[0]);
        assert_eq!(object.total_points(), lines.len() - 1);
    }
}
