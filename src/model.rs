//! Reference models.
//!
//! A [Model] is structurally a [CharacterizedObject]; the distinction is
//! intent, a model being the stored reference an observed object is compared
//! against. Model files carry a name header and tag each face slot with its
//! face id, ahead of the same face records objects use.

use crate::object::{read_bbox, read_face_points, write_bbox, write_face};
use crate::{CharacterizedObject, Face, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// A characterized object held as a reference.
pub type Model = CharacterizedObject;

/// Writes a model record: the name, then the object payload with per-slot
/// face ids.
pub fn write_model<W: Write>(name: &str, model: &Model, write: &mut W) -> Result<()> {
    write.write_u64::<LittleEndian>(name.len() as u64)?;
    write.write_all(name.as_bytes())?;
    write_bbox(write, model.bbox())?;
    write.write_u64::<LittleEndian>(model.faces().len() as u64)?;
    for (id, face) in model.faces().iter().enumerate() {
        write.write_u64::<LittleEndian>(id as u64)?;
        write_face(write, face)?;
    }
    Ok(())
}

/// Reads a model record, returning the stored name and the model.
pub fn read_model<R: Read>(read: &mut R) -> Result<(String, Model)> {
    let name_len = read.read_u64::<LittleEndian>()?;
    let mut name_bytes = vec![0u8; name_len as usize];
    read.read_exact(&mut name_bytes)?;
    let name = String::from_utf8(name_bytes).map_err(|e| {
        io::Error::new(io::ErrorKind::InvalidData, format!("model name: {e}"))
    })?;
    let bbox = read_bbox(read)?;
    let nfaces = read.read_u64::<LittleEndian>()?;
    let mut faces = Vec::with_capacity(nfaces as usize);
    for _ in 0..nfaces {
        let _face_id = read.read_u64::<LittleEndian>()?;
        faces.push(Face::new(read_face_points(read)?));
    }
    Ok((name, Model::restore(bbox, faces)))
}

/// Saves a model to a file.
pub fn save_model<P: AsRef<Path>>(name: &str, model: &Model, path: P) -> Result<()> {
    let mut write = BufWriter::new(File::create(path)?);
    write_model(name, model, &mut write)
}

/// Loads a model from a file.
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<(String, Model)> {
    let mut read = BufReader::new(File::open(path)?);
    read_model(&mut read)
}
