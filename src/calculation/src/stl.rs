//! Binary STL reader.
//!
//! Layout: 80-byte header, little-endian `u32` facet count, then one 50-byte
//! record per facet (normal and three vertices as `f32` triples, two bytes of
//! attribute data). Vertices are not shared between facets.

use std::path::Path;

use crate::error::{Result, SimError};
use crate::hull::HullMesh;
use crate::vector::Vec3;

const HEADER_LEN: usize = 80;
const RECORD_LEN: usize = 50;

/// Raw contents of an STL file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StlMesh {
    pub vertices: Vec<Vec3>,
    pub faces: Vec<[usize; 3]>,
    /// Normals as stored in the file. Not used for buoyancy, which derives
    /// its own from the vertex winding.
    pub stored_normals: Vec<Vec3>,
}

impl StlMesh {
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn into_hull(self) -> Result<HullMesh> {
        HullMesh::new(self.vertices, self.faces)
    }
}

fn read_f32(bytes: &[u8], at: usize) -> f64 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[at..at + 4]);
    f64::from(f32::from_le_bytes(raw))
}

fn read_vec3(bytes: &[u8], at: usize) -> Vec3 {
    Vec3::new(read_f32(bytes, at), read_f32(bytes, at + 4), read_f32(bytes, at + 8))
}

pub fn parse_binary_stl(bytes: &[u8]) -> Result<StlMesh> {
    if bytes.len() < HEADER_LEN + 4 {
        return Err(SimError::mesh(format!(
            "STL data is {} bytes, shorter than the {}-byte header",
            bytes.len(),
            HEADER_LEN + 4
        )));
    }

    let mut count_raw = [0u8; 4];
    count_raw.copy_from_slice(&bytes[HEADER_LEN..HEADER_LEN + 4]);
    let count = u32::from_le_bytes(count_raw) as usize;

    if count == 0 {
        log::warn!("STL file declares zero facets");
        return Ok(StlMesh::default());
    }

    let body = &bytes[HEADER_LEN + 4..];
    let needed = count
        .checked_mul(RECORD_LEN)
        .ok_or_else(|| SimError::mesh(format!("STL facet count {count} overflows")))?;
    if body.len() < needed {
        return Err(SimError::mesh(format!(
            "STL declares {count} facets ({needed} bytes) but only {} bytes follow the header",
            body.len()
        )));
    }

    let mut mesh = StlMesh {
        vertices: Vec::with_capacity(3 * count),
        faces: Vec::with_capacity(count),
        stored_normals: Vec::with_capacity(count),
    };
    for (i, record) in body.chunks_exact(RECORD_LEN).take(count).enumerate() {
        mesh.stored_normals.push(read_vec3(record, 0));
        for k in 0..3 {
            mesh.vertices.push(read_vec3(record, 12 + 12 * k));
        }
        mesh.faces.push([3 * i, 3 * i + 1, 3 * i + 2]);
    }

    log::debug!("parsed STL with {count} facets");
    Ok(mesh)
}

pub fn read_stl(path: impl AsRef<Path>) -> Result<StlMesh> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_binary_stl(&bytes)
}
