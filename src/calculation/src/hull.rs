/// Triangulated hull geometry.
///
/// The mesh is stored in the z-up frame of the wave grid. Per-face normals
/// point the way water pressure pushes the face, i.e. into the hull for a
/// mesh whose triangles are wound counter-clockwise seen from outside (the
/// usual STL convention). A submerged bottom face therefore has a `+z` normal
/// and contributes an upward buoyancy force.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::vector::{Mat3, Vec3};

/// Relative cross-product magnitude below which a face is considered degenerate.
const DEGENERATE_TOLERANCE: f64 = 1e-12;

/// Per-face quantities derived from a mesh.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FaceProperties {
    pub centroids: Vec<Vec3>,
    pub areas: Vec<f64>,
    pub normals: Vec<Vec3>,
}

/// Centroid, area and unit normal of every face.
///
/// Fails with [`SimError::MalformedMesh`] on an out-of-range vertex index,
/// a non-finite coordinate or a degenerate (zero-area) face.
pub fn derive_face_properties(vertices: &[Vec3], faces: &[[usize; 3]]) -> Result<FaceProperties> {
    let mut props = FaceProperties {
        centroids: Vec::with_capacity(faces.len()),
        areas: Vec::with_capacity(faces.len()),
        normals: Vec::with_capacity(faces.len()),
    };

    for (i, face) in faces.iter().enumerate() {
        let mut p = [Vec3::zero(); 3];
        for (corner, &idx) in p.iter_mut().zip(face) {
            *corner = *vertices.get(idx).ok_or_else(|| {
                SimError::mesh(format!(
                    "face {i} references vertex {idx}, mesh has {}",
                    vertices.len()
                ))
            })?;
            if !corner.is_finite() {
                return Err(SimError::mesh(format!("face {i} has a non-finite vertex")));
            }
        }

        let e1 = p[0].sub(&p[1]);
        let e2 = p[0].sub(&p[2]);
        let cross = e1.cross(&e2);
        let scale = e1.dot(&e1).max(e2.dot(&e2));
        let twice_area = cross.magnitude();
        if !(twice_area > DEGENERATE_TOLERANCE * scale) {
            return Err(SimError::mesh(format!("face {i} is degenerate: {face:?}")));
        }

        props
            .centroids
            .push(p[0].add(&p[1]).add(&p[2]).mul(1.0 / 3.0));
        props.areas.push(0.5 * twice_area);
        props.normals.push(cross.mul(-1.0 / twice_area));
    }

    Ok(props)
}

/// Hull mesh plus its derived face properties.
///
/// The integrator owns one of these for the duration of a run and transforms
/// it in place every step. Only vertices and faces are serialised; the face
/// properties are derived again on deserialisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MeshData")]
pub struct HullMesh {
    pub vertices: Vec<Vec3>,
    pub faces: Vec<[usize; 3]>,
    #[serde(skip)]
    pub centroids: Vec<Vec3>,
    #[serde(skip)]
    pub areas: Vec<f64>,
    #[serde(skip)]
    pub normals: Vec<Vec3>,
}

impl HullMesh {
    pub fn new(vertices: Vec<Vec3>, faces: Vec<[usize; 3]>) -> Result<Self> {
        let FaceProperties {
            centroids,
            areas,
            normals,
        } = derive_face_properties(&vertices, &faces)?;
        Ok(Self {
            vertices,
            faces,
            centroids,
            areas,
            normals,
        })
    }

    /// Closed box with one corner at the origin, 12 triangles wound
    /// counter-clockwise seen from outside.
    pub fn cuboid(length: f64, width: f64, height: f64) -> Result<Self> {
        let vertices = (0..8)
            .map(|i| {
                Vec3::new(
                    if i & 1 != 0 { length } else { 0.0 },
                    if i & 2 != 0 { width } else { 0.0 },
                    if i & 4 != 0 { height } else { 0.0 },
                )
            })
            .collect();
        let faces = vec![
            [0, 2, 1],
            [1, 2, 3], // bottom
            [4, 5, 6],
            [5, 7, 6], // top
            [0, 1, 4],
            [1, 5, 4], // y = 0
            [2, 6, 3],
            [3, 6, 7], // y = width
            [0, 4, 2],
            [2, 4, 6], // x = 0
            [1, 3, 5],
            [3, 7, 5], // x = length
        ];
        Self::new(vertices, faces)
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Centre of the axis-aligned bounding box of the vertices.
    pub fn bounding_center(&self) -> Vec3 {
        if self.vertices.is_empty() {
            return Vec3::zero();
        }
        let mut lo = [f64::INFINITY; 3];
        let mut hi = [f64::NEG_INFINITY; 3];
        for v in &self.vertices {
            for (k, c) in v.to_array().into_iter().enumerate() {
                lo[k] = lo[k].min(c);
                hi[k] = hi[k].max(c);
            }
        }
        Vec3::new(
            0.5 * (lo[0] + hi[0]),
            0.5 * (lo[1] + hi[1]),
            0.5 * (lo[2] + hi[2]),
        )
    }

    /// Move every vertex and centroid by `offset`.
    pub fn translate(&mut self, offset: &Vec3) {
        for v in self.vertices.iter_mut().chain(self.centroids.iter_mut()) {
            *v = v.add(offset);
        }
    }

    /// Rotate the mesh about `pivot`. Points are mapped `p ← pivot + R (p − pivot)`
    /// and normals `n ← R n`.
    pub fn rotate_about(&mut self, pivot: &Vec3, rotation: &Mat3) {
        for v in self.vertices.iter_mut().chain(self.centroids.iter_mut()) {
            *v = pivot.add(&rotation.mul_vec(&v.sub(pivot)));
        }
        for n in &mut self.normals {
            *n = rotation.mul_vec(n);
        }
    }
}

#[derive(Deserialize)]
struct MeshData {
    vertices: Vec<Vec3>,
    faces: Vec<[usize; 3]>,
}

impl TryFrom<MeshData> for HullMesh {
    type Error = SimError;

    fn try_from(data: MeshData) -> Result<Self> {
        Self::new(data.vertices, data.faces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tetrahedron() -> (Vec<Vec3>, Vec<[usize; 3]>) {
        let vertices = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        ];
        let faces = vec![[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
        (vertices, faces)
    }

    #[test]
    fn test_tetrahedron_areas_and_normals() {
        let (v, f) = tetrahedron();
        let props = derive_face_properties(&v, &f).unwrap();
        assert_relative_eq!(props.areas[0], 0.5);
        assert_relative_eq!(props.areas[1], 0.5);
        assert_relative_eq!(props.areas[2], 0.5);
        assert_relative_eq!(props.areas[3], 3f64.sqrt() / 2.0, epsilon = 1e-12);
        for n in &props.normals {
            assert_relative_eq!(n.magnitude(), 1.0, epsilon = 1e-12);
        }
        assert_eq!(props.normals[0], Vec3::new(0.0, 0.0, -1.0));
        let k = 1.0 / 3f64.sqrt();
        assert_relative_eq!(props.normals[3].x, -k, epsilon = 1e-12);
        assert_relative_eq!(props.normals[3].y, -k, epsilon = 1e-12);
        assert_relative_eq!(props.normals[3].z, -k, epsilon = 1e-12);
    }

    #[test]
    fn test_centroid_is_vertex_mean() {
        let (v, f) = tetrahedron();
        let props = derive_face_properties(&v, &f).unwrap();
        assert_relative_eq!(props.centroids[3].x, 1.0 / 3.0);
        assert_relative_eq!(props.centroids[3].y, 1.0 / 3.0);
        assert_relative_eq!(props.centroids[3].z, 1.0 / 3.0);
    }

    #[test]
    fn test_collinear_face_is_malformed() {
        let v = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(2.0, 2.0, 2.0),
        ];
        let err = derive_face_properties(&v, &[[0, 1, 2]]).unwrap_err();
        assert!(matches!(err, SimError::MalformedMesh(_)));
    }

    #[test]
    fn test_bad_index_is_malformed() {
        let (v, _) = tetrahedron();
        assert!(matches!(
            derive_face_properties(&v, &[[0, 1, 9]]),
            Err(SimError::MalformedMesh(_))
        ));
    }

    #[test]
    fn test_cuboid_normals_point_inward() {
        let hull = HullMesh::cuboid(4.0, 2.0, 1.0).unwrap();
        assert_eq!(hull.face_count(), 12);
        assert_relative_eq!(hull.areas.iter().sum::<f64>(), 2.0 * (8.0 + 4.0 + 2.0));
        let centre = hull.bounding_center();
        assert_eq!(centre, Vec3::new(2.0, 1.0, 0.5));
        for (c, n) in hull.centroids.iter().zip(&hull.normals) {
            assert!(centre.sub(c).dot(n) > 0.0);
        }
        // Bottom faces push up.
        assert_eq!(hull.normals[0], Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(hull.normals[1], Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_translate_and_rotate() {
        let mut hull = HullMesh::cuboid(2.0, 2.0, 2.0).unwrap();
        hull.translate(&Vec3::new(-1.0, -1.0, -1.0));
        assert_eq!(hull.bounding_center(), Vec3::zero());

        let half_turn = Mat3::euler_xyz(std::f64::consts::PI, 0.0, 0.0);
        hull.rotate_about(&Vec3::zero(), &half_turn);
        // Rolled upside down: the old bottom now faces down.
        assert_relative_eq!(hull.normals[0].z, -1.0, epsilon = 1e-12);
        assert_relative_eq!(hull.centroids[0].z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_deserialised_mesh_has_face_properties() {
        let hull = HullMesh::cuboid(4.0, 2.0, 1.0).unwrap();
        let json = serde_json::to_string(&hull).unwrap();
        assert!(!json.contains("normals"));
        let back: HullMesh = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hull);
        assert_eq!(back.centroids.len(), back.face_count());

        let bad = r#"{"vertices":[{"x":0.0,"y":0.0,"z":0.0}],"faces":[[0,1,2]]}"#;
        assert!(serde_json::from_str::<HullMesh>(bad).is_err());
    }
}
