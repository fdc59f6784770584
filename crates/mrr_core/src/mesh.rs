//! Triangle mesh geometry.
//!
//! Meshes arrive from the scene editor as flat buffers (positions, normals,
//! triangle indices, UVs) in object-local space. The generators below build
//! the editor's stock shapes with the same vertex layout it uses.

use std::f32::consts::PI;

use mrr_math::{Vec2, Vec3};

use crate::{SceneError, SceneResult};

/// A mesh consisting of vertex positions, normals, UVs and triangle indices.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Vertex normals (optional - see `ensure_normals`)
    pub normals: Option<Vec<Vec3>>,

    /// UV coordinates (optional - one per vertex)
    pub uvs: Option<Vec<Vec2>>,

    /// Triangle indices (every 3 indices form a triangle)
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a new mesh from positions and indices, optionally with normals.
    ///
    /// If normals are not provided, they will NOT be automatically computed.
    /// Call `ensure_normals()` if you need them.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>, normals: Option<Vec<Vec3>>) -> Self {
        Self {
            positions,
            normals,
            uvs: None,
            indices,
        }
    }

    /// Create a new mesh with UV coordinates.
    pub fn new_with_uvs(
        positions: Vec<Vec3>,
        indices: Vec<u32>,
        normals: Option<Vec<Vec3>>,
        uvs: Option<Vec<Vec2>>,
    ) -> Self {
        Self {
            positions,
            normals,
            uvs,
            indices,
        }
    }

    /// Axis-aligned box centred on the origin.
    ///
    /// Each face has its own four vertices so normals and UVs stay flat.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let (w, h, d) = (width / 2.0, height / 2.0, depth / 2.0);

        #[rustfmt::skip]
        let positions = vec![
            // back
            Vec3::new(-w, -h, -d), Vec3::new(w, -h, -d), Vec3::new(w, h, -d), Vec3::new(-w, h, -d),
            // front
            Vec3::new(-w, -h, d), Vec3::new(w, -h, d), Vec3::new(w, h, d), Vec3::new(-w, h, d),
            // bottom
            Vec3::new(-w, -h, -d), Vec3::new(w, -h, -d), Vec3::new(w, -h, d), Vec3::new(-w, -h, d),
            // top
            Vec3::new(-w, h, -d), Vec3::new(w, h, -d), Vec3::new(w, h, d), Vec3::new(-w, h, d),
            // left
            Vec3::new(-w, -h, -d), Vec3::new(-w, -h, d), Vec3::new(-w, h, d), Vec3::new(-w, h, -d),
            // right
            Vec3::new(w, -h, -d), Vec3::new(w, -h, d), Vec3::new(w, h, d), Vec3::new(w, h, -d),
        ];

        let face_normals = [Vec3::NEG_Z, Vec3::Z, Vec3::NEG_Y, Vec3::Y, Vec3::NEG_X, Vec3::X];
        let normals = face_normals
            .iter()
            .flat_map(|n| std::iter::repeat(*n).take(4))
            .collect();

        let face_uvs = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        let uvs = face_uvs.iter().copied().cycle().take(24).collect();

        let indices = (0..6u32)
            .flat_map(|face| {
                let base = face * 4;
                [base, base + 1, base + 2, base, base + 2, base + 3]
            })
            .collect();

        Self::new_with_uvs(positions, indices, Some(normals), Some(uvs))
    }

    /// Square in the XZ plane centred on the origin, facing +Y.
    pub fn plane(size: f32) -> Self {
        let s = size / 2.0;
        let positions = vec![
            Vec3::new(-s, 0.0, -s),
            Vec3::new(s, 0.0, -s),
            Vec3::new(s, 0.0, s),
            Vec3::new(-s, 0.0, s),
        ];
        let normals = vec![Vec3::Y; 4];
        let uvs = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        Self::new_with_uvs(positions, vec![0, 1, 2, 0, 2, 3], Some(normals), Some(uvs))
    }

    /// Latitude/longitude tessellated sphere.
    pub fn uv_sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);

        let vertex_count = ((rings + 1) * (segments + 1)) as usize;
        let mut positions = Vec::with_capacity(vertex_count);
        let mut normals = Vec::with_capacity(vertex_count);
        let mut uvs = Vec::with_capacity(vertex_count);

        for i in 0..=rings {
            let phi = PI * i as f32 / rings as f32;
            for j in 0..=segments {
                let theta = 2.0 * PI * j as f32 / segments as f32;
                let n = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
                positions.push(n * radius);
                normals.push(n);
                uvs.push(Vec2::new(1.0 - j as f32 / segments as f32, i as f32 / rings as f32));
            }
        }

        let mut indices = Vec::with_capacity((rings * segments * 6) as usize);
        for i in 0..rings {
            for j in 0..segments {
                let p1 = i * (segments + 1) + j;
                let p2 = p1 + segments + 1;
                indices.extend_from_slice(&[p1, p1 + 1, p2, p2, p1 + 1, p2 + 1]);
            }
        }

        Self::new_with_uvs(positions, indices, Some(normals), Some(uvs))
    }

    /// Compute smooth vertex normals by averaging face normals.
    ///
    /// Each vertex normal is the normalized sum of the (area-weighted) face
    /// normals of every triangle sharing that vertex. Counter-clockwise
    /// winding faces the viewer.
    pub fn compute_normals(&mut self) {
        let vertex_count = self.positions.len();
        let mut normals = vec![Vec3::ZERO; vertex_count];

        for [i0, i1, i2] in self.triangles() {
            let (i0, i1, i2) = (i0 as usize, i1 as usize, i2 as usize);
            if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
                continue;
            }

            let p0 = self.positions[i0];
            let face_normal = (self.positions[i1] - p0).cross(self.positions[i2] - p0);

            normals[i0] += face_normal;
            normals[i1] += face_normal;
            normals[i2] += face_normal;
        }

        for normal in &mut normals {
            let len = normal.length();
            if len > 0.0 {
                *normal /= len;
            } else {
                *normal = Vec3::Y; // Default up normal for degenerate cases
            }
        }

        self.normals = Some(normals);
    }

    /// Check if the mesh has normals.
    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    /// Check if the mesh has UV coordinates.
    pub fn has_uvs(&self) -> bool {
        self.uvs.is_some()
    }

    /// Ensure the mesh has per-vertex normals, computing them if necessary.
    /// Also recomputes if existing normals don't match the vertex count.
    pub fn ensure_normals(&mut self) {
        let existing = self.normals.as_ref().map(Vec::len);
        match existing {
            Some(len) if len == self.positions.len() => {}
            Some(len) => {
                log::warn!(
                    "Normals array length ({}) doesn't match vertex count ({}), computing smooth normals",
                    len,
                    self.positions.len()
                );
                self.compute_normals();
            }
            None => self.compute_normals(),
        }
    }

    /// Get the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get the number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Iterate over triangles as index triplets.
    ///
    /// A trailing partial triangle is ignored.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]])
    }

    /// Check buffer consistency.
    ///
    /// `name` is only used for the error message.
    pub fn validate(&self, name: &str) -> SceneResult<()> {
        let invalid = |reason: String| SceneError::InvalidMesh {
            name: name.to_string(),
            reason,
        };

        if self.indices.len() % 3 != 0 {
            return Err(invalid(format!(
                "index count {} is not a multiple of 3",
                self.indices.len()
            )));
        }
        if let Some(&bad) = self
            .indices
            .iter()
            .find(|&&i| i as usize >= self.positions.len())
        {
            return Err(invalid(format!(
                "index {} out of range for {} vertices",
                bad,
                self.positions.len()
            )));
        }
        if let Some(normals) = &self.normals {
            if normals.len() != self.positions.len() {
                return Err(invalid(format!(
                    "{} normals for {} vertices",
                    normals.len(),
                    self.positions.len()
                )));
            }
        }
        if let Some(uvs) = &self.uvs {
            if uvs.len() != self.positions.len() {
                return Err(invalid(format!(
                    "{} uvs for {} vertices",
                    uvs.len(),
                    self.positions.len()
                )));
            }
        }
        if self.positions.iter().any(|p| !p.is_finite()) {
            return Err(invalid("non-finite vertex position".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_creation() {
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let mesh = Mesh::new(positions, vec![0, 1, 2], None);

        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert!(!mesh.has_normals());
    }

    #[test]
    fn test_compute_normals_ccw() {
        // CCW viewed from +Z produces a +Z normal
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let mut mesh = Mesh::new(positions, vec![0, 1, 2], None);
        mesh.ensure_normals();

        for normal in mesh.normals.as_ref().unwrap() {
            assert!((normal.z - 1.0).abs() < 0.001);
        }
    }

    #[test]
    fn test_ensure_normals_replaces_mismatched() {
        let positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        let mut mesh = Mesh::new(positions, vec![0, 1, 2], Some(vec![Vec3::X]));
        mesh.ensure_normals();
        assert_eq!(mesh.normals.as_ref().unwrap().len(), 3);
    }

    #[test]
    fn test_cuboid_layout() {
        let mesh = Mesh::cuboid(2.0, 2.0, 2.0);
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        assert!(mesh.validate("cuboid").is_ok());

        // Every vertex sits on the face its normal points out of.
        let normals = mesh.normals.as_ref().unwrap();
        for (p, n) in mesh.positions.iter().zip(normals) {
            assert!((p.dot(*n) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_plane_layout() {
        let mesh = Mesh::plane(4.0);
        assert_eq!(mesh.triangle_count(), 2);
        assert!(mesh.positions.iter().all(|p| p.y == 0.0 && p.x.abs() == 2.0));
        assert!(mesh.validate("plane").is_ok());
    }

    #[test]
    fn test_uv_sphere_on_surface() {
        let mesh = Mesh::uv_sphere(2.0, 8, 6);
        assert_eq!(mesh.vertex_count(), 7 * 9);
        assert_eq!(mesh.triangle_count(), 6 * 8 * 2);
        assert!(mesh.validate("sphere").is_ok());
        for p in &mesh.positions {
            assert!((p.length() - 2.0).abs() < 1e-4);
        }
        for uv in mesh.uvs.as_ref().unwrap() {
            assert!((0.0..=1.0).contains(&uv.x) && (0.0..=1.0).contains(&uv.y));
        }
    }

    #[test]
    fn test_validate_rejects_bad_buffers() {
        let tri = vec![Vec3::ZERO, Vec3::X, Vec3::Y];

        let out_of_range = Mesh::new(tri.clone(), vec![0, 1, 3], None);
        assert!(matches!(
            out_of_range.validate("m"),
            Err(SceneError::InvalidMesh { .. })
        ));

        let ragged = Mesh::new(tri.clone(), vec![0, 1], None);
        assert!(ragged.validate("m").is_err());

        let short_uvs = Mesh::new_with_uvs(tri, vec![0, 1, 2], None, Some(vec![Vec2::ZERO]));
        assert!(short_uvs.validate("m").is_err());
    }
}
