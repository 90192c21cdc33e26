use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

/// Immutable shape descriptor. Dimensions follow the usual primitive
/// conventions: shapes are centered on the origin and planes face +Z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Box {
        width: f32,
        height: f32,
        depth: f32,
    },
    /// Pyramid-like when `radial_segments` is small (four gives a square base).
    Cone {
        radius: f32,
        height: f32,
        radial_segments: u32,
    },
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
    Plane {
        width: f32,
        height: f32,
    },
}

/// Triangle list with per-vertex attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    fn push(&mut self, position: Vec3, normal: Vec3, uv: [f32; 2]) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position.to_array());
        self.normals.push(normal.to_array());
        self.uvs.push(uv);
        index
    }
}

impl Geometry {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Box { .. } => "box",
            Self::Cone { .. } => "cone",
            Self::Sphere { .. } => "sphere",
            Self::Plane { .. } => "plane",
        }
    }

    /// Build counter-clockwise triangles for this shape.
    pub fn tessellate(&self) -> MeshData {
        match *self {
            Self::Box {
                width,
                height,
                depth,
            } => box_mesh(Vec3::new(width, height, depth) * 0.5),
            Self::Cone {
                radius,
                height,
                radial_segments,
            } => cone_mesh(radius, height, radial_segments.max(3)),
            Self::Sphere {
                radius,
                width_segments,
                height_segments,
            } => sphere_mesh(radius, width_segments.max(3), height_segments.max(2)),
            Self::Plane { width, height } => plane_mesh(width * 0.5, height * 0.5),
        }
    }
}

fn box_mesh(half: Vec3) -> MeshData {
    // (normal, u axis, v axis) with u x v == normal so each quad winds CCW
    // when seen from outside.
    let faces = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];
    let mut mesh = MeshData::default();
    for (n, u, v) in faces {
        let center = n * half;
        let (u, v) = (u * half, v * half);
        let a = mesh.push(center - u - v, n, [0.0, 0.0]);
        let b = mesh.push(center + u - v, n, [1.0, 0.0]);
        let c = mesh.push(center + u + v, n, [1.0, 1.0]);
        let d = mesh.push(center - u + v, n, [0.0, 1.0]);
        mesh.indices.extend_from_slice(&[a, b, c, c, d, a]);
    }
    mesh
}

fn cone_mesh(radius: f32, height: f32, segments: u32) -> MeshData {
    let mut mesh = MeshData::default();
    let half = height * 0.5;
    let slope = radius / height;

    // Side: apex row then base row, one seam column duplicated for UVs.
    let mut rows = [Vec::new(), Vec::new()];
    for (row, ring_radius) in [(0usize, 0.0f32), (1, radius)] {
        let v = row as f32;
        for x in 0..=segments {
            let u = x as f32 / segments as f32;
            let (sin, cos) = (u * TAU).sin_cos();
            let position = Vec3::new(ring_radius * sin, half - v * height, ring_radius * cos);
            let normal = Vec3::new(sin, slope, cos).normalize();
            rows[row].push(mesh.push(position, normal, [u, 1.0 - v]));
        }
    }
    for x in 0..segments as usize {
        let b = rows[1][x];
        let c = rows[1][x + 1];
        let d = rows[0][x + 1];
        mesh.indices.extend_from_slice(&[b, c, d]);
    }

    // Base cap, facing -Y.
    let centers: Vec<u32> = (0..segments)
        .map(|_| mesh.push(Vec3::new(0.0, -half, 0.0), Vec3::NEG_Y, [0.5, 0.5]))
        .collect();
    let mut ring = Vec::with_capacity(segments as usize + 1);
    for x in 0..=segments {
        let u = x as f32 / segments as f32;
        let (sin, cos) = (u * TAU).sin_cos();
        let position = Vec3::new(radius * sin, -half, radius * cos);
        ring.push(mesh.push(position, Vec3::NEG_Y, [cos * 0.5 + 0.5, sin * 0.5 + 0.5]));
    }
    for x in 0..segments as usize {
        mesh.indices
            .extend_from_slice(&[ring[x + 1], ring[x], centers[x]]);
    }
    mesh
}

fn sphere_mesh(radius: f32, width_segments: u32, height_segments: u32) -> MeshData {
    let mut mesh = MeshData::default();
    let mut grid = Vec::with_capacity(height_segments as usize + 1);
    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        let mut row = Vec::with_capacity(width_segments as usize + 1);
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let position = Vec3::new(
                -radius * (u * TAU).cos() * (v * PI).sin(),
                radius * (v * PI).cos(),
                radius * (u * TAU).sin() * (v * PI).sin(),
            );
            let normal = position.normalize_or(Vec3::Y);
            row.push(mesh.push(position, normal, [u, 1.0 - v]));
        }
        grid.push(row);
    }
    for iy in 0..height_segments as usize {
        for ix in 0..width_segments as usize {
            let a = grid[iy][ix + 1];
            let b = grid[iy][ix];
            let c = grid[iy + 1][ix];
            let d = grid[iy + 1][ix + 1];
            // Pole rows collapse to a point; skip their degenerate halves.
            if iy != 0 {
                mesh.indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments as usize - 1 {
                mesh.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }
    mesh
}

fn plane_mesh(half_w: f32, half_h: f32) -> MeshData {
    let mut mesh = MeshData::default();
    let a = mesh.push(Vec3::new(-half_w, half_h, 0.0), Vec3::Z, [0.0, 1.0]);
    let b = mesh.push(Vec3::new(half_w, half_h, 0.0), Vec3::Z, [1.0, 1.0]);
    let c = mesh.push(Vec3::new(-half_w, -half_h, 0.0), Vec3::Z, [0.0, 0.0]);
    let d = mesh.push(Vec3::new(half_w, -half_h, 0.0), Vec3::Z, [1.0, 0.0]);
    mesh.indices.extend_from_slice(&[a, c, b, c, d, b]);
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every triangle's winding normal should agree with its vertex normals.
    fn assert_outward_winding(mesh: &MeshData) {
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(mesh.positions[i as usize]));
            let face = (b - a).cross(c - a);
            if face.length_squared() < 1e-12 {
                continue;
            }
            let n = Vec3::from(mesh.normals[tri[0] as usize])
                + Vec3::from(mesh.normals[tri[1] as usize])
                + Vec3::from(mesh.normals[tri[2] as usize]);
            assert!(face.dot(n) > 0.0, "inward-facing triangle {tri:?}");
        }
    }

    #[test]
    fn box_counts_and_extent() {
        let mesh = Geometry::Box {
            width: 4.0,
            height: 2.5,
            depth: 4.0,
        }
        .tessellate();
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        let max_y = mesh.positions.iter().map(|p| p[1]).fold(f32::MIN, f32::max);
        assert!((max_y - 1.25).abs() < 1e-6);
        assert_outward_winding(&mesh);
    }

    #[test]
    fn four_sided_cone() {
        let mesh = Geometry::Cone {
            radius: 3.5,
            height: 1.5,
            radial_segments: 4,
        }
        .tessellate();
        assert_eq!(mesh.vertex_count(), 10 + 4 + 5);
        assert_eq!(mesh.triangle_count(), 8);
        assert_outward_winding(&mesh);
    }

    #[test]
    fn sphere_counts() {
        let mesh = Geometry::Sphere {
            radius: 1.0,
            width_segments: 16,
            height_segments: 16,
        }
        .tessellate();
        assert_eq!(mesh.vertex_count(), 17 * 17);
        assert_eq!(mesh.indices.len(), 6 * 16 * 16 - 6 * 16);
        for p in &mesh.positions {
            assert!((Vec3::from(*p).length() - 1.0).abs() < 1e-5);
        }
        assert_outward_winding(&mesh);
    }

    #[test]
    fn plane_faces_positive_z() {
        let mesh = Geometry::Plane {
            width: 20.0,
            height: 20.0,
        }
        .tessellate();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert_outward_winding(&mesh);
    }

    #[test]
    fn attribute_arrays_stay_parallel() {
        let mesh = Geometry::Cone {
            radius: 1.0,
            height: 1.0,
            radial_segments: 8,
        }
        .tessellate();
        assert_eq!(mesh.positions.len(), mesh.normals.len());
        assert_eq!(mesh.positions.len(), mesh.uvs.len());
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.positions.len()));
    }
}
