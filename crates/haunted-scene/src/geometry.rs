//! Procedural primitive meshes.
//!
//! Each generator lays vertices out on a segment grid and emits
//! counter-clockwise front faces. UVs are built with `v` pointing up and
//! flipped once at the end so image rows upload top-first without a copy.

use std::f32::consts::{PI, TAU};

/// Indexed triangle mesh with per-vertex position, normal and UV.
#[derive(Clone, Debug, Default, PartialEq)]
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

    /// Flat rectangle in the XY plane facing +Z.
    pub fn plane(width: f32, height: f32, width_segments: u32, height_segments: u32) -> Self {
        let grid_x = width_segments.max(1);
        let grid_y = height_segments.max(1);
        let segment_width = width / grid_x as f32;
        let segment_height = height / grid_y as f32;
        let half_width = width / 2.0;
        let half_height = height / 2.0;

        let mut mesh = Self::default();
        for iy in 0..=grid_y {
            let y = iy as f32 * segment_height - half_height;
            for ix in 0..=grid_x {
                let x = ix as f32 * segment_width - half_width;
                mesh.positions.push([x, -y, 0.0]);
                mesh.normals.push([0.0, 0.0, 1.0]);
                mesh.uvs
                    .push([ix as f32 / grid_x as f32, 1.0 - iy as f32 / grid_y as f32]);
            }
        }
        mesh.push_grid_indices(0, grid_x, grid_y);
        mesh.flip_v();
        mesh
    }

    /// Axis-aligned box centered on the origin, one quad per face.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let mut mesh = Self::default();
        // (u axis, v axis, w axis, u dir, v dir, u extent, v extent, w extent)
        let faces: [(usize, usize, usize, f32, f32, f32, f32, f32); 6] = [
            (2, 1, 0, -1.0, -1.0, depth, height, width),
            (2, 1, 0, 1.0, -1.0, depth, height, -width),
            (0, 2, 1, 1.0, 1.0, width, depth, height),
            (0, 2, 1, 1.0, -1.0, width, depth, -height),
            (0, 1, 2, 1.0, -1.0, width, height, depth),
            (0, 1, 2, -1.0, -1.0, width, height, -depth),
        ];
        for (u, v, w, u_dir, v_dir, u_extent, v_extent, w_extent) in faces {
            mesh.push_box_face(u, v, w, u_dir, v_dir, u_extent, v_extent, w_extent);
        }
        mesh.flip_v();
        mesh
    }

    /// Cone with its apex up, centered on the origin, closed at the base.
    pub fn cone(radius: f32, height: f32, radial_segments: u32) -> Self {
        let radial = radial_segments.max(3);
        let half_height = height / 2.0;
        let slope = radius / height;

        let mut mesh = Self::default();

        // Side: two rings, the apex ring collapsed to a point.
        for row in 0..=1u32 {
            let v = row as f32;
            let ring_radius = v * radius;
            for x in 0..=radial {
                let u = x as f32 / radial as f32;
                let theta = u * TAU;
                let (sin, cos) = theta.sin_cos();
                mesh.positions
                    .push([ring_radius * sin, -v * height + half_height, ring_radius * cos]);
                let normal = glam::Vec3::new(sin, slope, cos).normalize();
                mesh.normals.push(normal.to_array());
                mesh.uvs.push([u, 1.0 - v]);
            }
        }
        let row_len = radial + 1;
        for x in 0..radial {
            let b = row_len + x;
            let c = row_len + x + 1;
            let d = x + 1;
            // The apex row is degenerate, so only the lower triangle survives.
            mesh.indices.extend_from_slice(&[b, c, d]);
        }

        // Base cap facing -Y.
        let center_start = mesh.positions.len() as u32;
        for _ in 0..radial {
            mesh.positions.push([0.0, -half_height, 0.0]);
            mesh.normals.push([0.0, -1.0, 0.0]);
            mesh.uvs.push([0.5, 0.5]);
        }
        let rim_start = mesh.positions.len() as u32;
        for x in 0..=radial {
            let theta = x as f32 / radial as f32 * TAU;
            let (sin, cos) = theta.sin_cos();
            mesh.positions.push([radius * sin, -half_height, radius * cos]);
            mesh.normals.push([0.0, -1.0, 0.0]);
            mesh.uvs.push([cos * 0.5 + 0.5, -sin * 0.5 + 0.5]);
        }
        for x in 0..radial {
            let center = center_start + x;
            let rim = rim_start + x;
            mesh.indices.extend_from_slice(&[rim + 1, rim, center]);
        }

        mesh.flip_v();
        mesh
    }

    /// UV sphere centered on the origin.
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);

        let mut mesh = Self::default();
        let mut grid: Vec<Vec<u32>> = Vec::with_capacity(height_segments as usize + 1);
        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            // Shift pole UVs half a segment so the fan triangles are not sheared.
            let u_offset = if iy == 0 {
                0.5 / width_segments as f32
            } else if iy == height_segments {
                -0.5 / width_segments as f32
            } else {
                0.0
            };
            let mut row = Vec::with_capacity(width_segments as usize + 1);
            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let phi = u * TAU;
                let theta = v * PI;
                let position = glam::Vec3::new(
                    -radius * phi.cos() * theta.sin(),
                    radius * theta.cos(),
                    radius * phi.sin() * theta.sin(),
                );
                let normal = position.try_normalize().unwrap_or(glam::Vec3::Y);
                row.push(mesh.positions.len() as u32);
                mesh.positions.push(position.to_array());
                mesh.normals.push(normal.to_array());
                mesh.uvs.push([u + u_offset, 1.0 - v]);
            }
            grid.push(row);
        }

        for iy in 0..height_segments as usize {
            for ix in 0..width_segments as usize {
                let a = grid[iy][ix + 1];
                let b = grid[iy][ix];
                let c = grid[iy + 1][ix];
                let d = grid[iy + 1][ix + 1];
                if iy != 0 {
                    mesh.indices.extend_from_slice(&[a, b, d]);
                }
                if iy != height_segments as usize - 1 {
                    mesh.indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        mesh.flip_v();
        mesh
    }

    /// One face of a box: a quad spanning the `u`/`v` axes at `w_extent / 2`.
    #[allow(clippy::too_many_arguments)]
    fn push_box_face(
        &mut self,
        u: usize,
        v: usize,
        w: usize,
        u_dir: f32,
        v_dir: f32,
        u_extent: f32,
        v_extent: f32,
        w_extent: f32,
    ) {
        let base = self.positions.len() as u32;
        let half_u = u_extent / 2.0;
        let half_v = v_extent / 2.0;
        let half_w = w_extent / 2.0;
        let facing = if w_extent > 0.0 { 1.0 } else { -1.0 };

        for iy in 0..=1u32 {
            let y = iy as f32 * v_extent - half_v;
            for ix in 0..=1u32 {
                let x = ix as f32 * u_extent - half_u;
                let mut position = [0.0; 3];
                position[u] = x * u_dir;
                position[v] = y * v_dir;
                position[w] = half_w;
                let mut normal = [0.0; 3];
                normal[w] = facing;
                self.positions.push(position);
                self.normals.push(normal);
                self.uvs.push([ix as f32, 1.0 - iy as f32]);
            }
        }
        self.push_grid_indices(base, 1, 1);
    }

    /// Two triangles per cell of a `(grid_x + 1) x (grid_y + 1)` vertex grid.
    fn push_grid_indices(&mut self, base: u32, grid_x: u32, grid_y: u32) {
        let row = grid_x + 1;
        for iy in 0..grid_y {
            for ix in 0..grid_x {
                let a = base + ix + row * iy;
                let b = base + ix + row * (iy + 1);
                let c = base + ix + 1 + row * (iy + 1);
                let d = base + ix + 1 + row * iy;
                self.indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }
    }

    fn flip_v(&mut self) {
        for uv in &mut self.uvs {
            uv[1] = 1.0 - uv[1];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn assert_well_formed(mesh: &MeshData) {
        assert_eq!(mesh.positions.len(), mesh.normals.len());
        assert_eq!(mesh.positions.len(), mesh.uvs.len());
        assert_eq!(mesh.indices.len() % 3, 0);
        let count = mesh.vertex_count() as u32;
        assert!(mesh.indices.iter().all(|&i| i < count), "index out of range");
        for n in &mesh.normals {
            let len = Vec3::from_array(*n).length();
            assert!((len - 1.0).abs() < 1e-5, "normal length {len}");
        }
    }

    /// Face normal of every triangle agrees with its vertex normals.
    fn assert_front_faces_outward(mesh: &MeshData) {
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from_array(mesh.positions[i as usize]));
            let face = (b - a).cross(c - a);
            if face.length_squared() < 1e-12 {
                continue;
            }
            let vertex_normal = Vec3::from_array(mesh.normals[tri[0] as usize]);
            assert!(face.dot(vertex_normal) > 0.0, "triangle {tri:?} is wound inward");
        }
    }

    #[test]
    fn test_plane_counts() {
        let mesh = MeshData::plane(20.0, 20.0, 100, 100);
        assert_eq!(mesh.vertex_count(), 101 * 101);
        assert_eq!(mesh.triangle_count(), 100 * 100 * 2);
        assert_well_formed(&mesh);
        assert_front_faces_outward(&mesh);
    }

    #[test]
    fn test_plane_extent_and_uv_origin() {
        let mesh = MeshData::plane(2.2, 2.2, 1, 1);
        // First vertex is the top-left corner with UV (0, 0).
        assert_eq!(mesh.positions[0], [-1.1, 1.1, 0.0]);
        assert_eq!(mesh.uvs[0], [0.0, 0.0]);
        assert_eq!(mesh.uvs[3], [1.0, 1.0]);
    }

    #[test]
    fn test_cuboid_counts_and_bounds() {
        let mesh = MeshData::cuboid(4.0, 2.5, 4.0);
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        assert_well_formed(&mesh);
        assert_front_faces_outward(&mesh);
        for p in &mesh.positions {
            assert!(p[0].abs() <= 2.0 + 1e-6);
            assert!(p[1].abs() <= 1.25 + 1e-6);
            assert!(p[2].abs() <= 2.0 + 1e-6);
        }
    }

    #[test]
    fn test_cuboid_normals_point_away_from_center() {
        let mesh = MeshData::cuboid(0.6, 0.8, 0.2);
        for (p, n) in mesh.positions.iter().zip(&mesh.normals) {
            assert!(Vec3::from_array(*p).dot(Vec3::from_array(*n)) > 0.0);
        }
    }

    #[test]
    fn test_cone_counts() {
        let mesh = MeshData::cone(3.5, 1.5, 4);
        // Two side rings of 5, 4 cap centers, a cap rim of 5.
        assert_eq!(mesh.vertex_count(), 5 + 5 + 4 + 5);
        assert_eq!(mesh.triangle_count(), 4 + 4);
        assert_well_formed(&mesh);
        assert_front_faces_outward(&mesh);
    }

    #[test]
    fn test_cone_apex_and_base() {
        let mesh = MeshData::cone(3.5, 1.5, 4);
        let max_y = mesh.positions.iter().map(|p| p[1]).fold(f32::MIN, f32::max);
        let min_y = mesh.positions.iter().map(|p| p[1]).fold(f32::MAX, f32::min);
        assert!((max_y - 0.75).abs() < 1e-6);
        assert!((min_y + 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_sphere_counts() {
        let mesh = MeshData::sphere(1.0, 16, 16);
        assert_eq!(mesh.vertex_count(), 17 * 17);
        // Pole rows contribute one triangle per segment, others two.
        assert_eq!(mesh.triangle_count(), 16 * 2 * 16 - 2 * 16);
        assert_well_formed(&mesh);
        assert_front_faces_outward(&mesh);
    }

    #[test]
    fn test_sphere_vertices_on_surface() {
        let mesh = MeshData::sphere(2.0, 8, 6);
        for p in &mesh.positions {
            assert!((Vec3::from_array(*p).length() - 2.0).abs() < 1e-5);
        }
    }
}
