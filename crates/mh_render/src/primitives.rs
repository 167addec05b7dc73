//! CPU-side mesh building. Every primitive is generated with outward-facing
//! counter-clockwise triangles and per-vertex normals.

use std::f32::consts::{PI, TAU};

use glam::{Mat4, Vec3};

use crate::vertex::MeshVertex;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuMesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl CpuMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    /// Box centered on the origin with full edge lengths `size`.
    pub fn cuboid(size: Vec3, color: [f32; 4]) -> Self {
        let half = size * 0.5;
        // (normal, u, v) with u x v == normal.
        let faces = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        ];
        let mut mesh = Self::new();
        for (normal, u, v) in faces {
            let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]
                .map(|(su, sv)| (normal + u * su + v * sv) * half);
            mesh.push_quad(corners, normal, color);
        }
        mesh
    }

    /// Horizontal square of edge `size` at y = 0, facing up.
    pub fn plane(size: f32, color: [f32; 4]) -> Self {
        let h = size * 0.5;
        let corners = [
            Vec3::new(-h, 0.0, h),
            Vec3::new(h, 0.0, h),
            Vec3::new(h, 0.0, -h),
            Vec3::new(-h, 0.0, -h),
        ];
        let mut mesh = Self::new();
        mesh.push_quad(corners, Vec3::Y, color);
        mesh
    }

    /// Faceted cone with its base centered on the origin and apex at `height`.
    pub fn cone(radius: f32, height: f32, segments: u32, color: [f32; 4]) -> Self {
        let segments = segments.max(3);
        let apex = Vec3::new(0.0, height, 0.0);
        let ring: Vec<Vec3> = (0..=segments)
            .map(|i| {
                let theta = TAU * i as f32 / segments as f32;
                Vec3::new(radius * theta.cos(), 0.0, radius * theta.sin())
            })
            .collect();

        let mut mesh = Self::new();
        for pair in ring.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let normal = (apex - a).cross(b - a).normalize_or_zero();
            mesh.push_triangle([a, apex, b], normal, color);
        }
        for pair in ring.windows(2) {
            mesh.push_triangle([Vec3::ZERO, pair[0], pair[1]], Vec3::NEG_Y, color);
        }
        mesh
    }

    pub fn uv_sphere(radius: f32, rings: u32, segments: u32, color: [f32; 4]) -> Self {
        let rings = rings.max(2);
        let segments = segments.max(3);
        let mut mesh = Self::new();
        for ring in 0..=rings {
            let phi = PI * ring as f32 / rings as f32;
            for seg in 0..=segments {
                let theta = TAU * seg as f32 / segments as f32;
                let normal = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
                mesh.vertices.push(vertex(normal * radius, normal, color));
            }
        }
        let stride = segments + 1;
        for ring in 0..rings {
            for seg in 0..segments {
                let a = ring * stride + seg;
                let b = a + stride;
                let c = b + 1;
                let d = a + 1;
                mesh.indices.extend_from_slice(&[a, d, b, d, c, b]);
            }
        }
        mesh
    }

    /// Appends `other` transformed by `transform`. `tint` replaces the source
    /// colors when given.
    pub fn append_transformed(&mut self, other: &CpuMesh, transform: Mat4, tint: Option<[f32; 4]>) {
        let base = self.vertices.len() as u32;
        let normal_matrix = transform.inverse().transpose();
        self.vertices.extend(other.vertices.iter().map(|v| {
            let position = transform.transform_point3(Vec3::from_array(v.position));
            let normal = normal_matrix
                .transform_vector3(Vec3::from_array(v.normal))
                .normalize_or_zero();
            vertex(position, normal, tint.unwrap_or(v.color))
        }));
        self.indices.extend(other.indices.iter().map(|i| base + i));
    }

    fn push_quad(&mut self, corners: [Vec3; 4], normal: Vec3, color: [f32; 4]) {
        let base = self.vertices.len() as u32;
        self.vertices
            .extend(corners.iter().map(|p| vertex(*p, normal, color)));
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    fn push_triangle(&mut self, corners: [Vec3; 3], normal: Vec3, color: [f32; 4]) {
        let base = self.vertices.len() as u32;
        self.vertices
            .extend(corners.iter().map(|p| vertex(*p, normal, color)));
        self.indices.extend_from_slice(&[base, base + 1, base + 2]);
    }
}

fn vertex(position: Vec3, normal: Vec3, color: [f32; 4]) -> MeshVertex {
    MeshVertex {
        position: position.to_array(),
        normal: normal.to_array(),
        color,
    }
}
