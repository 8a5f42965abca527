//! Triangle meshes produced by tessellation

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A vertex with position and normal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
        }
    }
}

/// A triangle mesh
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Append a vertex and return its index
    pub fn push_vertex(&mut self, position: Vec3, normal: Vec3) -> u32 {
        self.vertices.push(Vertex::new(position, normal));
        (self.vertices.len() - 1) as u32
    }

    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Append another mesh, rebasing its indices
    pub fn merge(&mut self, other: &Mesh) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }

    /// Move every vertex by `offset`
    pub fn translate(&mut self, offset: Vec3) {
        for v in &mut self.vertices {
            v.position = (Vec3::from_array(v.position) + offset).to_array();
        }
    }

    /// Axis-aligned bounds as `(min, max)`, or `None` for a mesh without vertices
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = Vec3::from_array(self.vertices.first()?.position);
        Some(self.vertices.iter().fold((first, first), |(min, max), v| {
            let p = Vec3::from_array(v.position);
            (min.min(p), max.max(p))
        }))
    }

    /// Face normal of triangle `tri`, or +Z for a degenerate triangle
    pub fn face_normal(&self, tri: usize) -> Vec3 {
        let i = &self.indices[tri * 3..tri * 3 + 3];
        let p0 = Vec3::from_array(self.vertices[i[0] as usize].position);
        let p1 = Vec3::from_array(self.vertices[i[1] as usize].position);
        let p2 = Vec3::from_array(self.vertices[i[2] as usize].position);
        let n = (p1 - p0).cross(p2 - p0);
        if n.length_squared() > 0.0 {
            n.normalize()
        } else {
            Vec3::Z
        }
    }
}
