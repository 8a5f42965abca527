//! STL file export (Binary format)
//!
//! STL (stereolithography) is a simple mesh format commonly used for 3D printing.
//! Binary STL is more compact than ASCII STL and is what most slicers expect.
//!
//! Note: STL has no notion of separate objects, so several meshes passed in one
//! call are written as a single triangle soup.

use crate::Result;
use crate::mesh::Mesh;
use glam::Vec3;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Size of the fixed STL header in bytes
pub const STL_HEADER_LEN: u64 = 80;

/// Size of one triangle record in bytes
pub const STL_TRIANGLE_LEN: u64 = 50;

/// Export meshes to binary STL format, replacing any existing file
///
/// Binary STL format:
/// - 80 bytes: Header (arbitrary text)
/// - 4 bytes: Number of triangles (u32 little-endian)
/// - For each triangle (50 bytes):
///   - 12 bytes: Normal vector (3 x f32 little-endian)
///   - 36 bytes: 3 vertices (9 x f32 little-endian)
///   - 2 bytes: Attribute byte count (always 0)
pub fn export_stl(meshes: &[&Mesh], path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let num_triangles: usize = meshes.iter().map(|m| m.triangle_count()).sum();

    // Header (80 bytes, padded with spaces)
    let header = format!("batchmesh STL export - {} triangles", num_triangles);
    let mut header_bytes = [b' '; STL_HEADER_LEN as usize];
    let header_len = header.len().min(header_bytes.len());
    header_bytes[..header_len].copy_from_slice(&header.as_bytes()[..header_len]);
    writer.write_all(&header_bytes)?;

    writer.write_all(&(num_triangles as u32).to_le_bytes())?;

    for mesh in meshes {
        for tri in 0..mesh.triangle_count() {
            // STL expects face normals, not the smoothed vertex normals
            write_vec3(&mut writer, mesh.face_normal(tri))?;
            for &i in &mesh.indices[tri * 3..tri * 3 + 3] {
                write_vec3(&mut writer, Vec3::from_array(mesh.vertices[i as usize].position))?;
            }
            writer.write_all(&0u16.to_le_bytes())?;
        }
    }

    writer.flush()?;
    Ok(())
}

fn write_vec3(writer: &mut impl Write, v: Vec3) -> std::io::Result<()> {
    for c in v.to_array() {
        writer.write_all(&c.to_le_bytes())?;
    }
    Ok(())
}
