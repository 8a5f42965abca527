//! Reference tessellation kernel for analytic solids
//!
//! Every curved surface is built from circles. A circle of radius `r` is split
//! into the smallest number of segments `n` such that
//!
//! - the chord sagitta `r * (1 - cos(pi / n))` stays within the linear deflection
//! - the angle step `2 * pi / n` stays within the angular deflection
//!
//! with a floor of three segments. Flat faces are emitted as two triangles.

use super::{Shape, TessellationParams, Tessellator};
use crate::mesh::Mesh;
use crate::{Error, Result};
use glam::Vec3;
use std::f64::consts::{PI, TAU};

/// Upper bound on segments per circle before the kernel gives up
pub const MAX_SEGMENTS: u32 = 4096;

/// Analytic tessellator for [`Shape`] primitives
#[derive(Debug, Clone, Copy, Default)]
pub struct KernelTessellator;

impl Tessellator for KernelTessellator {
    fn tessellate(&self, shape: &Shape, params: &TessellationParams) -> Result<Mesh> {
        validate_params(params)?;
        let linear = if params.relative {
            params.linear_deflection * f64::from(shape.characteristic_size())
        } else {
            params.linear_deflection
        };
        let mut mesh = Mesh::new();
        build(shape, linear, params.angular_deflection, &mut mesh)?;
        Ok(mesh)
    }
}

fn validate_params(params: &TessellationParams) -> Result<()> {
    if !(params.linear_deflection.is_finite() && params.linear_deflection > 0.0) {
        return Err(Error::Tessellation(format!(
            "linear deflection must be positive, got {}",
            params.linear_deflection
        )));
    }
    if !(params.angular_deflection.is_finite() && params.angular_deflection > 0.0) {
        return Err(Error::Tessellation(format!(
            "angular deflection must be positive, got {}",
            params.angular_deflection
        )));
    }
    Ok(())
}

/// Segment count for a full circle of `radius` under the given deflections
pub fn segments_for_circle(radius: f64, linear: f64, angular: f64) -> Result<u32> {
    // Sagitta of a 3-gon is r/2; anything looser than that needs no refinement
    let by_linear = if linear >= radius * 0.5 {
        3.0
    } else {
        (PI / (1.0 - linear / radius).acos()).ceil()
    };
    let by_angle = (TAU / angular).ceil();
    let n = by_linear.max(by_angle).max(3.0);

    if n > f64::from(MAX_SEGMENTS) {
        return Err(Error::Tessellation(format!(
            "deflection too small: {} segments exceeds limit of {}",
            n, MAX_SEGMENTS
        )));
    }
    Ok(n as u32)
}

fn positive(value: f32, what: &str) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(f64::from(value))
    } else {
        Err(Error::Tessellation(format!(
            "{} must be positive, got {}",
            what, value
        )))
    }
}

fn build(shape: &Shape, linear: f64, angular: f64, mesh: &mut Mesh) -> Result<()> {
    match shape {
        Shape::Cuboid { size } => {
            positive(size.min_element(), "box size")?;
            cuboid(*size, mesh);
        }
        Shape::Sphere { radius } => {
            let n = segments_for_circle(positive(*radius, "sphere radius")?, linear, angular)?;
            sphere(*radius, n, mesh);
        }
        Shape::Cylinder { radius, height } => {
            positive(*height, "cylinder height")?;
            let n = segments_for_circle(positive(*radius, "cylinder radius")?, linear, angular)?;
            cylinder(*radius, *height, n, mesh);
        }
        Shape::Cone { radius, height } => {
            positive(*height, "cone height")?;
            let n = segments_for_circle(positive(*radius, "cone radius")?, linear, angular)?;
            cone(*radius, *height, n, mesh);
        }
        Shape::Torus {
            major_radius,
            minor_radius,
        } => {
            let major = positive(*major_radius, "torus major radius")?;
            let minor = positive(*minor_radius, "torus minor radius")?;
            let nu = segments_for_circle(major + minor, linear, angular)?;
            let nv = segments_for_circle(minor, linear, angular)?;
            torus(*major_radius, *minor_radius, nu, nv, mesh);
        }
        Shape::Translated { offset, shape } => {
            let mut part = Mesh::new();
            build(shape, linear, angular, &mut part)?;
            part.translate(*offset);
            mesh.merge(&part);
        }
        Shape::Compound { shapes } => {
            for shape in shapes {
                build(shape, linear, angular, mesh)?;
            }
        }
    }
    Ok(())
}

fn angle(j: u32, n: u32) -> f32 {
    (TAU * f64::from(j) / f64::from(n)) as f32
}

fn cuboid(size: Vec3, mesh: &mut Mesh) {
    // (normal, u, v) with u x v == normal
    const FACES: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::X, Vec3::Y, Vec3::Z),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::Z, Vec3::X),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::Y, Vec3::X),
    ];
    let center = size * 0.5;

    for (n, u, v) in FACES {
        let face_center = center + n * (size * n.abs()).element_sum() * 0.5;
        let hu = u * (size * u.abs()).element_sum() * 0.5;
        let hv = v * (size * v.abs()).element_sum() * 0.5;

        let a = mesh.push_vertex(face_center - hu - hv, n);
        let b = mesh.push_vertex(face_center + hu - hv, n);
        let c = mesh.push_vertex(face_center + hu + hv, n);
        let d = mesh.push_vertex(face_center - hu + hv, n);
        mesh.push_triangle(a, b, c);
        mesh.push_triangle(a, c, d);
    }
}

fn sphere(radius: f32, n: u32, mesh: &mut Mesh) {
    let rings = (n / 2).max(2);
    let base = mesh.vertices.len() as u32;

    for i in 0..=rings {
        let phi = (PI * f64::from(i) / f64::from(rings)) as f32;
        for j in 0..n {
            let theta = angle(j, n);
            let normal = Vec3::new(phi.sin() * theta.cos(), phi.sin() * theta.sin(), phi.cos());
            mesh.push_vertex(normal * radius, normal);
        }
    }

    let idx = |i: u32, j: u32| base + i * n + (j % n);
    for i in 0..rings {
        for j in 0..n {
            let (a, b) = (idx(i, j), idx(i, j + 1));
            let (c, d) = (idx(i + 1, j), idx(i + 1, j + 1));
            // Skip the degenerate halves at the poles
            if i != 0 {
                mesh.push_triangle(a, c, b);
            }
            if i != rings - 1 {
                mesh.push_triangle(b, c, d);
            }
        }
    }
}

/// Flat disc at height `z` facing `+Z` or `-Z`
fn disc(radius: f32, z: f32, n: u32, up: bool, mesh: &mut Mesh) {
    let normal = if up { Vec3::Z } else { Vec3::NEG_Z };
    let center = mesh.push_vertex(Vec3::new(0.0, 0.0, z), normal);
    let first = mesh.vertices.len() as u32;
    for j in 0..n {
        let t = angle(j, n);
        mesh.push_vertex(Vec3::new(radius * t.cos(), radius * t.sin(), z), normal);
    }
    for j in 0..n {
        let a = first + j;
        let b = first + (j + 1) % n;
        if up {
            mesh.push_triangle(center, a, b);
        } else {
            mesh.push_triangle(center, b, a);
        }
    }
}

fn cylinder(radius: f32, height: f32, n: u32, mesh: &mut Mesh) {
    let base = mesh.vertices.len() as u32;
    for j in 0..n {
        let t = angle(j, n);
        let radial = Vec3::new(t.cos(), t.sin(), 0.0);
        mesh.push_vertex(radial * radius, radial);
        mesh.push_vertex(radial * radius + Vec3::Z * height, radial);
    }
    for j in 0..n {
        let (b0, t0) = (base + 2 * j, base + 2 * j + 1);
        let k = (j + 1) % n;
        let (b1, t1) = (base + 2 * k, base + 2 * k + 1);
        mesh.push_triangle(b0, b1, t1);
        mesh.push_triangle(b0, t1, t0);
    }

    disc(radius, 0.0, n, false, mesh);
    disc(radius, height, n, true, mesh);
}

fn cone(radius: f32, height: f32, n: u32, mesh: &mut Mesh) {
    let apex = Vec3::Z * height;
    let base = mesh.vertices.len() as u32;
    for j in 0..n {
        let t = angle(j, n);
        let normal = Vec3::new(height * t.cos(), height * t.sin(), radius).normalize();
        mesh.push_vertex(Vec3::new(radius * t.cos(), radius * t.sin(), 0.0), normal);
        // One apex vertex per segment so each keeps its slant normal
        mesh.push_vertex(apex, normal);
    }
    for j in 0..n {
        let b0 = base + 2 * j;
        let b1 = base + 2 * ((j + 1) % n);
        mesh.push_triangle(b0, b1, b0 + 1);
    }

    disc(radius, 0.0, n, false, mesh);
}

fn torus(major: f32, minor: f32, nu: u32, nv: u32, mesh: &mut Mesh) {
    let base = mesh.vertices.len() as u32;
    for i in 0..nu {
        let u = angle(i, nu);
        for j in 0..nv {
            let v = angle(j, nv);
            let normal = Vec3::new(v.cos() * u.cos(), v.cos() * u.sin(), v.sin());
            let center = Vec3::new(major * u.cos(), major * u.sin(), 0.0);
            mesh.push_vertex(center + normal * minor, normal);
        }
    }

    let idx = |i: u32, j: u32| base + (i % nu) * nv + (j % nv);
    for i in 0..nu {
        for j in 0..nv {
            let a = idx(i, j);
            let b = idx(i + 1, j);
            let c = idx(i, j + 1);
            let d = idx(i + 1, j + 1);
            mesh.push_triangle(a, b, d);
            mesh.push_triangle(a, d, c);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tessellate(shape: &Shape) -> Mesh {
        KernelTessellator
            .tessellate(shape, &TessellationParams::new(0.01, 0.05))
            .unwrap()
    }

    /// Every face normal should point away from `center`
    fn assert_outward(mesh: &Mesh, center: Vec3) {
        for tri in 0..mesh.triangle_count() {
            let i = mesh.indices[tri * 3] as usize;
            let p = Vec3::from_array(mesh.vertices[i].position);
            let n = mesh.face_normal(tri);
            assert!(n.dot(p - center) > -1e-4, "triangle {} faces inward", tri);
        }
    }

    #[test]
    fn test_segment_count_by_angle() {
        // Coarse linear deflection, angle dominates: 2pi / 0.5 = 12.57 -> 13
        assert_eq!(segments_for_circle(1.0, 10.0, 0.5).unwrap(), 13);
    }

    #[test]
    fn test_segment_count_by_linear() {
        let n = segments_for_circle(10.0, 0.01, 10.0).unwrap();
        let sagitta = 10.0 * (1.0 - (PI / f64::from(n)).cos());
        assert!(sagitta <= 0.01);
        let coarser = 10.0 * (1.0 - (PI / f64::from(n - 1)).cos());
        assert!(coarser > 0.01);
    }

    #[test]
    fn test_segment_floor() {
        assert_eq!(segments_for_circle(1.0, 100.0, 100.0).unwrap(), 3);
    }

    #[test]
    fn test_segment_limit() {
        assert!(matches!(
            segments_for_circle(1000.0, 1e-9, 0.05),
            Err(Error::Tessellation(_))
        ));
    }

    #[test]
    fn test_rejects_non_positive_deflection() {
        let shape = Shape::sphere(1.0);
        for params in [
            TessellationParams::new(0.0, 0.05),
            TessellationParams::new(-1.0, 0.05),
            TessellationParams::new(0.01, f64::NAN),
        ] {
            assert!(KernelTessellator.tessellate(&shape, &params).is_err());
        }
    }

    #[test]
    fn test_rejects_degenerate_shape() {
        assert!(matches!(
            KernelTessellator.tessellate(&Shape::sphere(0.0), &TessellationParams::new(0.1, 0.5)),
            Err(Error::Tessellation(_))
        ));
        assert!(
            KernelTessellator
                .tessellate(&Shape::cuboid(1.0, 0.0, 1.0), &TessellationParams::new(0.1, 0.5))
                .is_err()
        );
    }

    #[test]
    fn test_cuboid() {
        let mesh = tessellate(&Shape::cuboid(10.0, 20.0, 5.0));
        assert_eq!(mesh.triangle_count(), 12);
        let (min, max) = mesh.bounds().unwrap();
        assert_eq!(min, Vec3::ZERO);
        assert_eq!(max, Vec3::new(10.0, 20.0, 5.0));
        assert_outward(&mesh, Vec3::new(5.0, 10.0, 2.5));
    }

    #[test]
    fn test_sphere() {
        let mesh = tessellate(&Shape::sphere(2.0));
        for v in &mesh.vertices {
            assert_relative_eq!(Vec3::from_array(v.position).length(), 2.0, epsilon = 1e-4);
        }
        assert_outward(&mesh, Vec3::ZERO);
    }

    #[test]
    fn test_cylinder() {
        let mesh = tessellate(&Shape::cylinder(1.0, 3.0));
        let n = segments_for_circle(1.0, 0.01, 0.05).unwrap() as usize;
        // side quads plus two fans
        assert_eq!(mesh.triangle_count(), 4 * n);
        let (min, max) = mesh.bounds().unwrap();
        assert_relative_eq!(min.z, 0.0);
        assert_relative_eq!(max.z, 3.0);
        assert_outward(&mesh, Vec3::new(0.0, 0.0, 1.5));
    }

    #[test]
    fn test_cone() {
        let mesh = tessellate(&Shape::cone(1.0, 2.0));
        let n = segments_for_circle(1.0, 0.01, 0.05).unwrap() as usize;
        assert_eq!(mesh.triangle_count(), 2 * n);
        assert_outward(&mesh, Vec3::new(0.0, 0.0, 0.5));
    }

    #[test]
    fn test_torus() {
        let mesh = tessellate(&Shape::torus(3.0, 1.0));
        let (min, max) = mesh.bounds().unwrap();
        assert_relative_eq!(max.z, 1.0, epsilon = 1e-3);
        assert_relative_eq!(min.z, -1.0, epsilon = 1e-3);
        assert_relative_eq!(max.x, 4.0, epsilon = 1e-3);
    }

    #[test]
    fn test_finer_deflection_gives_more_triangles() {
        let shape = Shape::sphere(10.0);
        let coarse = KernelTessellator
            .tessellate(&shape, &TessellationParams::new(1.0, 1.0))
            .unwrap();
        let fine = KernelTessellator
            .tessellate(&shape, &TessellationParams::new(0.01, 0.05))
            .unwrap();
        assert!(fine.triangle_count() > coarse.triangle_count());
    }

    #[test]
    fn test_relative_deflection_scales_with_size() {
        let shape = Shape::cylinder(100.0, 1.0);
        let absolute = KernelTessellator
            .tessellate(&shape, &TessellationParams::new(0.01, 10.0))
            .unwrap();
        let relative = KernelTessellator
            .tessellate(&shape, &TessellationParams::new(0.01, 10.0).with_relative(true))
            .unwrap();
        assert!(relative.triangle_count() < absolute.triangle_count());
    }

    #[test]
    fn test_translated_compound() {
        let shape = Shape::compound(vec![
            Shape::cuboid(1.0, 1.0, 1.0),
            Shape::cuboid(1.0, 1.0, 1.0).translate(Vec3::new(5.0, 0.0, 0.0)),
        ]);
        let mesh = tessellate(&shape);
        assert_eq!(mesh.triangle_count(), 24);
        let (_, max) = mesh.bounds().unwrap();
        assert_relative_eq!(max.x, 6.0);
    }
}
