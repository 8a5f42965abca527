//! Solid shapes and the tessellation seam
//!
//! A [`Shape`] is the geometry carried by a part in the document. Turning it
//! into triangles is the job of a [`Tessellator`]; the pipeline only ever talks
//! to that trait, so a real B-rep kernel can replace the analytic
//! [`KernelTessellator`] shipped here.
//!
//! ## Example
//!
//! ```rust,ignore
//! use batchmesh_core::prelude::*;
//!
//! let shaft = Shape::cylinder(5.0, 40.0);
//! let mesh = KernelTessellator.tessellate(&shaft, &TessellationParams::new(0.01, 0.05))?;
//! ```

mod kernel;

use crate::Result;
use crate::mesh::Mesh;
use glam::Vec3;
use serde::{Deserialize, Serialize};

pub use kernel::{KernelTessellator, MAX_SEGMENTS, segments_for_circle};

/// Analytic solids understood by the reference kernel
///
/// Primitives follow the usual CAD placement: boxes start at the origin
/// corner, cylinders and cones stand on the XY plane along +Z, spheres and
/// tori are centred on the origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Cuboid {
        size: Vec3,
    },
    Sphere {
        radius: f32,
    },
    Cylinder {
        radius: f32,
        height: f32,
    },
    Cone {
        radius: f32,
        height: f32,
    },
    Torus {
        major_radius: f32,
        minor_radius: f32,
    },
    /// Another shape moved by `offset`
    Translated {
        offset: Vec3,
        shape: Box<Shape>,
    },
    /// Several solids meshed into one artifact
    Compound {
        shapes: Vec<Shape>,
    },
}

impl Shape {
    pub fn cuboid(x: f32, y: f32, z: f32) -> Self {
        Self::Cuboid {
            size: Vec3::new(x, y, z),
        }
    }

    pub fn sphere(radius: f32) -> Self {
        Self::Sphere { radius }
    }

    pub fn cylinder(radius: f32, height: f32) -> Self {
        Self::Cylinder { radius, height }
    }

    pub fn cone(radius: f32, height: f32) -> Self {
        Self::Cone { radius, height }
    }

    pub fn torus(major_radius: f32, minor_radius: f32) -> Self {
        Self::Torus {
            major_radius,
            minor_radius,
        }
    }

    pub fn compound(shapes: Vec<Shape>) -> Self {
        Self::Compound { shapes }
    }

    /// Wrap this shape in a translation
    pub fn translate(self, offset: Vec3) -> Self {
        Self::Translated {
            offset,
            shape: Box::new(self),
        }
    }

    /// Largest radius of curvature in the shape, used to scale a relative deflection
    pub fn characteristic_size(&self) -> f32 {
        match self {
            Self::Cuboid { size } => size.max_element(),
            Self::Sphere { radius } | Self::Cylinder { radius, .. } | Self::Cone { radius, .. } => {
                *radius
            }
            Self::Torus {
                major_radius,
                minor_radius,
            } => major_radius + minor_radius,
            Self::Translated { shape, .. } => shape.characteristic_size(),
            Self::Compound { shapes } => shapes
                .iter()
                .map(Shape::characteristic_size)
                .fold(0.0, f32::max),
        }
    }
}

/// Accuracy parameters handed to the kernel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TessellationParams {
    /// Maximum distance between the surface and its mesh
    pub linear_deflection: f64,
    /// Maximum angle (radians) between adjacent facet normals
    pub angular_deflection: f64,
    /// Interpret `linear_deflection` as a fraction of the shape size
    pub relative: bool,
}

impl TessellationParams {
    /// Absolute deflections, as the batch pipeline uses them
    pub fn new(linear_deflection: f64, angular_deflection: f64) -> Self {
        Self {
            linear_deflection,
            angular_deflection,
            relative: false,
        }
    }

    pub fn with_relative(mut self, relative: bool) -> Self {
        self.relative = relative;
        self
    }
}

/// Converts shapes to triangle meshes
///
/// Implementations are synchronous and are not interrupted once called.
pub trait Tessellator {
    fn tessellate(&self, shape: &Shape, params: &TessellationParams) -> Result<Mesh>;
}

impl<T: Tessellator + ?Sized> Tessellator for &T {
    fn tessellate(&self, shape: &Shape, params: &TessellationParams) -> Result<Mesh> {
        (**self).tessellate(shape, params)
    }
}
