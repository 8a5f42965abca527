//! # batchmesh core
//!
//! Building blocks for batch conversion of CAD document objects into
//! triangle meshes:
//!
//! - [`document`]: a persistent document of groups, parts, links and meshes
//! - [`shape`]: analytic solids and the [`Tessellator`](shape::Tessellator) seam
//! - [`mesh`]: the triangle mesh produced by tessellation
//! - [`export`]: the [`MeshExporter`](export::MeshExporter) seam and a binary STL writer
//!
//! ## Units and Conventions
//!
//! - **Distances**: model units (typically millimetres)
//! - **Angles**: radians
//! - **Deflections**: `f64`, passed through to the kernel unchanged
//! - **Mesh precision**: `f32` vertex data, as written to STL

pub mod document;
pub mod export;
pub mod mesh;
pub mod shape;

mod error;

pub use error::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    // Document model
    pub use crate::document::{
        Document, DocumentObject, ObjectId, ObjectKind, Property, PropertyKind, PropertyValue,
        ResolvedSubObject,
    };

    // Geometry
    pub use crate::mesh::{Mesh, Vertex};
    pub use crate::shape::{KernelTessellator, Shape, TessellationParams, Tessellator};

    // Export
    pub use crate::export::{ExportFormat, MeshExporter, StlExporter};

    // Math (re-export glam)
    pub use glam::Vec3;

    // Error handling
    pub use crate::{Error, Result};
}
