//! Mesh file export

mod stl;

use crate::mesh::Mesh;
use crate::{Error, Result};
use std::path::Path;

pub use stl::{STL_HEADER_LEN, STL_TRIANGLE_LEN, export_stl};

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Binary STL
    #[default]
    Stl,
}

impl ExportFormat {
    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_lowercase().as_str() {
            "stl" => Some(Self::Stl),
            _ => None,
        }
    }

    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Stl => "stl",
        }
    }
}

/// Writes a set of meshes to one file
pub trait MeshExporter {
    fn export_meshes(&self, meshes: &[&Mesh], path: &Path) -> Result<()>;
}

impl<E: MeshExporter + ?Sized> MeshExporter for &E {
    fn export_meshes(&self, meshes: &[&Mesh], path: &Path) -> Result<()> {
        (**self).export_meshes(meshes, path)
    }
}

/// Binary STL writer; several meshes end up in one solid
#[derive(Debug, Clone, Copy, Default)]
pub struct StlExporter;

impl MeshExporter for StlExporter {
    fn export_meshes(&self, meshes: &[&Mesh], path: &Path) -> Result<()> {
        match ExportFormat::from_extension(path) {
            Some(ExportFormat::Stl) => export_stl(meshes, path),
            None => Err(Error::Export(format!(
                "Unknown file extension: {}",
                path.display()
            ))),
        }
    }
}
