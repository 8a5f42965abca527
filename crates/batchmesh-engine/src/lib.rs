//! batchmesh engine - batch tessellation and export of document objects
//!
//! The Engine is a thin orchestration layer over the document model in
//! batchmesh-core. It owns the tessellation kernel and mesh exporter and runs
//! the two batch commands against an explicitly passed document.
//!
//! ## Example
//!
//! ```ignore
//! use batchmesh_engine::{Engine, LogProgress};
//! use batchmesh_core::document::Document;
//!
//! let mut doc = Document::load("parts.json".as_ref())?;
//! let engine = Engine::new();
//!
//! // Link two parts into mesh_input
//! engine.batch_add(&mut doc, &[bracket, shaft])?;
//!
//! // Mesh everything and write mesh_export/<label>.stl
//! let report = engine.batch_export(&mut doc, &mut LogProgress::default())?;
//! println!("{report}");
//! doc.save()?;
//! ```

pub mod commands;
pub mod groups;
pub mod pipeline;
pub mod progress;
pub mod schema;
pub mod selection;

use batchmesh_core::Result;
use batchmesh_core::document::{Document, ObjectId};
use batchmesh_core::export::{MeshExporter, StlExporter};
use batchmesh_core::shape::{KernelTessellator, Tessellator};

// Re-export commonly used types
pub use commands::{Command, CommandInfo};
pub use groups::{Groups, INPUT_LABEL, OUTPUT_LABEL, ensure_groups};
pub use pipeline::{BatchPipeline, BatchReport, ExportRecord, RunStatus};
pub use progress::{CancellationToken, LogProgress, ProgressReporter, Step};
pub use schema::{ConfigField, MeshSettings};

/// Runs the batch commands with a fixed kernel and exporter
#[derive(Debug, Clone, Default)]
pub struct Engine<T = KernelTessellator, E = StlExporter> {
    pipeline: BatchPipeline<T, E>,
}

impl Engine {
    /// Engine using the built-in kernel and STL writer
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Tessellator, E: MeshExporter> Engine<T, E> {
    pub fn with_pipeline(pipeline: BatchPipeline<T, E>) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &BatchPipeline<T, E> {
        &self.pipeline
    }

    /// "Batch Mesh Export": make sure the groups exist, then mesh and export
    pub fn batch_export(
        &self,
        doc: &mut Document,
        progress: &mut dyn ProgressReporter,
    ) -> Result<BatchReport> {
        let groups = ensure_groups(doc)?;
        self.pipeline.run(doc, &groups, progress)
    }

    /// "Batch Add": make sure the groups exist, then link `selection` into the input group
    pub fn batch_add(&self, doc: &mut Document, selection: &[ObjectId]) -> Result<Vec<ObjectId>> {
        let groups = ensure_groups(doc)?;
        selection::add_selection_to_input(doc, groups.input, selection)
    }
}
