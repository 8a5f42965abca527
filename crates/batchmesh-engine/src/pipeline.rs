//! Batch meshing and STL export
//!
//! One run of [`BatchPipeline::run`]:
//!
//! 1. reads the mesh settings from the input group
//! 2. empties the output group and recomputes the document
//! 3. creates `<document dir>/mesh_export/`
//! 4. tessellates every input member into a `<label>_mesh` object in the output group
//! 5. if export is enabled, writes each mesh to `mesh_export/<label>.stl`
//!
//! Cancelling during step 4 keeps the meshes made so far and skips export.
//! Kernel or export failures abort the run; nothing already written is rolled back.

use crate::groups::{Groups, INPUT_LABEL};
use crate::progress::{ProgressReporter, Step};
use crate::schema::MeshSettings;
use batchmesh_core::document::{Document, ObjectId, ObjectKind};
use batchmesh_core::export::{ExportFormat, MeshExporter, StlExporter};
use batchmesh_core::shape::{KernelTessellator, TessellationParams, Tessellator};
use batchmesh_core::{Error, Result};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Directory, next to the document, that receives exported files
pub const EXPORT_SUBDIR: &str = "mesh_export";

/// Suffix of every generated mesh object
pub const MESH_SUFFIX: &str = "_mesh";

/// A mesh made in this run, remembered for export naming
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRecord {
    /// Label of the input member the mesh came from
    pub source_label: String,
    /// Requested name of the mesh object, `<source_label>_mesh`
    pub artifact_name: String,
    pub artifact: ObjectId,
}

impl ExportRecord {
    /// Target file of this record inside `dir`. The label must be a plain
    /// file name so the file cannot land outside `dir`.
    pub fn export_path(&self, dir: &Path) -> Result<PathBuf> {
        let mut components = Path::new(&self.source_label).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None)
                if !self.source_label.contains(std::path::is_separator) =>
            {
                Ok(dir.join(format!(
                    "{}.{}",
                    self.source_label,
                    ExportFormat::Stl.extension()
                )))
            }
            _ => Err(Error::Export(format!(
                "'{}' is not usable as a file name",
                self.source_label
            ))),
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every member was meshed and, if enabled, exported
    Completed,
    /// The input group had nothing to mesh
    Empty,
    /// Cancelled while meshing; no files were written
    Aborted,
}

/// Summary of one pipeline run
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub status: RunStatus,
    pub settings: MeshSettings,
    pub export_dir: PathBuf,
    /// Meshes created, in input order
    pub records: Vec<ExportRecord>,
    /// Files written, in export order
    pub exported: Vec<PathBuf>,
}

impl BatchReport {
    pub fn artifact_count(&self) -> usize {
        self.records.len()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            RunStatus::Completed => write!(
                f,
                "Meshed {} objects, exported {} files to {}",
                self.records.len(),
                self.exported.len(),
                self.export_dir.display()
            ),
            RunStatus::Empty => write!(f, "No objects in {}, nothing to be done", INPUT_LABEL),
            RunStatus::Aborted => write!(
                f,
                "Aborted after meshing {} objects, nothing exported",
                self.records.len()
            ),
        }
    }
}

/// Tessellates the input group into the output group and exports the result
#[derive(Debug, Clone, Default)]
pub struct BatchPipeline<T = KernelTessellator, E = StlExporter> {
    tessellator: T,
    exporter: E,
}

impl BatchPipeline {
    /// Pipeline using the built-in kernel and STL writer
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Tessellator, E: MeshExporter> BatchPipeline<T, E> {
    /// Pipeline with a custom kernel and exporter
    pub fn with_backends(tessellator: T, exporter: E) -> Self {
        Self {
            tessellator,
            exporter,
        }
    }

    pub fn tessellator(&self) -> &T {
        &self.tessellator
    }

    pub fn exporter(&self) -> &E {
        &self.exporter
    }

    /// Run the whole batch. The document must have been saved, since exported
    /// files are placed next to it.
    pub fn run(
        &self,
        doc: &mut Document,
        groups: &Groups,
        progress: &mut dyn ProgressReporter,
    ) -> Result<BatchReport> {
        let settings = MeshSettings::resolve(doc.object_mut(groups.input)?)?;

        let cleared = doc.remove_group_contents(groups.output)?;
        doc.recompute();
        tracing::debug!("Removed {} previous meshes", cleared);

        let export_dir = doc.directory()?.join(EXPORT_SUBDIR);
        std::fs::create_dir_all(&export_dir)?;

        let mut report = BatchReport {
            status: RunStatus::Completed,
            settings,
            export_dir,
            records: Vec::new(),
            exported: Vec::new(),
        };

        let keys = doc.resolve_sub_objects(groups.input)?;
        if keys.is_empty() {
            tracing::info!("No objects in {}, nothing to be done.", INPUT_LABEL);
            report.status = RunStatus::Empty;
            return Ok(report);
        }

        if !self.mesh_all(doc, groups, &keys, progress, &mut report)? {
            doc.recompute();
            tracing::info!("Aborted.");
            report.status = RunStatus::Aborted;
            return Ok(report);
        }

        if settings.export_enabled {
            self.export_all(doc, progress, &mut report)?;
        }

        tracing::info!("Done.");
        Ok(report)
    }

    /// Mesh every key into the output group. Returns `false` if cancelled.
    /// The reporter is stopped however the loop ends.
    fn mesh_all(
        &self,
        doc: &mut Document,
        groups: &Groups,
        keys: &[String],
        progress: &mut dyn ProgressReporter,
        report: &mut BatchReport,
    ) -> Result<bool> {
        let params = report.settings.tessellation_params();
        tracing::info!(
            "Converting to Mesh (LinearDeflection={:.3}, AngularDeflection={:.3})",
            params.linear_deflection,
            params.angular_deflection
        );
        progress.start(&format!("Meshing {} objects...", keys.len()), keys.len());
        let outcome = self.mesh_each(doc, groups, keys, &params, progress, report);
        progress.stop();
        outcome
    }

    fn mesh_each(
        &self,
        doc: &mut Document,
        groups: &Groups,
        keys: &[String],
        params: &TessellationParams,
        progress: &mut dyn ProgressReporter,
        report: &mut BatchReport,
    ) -> Result<bool> {
        for key in keys {
            if progress.is_cancelled() {
                return Ok(false);
            }

            let source = doc.resolve_sub_object(groups.input, key)?;
            let artifact_name = format!("{}{}", source.owner_label, MESH_SUFFIX);
            tracing::info!("  + {} -> {}", source.owner_label, artifact_name);

            let mesh = self.tessellator.tessellate(&source.shape, params)?;
            let artifact = doc.add_object(ObjectKind::Mesh { mesh }, &artifact_name);
            // Visibility follows the output group at creation time only
            if !doc.is_visible(groups.output)? {
                doc.set_visible(artifact, false)?;
            }
            doc.add_to_group(groups.output, artifact)?;
            doc.touch(artifact)?;

            report.records.push(ExportRecord {
                source_label: source.owner_label,
                artifact_name,
                artifact,
            });

            if progress.advance() == Step::Cancelled {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Write one STL per record. Runs to completion once started.
    fn export_all(
        &self,
        doc: &Document,
        progress: &mut dyn ProgressReporter,
        report: &mut BatchReport,
    ) -> Result<()> {
        // Every target is checked before the first file is written
        let paths = report
            .records
            .iter()
            .map(|record| record.export_path(&report.export_dir))
            .collect::<Result<Vec<_>>>()?;

        let total = report.records.len();
        progress.start(&format!("Exporting {} objects...", total), total);
        tracing::info!("Exporting Meshes to {}", report.export_dir.display());
        let outcome = self.export_each(doc, &paths, progress, report);
        progress.stop();
        outcome
    }

    fn export_each(
        &self,
        doc: &Document,
        paths: &[PathBuf],
        progress: &mut dyn ProgressReporter,
        report: &mut BatchReport,
    ) -> Result<()> {
        for (record, path) in report.records.iter().zip(paths) {
            let mesh = doc.object(record.artifact)?.mesh().ok_or_else(|| {
                Error::Export(format!("'{}' holds no mesh", record.artifact_name))
            })?;

            tracing::info!(
                "  + {} -> {}",
                record.artifact_name,
                path.file_name().map_or_else(
                    || path.display().to_string(),
                    |n| n.to_string_lossy().to_string()
                )
            );
            self.exporter.export_meshes(&[mesh], path)?;
            report.exported.push(path.clone());
            // Export is not cancellable
            let _ = progress.advance();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_path_uses_source_label() {
        let record = ExportRecord {
            source_label: "Bracket".to_string(),
            artifact_name: "Bracket_mesh".to_string(),
            artifact: Document::new().add_object(ObjectKind::group(), "x"),
        };
        assert_eq!(
            record.export_path(Path::new("/tmp/out")).unwrap(),
            PathBuf::from("/tmp/out/Bracket.stl")
        );
    }

    #[test]
    fn test_export_path_rejects_labels_leaving_the_directory() {
        let mut doc = Document::new();
        let artifact = doc.add_object(ObjectKind::group(), "x");
        for label in ["../escaped", "sub/part", "trailing/", "/abs", "..", ".", ""] {
            let record = ExportRecord {
                source_label: label.to_string(),
                artifact_name: format!("{}_mesh", label),
                artifact,
            };
            assert!(
                matches!(record.export_path(Path::new("/tmp/out")), Err(Error::Export(_))),
                "label {:?} should be rejected",
                label
            );
        }
    }

    #[test]
    fn test_report_display() {
        let report = BatchReport {
            status: RunStatus::Empty,
            settings: MeshSettings {
                linear_deflection: 0.01,
                angular_deflection: 0.05,
                export_enabled: true,
            },
            export_dir: PathBuf::from("mesh_export"),
            records: Vec::new(),
            exported: Vec::new(),
        };
        assert_eq!(report.to_string(), "No objects in mesh_input, nothing to be done");
        assert_eq!(report.artifact_count(), 0);
    }
}
