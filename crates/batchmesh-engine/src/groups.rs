//! Lookup-or-create of the input and output groups

use crate::schema::{self, FIELDS};
use batchmesh_core::Result;
use batchmesh_core::document::{Document, ObjectId, ObjectKind};

/// Label of the group whose members get meshed
pub const INPUT_LABEL: &str = "mesh_input";

/// Label of the group that receives generated meshes
pub const OUTPUT_LABEL: &str = "mesh_output";

/// The two groups the batch tools work on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Groups {
    pub input: ObjectId,
    pub output: ObjectId,
}

/// Find the input and output groups, creating whichever is missing, and make
/// sure the input group carries every mesh export setting.
///
/// Calling this again on the same document returns the same two groups.
pub fn ensure_groups(doc: &mut Document) -> Result<Groups> {
    let input = find_or_create(doc, INPUT_LABEL);
    let output = find_or_create(doc, OUTPUT_LABEL);

    let input_group = doc.object_mut(input)?;
    for field in &FIELDS {
        schema::resolve(input_group, field);
    }

    Ok(Groups { input, output })
}

fn find_or_create(doc: &mut Document, label: &str) -> ObjectId {
    match doc.find_groups_by_label(label).first() {
        Some(id) => *id,
        None => {
            tracing::info!("Creating group '{}'", label);
            doc.add_object(ObjectKind::group(), label)
        }
    }
}
