//! The two user-facing batch commands

use batchmesh_core::document::ObjectId;

/// Display metadata of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandInfo {
    pub id: &'static str,
    pub menu_text: &'static str,
    pub tooltip: &'static str,
    /// Default shortcut
    pub accel: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Mesh and export everything in the input group
    Export,
    /// Link the current selection into the input group
    Add,
}

impl Command {
    pub const ALL: [Command; 2] = [Command::Export, Command::Add];

    pub fn info(&self) -> CommandInfo {
        match self {
            Self::Export => CommandInfo {
                id: "BatchMeshExport_export",
                menu_text: "Batch Mesh Export",
                tooltip: "Tessellate and export all parts in 'mesh_input' group.",
                accel: "F5",
            },
            Self::Add => CommandInfo {
                id: "BatchMeshExport_add",
                menu_text: "Batch Add",
                tooltip: "Add a link to the selected object to the mesh_input group.",
                accel: "Ctrl+Shift+A",
            },
        }
    }

    /// Whether the command can run with the given selection
    pub fn is_available(&self, selection: &[ObjectId]) -> bool {
        match self {
            Self::Export => true,
            Self::Add => crate::selection::is_available(selection),
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.info().id == id)
    }
}
