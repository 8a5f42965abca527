//! Mesh export settings stored on the input group
//!
//! Settings are ordinary document properties. Reading a field that the group
//! does not carry yet declares it with its default, so groups created by older
//! versions pick up new fields on first use while values the user edited are
//! never overwritten.

use batchmesh_core::document::{DocumentObject, Property, PropertyKind, PropertyValue};
use batchmesh_core::shape::TessellationParams;
use batchmesh_core::{Error, Result};

/// Property group shown in the editor for every field below
pub const PROPERTY_GROUP: &str = "Mesh Export";

/// A typed setting with its default and tooltip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfigField {
    pub name: &'static str,
    pub kind: PropertyKind,
    pub default: PropertyValue,
    pub description: &'static str,
}

pub const LINEAR_DEFLECTION: ConfigField = ConfigField {
    name: "MeshLinearDeflection",
    kind: PropertyKind::Float,
    default: PropertyValue::Float(0.01),
    description: "Linear Deflection parameter of the standard tessellation algorithm.",
};

pub const ANGULAR_DEFLECTION: ConfigField = ConfigField {
    name: "MeshAngularDeflection",
    kind: PropertyKind::Float,
    default: PropertyValue::Float(0.05),
    description: "Angular Deflection parameter of the standard tessellation algorithm.",
};

pub const EXPORT_ENABLED: ConfigField = ConfigField {
    name: "ExportSTL",
    kind: PropertyKind::Bool,
    default: PropertyValue::Bool(true),
    description: "When enabled: Export each mesh to an stl file. When disabled: Only meshing is performed, no file export.",
};

/// Every field attached to the input group
pub static FIELDS: [ConfigField; 3] = [LINEAR_DEFLECTION, ANGULAR_DEFLECTION, EXPORT_ENABLED];

/// Look up a field by property name (case-insensitive)
pub fn field(name: &str) -> Option<&'static ConfigField> {
    FIELDS.iter().find(|f| f.name.eq_ignore_ascii_case(name))
}

/// Current value of `field` on `object`, declaring it with its default first if absent
pub fn resolve(object: &mut DocumentObject, field: &ConfigField) -> PropertyValue {
    if let Some(value) = object.properties.value(field.name) {
        return value;
    }

    tracing::debug!(
        "Declaring property '{}' on '{}' (default {})",
        field.name,
        object.label,
        field.default
    );
    object.properties.declare(Property {
        name: field.name.to_string(),
        group: PROPERTY_GROUP.to_string(),
        doc: field.description.to_string(),
        value: field.default,
    });
    object.touched = true;
    field.default
}

pub fn resolve_float(object: &mut DocumentObject, field: &ConfigField) -> Result<f64> {
    resolve(object, field)
        .as_float()
        .ok_or_else(|| type_error(field, PropertyKind::Float))
}

pub fn resolve_bool(object: &mut DocumentObject, field: &ConfigField) -> Result<bool> {
    resolve(object, field)
        .as_bool()
        .ok_or_else(|| type_error(field, PropertyKind::Bool))
}

/// Store a user edit of `field`
pub fn set(object: &mut DocumentObject, field: &ConfigField, value: PropertyValue) -> Result<()> {
    if value.kind() != field.kind {
        return Err(type_error(field, field.kind));
    }
    resolve(object, field);
    object.properties.set(field.name, value);
    object.touched = true;
    Ok(())
}

fn type_error(field: &ConfigField, expected: PropertyKind) -> Error {
    Error::PropertyType {
        name: field.name.to_string(),
        expected: expected.name(),
    }
}

/// The three settings one pipeline run uses
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshSettings {
    pub linear_deflection: f64,
    pub angular_deflection: f64,
    pub export_enabled: bool,
}

impl MeshSettings {
    /// Read all settings from the input group, materializing missing ones
    pub fn resolve(object: &mut DocumentObject) -> Result<Self> {
        Ok(Self {
            linear_deflection: resolve_float(object, &LINEAR_DEFLECTION)?,
            angular_deflection: resolve_float(object, &ANGULAR_DEFLECTION)?,
            export_enabled: resolve_bool(object, &EXPORT_ENABLED)?,
        })
    }

    /// Absolute deflections for the kernel, no clamping
    pub fn tessellation_params(&self) -> TessellationParams {
        TessellationParams::new(self.linear_deflection, self.angular_deflection)
    }
}
