//! Persistent CAD document
//!
//! A document is a flat, ordered list of objects. Groups reference their
//! members by [`ObjectId`]; an object belongs to at most one group. Links
//! reference another object and resolve to its geometry transparently.
//!
//! Documents are saved as JSON next to the files they produce, so
//! [`Document::directory`] is only available once the document has a path.

mod property;

use crate::mesh::Mesh;
use crate::shape::Shape;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub use property::{Properties, Property, PropertyKind, PropertyValue};

/// Stable handle of an object within one document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What an object is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectKind {
    /// Ordered container of other objects
    Group { members: Vec<ObjectId> },
    /// Solid geometry
    Part { shape: Shape },
    /// Lightweight reference to another object
    Link { target: Option<ObjectId> },
    /// Discretized mesh
    Mesh { mesh: Mesh },
}

impl ObjectKind {
    pub fn group() -> Self {
        Self::Group {
            members: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Group { .. } => "Group",
            Self::Part { .. } => "Part",
            Self::Link { .. } => "Link",
            Self::Mesh { .. } => "Mesh",
        }
    }
}

/// One entry of the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentObject {
    pub id: ObjectId,
    /// Internal name, unique within the document
    pub name: String,
    /// Display label, not necessarily unique
    pub label: String,
    pub kind: ObjectKind,
    pub visible: bool,
    #[serde(default)]
    pub properties: Properties,
    /// Display representation is stale
    #[serde(skip)]
    pub touched: bool,
}

impl DocumentObject {
    pub fn is_group(&self) -> bool {
        matches!(self.kind, ObjectKind::Group { .. })
    }

    pub fn members(&self) -> &[ObjectId] {
        match &self.kind {
            ObjectKind::Group { members } => members,
            _ => &[],
        }
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        match &self.kind {
            ObjectKind::Mesh { mesh } => Some(mesh),
            _ => None,
        }
    }
}

/// A group member resolved both to its geometry and to the entity that owns it
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSubObject {
    /// Sub-object key, `"<name>."`
    pub key: String,
    /// The member the key names (a link stays a link here)
    pub owner: ObjectId,
    pub owner_label: String,
    /// Geometry after following links
    pub shape: Shape,
}

/// An ordered collection of objects, optionally bound to a file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(skip)]
    path: Option<PathBuf>,
    next_id: u32,
    objects: Vec<DocumentObject>,
}

impl Document {
    /// Create an empty, unsaved document
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty document that will be saved to `path`
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Load a document from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut doc: Document = serde_json::from_str(&contents)?;
        doc.path = Some(path.to_path_buf());
        Ok(doc)
    }

    /// Save to the bound file
    pub fn save(&self) -> Result<()> {
        let path = self.path.as_ref().ok_or(Error::UnsavedDocument)?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Bind the document to `path` and save it there
    pub fn save_as(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        self.path = Some(path.into());
        self.save()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Directory containing the document file
    pub fn directory(&self) -> Result<PathBuf> {
        let path = self.path.as_ref().ok_or(Error::UnsavedDocument)?;
        Ok(match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        })
    }

    // ========================================================================
    // Objects
    // ========================================================================

    /// Create an object. The label is `name`; the internal name gets a numeric
    /// suffix if `name` is already taken.
    pub fn add_object(&mut self, kind: ObjectKind, name: &str) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        let unique = self.unique_name(name);
        self.objects.push(DocumentObject {
            id,
            name: unique,
            label: name.to_string(),
            kind,
            visible: true,
            properties: Properties::default(),
            touched: true,
        });
        id
    }

    fn unique_name(&self, base: &str) -> String {
        let taken = |name: &str| self.objects.iter().any(|o| o.name == name);
        if !taken(base) {
            return base.to_string();
        }
        (1..)
            .map(|i| format!("{}{:03}", base, i))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    fn index(&self, id: ObjectId) -> Result<usize> {
        self.objects
            .binary_search_by_key(&id, |o| o.id)
            .map_err(|_| Error::ObjectNotFound(id))
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.index(id).is_ok()
    }

    pub fn object(&self, id: ObjectId) -> Result<&DocumentObject> {
        Ok(&self.objects[self.index(id)?])
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Result<&mut DocumentObject> {
        let index = self.index(id)?;
        Ok(&mut self.objects[index])
    }

    /// All objects in creation order
    pub fn objects(&self) -> impl Iterator<Item = &DocumentObject> {
        self.objects.iter()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn find_by_name(&self, name: &str) -> Option<&DocumentObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    /// Every object carrying `label`, in creation order
    pub fn find_by_label<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a DocumentObject> {
        self.objects.iter().filter(move |o| o.label == label)
    }

    /// Groups carrying `label`, in creation order
    pub fn find_groups_by_label(&self, label: &str) -> Vec<ObjectId> {
        self.find_by_label(label)
            .filter(|o| o.is_group())
            .map(|o| o.id)
            .collect()
    }

    /// The group that currently owns `id`, if any
    pub fn owner_group(&self, id: ObjectId) -> Option<ObjectId> {
        self.objects
            .iter()
            .find(|o| o.members().contains(&id))
            .map(|o| o.id)
    }

    /// Remove one object. Links pointing at it dangle until the next recompute.
    pub fn remove_object(&mut self, id: ObjectId) -> Result<DocumentObject> {
        let index = self.index(id)?;
        let removed = self.objects.remove(index);
        for object in &mut self.objects {
            if let ObjectKind::Group { members } = &mut object.kind {
                members.retain(|m| *m != id);
            }
        }
        Ok(removed)
    }

    // ========================================================================
    // Groups
    // ========================================================================

    fn group_members_mut(&mut self, group: ObjectId) -> Result<&mut Vec<ObjectId>> {
        let object = self.object_mut(group)?;
        match &mut object.kind {
            ObjectKind::Group { members } => Ok(members),
            _ => Err(Error::NotAGroup(object.name.clone())),
        }
    }

    /// Ordered members of `group`
    pub fn members(&self, group: ObjectId) -> Result<Vec<ObjectId>> {
        let object = self.object(group)?;
        match &object.kind {
            ObjectKind::Group { members } => Ok(members.clone()),
            _ => Err(Error::NotAGroup(object.name.clone())),
        }
    }

    /// Append `member` to `group`, taking it out of any other group first
    pub fn add_to_group(&mut self, group: ObjectId, member: ObjectId) -> Result<()> {
        self.index(member)?;
        if member == group || self.is_ancestor(member, group) {
            return Err(Error::CyclicMembership(self.object(member)?.name.clone()));
        }
        self.group_members_mut(group)?;

        if let Some(previous) = self.owner_group(member) {
            self.group_members_mut(previous)?.retain(|m| *m != member);
        }
        self.group_members_mut(group)?.push(member);
        Ok(())
    }

    /// Whether `ancestor` contains `id`, directly or through nested groups
    fn is_ancestor(&self, ancestor: ObjectId, id: ObjectId) -> bool {
        let mut current = self.owner_group(id);
        let mut steps = 0;
        while let Some(group) = current {
            if group == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.objects.len() {
                break;
            }
            current = self.owner_group(group);
        }
        false
    }

    /// Delete every member of `group` from the document, descending into
    /// nested groups. Returns the number of objects removed.
    pub fn remove_group_contents(&mut self, group: ObjectId) -> Result<usize> {
        let mut removed = 0;
        for member in self.members(group)? {
            if !self.contains(member) {
                continue;
            }
            if self.object(member)?.is_group() {
                removed += self.remove_group_contents(member)?;
            }
            self.remove_object(member)?;
            removed += 1;
        }
        Ok(removed)
    }

    // ========================================================================
    // Links
    // ========================================================================

    pub fn set_link(&mut self, link: ObjectId, target: ObjectId) -> Result<()> {
        self.index(target)?;
        let object = self.object_mut(link)?;
        match &mut object.kind {
            ObjectKind::Link { target: t } => {
                *t = Some(target);
                object.touched = true;
                Ok(())
            }
            _ => Err(Error::Unresolvable(format!("{} is not a link", object.name))),
        }
    }

    // ========================================================================
    // Sub-object resolution
    // ========================================================================

    /// Keys of the members of `group` that resolve to geometry, in order.
    /// Members without geometry (meshes, empty groups, broken links) are skipped.
    pub fn resolve_sub_objects(&self, group: ObjectId) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for member in self.members(group)? {
            let object = self.object(member)?;
            if self.shape_of(member, &mut Vec::new()).is_some() {
                keys.push(format!("{}.", object.name));
            } else {
                tracing::warn!(
                    "Skipping '{}' ({}): no geometry to mesh",
                    object.label,
                    object.kind.type_name()
                );
            }
        }
        Ok(keys)
    }

    /// Resolve a sub-object key of `group` to its geometry and owning entity
    pub fn resolve_sub_object(&self, group: ObjectId, key: &str) -> Result<ResolvedSubObject> {
        let name = key.strip_suffix('.').unwrap_or(key);
        let owner = self
            .members(group)?
            .into_iter()
            .filter_map(|id| self.object(id).ok())
            .find(|o| o.name == name)
            .ok_or_else(|| Error::Unresolvable(key.to_string()))?;
        let shape = self
            .shape_of(owner.id, &mut Vec::new())
            .ok_or_else(|| Error::Unresolvable(key.to_string()))?;

        Ok(ResolvedSubObject {
            key: key.to_string(),
            owner: owner.id,
            owner_label: owner.label.clone(),
            shape,
        })
    }

    /// Geometry of `id`, following links and merging group members
    fn shape_of(&self, id: ObjectId, visiting: &mut Vec<ObjectId>) -> Option<Shape> {
        if visiting.contains(&id) {
            return None;
        }
        visiting.push(id);
        let object = self.object(id).ok()?;
        let shape = match &object.kind {
            ObjectKind::Part { shape } => Some(shape.clone()),
            ObjectKind::Link { target } => target.and_then(|t| self.shape_of(t, visiting)),
            ObjectKind::Group { members } => {
                let shapes: Vec<Shape> = members
                    .iter()
                    .filter_map(|m| self.shape_of(*m, visiting))
                    .collect();
                (!shapes.is_empty()).then(|| Shape::compound(shapes))
            }
            ObjectKind::Mesh { .. } => None,
        };
        visiting.pop();
        shape
    }

    // ========================================================================
    // View state
    // ========================================================================

    pub fn is_visible(&self, id: ObjectId) -> Result<bool> {
        Ok(self.object(id)?.visible)
    }

    pub fn set_visible(&mut self, id: ObjectId, visible: bool) -> Result<()> {
        let object = self.object_mut(id)?;
        object.visible = visible;
        object.touched = true;
        Ok(())
    }

    /// Mark the display representation of `id` as needing a refresh
    pub fn touch(&mut self, id: ObjectId) -> Result<()> {
        self.object_mut(id)?.touched = true;
        Ok(())
    }

    /// Bring dependent state up to date: drop references to deleted objects and
    /// clear pending refreshes. Returns the number of objects recomputed.
    pub fn recompute(&mut self) -> usize {
        let ids: Vec<ObjectId> = self.objects.iter().map(|o| o.id).collect();
        let exists = |id: &ObjectId| ids.binary_search(id).is_ok();

        let mut recomputed = 0;
        for object in &mut self.objects {
            match &mut object.kind {
                ObjectKind::Group { members } => {
                    let before = members.len();
                    members.retain(|m| exists(m));
                    object.touched |= members.len() != before;
                }
                ObjectKind::Link { target } => {
                    if target.is_some_and(|t| !exists(&t)) {
                        *target = None;
                        object.touched = true;
                    }
                }
                _ => {}
            }
            if object.touched {
                object.touched = false;
                recomputed += 1;
            }
        }
        tracing::debug!("Recomputed {} objects", recomputed);
        recomputed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(doc: &mut Document, label: &str) -> ObjectId {
        doc.add_object(
            ObjectKind::Part {
                shape: Shape::cuboid(1.0, 1.0, 1.0),
            },
            label,
        )
    }

    #[test]
    fn test_unique_names_keep_label() {
        let mut doc = Document::new();
        let a = part(&mut doc, "Widget");
        let b = part(&mut doc, "Widget");
        let c = part(&mut doc, "Widget");

        assert_eq!(doc.object(a).unwrap().name, "Widget");
        assert_eq!(doc.object(b).unwrap().name, "Widget001");
        assert_eq!(doc.object(c).unwrap().name, "Widget002");
        assert_eq!(doc.find_by_label("Widget").count(), 3);
    }

    #[test]
    fn test_ids_not_reused() {
        let mut doc = Document::new();
        let a = part(&mut doc, "A");
        doc.remove_object(a).unwrap();
        let b = part(&mut doc, "B");
        assert_ne!(a, b);
        assert!(matches!(doc.object(a), Err(Error::ObjectNotFound(_))));
    }

    #[test]
    fn test_add_to_group_moves_member() {
        let mut doc = Document::new();
        let g1 = doc.add_object(ObjectKind::group(), "g1");
        let g2 = doc.add_object(ObjectKind::group(), "g2");
        let p = part(&mut doc, "p");

        doc.add_to_group(g1, p).unwrap();
        doc.add_to_group(g2, p).unwrap();
        assert!(doc.members(g1).unwrap().is_empty());
        assert_eq!(doc.members(g2).unwrap(), vec![p]);
        assert_eq!(doc.owner_group(p), Some(g2));
    }

    #[test]
    fn test_add_to_group_rejects_cycles() {
        let mut doc = Document::new();
        let outer = doc.add_object(ObjectKind::group(), "outer");
        let inner = doc.add_object(ObjectKind::group(), "inner");
        doc.add_to_group(outer, inner).unwrap();

        assert!(matches!(
            doc.add_to_group(inner, outer),
            Err(Error::CyclicMembership(_))
        ));
        assert!(matches!(
            doc.add_to_group(outer, outer),
            Err(Error::CyclicMembership(_))
        ));
    }

    #[test]
    fn test_members_of_non_group() {
        let mut doc = Document::new();
        let p = part(&mut doc, "p");
        assert!(matches!(doc.members(p), Err(Error::NotAGroup(_))));
    }

    #[test]
    fn test_remove_group_contents_is_recursive() {
        let mut doc = Document::new();
        let outer = doc.add_object(ObjectKind::group(), "outer");
        let inner = doc.add_object(ObjectKind::group(), "inner");
        let a = part(&mut doc, "a");
        let b = part(&mut doc, "b");
        doc.add_to_group(outer, a).unwrap();
        doc.add_to_group(outer, inner).unwrap();
        doc.add_to_group(inner, b).unwrap();

        assert_eq!(doc.remove_group_contents(outer).unwrap(), 3);
        assert!(doc.members(outer).unwrap().is_empty());
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_resolve_through_link() {
        let mut doc = Document::new();
        let group = doc.add_object(ObjectKind::group(), "mesh_input");
        let shaft = doc.add_object(
            ObjectKind::Part {
                shape: Shape::cylinder(1.0, 5.0),
            },
            "Shaft",
        );
        let link = doc.add_object(ObjectKind::Link { target: None }, "Shaft_export");
        doc.set_link(link, shaft).unwrap();
        doc.add_to_group(group, link).unwrap();

        let keys = doc.resolve_sub_objects(group).unwrap();
        assert_eq!(keys, vec!["Shaft_export.".to_string()]);

        let resolved = doc.resolve_sub_object(group, &keys[0]).unwrap();
        assert_eq!(resolved.owner, link);
        assert_eq!(resolved.owner_label, "Shaft_export");
        assert_eq!(resolved.shape, Shape::cylinder(1.0, 5.0));
    }

    #[test]
    fn test_resolve_nested_group_as_compound() {
        let mut doc = Document::new();
        let group = doc.add_object(ObjectKind::group(), "input");
        let assembly = doc.add_object(ObjectKind::group(), "Assembly");
        let a = part(&mut doc, "a");
        let b = part(&mut doc, "b");
        doc.add_to_group(group, assembly).unwrap();
        doc.add_to_group(assembly, a).unwrap();
        doc.add_to_group(assembly, b).unwrap();

        let resolved = doc.resolve_sub_object(group, "Assembly.").unwrap();
        match resolved.shape {
            Shape::Compound { shapes } => assert_eq!(shapes.len(), 2),
            other => panic!("expected compound, got {:?}", other),
        }
    }

    #[test]
    fn test_unresolvable_members_are_skipped() {
        let mut doc = Document::new();
        let group = doc.add_object(ObjectKind::group(), "input");
        let broken = doc.add_object(ObjectKind::Link { target: None }, "broken");
        let mesh = doc.add_object(ObjectKind::Mesh { mesh: Mesh::new() }, "m");
        let p = part(&mut doc, "p");
        for id in [broken, mesh, p] {
            doc.add_to_group(group, id).unwrap();
        }

        assert_eq!(doc.resolve_sub_objects(group).unwrap(), vec!["p.".to_string()]);
        assert!(matches!(
            doc.resolve_sub_object(group, "broken."),
            Err(Error::Unresolvable(_))
        ));
        assert!(matches!(
            doc.resolve_sub_object(group, "missing."),
            Err(Error::Unresolvable(_))
        ));
    }

    #[test]
    fn test_link_cycle_does_not_resolve() {
        let mut doc = Document::new();
        let group = doc.add_object(ObjectKind::group(), "input");
        let l1 = doc.add_object(ObjectKind::Link { target: None }, "l1");
        let l2 = doc.add_object(ObjectKind::Link { target: None }, "l2");
        doc.set_link(l1, l2).unwrap();
        doc.set_link(l2, l1).unwrap();
        doc.add_to_group(group, l1).unwrap();

        assert!(doc.resolve_sub_objects(group).unwrap().is_empty());
    }

    #[test]
    fn test_recompute_prunes_dangling_links() {
        let mut doc = Document::new();
        let p = part(&mut doc, "p");
        let link = doc.add_object(ObjectKind::Link { target: None }, "l");
        doc.set_link(link, p).unwrap();
        doc.remove_object(p).unwrap();

        assert!(doc.recompute() > 0);
        assert_eq!(
            doc.object(link).unwrap().kind,
            ObjectKind::Link { target: None }
        );
        assert!(doc.objects().all(|o| !o.touched));
        assert_eq!(doc.recompute(), 0);
    }

    #[test]
    fn test_directory_requires_path() {
        let doc = Document::new();
        assert!(matches!(doc.directory(), Err(Error::UnsavedDocument)));

        let doc = Document::with_path("/tmp/project/parts.json");
        assert_eq!(doc.directory().unwrap(), PathBuf::from("/tmp/project"));

        let doc = Document::with_path("parts.json");
        assert_eq!(doc.directory().unwrap(), PathBuf::from("."));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join("batchmesh_test_document.json");
        let mut doc = Document::with_path(&path);
        let group = doc.add_object(ObjectKind::group(), "mesh_input");
        let p = part(&mut doc, "Bracket");
        doc.add_to_group(group, p).unwrap();
        doc.set_visible(group, false).unwrap();
        doc.save().unwrap();

        let loaded = Document::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.members(group).unwrap(), vec![p]);
        assert!(!loaded.is_visible(group).unwrap());
        assert_eq!(loaded.path(), Some(path.as_path()));

        // Ids keep counting after a reload
        let mut loaded = loaded;
        let q = part(&mut loaded, "Shaft");
        assert!(q > p);

        let _ = std::fs::remove_file(&path);
    }
}
