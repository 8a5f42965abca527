//! Adding selected objects to the input group

use batchmesh_core::Result;
use batchmesh_core::document::{Document, ObjectId, ObjectKind};

/// Suffix of the link created for each selected object
pub const LINK_SUFFIX: &str = "_export";

/// Batch Add is offered only while something is selected
pub fn is_available(selection: &[ObjectId]) -> bool {
    !selection.is_empty()
}

/// Create a `<label>_export` link to each selected object inside `input`.
/// Links start hidden when the input group is hidden.
pub fn add_selection_to_input(
    doc: &mut Document,
    input: ObjectId,
    selection: &[ObjectId],
) -> Result<Vec<ObjectId>> {
    let mut links = Vec::with_capacity(selection.len());
    for &selected in selection {
        let name = format!("{}{}", doc.object(selected)?.label, LINK_SUFFIX);
        let link = doc.add_object(ObjectKind::Link { target: None }, &name);
        doc.set_link(link, selected)?;
        doc.add_to_group(input, link)?;
        if !doc.is_visible(input)? {
            doc.set_visible(link, false)?;
        }
        tracing::info!("  + {} -> {}", doc.object(selected)?.label, name);
        links.push(link);
    }
    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::groups::ensure_groups;
    use batchmesh_core::shape::Shape;

    fn part(doc: &mut Document, label: &str) -> ObjectId {
        doc.add_object(
            ObjectKind::Part {
                shape: Shape::cuboid(1.0, 2.0, 3.0),
            },
            label,
        )
    }

    #[test]
    fn test_adds_links() {
        let mut doc = Document::new();
        let groups = ensure_groups(&mut doc).unwrap();
        let bracket = part(&mut doc, "Bracket");
        let shaft = part(&mut doc, "Shaft");

        let links = add_selection_to_input(&mut doc, groups.input, &[bracket, shaft]).unwrap();

        assert_eq!(doc.members(groups.input).unwrap(), links);
        let first = doc.object(links[0]).unwrap();
        assert_eq!(first.label, "Bracket_export");
        assert_eq!(first.kind, ObjectKind::Link { target: Some(bracket) });
        assert!(first.visible);
        // The selected objects themselves stay where they were
        assert_eq!(doc.owner_group(bracket), None);
    }

    #[test]
    fn test_hidden_input_hides_links() {
        let mut doc = Document::new();
        let groups = ensure_groups(&mut doc).unwrap();
        doc.set_visible(groups.input, false).unwrap();
        let bracket = part(&mut doc, "Bracket");

        let links = add_selection_to_input(&mut doc, groups.input, &[bracket]).unwrap();
        assert!(!doc.is_visible(links[0]).unwrap());
    }

    #[test]
    fn test_empty_selection() {
        let mut doc = Document::new();
        let groups = ensure_groups(&mut doc).unwrap();
        let before = doc.len();

        assert!(!is_available(&[]));
        assert!(add_selection_to_input(&mut doc, groups.input, &[]).unwrap().is_empty());
        assert_eq!(doc.len(), before);
    }

    #[test]
    fn test_links_resolve_to_selected_geometry() {
        let mut doc = Document::new();
        let groups = ensure_groups(&mut doc).unwrap();
        let bracket = part(&mut doc, "Bracket");
        add_selection_to_input(&mut doc, groups.input, &[bracket]).unwrap();

        let keys = doc.resolve_sub_objects(groups.input).unwrap();
        let resolved = doc.resolve_sub_object(groups.input, &keys[0]).unwrap();
        assert_eq!(resolved.shape, Shape::cuboid(1.0, 2.0, 3.0));
    }
}
