use std::collections::HashSet;

use crate::document::Document;
use crate::error::{Result, TopologyError};
use crate::topology::{ElementLink, MeshStore, VertexLinkIndex};

/// Audits the structural invariants of a document.
///
/// - document order lists every stored element exactly once;
/// - every element references vertices and a parent group that exist;
/// - every linked element exists and carries exactly the links its slots imply,
///   mirrored in the vertex-side index;
/// - every selected element exists and the selection's kind sets agree with it.
///
/// Detached elements (stored but not linked) are allowed.
#[derive(Debug, Default)]
pub struct ValidateDocument;

impl ValidateDocument {
    /// Creates a new `ValidateDocument` query.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Executes the audit.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation describing the first broken invariant.
    pub fn execute(&self, doc: &Document) -> Result<()> {
        let store = doc.store();
        check_order(store)?;
        check_references(store)?;
        check_links(store)?;
        check_selection(doc)
    }
}

fn violation(message: String) -> crate::error::PartMeshError {
    TopologyError::Invariant(message).into()
}

fn check_order(store: &MeshStore) -> Result<()> {
    let order = store.document_order();
    let unique: HashSet<_> = order.iter().collect();
    if unique.len() != order.len() {
        return Err(violation("document order lists an element twice".into()));
    }
    if order.len() != store.element_count() {
        return Err(violation(format!(
            "document order lists {} elements, store holds {}",
            order.len(),
            store.element_count()
        )));
    }
    Ok(())
}

fn check_references(store: &MeshStore) -> Result<()> {
    for (id, element) in store.elements() {
        if let Some(vertex) = element
            .vertices()
            .iter()
            .find(|&&v| !store.contains_vertex(v))
        {
            return Err(violation(format!(
                "{id:?} references missing vertex {vertex:?}"
            )));
        }
        if let Some(parent) = element.parent {
            if store.group(parent).is_err() {
                return Err(violation(format!(
                    "{id:?} belongs to missing group {parent:?}"
                )));
            }
        }
    }
    Ok(())
}

fn check_links(store: &MeshStore) -> Result<()> {
    let links = store.links();
    for (id, records) in links.iter() {
        let Ok(element) = store.element(id) else {
            return Err(violation(format!("link index holds deleted element {id:?}")));
        };
        if *records != VertexLinkIndex::expected_links(element) {
            return Err(violation(format!(
                "links of {id:?} do not match its vertex slots"
            )));
        }
        for record in records {
            let mirrored = links.elements_at(record.vertex).any(|link| {
                link == ElementLink {
                    element: id,
                    slot: record.slot,
                }
            });
            if !mirrored {
                return Err(violation(format!(
                    "slot {} of {id:?} is missing from the vertex index",
                    record.slot
                )));
            }
        }
    }
    for (vertex, users) in links.iter_vertices() {
        if !store.contains_vertex(vertex) {
            return Err(violation(format!("link index holds deleted vertex {vertex:?}")));
        }
        for user in users {
            let wired = links
                .links(user.element)
                .is_some_and(|records| records.iter().any(|r| r.vertex == vertex && r.slot == user.slot));
            if !wired {
                return Err(violation(format!(
                    "vertex {vertex:?} lists {:?} slot {} without a matching link",
                    user.element, user.slot
                )));
            }
        }
    }
    Ok(())
}

fn check_selection(doc: &Document) -> Result<()> {
    let selection = doc.selection();
    if !selection.is_consistent() {
        return Err(violation(
            "selection kind sets disagree with the unified set".into(),
        ));
    }
    for &id in selection.all() {
        let Ok(element) = doc.store().element(id) else {
            return Err(violation(format!("selection holds deleted element {id:?}")));
        };
        if !selection.of_kind(element.kind()).contains(&id) {
            return Err(violation(format!(
                "{id:?} is selected under the wrong kind"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::topology::{Element, ElementKind, Vertex};

    fn document() -> (Document, crate::topology::ElementId) {
        let mut doc = Document::new();
        let store = doc.store_mut();
        let a = store.add_vertex(Vertex::new(0.0, 0.0, 0.0).unwrap());
        let b = store.add_vertex(Vertex::new(1.0, 0.0, 0.0).unwrap());
        let c = store.add_vertex(Vertex::new(0.0, 1.0, 0.0).unwrap());
        let tri = store.add_element(Element::triangle([a, b, c])).unwrap();
        store.add_element(Element::line([a, b])).unwrap();
        (doc, tri)
    }

    #[test]
    fn fresh_document_is_valid() {
        let (doc, _) = document();
        ValidateDocument::new().execute(&doc).unwrap();
        ValidateDocument::new().execute(&Document::new()).unwrap();
    }

    #[test]
    fn detached_elements_are_allowed() {
        let (mut doc, tri) = document();
        doc.store_mut().detach(tri).unwrap();
        ValidateDocument::new().execute(&doc).unwrap();
    }

    #[test]
    fn stale_selection_is_reported() {
        let (mut doc, tri) = document();
        doc.store_mut()
            .batch_delete(&HashSet::from([tri]))
            .unwrap();
        doc.selection_mut().select(tri, ElementKind::Triangle);

        let err = ValidateDocument::new().execute(&doc).unwrap_err();
        assert!(err.is_invariant_violation());
        assert!(err.to_string().contains("selection holds deleted element"));
    }

    #[test]
    fn wrong_selection_kind_is_reported() {
        let (mut doc, tri) = document();
        doc.selection_mut().select(tri, ElementKind::Quad);

        let err = ValidateDocument::new().execute(&doc).unwrap_err();
        assert!(err.to_string().contains("wrong kind"));
    }
}
