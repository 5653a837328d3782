use std::collections::HashSet;

use slotmap::SecondaryMap;

use super::element::{Element, ElementId};
use super::vertex::VertexId;

/// What a vertex slot of an element is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotRole {
    /// A vertex the primitive is drawn through.
    Drawn(u8),
    /// A control point of a conditional line.
    Control(u8),
}

/// One slot of an element wired to a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexLink {
    pub vertex: VertexId,
    pub slot: u8,
    pub role: SlotRole,
}

/// The reverse of a [`VertexLink`]: an element slot pointing at a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementLink {
    pub element: ElementId,
    pub slot: u8,
}

/// Wiring between elements and the vertices their slots reference.
///
/// An element present here is live. Elements that were detached by an edit
/// in progress are absent even though they may still sit in the store.
/// Only [`MeshStore`](super::MeshStore) mutates the index.
#[derive(Debug, Clone, Default)]
pub struct VertexLinkIndex {
    by_element: SecondaryMap<ElementId, HashSet<VertexLink>>,
    by_vertex: SecondaryMap<VertexId, HashSet<ElementLink>>,
}

impl VertexLinkIndex {
    /// The link records that `element` stored under `id` should have.
    #[must_use]
    pub fn expected_links(element: &Element) -> HashSet<VertexLink> {
        let kind = element.kind();
        (0u8..)
            .zip(element.vertices())
            .map(|(slot, &vertex)| VertexLink {
                vertex,
                slot,
                role: kind.slot_role(slot),
            })
            .collect()
    }

    pub(super) fn link(&mut self, id: ElementId, element: &Element) {
        let links = Self::expected_links(element);
        for link in &links {
            if let Some(entry) = self.by_vertex.entry(link.vertex) {
                entry.or_default().insert(ElementLink {
                    element: id,
                    slot: link.slot,
                });
            }
        }
        self.by_element.insert(id, links);
    }

    /// Removes every link of `id`. Returns `false` if it was not linked.
    pub(super) fn unlink(&mut self, id: ElementId) -> bool {
        let Some(links) = self.by_element.remove(id) else {
            return false;
        };
        for link in links {
            let now_empty = self.by_vertex.get_mut(link.vertex).is_some_and(|users| {
                users.remove(&ElementLink {
                    element: id,
                    slot: link.slot,
                });
                users.is_empty()
            });
            if now_empty {
                self.by_vertex.remove(link.vertex);
            }
        }
        true
    }

    /// Returns `true` if `id` is wired into the live graph.
    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.by_element.contains_key(id)
    }

    #[must_use]
    pub fn links(&self, id: ElementId) -> Option<&HashSet<VertexLink>> {
        self.by_element.get(id)
    }

    /// Element slots currently wired to `vertex`.
    pub fn elements_at(&self, vertex: VertexId) -> impl Iterator<Item = ElementLink> + '_ {
        self.by_vertex.get(vertex).into_iter().flatten().copied()
    }

    #[must_use]
    pub fn is_vertex_linked(&self, vertex: VertexId) -> bool {
        self.by_vertex.contains_key(vertex)
    }

    /// Iterates live elements with their link records.
    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &HashSet<VertexLink>)> {
        self.by_element.iter()
    }

    /// Iterates linked vertices with the element slots that reference them.
    pub fn iter_vertices(&self) -> impl Iterator<Item = (VertexId, &HashSet<ElementLink>)> {
        self.by_vertex.iter()
    }

    /// Number of live elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_element.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_element.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::topology::{MeshStore, Vertex};

    #[test]
    fn store_insert_links_every_slot() {
        let mut store = MeshStore::new();
        let a = store.add_vertex(Vertex::new(0.0, 0.0, 0.0).unwrap());
        let b = store.add_vertex(Vertex::new(1.0, 0.0, 0.0).unwrap());
        let c = store.add_vertex(Vertex::new(0.0, 1.0, 0.0).unwrap());
        let d = store.add_vertex(Vertex::new(0.0, 0.0, 1.0).unwrap());
        let id = store.add_element(Element::cond_line([a, b], [c, d])).unwrap();

        let links = store.links().links(id).unwrap();
        assert_eq!(links.len(), 4);
        assert!(links.contains(&VertexLink {
            vertex: d,
            slot: 3,
            role: SlotRole::Control(1),
        }));
        assert_eq!(
            store.links().elements_at(c).collect::<Vec<_>>(),
            vec![ElementLink { element: id, slot: 2 }]
        );
    }

    #[test]
    fn repeated_vertex_keeps_one_link_per_slot() {
        let mut store = MeshStore::new();
        let a = store.add_vertex(Vertex::new(0.0, 0.0, 0.0).unwrap());
        let id = store.add_element(Element::line([a, a])).unwrap();

        assert_eq!(store.links().links(id).unwrap().len(), 2);
        assert_eq!(store.links().elements_at(a).count(), 2);
    }

    #[test]
    fn unlink_drops_reverse_entries() {
        let mut store = MeshStore::new();
        let a = store.add_vertex(Vertex::new(0.0, 0.0, 0.0).unwrap());
        let b = store.add_vertex(Vertex::new(1.0, 0.0, 0.0).unwrap());
        let first = store.add_element(Element::line([a, b])).unwrap();
        let second = store.add_element(Element::line([b, a])).unwrap();

        store.detach(first).unwrap();
        assert!(!store.links().contains(first));
        assert!(store.links().contains(second));
        assert_eq!(store.links().elements_at(a).count(), 1);

        store.detach(second).unwrap();
        assert!(store.links().is_empty());
        assert!(!store.links().is_vertex_linked(a));
    }
}
