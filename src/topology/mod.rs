pub mod element;
pub mod link;
pub mod vertex;

pub use element::{Color, Element, ElementId, ElementKind, GroupData, GroupId, Primitive};
pub use link::{ElementLink, SlotRole, VertexLink, VertexLinkIndex};
pub use vertex::{Vertex, VertexId};

use std::collections::HashSet;

use slotmap::{SecondaryMap, SlotMap};
use tracing::{debug, instrument};

use crate::error::{Result, TopologyError};

/// Central arena that owns a part document's vertices, elements and groups.
///
/// Elements reference vertices via typed IDs, so many elements can share one
/// vertex and two IDs can still resolve to the same position. The store keeps
/// the elements in document order and maintains the [`VertexLinkIndex`] on
/// every insertion and deletion.
#[derive(Debug, Default)]
pub struct MeshStore {
    vertices: SlotMap<VertexId, Vertex>,
    elements: SlotMap<ElementId, Element>,
    groups: SlotMap<GroupId, GroupData>,
    order: Vec<ElementId>,
    /// Number of element slots referencing each vertex, live or detached.
    vertex_refs: SecondaryMap<VertexId, usize>,
    links: VertexLinkIndex,
}

impl MeshStore {
    /// Creates a new, empty mesh store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Vertex operations ---

    /// Inserts a vertex and returns its ID.
    pub fn add_vertex(&mut self, vertex: Vertex) -> VertexId {
        self.vertices.insert(vertex)
    }

    /// Returns the vertex stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex is not in the store.
    pub fn vertex(&self, id: VertexId) -> Result<&Vertex> {
        self.vertices
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex").into())
    }

    #[must_use]
    pub fn contains_vertex(&self, id: VertexId) -> bool {
        self.vertices.contains_key(id)
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Resolves the vertex values behind an element's slots, in slot order.
    ///
    /// # Errors
    ///
    /// Returns an error if the element or one of its vertices is missing.
    pub fn positions(&self, id: ElementId) -> Result<Vec<Vertex>> {
        self.element(id)?
            .vertices()
            .iter()
            .map(|&v| self.vertex(v).copied())
            .collect()
    }

    // --- Group operations ---

    /// Inserts a parent group and returns its ID.
    pub fn add_group(&mut self, data: GroupData) -> GroupId {
        self.groups.insert(data)
    }

    /// Returns the group stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the group is not in the store.
    pub fn group(&self, id: GroupId) -> Result<&GroupData> {
        self.groups
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("group").into())
    }

    // --- Element operations ---

    /// Appends an element at the end of the document.
    ///
    /// # Errors
    ///
    /// Returns an error if the element references a vertex or group that is
    /// not in the store.
    pub fn add_element(&mut self, element: Element) -> Result<ElementId> {
        self.check_references(&element)?;
        let id = self.attach(element);
        self.order.push(id);
        Ok(id)
    }

    /// Inserts `element` immediately after `anchor` in document order.
    ///
    /// # Errors
    ///
    /// Returns an error if `anchor` is not in the store, or the element
    /// references a vertex or group that is not in the store.
    #[instrument(skip(self, element), fields(kind = element.kind().name()))]
    pub fn insert_after(&mut self, anchor: ElementId, element: Element) -> Result<ElementId> {
        self.check_references(&element)?;
        let position = self
            .order
            .iter()
            .position(|&e| e == anchor)
            .ok_or(TopologyError::EntityNotFound("anchor element"))?;
        let id = self.attach(element);
        self.order.insert(position + 1, id);
        debug!(?id, "inserted element after anchor");
        Ok(id)
    }

    /// Inserts each element immediately after its anchor, in one pass over
    /// the document order.
    ///
    /// Elements sharing an anchor follow it in input order. The whole batch
    /// is checked first: on error nothing is inserted. Returns the new IDs
    /// in input order.
    ///
    /// # Errors
    ///
    /// Returns an error if an anchor is not in the store, or an element
    /// references a vertex or group that is not in the store.
    #[instrument(skip_all, fields(count = inserts.len()))]
    pub fn insert_batch_after(
        &mut self,
        inserts: Vec<(ElementId, Element)>,
    ) -> Result<Vec<ElementId>> {
        for (anchor, element) in &inserts {
            if !self.elements.contains_key(*anchor) {
                return Err(TopologyError::EntityNotFound("anchor element").into());
            }
            self.check_references(element)?;
        }
        if inserts.is_empty() {
            return Ok(Vec::new());
        }

        let mut followers: SecondaryMap<ElementId, Vec<ElementId>> = SecondaryMap::new();
        let mut inserted = Vec::with_capacity(inserts.len());
        for (anchor, element) in inserts {
            let id = self.attach(element);
            if let Some(entry) = followers.entry(anchor) {
                entry.or_default().push(id);
            }
            inserted.push(id);
        }

        let mut order = Vec::with_capacity(self.order.len() + inserted.len());
        for &id in &self.order {
            order.push(id);
            if let Some(after) = followers.get(id) {
                order.extend_from_slice(after);
            }
        }
        self.order = order;
        debug!(inserted = inserted.len(), "inserted elements after anchors");
        Ok(inserted)
    }

    /// Returns the element stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the element is not in the store.
    pub fn element(&self, id: ElementId) -> Result<&Element> {
        self.elements
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("element").into())
    }

    #[must_use]
    pub fn contains_element(&self, id: ElementId) -> bool {
        self.elements.contains_key(id)
    }

    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Element IDs in document order.
    #[must_use]
    pub fn document_order(&self) -> &[ElementId] {
        &self.order
    }

    /// Iterates all elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = (ElementId, &Element)> {
        self.order
            .iter()
            .filter_map(|&id| self.elements.get(id).map(|e| (id, e)))
    }

    /// Iterates the elements of one kind in document order.
    pub fn elements_of(&self, kind: ElementKind) -> impl Iterator<Item = (ElementId, &Element)> {
        self.elements().filter(move |(_, e)| e.kind() == kind)
    }

    /// Number of elements of `kind`.
    #[must_use]
    pub fn count_of(&self, kind: ElementKind) -> usize {
        self.elements.values().filter(|e| e.kind() == kind).count()
    }

    /// The link index maintained by this store.
    #[must_use]
    pub fn links(&self) -> &VertexLinkIndex {
        &self.links
    }

    /// Unwires an element from the link index but keeps it in the document.
    ///
    /// Multi-step edits detach elements they are about to replace; batch
    /// operations skip detached elements.
    ///
    /// # Errors
    ///
    /// Returns an error if the element is not in the store.
    pub fn detach(&mut self, id: ElementId) -> Result<()> {
        if !self.elements.contains_key(id) {
            return Err(TopologyError::EntityNotFound("element").into());
        }
        self.links.unlink(id);
        Ok(())
    }

    /// Deletes a set of elements in one step.
    ///
    /// The whole batch is checked before anything is removed: if any ID is
    /// not in the store, the store is left untouched. Vertices that are no
    /// longer referenced by any element are reclaimed. Returns the deleted
    /// IDs in their former document order.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation if an element of the batch is missing.
    #[instrument(skip_all, fields(count = ids.len()))]
    pub fn batch_delete(&mut self, ids: &HashSet<ElementId>) -> Result<Vec<ElementId>> {
        if let Some(missing) = ids.iter().find(|&&id| !self.elements.contains_key(id)) {
            return Err(TopologyError::Invariant(format!(
                "batch delete of {missing:?}, which is not in the store"
            ))
            .into());
        }

        let (removed, kept): (Vec<_>, Vec<_>) =
            self.order.iter().copied().partition(|id| ids.contains(id));
        self.order = kept;

        let mut reclaimed = 0usize;
        for &id in &removed {
            self.links.unlink(id);
            let Some(element) = self.elements.remove(id) else {
                continue;
            };
            for &vertex in element.vertices() {
                if self.release_vertex(vertex) {
                    reclaimed += 1;
                }
            }
        }
        debug!(deleted = removed.len(), reclaimed, "batch delete committed");
        Ok(removed)
    }

    fn check_references(&self, element: &Element) -> Result<()> {
        if let Some(&missing) = element
            .vertices()
            .iter()
            .find(|&&v| !self.vertices.contains_key(v))
        {
            return Err(TopologyError::Invariant(format!(
                "{} references missing vertex {missing:?}",
                element.kind().name()
            ))
            .into());
        }
        if let Some(parent) = element.parent {
            self.group(parent)?;
        }
        Ok(())
    }

    fn attach(&mut self, element: Element) -> ElementId {
        for &vertex in element.vertices() {
            if let Some(entry) = self.vertex_refs.entry(vertex) {
                *entry.or_insert(0) += 1;
            }
        }
        let id = self.elements.insert(element);
        if let Some(element) = self.elements.get(id) {
            self.links.link(id, element);
        }
        id
    }

    /// Drops one reference to `vertex`; removes it once nothing uses it.
    fn release_vertex(&mut self, vertex: VertexId) -> bool {
        let Some(count) = self.vertex_refs.get_mut(vertex) else {
            return false;
        };
        *count = count.saturating_sub(1);
        if *count > 0 {
            return false;
        }
        self.vertex_refs.remove(vertex);
        self.vertices.remove(vertex).is_some()
    }
}
