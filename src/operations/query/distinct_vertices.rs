use std::collections::BTreeSet;

use crate::error::Result;
use crate::topology::{MeshStore, Vertex, VertexId};

/// Reduces an element's vertex slots to the set of distinct positions.
///
/// Slots are compared by vertex value, never by ID: two IDs at the same
/// position count once.
pub struct DistinctVertices<'a> {
    slots: &'a [VertexId],
}

impl<'a> DistinctVertices<'a> {
    /// Creates a new `DistinctVertices` query over `slots`.
    #[must_use]
    pub fn new(slots: &'a [VertexId]) -> Self {
        Self { slots }
    }

    /// Returns the distinct vertex values, in vertex order.
    ///
    /// # Errors
    ///
    /// Returns an error if a slot references a vertex missing from `store`.
    pub fn execute(&self, store: &MeshStore) -> Result<BTreeSet<Vertex>> {
        self.slots
            .iter()
            .map(|&id| store.vertex(id).copied())
            .collect()
    }

    /// Returns the number of distinct positions.
    ///
    /// # Errors
    ///
    /// Returns an error if a slot references a vertex missing from `store`.
    pub fn count(&self, store: &MeshStore) -> Result<usize> {
        Ok(self.execute(store)?.len())
    }

    /// Returns, for each distinct position, the ID in the first slot that
    /// holds it, ordered by slot.
    ///
    /// This keeps the winding of the original slot order: `[A, B, C, B]`
    /// yields `[A, B, C]`.
    ///
    /// # Errors
    ///
    /// Returns an error if a slot references a vertex missing from `store`.
    pub fn first_occurrences(&self, store: &MeshStore) -> Result<Vec<VertexId>> {
        let mut remaining = self.execute(store)?;
        let mut ordered = Vec::with_capacity(remaining.len());
        for &id in self.slots {
            if remaining.remove(store.vertex(id)?) {
                ordered.push(id);
            }
        }
        Ok(ordered)
    }
}
