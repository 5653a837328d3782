use std::collections::HashSet;
use std::fmt;

use tracing::{debug, instrument};

use crate::error::Result;
use crate::selection::SelectionSet;
use crate::topology::{ElementId, MeshStore};

/// Receives the document after a modification that should be mirrored
/// into an external text representation of the part.
pub trait TextSync {
    fn synchronize(&mut self, store: &MeshStore);
}

/// An open part document: its mesh, the user's selection and its dirty state.
#[derive(Default)]
pub struct Document {
    store: MeshStore,
    selection: SelectionSet,
    modified: bool,
    revision: u64,
    text_sync: Option<Box<dyn TextSync>>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("store", &self.store)
            .field("selection", &self.selection)
            .field("modified", &self.modified)
            .field("revision", &self.revision)
            .field("text_sync", &self.text_sync.is_some())
            .finish()
    }
}

impl Document {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an already populated store. The document starts unmodified.
    #[must_use]
    pub fn from_store(store: MeshStore) -> Self {
        Self {
            store,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn store(&self) -> &MeshStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut MeshStore {
        &mut self.store
    }

    #[must_use]
    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionSet {
        &mut self.selection
    }

    /// Selects an element of this document.
    ///
    /// # Errors
    ///
    /// Returns an error if the element is not in the store.
    pub fn select(&mut self, id: ElementId) -> Result<()> {
        let kind = self.store.element(id)?.kind();
        self.selection.select(id, kind);
        Ok(())
    }

    /// Installs the collaborator that mirrors edits into the text view.
    pub fn set_text_sync(&mut self, sync: Box<dyn TextSync>) {
        self.text_sync = Some(sync);
    }

    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Incremented once per [`mark_modified`](Self::mark_modified) call.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Clears the dirty flag, e.g. after the document was written out.
    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    /// Flags the document as changed. With `sync`, the text view is
    /// refreshed as well.
    pub fn mark_modified(&mut self, sync: bool) {
        self.modified = true;
        self.revision += 1;
        if sync {
            if let Some(text_sync) = self.text_sync.as_mut() {
                text_sync.synchronize(&self.store);
            }
        }
        debug!(revision = self.revision, sync, "document modified");
    }

    /// Deletes every selected element in one batch.
    ///
    /// Deleted elements disappear from the store, the link index, the live
    /// selection and any pending selection snapshot. Returns the deleted IDs
    /// in their former document order.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation if a selected element is not in the
    /// store; nothing is deleted in that case.
    #[instrument(skip(self), fields(count = self.selection.len()))]
    pub fn delete_selected(&mut self) -> Result<Vec<ElementId>> {
        let doomed: HashSet<ElementId> = self.selection.all().clone();
        let removed = self.store.batch_delete(&doomed)?;
        self.selection.forget(&removed);
        Ok(removed)
    }
}
