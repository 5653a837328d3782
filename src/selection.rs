use std::collections::HashSet;

use crate::error::{Result, TopologyError};
use crate::topology::{ElementId, ElementKind};

/// One selection state: a unified set mirrored by one set per element kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Selected {
    all: HashSet<ElementId>,
    lines: HashSet<ElementId>,
    triangles: HashSet<ElementId>,
    quads: HashSet<ElementId>,
    cond_lines: HashSet<ElementId>,
}

impl Selected {
    fn of_kind(&self, kind: ElementKind) -> &HashSet<ElementId> {
        match kind {
            ElementKind::Line => &self.lines,
            ElementKind::Triangle => &self.triangles,
            ElementKind::Quad => &self.quads,
            ElementKind::CondLine => &self.cond_lines,
        }
    }

    fn of_kind_mut(&mut self, kind: ElementKind) -> &mut HashSet<ElementId> {
        match kind {
            ElementKind::Line => &mut self.lines,
            ElementKind::Triangle => &mut self.triangles,
            ElementKind::Quad => &mut self.quads,
            ElementKind::CondLine => &mut self.cond_lines,
        }
    }

    fn remove(&mut self, id: ElementId) -> bool {
        if !self.all.remove(&id) {
            return false;
        }
        for kind in ElementKind::ALL {
            self.of_kind_mut(kind).remove(&id);
        }
        true
    }
}

/// The elements the user currently has selected.
///
/// Batch operations that reuse the "delete selected" path push the user's
/// selection aside with [`backup`](Self::backup), fill a scratch selection,
/// and bring the original back with [`restore`](Self::restore).
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    current: Selected,
    backups: Vec<Selected>,
}

impl SelectionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `id` to the unified set and to the set for `kind`.
    pub fn select(&mut self, id: ElementId, kind: ElementKind) {
        self.current.all.insert(id);
        self.current.of_kind_mut(kind).insert(id);
    }

    /// Removes `id` from the live selection. Returns `false` if it was not selected.
    pub fn deselect(&mut self, id: ElementId) -> bool {
        self.current.remove(id)
    }

    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.current.all.contains(&id)
    }

    /// The unified set of selected elements.
    #[must_use]
    pub fn all(&self) -> &HashSet<ElementId> {
        &self.current.all
    }

    /// Selected elements of one kind.
    #[must_use]
    pub fn of_kind(&self, kind: ElementKind) -> &HashSet<ElementId> {
        self.current.of_kind(kind)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.current.all.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current.all.is_empty()
    }

    /// Clears the live selection. Snapshots are not affected.
    pub fn clear(&mut self) {
        self.current = Selected::default();
    }

    /// Pushes a copy of the live selection onto the snapshot stack.
    pub fn backup(&mut self) {
        self.backups.push(self.current.clone());
    }

    /// Replaces the live selection with the most recent snapshot.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation if there is no snapshot to restore.
    pub fn restore(&mut self) -> Result<()> {
        self.current = self.backups.pop().ok_or_else(|| {
            TopologyError::Invariant("selection restore without a backup".into())
        })?;
        Ok(())
    }

    /// Number of snapshots waiting to be restored.
    #[must_use]
    pub fn backup_depth(&self) -> usize {
        self.backups.len()
    }

    /// Removes deleted elements from the live selection and every snapshot.
    pub fn forget<'a>(&mut self, ids: impl IntoIterator<Item = &'a ElementId>) {
        for &id in ids {
            self.current.remove(id);
            for backup in &mut self.backups {
                backup.remove(id);
            }
        }
    }

    /// Returns `true` if the unified set equals the union of the per-kind sets
    /// and no element sits in two kind sets.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let per_kind: usize = ElementKind::ALL
            .iter()
            .map(|&kind| self.current.of_kind(kind).len())
            .sum();
        per_kind == self.current.all.len()
            && ElementKind::ALL.iter().all(|&kind| {
                self.current
                    .of_kind(kind)
                    .iter()
                    .all(|id| self.current.all.contains(id))
            })
            && self.current.all.iter().all(|id| {
                ElementKind::ALL
                    .iter()
                    .any(|&kind| self.current.of_kind(kind).contains(id))
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn ids(n: usize) -> Vec<ElementId> {
        let mut map: SlotMap<ElementId, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    #[test]
    fn select_mirrors_kind_set() {
        let ids = ids(2);
        let mut selection = SelectionSet::new();
        selection.select(ids[0], ElementKind::Quad);
        selection.select(ids[1], ElementKind::Line);

        assert_eq!(selection.len(), 2);
        assert!(selection.of_kind(ElementKind::Quad).contains(&ids[0]));
        assert!(selection.of_kind(ElementKind::Line).contains(&ids[1]));
        assert!(selection.of_kind(ElementKind::Triangle).is_empty());
        assert!(selection.is_consistent());

        assert!(selection.deselect(ids[0]));
        assert!(!selection.deselect(ids[0]));
        assert!(selection.of_kind(ElementKind::Quad).is_empty());
        assert!(selection.is_consistent());
    }

    #[test]
    fn backup_clear_restore() {
        let ids = ids(3);
        let mut selection = SelectionSet::new();
        selection.select(ids[0], ElementKind::Triangle);

        selection.backup();
        selection.clear();
        assert!(selection.is_empty());
        selection.select(ids[1], ElementKind::Line);
        selection.select(ids[2], ElementKind::Line);

        selection.restore().unwrap();
        assert_eq!(selection.all(), &HashSet::from([ids[0]]));
        assert_eq!(selection.backup_depth(), 0);
    }

    #[test]
    fn restore_without_backup_is_an_invariant_violation() {
        let mut selection = SelectionSet::new();
        assert!(selection.restore().unwrap_err().is_invariant_violation());
    }

    #[test]
    fn forget_reaches_into_snapshots() {
        let ids = ids(2);
        let mut selection = SelectionSet::new();
        selection.select(ids[0], ElementKind::Triangle);
        selection.select(ids[1], ElementKind::Triangle);
        selection.backup();
        selection.clear();
        selection.select(ids[0], ElementKind::Triangle);

        selection.forget(&[ids[0]]);
        assert!(selection.is_empty());
        selection.restore().unwrap();
        assert_eq!(selection.all(), &HashSet::from([ids[1]]));
        assert_eq!(
            selection.of_kind(ElementKind::Triangle),
            &HashSet::from([ids[1]])
        );
    }
}
