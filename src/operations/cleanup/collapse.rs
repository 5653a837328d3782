use std::collections::HashSet;

use tracing::{debug, info, instrument, warn};

use crate::document::Document;
use crate::error::{OperationError, Result, TopologyError};
use crate::math::TOLERANCE;
use crate::operations::query::{DistinctVertices, ValidateDocument};
use crate::topology::{Element, ElementId, ElementKind, MeshStore, Primitive, VertexId};

/// Which elements a collapse looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollapseScope {
    /// Every element of the document.
    #[default]
    Document,
    /// Only the elements selected when the collapse starts. Triangles
    /// replacing selected quads are selected afterwards.
    Selection,
}

/// Parameters controlling a collapse.
#[derive(Debug, Clone, Copy)]
pub struct CollapseOptions {
    pub scope: CollapseScope,
    /// Refresh the external text view after a change.
    pub sync_with_editor: bool,
    /// Rewrite quads with exactly three distinct corners as triangles
    /// instead of deleting them.
    pub split_quads: bool,
    /// Tolerance of the collinearity tests.
    pub tolerance: f64,
}

impl Default for CollapseOptions {
    fn default() -> Self {
        Self {
            scope: CollapseScope::Document,
            sync_with_editor: true,
            split_quads: false,
            tolerance: TOLERANCE,
        }
    }
}

impl CollapseOptions {
    #[must_use]
    pub const fn scope(mut self, scope: CollapseScope) -> Self {
        self.scope = scope;
        self
    }

    #[must_use]
    pub const fn sync_with_editor(mut self, sync: bool) -> Self {
        self.sync_with_editor = sync;
        self
    }

    #[must_use]
    pub const fn split_quads(mut self, split: bool) -> Self {
        self.split_quads = split;
        self
    }

    #[must_use]
    pub const fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// What a collapse changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollapseReport {
    deleted: [usize; 4],
    /// Triangles inserted in place of split quads, in document order.
    pub inserted: Vec<ElementId>,
    /// Elements in scope that were skipped because they were detached.
    pub skipped_detached: usize,
}

impl CollapseReport {
    /// Number of deleted elements of `kind`. Split quads count as deleted.
    #[must_use]
    pub fn deleted(&self, kind: ElementKind) -> usize {
        self.deleted[kind_slot(kind)]
    }

    #[must_use]
    pub fn deleted_total(&self) -> usize {
        self.deleted.iter().sum()
    }

    /// Returns `true` if the document was not touched.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.deleted_total() == 0 && self.inserted.is_empty()
    }
}

fn kind_slot(kind: ElementKind) -> usize {
    match kind {
        ElementKind::Line => 0,
        ElementKind::Triangle => 1,
        ElementKind::Quad => 2,
        ElementKind::CondLine => 3,
    }
}

enum Fate {
    Keep,
    Delete,
    Replace(Element),
}

/// Classification of a whole document, computed before anything is mutated.
#[derive(Default)]
struct Plan {
    doomed: Vec<(ElementId, ElementKind)>,
    replacements: Vec<(ElementId, Element)>,
    skipped: usize,
}

/// Removes degenerate primitives from a document, or rewrites them.
///
/// Every element in scope is reduced to its distinct vertex positions:
///
/// - lines, triangles and conditional lines with fewer distinct corners
///   than their arity are deleted, as are collinear triangles;
/// - quads with three distinct corners are deleted, or with
///   [`split_quads`](CollapseOptions::split_quads) replaced by a triangle
///   over the first occurrence of each corner in slot order, inserted right
///   after the quad;
/// - quads with fewer corners, or squashed onto a line, are deleted.
///
/// The document is classified first and mutated afterwards, through the
/// user's "delete selected" path with the selection pushed aside. If the
/// batch cannot be applied, inserted triangles are removed again and the
/// selection is restored. A triangle that replaces a selected quad is
/// selected after the run.
pub struct CollapseDegenerate {
    options: CollapseOptions,
}

impl CollapseDegenerate {
    /// Creates a new `CollapseDegenerate` operation.
    #[must_use]
    pub fn new(options: CollapseOptions) -> Self {
        Self { options }
    }

    /// Executes the collapse on `doc`.
    ///
    /// The document is marked modified exactly once if anything was
    /// deleted or inserted, and left untouched otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the tolerance is not a positive finite number, or
    /// an invariant violation if the document graph is inconsistent before
    /// the run or the computed batch does not fit the store.
    #[instrument(skip_all, fields(scope = ?self.options.scope, split_quads = self.options.split_quads))]
    pub fn execute(&self, doc: &mut Document) -> Result<CollapseReport> {
        let tolerance = self.options.tolerance;
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(OperationError::InvalidInput(format!(
                "collapse tolerance must be positive, got {tolerance}"
            ))
            .into());
        }
        ValidateDocument::new().execute(doc)?;

        let plan = self.classify(doc)?;
        check_plan(doc.store(), &plan)?;
        let report = commit(doc, &plan, self.options.sync_with_editor)?;

        info!(
            deleted = report.deleted_total(),
            inserted = report.inserted.len(),
            skipped = report.skipped_detached,
            "collapse finished"
        );
        Ok(report)
    }

    fn classify(&self, doc: &Document) -> Result<Plan> {
        let store = doc.store();
        let scope = match self.options.scope {
            CollapseScope::Document => None,
            CollapseScope::Selection => Some(doc.selection().all()),
        };

        let mut plan = Plan::default();
        for kind in ElementKind::ALL {
            for (id, element) in store.elements_of(kind) {
                if scope.is_some_and(|selected| !selected.contains(&id)) {
                    continue;
                }
                if !store.links().contains(id) {
                    warn!(?id, kind = kind.name(), "skipping detached element");
                    plan.skipped += 1;
                    continue;
                }
                match self.fate(store, element)? {
                    Fate::Keep => {}
                    Fate::Delete => {
                        debug!(?id, kind = kind.name(), "degenerate element");
                        plan.doomed.push((id, kind));
                    }
                    Fate::Replace(triangle) => {
                        debug!(?id, corners = ?triangle.vertices(), "quad collapses to triangle");
                        plan.replacements.push((id, triangle));
                        plan.doomed.push((id, kind));
                    }
                }
            }
        }
        Ok(plan)
    }

    fn fate(&self, store: &MeshStore, element: &Element) -> Result<Fate> {
        let tolerance = self.options.tolerance;
        let slots = DistinctVertices::new(element.vertices());
        let distinct = slots.count(store)?;
        let kind = element.kind();

        if kind != ElementKind::Quad {
            let degenerate = distinct < kind.min_distinct()
                || (kind == ElementKind::Triangle && element.is_degenerate(store, tolerance)?);
            return Ok(if degenerate { Fate::Delete } else { Fate::Keep });
        }

        match distinct {
            4 => {
                if element.is_degenerate(store, tolerance)? {
                    Ok(Fate::Delete)
                } else {
                    Ok(Fate::Keep)
                }
            }
            3 if self.options.split_quads => {
                let corners: [VertexId; 3] = slots
                    .first_occurrences(store)?
                    .try_into()
                    .map_err(|found: Vec<VertexId>| {
                        TopologyError::Invariant(format!(
                            "quad split found {} corners, expected 3",
                            found.len()
                        ))
                    })?;
                let triangle = element.derive(Primitive::Triangle(corners));
                // A collinear replacement would be deleted on the next run.
                if triangle.is_degenerate(store, tolerance)? {
                    Ok(Fate::Delete)
                } else {
                    Ok(Fate::Replace(triangle))
                }
            }
            _ => Ok(Fate::Delete),
        }
    }
}

fn check_plan(store: &MeshStore, plan: &Plan) -> Result<()> {
    for &(id, kind) in &plan.doomed {
        let Ok(element) = store.element(id) else {
            return Err(TopologyError::Invariant(format!(
                "{id:?} is scheduled for deletion but not in the store"
            ))
            .into());
        };
        if element.kind() != kind {
            return Err(TopologyError::Invariant(format!(
                "{id:?} classified as {} but stored as {}",
                kind.name(),
                element.kind().name()
            ))
            .into());
        }
    }
    for (anchor, triangle) in &plan.replacements {
        if !store.contains_element(*anchor) {
            return Err(TopologyError::Invariant(format!(
                "replacement anchor {anchor:?} is not in the store"
            ))
            .into());
        }
        if !triangle.vertices().iter().all(|&v| store.contains_vertex(v)) {
            return Err(TopologyError::Invariant(format!(
                "replacement for {anchor:?} references a missing vertex"
            ))
            .into());
        }
    }
    Ok(())
}

fn commit(doc: &mut Document, plan: &Plan, sync: bool) -> Result<CollapseReport> {
    let mut report = CollapseReport {
        skipped_detached: plan.skipped,
        ..CollapseReport::default()
    };
    if plan.doomed.is_empty() {
        return Ok(report);
    }

    // Replacements of selected quads are selected in their place.
    let reselect: Vec<bool> = plan
        .replacements
        .iter()
        .map(|(anchor, _)| doc.selection().contains(*anchor))
        .collect();

    doc.selection_mut().backup();
    doc.selection_mut().clear();
    let applied = apply(doc, plan, &mut report);
    if applied.is_err() && !report.inserted.is_empty() {
        let inserted: HashSet<ElementId> = report.inserted.iter().copied().collect();
        if let Err(err) = doc.store_mut().batch_delete(&inserted) {
            warn!(%err, "could not roll back inserted triangles");
        }
        report.inserted.clear();
    }
    doc.selection_mut().restore()?;
    applied?;

    let selection = doc.selection_mut();
    for (&id, &selected) in report.inserted.iter().zip(&reselect) {
        if selected {
            selection.select(id, ElementKind::Triangle);
        }
    }
    doc.mark_modified(sync);
    Ok(report)
}

fn apply(doc: &mut Document, plan: &Plan, report: &mut CollapseReport) -> Result<()> {
    report.inserted = doc
        .store_mut()
        .insert_batch_after(plan.replacements.clone())?;

    let selection = doc.selection_mut();
    for &(id, kind) in &plan.doomed {
        selection.select(id, kind);
    }
    if selection.len() != plan.doomed.len() {
        return Err(TopologyError::Invariant(format!(
            "selected {} elements for deletion, expected {}",
            selection.len(),
            plan.doomed.len()
        ))
        .into());
    }
    doc.delete_selected()?;
    for &(_, kind) in &plan.doomed {
        report.deleted[kind_slot(kind)] += 1;
    }
    Ok(())
}
