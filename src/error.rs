use thiserror::Error;

/// Top-level error type for the part mesh kernel.
#[derive(Debug, Error)]
pub enum PartMeshError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Operation(#[from] OperationError),
}

/// Errors related to geometric values.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("coordinate {axis} is not finite")]
    NonFinite { axis: &'static str },
}

/// Errors related to the element/vertex graph.
///
/// `Invariant` is fatal: the document graph is inconsistent and the caller
/// must not continue mutating it.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(&'static str),

    #[error("{kind} expects {expected} vertices, got {actual}")]
    ArityMismatch {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invariant violation: {0}")]
    Invariant(String),
}

/// Errors related to editing operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl PartMeshError {
    /// Returns `true` if this error reports a broken graph invariant.
    #[must_use]
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::Topology(TopologyError::Invariant(_)))
    }
}

/// Convenience type alias for results using [`PartMeshError`].
pub type Result<T> = std::result::Result<T, PartMeshError>;
