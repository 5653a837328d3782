//! Editing kernel for part models built from lines, triangles, quads and
//! conditional lines that share vertices.
//!
//! The [`topology::MeshStore`] arena owns a document's vertices and
//! elements; [`document::Document`] adds the user's selection and dirty
//! state; [`operations`] holds the edits and queries that run on them.

pub mod document;
pub mod error;
pub mod math;
pub mod operations;
pub mod selection;
pub mod topology;

pub use document::{Document, TextSync};
pub use error::{PartMeshError, Result};
pub use operations::cleanup::{collapse_degenerate_geometry, CollapseDegenerate, CollapseOptions};
