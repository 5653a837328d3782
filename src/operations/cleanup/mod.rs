mod collapse;

pub use collapse::{CollapseDegenerate, CollapseOptions, CollapseReport, CollapseScope};

use crate::document::Document;
use crate::error::Result;

/// Collapses degenerate primitives across the whole document.
///
/// Shorthand for [`CollapseDegenerate`] with document scope.
///
/// # Errors
///
/// Returns an invariant violation if the document graph is inconsistent;
/// the document is left unchanged in that case.
pub fn collapse_degenerate_geometry(
    doc: &mut Document,
    sync_with_external_editor: bool,
    convert_quads_to_triangles: bool,
) -> Result<()> {
    let options = CollapseOptions::default()
        .sync_with_editor(sync_with_external_editor)
        .split_quads(convert_quads_to_triangles);
    CollapseDegenerate::new(options).execute(doc)?;
    Ok(())
}
