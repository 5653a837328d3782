mod distinct_vertices;
mod validate;

pub use distinct_vertices::DistinctVertices;
pub use validate::ValidateDocument;
