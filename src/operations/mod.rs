pub mod cleanup;
pub mod query;
