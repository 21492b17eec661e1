//! Import operations: sheet listing, sheet materialization, and delimited text.
pub mod catalog;
pub mod delimited;
pub mod materializer;
