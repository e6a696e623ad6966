//! Schema File Loading and Import Resolution
//!
//! This crate provides functionality for loading schema files from disk,
//! resolving imports between them, and computing the transitive import
//! closure a resolver must register before lowering a file.

pub mod file;
pub mod resolver;

// Re-export commonly used types at the crate root
pub use file::{file_stem, LoadedSchema, SchemaFile, SchemaMetadata};
pub use resolver::ImportResolver;

// Re-export proto_types for convenience
pub use proto_types;
