//! Schema Type Definitions
//!
//! This crate contains the parsed interface-definition schema model consumed
//! by the resolver: messages, enums, oneof groups, services and type
//! references. It is pure data, without any file I/O or lowering logic.

pub mod reference;
pub mod types;

// Re-export commonly used types at the crate root
pub use reference::*;
pub use types::*;
