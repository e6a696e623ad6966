//! Schema lowering and struct layout resolution.
//!
//! Lowers the messages and enums of a schema file into a host view and a wire
//! view, orders the host structs so that every contained struct is declared
//! before its container, factors duplicated field sets into shared parents and
//! pairs the two views of every message for cast generation.

pub mod casts;
pub mod config;
pub mod consolidate;
pub mod error;
pub mod lowered;
pub mod lowering;
pub mod naming;
pub mod order;
pub mod pipeline;
pub mod registry;
pub mod views;

pub use casts::{CastAssociation, CastAssociations};
pub use config::GeneratorConfig;
pub use consolidate::Consolidator;
pub use error::{ResolveError, Result};
pub use lowered::{
    Annotation, ContainerKind, EnumDef, Field, LoweredType, Modifiers, StructArena, StructDef,
    StructId, TypeKind, VariantAlternative,
};
pub use lowering::{Lowerer, ResolvedRpc, ResolvedService, TypePair, register_closure};
pub use order::{DependencyGraph, sort_by_inclusion};
pub use pipeline::{BatchOutcome, Declaration, ResolvedSchema, SchemaResolver, resolve_batch};
pub use registry::DualTypeRegistry;
pub use views::{DeclaringFile, NativeKind, View, ViewLowering};
