use crate::views::View;

/// Terminal failure of one schema file's resolution. None of these are retryable.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("unknown type reference '{0}'")]
    UnknownTypeReference(String),

    #[error("circular dependency detected: {}", .0.join(" -> "))]
    CyclicDependency(Vec<String>),

    #[error(
        "conflicting registration of '{name}' in the {view} view: registered as '{existing}', attempted '{attempted}'"
    )]
    RegistryConflict {
        name: String,
        view: View,
        existing: String,
        attempted: String,
    },

    #[error("unsupported schema construct: {0}")]
    UnsupportedSchemaConstruct(String),
}

pub type Result<T> = std::result::Result<T, ResolveError>;
