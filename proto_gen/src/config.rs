//! Generator configuration.

use anyhow::Context;
use serde_derive::{Deserialize, Serialize};
use std::path::Path;

/// Naming and pass settings. Every key is optional in the YAML file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", default)]
pub struct GeneratorConfig {
    /// Prefix of host-view struct names (`F` in `FGameCommon_Player`)
    pub host_struct_prefix: String,
    /// Prefix of host-view enum names
    pub host_enum_prefix: String,
    /// Prefix of host-view boolean field names (`bIsReady`)
    pub boolean_prefix: String,
    /// Suffix appended to synthesized consolidated struct names
    pub consolidated_suffix: String,
    /// Reflection category attached to host-view message fields
    pub field_category: String,
    /// Run the consolidation pass
    pub consolidate: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            host_struct_prefix: "F".to_string(),
            host_enum_prefix: "E".to_string(),
            boolean_prefix: "b".to_string(),
            consolidated_suffix: "Data".to_string(),
            field_category: "gRPC".to_string(),
            consolidate: true,
        }
    }
}

impl GeneratorConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config '{}'", path.display()))?;
        serde_yml::from_str(&contents)
            .with_context(|| format!("Failed to parse config '{}'", path.display()))
    }

    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
