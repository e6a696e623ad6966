use proto_types::{ServiceDecl, TypeDecl};
use serde_derive::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/* Metadata block at the top of every schema file */
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct SchemaMetadata {
    /* Dotted package name (e.g., "game.common"); may be empty */
    #[serde(default)]
    pub package: String,

    /* Paths of imported schema files, relative to this file or an include dir */
    #[serde(default)]
    pub imports: Vec<String>,

    /* Free-form file description */
    #[serde(default)]
    pub description: Option<String>,
}

/* Complete parsed schema file: metadata, type declarations and services */
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct SchemaFile {
    /* Schema file metadata */
    pub schema: SchemaMetadata,

    /* Type declarations in source order */
    #[serde(default, with = "serde_yml::with::singleton_map_recursive")]
    pub types: Vec<TypeDecl>,

    /* Service declarations in source order */
    #[serde(default)]
    pub services: Vec<ServiceDecl>,
}

impl SchemaFile {
    /* Create an empty schema file for the given package */
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            schema: SchemaMetadata {
                package: package.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /* Parse a schema file from YAML text */
    pub fn from_yaml(contents: &str) -> anyhow::Result<Self> {
        Ok(serde_yml::from_str(contents)?)
    }

    /* Add a type declaration to this file */
    pub fn add_type(&mut self, decl: TypeDecl) {
        self.types.push(decl);
    }

    /* Get the package identifier */
    pub fn package(&self) -> &str {
        &self.schema.package
    }

    /* Get the imports */
    pub fn imports(&self) -> &[String] {
        &self.schema.imports
    }

    /* Get all type declarations */
    pub fn get_types(&self) -> &[TypeDecl] {
        &self.types
    }

    /* Get all services */
    pub fn services(&self) -> &[ServiceDecl] {
        &self.services
    }
}

/* A schema file together with the canonical path it was loaded from */
#[derive(Debug, Clone)]
pub struct LoadedSchema {
    pub path: PathBuf,
    pub file: SchemaFile,
}

impl LoadedSchema {
    pub fn new(path: impl Into<PathBuf>, file: SchemaFile) -> Self {
        Self {
            path: path.into(),
            file,
        }
    }

    /* File name up to its first '.', e.g. "game_common" for "game_common.schema.yaml" */
    pub fn stem(&self) -> String {
        file_stem(&self.path)
    }

    pub fn package(&self) -> &str {
        self.file.package()
    }
}

pub fn file_stem(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.split('.').next())
        .unwrap_or_default()
        .to_string()
}
