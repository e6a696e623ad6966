use anyhow::Context;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::file::{LoadedSchema, SchemaFile};

/* Import resolver for loading schema files and walking their import graph */
pub struct ImportResolver {
    /* Canonical path -> index into `files`; also breaks import cycles */
    loaded_files: HashMap<PathBuf, usize>,

    /* Include directories for searching imports */
    include_dirs: Vec<PathBuf>,

    /* All loaded schema files, in load order */
    files: Vec<LoadedSchema>,

    /* Direct imports of each file, as indices into `files` */
    imports: Vec<Vec<usize>>,
}

impl ImportResolver {
    /* Create a new import resolver with the given include directories */
    pub fn new(include_dirs: Vec<PathBuf>) -> Self {
        Self {
            loaded_files: HashMap::new(),
            include_dirs,
            files: Vec::new(),
            imports: Vec::new(),
        }
    }

    /* Resolve an import path relative to a base file or include directories */
    fn resolve_import_path(&self, import_path: &str, base_file: &Path) -> anyhow::Result<PathBuf> {
        /* First try relative to the base file's directory */
        if let Some(parent) = base_file.parent() {
            let relative_path = parent.join(import_path);
            if relative_path.exists() {
                return Ok(relative_path.canonicalize()?);
            }
        }

        /* Then try each include directory */
        for include_dir in &self.include_dirs {
            let include_path = include_dir.join(import_path);
            if include_path.exists() {
                return Ok(include_path.canonicalize()?);
            }
        }

        anyhow::bail!(
            "Import '{}' not found relative to '{}' or in include directories",
            import_path,
            base_file.display()
        )
    }

    /* Load a schema file and recursively load its imports; returns the file's index */
    pub fn load_file_with_imports(&mut self, file_path: &Path) -> anyhow::Result<usize> {
        let canonical_path = file_path
            .canonicalize()
            .with_context(|| format!("Schema file '{}' not found", file_path.display()))?;

        if let Some(&index) = self.loaded_files.get(&canonical_path) {
            debug!(path = %file_path.display(), "skipping already loaded schema");
            return Ok(index);
        }

        debug!(path = %file_path.display(), "loading schema file");

        let contents = std::fs::read_to_string(&canonical_path)
            .with_context(|| format!("Failed to read '{}'", canonical_path.display()))?;
        let file = SchemaFile::from_yaml(&contents)
            .with_context(|| format!("Failed to parse '{}'", canonical_path.display()))?;

        /* Register before walking imports so cyclic imports terminate */
        let index = self.files.len();
        self.loaded_files.insert(canonical_path.clone(), index);
        let import_paths = file.imports().to_vec();
        self.files.push(LoadedSchema::new(canonical_path.clone(), file));
        self.imports.push(Vec::new());

        for import in &import_paths {
            let import_path = self.resolve_import_path(import, &canonical_path)?;
            let imported = self.load_file_with_imports(&import_path)?;
            if !self.imports[index].contains(&imported) {
                self.imports[index].push(imported);
            }
        }

        debug!(
            package = self.files[index].package(),
            imports = self.imports[index].len(),
            "loaded schema file"
        );

        Ok(index)
    }

    /* Add an in-memory schema under a synthetic path; imports are resolved like on-disk ones */
    pub fn add_schema(&mut self, path: impl Into<PathBuf>, file: SchemaFile) -> anyhow::Result<usize> {
        let path = path.into();
        if self.loaded_files.contains_key(&path) {
            anyhow::bail!("Schema '{}' is already loaded", path.display());
        }

        let index = self.files.len();
        self.loaded_files.insert(path.clone(), index);
        self.files.push(LoadedSchema::new(path, file));
        self.imports.push(Vec::new());
        Ok(index)
    }

    /* Link `importer` to `imported` for schemas added with `add_schema` */
    pub fn add_import(&mut self, importer: usize, imported: usize) {
        if !self.imports[importer].contains(&imported) {
            self.imports[importer].push(imported);
        }
    }

    /* Find the index of an already loaded file */
    pub fn index_of(&self, file_path: &Path) -> Option<usize> {
        if let Some(&index) = self.loaded_files.get(file_path) {
            return Some(index);
        }
        let canonical = file_path.canonicalize().ok()?;
        self.loaded_files.get(&canonical).copied()
    }

    pub fn file(&self, index: usize) -> &LoadedSchema {
        &self.files[index]
    }

    /* Get all loaded schema files */
    pub fn get_all_files(&self) -> &[LoadedSchema] {
        &self.files
    }

    /* Get the number of loaded files */
    pub fn loaded_file_count(&self) -> usize {
        self.files.len()
    }

    /* Files imported directly by `index` */
    pub fn direct_imports(&self, index: usize) -> Vec<&LoadedSchema> {
        self.imports[index].iter().map(|&i| &self.files[i]).collect()
    }

    /* The file itself followed by every transitively imported file, depth-first, distinct */
    pub fn import_closure(&self, index: usize) -> Vec<&LoadedSchema> {
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        self.collect_closure(index, &mut visited, &mut order);
        order.into_iter().map(|i| &self.files[i]).collect()
    }

    fn collect_closure(&self, index: usize, visited: &mut HashSet<usize>, order: &mut Vec<usize>) {
        if !visited.insert(index) {
            return;
        }
        order.push(index);
        for &imported in &self.imports[index] {
            self.collect_closure(imported, visited, order);
        }
    }

    /* Get all packages, in load order */
    pub fn get_packages(&self) -> Vec<String> {
        let mut packages: Vec<String> = Vec::new();
        for file in &self.files {
            if !packages.iter().any(|p| p == file.package()) {
                packages.push(file.package().to_string());
            }
        }
        packages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(package: &str) -> SchemaFile {
        SchemaFile::new(package)
    }

    #[test]
    fn closure_is_depth_first_and_distinct() {
        let mut resolver = ImportResolver::new(Vec::new());
        let root = resolver.add_schema("root", schema("root")).unwrap();
        let left = resolver.add_schema("left", schema("left")).unwrap();
        let right = resolver.add_schema("right", schema("right")).unwrap();
        let shared = resolver.add_schema("shared", schema("shared")).unwrap();

        resolver.add_import(root, left);
        resolver.add_import(root, right);
        resolver.add_import(left, shared);
        resolver.add_import(right, shared);
        resolver.add_import(shared, root);

        let closure: Vec<&str> = resolver
            .import_closure(root)
            .iter()
            .map(|s| s.package())
            .collect();
        assert_eq!(closure, vec!["root", "left", "shared", "right"]);

        let direct: Vec<&str> = resolver
            .direct_imports(root)
            .iter()
            .map(|s| s.package())
            .collect();
        assert_eq!(direct, vec!["left", "right"]);
    }

    #[test]
    fn duplicate_in_memory_schema_is_rejected() {
        let mut resolver = ImportResolver::new(Vec::new());
        resolver.add_schema("a", schema("a")).unwrap();
        assert!(resolver.add_schema("a", schema("a")).is_err());
    }
}
