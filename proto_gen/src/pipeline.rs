//! Per-file resolution pipeline and the concurrent batch driver.

use crate::casts::CastAssociations;
use crate::config::GeneratorConfig;
use crate::consolidate::Consolidator;
use crate::error::Result;
use crate::lowered::{EnumDef, StructArena, StructDef, StructId};
use crate::lowering::{Lowerer, ResolvedService, register_closure, resolve_services};
use crate::order::{DependencyGraph, sort_by_inclusion};
use crate::registry::DualTypeRegistry;
use crate::views::{DeclaringFile, View};
use proto_loader::{ImportResolver, LoadedSchema};
use proto_types::{QualifiedName, TypeDecl};
use rayon::prelude::*;
use serde_derive::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};

/// Everything an emitter needs for one schema file.
#[derive(Serialize, Debug, Clone)]
pub struct ResolvedSchema {
    pub package: String,
    pub class_name: String,
    pub source: PathBuf,
    pub arena: StructArena,
    /// Host enums in declaration order.
    pub enums: Vec<EnumDef>,
    /// Host structs in final declaration order, consolidated parents included.
    pub structs: Vec<StructId>,
    pub consolidated: Vec<StructId>,
    pub casts: CastAssociations,
    pub services: Vec<ResolvedService>,
    /// Direct imports, for include lists.
    pub imports: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy)]
pub enum Declaration<'a> {
    Enum(&'a EnumDef),
    Struct(&'a StructDef),
}

impl Declaration<'_> {
    pub fn name(&self) -> String {
        match self {
            Declaration::Enum(def) => def.ty.to_string(),
            Declaration::Struct(def) => def.ty.to_string(),
        }
    }
}

impl ResolvedSchema {
    pub fn ordered_structs(&self) -> impl Iterator<Item = &StructDef> {
        self.structs.iter().map(|id| &self.arena[*id])
    }

    /// Emission order: enums first, then structs. Enums depend on nothing.
    pub fn declarations(&self) -> Vec<Declaration<'_>> {
        self.enums
            .iter()
            .map(Declaration::Enum)
            .chain(self.ordered_structs().map(Declaration::Struct))
            .collect()
    }

    pub fn uses_variant_fields(&self) -> bool {
        self.ordered_structs()
            .any(|def| def.fields.iter().any(|field| field.is_variant()))
    }

    pub fn dependency_graph(&self) -> DependencyGraph {
        DependencyGraph::build(&self.arena, &self.structs)
    }
}

pub struct SchemaResolver<'a> {
    registry: &'a DualTypeRegistry,
    config: &'a GeneratorConfig,
}

impl<'a> SchemaResolver<'a> {
    pub fn new(registry: &'a DualTypeRegistry, config: &'a GeneratorConfig) -> Self {
        Self { registry, config }
    }

    /// Register both views of every type in the import closure of `index`.
    pub fn register_imports(&self, imports: &ImportResolver, index: usize) -> Result<usize> {
        register_closure(self.registry, &imports.import_closure(index))
    }

    /// Register then resolve one loaded file.
    pub fn resolve(&self, imports: &ImportResolver, index: usize) -> Result<ResolvedSchema> {
        self.register_imports(imports, index)?;
        self.resolve_registered(imports, index)
    }

    /* Extraction only; every referenced type must already be registered */
    fn resolve_registered(&self, imports: &ImportResolver, index: usize) -> Result<ResolvedSchema> {
        let direct = imports
            .direct_imports(index)
            .into_iter()
            .map(|schema| schema.path.clone())
            .collect();
        self.resolve_file(imports.file(index), direct)
    }

    pub fn resolve_file(&self, schema: &LoadedSchema, imports: Vec<PathBuf>) -> Result<ResolvedSchema> {
        let file = DeclaringFile::of(schema);
        let host = Lowerer::new(self.registry, View::Host, &file, self.config);
        let wire = Lowerer::new(self.registry, View::Wire, &file, self.config);

        let mut arena = StructArena::new();
        let mut structs = Vec::new();
        let mut enums = Vec::new();
        let mut casts = CastAssociations::new();

        for decl in schema.file.get_types() {
            match decl {
                TypeDecl::Message(message) => {
                    let host_struct = host.extract_struct(message)?;
                    let wire_struct = wire.extract_struct(message)?;
                    let id = arena.alloc(host_struct);
                    structs.push(id);
                    casts.push(QualifiedName::new(schema.package(), message.name.as_str()), wire_struct, id);
                }
                TypeDecl::Enum(decl) => enums.push(host.extract_enum(decl)?),
            }
        }

        sort_by_inclusion(&arena, &mut structs)?;

        let consolidated = if self.config.consolidate {
            let created = Consolidator::new(self.config, &file.class_name).consolidate(&mut arena, &mut structs);
            sort_by_inclusion(&arena, &mut structs)?;
            created
        } else {
            Vec::new()
        };
        casts.align_to(&structs);

        let services = resolve_services(self.registry, &file, self.config, schema.file.services())?;

        debug!(
            order = ?structs.iter().map(|id| arena[*id].ty.to_string()).collect::<Vec<_>>(),
            "final struct order"
        );
        info!(
            file = %schema.path.display(),
            structs = structs.len(),
            enums = enums.len(),
            consolidated = consolidated.len(),
            "resolved schema"
        );

        Ok(ResolvedSchema {
            package: schema.package().to_string(),
            class_name: file.class_name,
            source: schema.path.clone(),
            arena,
            enums,
            structs,
            consolidated,
            casts,
            services,
            imports,
        })
    }
}

/// Per-file results of a batch, in target order.
#[derive(Debug)]
pub struct BatchOutcome {
    pub results: Vec<(PathBuf, Result<ResolvedSchema>)>,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> impl Iterator<Item = &ResolvedSchema> {
        self.results.iter().filter_map(|(_, result)| result.as_ref().ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = (&PathBuf, &crate::error::ResolveError)> {
        self.results
            .iter()
            .filter_map(|(path, result)| result.as_ref().err().map(|err| (path, err)))
    }

    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }
}

/// Resolve several loaded files against one registry.
///
/// Registration runs first on the calling thread; a conflict there aborts the
/// batch. Extraction then runs in parallel and only reads the registry.
pub fn resolve_batch(
    registry: &DualTypeRegistry,
    imports: &ImportResolver,
    targets: &[usize],
    config: &GeneratorConfig,
) -> Result<BatchOutcome> {
    let resolver = SchemaResolver::new(registry, config);
    for index in targets {
        resolver.register_imports(imports, *index)?;
    }

    let results = targets
        .par_iter()
        .map(|index| {
            let path = imports.file(*index).path.clone();
            (path, resolver.resolve_registered(imports, *index))
        })
        .collect();

    Ok(BatchOutcome { results })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolveError;
    use assert_matches::assert_matches;
    use proto_loader::SchemaFile;

    fn load(yaml: &str, path: &str) -> (ImportResolver, usize) {
        let mut imports = ImportResolver::new(vec![]);
        let index = imports.add_schema(path, SchemaFile::from_yaml(yaml).unwrap()).unwrap();
        (imports, index)
    }

    const SHAPES: &str = r#"
schema:
  package: shapes
types:
  - message:
      name: Shape
      fields:
        - { name: origin, type: Point }
        - { name: label, type: Kind }
      oneofs:
        - name: extent
          alternatives:
            - { name: radius, type: float }
            - { name: corner, type: Point }
  - message:
      name: Point
      fields:
        - { name: x, type: float }
        - { name: y, type: float }
  - message:
      name: Offset
      fields:
        - { name: x, type: float }
        - { name: y, type: float }
  - enum:
      name: Kind
      constants:
        - { name: circle, tag: 0 }
        - { name: box, tag: 1 }
"#;

    #[test]
    fn resolves_orders_and_consolidates() {
        let (imports, index) = load(SHAPES, "/virtual/shapes.schema.yaml");
        let registry = DualTypeRegistry::default();
        let config = GeneratorConfig::default();

        let resolved = SchemaResolver::new(&registry, &config).resolve(&imports, index).unwrap();

        let order: Vec<String> = resolved.ordered_structs().map(|def| def.ty.name.clone()).collect();
        assert_eq!(order, vec!["FXYData", "FShapes_Point", "FShapes_Shape", "FShapes_Offset"]);
        assert_eq!(resolved.consolidated.len(), 1);
        assert!(resolved.uses_variant_fields());

        let decls: Vec<String> = resolved.declarations().iter().map(|d| d.name()).collect();
        assert_eq!(decls[0], "EShapes_Kind");

        let casts: Vec<&str> = resolved.casts.iter().map(|pair| pair.key.name.as_str()).collect();
        assert_eq!(casts, vec!["Point", "Shape", "Offset"]);
        for pair in &resolved.casts {
            assert_eq!(pair.wire.ty.namespace, vec!["shapes".to_string()]);
            assert_eq!(pair.wire.ty.name, pair.key.name);
        }
    }

    #[test]
    fn consolidation_can_be_disabled() {
        let (imports, index) = load(SHAPES, "/virtual/shapes.schema.yaml");
        let registry = DualTypeRegistry::default();
        let config = GeneratorConfig {
            consolidate: false,
            ..Default::default()
        };

        let resolved = SchemaResolver::new(&registry, &config).resolve(&imports, index).unwrap();
        assert!(resolved.consolidated.is_empty());
        assert!(resolved.ordered_structs().all(|def| def.parent.is_none()));
    }

    #[test]
    fn unknown_reference_fails_the_file() {
        let yaml = r#"
schema:
  package: broken
types:
  - message:
      name: Holder
      fields:
        - { name: thing, type: Missing }
"#;
        let (imports, index) = load(yaml, "/virtual/broken.schema.yaml");
        let registry = DualTypeRegistry::default();
        let config = GeneratorConfig::default();

        let err = SchemaResolver::new(&registry, &config).resolve(&imports, index).unwrap_err();
        assert_eq!(err, ResolveError::UnknownTypeReference("broken.Missing".to_string()));
    }

    #[test]
    fn batch_keeps_going_past_failed_files() {
        let mut imports = ImportResolver::new(vec![]);
        let good = imports
            .add_schema("/virtual/shapes.schema.yaml", SchemaFile::from_yaml(SHAPES).unwrap())
            .unwrap();
        let cyclic = SchemaFile::from_yaml(
            r#"
schema:
  package: loop
types:
  - message:
      name: Node
      fields:
        - { name: next, type: Node }
"#,
        )
        .unwrap();
        let bad = imports.add_schema("/virtual/loop.schema.yaml", cyclic).unwrap();

        let registry = DualTypeRegistry::default();
        let outcome = resolve_batch(&registry, &imports, &[good, bad], &GeneratorConfig::default()).unwrap();

        assert!(!outcome.is_success());
        assert_eq!(outcome.succeeded().count(), 1);
        let (path, err) = outcome.failed().next().unwrap();
        assert_eq!(path, &PathBuf::from("/virtual/loop.schema.yaml"));
        assert_matches!(err, ResolveError::CyclicDependency(members) if members == &vec!["FLoop_Node".to_string()]);
    }
}
