//! Lowering of schema declarations into per-view structs, enums and RPC types.

use crate::config::GeneratorConfig;
use crate::error::{ResolveError, Result};
use crate::lowered::{Annotation, EnumDef, Field, LoweredType, StructDef, VariantAlternative};
use crate::naming::class_name;
use crate::registry::DualTypeRegistry;
use crate::views::{DeclaringFile, View, ViewLowering};
use indexmap::IndexMap;
use proto_loader::LoadedSchema;
use proto_types::{EnumDecl, MessageDecl, QualifiedName, RpcDecl, ServiceDecl, TypeReference};
use serde_derive::Serialize;
use std::collections::HashMap;
use tracing::debug;

impl DeclaringFile {
  pub fn of(schema: &LoadedSchema) -> Self {
    Self::new(schema.package(), class_name(&schema.stem()))
  }
}

/* Register both views of every declaration in `closure`; all-or-nothing */
pub fn register_closure(registry: &DualTypeRegistry, closure: &[&LoadedSchema]) -> Result<usize> {
  let mut entries = Vec::new();

  for schema in closure {
    let file = DeclaringFile::of(schema);
    for decl in schema.file.get_types() {
      let name = QualifiedName::new(schema.package(), decl.name());
      for view in View::ALL {
        entries.push((name.clone(), view, registry.lowering(view).named_type(&file, decl)));
      }
    }
  }

  let count = entries.len();
  registry.register_all(entries)?;
  Ok(count)
}

/* Lowered names of one scope must stay unique; `seen` maps each lowered name to its raw name */
fn claim_name<'n>(seen: &mut HashMap<String, &'n str>, scope: &str, raw: &'n str, lowered: &str) -> Result<()> {
  match seen.get(lowered) {
    Some(previous) => Err(ResolveError::UnsupportedSchemaConstruct(format!(
      "{scope}: '{previous}' and '{raw}' both lower to '{lowered}'"
    ))),
    None => {
      seen.insert(lowered.to_string(), raw);
      Ok(())
    }
  }
}

/// Host and wire lowering of the same schema type.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TypePair {
  pub host: LoweredType,
  pub wire: LoweredType,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRpc {
  pub name: String,
  pub request: TypePair,
  pub response: TypePair,
  pub documentation: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ResolvedService {
  pub name: String,
  pub rpcs: Vec<ResolvedRpc>,
  pub documentation: Option<String>,
}

/// Lowers declarations of one file into one view.
pub struct Lowerer<'a> {
  registry: &'a DualTypeRegistry,
  view: View,
  file: &'a DeclaringFile,
  config: &'a GeneratorConfig,
}

impl<'a> Lowerer<'a> {
  pub fn new(registry: &'a DualTypeRegistry, view: View, file: &'a DeclaringFile, config: &'a GeneratorConfig) -> Self {
    Self { registry, view, file, config }
  }

  fn lowering(&self) -> &dyn ViewLowering {
    self.registry.lowering(self.view)
  }

  /* Package-relative lookup first for bare names, literal lookup first for dotted ones */
  fn lookup_named(&self, reference: &str) -> Result<LoweredType> {
    let package = self.file.package.as_str();
    let mut candidates = vec![QualifiedName::in_package(reference, package)];
    if reference.contains('.') {
      if !package.is_empty() {
        candidates.push(QualifiedName::parse(&format!("{package}.{reference}")));
      }
    } else {
      candidates.push(QualifiedName::new("", reference));
    }

    for candidate in &candidates {
      if let Some(ty) = self.registry.try_get(candidate, self.view) {
        return Ok(ty);
      }
    }
    Err(ResolveError::UnknownTypeReference(candidates[0].to_string()))
  }

  fn lower_reference(&self, reference: &TypeReference) -> Result<LoweredType> {
    match reference {
      TypeReference::Scalar(scalar) => Ok(self.lowering().scalar(*scalar)),
      TypeReference::Map { key, value } => {
        let key = self.lowering().scalar(*key);
        let value = self.lower_reference(value)?;
        Ok(self.lowering().map_of(key, value))
      }
      TypeReference::Named(name) => self.lookup_named(name),
    }
  }

  /// Resolve a raw field or RPC type reference in this view.
  pub fn resolve(&self, raw: &str) -> Result<LoweredType> {
    let reference =
      TypeReference::parse(raw).map_err(|e| ResolveError::UnsupportedSchemaConstruct(e.to_string()))?;
    self.lower_reference(&reference)
  }

  fn own_type(&self, name: &str) -> Result<LoweredType> {
    self.registry.get(&QualifiedName::new(self.file.package.as_str(), name), self.view)
  }

  fn exposes_annotations(&self) -> bool {
    self.view == View::Host
  }

  pub fn extract_struct(&self, message: &MessageDecl) -> Result<StructDef> {
    let ty = self.own_type(&message.name)?;
    let mut fields = Vec::with_capacity(message.fields.len() + message.oneofs.len());
    let scope = format!("fields of message '{}'", message.name);
    let mut seen = HashMap::new();

    for decl in &message.fields {
      let element = self.resolve(&decl.type_ref)?;

      /* Repeated fields become arrays and never get the boolean prefix */
      let mut field = if decl.repeated {
        if element.container == Some(crate::lowered::ContainerKind::Map) {
          return Err(ResolveError::UnsupportedSchemaConstruct(format!(
            "repeated map field '{}.{}'",
            message.name, decl.name
          )));
        }
        Field::new(self.lowering().array_of(element), self.lowering().fix_field_name(&decl.name, false))
      } else {
        let is_boolean = self.lowering().is_boolean(&element);
        let name = self.lowering().fix_field_name(&decl.name, is_boolean);
        Field::new(element, name)
      };

      claim_name(&mut seen, &scope, &decl.name, &field.name)?;
      field.documentation = decl.documentation.clone().filter(|doc| !doc.is_empty());
      if self.exposes_annotations() {
        field.annotations = vec![
          Annotation::Category(self.config.field_category.clone()),
          Annotation::Transient,
          Annotation::ReadWrite,
        ];
      }
      fields.push(field);
    }

    for oneof in &message.oneofs {
      let mut alternatives = Vec::with_capacity(oneof.alternatives.len());
      let alternative_scope = format!("alternatives of oneof '{}.{}'", message.name, oneof.name);
      let mut alternative_names = HashMap::new();
      for alternative in &oneof.alternatives {
        let ty = self.resolve(&alternative.type_ref)?;
        let is_boolean = self.lowering().is_boolean(&ty);
        let name = self.lowering().fix_field_name(&alternative.name, is_boolean);
        claim_name(&mut alternative_names, &alternative_scope, &alternative.name, &name)?;
        alternatives.push(VariantAlternative { name, ty });
      }

      let variant = self.lowering().variant_of(alternatives.iter().map(|a| a.ty.clone()).collect());
      debug!(message = %message.name, oneof = %oneof.name, lowered = %variant, "lowered oneof");

      /* Variant fields are not exposed to the reflection layer */
      let mut field = Field::new(variant, self.lowering().fix_field_name(&oneof.name, false));
      claim_name(&mut seen, &scope, &oneof.name, &field.name)?;
      field.alternatives = alternatives;
      field.documentation = oneof.documentation.clone().filter(|doc| !doc.is_empty());
      fields.push(field);
    }

    let mut def = StructDef::new(ty, fields);
    def.documentation = message.documentation.clone().filter(|doc| !doc.is_empty());
    if self.exposes_annotations() {
      def.annotations = vec![
        Annotation::DisplayName(format!("{} {}", self.file.class_name, message.name)),
        Annotation::Exposed,
      ];
    }
    Ok(def)
  }

  pub fn extract_enum(&self, decl: &EnumDecl) -> Result<EnumDef> {
    let ty = self.own_type(&decl.name)?;
    let scope = format!("constants of enum '{}'", decl.name);
    let mut seen = HashMap::new();
    let mut constants: IndexMap<String, i32> = IndexMap::with_capacity(decl.constants.len());
    for constant in &decl.constants {
      let name = self.lowering().fix_field_name(&constant.name, false);
      claim_name(&mut seen, &scope, &constant.name, &name)?;
      constants.insert(name, constant.tag);
    }

    let annotations = if self.exposes_annotations() {
      vec![Annotation::Exposed, Annotation::DisplayName(format!("{} {}", self.file.class_name, decl.name))]
    } else {
      Vec::new()
    };

    Ok(EnumDef {
      ty,
      constants,
      documentation: decl.documentation.clone().filter(|doc| !doc.is_empty()),
      annotations,
    })
  }
}

fn resolve_pair(host: &Lowerer<'_>, wire: &Lowerer<'_>, raw: &str) -> Result<TypePair> {
  Ok(TypePair { host: host.resolve(raw)?, wire: wire.resolve(raw)? })
}

fn resolve_rpc(host: &Lowerer<'_>, wire: &Lowerer<'_>, rpc: &RpcDecl) -> Result<ResolvedRpc> {
  Ok(ResolvedRpc {
    name: rpc.name.clone(),
    request: resolve_pair(host, wire, &rpc.request)?,
    response: resolve_pair(host, wire, &rpc.response)?,
    documentation: rpc.documentation.clone(),
  })
}

/* Services pass through unchanged apart from resolving their request/response types */
pub fn resolve_services(
  registry: &DualTypeRegistry,
  file: &DeclaringFile,
  config: &GeneratorConfig,
  services: &[ServiceDecl],
) -> Result<Vec<ResolvedService>> {
  let host = Lowerer::new(registry, View::Host, file, config);
  let wire = Lowerer::new(registry, View::Wire, file, config);

  services
    .iter()
    .map(|service| {
      let rpcs = service.rpcs.iter().map(|rpc| resolve_rpc(&host, &wire, rpc)).collect::<Result<Vec<_>>>()?;
      Ok(ResolvedService { name: service.name.clone(), rpcs, documentation: service.documentation.clone() })
    })
    .collect()
}
