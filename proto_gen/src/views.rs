//! View-specific lowering policies.
//!
//! Each message is lowered twice: once for the host runtime that exposes the
//! generated declarations to its reflection layer, once for the wire/protocol
//! classes. A `ViewLowering` decides how primitives, containers, named types
//! and field names are spelled in its view.

use crate::config::GeneratorConfig;
use crate::lowered::{ContainerKind, LoweredType, TypeKind};
use crate::naming::snake_case_to_camel_case;
use proto_types::{ScalarType, TypeDecl};
use serde_derive::Serialize;
use std::fmt;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum View {
  Host,
  Wire,
}

impl View {
  pub const ALL: [View; 2] = [View::Host, View::Wire];
}

impl fmt::Display for View {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      View::Host => write!(f, "host"),
      View::Wire => write!(f, "wire"),
    }
  }
}

/// Built-in types every view can spell without a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeKind {
  Void,
  Bool,
  Int32,
  Int64,
  UInt32,
  UInt64,
  Float,
  Double,
}

/// The file a declaration comes from, as far as naming is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaringFile {
  pub package: String,
  pub class_name: String,
}

impl DeclaringFile {
  pub fn new(package: impl Into<String>, class_name: impl Into<String>) -> Self {
    Self { package: package.into(), class_name: class_name.into() }
  }
}

pub trait ViewLowering: Send + Sync {
  fn view(&self) -> View;

  fn native(&self, kind: NativeKind) -> LoweredType;

  fn scalar(&self, scalar: ScalarType) -> LoweredType;

  fn array_of(&self, element: LoweredType) -> LoweredType;

  fn map_of(&self, key: LoweredType, value: LoweredType) -> LoweredType;

  fn variant_of(&self, alternatives: Vec<LoweredType>) -> LoweredType;

  /// Pure and total: the same input always yields the same name.
  fn fix_field_name(&self, raw: &str, is_boolean: bool) -> String;

  fn named_type(&self, file: &DeclaringFile, decl: &TypeDecl) -> LoweredType;

  fn is_boolean(&self, ty: &LoweredType) -> bool {
    *ty == self.native(NativeKind::Bool)
  }
}

/* Numeric scalars share the native spelling in both views */
fn scalar_native(scalar: ScalarType) -> Option<NativeKind> {
  match scalar {
    ScalarType::Double => Some(NativeKind::Double),
    ScalarType::Float => Some(NativeKind::Float),
    ScalarType::Int32 | ScalarType::Sint32 | ScalarType::Sfixed32 => Some(NativeKind::Int32),
    ScalarType::Int64 | ScalarType::Sint64 | ScalarType::Sfixed64 => Some(NativeKind::Int64),
    ScalarType::Uint32 | ScalarType::Fixed32 => Some(NativeKind::UInt32),
    ScalarType::Uint64 | ScalarType::Fixed64 => Some(NativeKind::UInt64),
    ScalarType::Bool => Some(NativeKind::Bool),
    ScalarType::String | ScalarType::Bytes => None,
  }
}

/* Oneof alternatives sharing a type collapse into one variant argument */
fn distinct(types: Vec<LoweredType>) -> Vec<LoweredType> {
  let mut out: Vec<LoweredType> = Vec::with_capacity(types.len());
  for ty in types {
    if !out.contains(&ty) {
      out.push(ty);
    }
  }
  out
}

/// Host runtime view: prefixed reflected names, CamelCase fields.
#[derive(Debug, Clone)]
pub struct HostLowering {
  struct_prefix: String,
  enum_prefix: String,
  boolean_prefix: String,
}

impl HostLowering {
  pub fn new(config: &GeneratorConfig) -> Self {
    Self {
      struct_prefix: config.host_struct_prefix.clone(),
      enum_prefix: config.host_enum_prefix.clone(),
      boolean_prefix: config.boolean_prefix.clone(),
    }
  }
}

impl ViewLowering for HostLowering {
  fn view(&self) -> View {
    View::Host
  }

  fn native(&self, kind: NativeKind) -> LoweredType {
    // The host reflection layer has no unsigned 32/64-bit integers.
    let name = match kind {
      NativeKind::Void => "void",
      NativeKind::Bool => "bool",
      NativeKind::Int32 => "int32",
      NativeKind::Int64 | NativeKind::UInt32 | NativeKind::UInt64 => "int64",
      NativeKind::Float => "float",
      NativeKind::Double => "double",
    };
    LoweredType::plain(name, TypeKind::Primitive)
  }

  fn scalar(&self, scalar: ScalarType) -> LoweredType {
    match scalar_native(scalar) {
      Some(kind) => self.native(kind),
      None if scalar == ScalarType::Bytes => {
        LoweredType::plain("FByteArray", TypeKind::Struct).with_container(ContainerKind::ByteBuffer)
      }
      None => LoweredType::plain("FString", TypeKind::Primitive),
    }
  }

  fn array_of(&self, element: LoweredType) -> LoweredType {
    LoweredType::generic("TArray", vec![element]).with_container(ContainerKind::Array)
  }

  fn map_of(&self, key: LoweredType, value: LoweredType) -> LoweredType {
    LoweredType::generic("TMap", vec![key, value]).with_container(ContainerKind::Map)
  }

  fn variant_of(&self, alternatives: Vec<LoweredType>) -> LoweredType {
    LoweredType::generic("TVariant", distinct(alternatives)).with_container(ContainerKind::Variant)
  }

  fn fix_field_name(&self, raw: &str, is_boolean: bool) -> String {
    let camel = snake_case_to_camel_case(raw);
    if is_boolean {
      format!("{}{}", self.boolean_prefix, camel)
    } else {
      camel
    }
  }

  fn named_type(&self, file: &DeclaringFile, decl: &TypeDecl) -> LoweredType {
    match decl {
      TypeDecl::Message(m) => LoweredType::plain(
        format!("{}{}_{}", self.struct_prefix, file.class_name, m.name),
        TypeKind::Struct,
      ),
      TypeDecl::Enum(e) => LoweredType::plain(
        format!("{}{}_{}", self.enum_prefix, file.class_name, e.name),
        TypeKind::Enum,
      ),
    }
  }
}

/// Wire view: the protocol classes, named by schema name inside the package namespace.
#[derive(Debug, Clone, Default)]
pub struct WireLowering;

impl WireLowering {
  fn protobuf(name: &str, args: Vec<LoweredType>) -> LoweredType {
    LoweredType::generic(name, args).with_namespace(["google", "protobuf"])
  }

  fn std_string() -> LoweredType {
    LoweredType::plain("string", TypeKind::Primitive).with_namespace(["std"])
  }
}

impl ViewLowering for WireLowering {
  fn view(&self) -> View {
    View::Wire
  }

  fn native(&self, kind: NativeKind) -> LoweredType {
    let name = match kind {
      NativeKind::Void => "void",
      NativeKind::Bool => "bool",
      NativeKind::Int32 => "int32",
      NativeKind::Int64 => "int64",
      NativeKind::UInt32 => "uint32",
      NativeKind::UInt64 => "uint64",
      NativeKind::Float => "float",
      NativeKind::Double => "double",
    };
    LoweredType::plain(name, TypeKind::Primitive)
  }

  fn scalar(&self, scalar: ScalarType) -> LoweredType {
    match scalar_native(scalar) {
      Some(kind) => self.native(kind),
      None if scalar == ScalarType::Bytes => Self::std_string().with_container(ContainerKind::ByteBuffer),
      None => Self::std_string(),
    }
  }

  fn array_of(&self, element: LoweredType) -> LoweredType {
    Self::protobuf("RepeatedField", vec![element]).with_container(ContainerKind::Array)
  }

  fn map_of(&self, key: LoweredType, value: LoweredType) -> LoweredType {
    Self::protobuf("Map", vec![key, value]).with_container(ContainerKind::Map)
  }

  fn variant_of(&self, alternatives: Vec<LoweredType>) -> LoweredType {
    LoweredType::generic("variant", distinct(alternatives))
      .with_namespace(["std"])
      .with_container(ContainerKind::Variant)
  }

  fn fix_field_name(&self, raw: &str, _is_boolean: bool) -> String {
    raw.to_lowercase()
  }

  fn named_type(&self, file: &DeclaringFile, decl: &TypeDecl) -> LoweredType {
    let kind = match decl {
      TypeDecl::Message(_) => TypeKind::Struct,
      TypeDecl::Enum(_) => TypeKind::Enum,
    };
    let ty = LoweredType::plain(decl.name(), kind);
    if file.package.is_empty() {
      ty
    } else {
      ty.with_namespace(file.package.split('.'))
    }
  }
}
