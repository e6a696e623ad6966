//! Lowered type model shared by both views.
//!
//! Every comparison in the resolver goes through the derived `PartialEq`/`Hash`
//! of these types, so two values built independently from equal parts are
//! interchangeable.

use indexmap::IndexMap;
use serde_derive::Serialize;
use std::fmt;
use std::ops::{Index, IndexMut};

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TypeKind {
    Primitive,
    Enum,
    Struct,
    Generic,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub pointer: bool,
    pub reference: bool,
    pub constant: bool,
}

/// Container role of a lowered type. Set by the view that builds the container.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ContainerKind {
    Array,
    Variant,
    Map,
    ByteBuffer,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoweredType {
    pub name: String,
    pub namespace: Vec<String>,
    pub kind: TypeKind,
    pub generic_args: Vec<LoweredType>,
    pub modifiers: Modifiers,
    pub container: Option<ContainerKind>,
}

impl LoweredType {
    pub fn plain(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            namespace: Vec::new(),
            kind,
            generic_args: Vec::new(),
            modifiers: Modifiers::default(),
            container: None,
        }
    }

    pub fn generic(name: impl Into<String>, args: Vec<LoweredType>) -> Self {
        Self {
            generic_args: args,
            ..Self::plain(name, TypeKind::Generic)
        }
    }

    pub fn with_namespace<I, S>(mut self, namespace: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.namespace = namespace.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_container(mut self, container: ContainerKind) -> Self {
        self.container = Some(container);
        self
    }

    pub fn make_ptr(mut self) -> Self {
        self.modifiers.pointer = true;
        self
    }

    pub fn make_ref(mut self) -> Self {
        self.modifiers.reference = true;
        self
    }

    pub fn make_const(mut self) -> Self {
        self.modifiers.constant = true;
        self
    }

    pub fn is_a(&self, kind: TypeKind) -> bool {
        self.kind == kind
    }

    /// Plain value fields can be factored into a shared parent; containers cannot.
    pub fn is_consolidatable(&self) -> bool {
        self.container.is_none()
    }

    /// Generic arguments of this type and, recursively, of its arguments.
    pub fn flat_generic_args(&self) -> Vec<&LoweredType> {
        let mut out = Vec::new();
        for arg in &self.generic_args {
            out.push(arg);
            out.extend(arg.flat_generic_args());
        }
        out
    }

    /// Qualified spelling without modifiers, e.g. `game::common::Player`.
    pub fn qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}::{}", self.namespace.join("::"), self.name)
        }
    }
}

impl fmt::Display for LoweredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.constant {
            write!(f, "const ")?;
        }
        write!(f, "{}", self.qualified_name())?;
        if !self.generic_args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.generic_args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{arg}")?;
            }
            write!(f, ">")?;
        }
        if self.modifiers.pointer {
            write!(f, "*")?;
        }
        if self.modifiers.reference {
            write!(f, "&")?;
        }
        Ok(())
    }
}

/// Reflection metadata attached to emitted declarations.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Annotation {
    Exposed,
    ReadWrite,
    Transient,
    Category(String),
    DisplayName(String),
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariantAlternative {
    pub name: String,
    pub ty: LoweredType,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: LoweredType,
    pub alternatives: Vec<VariantAlternative>,
    pub documentation: Option<String>,
    pub annotations: Vec<Annotation>,
}

impl Field {
    pub fn new(ty: LoweredType, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty,
            alternatives: Vec::new(),
            documentation: None,
            annotations: Vec::new(),
        }
    }

    pub fn is_variant(&self) -> bool {
        !self.alternatives.is_empty() || self.ty.container == Some(ContainerKind::Variant)
    }

    /// Same name and same lowered type.
    pub fn same_slot(&self, other: &Field) -> bool {
        self.name == other.name && self.ty == other.ty
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructId(pub usize);

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct StructDef {
    pub ty: LoweredType,
    pub fields: Vec<Field>,
    /// Weak link into the owning arena.
    pub parent: Option<StructId>,
    pub documentation: Option<String>,
    pub annotations: Vec<Annotation>,
    /// Created by consolidation rather than lowered from a message.
    pub synthesized: bool,
}

impl StructDef {
    pub fn new(ty: LoweredType, fields: Vec<Field>) -> Self {
        Self {
            ty,
            fields,
            parent: None,
            documentation: None,
            annotations: Vec::new(),
            synthesized: false,
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        self.annotations.iter().find_map(|a| match a {
            Annotation::DisplayName(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /* Drop every own field occupying a slot of `removed` */
    pub fn remove_fields(&mut self, removed: &[Field]) {
        self.fields
            .retain(|field| !removed.iter().any(|r| r.same_slot(field)));
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct EnumDef {
    pub ty: LoweredType,
    pub constants: IndexMap<String, i32>,
    pub documentation: Option<String>,
    pub annotations: Vec<Annotation>,
}

/// Owns every `StructDef` of one resolution pass; structs refer to each other by `StructId`.
#[derive(Serialize, Debug, Clone, Default)]
pub struct StructArena {
    structs: Vec<StructDef>,
}

impl StructArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, def: StructDef) -> StructId {
        self.structs.push(def);
        StructId(self.structs.len() - 1)
    }

    pub fn get(&self, id: StructId) -> &StructDef {
        &self.structs[id.0]
    }

    pub fn get_mut(&mut self, id: StructId) -> &mut StructDef {
        &mut self.structs[id.0]
    }

    pub fn len(&self) -> usize {
        self.structs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structs.is_empty()
    }

    /// Parents of `id`, nearest first.
    pub fn parent_chain(&self, id: StructId) -> Vec<StructId> {
        let mut chain = Vec::new();
        let mut current = self.get(id).parent;
        while let Some(parent) = current {
            if chain.contains(&parent) || parent == id {
                break;
            }
            chain.push(parent);
            current = self.get(parent).parent;
        }
        chain
    }

    /// Own fields followed by the fields of every parent.
    pub fn all_fields(&self, id: StructId) -> Vec<&Field> {
        let mut fields: Vec<&Field> = self.get(id).fields.iter().collect();
        for parent in self.parent_chain(id) {
            fields.extend(self.get(parent).fields.iter());
        }
        fields
    }
}

impl Index<StructId> for StructArena {
    type Output = StructDef;

    fn index(&self, id: StructId) -> &StructDef {
        self.get(id)
    }
}

impl IndexMut<StructId> for StructArena {
    fn index_mut(&mut self, id: StructId) -> &mut StructDef {
        self.get_mut(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_structural() {
        let name_a = String::from("FGame_Item");
        let name_b: String = ["FGame", "_", "Item"].concat();

        let a = LoweredType::plain(name_a, TypeKind::Struct);
        let b = LoweredType::plain(name_b, TypeKind::Struct);
        assert_eq!(a, b);
        assert_ne!(a, b.clone().make_ptr());
        assert_ne!(a, LoweredType::plain("FGame_Item", TypeKind::Enum));
    }

    #[test]
    fn renders_modifiers_and_arguments() {
        let inner = LoweredType::plain("Player", TypeKind::Struct).with_namespace(["game", "common"]);
        let array = LoweredType::generic("TArray", vec![inner]).make_const().make_ref();
        assert_eq!(array.to_string(), "const TArray<game::common::Player>&");
    }

    #[test]
    fn flattens_nested_generic_arguments() {
        let leaf = LoweredType::plain("FLeaf", TypeKind::Struct);
        let map = LoweredType::generic(
            "TMap",
            vec![LoweredType::plain("FString", TypeKind::Primitive), leaf.clone()],
        );
        let array = LoweredType::generic("TArray", vec![map.clone()]);

        let flat = array.flat_generic_args();
        assert_eq!(flat.len(), 3);
        assert!(flat.contains(&&leaf));
        assert!(flat.contains(&&map));
    }

    #[test]
    fn all_fields_walks_parent_chain() {
        let float = LoweredType::plain("float", TypeKind::Primitive);
        let mut arena = StructArena::new();
        let base = arena.alloc(StructDef::new(
            LoweredType::plain("FBase", TypeKind::Struct),
            vec![Field::new(float.clone(), "x")],
        ));
        let mut child = StructDef::new(
            LoweredType::plain("FChild", TypeKind::Struct),
            vec![Field::new(float, "y")],
        );
        child.parent = Some(base);
        let child = arena.alloc(child);

        let names: Vec<&str> = arena.all_fields(child).iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["y", "x"]);
        assert_eq!(arena.parent_chain(child), vec![base]);
    }
}
