use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// Package-qualified schema type name, the key of every registry lookup.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Clone)]
pub struct QualifiedName {
    pub package: String,
    pub name: String,
}

impl QualifiedName {
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
        }
    }

    /// Split a dotted name at its last `.`; a bare name has an empty package.
    pub fn parse(dotted: &str) -> Self {
        let dotted = dotted.trim_start_matches('.');
        match dotted.rsplit_once('.') {
            Some((package, name)) => Self::new(package, name),
            None => Self::new("", dotted),
        }
    }

    /// Qualify a reference written inside `package`.
    ///
    /// Dotted references are taken as fully qualified, bare ones are placed in
    /// the declaring package.
    pub fn in_package(reference: &str, package: &str) -> Self {
        let reference = reference.trim_start_matches('.');
        if reference.contains('.') {
            Self::parse(reference)
        } else {
            Self::new(package, reference)
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.package.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.package, self.name)
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum ScalarType {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
}

impl ScalarType {
    pub const ALL: [ScalarType; 15] = [
        ScalarType::Double,
        ScalarType::Float,
        ScalarType::Int32,
        ScalarType::Int64,
        ScalarType::Uint32,
        ScalarType::Uint64,
        ScalarType::Sint32,
        ScalarType::Sint64,
        ScalarType::Fixed32,
        ScalarType::Fixed64,
        ScalarType::Sfixed32,
        ScalarType::Sfixed64,
        ScalarType::Bool,
        ScalarType::String,
        ScalarType::Bytes,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            ScalarType::Double => "double",
            ScalarType::Float => "float",
            ScalarType::Int32 => "int32",
            ScalarType::Int64 => "int64",
            ScalarType::Uint32 => "uint32",
            ScalarType::Uint64 => "uint64",
            ScalarType::Sint32 => "sint32",
            ScalarType::Sint64 => "sint64",
            ScalarType::Fixed32 => "fixed32",
            ScalarType::Fixed64 => "fixed64",
            ScalarType::Sfixed32 => "sfixed32",
            ScalarType::Sfixed64 => "sfixed64",
            ScalarType::Bool => "bool",
            ScalarType::String => "string",
            ScalarType::Bytes => "bytes",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.keyword() == keyword)
    }

    /* Map keys may be any integral type, bool or string */
    pub fn is_valid_map_key(self) -> bool {
        !matches!(
            self,
            ScalarType::Double | ScalarType::Float | ScalarType::Bytes
        )
    }
}

/// A parsed field or RPC type reference.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum TypeReference {
    Scalar(ScalarType),
    Map {
        key: ScalarType,
        value: Box<TypeReference>,
    },
    Named(String),
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ReferenceError {
    Malformed(String),
    UnsupportedMapKey(String),
    NestedMap(String),
}

impl fmt::Display for ReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceError::Malformed(r) => write!(f, "malformed type reference '{r}'"),
            ReferenceError::UnsupportedMapKey(r) => {
                write!(f, "unsupported map key type in '{r}'")
            }
            ReferenceError::NestedMap(r) => write!(f, "map values cannot be maps: '{r}'"),
        }
    }
}

impl std::error::Error for ReferenceError {}

impl TypeReference {
    pub fn parse(raw: &str) -> Result<Self, ReferenceError> {
        let text = raw.trim();

        if let Some(inner) = text.strip_prefix("map<") {
            let inner = inner
                .strip_suffix('>')
                .ok_or_else(|| ReferenceError::Malformed(raw.to_string()))?;
            let (key, value) = inner
                .split_once(',')
                .ok_or_else(|| ReferenceError::Malformed(raw.to_string()))?;

            let key = ScalarType::from_keyword(key.trim())
                .filter(|k| k.is_valid_map_key())
                .ok_or_else(|| ReferenceError::UnsupportedMapKey(raw.to_string()))?;

            let value = value.trim();
            if value.starts_with("map<") {
                return Err(ReferenceError::NestedMap(raw.to_string()));
            }

            return Ok(TypeReference::Map {
                key,
                value: Box::new(Self::parse_single(value, raw)?),
            });
        }

        Self::parse_single(text, raw)
    }

    fn parse_single(text: &str, raw: &str) -> Result<Self, ReferenceError> {
        if let Some(scalar) = ScalarType::from_keyword(text) {
            return Ok(TypeReference::Scalar(scalar));
        }

        let name = text.trim_start_matches('.');
        let well_formed = !name.is_empty()
            && !name.ends_with('.')
            && !name.contains("..")
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');

        if well_formed {
            Ok(TypeReference::Named(name.to_string()))
        } else {
            Err(ReferenceError::Malformed(raw.to_string()))
        }
    }
}
