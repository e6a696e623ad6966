use serde_derive::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: String,
    #[serde(default)]
    pub repeated: bool,
    #[serde(default)]
    pub documentation: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct OneOfAlternative {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct OneOfDecl {
    pub name: String,
    pub alternatives: Vec<OneOfAlternative>,
    #[serde(default)]
    pub documentation: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct MessageDecl {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    #[serde(default)]
    pub oneofs: Vec<OneOfDecl>,
    #[serde(default)]
    pub documentation: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct EnumConstantDecl {
    pub name: String,
    pub tag: i32,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct EnumDecl {
    pub name: String,
    pub constants: Vec<EnumConstantDecl>,
    #[serde(default)]
    pub documentation: Option<String>,
}

/// A top-level schema type declaration.
///
/// The set of kinds is closed: every consumer matches both arms.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub enum TypeDecl {
    Message(MessageDecl),
    Enum(EnumDecl),
}

impl TypeDecl {
    pub fn name(&self) -> &str {
        match self {
            TypeDecl::Message(m) => &m.name,
            TypeDecl::Enum(e) => &e.name,
        }
    }

    pub fn documentation(&self) -> Option<&str> {
        match self {
            TypeDecl::Message(m) => m.documentation.as_deref(),
            TypeDecl::Enum(e) => e.documentation.as_deref(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct RpcDecl {
    pub name: String,
    pub request: String,
    pub response: String,
    #[serde(default)]
    pub documentation: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct ServiceDecl {
    pub name: String,
    #[serde(default)]
    pub rpcs: Vec<RpcDecl>,
    #[serde(default)]
    pub documentation: Option<String>,
}
