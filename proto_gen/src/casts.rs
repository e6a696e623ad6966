use crate::lowered::{StructDef, StructId};
use proto_types::QualifiedName;
use serde_derive::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Wire and host lowering of one message.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CastAssociation {
    pub key: QualifiedName,
    pub wire: StructDef,
    /// Host struct in the resolution arena; its parent chain holds any consolidated fields.
    pub host: StructId,
}

/// Cast pairs kept in the same order as the host struct list.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct CastAssociations {
    pairs: Vec<CastAssociation>,
}

impl CastAssociations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: QualifiedName, wire: StructDef, host: StructId) {
        debug!(%key, wire = %wire.ty, host = host.0, "cast association");
        self.pairs.push(CastAssociation { key, wire, host });
    }

    /// Permute the pairs to follow `order`. Structs without a pair are skipped.
    pub fn align_to(&mut self, order: &[StructId]) {
        let position: HashMap<StructId, usize> = order
            .iter()
            .enumerate()
            .map(|(pos, id)| (*id, pos))
            .collect();

        /* Stable: pairs whose host is not in `order` keep their relative order at the end */
        self.pairs
            .sort_by_key(|pair| position.get(&pair.host).copied().unwrap_or(usize::MAX));
    }

    pub fn get(&self, key: &QualifiedName) -> Option<&CastAssociation> {
        self.pairs.iter().find(|pair| pair.key == *key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CastAssociation> {
        self.pairs.iter()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<'a> IntoIterator for &'a CastAssociations {
    type Item = &'a CastAssociation;
    type IntoIter = std::slice::Iter<'a, CastAssociation>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lowered::{LoweredType, TypeKind};

    fn wire(name: &str) -> StructDef {
        StructDef::new(
            LoweredType::plain(name, TypeKind::Struct).with_namespace(["game"]),
            vec![],
        )
    }

    #[test]
    fn follows_host_order() {
        let mut casts = CastAssociations::new();
        casts.push(QualifiedName::new("game", "A"), wire("A"), StructId(0));
        casts.push(QualifiedName::new("game", "B"), wire("B"), StructId(1));
        casts.push(QualifiedName::new("game", "C"), wire("C"), StructId(2));

        // StructId(3) is a synthesized struct with no cast pair.
        casts.align_to(&[StructId(3), StructId(2), StructId(0), StructId(1)]);

        let keys: Vec<String> = casts.iter().map(|pair| pair.key.name.clone()).collect();
        assert_eq!(keys, vec!["C", "A", "B"]);
        assert_eq!(casts.len(), 3);
    }

    #[test]
    fn lookup_by_equal_key() {
        let mut casts = CastAssociations::new();
        casts.push(QualifiedName::new("game", "A"), wire("A"), StructId(0));

        let key = QualifiedName::parse(&["game", ".", "A"].concat());
        assert_eq!(casts.get(&key).map(|pair| pair.host), Some(StructId(0)));
        assert!(casts.get(&QualifiedName::new("other", "A")).is_none());
    }
}
