//! Structural consolidation of duplicated field sets.
//!
//! Every unordered pair of structs in the working set is compared field by
//! field; a non-empty set of shared plain fields becomes a synthesized parent
//! struct named after those fields. Each struct then adopts the candidate that
//! covers the most of its fields and drops the fields it now inherits.
//!
//! The scan is an explicit nested loop: O(n² × f²) for n structs of at most f
//! fields. Schema files hold tens of messages, so this stays cheap.

use crate::config::GeneratorConfig;
use crate::lowered::{Annotation, Field, LoweredType, StructArena, StructDef, StructId, TypeKind};
use tracing::debug;

pub struct Consolidator<'a> {
    config: &'a GeneratorConfig,
    class_name: &'a str,
}

/* Arrays, maps, variants and byte buffers never move into a shared parent */
fn is_shareable(field: &Field) -> bool {
    field.ty.is_consolidatable() && !field.is_variant()
}

fn shared_fields(first: &StructDef, second: &StructDef) -> Vec<Field> {
    first
        .fields
        .iter()
        .filter(|field| is_shareable(field))
        .filter(|field| second.fields.iter().any(|other| other.same_slot(field)))
        .cloned()
        .collect()
}

/* Number of candidate fields found among `own`, counting shareable slots only */
fn covered_fields(own: &[Field], candidate: &StructDef) -> usize {
    candidate
        .fields
        .iter()
        .filter(|field| is_shareable(field) && own.iter().any(|o| o.same_slot(field)))
        .count()
}

impl<'a> Consolidator<'a> {
    pub fn new(config: &'a GeneratorConfig, class_name: &'a str) -> Self {
        Self { config, class_name }
    }

    fn consolidated_name(&self, fields: &[Field]) -> String {
        let mut name = self.config.host_struct_prefix.clone();
        for field in fields {
            name.push_str(&field.name);
        }
        name.push_str(&self.config.consolidated_suffix);
        name
    }

    fn synthesize(&self, name: String, fields: Vec<Field>) -> StructDef {
        let mut def = StructDef::new(LoweredType::plain(name, TypeKind::Struct), fields);
        def.annotations = vec![
            Annotation::DisplayName(format!("{} {}", self.class_name, def.ty.name)),
            Annotation::Exposed,
        ];
        def.synthesized = true;
        def
    }

    /// Rewrites `working` in place and returns the newly synthesized structs,
    /// which are prepended to the working set. The caller re-orders afterwards.
    pub fn consolidate(&self, arena: &mut StructArena, working: &mut Vec<StructId>) -> Vec<StructId> {
        let eligible: Vec<StructId> = working
            .iter()
            .copied()
            .filter(|id| !arena[*id].synthesized)
            .collect();

        /* Candidates in creation order: earlier passes first, then this one */
        let existing: Vec<StructId> = working
            .iter()
            .copied()
            .filter(|id| arena[*id].synthesized)
            .collect();
        let mut fresh: Vec<StructDef> = Vec::new();

        for (i, first) in eligible.iter().enumerate() {
            for second in &eligible[i + 1..] {
                let common = shared_fields(&arena[*first], &arena[*second]);
                if common.is_empty() {
                    continue;
                }

                let name = self.consolidated_name(&common);
                let known = existing.iter().any(|id| arena[*id].ty.name == name)
                    || fresh.iter().any(|def| def.ty.name == name);
                if known {
                    continue;
                }

                debug!(
                    %name,
                    first = %arena[*first].ty,
                    second = %arena[*second].ty,
                    "synthesized consolidated struct"
                );
                fresh.push(self.synthesize(name, common));
            }
        }

        let created: Vec<StructId> = fresh.into_iter().map(|def| arena.alloc(def)).collect();
        let candidates: Vec<StructId> = existing.iter().chain(created.iter()).copied().collect();

        for id in &eligible {
            if arena[*id].parent.is_some() {
                continue;
            }

            /* Only a candidate wholly contained in the struct keeps every field reachable */
            let mut best: Option<(StructId, usize)> = None;
            for candidate in &candidates {
                let count = covered_fields(&arena[*id].fields, &arena[*candidate]);
                if count == 0 || count != arena[*candidate].fields.len() {
                    continue;
                }
                if best.is_none_or(|(_, best_count)| count > best_count) {
                    best = Some((*candidate, count));
                }
            }

            if let Some((parent, count)) = best {
                let inherited = arena[parent].fields.clone();
                debug!(child = %arena[*id].ty, parent = %arena[parent].ty, count, "assigned parent");
                let child = &mut arena[*id];
                child.remove_fields(&inherited);
                child.parent = Some(parent);
            }
        }

        let mut rewritten = created.clone();
        rewritten.extend(working.iter().copied());
        *working = rewritten;
        created
    }
}
