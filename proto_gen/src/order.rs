use crate::error::{ResolveError, Result};
use crate::lowered::{LoweredType, StructArena, StructId};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// "Must be declared before" graph over the structs of a working set.
///
/// Node indices are positions in the working set, so every tie in the
/// ordering is broken by declaration order.
#[derive(Debug)]
pub struct DependencyGraph {
    nodes: Vec<StructId>,
    types: Vec<LoweredType>,
    /* (dependency, dependent) by node index */
    edges: BTreeSet<(usize, usize)>,
}

impl DependencyGraph {
    pub fn build(arena: &StructArena, working: &[StructId]) -> Self {
        let types: Vec<LoweredType> = working.iter().map(|id| arena[*id].ty.clone()).collect();

        let mut index: HashMap<&LoweredType, usize> = HashMap::new();
        for (idx, ty) in types.iter().enumerate() {
            index.entry(ty).or_insert(idx);
        }

        let mut edges = BTreeSet::new();
        for (dependent, id) in working.iter().enumerate() {
            let def = &arena[*id];
            let mut add = |ty: &LoweredType| {
                if let Some(&dependency) = index.get(ty) {
                    edges.insert((dependency, dependent));
                }
            };

            for field in &def.fields {
                add(&field.ty);
                for arg in field.ty.flat_generic_args() {
                    add(arg);
                }
                for alternative in &field.alternatives {
                    add(&alternative.ty);
                    for arg in alternative.ty.flat_generic_args() {
                        add(arg);
                    }
                }
            }

            if let Some(parent) = def.parent {
                add(&arena[parent].ty);
            }
        }

        for (from, to) in &edges {
            debug!(from = %types[*from], to = %types[*to], "dependency edge");
        }

        Self {
            nodes: working.to_vec(),
            types,
            edges,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Edges as (dependency, dependent) struct pairs, in node order.
    pub fn edges(&self) -> impl Iterator<Item = (StructId, StructId)> + '_ {
        self.edges
            .iter()
            .map(|(from, to)| (self.nodes[*from], self.nodes[*to]))
    }

    /// Edges rendered as lowered type pairs.
    pub fn edge_types(&self) -> impl Iterator<Item = (&LoweredType, &LoweredType)> + '_ {
        self.edges
            .iter()
            .map(|(from, to)| (&self.types[*from], &self.types[*to]))
    }

    /// Kahn's algorithm, always taking the earliest-declared ready node.
    pub fn topo_order(&self) -> Result<Vec<StructId>> {
        let count = self.nodes.len();
        let mut in_degree = vec![0usize; count];
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); count];

        for &(from, to) in &self.edges {
            adjacency[from].push(to);
            in_degree[to] += 1;
        }

        let mut ready: BTreeSet<usize> = (0..count).filter(|idx| in_degree[*idx] == 0).collect();
        let mut order = Vec::with_capacity(count);

        while let Some(idx) = ready.pop_first() {
            order.push(self.nodes[idx]);
            for &child in &adjacency[idx] {
                in_degree[child] -= 1;
                if in_degree[child] == 0 {
                    ready.insert(child);
                }
            }
        }

        if order.len() == count {
            Ok(order)
        } else {
            let residual: BTreeSet<usize> = (0..count).filter(|idx| in_degree[*idx] > 0).collect();
            Err(ResolveError::CyclicDependency(self.extract_cycle(&residual)))
        }
    }

    /* Every residual node has a residual predecessor, so walking backwards must loop */
    fn extract_cycle(&self, residual: &BTreeSet<usize>) -> Vec<String> {
        let Some(&start) = residual.first() else {
            return Vec::new();
        };

        let mut walk = vec![start];
        let mut current = start;
        loop {
            let predecessor = self
                .edges
                .iter()
                .filter(|(from, to)| *to == current && residual.contains(from))
                .map(|(from, _)| *from)
                .min();

            let Some(predecessor) = predecessor else {
                break;
            };
            if let Some(pos) = walk.iter().position(|idx| *idx == predecessor) {
                walk.drain(..pos);
                break;
            }
            walk.push(predecessor);
            current = predecessor;
        }

        /* Walked against the edges; present members in dependency order */
        walk.reverse();
        walk.into_iter().map(|idx| self.types[idx].to_string()).collect()
    }
}

/// Reorder `working` so that every struct follows the structs it contains.
pub fn sort_by_inclusion(arena: &StructArena, working: &mut Vec<StructId>) -> Result<()> {
    let graph = DependencyGraph::build(arena, working);
    *working = graph.topo_order()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lowered::{ContainerKind, Field, StructDef, TypeKind, VariantAlternative};
    use assert_matches::assert_matches;

    fn ty(name: &str) -> LoweredType {
        LoweredType::plain(name, TypeKind::Struct)
    }

    fn def(name: &str, fields: Vec<(&str, LoweredType)>) -> StructDef {
        StructDef::new(
            ty(name),
            fields
                .into_iter()
                .map(|(field, ty)| Field::new(ty, field))
                .collect(),
        )
    }

    fn names(arena: &StructArena, order: &[StructId]) -> Vec<String> {
        order.iter().map(|id| arena[*id].ty.name.clone()).collect()
    }

    #[test]
    fn contained_struct_comes_first() {
        let mut arena = StructArena::new();
        let a = arena.alloc(def("A", vec![("b", ty("B"))]));
        let b = arena.alloc(def("B", vec![]));

        let order = DependencyGraph::build(&arena, &[a, b]).topo_order().unwrap();
        assert_eq!(names(&arena, &order), vec!["B", "A"]);
    }

    #[test]
    fn unconstrained_nodes_keep_declaration_order() {
        let mut arena = StructArena::new();
        let working: Vec<StructId> = ["C", "A", "B"]
            .into_iter()
            .map(|name| arena.alloc(def(name, vec![])))
            .collect();

        let order = DependencyGraph::build(&arena, &working).topo_order().unwrap();
        assert_eq!(names(&arena, &order), vec!["C", "A", "B"]);
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let mut arena = StructArena::new();
        let node = arena.alloc(def("Node", vec![("next", ty("Node"))]));

        let err = DependencyGraph::build(&arena, &[node]).topo_order().unwrap_err();
        assert_eq!(err, ResolveError::CyclicDependency(vec!["Node".to_string()]));
    }

    #[test]
    fn reports_only_cycle_members() {
        let mut arena = StructArena::new();
        let x = arena.alloc(def("X", vec![("y", ty("Y"))]));
        let y = arena.alloc(def("Y", vec![("x", ty("X"))]));
        let z = arena.alloc(def("Z", vec![("x", ty("X"))]));
        let free = arena.alloc(def("Free", vec![]));

        let err = DependencyGraph::build(&arena, &[z, x, y, free])
            .topo_order()
            .unwrap_err();
        assert_matches!(err, ResolveError::CyclicDependency(members) if {
            let mut sorted = members.clone();
            sorted.sort();
            sorted == vec!["X".to_string(), "Y".to_string()]
        });
    }

    #[test]
    fn generic_arguments_and_alternatives_are_edges() {
        let mut arena = StructArena::new();
        let array = LoweredType::generic("TArray", vec![ty("Item")]).with_container(ContainerKind::Array);

        let mut holder = def("Holder", vec![("items", array)]);
        let mut choice = Field::new(
            LoweredType::generic("TVariant", vec![ty("Coin")]).with_container(ContainerKind::Variant),
            "choice",
        );
        choice.alternatives = vec![VariantAlternative {
            name: "Coin".to_string(),
            ty: ty("Coin"),
        }];
        holder.fields.push(choice);

        let holder = arena.alloc(holder);
        let item = arena.alloc(def("Item", vec![]));
        let coin = arena.alloc(def("Coin", vec![]));

        let graph = DependencyGraph::build(&arena, &[holder, item, coin]);
        let edges: Vec<(StructId, StructId)> = graph.edges().collect();
        assert_eq!(edges, vec![(item, holder), (coin, holder)]);
        assert_eq!(
            names(&arena, &graph.topo_order().unwrap()),
            vec!["Item", "Coin", "Holder"]
        );
    }

    #[test]
    fn parent_precedes_child() {
        let mut arena = StructArena::new();
        let mut child = def("Child", vec![]);
        let parent = arena.alloc(def("Parent", vec![]));
        child.parent = Some(parent);
        let child = arena.alloc(child);

        let mut working = vec![child, parent];
        sort_by_inclusion(&arena, &mut working).unwrap();
        assert_eq!(working, vec![parent, child]);
    }

    #[test]
    fn distinct_but_equal_types_match() {
        let mut arena = StructArena::new();
        let holder = arena.alloc(def("Holder", vec![("leaf", ty(&["Le", "af"].concat()))]));
        let leaf = arena.alloc(def(&String::from("Leaf"), vec![]));

        let order = DependencyGraph::build(&arena, &[holder, leaf]).topo_order().unwrap();
        assert_eq!(order, vec![leaf, holder]);
    }
}
