//! Registration order for dependent properties.
//!
//! A default value may construct another type's object, so that type must be
//! registered first. Base types are also registered before their subclasses
//! so overridden defaults see the base registration.

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::hash::Hash;

use crate::error::GraphError;
use crate::graph::Graph;
use crate::member::MemberId;

/// Nodes left over when the edge set contains a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle<T> {
    pub remaining: Vec<T>,
}

/// Kahn's algorithm. `nodes` fixes the tie-breaking order; edges whose
/// endpoints are not in `nodes` are ignored.
pub fn topological_sort<T: Copy + Eq + Hash>(nodes: &[T], edges: &[(T, T)]) -> Result<Vec<T>, Cycle<T>> {
    let known: FxHashSet<T> = nodes.iter().copied().collect();
    let mut in_degree: FxHashMap<T, usize> = nodes.iter().map(|n| (*n, 0)).collect();
    let mut outgoing: FxHashMap<T, Vec<T>> = FxHashMap::default();
    let mut seen_edges = FxHashSet::default();

    for &(from, to) in edges {
        if !known.contains(&from) || !known.contains(&to) || !seen_edges.insert((from, to)) {
            continue;
        }
        outgoing.entry(from).or_default().push(to);
        if let Some(d) = in_degree.get_mut(&to) {
            *d += 1;
        }
    }

    let mut queue: VecDeque<T> = nodes
        .iter()
        .copied()
        .filter(|n| in_degree.get(n) == Some(&0))
        .collect();
    let mut sorted = Vec::with_capacity(nodes.len());
    let mut emitted = FxHashSet::default();

    while let Some(node) = queue.pop_front() {
        if !emitted.insert(node) {
            continue;
        }
        sorted.push(node);
        for &target in outgoing.get(&node).map(Vec::as_slice).unwrap_or_default() {
            if let Some(d) = in_degree.get_mut(&target) {
                *d -= 1;
                if *d == 0 {
                    queue.push_back(target);
                }
            }
        }
    }

    if emitted.len() < known.len() {
        let mut remaining = Vec::new();
        for n in nodes {
            if !emitted.contains(n) && !remaining.contains(n) {
                remaining.push(*n);
            }
        }
        return Err(Cycle { remaining });
    }
    Ok(sorted)
}

/// Dependent-property fields in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortedProperties {
    /// Owning types in registration order.
    pub types: Vec<MemberId>,
    /// Fields in registration order; the position is the static index.
    pub fields: Vec<MemberId>,
}

impl SortedProperties {
    pub fn index_of(&self, field: MemberId) -> Option<usize> {
        self.fields.iter().position(|f| *f == field)
    }
}

/// Order all dependent properties so that no registration references a type
/// whose properties are not registered yet.
pub fn sort_properties(graph: &Graph) -> Result<SortedProperties, GraphError> {
    let owners: Vec<MemberId> = graph
        .declared_types()
        .into_iter()
        .filter(|t| !graph.dependency_properties(*t).is_empty())
        .collect();

    let considered: Vec<MemberId> = owners
        .iter()
        .copied()
        .filter(|t| {
            graph
                .dependency_properties(*t)
                .iter()
                .any(|p| p.default_value.is_some())
        })
        .collect();
    let considered_set: FxHashSet<MemberId> = considered.iter().copied().collect();

    let mut edges = Vec::new();
    for &ty in &considered {
        for prop in graph.dependency_properties(ty) {
            if prop.default_value.is_none() {
                continue;
            }
            if let Some(value_type) = graph.resolve(&prop.property_type) {
                if value_type != ty && considered_set.contains(&value_type) {
                    edges.push((value_type, ty));
                }
            }
        }
        if let Some(base) = graph.ancestors(ty).find(|a| considered_set.contains(a)) {
            edges.push((base, ty));
        }
    }

    let mut types = topological_sort(&considered, &edges).map_err(|cycle| {
        let mut names: Vec<String> = cycle
            .remaining
            .iter()
            .map(|id| graph.qualified_name(*id))
            .collect();
        names.sort();
        GraphError::DependencyCycle {
            remaining: cycle.remaining.len(),
            types: names.join(", "),
        }
    })?;
    tracing::debug!(count = types.len(), "sorted types with default values");

    types.extend(owners.iter().copied().filter(|t| !considered_set.contains(t)));

    let fields = types
        .iter()
        .flat_map(|t| graph.dependency_properties(*t).into_iter().map(|p| p.field))
        .collect();

    Ok(SortedProperties { types, fields })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{quickcheck, TestResult};

    #[test]
    fn test_linear_chain() {
        let sorted = topological_sort(&[3, 2, 1], &[(1, 2), (2, 3)]).unwrap();
        assert_eq!(sorted, vec![1, 2, 3]);
    }

    #[test]
    fn test_ties_follow_node_order() {
        let sorted = topological_sort(&["b", "a", "c"], &[]).unwrap();
        assert_eq!(sorted, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_cycle_is_reported() {
        let err = topological_sort(&[1, 2, 3], &[(1, 2), (2, 1)]).unwrap_err();
        assert_eq!(err.remaining, vec![1, 2]);
    }

    #[test]
    fn test_self_loop_is_a_cycle() {
        assert!(topological_sort(&[1], &[(1, 1)]).is_err());
    }

    #[test]
    fn test_edges_to_unknown_nodes_are_ignored() {
        let sorted = topological_sort(&[1, 2], &[(1, 9), (9, 2)]).unwrap();
        assert_eq!(sorted, vec![1, 2]);
    }

    /// Edges only point from lower to higher rank, so the graph is acyclic.
    fn respects_edges(ranks: Vec<u8>, raw_edges: Vec<(u8, u8)>) -> TestResult {
        let mut nodes: Vec<u8> = ranks;
        nodes.sort_unstable();
        nodes.dedup();
        if nodes.is_empty() {
            return TestResult::discard();
        }
        let pick = |i: u8| nodes[i as usize % nodes.len()];
        let edges: Vec<(u8, u8)> = raw_edges
            .into_iter()
            .map(|(a, b)| (pick(a), pick(b)))
            .filter(|(a, b)| a < b)
            .collect();

        let mut shuffled = nodes.clone();
        shuffled.reverse();
        let Ok(sorted) = topological_sort(&shuffled, &edges) else {
            return TestResult::failed();
        };

        let position = |n: u8| sorted.iter().position(|x| *x == n);
        let complete = sorted.len() == nodes.len() && nodes.iter().all(|n| position(*n).is_some());
        let ordered = edges.iter().all(|(a, b)| position(*a) < position(*b));
        TestResult::from_bool(complete && ordered)
    }

    #[test]
    fn test_order_respects_every_edge() {
        quickcheck(respects_edges as fn(Vec<u8>, Vec<(u8, u8)>) -> TestResult);
    }

    fn cycles_always_fail(len: u8) -> TestResult {
        let len = (len % 10) + 1;
        let nodes: Vec<u8> = (0..len).collect();
        let mut edges: Vec<(u8, u8)> = (0..len).map(|i| (i, (i + 1) % len)).collect();
        edges.push((0, 0));
        TestResult::from_bool(topological_sort(&nodes, &edges).is_err())
    }

    #[test]
    fn test_cycles_always_fail() {
        quickcheck(cycles_always_fail as fn(u8) -> TestResult);
    }
}
