//! Dependency graph between bound properties

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::binding::{BindingError, BindingResult, BindingSet, PropertyRef, PropertyStore};

/// Directed graph over binding targets: an edge `a -> b` means the binding
/// on `b` reads `a` (directly or through a store-level implicit source).
pub(crate) struct DependencyGraph {
    nodes: BTreeSet<PropertyRef>,
    edges: HashMap<PropertyRef, BTreeSet<PropertyRef>>,
}

impl DependencyGraph {
    pub fn build(bindings: &BindingSet, store: &impl PropertyStore) -> Self {
        let nodes: BTreeSet<PropertyRef> = bindings.iter().map(|b| b.target.clone()).collect();
        let mut edges: HashMap<PropertyRef, BTreeSet<PropertyRef>> = HashMap::new();

        for binding in bindings.iter() {
            for source in binding.sources() {
                let mut upstream = vec![source.clone()];
                upstream.extend(store.implicit_sources(source));
                for dep in upstream {
                    if nodes.contains(&dep) {
                        edges.entry(dep).or_default().insert(binding.target.clone());
                    }
                }
            }
        }

        Self { nodes, edges }
    }

    /// Kahn's algorithm with a sorted ready set so the order is deterministic
    pub fn sort(&self) -> BindingResult<Vec<PropertyRef>> {
        let mut indegree: HashMap<&PropertyRef, usize> =
            self.nodes.iter().map(|n| (n, 0)).collect();
        for targets in self.edges.values() {
            for target in targets {
                if let Some(count) = indegree.get_mut(target) {
                    *count += 1;
                }
            }
        }

        let mut ready: BTreeSet<&PropertyRef> = indegree
            .iter()
            .filter_map(|(node, &count)| (count == 0).then_some(*node))
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(node) = ready.pop_first() {
            order.push(node.clone());
            if let Some(targets) = self.edges.get(node) {
                for target in targets {
                    if let Some(count) = indegree.get_mut(target) {
                        *count -= 1;
                        if *count == 0 {
                            ready.insert(target);
                        }
                    }
                }
            }
        }

        if order.len() == self.nodes.len() {
            return Ok(order);
        }

        let done: HashSet<&PropertyRef> = order.iter().collect();
        let cycle = self.find_cycle(&done).unwrap_or_default();
        Err(BindingError::Cycle { cycle })
    }

    /// Depth-first search for one cycle among the nodes Kahn could not order
    fn find_cycle(&self, done: &HashSet<&PropertyRef>) -> Option<Vec<PropertyRef>> {
        fn visit<'a>(
            graph: &'a DependencyGraph,
            node: &'a PropertyRef,
            visiting: &mut Vec<&'a PropertyRef>,
            visited: &mut HashSet<&'a PropertyRef>,
        ) -> Option<Vec<PropertyRef>> {
            if let Some(start) = visiting.iter().position(|n| *n == node) {
                return Some(visiting[start..].iter().map(|n| (*n).clone()).collect());
            }
            if !visited.insert(node) {
                return None;
            }
            visiting.push(node);
            if let Some(targets) = graph.edges.get(node) {
                for target in targets {
                    if let Some(cycle) = visit(graph, target, visiting, visited) {
                        return Some(cycle);
                    }
                }
            }
            visiting.pop();
            None
        }

        let mut visited = HashSet::new();
        for node in self.nodes.iter().filter(|n| !done.contains(n)) {
            let mut visiting = Vec::new();
            if let Some(cycle) = visit(self, node, &mut visiting, &mut visited) {
                return Some(cycle);
            }
        }
        None
    }
}
