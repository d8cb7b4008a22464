//! Cycle detection over the dependency graph.

use std::collections::HashMap;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::graph::DependencyGraph;
use crate::ids::NodeId;

impl DependencyGraph {
    /// Returns every dependency cycle as the handles of its members.
    ///
    /// A cycle is a strongly connected component with more than one node, or
    /// a single node that depends on itself. Members are sorted by handle and
    /// cycles by their first member.
    pub fn cycles(&self) -> Vec<Vec<NodeId>> {
        let mut view: DiGraph<NodeId, ()> = DiGraph::new();
        let mut indices: HashMap<NodeId, NodeIndex> = HashMap::with_capacity(self.len());
        for (id, _) in self.iter() {
            indices.insert(id, view.add_node(id));
        }
        for (from, to) in self.edges() {
            if let (Some(&a), Some(&b)) = (indices.get(&from), indices.get(&to)) {
                view.add_edge(a, b, ());
            }
        }

        let mut cycles: Vec<Vec<NodeId>> = tarjan_scc(&view)
            .into_iter()
            .filter(|component| match component.as_slice() {
                [single] => view.contains_edge(*single, *single),
                _ => true,
            })
            .map(|component| {
                let mut members: Vec<NodeId> = component.into_iter().map(|ix| view[ix]).collect();
                members.sort();
                members
            })
            .collect();
        cycles.sort();
        cycles
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::DependencyGraph;
    use crate::node::{ElementKey, NodeKind};
    use verdict_common::SourceLocation;

    fn unit(g: &mut DependencyGraph, name: &str) -> crate::NodeId {
        g.add_node(
            ElementKey::Unit(format!("p/{name}.java").into()),
            NodeKind::unit(SourceLocation::new("p", format!("{name}.java"))),
        )
    }

    #[test]
    fn acyclic_graph_has_no_cycles() {
        let mut g = DependencyGraph::new();
        let a = unit(&mut g, "A");
        let b = unit(&mut g, "B");
        g.set_dependencies(a, &[b]).unwrap();
        assert!(g.cycles().is_empty());
    }

    #[test]
    fn finds_mutual_and_self_cycles() {
        let mut g = DependencyGraph::new();
        let a = unit(&mut g, "A");
        let b = unit(&mut g, "B");
        let c = unit(&mut g, "C");
        let d = unit(&mut g, "D");
        g.set_dependencies(a, &[b]).unwrap();
        g.set_dependencies(b, &[a, c]).unwrap();
        g.set_dependencies(d, &[d]).unwrap();
        assert_eq!(g.cycles(), vec![vec![a, b], vec![d]]);
    }
}
