//! The dependency graph arena.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::trace;
use verdict_config::CyclePolicy;

use crate::error::GraphError;
use crate::ids::NodeId;
use crate::node::{ElementKey, Node, NodeKind};

/// Directed graph over build elements with symmetric edges and a lazily
/// cached topological order.
///
/// An edge `A -> B` means "A depends on B": B appears in A's dependencies
/// and A appears in B's dependents. For every such edge outside a cycle,
/// `order(B) < order(A)`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DependencyGraph {
    /// Arena slots; `None` marks a removed node.
    nodes: Vec<Option<Node>>,
    /// Key index into the arena.
    index: BTreeMap<ElementKey, NodeId>,
}

/// One step of the ordering walk.
struct Frame {
    id: NodeId,
    next: usize,
    max: u32,
}

impl DependencyGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if the graph has no live nodes.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Adds a node for `key`, or returns the existing node's handle.
    ///
    /// The kind of an existing node is left untouched; use
    /// [`set_kind`](Self::set_kind) to change it.
    pub fn add_node(&mut self, key: ElementKey, kind: NodeKind) -> NodeId {
        if let Some(&id) = self.index.get(&key) {
            return id;
        }
        let id = NodeId::from_raw(self.nodes.len() as u32);
        self.index.insert(key.clone(), id);
        self.nodes.push(Some(Node::new(key, kind)));
        id
    }

    /// Looks up the handle of `key`.
    pub fn node_id(&self, key: &ElementKey) -> Option<NodeId> {
        self.index.get(key).copied()
    }

    /// Returns the node behind `id`, if it is live.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    /// Returns the node for `key`, if present.
    pub fn node_by_key(&self, key: &ElementKey) -> Option<&Node> {
        self.node_id(key).and_then(|id| self.node(id))
    }

    fn live(&self, id: NodeId) -> Result<&Node, GraphError> {
        self.node(id).ok_or(GraphError::UnknownNode(id))
    }

    fn live_mut(&mut self, id: NodeId) -> Result<&mut Node, GraphError> {
        self.nodes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(GraphError::UnknownNode(id))
    }

    /// Replaces the kind payload of a node. Edges and order are kept.
    pub fn set_kind(&mut self, id: NodeId, kind: NodeKind) -> Result<(), GraphError> {
        self.live_mut(id)?.kind = kind;
        Ok(())
    }

    /// Mutable access to a node's kind payload.
    pub fn kind_mut(&mut self, id: NodeId) -> Result<&mut NodeKind, GraphError> {
        Ok(&mut self.live_mut(id)?.kind)
    }

    /// Nodes `id` depends on. Empty for unknown handles.
    pub fn dependencies(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[], Node::dependencies)
    }

    /// Nodes depending on `id`. Empty for unknown handles.
    pub fn dependents(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[], Node::dependents)
    }

    /// Iterates over live nodes in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|n| (NodeId::from_raw(i as u32), n)))
    }

    /// Iterates over every edge as `(dependent, dependency)`.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.iter()
            .flat_map(|(id, node)| node.dependencies.iter().map(move |&dep| (id, dep)))
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.iter().map(|(_, n)| n.dependencies.len()).sum()
    }

    /// Replaces the dependencies of `id` with `deps`.
    ///
    /// Old edges are removed from both ends, the new ones (deduplicated,
    /// first occurrence wins) are installed with their backward links, and
    /// the cached order of `id` and of every transitive dependent is
    /// invalidated.
    pub fn set_dependencies(&mut self, id: NodeId, deps: &[NodeId]) -> Result<(), GraphError> {
        self.live(id)?;
        let mut unique = Vec::with_capacity(deps.len());
        for &dep in deps {
            self.live(dep)?;
            if !unique.contains(&dep) {
                unique.push(dep);
            }
        }

        let old = std::mem::take(&mut self.live_mut(id)?.dependencies);
        for dep in old {
            let dependents = &mut self.live_mut(dep)?.dependents;
            if let Some(pos) = dependents.iter().position(|&d| d == id) {
                dependents.swap_remove(pos);
            }
        }
        for &dep in &unique {
            self.live_mut(dep)?.dependents.push(id);
        }
        self.live_mut(id)?.dependencies = unique;

        self.invalidate_order(id);
        Ok(())
    }

    /// Forgets the cached order of `id` and of all its transitive dependents.
    fn invalidate_order(&mut self, id: NodeId) {
        let mut work = vec![id];
        let mut first = true;
        while let Some(current) = work.pop() {
            let Some(node) = self.nodes.get_mut(current.index()).and_then(Option::as_mut) else {
                continue;
            };
            // A node with an unknown order cannot have dependents with a
            // known one, so the walk can stop there.
            if node.order == -1 && !first {
                continue;
            }
            first = false;
            node.order = -1;
            work.extend(node.dependents.iter().copied());
        }
    }

    /// Removes a node that no other node depends on.
    ///
    /// Its outgoing edges are unlinked. Removing a node that still has
    /// dependents is an integrity violation.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node, GraphError> {
        let node = self.live(id)?;
        if !node.dependents.is_empty() {
            return Err(GraphError::HasDependents {
                key: node.key.clone(),
                count: node.dependents.len(),
            });
        }
        self.set_dependencies(id, &[])?;
        let node = self.nodes[id.index()]
            .take()
            .ok_or(GraphError::UnknownNode(id))?;
        self.index.remove(&node.key);
        Ok(node)
    }

    /// Returns the topological order of `id`, computing and caching it.
    ///
    /// Leaves have order 1; every other node has `1 + max(order of its
    /// dependencies)`. A node is marked with the provisional order 0 while it
    /// is on the walk path, so a back edge contributes 0 instead of looping.
    /// Under [`CyclePolicy::Reject`] a back edge is an error instead and every
    /// provisional mark is rolled back.
    pub fn order(&mut self, id: NodeId, policy: CyclePolicy) -> Result<u32, GraphError> {
        let start = self.live(id)?.order;
        if start > 0 {
            return Ok(start as u32);
        }
        if start == 0 {
            return Err(GraphError::IntegrityViolation(format!(
                "stale provisional order on {}",
                self.live(id)?.key
            )));
        }

        self.live_mut(id)?.order = 0;
        let mut stack = vec![Frame { id, next: 0, max: 0 }];
        loop {
            let Some(frame) = stack.last() else {
                break;
            };
            let (current, next) = (frame.id, frame.next);
            let node = self.live(current)?;

            if let Some(&dep) = node.dependencies.get(next) {
                if let Some(top) = stack.last_mut() {
                    top.next += 1;
                }
                let dep_order = self.live(dep)?.order;
                match dep_order {
                    -1 => {
                        self.live_mut(dep)?.order = 0;
                        stack.push(Frame {
                            id: dep,
                            next: 0,
                            max: 0,
                        });
                    }
                    0 => {
                        trace!(
                            from = %self.live(current)?.key,
                            to = %self.live(dep)?.key,
                            "back edge"
                        );
                        if policy == CyclePolicy::Reject {
                            let key = self.live(dep)?.key.clone();
                            for frame in &stack {
                                self.live_mut(frame.id)?.order = -1;
                            }
                            return Err(GraphError::Cycle(key));
                        }
                    }
                    n => {
                        if let Some(top) = stack.last_mut() {
                            top.max = top.max.max(n as u32);
                        }
                    }
                }
            } else {
                let value = stack.last().map_or(0, |f| f.max) + 1;
                self.live_mut(current)?.order = value as i32;
                stack.pop();
                if let Some(parent) = stack.last_mut() {
                    parent.max = parent.max.max(value);
                }
                if stack.is_empty() {
                    return Ok(value);
                }
            }
        }
        Err(GraphError::IntegrityViolation(
            "ordering walk ended without a result".to_string(),
        ))
    }

    /// Branches the whole graph.
    ///
    /// Pass 1 clones every node's payload without edges; pass 2 walks each
    /// original node's dependency list and installs the edge in the copy,
    /// which rebuilds every dependent list from scratch. Handles are
    /// preserved, identities are not shared.
    pub fn copy(&self) -> Self {
        let mut nodes: Vec<Option<Node>> = self
            .nodes
            .iter()
            .map(|slot| slot.as_ref().map(Node::detached))
            .collect();

        for (i, slot) in self.nodes.iter().enumerate() {
            let Some(old) = slot else { continue };
            for &dep in &old.dependencies {
                if let Some(node) = nodes[i].as_mut() {
                    node.dependencies.push(dep);
                }
                if let Some(target) = nodes.get_mut(dep.index()).and_then(Option::as_mut) {
                    target.dependents.push(NodeId::from_raw(i as u32));
                }
            }
        }

        Self {
            nodes,
            index: self.index.clone(),
        }
    }

    /// Removes stand-in, namespace and archive nodes that have neither
    /// dependents nor dependencies. Returns how many were removed.
    pub fn sweep_orphans(&mut self) -> usize {
        let orphans: Vec<NodeId> = self
            .iter()
            .filter(|(_, n)| {
                !n.kind.is_compiled_unit() && n.dependents.is_empty() && n.dependencies.is_empty()
            })
            .map(|(id, _)| id)
            .collect();
        let mut removed = 0;
        for id in orphans {
            if self.remove_node(id).is_ok() {
                removed += 1;
            }
        }
        removed
    }

    /// Verifies edge symmetry and the key index.
    pub fn check_integrity(&self) -> Result<(), GraphError> {
        let violation = |msg: String| Err(GraphError::IntegrityViolation(msg));

        for (id, node) in self.iter() {
            if self.index.get(&node.key) != Some(&id) {
                return violation(format!("{} is not indexed under its handle", node.key));
            }
            for &dep in &node.dependencies {
                let Some(target) = self.node(dep) else {
                    return violation(format!("{} depends on a removed node", node.key));
                };
                let forward = node.dependencies.iter().filter(|&&d| d == dep).count();
                let backward = target.dependents.iter().filter(|&&d| d == id).count();
                if forward != backward {
                    return violation(format!(
                        "edge {} -> {} is not symmetric",
                        node.key, target.key
                    ));
                }
            }
            for &dependent in &node.dependents {
                match self.node(dependent) {
                    Some(source) if source.dependencies.contains(&id) => {}
                    Some(source) => {
                        return violation(format!(
                            "{} lists {} as dependent without an edge",
                            node.key, source.key
                        ))
                    }
                    None => {
                        return violation(format!("{} has a removed dependent", node.key));
                    }
                }
            }
        }
        if self.index.len() != self.iter().count() {
            return violation("key index and arena disagree".to_string());
        }
        Ok(())
    }
}

impl Clone for DependencyGraph {
    fn clone(&self) -> Self {
        self.copy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use verdict_common::{SourceLocation, TypeName, UnitId};

    fn unit(graph: &mut DependencyGraph, name: &str) -> NodeId {
        graph.add_node(
            ElementKey::Unit(UnitId::from(format!("p/{name}.java"))),
            NodeKind::unit(SourceLocation::new("p", format!("{name}.java"))),
        )
    }

    fn order(graph: &mut DependencyGraph, id: NodeId) -> u32 {
        graph.order(id, CyclePolicy::Approximate).unwrap()
    }

    fn edge_keys(graph: &DependencyGraph) -> Vec<(ElementKey, ElementKey)> {
        let mut edges: Vec<_> = graph
            .edges()
            .map(|(a, b)| {
                (
                    graph.node(a).unwrap().key().clone(),
                    graph.node(b).unwrap().key().clone(),
                )
            })
            .collect();
        edges.sort();
        edges
    }

    #[test]
    fn add_node_is_idempotent() {
        let mut g = DependencyGraph::new();
        let a = unit(&mut g, "A");
        let again = g.add_node(
            ElementKey::Unit(UnitId::from("p/A.java")),
            NodeKind::TypeStandIn,
        );
        assert_eq!(a, again);
        assert_eq!(g.len(), 1);
        assert!(g.node(a).unwrap().kind().is_compiled_unit());
    }

    #[test]
    fn set_dependencies_is_symmetric() {
        let mut g = DependencyGraph::new();
        let a = unit(&mut g, "A");
        let b = unit(&mut g, "B");
        let c = unit(&mut g, "C");
        g.set_dependencies(a, &[b, c, b]).unwrap();
        assert_eq!(g.dependencies(a), &[b, c]);
        assert_eq!(g.dependents(b), &[a]);
        assert_eq!(g.dependents(c), &[a]);

        g.set_dependencies(a, &[c]).unwrap();
        assert!(g.dependents(b).is_empty());
        assert_eq!(g.dependents(c), &[a]);
        g.check_integrity().unwrap();
    }

    #[test]
    fn set_dependencies_rejects_unknown_nodes() {
        let mut g = DependencyGraph::new();
        let a = unit(&mut g, "A");
        let err = g.set_dependencies(a, &[NodeId::from_raw(99)]).unwrap_err();
        assert_eq!(err, GraphError::UnknownNode(NodeId::from_raw(99)));
        assert!(g.dependencies(a).is_empty());
    }

    #[test]
    fn order_follows_dependencies() {
        let mut g = DependencyGraph::new();
        let a = unit(&mut g, "A");
        let b = unit(&mut g, "B");
        let c = unit(&mut g, "C");
        g.set_dependencies(a, &[b]).unwrap();
        g.set_dependencies(b, &[c]).unwrap();
        assert_eq!(order(&mut g, c), 1);
        assert_eq!(order(&mut g, b), 2);
        assert_eq!(order(&mut g, a), 3);
    }

    #[test]
    fn order_is_invalidated_transitively() {
        let mut g = DependencyGraph::new();
        let a = unit(&mut g, "A");
        let b = unit(&mut g, "B");
        let c = unit(&mut g, "C");
        let d = unit(&mut g, "D");
        g.set_dependencies(a, &[b]).unwrap();
        g.set_dependencies(b, &[c]).unwrap();
        assert_eq!(order(&mut g, a), 3);

        g.set_dependencies(c, &[d]).unwrap();
        assert!(g.node(a).unwrap().cached_order().is_none());
        assert!(g.node(b).unwrap().cached_order().is_none());
        assert_eq!(order(&mut g, a), 4);
    }

    #[test]
    fn cycles_terminate_under_approximate_policy() {
        let mut g = DependencyGraph::new();
        let a = unit(&mut g, "A");
        let b = unit(&mut g, "B");
        let c = unit(&mut g, "C");
        g.set_dependencies(a, &[b]).unwrap();
        g.set_dependencies(b, &[a, c]).unwrap();
        let oa = order(&mut g, a);
        let ob = order(&mut g, b);
        let oc = order(&mut g, c);
        assert!(oc < ob);
        assert!(oa >= 1 && ob >= 1);
        g.check_integrity().unwrap();
    }

    #[test]
    fn self_reference_terminates() {
        let mut g = DependencyGraph::new();
        let a = unit(&mut g, "A");
        g.set_dependencies(a, &[a]).unwrap();
        assert_eq!(order(&mut g, a), 1);
        assert_eq!(g.dependents(a), &[a]);
    }

    #[test]
    fn reject_policy_reports_cycle_and_rolls_back() {
        let mut g = DependencyGraph::new();
        let a = unit(&mut g, "A");
        let b = unit(&mut g, "B");
        g.set_dependencies(a, &[b]).unwrap();
        g.set_dependencies(b, &[a]).unwrap();
        let err = g.order(a, CyclePolicy::Reject).unwrap_err();
        assert!(matches!(err, GraphError::Cycle(_)));
        assert!(g.node(a).unwrap().cached_order().is_none());
        assert_eq!(g.node(b).unwrap().order, -1);
        // Still usable afterwards.
        assert!(g.order(a, CyclePolicy::Approximate).is_ok());
    }

    #[test]
    fn remove_requires_no_dependents() {
        let mut g = DependencyGraph::new();
        let a = unit(&mut g, "A");
        let b = unit(&mut g, "B");
        g.set_dependencies(a, &[b]).unwrap();
        assert!(matches!(
            g.remove_node(b),
            Err(GraphError::HasDependents { count: 1, .. })
        ));

        let removed = g.remove_node(a).unwrap();
        assert_eq!(removed.key(), &ElementKey::Unit(UnitId::from("p/A.java")));
        assert!(g.dependents(b).is_empty());
        assert!(g.node(a).is_none());
        assert_eq!(g.len(), 1);
        g.remove_node(b).unwrap();
        assert!(g.is_empty());
        g.check_integrity().unwrap();
    }

    #[test]
    fn removed_slots_are_not_reused() {
        let mut g = DependencyGraph::new();
        let a = unit(&mut g, "A");
        g.remove_node(a).unwrap();
        let b = unit(&mut g, "B");
        assert_ne!(a, b);
        assert!(g.node(a).is_none());
    }

    #[test]
    fn copy_has_same_edges_and_is_independent() {
        let mut g = DependencyGraph::new();
        let a = unit(&mut g, "A");
        let b = unit(&mut g, "B");
        let c = unit(&mut g, "C");
        let t = g.add_node(ElementKey::Type(TypeName::from("q.T")), NodeKind::TypeStandIn);
        g.set_dependencies(a, &[b, t]).unwrap();
        g.set_dependencies(b, &[c, t]).unwrap();

        let mut copy = g.copy();
        assert_eq!(edge_keys(&copy), edge_keys(&g));
        copy.check_integrity().unwrap();

        copy.set_dependencies(a, &[]).unwrap();
        assert_eq!(g.dependencies(a), &[b, t]);
        assert_eq!(g.dependents(t).len(), 2);
        assert_eq!(copy.dependents(t).len(), 1);
    }

    #[test]
    fn clone_is_copy() {
        let mut g = DependencyGraph::new();
        let a = unit(&mut g, "A");
        let b = unit(&mut g, "B");
        g.set_dependencies(a, &[b]).unwrap();
        let cloned = g.clone();
        assert_eq!(edge_keys(&cloned), edge_keys(&g));
    }

    #[test]
    fn sweep_removes_unreferenced_stand_ins_only() {
        let mut g = DependencyGraph::new();
        let a = unit(&mut g, "A");
        let used = g.add_node(ElementKey::Type(TypeName::from("q.Used")), NodeKind::TypeStandIn);
        g.add_node(ElementKey::Type(TypeName::from("q.Unused")), NodeKind::TypeStandIn);
        g.add_node(ElementKey::Namespace("q".into()), NodeKind::Namespace);
        let lonely = unit(&mut g, "Lonely");
        g.set_dependencies(a, &[used]).unwrap();

        assert_eq!(g.sweep_orphans(), 2);
        assert!(g.node(used).is_some());
        assert!(g.node(lonely).is_some());
        assert_eq!(g.len(), 3);
    }

    #[test]
    fn serde_preserves_edges() {
        let mut g = DependencyGraph::new();
        let a = unit(&mut g, "A");
        let b = unit(&mut g, "B");
        g.set_dependencies(a, &[b]).unwrap();
        let json = serde_json::to_string(&g.nodes).unwrap();
        let nodes: Vec<Option<Node>> = serde_json::from_str(&json).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].as_ref().unwrap().dependencies(), &[b]);
    }

    fn build(edges: &[(usize, usize)], size: usize) -> (DependencyGraph, Vec<NodeId>) {
        let mut g = DependencyGraph::new();
        let ids: Vec<NodeId> = (0..size).map(|i| unit(&mut g, &format!("U{i}"))).collect();
        let mut deps: Vec<Vec<NodeId>> = vec![Vec::new(); size];
        for &(from, to) in edges {
            deps[from].push(ids[to]);
        }
        for (i, d) in deps.iter().enumerate() {
            g.set_dependencies(ids[i], d).unwrap();
        }
        (g, ids)
    }

    proptest! {
        #[test]
        fn acyclic_order_respects_edges(
            size in 1usize..24,
            raw in prop::collection::vec((0usize..24, 0usize..24), 0..60),
        ) {
            // Orient every edge from the higher to the lower index: a DAG.
            let edges: Vec<(usize, usize)> = raw
                .into_iter()
                .map(|(a, b)| (a % size, b % size))
                .filter(|(a, b)| a != b)
                .map(|(a, b)| (a.max(b), a.min(b)))
                .collect();
            let (mut g, ids) = build(&edges, size);
            for &(from, to) in &edges {
                let of = g.order(ids[from], CyclePolicy::Reject).unwrap();
                let ot = g.order(ids[to], CyclePolicy::Reject).unwrap();
                prop_assert!(ot < of);
            }
        }

        #[test]
        fn arbitrary_graphs_terminate(
            size in 1usize..16,
            raw in prop::collection::vec((0usize..16, 0usize..16), 0..48),
        ) {
            let edges: Vec<(usize, usize)> =
                raw.into_iter().map(|(a, b)| (a % size, b % size)).collect();
            let (mut g, ids) = build(&edges, size);
            for &id in &ids {
                prop_assert!(g.order(id, CyclePolicy::Approximate).unwrap() >= 1);
            }
            g.check_integrity().unwrap();
            let copy = g.copy();
            prop_assert_eq!(edge_keys(&copy), edge_keys(&g));
        }
    }
}
