//! Read-only snapshot of the blocking subgraph.
//!
//! A [`BlockingView`] holds one node per item that takes part in a blocking
//! relationship and one edge per distinct `predecessor -> successor` pair.
//! Node indices follow first appearance in the store and adjacency lists
//! follow edge insertion order, so every traversal is deterministic.
//!
//! Views are cheap to derive from one another ([`BlockingView::without`]),
//! which is how the impact simulations stay off the live store.

use super::cycles;
use super::store::DependencyStore;
use crate::domain::ItemId;
use crate::error::{Error, Result};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Bfs, Reversed};
use std::collections::{HashMap, HashSet, VecDeque};

/// Restricts which items a view admits
#[derive(Debug, Clone, Default)]
pub struct ViewFilter {
    scope: Option<HashSet<ItemId>>,
    excluded: Option<ItemId>,
}

impl ViewFilter {
    /// Admit every item
    pub fn all() -> Self {
        Self::default()
    }

    /// Admit only the given items (e.g. the members of a release)
    pub fn within<I>(items: I) -> Self
    where
        I: IntoIterator<Item = ItemId>,
    {
        Self {
            scope: Some(items.into_iter().collect()),
            excluded: None,
        }
    }

    /// Additionally drop one item and all of its edges
    #[must_use]
    pub fn excluding(mut self, id: ItemId) -> Self {
        self.excluded = Some(id);
        self
    }

    fn admits(&self, id: &ItemId) -> bool {
        self.excluded.as_ref() != Some(id)
            && self.scope.as_ref().is_none_or(|scope| scope.contains(id))
    }
}

/// Precedence graph over the blocking relationships of one snapshot
#[derive(Debug, Clone, Default)]
pub struct BlockingView {
    graph: DiGraph<ItemId, ()>,
    index: HashMap<ItemId, NodeIndex>,
    preds: Vec<Vec<NodeIndex>>,
    succs: Vec<Vec<NodeIndex>>,
}

impl BlockingView {
    /// View over every blocking edge in `store`
    pub fn from_store(store: &DependencyStore) -> Self {
        Self::from_pairs(store.precedence_pairs())
    }

    /// View over the blocking edges whose endpoints both pass `filter`
    pub fn from_store_filtered(store: &DependencyStore, filter: &ViewFilter) -> Self {
        Self::from_pairs(
            store
                .precedence_pairs()
                .filter(|(pred, succ)| filter.admits(pred) && filter.admits(succ)),
        )
    }

    fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: Iterator<Item = (&'a ItemId, &'a ItemId)>,
    {
        let mut view = Self::default();
        for (pred, succ) in pairs {
            let p = view.intern(pred);
            let s = view.intern(succ);
            if view.graph.find_edge(p, s).is_none() {
                view.graph.add_edge(p, s, ());
                view.succs[p.index()].push(s);
                view.preds[s.index()].push(p);
            }
        }
        view
    }

    fn intern(&mut self, id: &ItemId) -> NodeIndex {
        if let Some(idx) = self.index.get(id) {
            return *idx;
        }
        let idx = self.graph.add_node(id.clone());
        self.index.insert(id.clone(), idx);
        self.preds.push(Vec::new());
        self.succs.push(Vec::new());
        idx
    }

    /// Copy of this view with `id` and its edges removed
    #[must_use]
    pub fn without(&self, id: &ItemId) -> Self {
        Self::from_pairs(self.pairs().filter(|(pred, succ)| *pred != id && *succ != id))
    }

    /// Distinct precedence pairs in insertion order
    pub fn pairs(&self) -> impl Iterator<Item = (&ItemId, &ItemId)> + '_ {
        self.graph
            .raw_edges()
            .iter()
            .map(|edge| (&self.graph[edge.source()], &self.graph[edge.target()]))
    }

    /// Number of items in the view
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Whether the view has no items
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Whether `id` takes part in any blocking relationship
    pub fn contains(&self, id: &ItemId) -> bool {
        self.index.contains_key(id)
    }

    /// Node index for `id`
    pub fn node(&self, id: &ItemId) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    /// Item at `idx`
    pub fn id(&self, idx: NodeIndex) -> &ItemId {
        &self.graph[idx]
    }

    /// All items in first-appearance order
    pub fn ids(&self) -> impl Iterator<Item = &ItemId> + '_ {
        self.graph.node_indices().map(|idx| &self.graph[idx])
    }

    /// All node indices in first-appearance order
    pub fn nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    /// Direct predecessors in insertion order
    pub fn predecessors(&self, idx: NodeIndex) -> &[NodeIndex] {
        &self.preds[idx.index()]
    }

    /// Direct successors in insertion order
    pub fn successors(&self, idx: NodeIndex) -> &[NodeIndex] {
        &self.succs[idx.index()]
    }

    /// No incoming precedence
    pub fn is_root(&self, idx: NodeIndex) -> bool {
        self.preds[idx.index()].is_empty()
    }

    /// No outgoing precedence
    pub fn is_terminal(&self, idx: NodeIndex) -> bool {
        self.succs[idx.index()].is_empty()
    }

    /// Underlying petgraph graph
    pub fn graph(&self) -> &DiGraph<ItemId, ()> {
        &self.graph
    }

    /// Kahn's algorithm; roots are released in first-appearance order.
    ///
    /// # Errors
    ///
    /// Returns `Error::CircularDependency` with one offending cycle if the
    /// view is not acyclic.
    pub fn topological_order(&self) -> Result<Vec<NodeIndex>> {
        let mut in_degree: Vec<usize> = self.preds.iter().map(Vec::len).collect();
        let mut queue: VecDeque<NodeIndex> =
            self.nodes().filter(|idx| in_degree[idx.index()] == 0).collect();
        let mut order = Vec::with_capacity(self.len());

        while let Some(idx) = queue.pop_front() {
            order.push(idx);
            for &next in self.successors(idx) {
                in_degree[next.index()] -= 1;
                if in_degree[next.index()] == 0 {
                    queue.push_back(next);
                }
            }
        }

        if order.len() == self.len() {
            return Ok(order);
        }

        let cycle = cycles::find_all_cycles(self)
            .into_iter()
            .next()
            .map(|report| report.path)
            .unwrap_or_else(|| {
                self.nodes()
                    .filter(|idx| in_degree[idx.index()] > 0)
                    .map(|idx| self.id(idx).clone())
                    .collect()
            });
        Err(Error::CircularDependency { cycle })
    }

    /// Everything reachable forward from `idx`, excluding `idx`, in node order
    pub fn descendants(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut bfs = Bfs::new(&self.graph, idx);
        let mut found = Vec::new();
        while let Some(next) = bfs.next(&self.graph) {
            if next != idx {
                found.push(next);
            }
        }
        found.sort_unstable();
        found
    }

    /// Everything that reaches `idx`, excluding `idx`, in node order
    pub fn ancestors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let reversed = Reversed(&self.graph);
        let mut bfs = Bfs::new(reversed, idx);
        let mut found = Vec::new();
        while let Some(next) = bfs.next(reversed) {
            if next != idx {
                found.push(next);
            }
        }
        found.sort_unstable();
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RelationshipType::{BlockedBy, Blocks, DependsOn, RelatedTo, SubtaskOf};

    fn id(s: &str) -> ItemId {
        ItemId::new(s)
    }

    fn chain_store() -> DependencyStore {
        let mut store = DependencyStore::new("proj");
        store.add_edge(&id("B"), &id("A"), BlockedBy, None).unwrap();
        store.add_edge(&id("C"), &id("B"), DependsOn, None).unwrap();
        store.add_edge(&id("C"), &id("X"), RelatedTo, None).unwrap();
        store
    }

    fn names(view: &BlockingView, nodes: &[NodeIndex]) -> Vec<String> {
        nodes.iter().map(|n| view.id(*n).to_string()).collect()
    }

    #[test]
    fn test_view_ignores_non_blocking_edges_and_dedupes() {
        let view = BlockingView::from_store(&chain_store());
        assert_eq!(view.len(), 3);
        assert!(!view.contains(&id("X")));
        assert_eq!(view.pairs().count(), 2);
    }

    #[test]
    fn test_roots_and_terminals() {
        let view = BlockingView::from_store(&chain_store());
        let a = view.node(&id("A")).unwrap();
        let c = view.node(&id("C")).unwrap();
        assert!(view.is_root(a));
        assert!(view.is_terminal(c));
        assert!(!view.is_terminal(a));
    }

    #[test]
    fn test_topological_order() {
        let view = BlockingView::from_store(&chain_store());
        let order = view.topological_order().unwrap();
        assert_eq!(names(&view, &order), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_topological_order_reports_cycle() {
        let mut store = DependencyStore::new("proj");
        store.import_edge(&id("A"), &id("B"), Blocks, None).unwrap();
        store.import_edge(&id("B"), &id("C"), Blocks, None).unwrap();
        store.import_edge(&id("C"), &id("A"), Blocks, None).unwrap();

        let view = BlockingView::from_store(&store);
        match view.topological_order().unwrap_err() {
            Error::CircularDependency { cycle } => assert_eq!(cycle.len(), 3),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_descendants_and_ancestors() {
        let mut store = chain_store();
        store.add_edge(&id("A"), &id("P"), SubtaskOf, None).unwrap();
        let view = BlockingView::from_store(&store);

        let a = view.node(&id("A")).unwrap();
        let c = view.node(&id("C")).unwrap();
        assert_eq!(names(&view, &view.descendants(a)), vec!["B", "C", "P"]);
        assert_eq!(names(&view, &view.ancestors(c)), vec!["A", "B"]);
        assert!(view.descendants(c).is_empty());
    }

    #[test]
    fn test_without_drops_node_and_edges() {
        let view = BlockingView::from_store(&chain_store());
        let trimmed = view.without(&id("B"));
        assert_eq!(trimmed.len(), 0);
        assert_eq!(view.len(), 3, "original view untouched");
    }

    #[test]
    fn test_filtered_view() {
        let store = chain_store();
        let view = BlockingView::from_store_filtered(&store, &ViewFilter::within([id("B"), id("C")]));
        assert_eq!(view.len(), 2);
        assert!(!view.contains(&id("A")));

        let view = BlockingView::from_store_filtered(&store, &ViewFilter::all().excluding(id("C")));
        assert_eq!(view.len(), 2);
        assert!(!view.contains(&id("C")));
    }
}
