//! Cycle detection over the blocking subgraph.
//!
//! # Edge Direction
//!
//! Views use `predecessor -> successor`. Adding a precedence `pred -> succ`
//! closes a cycle exactly when `pred` is already reachable from `succ`.
//!
//! Cycles are reported without repeating the closing node: `[a, b, c]`
//! stands for `a -> b -> c -> a`.

#![allow(clippy::module_name_repetitions)]

use super::view::BlockingView;
use crate::domain::ItemId;
use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};

/// Check whether adding `pred -> succ` would introduce a cycle.
///
/// Depth-first search from `succ` looking for `pred`. Returns the cycle as
/// `[pred, succ, ..]` when one would be closed.
#[must_use]
pub fn would_create_cycle(view: &BlockingView, pred: &ItemId, succ: &ItemId) -> Option<Vec<ItemId>> {
    let from = view.node(pred)?;
    let to = view.node(succ)?;

    let mut stack = vec![to];
    let mut visited: HashSet<NodeIndex> = HashSet::from([to]);
    let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();

    while let Some(current) = stack.pop() {
        if current == from {
            return Some(reconstruct(view, from, to, &parent));
        }

        // reversed so the first successor is explored first
        for &next in view.successors(current).iter().rev() {
            if visited.insert(next) {
                parent.insert(next, current);
                stack.push(next);
            }
        }
    }

    None
}

/// Rebuild `to -> .. -> from` from parent links and prepend `from`.
fn reconstruct(
    view: &BlockingView,
    from: NodeIndex,
    to: NodeIndex,
    parent: &HashMap<NodeIndex, NodeIndex>,
) -> Vec<ItemId> {
    let mut walk = Vec::new();
    let mut cursor = from;
    while cursor != to {
        match parent.get(&cursor) {
            Some(prev) => {
                cursor = *prev;
                walk.push(cursor);
            }
            None => break,
        }
    }
    walk.reverse();

    let mut cycle = Vec::with_capacity(walk.len() + 1);
    cycle.push(view.id(from).clone());
    cycle.extend(walk.into_iter().map(|idx| view.id(idx).clone()));
    cycle
}

/// One cycle found in the blocking subgraph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Every item in the strongly connected component, in view order
    pub members: Vec<ItemId>,

    /// One concrete cycle inside the component
    pub path: Vec<ItemId>,
}

impl CycleReport {
    /// Number of items on the reported path
    pub fn len(&self) -> usize {
        self.path.len()
    }

    /// Whether the path is empty (never true for a reported cycle)
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }
}

/// Find every cycle currently present in `view`.
///
/// One report per non-trivial strongly connected component, ordered by
/// the first appearance of the component's members. The path is the
/// shortest cycle through the component's first member.
#[must_use]
pub fn find_all_cycles(view: &BlockingView) -> Vec<CycleReport> {
    cyclic_components(view)
        .into_iter()
        .map(|component| {
            let members: HashSet<NodeIndex> = component.iter().copied().collect();
            // strongly connected components always close
            let path = shortest_cycle_from(view, &members, component[0])
                .unwrap_or_else(|| component.clone());
            report(view, &component, &path)
        })
        .collect()
}

/// Components holding a cycle of at most `max_len` items.
///
/// With a bound, each component is searched from every member and the
/// shortest cycle found becomes the reported path, so a short loop inside
/// a larger component is not missed. Without one this is
/// [`find_all_cycles`].
#[must_use]
pub fn find_cycles_up_to(view: &BlockingView, max_len: Option<usize>) -> Vec<CycleReport> {
    let Some(max_len) = max_len else {
        return find_all_cycles(view);
    };

    cyclic_components(view)
        .into_iter()
        .filter_map(|component| {
            let members: HashSet<NodeIndex> = component.iter().copied().collect();
            let shortest = component
                .iter()
                .filter_map(|&start| shortest_cycle_from(view, &members, start))
                .min_by_key(Vec::len)?;
            (shortest.len() <= max_len).then(|| report(view, &component, &shortest))
        })
        .collect()
}

/// Non-trivial strongly connected components, members and components in
/// view order
fn cyclic_components(view: &BlockingView) -> Vec<Vec<NodeIndex>> {
    let mut components: Vec<Vec<NodeIndex>> = tarjan_scc(view.graph())
        .into_iter()
        .filter(|component| component.len() > 1)
        .map(|mut component| {
            component.sort_unstable();
            component
        })
        .collect();
    components.sort_unstable_by_key(|component| component[0]);
    components
}

fn report(view: &BlockingView, component: &[NodeIndex], path: &[NodeIndex]) -> CycleReport {
    CycleReport {
        members: component.iter().map(|&idx| view.id(idx).clone()).collect(),
        path: path.iter().map(|&idx| view.id(idx).clone()).collect(),
    }
}

/// BFS inside `members` from `start` back to itself.
fn shortest_cycle_from(
    view: &BlockingView,
    members: &HashSet<NodeIndex>,
    start: NodeIndex,
) -> Option<Vec<NodeIndex>> {
    let mut queue = VecDeque::from([start]);
    let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut visited: HashSet<NodeIndex> = HashSet::from([start]);

    while let Some(current) = queue.pop_front() {
        for &next in view.successors(current) {
            if !members.contains(&next) {
                continue;
            }
            if next == start {
                let mut path = vec![current];
                let mut cursor = current;
                while let Some(prev) = parent.get(&cursor) {
                    cursor = *prev;
                    path.push(cursor);
                }
                path.reverse();
                return Some(path);
            }
            if visited.insert(next) {
                parent.insert(next, current);
                queue.push_back(next);
            }
        }
    }

    None
}
