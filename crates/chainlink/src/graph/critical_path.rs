//! Critical path analysis for the blocking subgraph.
//!
//! # Overview
//!
//! The critical path is the chain of blocking relationships with the largest
//! cumulative effort. Any slip on it moves the projected completion date of
//! the whole scope.
//!
//! # Algorithm
//!
//! 1. Topologically order the view (Kahn's algorithm, roots released in
//!    first-appearance order). A cycle aborts the computation.
//! 2. Forward pass: `cumulative(n) = effort(n) + max(cumulative(pred))`,
//!    with ties going to the earliest-inserted predecessor.
//! 3. Pick the terminal with the largest cumulative effort (first in
//!    topological order on ties) and walk the chosen predecessors back.
//! 4. Completion date of a node is `start_date + cumulative(n)` days.
//!
//! Unknown items contribute zero effort and are listed in `flagged`.

#![allow(clippy::module_name_repetitions)]

use super::view::BlockingView;
use crate::config::AnalysisConfig;
use crate::domain::{ItemId, WorkflowState};
use crate::error::Result;
use crate::items::{FlaggedItem, ItemTable};
use chrono::NaiveDate;
use petgraph::graph::NodeIndex;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Summary of the critical path of one scope
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriticalPathDetails {
    /// Items on the critical path, roots first
    pub path: Vec<ItemId>,

    /// Number of items on the path
    pub path_length: usize,

    /// Sum of the efforts along the path
    pub total_effort: u64,

    /// Day the scope starts
    pub start_date: NaiveDate,

    /// `start_date + total_effort` days
    pub estimated_completion_date: NaiveDate,

    /// Items with disproportionate downstream impact
    pub bottlenecks: Vec<Bottleneck>,

    /// Items whose effort could not be looked up
    pub flagged: Vec<FlaggedItem>,
}

/// An item whose transitive downstream impact is well above average
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bottleneck {
    /// Item reference
    pub id: ItemId,

    /// Number of items transitively waiting on it
    pub impact_count: usize,

    /// Whether it sits on the critical path
    pub on_critical_path: bool,
}

/// Per-node schedule entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledItem {
    /// Item reference
    pub id: ItemId,

    /// Title, when the item was found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Status, when the item was found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<WorkflowState>,

    /// Effort of this item alone
    pub effort: u64,

    /// Effort of the longest chain ending at this item
    pub cumulative_effort: u64,

    /// Projected completion
    pub estimated_completion_date: NaiveDate,
}

/// Where one item stands relative to the critical path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemCriticalPath {
    /// Item reference
    pub id: ItemId,

    /// Whether the item is on the critical path
    pub on_critical_path: bool,

    /// 1-based position on the critical path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,

    /// The critical path of the scope
    pub critical_path: Vec<ItemId>,

    /// Blocking predecessors of the item
    pub direct_dependencies: Vec<ItemId>,

    /// Transitive blocking predecessors that are not direct
    pub indirect_dependencies: Vec<ItemId>,

    /// Longest chain ending at the item, roots first
    pub longest_chain: Vec<ItemId>,

    /// Cumulative effort at the item, if it takes part in the schedule
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cumulative_effort: Option<u64>,

    /// Projected completion, if it takes part in the schedule
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_completion_date: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Critical path computation over one [`BlockingView`].
///
/// Owns the view and the resolved items so that simulations can derive
/// modified copies without touching the live store.
#[derive(Debug, Clone)]
pub struct CriticalPathAnalysis {
    view: BlockingView,
    items: ItemTable,
    config: AnalysisConfig,
    effort: Vec<u64>,
    order: Vec<NodeIndex>,
    cumulative: Vec<u64>,
    best_pred: Vec<Option<NodeIndex>>,
    path: Vec<NodeIndex>,
}

impl CriticalPathAnalysis {
    /// Schedule every node of `view` with efforts from `items`.
    ///
    /// # Errors
    ///
    /// Returns `Error::CircularDependency` if the view contains a cycle.
    pub fn compute(view: BlockingView, items: ItemTable, config: AnalysisConfig) -> Result<Self> {
        let effort = view
            .nodes()
            .map(|idx| u64::from(items.effort(view.id(idx))))
            .collect();
        Self::schedule(view, items, config, effort)
    }

    fn schedule(
        view: BlockingView,
        items: ItemTable,
        config: AnalysisConfig,
        effort: Vec<u64>,
    ) -> Result<Self> {
        let order = view.topological_order()?;
        let mut cumulative = vec![0u64; view.len()];
        let mut best_pred: Vec<Option<NodeIndex>> = vec![None; view.len()];

        for &node in &order {
            let mut best: Option<NodeIndex> = None;
            for &pred in view.predecessors(node) {
                if best.is_none_or(|b| cumulative[pred.index()] > cumulative[b.index()]) {
                    best = Some(pred);
                }
            }
            let upstream = best.map_or(0, |b| cumulative[b.index()]);
            cumulative[node.index()] = effort[node.index()].saturating_add(upstream);
            best_pred[node.index()] = best;
        }

        let mut end: Option<NodeIndex> = None;
        for &node in order.iter().filter(|&&n| view.is_terminal(n)) {
            if end.is_none_or(|e| cumulative[node.index()] > cumulative[e.index()]) {
                end = Some(node);
            }
        }

        let path = end.map_or_else(Vec::new, |end| chain_to(&best_pred, end));

        let analysis = Self {
            view,
            items,
            config,
            effort,
            order,
            cumulative,
            best_pred,
            path,
        };
        tracing::debug!(
            nodes = analysis.view.len(),
            path_length = analysis.path.len(),
            total_effort = analysis.total_effort(),
            "Computed critical path"
        );
        Ok(analysis)
    }

    /// Copy of this analysis with `extra` effort added to `id`.
    ///
    /// Items outside the view are unaffected.
    ///
    /// # Errors
    ///
    /// Propagates scheduling errors; none occur on an already scheduled view.
    pub fn with_extra_effort(&self, id: &ItemId, extra: u64) -> Result<Self> {
        let mut effort = self.effort.clone();
        if let Some(idx) = self.view.node(id) {
            effort[idx.index()] = effort[idx.index()].saturating_add(extra);
        }
        Self::schedule(self.view.clone(), self.items.clone(), self.config, effort)
    }

    /// Recompute on a view without `id`.
    ///
    /// # Errors
    ///
    /// Propagates scheduling errors; none occur on an already scheduled view.
    pub fn without_item(&self, id: &ItemId) -> Result<Self> {
        Self::compute(self.view.without(id), self.items.clone(), self.config)
    }

    /// The view this analysis was computed on
    pub fn view(&self) -> &BlockingView {
        &self.view
    }

    /// Items resolved for this analysis
    pub fn items(&self) -> &ItemTable {
        &self.items
    }

    /// Parameters in use
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Item ids on the critical path, roots first
    pub fn critical_path(&self) -> Vec<ItemId> {
        self.ids(&self.path)
    }

    /// Sum of efforts along the critical path
    pub fn total_effort(&self) -> u64 {
        self.path.last().map_or(0, |end| self.cumulative[end.index()])
    }

    /// Whether `id` lies on the critical path
    pub fn is_on_critical_path(&self, id: &ItemId) -> bool {
        self.position(id).is_some()
    }

    /// 1-based position of `id` on the critical path
    pub fn position(&self, id: &ItemId) -> Option<usize> {
        let idx = self.view.node(id)?;
        self.path.iter().position(|&n| n == idx).map(|p| p + 1)
    }

    /// Effort of the longest chain ending at `id`
    pub fn cumulative_effort(&self, id: &ItemId) -> Option<u64> {
        self.view.node(id).map(|idx| self.cumulative[idx.index()])
    }

    /// Projected completion of `id`
    pub fn completion_date(&self, id: &ItemId) -> Option<NaiveDate> {
        self.cumulative_effort(id)
            .map(|days| self.config.project_date(days))
    }

    /// Nodes in topological order
    pub fn order(&self) -> &[NodeIndex] {
        &self.order
    }

    /// Path length, total effort, bottlenecks and completion date
    pub fn details(&self) -> CriticalPathDetails {
        let total_effort = self.total_effort();
        CriticalPathDetails {
            path: self.critical_path(),
            path_length: self.path.len(),
            total_effort,
            start_date: self.config.start_date,
            estimated_completion_date: self.config.project_date(total_effort),
            bottlenecks: self.bottlenecks(),
            flagged: self.items.flagged().to_vec(),
        }
    }

    /// Schedule entries for the critical path
    pub fn with_estimates(&self) -> Vec<ScheduledItem> {
        self.path.iter().map(|&idx| self.scheduled(idx)).collect()
    }

    /// Schedule entries for every node, in topological order
    pub fn full_schedule(&self) -> Vec<ScheduledItem> {
        self.order.iter().map(|&idx| self.scheduled(idx)).collect()
    }

    /// Schedule entry for one node
    pub fn scheduled(&self, idx: NodeIndex) -> ScheduledItem {
        let id = self.view.id(idx);
        let resolved = self.items.get(id);
        let cumulative = self.cumulative[idx.index()];
        ScheduledItem {
            id: id.clone(),
            title: resolved.and_then(|item| item.title.clone()),
            status: resolved.and_then(|item| item.status),
            effort: self.effort[idx.index()],
            cumulative_effort: cumulative,
            estimated_completion_date: self.config.project_date(cumulative),
        }
    }

    /// Where `id` stands relative to the critical path.
    ///
    /// An item outside the blocking subgraph is reported as off the path
    /// with empty dependency lists.
    pub fn item_critical_path(&self, id: &ItemId) -> ItemCriticalPath {
        let critical_path = self.critical_path();
        let Some(idx) = self.view.node(id) else {
            return ItemCriticalPath {
                id: id.clone(),
                on_critical_path: false,
                position: None,
                critical_path,
                direct_dependencies: Vec::new(),
                indirect_dependencies: Vec::new(),
                longest_chain: Vec::new(),
                cumulative_effort: None,
                estimated_completion_date: None,
            };
        };

        let direct = self.view.predecessors(idx);
        let indirect: Vec<NodeIndex> = self
            .view
            .ancestors(idx)
            .into_iter()
            .filter(|n| !direct.contains(n))
            .collect();
        let position = self.position(id);

        ItemCriticalPath {
            id: id.clone(),
            on_critical_path: position.is_some(),
            position,
            critical_path,
            direct_dependencies: self.ids(direct),
            indirect_dependencies: self.ids(&indirect),
            longest_chain: self.ids(&chain_to(&self.best_pred, idx)),
            cumulative_effort: Some(self.cumulative[idx.index()]),
            estimated_completion_date: Some(self.config.project_date(self.cumulative[idx.index()])),
        }
    }

    /// Nodes whose downstream impact count exceeds
    /// `bottleneck_factor` times the average, largest impact first
    pub fn bottlenecks(&self) -> Vec<Bottleneck> {
        if self.view.is_empty() {
            return Vec::new();
        }

        let counts: Vec<(NodeIndex, usize)> = self
            .order
            .iter()
            .map(|&idx| (idx, self.view.descendants(idx).len()))
            .collect();
        #[allow(clippy::cast_precision_loss)]
        let average = counts.iter().map(|(_, c)| *c).sum::<usize>() as f64 / counts.len() as f64;
        let threshold = self.config.bottleneck_factor * average;

        let mut bottlenecks: Vec<Bottleneck> = counts
            .into_iter()
            .filter(|&(_, count)| {
                #[allow(clippy::cast_precision_loss)]
                let count = count as f64;
                count > 0.0 && count > threshold
            })
            .map(|(idx, impact_count)| Bottleneck {
                id: self.view.id(idx).clone(),
                impact_count,
                on_critical_path: self.path.contains(&idx),
            })
            .collect();
        bottlenecks.sort_by(|a, b| b.impact_count.cmp(&a.impact_count));
        bottlenecks
    }

    fn ids(&self, nodes: &[NodeIndex]) -> Vec<ItemId> {
        nodes.iter().map(|&idx| self.view.id(idx).clone()).collect()
    }
}

/// Walk chosen predecessors back from `end`; returns roots first.
fn chain_to(best_pred: &[Option<NodeIndex>], end: NodeIndex) -> Vec<NodeIndex> {
    let mut chain = vec![end];
    let mut cursor = end;
    while let Some(prev) = best_pred[cursor.index()] {
        chain.push(prev);
        cursor = prev;
    }
    chain.reverse();
    chain
}
