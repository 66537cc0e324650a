//! Blocker and impact analysis.
//!
//! Blockers are read straight off a [`BlockingView`]. Delay and removal
//! simulations derive a modified [`CriticalPathAnalysis`] and compare it to
//! the baseline; neither touches the store.

use super::critical_path::CriticalPathAnalysis;
use super::store::DependencyStore;
use super::view::BlockingView;
use crate::domain::{ItemId, RelationshipType, WorkflowState};
use crate::error::Result;
use crate::items::{FlaggedItem, ItemTable};
use chrono::NaiveDate;
use petgraph::graph::NodeIndex;
use serde::Serialize;
use std::collections::HashSet;

/// An item that other items wait on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockerReport {
    /// Item reference
    pub id: ItemId,

    /// Status, when the item was found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<WorkflowState>,

    /// Whether work is still outstanding (unknown items count as open)
    pub open: bool,

    /// Direct precedence successors
    pub directly_blocks: Vec<ItemId>,

    /// Everything transitively waiting on this item
    pub total_impact: Vec<ItemId>,
}

/// Every item with at least one precedence successor, in view order
pub fn blockers(view: &BlockingView, items: &ItemTable) -> Vec<BlockerReport> {
    view.nodes()
        .filter(|&idx| !view.is_terminal(idx))
        .map(|idx| {
            let id = view.id(idx);
            let status = items.status(id);
            BlockerReport {
                id: id.clone(),
                status,
                open: status.is_none_or(WorkflowState::is_open),
                directly_blocks: ids(view, view.successors(idx)),
                total_impact: ids(view, &view.descendants(idx)),
            }
        })
        .collect()
}

/// Open blockers holding up more than one item
pub fn critical_blockers(reports: &[BlockerReport]) -> Vec<&BlockerReport> {
    reports
        .iter()
        .filter(|report| report.open && report.directly_blocks.len() > 1)
        .collect()
}

/// Projected completion of one item before and after a simulated change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateShift {
    /// Item reference
    pub id: ItemId,

    /// Completion before the change
    pub previous_completion: NaiveDate,

    /// Completion after the change
    pub new_completion: NaiveDate,

    /// Days the completion moved
    pub shift_days: i64,
}

/// Outcome of delaying one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DelayImpact {
    /// Delayed item
    pub id: ItemId,

    /// Effort added to the item
    pub delay: u64,

    /// The item and everything waiting on it, in topological order
    pub affected: Vec<DateShift>,

    /// Critical path effort before the delay
    pub previous_total_effort: u64,

    /// Critical path effort after the delay
    pub new_total_effort: u64,

    /// `new_total_effort - previous_total_effort`
    pub effort_delta: i64,

    /// Critical path after the delay
    pub critical_path: Vec<ItemId>,

    /// Whether the critical path changed
    pub path_changed: bool,

    /// Items scheduled with zero effort because their lookup failed
    pub flagged: Vec<FlaggedItem>,
}

/// Critical path snapshot used in removal reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathSummary {
    /// Items on the critical path
    pub path: Vec<ItemId>,

    /// Sum of efforts along the path
    pub total_effort: u64,

    /// Projected completion
    pub estimated_completion_date: NaiveDate,
}

impl PathSummary {
    fn of(analysis: &CriticalPathAnalysis) -> Self {
        let total_effort = analysis.total_effort();
        Self {
            path: analysis.critical_path(),
            total_effort,
            estimated_completion_date: analysis.config().project_date(total_effort),
        }
    }
}

/// Outcome of removing one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovalImpact {
    /// Removed item
    pub id: ItemId,

    /// Critical path with the item
    pub before: PathSummary,

    /// Critical path without the item
    pub after: PathSummary,

    /// `after.total_effort - before.total_effort`; never positive
    pub effort_delta: i64,

    /// Successors whose only blocking predecessor was the removed item
    pub new_roots: Vec<ItemId>,

    /// Items scheduled with zero effort because their lookup failed
    pub flagged: Vec<FlaggedItem>,
}

/// Simulate `id` taking `delay` more effort.
///
/// An item outside the blocking subgraph only shifts itself.
///
/// # Errors
///
/// Propagates scheduling errors from the recomputation.
pub fn impact_of_delay(
    baseline: &CriticalPathAnalysis,
    id: &ItemId,
    delay: u64,
) -> Result<DelayImpact> {
    let delayed = baseline.with_extra_effort(id, delay)?;
    let view = baseline.view();

    let affected = match view.node(id) {
        Some(idx) => {
            let mut touched: HashSet<NodeIndex> = view.descendants(idx).into_iter().collect();
            touched.insert(idx);
            baseline
                .order()
                .iter()
                .filter(|n| touched.contains(n))
                .filter_map(|&n| date_shift(baseline, &delayed, view.id(n)))
                .collect()
        }
        None => {
            let config = baseline.config();
            let effort = u64::from(baseline.items().effort(id));
            vec![DateShift {
                id: id.clone(),
                previous_completion: config.project_date(effort),
                new_completion: config.project_date(effort.saturating_add(delay)),
                shift_days: to_i64(delay),
            }]
        }
    };

    let previous_total_effort = baseline.total_effort();
    let new_total_effort = delayed.total_effort();
    let critical_path = delayed.critical_path();
    let path_changed = critical_path != baseline.critical_path();

    tracing::debug!(
        item = %id,
        delay,
        affected = affected.len(),
        effort_delta = delta(previous_total_effort, new_total_effort),
        "Simulated delay"
    );

    Ok(DelayImpact {
        id: id.clone(),
        delay,
        affected,
        previous_total_effort,
        new_total_effort,
        effort_delta: delta(previous_total_effort, new_total_effort),
        critical_path,
        path_changed,
        flagged: baseline.items().flagged().to_vec(),
    })
}

/// Simulate removing `id` and every edge touching it.
///
/// # Errors
///
/// Propagates scheduling errors from the recomputation.
pub fn impact_of_removal(baseline: &CriticalPathAnalysis, id: &ItemId) -> Result<RemovalImpact> {
    let after = baseline.without_item(id)?;
    let view = baseline.view();

    let new_roots = view.node(id).map_or_else(Vec::new, |idx| {
        view.successors(idx)
            .iter()
            .filter(|&&succ| view.predecessors(succ) == [idx])
            .map(|&succ| view.id(succ).clone())
            .collect()
    });

    let before = PathSummary::of(baseline);
    let after = PathSummary::of(&after);
    let effort_delta = delta(before.total_effort, after.total_effort);

    tracing::debug!(item = %id, effort_delta, new_roots = new_roots.len(), "Simulated removal");

    Ok(RemovalImpact {
        id: id.clone(),
        before,
        after,
        effort_delta,
        new_roots,
        flagged: baseline.items().flagged().to_vec(),
    })
}

/// Two items that should not be in progress together
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictWarning {
    /// First item, as linked
    pub first: ItemId,

    /// Second item, as linked
    pub second: ItemId,

    /// Reason recorded on the link
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Every `conflicts-with` pair in the store, once per pair, in link order
pub fn conflict_pairs(store: &DependencyStore) -> Vec<ConflictWarning> {
    let mut seen: HashSet<(ItemId, ItemId)> = HashSet::new();
    store
        .explicit_edges()
        .into_iter()
        .filter(|edge| edge.kind == RelationshipType::ConflictsWith)
        .filter(|edge| {
            let pair = if edge.source <= edge.target {
                (edge.source.clone(), edge.target.clone())
            } else {
                (edge.target.clone(), edge.source.clone())
            };
            seen.insert(pair)
        })
        .map(|edge| ConflictWarning {
            first: edge.source,
            second: edge.target,
            reason: edge.reason,
        })
        .collect()
}

/// Conflicting pairs whose endpoints are both in progress
pub fn active_conflicts(pairs: &[ConflictWarning], items: &ItemTable) -> Vec<ConflictWarning> {
    pairs
        .iter()
        .filter(|pair| {
            let active = items.status(&pair.first) == Some(WorkflowState::InProgress)
                && items.status(&pair.second) == Some(WorkflowState::InProgress);
            if active {
                tracing::warn!(
                    first = %pair.first,
                    second = %pair.second,
                    "Conflicting items are both in progress"
                );
            }
            active
        })
        .cloned()
        .collect()
}

fn date_shift(
    baseline: &CriticalPathAnalysis,
    delayed: &CriticalPathAnalysis,
    id: &ItemId,
) -> Option<DateShift> {
    let before = baseline.cumulative_effort(id)?;
    let after = delayed.cumulative_effort(id)?;
    let config = baseline.config();
    Some(DateShift {
        id: id.clone(),
        previous_completion: config.project_date(before),
        new_completion: config.project_date(after),
        shift_days: delta(before, after),
    })
}

fn ids(view: &BlockingView, nodes: &[NodeIndex]) -> Vec<ItemId> {
    nodes.iter().map(|&idx| view.id(idx).clone()).collect()
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn delta(before: u64, after: u64) -> i64 {
    to_i64(after) - to_i64(before)
}
