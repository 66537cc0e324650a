//! Query facade.
//!
//! [`GraphQueries`] composes the store, the analyses and the item service
//! into the read and write operations callers use. It holds no state of its
//! own: every read takes a fresh snapshot and resolves items once for that
//! call.

use crate::config::AnalysisConfig;
use crate::domain::{DependencyEdge, EdgeDirection, ItemId, RelationshipType, WorkflowState};
use crate::error::{Error, Result};
use crate::graph::{
    BlockerReport, BlockingView, ConflictWarning, CriticalPathAnalysis, CriticalPathDetails,
    CycleReport, DelayImpact, DependencyStore, ItemCriticalPath, LinkOutcome, RemovalImpact,
    ScheduledItem, ViewFilter, active_conflicts, blockers, conflict_pairs, critical_blockers,
    find_cycles_up_to, impact_of_delay, impact_of_removal,
};
use crate::items::{ItemService, ItemTable};
use crate::project::ProjectGraph;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::fmt;

/// Which items a query covers
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scope {
    /// Every item in the project
    #[default]
    Project,

    /// A named subset, e.g. the members of a release
    Release {
        /// Release name
        name: String,

        /// Member items
        items: Vec<ItemId>,
    },
}

impl Scope {
    /// Scope over the given release members
    pub fn release(name: impl Into<String>, items: impl IntoIterator<Item = ItemId>) -> Self {
        Self::Release {
            name: name.into(),
            items: items.into_iter().collect(),
        }
    }

    fn filter(&self) -> ViewFilter {
        match self {
            Self::Project => ViewFilter::all(),
            Self::Release { items, .. } => ViewFilter::within(items.iter().cloned()),
        }
    }

    fn admits(&self, id: &ItemId) -> bool {
        match self {
            Self::Project => true,
            Self::Release { items, .. } => items.contains(id),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project => write!(f, "project"),
            Self::Release { name, items } => write!(f, "release {name} ({} items)", items.len()),
        }
    }
}

/// Options for [`GraphQueries::dependencies`]
#[derive(Debug, Clone, Default)]
pub struct DependencyQuery {
    /// Follow edges past the direct neighbours
    pub transitive: bool,

    /// Maximum hops when transitive; `None` means unbounded
    pub depth: Option<usize>,

    /// Relationship types to follow; defaults depend on `reverse`.
    ///
    /// With `reverse`, each type is followed through its complement, so
    /// `DependsOn` lists the items that depend on the given item.
    pub types: Option<Vec<RelationshipType>>,

    /// List the items waiting on the given item instead
    pub reverse: bool,
}

impl DependencyQuery {
    fn effective_types(&self) -> Vec<RelationshipType> {
        match (&self.types, self.reverse) {
            (Some(types), false) => types.clone(),
            (Some(types), true) => types.iter().map(|kind| kind.complement()).collect(),
            (None, false) => RelationshipType::WAITS_ON.to_vec(),
            (None, true) => RelationshipType::GATES.to_vec(),
        }
    }
}

/// One item reached by a dependency query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyEntry {
    /// Item reached
    pub id: ItemId,

    /// Item it was reached from
    pub via: ItemId,

    /// Relationship followed
    #[serde(rename = "type")]
    pub kind: RelationshipType,

    /// Reason recorded on the edge
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Hops from the queried item (1 = direct)
    pub depth: usize,

    /// Title, when the item was found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Status, when the item was found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<WorkflowState>,
}

/// Result of [`GraphQueries::dependencies`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyReport {
    /// Queried item
    pub id: ItemId,

    /// Whether dependents were listed instead of dependencies
    pub reverse: bool,

    /// Items reached, in breadth-first order
    pub dependencies: Vec<DependencyEntry>,
}

/// Result of [`GraphQueries::path`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathReport {
    /// Scope analysed
    pub scope: Scope,

    /// Critical path summary
    #[serde(flatten)]
    pub details: CriticalPathDetails,

    /// Per-item estimates along the path, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimates: Option<Vec<ScheduledItem>>,

    /// Conflicting items currently both in progress
    pub conflicts: Vec<ConflictWarning>,
}

/// Result of [`GraphQueries::blockers`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockersReport {
    /// Scope analysed
    pub scope: Scope,

    /// Every item others wait on
    pub blockers: Vec<BlockerReport>,

    /// Open blockers holding up more than one item
    pub critical: Vec<ItemId>,
}

/// Result of [`GraphQueries::impact_analysis`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImpactReport {
    /// Item analysed
    pub id: ItemId,

    /// Items directly waiting on it
    pub directly_blocks: Vec<ItemId>,

    /// Items transitively waiting on it
    pub total_impact: Vec<ItemId>,

    /// Whether it is on the project critical path
    pub on_critical_path: bool,

    /// Delay simulation, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<DelayImpact>,

    /// Removal simulation, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removal: Option<RemovalImpact>,
}

/// Result of [`GraphQueries::check_circular`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CircularCheckReport {
    /// Scope analysed
    pub scope: Scope,

    /// Whether any cycle was found
    pub has_cycles: bool,

    /// One report per cycle
    pub cycles: Vec<CycleReport>,

    /// Conflicting items currently both in progress
    pub conflicts: Vec<ConflictWarning>,
}

/// One node of the dependency graph dump
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    /// Item reference
    pub id: ItemId,

    /// Direct blocking predecessors
    pub waits_on: Vec<ItemId>,
}

/// Result of [`GraphQueries::link`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkReport {
    /// Edge as stated
    pub edge: DependencyEdge,

    /// Whether the edge was created or its reason updated
    pub outcome: LinkOutcome,
}

/// Read and write operations over one project graph
#[derive(Clone, Copy)]
pub struct GraphQueries<'a> {
    graph: &'a ProjectGraph,
    items: &'a dyn ItemService,
    config: AnalysisConfig,
}

impl<'a> GraphQueries<'a> {
    /// Facade over `graph` reading items from `items`
    pub fn new(graph: &'a ProjectGraph, items: &'a dyn ItemService, config: AnalysisConfig) -> Self {
        Self {
            graph,
            items,
            config,
        }
    }

    /// Dependencies (or dependents) of `id`.
    ///
    /// Direct neighbours by default; with `transitive` a breadth-first walk
    /// bounded by `depth`. Each item appears once, at the depth it was
    /// first reached.
    pub fn dependencies(&self, id: &ItemId, query: &DependencyQuery) -> DependencyReport {
        let store = self.graph.snapshot();
        let types = query.effective_types();
        let max_depth = if query.transitive {
            query.depth.unwrap_or(usize::MAX)
        } else {
            1
        };

        let mut reached: Vec<(DependencyEdge, usize)> = Vec::new();
        let mut seen: HashSet<ItemId> = HashSet::from([id.clone()]);
        let mut queue = VecDeque::from([(id.clone(), 0usize)]);

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            for edge in store.edges_of(&current, EdgeDirection::Outgoing, Some(types.as_slice())) {
                if seen.insert(edge.target.clone()) {
                    queue.push_back((edge.target.clone(), depth + 1));
                    reached.push((edge, depth + 1));
                }
            }
        }

        let table = ItemTable::resolve(self.items, reached.iter().map(|(edge, _)| &edge.target));
        let dependencies = reached
            .into_iter()
            .map(|(edge, depth)| {
                let resolved = table.get(&edge.target);
                DependencyEntry {
                    title: resolved.and_then(|item| item.title.clone()),
                    status: resolved.and_then(|item| item.status),
                    id: edge.target,
                    via: edge.source,
                    kind: edge.kind,
                    reason: edge.reason,
                    depth,
                }
            })
            .collect();

        DependencyReport {
            id: id.clone(),
            reverse: query.reverse,
            dependencies,
        }
    }

    /// Critical path of `scope`, optionally with per-item estimates.
    ///
    /// # Errors
    ///
    /// Returns `Error::CircularDependency` if the scope contains a cycle.
    pub fn path(&self, scope: &Scope, with_estimates: bool) -> Result<PathReport> {
        let store = self.graph.snapshot();
        let analysis = self.analyze(&store, scope, None)?;

        Ok(PathReport {
            scope: scope.clone(),
            details: analysis.details(),
            estimates: with_estimates.then(|| analysis.with_estimates()),
            conflicts: self.conflicts(&store, scope),
        })
    }

    /// Where `id` stands relative to the critical path of `scope`.
    ///
    /// # Errors
    ///
    /// Returns `Error::CircularDependency` if the scope contains a cycle.
    pub fn item_path(&self, scope: &Scope, id: &ItemId) -> Result<ItemCriticalPath> {
        let store = self.graph.snapshot();
        let analysis = self.analyze(&store, scope, None)?;
        Ok(analysis.item_critical_path(id))
    }

    /// Every blocker in `scope` with its direct and transitive impact
    pub fn blockers(&self, scope: &Scope) -> BlockersReport {
        let store = self.graph.snapshot();
        let view = BlockingView::from_store_filtered(&store, &scope.filter());
        let table = ItemTable::resolve(self.items, view.ids());
        let reports = blockers(&view, &table);
        let critical = critical_blockers(&reports)
            .into_iter()
            .map(|report| report.id.clone())
            .collect();

        BlockersReport {
            scope: scope.clone(),
            blockers: reports,
            critical,
        }
    }

    /// Impact of `id` on the project, with optional delay and removal
    /// simulations.
    ///
    /// # Errors
    ///
    /// Returns `Error::CircularDependency` if the project contains a cycle.
    pub fn impact_analysis(&self, id: &ItemId, delay: Option<u64>, remove: bool) -> Result<ImpactReport> {
        let store = self.graph.snapshot();
        let baseline = self.analyze(&store, &Scope::Project, Some(id))?;
        let view = baseline.view();

        let (directly_blocks, total_impact) = view.node(id).map_or_else(
            || (Vec::new(), Vec::new()),
            |idx| {
                let direct = view.successors(idx).iter().map(|&n| view.id(n).clone()).collect();
                let total = view.descendants(idx).into_iter().map(|n| view.id(n).clone()).collect();
                (direct, total)
            },
        );

        let delay = delay
            .map(|days| impact_of_delay(&baseline, id, days))
            .transpose()?;
        let removal = remove.then(|| impact_of_removal(&baseline, id)).transpose()?;

        Ok(ImpactReport {
            id: id.clone(),
            directly_blocks,
            total_impact,
            on_critical_path: baseline.is_on_critical_path(id),
            delay,
            removal,
        })
    }

    /// Cycles in `scope`, keeping only those of at most `depth` items
    pub fn check_circular(&self, scope: &Scope, depth: Option<usize>) -> CircularCheckReport {
        let store = self.graph.snapshot();
        let view = BlockingView::from_store_filtered(&store, &scope.filter());
        let cycles = find_cycles_up_to(&view, depth);

        for cycle in &cycles {
            tracing::warn!(
                project = %self.graph.project(),
                members = cycle.members.len(),
                "Dependency cycle found"
            );
        }

        CircularCheckReport {
            scope: scope.clone(),
            has_cycles: !cycles.is_empty(),
            cycles,
            conflicts: self.conflicts(&store, scope),
        }
    }

    /// Every item of `scope` with its direct blocking predecessors
    pub fn dependency_graph(&self, scope: &Scope) -> Vec<GraphNode> {
        let store = self.graph.snapshot();
        let view = BlockingView::from_store_filtered(&store, &scope.filter());
        view.nodes()
            .map(|idx| GraphNode {
                id: view.id(idx).clone(),
                waits_on: view
                    .predecessors(idx)
                    .iter()
                    .map(|&n| view.id(n).clone())
                    .collect(),
            })
            .collect()
    }

    /// Link two known items.
    ///
    /// # Errors
    ///
    /// - `Error::ItemNotFound` if either item is unknown to the item service
    /// - `Error::Lookup` if the item service fails
    /// - the errors of [`DependencyStore::add_edge`]
    pub fn link(
        &self,
        source: &ItemId,
        target: &ItemId,
        kind: RelationshipType,
        reason: Option<String>,
    ) -> Result<LinkReport> {
        self.require(source)?;
        self.require(target)?;

        let outcome = self.graph.link(source, target, kind, reason.clone())?;
        tracing::info!(%source, %target, %kind, ?outcome, "Link recorded");

        Ok(LinkReport {
            edge: DependencyEdge {
                source: source.clone(),
                target: target.clone(),
                kind,
                reason,
            },
            outcome,
        })
    }

    /// Remove a link.
    ///
    /// # Errors
    ///
    /// Returns `Error::EdgeNotFound` if no such link exists.
    pub fn unlink(&self, source: &ItemId, target: &ItemId, kind: RelationshipType) -> Result<()> {
        self.graph.unlink(source, target, kind)?;
        tracing::info!(%source, %target, %kind, "Link removed");
        Ok(())
    }

    fn require(&self, id: &ItemId) -> Result<()> {
        match self.items.get_item(id)? {
            Some(_) => Ok(()),
            None => Err(Error::ItemNotFound(id.clone())),
        }
    }

    fn analyze(
        &self,
        store: &DependencyStore,
        scope: &Scope,
        extra: Option<&ItemId>,
    ) -> Result<CriticalPathAnalysis> {
        let view = BlockingView::from_store_filtered(store, &scope.filter());
        let table = ItemTable::resolve(self.items, view.ids().chain(extra));
        CriticalPathAnalysis::compute(view, table, self.config)
    }

    fn conflicts(&self, store: &DependencyStore, scope: &Scope) -> Vec<ConflictWarning> {
        let pairs: Vec<ConflictWarning> = conflict_pairs(store)
            .into_iter()
            .filter(|pair| scope.admits(&pair.first) && scope.admits(&pair.second))
            .collect();
        let table = ItemTable::resolve(
            self.items,
            pairs.iter().flat_map(|pair| [&pair.first, &pair.second]),
        );
        active_conflicts(&pairs, &table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RelationshipType::{BlockedBy, ConflictsWith, DependsOn, RelatedTo, SubtaskOf};
    use crate::domain::WorkItem;
    use crate::items::InMemoryItemService;
    use chrono::NaiveDate;

    fn id(s: &str) -> ItemId {
        ItemId::new(s)
    }

    fn ids(list: &[&str]) -> Vec<ItemId> {
        list.iter().map(|s| id(s)).collect()
    }

    fn config() -> AnalysisConfig {
        AnalysisConfig::starting(NaiveDate::from_ymd_opt(2026, 1, 5).unwrap())
    }

    fn fixture() -> (ProjectGraph, InMemoryItemService) {
        let service: InMemoryItemService = [
            WorkItem::new("WI-101", "Schema", 8).with_status(WorkflowState::InProgress),
            WorkItem::new("WI-102", "API", 16),
            WorkItem::new("WI-103", "UI", 16).with_status(WorkflowState::InProgress),
            WorkItem::new("WI-104", "Docs", 2),
        ]
        .into_iter()
        .collect();
        let graph = ProjectGraph::new("proj");
        graph.link(&id("WI-102"), &id("WI-101"), BlockedBy, None).unwrap();
        graph.link(&id("WI-103"), &id("WI-102"), BlockedBy, None).unwrap();
        (graph, service)
    }

    #[test]
    fn test_direct_and_transitive_dependencies() {
        let (graph, service) = fixture();
        let queries = GraphQueries::new(&graph, &service, config());

        let direct = queries.dependencies(&id("WI-103"), &DependencyQuery::default());
        assert_eq!(direct.dependencies.len(), 1);
        assert_eq!(direct.dependencies[0].id, id("WI-102"));
        assert_eq!(direct.dependencies[0].title.as_deref(), Some("API"));

        let all = queries.dependencies(
            &id("WI-103"),
            &DependencyQuery {
                transitive: true,
                ..DependencyQuery::default()
            },
        );
        let reached: Vec<_> = all.dependencies.iter().map(|d| (d.id.as_str(), d.depth)).collect();
        assert_eq!(reached, vec![("WI-102", 1), ("WI-101", 2)]);

        let bounded = queries.dependencies(
            &id("WI-103"),
            &DependencyQuery {
                transitive: true,
                depth: Some(1),
                ..DependencyQuery::default()
            },
        );
        assert_eq!(bounded.dependencies.len(), 1);
    }

    #[test]
    fn test_reverse_dependencies() {
        let (graph, service) = fixture();
        graph.link(&id("WI-104"), &id("WI-101"), SubtaskOf, None).unwrap();
        let queries = GraphQueries::new(&graph, &service, config());

        let dependents = queries.dependencies(
            &id("WI-101"),
            &DependencyQuery {
                reverse: true,
                ..DependencyQuery::default()
            },
        );
        assert!(dependents.reverse);
        assert_eq!(dependents.dependencies.len(), 1);
        assert_eq!(dependents.dependencies[0].id, id("WI-102"));

        // WI-104 is a subtask of WI-101, so WI-101 waits on it
        let waits = queries.dependencies(&id("WI-101"), &DependencyQuery::default());
        assert_eq!(waits.dependencies[0].id, id("WI-104"));
        assert_eq!(waits.dependencies[0].kind, RelationshipType::HasSubtask);
    }

    #[test]
    fn test_explicit_types() {
        let (graph, service) = fixture();
        graph.link(&id("WI-103"), &id("WI-104"), RelatedTo, None).unwrap();
        let queries = GraphQueries::new(&graph, &service, config());

        let related = queries.dependencies(
            &id("WI-103"),
            &DependencyQuery {
                types: Some(vec![RelatedTo]),
                ..DependencyQuery::default()
            },
        );
        assert_eq!(related.dependencies.len(), 1);
        assert_eq!(related.dependencies[0].id, id("WI-104"));
    }

    #[test]
    fn test_reverse_with_explicit_types() {
        let (graph, service) = fixture();
        graph.link(&id("WI-104"), &id("WI-101"), DependsOn, None).unwrap();
        let queries = GraphQueries::new(&graph, &service, config());

        let dependents = queries.dependencies(
            &id("WI-101"),
            &DependencyQuery {
                types: Some(vec![DependsOn]),
                reverse: true,
                ..DependencyQuery::default()
            },
        );
        assert!(dependents.reverse);
        let reached: Vec<_> = dependents.dependencies.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(reached, vec!["WI-104"]);
        assert_eq!(dependents.dependencies[0].kind, RelationshipType::DependedOnBy);

        // the BlockedBy link from WI-102 is only followed when asked for
        let blocked = queries.dependencies(
            &id("WI-101"),
            &DependencyQuery {
                types: Some(vec![BlockedBy, DependsOn]),
                reverse: true,
                ..DependencyQuery::default()
            },
        );
        let reached: Vec<_> = blocked.dependencies.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(reached, vec!["WI-102", "WI-104"]);
    }

    #[test]
    fn test_path_with_estimates_and_conflicts() {
        let (graph, service) = fixture();
        graph.link(&id("WI-101"), &id("WI-103"), ConflictsWith, None).unwrap();
        let queries = GraphQueries::new(&graph, &service, config());

        let report = queries.path(&Scope::Project, true).unwrap();
        assert_eq!(report.details.path, ids(&["WI-101", "WI-102", "WI-103"]));
        assert_eq!(report.details.total_effort, 40);
        assert_eq!(report.estimates.as_ref().map(Vec::len), Some(3));
        assert_eq!(report.conflicts.len(), 1);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["total_effort"], 40);
        assert_eq!(json["scope"]["kind"], "project");
    }

    #[test]
    fn test_release_scope_induces_subgraph() {
        let (graph, service) = fixture();
        let queries = GraphQueries::new(&graph, &service, config());
        let scope = Scope::release("1.0", ids(&["WI-102", "WI-103"]));

        let report = queries.path(&scope, false).unwrap();
        assert_eq!(report.details.path, ids(&["WI-102", "WI-103"]));
        assert_eq!(report.details.total_effort, 32);
        assert!(report.estimates.is_none());
    }

    #[test]
    fn test_impact_analysis() {
        let (graph, service) = fixture();
        let queries = GraphQueries::new(&graph, &service, config());

        let report = queries.impact_analysis(&id("WI-101"), Some(3), true).unwrap();
        assert_eq!(report.directly_blocks, ids(&["WI-102"]));
        assert_eq!(report.total_impact, ids(&["WI-102", "WI-103"]));
        assert!(report.on_critical_path);
        assert_eq!(report.delay.as_ref().unwrap().effort_delta, 3);
        assert_eq!(report.removal.as_ref().unwrap().effort_delta, -8);
        assert_eq!(report.removal.as_ref().unwrap().new_roots, ids(&["WI-102"]));
    }

    #[test]
    fn test_check_circular_clean_project() {
        let (graph, service) = fixture();
        let queries = GraphQueries::new(&graph, &service, config());
        let report = queries.check_circular(&Scope::Project, None);
        assert!(!report.has_cycles);
    }

    #[test]
    fn test_blockers_and_graph_dump() {
        let (graph, service) = fixture();
        graph.link(&id("WI-104"), &id("WI-101"), DependsOn, None).unwrap();
        let queries = GraphQueries::new(&graph, &service, config());

        let report = queries.blockers(&Scope::Project);
        assert_eq!(report.blockers.len(), 2);
        assert_eq!(report.critical, ids(&["WI-101"]));

        let dump = queries.dependency_graph(&Scope::Project);
        let node = dump.iter().find(|n| n.id == id("WI-103")).unwrap();
        assert_eq!(node.waits_on, ids(&["WI-102"]));
    }

    #[test]
    fn test_link_validates_items() {
        let (graph, service) = fixture();
        let queries = GraphQueries::new(&graph, &service, config());

        let err = queries
            .link(&id("WI-104"), &id("ghost"), BlockedBy, None)
            .unwrap_err();
        assert!(matches!(err, Error::ItemNotFound(ref missing) if *missing == id("ghost")));

        let report = queries
            .link(&id("WI-104"), &id("WI-103"), BlockedBy, Some("needs UI".into()))
            .unwrap();
        assert_eq!(report.outcome, LinkOutcome::Created);

        queries.unlink(&id("WI-104"), &id("WI-103"), BlockedBy).unwrap();
        let err = queries.unlink(&id("WI-104"), &id("WI-103"), BlockedBy).unwrap_err();
        assert!(matches!(err, Error::EdgeNotFound { .. }));
    }

    #[test]
    fn test_link_rejects_cycle() {
        let (graph, service) = fixture();
        let queries = GraphQueries::new(&graph, &service, config());

        let err = queries
            .link(&id("WI-101"), &id("WI-103"), BlockedBy, None)
            .unwrap_err();
        match err {
            Error::CycleDetected { cycle } => assert_eq!(cycle.len(), 3),
            other => panic!("expected cycle, got {other:?}"),
        }
    }
}
