//! Dependency store: the typed multigraph of work item references.
//!
//! Items are interned into an arena of dense [`NodeHandle`]s the first time
//! an edge mentions them; edges refer to handles, never to item data.
//! Edges are kept in insertion order so that every listing and every
//! algorithm built on top of the store is reproducible.
//!
//! Each explicit edge is mirrored by its complement (see
//! [`RelationshipType::complement`]). Callers only ever state one side.

use super::cycles;
use super::view::BlockingView;
use crate::domain::{DependencyEdge, EdgeDirection, ItemId, RelationshipType};
use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Arena handle for an interned item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(usize);

impl NodeHandle {
    /// Position in the arena
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct EdgeKey {
    source: NodeHandle,
    target: NodeHandle,
    kind: RelationshipType,
}

impl EdgeKey {
    fn complement(self) -> Self {
        Self {
            source: self.target,
            target: self.source,
            kind: self.kind.complement(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct EdgeRecord {
    key: EdgeKey,
    reason: Option<String>,
    /// Stated by a caller rather than derived as a complement
    explicit: bool,
}

/// What `add_edge` did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkOutcome {
    /// A new edge (and its complement) was recorded
    Created,

    /// The triple already existed; its reason was replaced
    Updated,
}

/// Directed multigraph of typed edges for one project.
#[derive(Debug, Clone, Default)]
pub struct DependencyStore {
    project: String,
    nodes: Vec<ItemId>,
    node_map: HashMap<ItemId, NodeHandle>,
    /// Insertion sequence -> edge
    edges: BTreeMap<u64, EdgeRecord>,
    edge_index: HashMap<EdgeKey, u64>,
    next_seq: u64,
}

impl DependencyStore {
    /// Create an empty store for `project`
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            ..Self::default()
        }
    }

    /// Project this store belongs to
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Handle for `id`, if any edge has ever mentioned it
    pub fn handle(&self, id: &ItemId) -> Option<NodeHandle> {
        self.node_map.get(id).copied()
    }

    /// Item for a handle
    pub fn item(&self, handle: NodeHandle) -> &ItemId {
        &self.nodes[handle.0]
    }

    /// Number of stored edges, complements included
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether the store holds no edges
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Whether the exact triple is present
    pub fn contains(&self, source: &ItemId, target: &ItemId, kind: RelationshipType) -> bool {
        self.key_for(source, target, kind)
            .is_some_and(|key| self.edge_index.contains_key(&key))
    }

    /// Add an edge and its complement.
    ///
    /// Blocking edges are checked against the blocking subgraph first; on
    /// any error the store is unchanged. Re-linking an existing triple only
    /// replaces its reason.
    ///
    /// # Errors
    ///
    /// - `Error::SelfLoop` if `source == target`
    /// - `Error::CycleDetected` if a blocking edge would close a cycle
    pub fn add_edge(
        &mut self,
        source: &ItemId,
        target: &ItemId,
        kind: RelationshipType,
        reason: Option<String>,
    ) -> Result<LinkOutcome> {
        if source == target {
            return Err(Error::SelfLoop(source.clone()));
        }

        // Re-link: update in place, no new precedence is introduced
        if let Some(key) = self.key_for(source, target, kind)
            && self.edge_index.contains_key(&key)
        {
            self.update_reason(key, reason);
            return Ok(LinkOutcome::Updated);
        }

        if let Some((pred, succ)) = kind.precedence_pair(source, target) {
            let view = BlockingView::from_store(self);
            if let Some(cycle) = cycles::would_create_cycle(&view, pred, succ) {
                tracing::warn!(
                    project = %self.project,
                    source = %source,
                    target = %target,
                    kind = %kind,
                    "Rejected link that would close a cycle"
                );
                return Err(Error::CycleDetected { cycle });
            }
        }

        self.insert_pair(source, target, kind, reason);
        Ok(LinkOutcome::Created)
    }

    /// Add an edge without the cycle check.
    ///
    /// Used when loading existing data, which may already be inconsistent.
    /// Returns the cycle the edge closes, if any, so the caller can report it.
    ///
    /// # Errors
    ///
    /// Returns `Error::SelfLoop` if `source == target`.
    pub fn import_edge(
        &mut self,
        source: &ItemId,
        target: &ItemId,
        kind: RelationshipType,
        reason: Option<String>,
    ) -> Result<Option<Vec<ItemId>>> {
        if source == target {
            return Err(Error::SelfLoop(source.clone()));
        }

        if let Some(key) = self.key_for(source, target, kind)
            && self.edge_index.contains_key(&key)
        {
            self.update_reason(key, reason);
            return Ok(None);
        }

        let closed = kind.precedence_pair(source, target).and_then(|(pred, succ)| {
            let view = BlockingView::from_store(self);
            cycles::would_create_cycle(&view, pred, succ)
        });

        self.insert_pair(source, target, kind, reason);
        Ok(closed)
    }

    /// Remove an edge and its complement.
    ///
    /// Either side of the pair may be named.
    ///
    /// # Errors
    ///
    /// Returns `Error::EdgeNotFound` if the triple is not present.
    pub fn remove_edge(
        &mut self,
        source: &ItemId,
        target: &ItemId,
        kind: RelationshipType,
    ) -> Result<()> {
        let not_found = || Error::EdgeNotFound {
            from: source.clone(),
            to: target.clone(),
            kind,
        };

        let key = self.key_for(source, target, kind).ok_or_else(not_found)?;
        let seq = self.edge_index.remove(&key).ok_or_else(not_found)?;
        self.edges.remove(&seq);

        if let Some(complement_seq) = self.edge_index.remove(&key.complement()) {
            self.edges.remove(&complement_seq);
        }

        Ok(())
    }

    /// Edges touching `node`, in insertion order.
    ///
    /// Unknown nodes have no edges. `types = None` means every type.
    pub fn edges_of(
        &self,
        node: &ItemId,
        direction: EdgeDirection,
        types: Option<&[RelationshipType]>,
    ) -> Vec<DependencyEdge> {
        let Some(handle) = self.handle(node) else {
            return Vec::new();
        };

        self.edges
            .values()
            .filter(|record| {
                let key = record.key;
                let touches = match direction {
                    EdgeDirection::Outgoing => key.source == handle,
                    EdgeDirection::Incoming => key.target == handle,
                    EdgeDirection::Both => key.source == handle || key.target == handle,
                };
                touches && types.is_none_or(|types| types.contains(&key.kind))
            })
            .map(|record| self.to_edge(record))
            .collect()
    }

    /// Every edge, complements included, in insertion order
    pub fn all_edges(&self) -> Vec<DependencyEdge> {
        self.edges.values().map(|record| self.to_edge(record)).collect()
    }

    /// Edges stated by callers, without derived complements
    pub fn explicit_edges(&self) -> Vec<DependencyEdge> {
        self.edges
            .values()
            .filter(|record| record.explicit)
            .map(|record| self.to_edge(record))
            .collect()
    }

    /// Blocking `(predecessor, successor)` pairs in insertion order.
    ///
    /// A pair stated through several edge types appears once per edge;
    /// consumers deduplicate.
    pub(crate) fn precedence_pairs(&self) -> impl Iterator<Item = (&ItemId, &ItemId)> + '_ {
        self.edges.values().filter_map(|record| {
            let key = record.key;
            key.kind
                .precedence_pair(key.source, key.target)
                .map(|(pred, succ)| (self.item(pred), self.item(succ)))
        })
    }

    fn key_for(
        &self,
        source: &ItemId,
        target: &ItemId,
        kind: RelationshipType,
    ) -> Option<EdgeKey> {
        Some(EdgeKey {
            source: self.handle(source)?,
            target: self.handle(target)?,
            kind,
        })
    }

    fn intern(&mut self, id: &ItemId) -> NodeHandle {
        if let Some(handle) = self.node_map.get(id) {
            return *handle;
        }
        let handle = NodeHandle(self.nodes.len());
        self.nodes.push(id.clone());
        self.node_map.insert(id.clone(), handle);
        handle
    }

    fn insert_pair(
        &mut self,
        source: &ItemId,
        target: &ItemId,
        kind: RelationshipType,
        reason: Option<String>,
    ) {
        let key = EdgeKey {
            source: self.intern(source),
            target: self.intern(target),
            kind,
        };
        let complement = key.complement();

        self.push_record(key, reason.clone(), true);
        if self.edge_index.contains_key(&complement) {
            self.update_reason(complement, reason);
        } else {
            self.push_record(complement, reason, false);
        }

        tracing::debug!(
            project = %self.project,
            source = %source,
            target = %target,
            kind = %kind,
            "Linked items"
        );
    }

    fn push_record(&mut self, key: EdgeKey, reason: Option<String>, explicit: bool) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.edges.insert(
            seq,
            EdgeRecord {
                key,
                reason,
                explicit,
            },
        );
        self.edge_index.insert(key, seq);
    }

    /// Replace the reason on `key` and its complement; `key` becomes explicit.
    fn update_reason(&mut self, key: EdgeKey, reason: Option<String>) {
        if let Some(seq) = self.edge_index.get(&key)
            && let Some(record) = self.edges.get_mut(seq)
        {
            record.reason.clone_from(&reason);
            record.explicit = true;
        }
        if let Some(seq) = self.edge_index.get(&key.complement())
            && let Some(record) = self.edges.get_mut(seq)
        {
            record.reason = reason;
        }
    }

    fn to_edge(&self, record: &EdgeRecord) -> DependencyEdge {
        DependencyEdge {
            source: self.item(record.key.source).clone(),
            target: self.item(record.key.target).clone(),
            kind: record.key.kind,
            reason: record.reason.clone(),
        }
    }
}
