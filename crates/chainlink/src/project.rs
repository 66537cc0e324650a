//! Shared, mutable handle to one project's dependency graph.
//!
//! # Concurrency
//!
//! Readers call [`ProjectGraph::snapshot`] and get the last committed
//! `Arc<DependencyStore>`; they never wait on a writer beyond the pointer
//! swap. Writers are serialized by a mutex held across the
//! cycle-check-then-insert sequence, mutate a private copy, and publish it
//! on success. A failed mutation publishes nothing.

use crate::domain::{ItemId, RelationshipType};
use crate::error::Result;
use crate::graph::{DependencyStore, LinkOutcome};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Dependency graph of one project, safe to share across threads
#[derive(Debug)]
pub struct ProjectGraph {
    project: String,
    writer: Mutex<()>,
    current: RwLock<Arc<DependencyStore>>,
}

impl ProjectGraph {
    /// Empty graph for `project`
    pub fn new(project: impl Into<String>) -> Self {
        let project = project.into();
        let store = DependencyStore::new(project.clone());
        Self::from_store_named(project, store)
    }

    /// Wrap an existing store
    pub fn from_store(store: DependencyStore) -> Self {
        Self::from_store_named(store.project().to_string(), store)
    }

    fn from_store_named(project: String, store: DependencyStore) -> Self {
        Self {
            project,
            writer: Mutex::new(()),
            current: RwLock::new(Arc::new(store)),
        }
    }

    /// Project name
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Last committed state
    pub fn snapshot(&self) -> Arc<DependencyStore> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Add an edge and its complement.
    ///
    /// # Errors
    ///
    /// See [`DependencyStore::add_edge`]; on error nothing is published.
    pub fn link(
        &self,
        source: &ItemId,
        target: &ItemId,
        kind: RelationshipType,
        reason: Option<String>,
    ) -> Result<LinkOutcome> {
        self.mutate(|store| store.add_edge(source, target, kind, reason))
    }

    /// Remove an edge and its complement.
    ///
    /// # Errors
    ///
    /// See [`DependencyStore::remove_edge`]; on error nothing is published.
    pub fn unlink(&self, source: &ItemId, target: &ItemId, kind: RelationshipType) -> Result<()> {
        self.mutate(|store| store.remove_edge(source, target, kind))
    }

    fn mutate<T>(&self, op: impl FnOnce(&mut DependencyStore) -> Result<T>) -> Result<T> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let mut next = DependencyStore::clone(&self.snapshot());
        let value = op(&mut next)?;

        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Arc::new(next);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use RelationshipType::{BlockedBy, DependsOn};
    use std::thread;

    fn id(s: &str) -> ItemId {
        ItemId::new(s)
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_writes() {
        let graph = ProjectGraph::new("proj");
        graph.link(&id("a"), &id("b"), BlockedBy, None).unwrap();
        let before = graph.snapshot();

        graph.link(&id("b"), &id("c"), BlockedBy, None).unwrap();

        assert_eq!(before.len(), 2);
        assert_eq!(graph.snapshot().len(), 4);
    }

    #[test]
    fn test_failed_mutation_publishes_nothing() {
        let graph = ProjectGraph::new("proj");
        graph.link(&id("a"), &id("b"), BlockedBy, None).unwrap();
        let before = graph.snapshot();

        let err = graph.link(&id("b"), &id("a"), BlockedBy, None).unwrap_err();
        assert!(matches!(err, Error::CycleDetected { .. }));
        assert!(Arc::ptr_eq(&before, &graph.snapshot()));

        let err = graph.unlink(&id("a"), &id("b"), DependsOn).unwrap_err();
        assert!(matches!(err, Error::EdgeNotFound { .. }));
        assert!(Arc::ptr_eq(&before, &graph.snapshot()));
    }

    #[test]
    fn test_concurrent_writers_keep_graph_acyclic() {
        let graph = Arc::new(ProjectGraph::new("proj"));

        // every thread tries both directions of the same pair
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let graph = Arc::clone(&graph);
                thread::spawn(move || {
                    let (a, b) = if i % 2 == 0 { ("x", "y") } else { ("y", "x") };
                    graph.link(&id(a), &id(b), BlockedBy, None).is_ok()
                })
            })
            .collect();

        let accepted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        // the first direction wins; re-links of it are updates
        assert!(accepted >= 1);
        assert_eq!(graph.snapshot().len(), 2);
    }

    #[test]
    fn test_from_store_keeps_project() {
        let graph = ProjectGraph::from_store(DependencyStore::new("alpha"));
        assert_eq!(graph.project(), "alpha");
        assert!(graph.snapshot().is_empty());
    }
}
