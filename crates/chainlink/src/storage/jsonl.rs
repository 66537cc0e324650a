//! JSONL persistence for items and links.
//!
//! Both files hold one JSON value per line. Loading is resilient: bad lines
//! are skipped and reported as [`LoadWarning`]s instead of failing the load.

use crate::domain::{DependencyEdge, ItemId, WorkItem};
use crate::error::Result;
use crate::graph::DependencyStore;
use crate::items::InMemoryItemService;
use chainlink_jsonl::{Line, Warning as JsonlWarning, read_jsonl_resilient, write_jsonl_atomic};
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::Path;

/// Non-fatal problems found while loading a JSONL file.
///
/// The load continues; the offending line is skipped unless noted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// Line that couldn't be parsed
    MalformedJson {
        /// 1-based line number
        line_number: usize,
        /// Parser message
        error: String,
    },

    /// An item id seen on an earlier line; the later line wins
    DuplicateItem {
        /// 1-based line number
        line_number: usize,
        /// Repeated id
        id: ItemId,
    },

    /// A link from an item to itself
    SelfLoop {
        /// 1-based line number
        line_number: usize,
        /// Item on both ends
        id: ItemId,
    },

    /// A blocking link that closes a cycle.
    ///
    /// The link is kept so the cycle can be located and broken.
    CircularDependency {
        /// 1-based line number
        line_number: usize,
        /// Items on the cycle
        cycle: Vec<ItemId>,
    },
}

impl From<JsonlWarning> for LoadWarning {
    fn from(warning: JsonlWarning) -> Self {
        match warning {
            JsonlWarning::MalformedJson { line_number, error } => {
                Self::MalformedJson { line_number, error }
            }
        }
    }
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedJson { line_number, error } => {
                write!(f, "line {line_number}: malformed JSON: {error}")
            }
            Self::DuplicateItem { line_number, id } => {
                write!(f, "line {line_number}: duplicate item {id}")
            }
            Self::SelfLoop { line_number, id } => {
                write!(f, "line {line_number}: {id} linked to itself")
            }
            Self::CircularDependency { line_number, cycle } => {
                let names: Vec<&str> = cycle.iter().map(ItemId::as_str).collect();
                write!(f, "line {line_number}: circular dependency {}", names.join(" -> "))
            }
        }
    }
}

/// Parse every non-blank line of `path` as `T`, lifting parse warnings.
async fn read_lines<T: DeserializeOwned>(
    path: &Path,
) -> Result<(Vec<Line<T>>, Vec<LoadWarning>)> {
    let (values, jsonl_warnings) = read_jsonl_resilient::<T, _>(path).await?;
    let warnings = jsonl_warnings.into_iter().map(LoadWarning::from).collect();
    Ok((values, warnings))
}

/// Load work items into an in-memory item service.
///
/// # Errors
///
/// Returns an error only for I/O failures.
pub async fn load_items(path: &Path) -> Result<(InMemoryItemService, Vec<LoadWarning>)> {
    let (parsed, mut warnings) = read_lines::<WorkItem>(path).await?;

    let mut service = InMemoryItemService::new();
    for (line_number, item) in parsed {
        let id = item.id.clone();
        if service.insert(item).is_some() {
            warnings.push(LoadWarning::DuplicateItem { line_number, id });
        }
    }

    tracing::debug!(path = %path.display(), items = service.len(), "Loaded items");
    Ok((service, warnings))
}

/// Write every item, in insertion order.
///
/// # Errors
///
/// Returns an error for I/O or serialization failures.
pub async fn save_items(service: &InMemoryItemService, path: &Path) -> Result<()> {
    write_jsonl_atomic(path, service.all()).await?;
    Ok(())
}

/// Rebuild a dependency store from stated links.
///
/// Complements are derived, never read. Links that close a blocking cycle
/// are kept and reported.
///
/// # Errors
///
/// Returns an error only for I/O failures.
pub async fn load_links(path: &Path, project: &str) -> Result<(DependencyStore, Vec<LoadWarning>)> {
    let (parsed, mut warnings) = read_lines::<DependencyEdge>(path).await?;

    let mut store = DependencyStore::new(project);
    for (line_number, edge) in parsed {
        if edge.source == edge.target {
            warnings.push(LoadWarning::SelfLoop {
                line_number,
                id: edge.source,
            });
            continue;
        }

        if let Some(cycle) = store.import_edge(&edge.source, &edge.target, edge.kind, edge.reason)? {
            warnings.push(LoadWarning::CircularDependency { line_number, cycle });
        }
    }

    tracing::debug!(path = %path.display(), edges = store.len(), "Loaded links");
    Ok((store, warnings))
}

/// Write the stated links of `store`, in insertion order.
///
/// # Errors
///
/// Returns an error for I/O or serialization failures.
pub async fn save_links(store: &DependencyStore, path: &Path) -> Result<()> {
    write_jsonl_atomic(path, &store.explicit_edges()).await?;
    Ok(())
}
