//! Domain types for dependency analysis.
//!
//! Work items are owned by an external item service; this crate only holds
//! their identifiers and reads effort/status through [`crate::items::ItemService`].

mod relationship;

pub use relationship::{Precedence, RelationshipInfo, RelationshipType};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a work item
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    /// Create a new item ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A work item as supplied by the item service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Unique identifier
    pub id: ItemId,

    /// Short title
    #[serde(default)]
    pub title: String,

    /// Estimated effort in whole units (treated as calendar days)
    #[serde(default)]
    pub estimated_effort: u32,

    /// Current workflow state
    #[serde(default)]
    pub status: WorkflowState,
}

impl WorkItem {
    /// Create a work item in the default state
    pub fn new(id: impl Into<ItemId>, title: impl Into<String>, estimated_effort: u32) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            estimated_effort,
            status: WorkflowState::default(),
        }
    }

    /// Builder-style status override
    #[must_use]
    pub fn with_status(mut self, status: WorkflowState) -> Self {
        self.status = status;
        self
    }
}

/// Workflow state of a work item.
///
/// Owned by the workflow state machine; read-only here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowState {
    /// Reported, not yet reviewed
    Found,

    /// Reviewed and accepted
    Triaged,

    /// Ready to be picked up
    #[default]
    ToDo,

    /// Being worked on
    InProgress,

    /// Under test
    InTest,

    /// Work finished
    Done,

    /// Shipped
    Released,
}

impl WorkflowState {
    /// Whether the item still has work outstanding
    pub fn is_open(self) -> bool {
        !matches!(self, Self::Done | Self::Released)
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Found => "FOUND",
            Self::Triaged => "TRIAGED",
            Self::ToDo => "TO_DO",
            Self::InProgress => "IN_PROGRESS",
            Self::InTest => "IN_TEST",
            Self::Done => "DONE",
            Self::Released => "RELEASED",
        };
        write!(f, "{s}")
    }
}

/// A typed edge between two work items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    /// Item the relationship is stated from
    pub source: ItemId,

    /// Item the relationship points at
    pub target: ItemId,

    /// Relationship type
    #[serde(rename = "type")]
    pub kind: RelationshipType,

    /// Optional free-form justification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl DependencyEdge {
    /// Create an edge without a reason
    pub fn new(
        source: impl Into<ItemId>,
        target: impl Into<ItemId>,
        kind: RelationshipType,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
            reason: None,
        }
    }

    /// Builder-style reason
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// The `(predecessor, successor)` pair this edge induces, if it is blocking
    pub fn precedence(&self) -> Option<(&ItemId, &ItemId)> {
        self.kind.precedence_pair(&self.source, &self.target)
    }
}

impl fmt::Display for DependencyEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} --[{}]--> {}", self.source, self.kind, self.target)
    }
}

/// Which edges of a node to list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeDirection {
    /// Edges whose source is the node
    #[default]
    Outgoing,

    /// Edges whose target is the node
    Incoming,

    /// Both
    Both,
}
