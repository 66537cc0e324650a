//! Relationship type registry.
//!
//! Each [`RelationshipType`] carries static metadata (its complement and,
//! for blocking types, which endpoint must finish first) via
//! [`RelationshipType::info`]. Linking `A BLOCKED_BY B` records the
//! complementary `B BLOCKS A` as well; both induce the same precedence
//! pair `B -> A`.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which endpoint of a blocking edge must complete first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precedence {
    /// The source precedes the target (`A BLOCKS B`)
    SourceFirst,

    /// The target precedes the source (`A BLOCKED_BY B`)
    TargetFirst,
}

/// Static metadata for a relationship type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationshipInfo {
    /// Relationship recorded on the opposite endpoint
    pub complement: RelationshipType,

    /// Scheduling direction; `None` for informational types
    pub precedence: Option<Precedence>,

    /// Whether this is the canonical side of the pair
    pub primary: bool,
}

/// Type of relationship between two work items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipType {
    /// Hard blocker: the source cannot finish until the target does
    BlockedBy,
    /// Complement of `BlockedBy`
    Blocks,
    /// Soft dependency on the target
    DependsOn,
    /// Complement of `DependsOn`
    DependedOnBy,
    /// The source is a child of the target; the parent is gated by its children
    SubtaskOf,
    /// Complement of `SubtaskOf`
    HasSubtask,
    /// Informational link
    RelatedTo,
    /// The source duplicates the target
    Duplicates,
    /// Complement of `Duplicates`
    DuplicatedBy,
    /// Ordering hint: the source comes after the target
    Follows,
    /// Ordering hint: the source comes before the target
    Precedes,
    /// The two items should not be worked on at the same time
    ConflictsWith,
}

impl RelationshipType {
    /// Every relationship type, primaries before complements
    pub const ALL: [Self; 12] = [
        Self::BlockedBy,
        Self::DependsOn,
        Self::SubtaskOf,
        Self::RelatedTo,
        Self::Duplicates,
        Self::Follows,
        Self::ConflictsWith,
        Self::Blocks,
        Self::DependedOnBy,
        Self::HasSubtask,
        Self::DuplicatedBy,
        Self::Precedes,
    ];

    /// Blocking types seen from the waiting item (`A waits on B`)
    pub const WAITS_ON: [Self; 3] = [Self::BlockedBy, Self::DependsOn, Self::HasSubtask];

    /// Blocking types seen from the item being waited on (`A gates B`)
    pub const GATES: [Self; 3] = [Self::Blocks, Self::DependedOnBy, Self::SubtaskOf];

    /// Static metadata lookup
    pub const fn info(self) -> RelationshipInfo {
        use Precedence::{SourceFirst, TargetFirst};

        let (complement, precedence, primary) = match self {
            Self::BlockedBy => (Self::Blocks, Some(TargetFirst), true),
            Self::Blocks => (Self::BlockedBy, Some(SourceFirst), false),
            Self::DependsOn => (Self::DependedOnBy, Some(TargetFirst), true),
            Self::DependedOnBy => (Self::DependsOn, Some(SourceFirst), false),
            // child SUBTASK_OF parent: the child finishes first
            Self::SubtaskOf => (Self::HasSubtask, Some(SourceFirst), true),
            Self::HasSubtask => (Self::SubtaskOf, Some(TargetFirst), false),
            Self::RelatedTo => (Self::RelatedTo, None, true),
            Self::Duplicates => (Self::DuplicatedBy, None, true),
            Self::DuplicatedBy => (Self::Duplicates, None, false),
            Self::Follows => (Self::Precedes, None, true),
            Self::Precedes => (Self::Follows, None, false),
            Self::ConflictsWith => (Self::ConflictsWith, None, true),
        };

        RelationshipInfo {
            complement,
            precedence,
            primary,
        }
    }

    /// Relationship recorded on the other endpoint
    pub const fn complement(self) -> Self {
        self.info().complement
    }

    /// Whether edges of this type carry scheduling weight
    pub const fn is_blocking(self) -> bool {
        self.info().precedence.is_some()
    }

    /// Whether inserting this type must pass the cycle check
    pub const fn is_cycle_checked(self) -> bool {
        self.is_blocking()
    }

    /// Whether the type is its own complement
    pub const fn is_symmetric(self) -> bool {
        matches!(self, Self::RelatedTo | Self::ConflictsWith)
    }

    /// Order `(source, target)` as `(predecessor, successor)` for blocking types
    pub fn precedence_pair<T>(self, source: T, target: T) -> Option<(T, T)> {
        match self.info().precedence? {
            Precedence::SourceFirst => Some((source, target)),
            Precedence::TargetFirst => Some((target, source)),
        }
    }

    /// Canonical kebab-case name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BlockedBy => "blocked-by",
            Self::Blocks => "blocks",
            Self::DependsOn => "depends-on",
            Self::DependedOnBy => "depended-on-by",
            Self::SubtaskOf => "subtask-of",
            Self::HasSubtask => "has-subtask",
            Self::RelatedTo => "related-to",
            Self::Duplicates => "duplicates",
            Self::DuplicatedBy => "duplicated-by",
            Self::Follows => "follows",
            Self::Precedes => "precedes",
            Self::ConflictsWith => "conflicts-with",
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RelationshipType {
    type Err = Error;

    /// Accepts `blocked-by`, `blocked_by` and `BLOCKED_BY` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| Error::UnknownRelationship(s.to_string()))
    }
}
