//! CLI value enums and domain type conversions.

use clap::ValueEnum;

use crate::domain::RelationshipType;

/// Relationship type for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipTypeArg {
    /// Hard blocker: the source waits for the target
    #[value(name = "blocked-by", alias = "blocked_by")]
    BlockedBy,
    /// The source gates the target
    Blocks,
    /// Soft dependency on the target
    #[value(name = "depends-on", alias = "depends_on")]
    DependsOn,
    /// The target depends on the source
    #[value(name = "depended-on-by", alias = "depended_on_by")]
    DependedOnBy,
    /// The source is a child of the target
    #[value(name = "subtask-of", alias = "subtask_of")]
    SubtaskOf,
    /// The target is a child of the source
    #[value(name = "has-subtask", alias = "has_subtask")]
    HasSubtask,
    /// Informational link
    #[value(name = "related-to", alias = "related_to")]
    RelatedTo,
    /// The source duplicates the target
    Duplicates,
    /// The target duplicates the source
    #[value(name = "duplicated-by", alias = "duplicated_by")]
    DuplicatedBy,
    /// The source comes after the target
    Follows,
    /// The source comes before the target
    Precedes,
    /// The two items should not be worked on together
    #[value(name = "conflicts-with", alias = "conflicts_with")]
    ConflictsWith,
}

impl From<RelationshipTypeArg> for RelationshipType {
    fn from(arg: RelationshipTypeArg) -> Self {
        match arg {
            RelationshipTypeArg::BlockedBy => Self::BlockedBy,
            RelationshipTypeArg::Blocks => Self::Blocks,
            RelationshipTypeArg::DependsOn => Self::DependsOn,
            RelationshipTypeArg::DependedOnBy => Self::DependedOnBy,
            RelationshipTypeArg::SubtaskOf => Self::SubtaskOf,
            RelationshipTypeArg::HasSubtask => Self::HasSubtask,
            RelationshipTypeArg::RelatedTo => Self::RelatedTo,
            RelationshipTypeArg::Duplicates => Self::Duplicates,
            RelationshipTypeArg::DuplicatedBy => Self::DuplicatedBy,
            RelationshipTypeArg::Follows => Self::Follows,
            RelationshipTypeArg::Precedes => Self::Precedes,
            RelationshipTypeArg::ConflictsWith => Self::ConflictsWith,
        }
    }
}

impl std::fmt::Display for RelationshipTypeArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", RelationshipType::from(*self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_arg_maps_to_a_distinct_type() {
        let mapped: std::collections::HashSet<RelationshipType> = RelationshipTypeArg::value_variants()
            .iter()
            .map(|&arg| arg.into())
            .collect();
        assert_eq!(mapped.len(), RelationshipType::ALL.len());
    }

    #[test]
    fn test_display_matches_value_name() {
        for arg in RelationshipTypeArg::value_variants() {
            let name = arg.to_possible_value().unwrap().get_name().to_string();
            assert_eq!(arg.to_string(), name);
        }
    }
}
