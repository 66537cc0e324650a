//! Error types for chainlink operations.
//!
//! Structural problems (self-loops, cycles, missing edges) are surfaced as
//! [`Error`] values. Missing work-item data is not an error: the analysis
//! modules flag such items in their reports and carry on.

use crate::domain::{ItemId, RelationshipType};
use std::io;
use thiserror::Error;

/// The error type for chainlink operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An edge would connect an item to itself.
    #[error("Cannot link {0} to itself")]
    SelfLoop(ItemId),

    /// A blocking edge would close a cycle in the blocking subgraph.
    ///
    /// The store is left unchanged when this is returned.
    #[error("Linking would create a dependency cycle: {}", format_cycle(.cycle))]
    CycleDetected {
        /// Items forming the cycle, in precedence order.
        cycle: Vec<ItemId>,
    },

    /// A pre-existing cycle prevents critical path computation.
    ///
    /// Run `check-circular` to locate and break the cycle.
    #[error("Circular dependency in blocking graph: {}", format_cycle(.cycle))]
    CircularDependency {
        /// Items forming the cycle, in precedence order.
        cycle: Vec<ItemId>,
    },

    /// The edge to remove does not exist.
    #[error("No {kind} link from {from} to {to}")]
    EdgeNotFound {
        /// Edge source.
        from: ItemId,
        /// Edge target.
        to: ItemId,
        /// Relationship type.
        kind: RelationshipType,
    },

    /// Work item not found in the item service.
    #[error("Work item not found: {0}")]
    ItemNotFound(ItemId),

    /// A relationship name could not be parsed.
    #[error("Unknown relationship type: {0}")]
    UnknownRelationship(String),

    /// The item service failed to answer a lookup.
    #[error("Item lookup failed for {id}: {message}")]
    Lookup {
        /// Item being looked up.
        id: ItemId,
        /// Failure reported by the service.
        message: String,
    },
}

/// Errors raised while locating or reading repository configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No `.chainlink/` directory was found.
    #[error("Not a chainlink repository (or any parent directory). Run 'chainlink init' first")]
    NotInitialized,

    /// A `.chainlink/` directory already exists.
    #[error("Chainlink is already initialized in this directory. Found existing '{0}'")]
    AlreadyInitialized(String),

    /// The configuration file could not be parsed.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<chainlink_jsonl::Error> for Error {
    fn from(err: chainlink_jsonl::Error) -> Self {
        match err {
            chainlink_jsonl::Error::Io(e) => Self::Io(e),
            chainlink_jsonl::Error::Json(e) => Self::Json(e),
        }
    }
}

/// A specialized Result type for chainlink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Render a cycle as `a -> b -> c -> a`.
pub(crate) fn format_cycle(cycle: &[ItemId]) -> String {
    let mut parts: Vec<&str> = cycle.iter().map(ItemId::as_str).collect();
    if let Some(first) = cycle.first() {
        parts.push(first.as_str());
    }
    parts.join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jsonl_errors_keep_their_kind() {
        let io = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = Error::from(chainlink_jsonl::Error::Io(io));
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_cycle_error_message_closes_the_loop() {
        let err = Error::CycleDetected {
            cycle: vec![ItemId::new("WI-103"), ItemId::new("WI-101")],
        };
        assert_eq!(
            err.to_string(),
            "Linking would create a dependency cycle: WI-103 -> WI-101 -> WI-103"
        );
    }

    #[test]
    fn test_edge_not_found_message() {
        let err = Error::EdgeNotFound {
            from: ItemId::new("a"),
            to: ItemId::new("b"),
            kind: RelationshipType::BlockedBy,
        };
        assert_eq!(err.to_string(), "No blocked-by link from a to b");
    }

    #[test]
    fn test_config_error_is_transparent() {
        let err: Error = ConfigError::NotInitialized.into();
        assert!(err.to_string().contains("Not a chainlink repository"));
    }

    #[test]
    fn test_format_cycle_empty() {
        assert_eq!(format_cycle(&[]), "");
    }
}
