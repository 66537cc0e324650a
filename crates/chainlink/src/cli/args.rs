//! CLI argument structs for all commands.
//!
//! Each command has its own argument struct with clap derive attributes
//! for parsing and validation.

use clap::{Args, Parser};

use super::types::RelationshipTypeArg;
use super::validators::{validate_item_id, validate_project};
use crate::domain::ItemId;
use crate::query::{DependencyQuery, Scope};

/// Arguments for the `init` command
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Project name
    ///
    /// Letters, digits, '-' and '_', at most 40 characters.
    #[arg(short, long, value_parser = validate_project)]
    pub project: Option<String>,

    /// Suppress output messages
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the `link` command
#[derive(Parser, Debug, Clone)]
pub struct LinkArgs {
    /// Item the relationship is stated from
    #[arg(value_parser = validate_item_id)]
    pub source: String,

    /// Item the relationship points at
    #[arg(value_parser = validate_item_id)]
    pub target: String,

    /// Relationship type
    #[arg(short = 't', long = "type", value_enum, ignore_case = true)]
    pub kind: RelationshipTypeArg,

    /// Why the link exists
    #[arg(short, long)]
    pub reason: Option<String>,
}

/// Arguments for the `unlink` command
#[derive(Parser, Debug, Clone)]
pub struct UnlinkArgs {
    /// Item the relationship was stated from
    #[arg(value_parser = validate_item_id)]
    pub source: String,

    /// Item the relationship points at
    #[arg(value_parser = validate_item_id)]
    pub target: String,

    /// Relationship type
    #[arg(short = 't', long = "type", value_enum, ignore_case = true)]
    pub kind: RelationshipTypeArg,
}

/// Arguments for the `deps` command
#[derive(Parser, Debug, Clone)]
pub struct DepsArgs {
    /// Item to inspect
    #[arg(value_parser = validate_item_id)]
    pub id: String,

    /// Follow links past the direct neighbours
    #[arg(long)]
    pub transitive: bool,

    /// Maximum hops when transitive
    #[arg(short, long, requires = "transitive")]
    pub depth: Option<usize>,

    /// Relationship types to follow (comma-separated)
    ///
    /// Defaults to the blocking types: blocked-by, depends-on, has-subtask,
    /// or their complements with --reverse.
    #[arg(short, long, value_enum, value_delimiter = ',', ignore_case = true)]
    pub types: Vec<RelationshipTypeArg>,

    /// List the items that wait on this one instead
    #[arg(long)]
    pub reverse: bool,
}

impl DepsArgs {
    /// Query options for the facade
    pub fn query(&self) -> DependencyQuery {
        DependencyQuery {
            transitive: self.transitive,
            depth: self.depth,
            types: (!self.types.is_empty())
                .then(|| self.types.iter().map(|&arg| arg.into()).collect()),
            reverse: self.reverse,
        }
    }
}

/// Scope selection shared by analysis commands
#[derive(Args, Debug, Clone, Default)]
pub struct ScopeArgs {
    /// Restrict the analysis to a named release
    #[arg(long, requires = "items")]
    pub release: Option<String>,

    /// Members of the release (comma-separated item IDs)
    #[arg(long, value_delimiter = ',', value_parser = validate_item_id, requires = "release")]
    pub items: Vec<String>,
}

impl ScopeArgs {
    /// Scope described by these arguments
    pub fn scope(&self) -> Scope {
        match &self.release {
            Some(name) => Scope::release(name.clone(), self.items.iter().map(ItemId::new)),
            None => Scope::Project,
        }
    }
}

/// Arguments for the `path` command
#[derive(Parser, Debug, Clone)]
pub struct PathArgs {
    #[command(flatten)]
    pub(crate) scope: ScopeArgs,

    /// Include per-item cumulative effort and completion dates
    #[arg(short, long)]
    pub estimates: bool,

    /// Show where one item stands relative to the critical path
    #[arg(long, value_parser = validate_item_id, conflicts_with_all = ["estimates", "blockers"])]
    pub item: Option<String>,

    /// List blockers and their impact instead of the path
    #[arg(short, long, conflicts_with = "estimates")]
    pub blockers: bool,
}

/// Arguments for the `impact` command
#[derive(Parser, Debug, Clone)]
pub struct ImpactArgs {
    /// Item to analyse
    #[arg(value_parser = validate_item_id)]
    pub id: String,

    /// Simulate a delay of this many days
    #[arg(short, long)]
    pub delay: Option<u64>,

    /// Simulate removing the item from the graph
    #[arg(short, long)]
    pub remove: bool,
}

/// Arguments for the `check-circular` command
#[derive(Parser, Debug, Clone)]
pub struct CheckCircularArgs {
    #[command(flatten)]
    pub(crate) scope: ScopeArgs,

    /// Only report cycles of at most this many items
    #[arg(short, long)]
    pub depth: Option<usize>,
}

/// Arguments for the `graph` command
#[derive(Parser, Debug, Clone)]
pub struct GraphArgs {
    #[command(flatten)]
    pub(crate) scope: ScopeArgs,
}
