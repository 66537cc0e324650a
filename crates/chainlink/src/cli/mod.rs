//! Command-line interface for chainlink.
//!
//! Commands:
//! - `init`: Create a `.chainlink/` repository
//! - `link` / `unlink`: Record or remove a typed relationship
//! - `deps`: List dependencies or dependents of an item
//! - `path`: Critical path, item position or blockers of a scope
//! - `impact`: Downstream impact with delay and removal simulations
//! - `check-circular`: Locate dependency cycles
//! - `graph`: Dump each item with its direct blocking predecessors

mod args;
mod execute;
mod types;
mod validators;

pub use args::{
    CheckCircularArgs, DepsArgs, GraphArgs, ImpactArgs, InitArgs, LinkArgs, PathArgs, ScopeArgs,
    UnlinkArgs,
};
pub use types::RelationshipTypeArg;
pub use validators::{validate_item_id, validate_project};

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Dependency graph and critical-path analysis for work items
#[derive(Parser, Debug)]
#[command(name = "chainlink")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new chainlink repository
    ///
    /// Creates `.chainlink/` with a configuration file and empty item and
    /// link files in the current directory.
    Init(InitArgs),

    /// Link two items
    ///
    /// Records the relationship and its complement. Blocking links that
    /// would close a cycle are rejected with the cycle path.
    Link(LinkArgs),

    /// Remove a link between two items
    Unlink(UnlinkArgs),

    /// Show what an item depends on
    ///
    /// Lists direct dependencies by default. Use --transitive to walk the
    /// whole chain and --reverse to list the items waiting on it.
    Deps(DepsArgs),

    /// Show the critical path
    ///
    /// Computes the longest-effort chain of blocking links for the project
    /// or a release, with bottlenecks and a projected completion date.
    Path(PathArgs),

    /// Analyse the impact of an item
    ///
    /// Lists the items it blocks and optionally simulates a delay or its
    /// removal.
    Impact(ImpactArgs),

    /// Check for circular dependencies
    #[command(name = "check-circular")]
    CheckCircular(CheckCircularArgs),

    /// Show each item with the items it waits on
    Graph(GraphArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Execute the CLI command
    pub async fn execute(&self) -> Result<()> {
        use crate::app::App;
        use crate::output::OutputMode;

        let output_mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };

        let Some(command) = &self.command else {
            println!("Chainlink dependency graph and critical-path analysis");
            println!("Use --help for more information");
            return Ok(());
        };

        if let Commands::Init(args) = command {
            return execute::execute_init(args).await;
        }

        let app = App::from_directory(&std::env::current_dir()?).await?;
        match command {
            Commands::Init(_) => Ok(()),
            Commands::Link(args) => execute::execute_link(&app, args, output_mode).await,
            Commands::Unlink(args) => execute::execute_unlink(&app, args, output_mode).await,
            Commands::Deps(args) => execute::execute_deps(&app, args, output_mode),
            Commands::Path(args) => execute::execute_path(&app, args, output_mode),
            Commands::Impact(args) => execute::execute_impact(&app, args, output_mode),
            Commands::CheckCircular(args) => {
                execute::execute_check_circular(&app, args, output_mode)
            }
            Commands::Graph(args) => execute::execute_graph(&app, args, output_mode),
        }
    }
}
