//! Application context for CLI command execution.
//!
//! [`App`] loads the configuration, items and links of a chainlink
//! repository and hands out a [`GraphQueries`] facade over them.
//!
//! # Example
//!
//! ```no_run
//! use chainlink::app::App;
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::from_directory(Path::new(".")).await?;
//!     let report = app.queries().path(&Default::default(), false)?;
//!     println!("{} days", report.details.total_effort);
//!     Ok(())
//! }
//! ```

use crate::commands::init::{
    CHAINLINK_DIR_NAME, CONFIG_FILE_NAME, ChainlinkConfig, find_chainlink_root,
};
use crate::error::{ConfigError, Result};
use crate::items::InMemoryItemService;
use crate::project::ProjectGraph;
use crate::query::GraphQueries;
use crate::storage::{LoadWarning, load_items, load_links, save_links};
use std::path::{Path, PathBuf};

/// Application context for CLI operations.
#[derive(Debug)]
pub struct App {
    graph: ProjectGraph,
    items: InMemoryItemService,
    config: ChainlinkConfig,
    root_dir: PathBuf,
    warnings: Vec<LoadWarning>,
}

impl App {
    /// Create an App from the given working directory.
    ///
    /// Searches up the directory tree for `.chainlink/`, then loads the
    /// configuration, items and links. Load warnings are logged and kept.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No chainlink repository is found in the directory tree
    /// - Configuration cannot be loaded
    /// - A data file cannot be read
    pub async fn from_directory(working_dir: &Path) -> Result<Self> {
        let root_dir = find_chainlink_root(working_dir).ok_or(ConfigError::NotInitialized)?;
        let config_path = root_dir.join(CHAINLINK_DIR_NAME).join(CONFIG_FILE_NAME);
        let config = ChainlinkConfig::load(&config_path).await?;

        let (items, mut warnings) = load_items(&root_dir.join(&config.items_file)).await?;
        let (store, link_warnings) =
            load_links(&root_dir.join(&config.links_file), &config.project).await?;
        warnings.extend(link_warnings);

        for warning in &warnings {
            tracing::warn!(project = %config.project, "{warning}");
        }

        Ok(Self {
            graph: ProjectGraph::from_store(store),
            items,
            config,
            root_dir,
            warnings,
        })
    }

    /// Query facade over the loaded graph and items
    pub fn queries(&self) -> GraphQueries<'_> {
        GraphQueries::new(&self.graph, &self.items, self.config.analysis())
    }

    /// Loaded configuration
    pub fn config(&self) -> &ChainlinkConfig {
        &self.config
    }

    /// Directory containing `.chainlink/`
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Problems found while loading data files
    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    /// Persist the current links.
    ///
    /// Call after any mutating command.
    pub async fn save(&self) -> Result<()> {
        let path = self.root_dir.join(&self.config.links_file);
        save_links(&self.graph.snapshot(), &path).await
    }
}
