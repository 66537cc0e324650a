//! Implementation of the `init` command.
//!
//! Creates the `.chainlink/` directory with a configuration file and empty
//! item and link files, and locates that directory for later commands.

use crate::config::{AnalysisConfig, DEFAULT_BOTTLENECK_FACTOR};
use crate::error::{ConfigError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Default project name if none specified
pub const DEFAULT_PROJECT: &str = "proj";

/// Name of the chainlink directory
pub const CHAINLINK_DIR_NAME: &str = ".chainlink";

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Name of the items data file
pub const ITEMS_FILE_NAME: &str = "items.jsonl";

/// Name of the links data file
pub const LINKS_FILE_NAME: &str = "links.jsonl";

/// Maximum project name length
pub const MAX_PROJECT_LENGTH: usize = 40;

/// Maximum directory depth to traverse when searching for the chainlink root
pub const MAX_TRAVERSAL_DEPTH: usize = 256;

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ChainlinkConfig {
    /// Project the graph belongs to
    pub project: String,

    /// First working day; today (UTC) when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,

    /// Bottleneck threshold multiplier
    #[serde(default = "default_bottleneck_factor")]
    pub bottleneck_factor: f64,

    /// Items file, relative to the repository root
    pub items_file: String,

    /// Links file, relative to the repository root
    pub links_file: String,
}

fn default_bottleneck_factor() -> f64 {
    DEFAULT_BOTTLENECK_FACTOR
}

impl ChainlinkConfig {
    /// Create a new configuration for `project`
    pub fn new(project: &str) -> Self {
        Self {
            project: project.to_string(),
            start_date: None,
            bottleneck_factor: DEFAULT_BOTTLENECK_FACTOR,
            items_file: format!("{CHAINLINK_DIR_NAME}/{ITEMS_FILE_NAME}"),
            links_file: format!("{CHAINLINK_DIR_NAME}/{LINKS_FILE_NAME}"),
        }
    }

    /// Load configuration from a file
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        validate_project(&config.project)?;
        if !(config.bottleneck_factor.is_finite() && config.bottleneck_factor > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "bottleneck-factor must be a positive number, got {}",
                config.bottleneck_factor
            ))
            .into());
        }
        Ok(config)
    }

    /// Save configuration to a file
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Invalid(format!("YAML error: {e}")))?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Analysis parameters derived from this configuration
    pub fn analysis(&self) -> AnalysisConfig {
        let base = self
            .start_date
            .map_or_else(AnalysisConfig::default, AnalysisConfig::starting);
        base.with_bottleneck_factor(self.bottleneck_factor)
    }
}

impl Default for ChainlinkConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PROJECT)
    }
}

/// Result of the init command
#[derive(Debug)]
pub struct InitResult {
    /// Path to the created chainlink directory
    pub chainlink_dir: PathBuf,
    /// Path to the created config file
    pub config_file: PathBuf,
    /// Path to the created items file
    pub items_file: PathBuf,
    /// Path to the created links file
    pub links_file: PathBuf,
    /// The project name used
    pub project: String,
}

/// Validate a project name.
///
/// Requirements:
/// - 1-40 characters
/// - Letters, digits, `-` and `_` only
///
/// Expects pre-trimmed input.
pub fn validate_project(project: &str) -> Result<()> {
    if project.is_empty() {
        return Err(ConfigError::Invalid("Project name cannot be empty".to_string()).into());
    }

    if project.len() > MAX_PROJECT_LENGTH {
        return Err(ConfigError::Invalid(format!(
            "Project name cannot exceed {MAX_PROJECT_LENGTH} characters"
        ))
        .into());
    }

    if !project
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Invalid(
            "Project name may only contain letters, digits, '-' and '_'".to_string(),
        )
        .into());
    }

    Ok(())
}

/// Initialize a new chainlink repository in the given directory.
///
/// # Errors
///
/// Returns an error if:
/// - The `.chainlink/` directory already exists
/// - The project name is invalid
/// - File system operations fail
pub async fn init(base_dir: &Path, project: Option<&str>) -> Result<InitResult> {
    let project = project.unwrap_or(DEFAULT_PROJECT).trim();
    validate_project(project)?;

    let chainlink_dir = base_dir.join(CHAINLINK_DIR_NAME);
    if chainlink_dir.exists() {
        return Err(ConfigError::AlreadyInitialized(CHAINLINK_DIR_NAME.to_string()).into());
    }

    fs::create_dir_all(&chainlink_dir).await?;

    let config_file = chainlink_dir.join(CONFIG_FILE_NAME);
    ChainlinkConfig::new(project).save(&config_file).await?;

    let items_file = chainlink_dir.join(ITEMS_FILE_NAME);
    fs::write(&items_file, "").await?;

    let links_file = chainlink_dir.join(LINKS_FILE_NAME);
    fs::write(&links_file, "").await?;

    tracing::info!(project, dir = %chainlink_dir.display(), "Initialized chainlink repository");

    Ok(InitResult {
        chainlink_dir,
        config_file,
        items_file,
        links_file,
        project: project.to_string(),
    })
}

/// Find the chainlink root directory by searching up the directory tree.
///
/// Returns the directory containing `.chainlink/`, or `None` if none is
/// found within [`MAX_TRAVERSAL_DEPTH`] levels.
pub fn find_chainlink_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    let mut depth = 0;

    loop {
        if current.join(CHAINLINK_DIR_NAME).exists() {
            return Some(current);
        }

        depth += 1;
        if depth > MAX_TRAVERSAL_DEPTH || !current.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case::short("p")]
    #[case::default_name("proj")]
    #[case::dashes("release-2026")]
    #[case::underscores("core_api")]
    fn test_validate_project_valid(#[case] project: &str) {
        assert!(validate_project(project).is_ok());
    }

    #[rstest]
    #[case::empty("")]
    #[case::space("my proj")]
    #[case::slash("a/b")]
    #[case::too_long("a123456789b123456789c123456789d123456789e")]
    fn test_validate_project_invalid(#[case] project: &str) {
        assert!(matches!(
            validate_project(project),
            Err(Error::Config(ConfigError::Invalid(_)))
        ));
    }

    #[tokio::test]
    async fn test_init_creates_files() {
        let temp_dir = TempDir::new().unwrap();
        let result = init(temp_dir.path(), Some(" alpha ")).await.unwrap();

        assert_eq!(result.project, "alpha");
        assert!(result.config_file.exists());
        assert!(result.items_file.exists());
        assert!(result.links_file.exists());

        let config = ChainlinkConfig::load(&result.config_file).await.unwrap();
        assert_eq!(config, ChainlinkConfig::new("alpha"));
    }

    #[tokio::test]
    async fn test_init_twice_fails() {
        let temp_dir = TempDir::new().unwrap();
        init(temp_dir.path(), None).await.unwrap();

        let err = init(temp_dir.path(), None).await.unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::AlreadyInitialized(_))));
    }

    #[tokio::test]
    async fn test_config_yaml_keys() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            "project: beta\nstart-date: 2026-01-05\nbottleneck-factor: 2.0\n\
             items-file: data/items.jsonl\nlinks-file: data/links.jsonl\n",
        )
        .await
        .unwrap();

        let config = ChainlinkConfig::load(&path).await.unwrap();
        assert_eq!(config.start_date, NaiveDate::from_ymd_opt(2026, 1, 5));
        assert_eq!(config.items_file, "data/items.jsonl");

        let analysis = config.analysis();
        assert_eq!(analysis.start_date, NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
        assert!((analysis.bottleneck_factor - 2.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_config_rejects_bad_factor() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            "project: beta\nbottleneck-factor: -1\nitems-file: a\nlinks-file: b\n",
        )
        .await
        .unwrap();

        let err = ChainlinkConfig::load(&path).await.unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_find_root_from_subdirectory() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join(CHAINLINK_DIR_NAME)).unwrap();
        let nested = temp_dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_chainlink_root(&nested).as_deref(), Some(temp_dir.path()));
    }

    #[test]
    fn test_find_root_missing() {
        let temp_dir = TempDir::new().unwrap();
        // tempdirs may live under a directory that itself has .chainlink
        let found = find_chainlink_root(temp_dir.path());
        assert!(found.is_none_or(|root| root != temp_dir.path()));
    }
}
