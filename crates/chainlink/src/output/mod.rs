//! Output formatting for CLI commands.
//!
//! Reports are printed either as human-readable text or as pretty JSON for
//! programmatic use.
//!
//! Submodules:
//! - [`color`]: Semantic color helpers

pub mod color;

use serde::Serialize;
use std::env;
use std::io::{self, Write};

pub use color::{error, info, success, warning};

/// Configuration for output formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    /// Whether to use colors in output.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Create a new OutputConfig with explicit values.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Create an OutputConfig by reading from environment variables.
    ///
    /// Reads:
    /// - `NO_COLOR`: Standard env var to disable colors (any value disables colors)
    /// - `CHAINLINK_COLOR`: Set to "0" or "false" to disable colors (default: true)
    pub fn from_env() -> Self {
        let no_color = env::var("NO_COLOR").ok();
        let chainlink_color = env::var("CHAINLINK_COLOR").ok();
        Self::from_values(no_color.as_deref(), chainlink_color.as_deref())
    }

    fn from_values(no_color: Option<&str>, chainlink_color: Option<&str>) -> Self {
        // Respect NO_COLOR standard (https://no-color.org/)
        let use_colors = no_color.is_none()
            && chainlink_color.is_none_or(|v| v != "0" && !v.eq_ignore_ascii_case("false"));
        Self { use_colors }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { use_colors: true }
    }
}

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(handle, "{json}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::unset(None, None, true)]
    #[case::no_color(Some("1"), None, false)]
    #[case::no_color_empty(Some(""), None, false)]
    #[case::explicit_off(None, Some("0"), false)]
    #[case::explicit_false(None, Some("FALSE"), false)]
    #[case::explicit_on(None, Some("1"), true)]
    #[case::no_color_wins(Some("1"), Some("1"), false)]
    fn test_color_env_handling(
        #[case] no_color: Option<&str>,
        #[case] chainlink_color: Option<&str>,
        #[case] expected: bool,
    ) {
        assert_eq!(
            OutputConfig::from_values(no_color, chainlink_color).use_colors,
            expected
        );
    }
}
