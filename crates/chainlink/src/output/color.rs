//! Color and styling helpers for CLI output.
//!
//! Semantic Color Theme:
//!   - Success/Done:   green  (finished items, recorded links)
//!   - Warning/Active: yellow (in-progress items, conflicts, flagged items)
//!   - Error/Blocked:  red    (cycles, open critical blockers)
//!   - Info/Reference: cyan   (item IDs)
//!   - Muted:          dimmed (field labels, arrows)
//!   - Emphasis:       bold   (section headers)

use crate::domain::WorkflowState;
use colored::Colorize;

use super::OutputConfig;

/// Apply semantic "success" color (green) to text.
pub fn success(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.green().to_string()
}

/// Apply semantic "error" color (red) to text.
pub fn error(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.red().to_string()
}

/// Apply semantic "warning" color (yellow) to text.
pub fn warning(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.yellow().to_string()
}

/// Apply semantic "info" color (cyan) to text.
pub fn info(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.cyan().to_string()
}

/// Bold text for section headers.
pub(crate) fn bold(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.bold().to_string()
}

/// Dimmed text for labels and connectors.
pub(crate) fn dimmed(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.dimmed().to_string()
}

/// Colorize an item ID (cyan).
pub(crate) fn colorize_id(id: &str, config: &OutputConfig) -> String {
    info(id, config)
}

/// Apply color to status text based on workflow state.
pub(crate) fn colorize_status(status: WorkflowState, config: &OutputConfig) -> String {
    let text = status.to_string();
    if !config.use_colors {
        return text;
    }
    match status {
        WorkflowState::Found | WorkflowState::Triaged | WorkflowState::ToDo => {
            text.white().to_string()
        }
        WorkflowState::InProgress | WorkflowState::InTest => text.yellow().to_string(),
        WorkflowState::Done | WorkflowState::Released => text.green().to_string(),
    }
}
