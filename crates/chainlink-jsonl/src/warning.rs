//! Non-fatal problems found while reading a JSONL file.

use std::fmt;

/// A line that was skipped during a resilient read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A non-blank line that is not valid JSON for the target type.
    MalformedJson {
        /// The 1-based line number.
        line_number: usize,
        /// The parser's message.
        error: String,
    },
}

impl Warning {
    /// Returns the line number associated with this warning.
    #[must_use]
    pub fn line_number(&self) -> usize {
        match self {
            Self::MalformedJson { line_number, .. } => *line_number,
        }
    }

    /// Returns a static string identifying the warning kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedJson { .. } => "malformed_json",
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedJson { line_number, error } => {
                write!(f, "line {line_number}: malformed JSON: {error}")
            }
        }
    }
}
