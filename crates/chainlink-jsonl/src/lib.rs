//! JSON Lines files for chainlink.
//!
//! Reading is resilient: lines that fail to parse are reported as
//! [`Warning`]s and skipped. Writing goes through a temporary file that is
//! renamed over the target, so a crash never leaves a half-written file.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod atomic;
pub mod error;
pub mod reader;
pub mod warning;

pub use atomic::write_jsonl_atomic;
pub use error::{Error, Result};
pub use reader::{Line, read_jsonl_resilient};
pub use warning::Warning;
