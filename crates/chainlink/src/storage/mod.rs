//! File-backed persistence.
//!
//! The engine itself is storage-agnostic. This module only exists so the
//! CLI can keep items and links between runs, as JSON Lines files under
//! `.chainlink/`.

pub mod jsonl;

pub use jsonl::{LoadWarning, load_items, load_links, save_items, save_links};
