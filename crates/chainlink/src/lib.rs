//! Chainlink - dependency graphs and critical-path analysis for work items.
//!
//! The engine keeps typed relationships between work items it does not own,
//! validates that blocking links stay acyclic, and answers scheduling
//! questions: the critical path, bottlenecks, blockers and the downstream
//! impact of delaying or removing an item.
//!
//! Layers, bottom up:
//! - [`domain`]: item references, relationship types and their metadata
//! - [`graph`]: the dependency store and the analyses run on its views
//! - [`items`]: the item service seam and per-query item resolution
//! - [`project`]: a shareable, concurrently readable project graph
//! - [`query`]: the facade callers use
//! - [`storage`], [`commands`], [`app`], [`cli`]: the file-backed CLI

#![forbid(unsafe_code)]

// Engine
pub mod config;
pub mod domain;
pub mod error;
pub mod graph;
pub mod items;
pub mod project;
pub mod query;

// File-backed persistence
pub mod storage;

// Public CLI module (needed by binary)
pub mod cli;

// Command implementations
pub mod commands;

// Application context
pub mod app;

// Output formatting
pub mod output;

pub use error::{Error, Result};
