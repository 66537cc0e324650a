//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use chainlink::config::AnalysisConfig;
use chainlink::domain::{ItemId, RelationshipType, WorkItem};
use chainlink::items::InMemoryItemService;
use chainlink::project::ProjectGraph;
use chrono::NaiveDate;
use std::path::Path;
use std::process::{Command, Output};

/// Monday the work starts
pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

/// Analysis parameters pinned to [`start_date`]
pub fn analysis_config() -> AnalysisConfig {
    AnalysisConfig::starting(start_date())
}

/// Shorthand for an item reference
pub fn id(s: &str) -> ItemId {
    ItemId::new(s)
}

/// WI-101 (8 days) <- WI-102 (16) <- WI-103 (16)
pub fn wi_chain() -> (ProjectGraph, InMemoryItemService) {
    let items: InMemoryItemService = [
        WorkItem::new("WI-101", "Design schema", 8),
        WorkItem::new("WI-102", "Build API", 16),
        WorkItem::new("WI-103", "Build UI", 16),
    ]
    .into_iter()
    .collect();

    let graph = ProjectGraph::new("proj");
    graph
        .link(&id("WI-102"), &id("WI-101"), RelationshipType::BlockedBy, None)
        .unwrap();
    graph
        .link(&id("WI-103"), &id("WI-102"), RelationshipType::BlockedBy, None)
        .unwrap();

    (graph, items)
}

/// Run the chainlink binary in `dir`
pub fn run_chainlink_in_dir(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_chainlink"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute chainlink binary")
}

/// Write one JSON item per line into the items file of an initialized repo
pub fn write_items(dir: &Path, items: &[WorkItem]) {
    let lines: Vec<String> = items
        .iter()
        .map(|item| serde_json::to_string(item).unwrap())
        .collect();
    std::fs::write(
        dir.join(".chainlink").join("items.jsonl"),
        lines.join("\n") + "\n",
    )
    .unwrap();
}
