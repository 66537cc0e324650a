//! Dependency graph storage and analysis.
//!
//! The [`DependencyStore`] owns every typed edge of a project. Analyses
//! never read it directly: they take a [`BlockingView`] (the precedence
//! graph induced by blocking edges) and work on that snapshot.

pub mod critical_path;
pub mod cycles;
pub mod impact;
pub mod store;
pub mod view;

pub use critical_path::{
    Bottleneck, CriticalPathAnalysis, CriticalPathDetails, ItemCriticalPath, ScheduledItem,
};
pub use cycles::{CycleReport, find_all_cycles, find_cycles_up_to, would_create_cycle};
pub use impact::{
    BlockerReport, ConflictWarning, DateShift, DelayImpact, PathSummary, RemovalImpact,
    active_conflicts, blockers, conflict_pairs, critical_blockers, impact_of_delay,
    impact_of_removal,
};
pub use store::{DependencyStore, LinkOutcome, NodeHandle};
pub use view::{BlockingView, ViewFilter};
