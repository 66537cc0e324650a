//! Command execution logic.
//!
//! Each `execute_*` function runs one command against the loaded [`App`]
//! and prints its report as text or JSON.

use anyhow::Result;

use super::args::{
    CheckCircularArgs, DepsArgs, GraphArgs, ImpactArgs, InitArgs, LinkArgs, PathArgs, UnlinkArgs,
};
use crate::app::App;
use crate::domain::{ItemId, RelationshipType};
use crate::graph::{ConflictWarning, CriticalPathDetails, ScheduledItem};
use crate::items::FlaggedItem;
use crate::output::color::{bold, colorize_id, colorize_status, dimmed};
use crate::output::{self, OutputConfig, OutputMode};

/// Execute the init command
pub async fn execute_init(args: &InitArgs) -> Result<()> {
    use crate::commands::init;

    let current_dir = std::env::current_dir()?;

    if !args.quiet {
        println!(
            "Initializing chainlink repository{}...",
            args.project
                .as_ref()
                .map(|p| format!(" for project '{p}'"))
                .unwrap_or_default()
        );
    }

    let result = init::init(&current_dir, args.project.as_deref()).await?;

    if !args.quiet {
        println!("Initialized chainlink in {}", result.chainlink_dir.display());
        println!("  Config:  {}", result.config_file.display());
        println!("  Items:   {}", result.items_file.display());
        println!("  Links:   {}", result.links_file.display());
        println!("  Project: {}", result.project);
    }

    Ok(())
}

/// Execute the link command
pub async fn execute_link(app: &App, args: &LinkArgs, output_mode: OutputMode) -> Result<()> {
    let kind: RelationshipType = args.kind.into();
    let report = app.queries().link(
        &ItemId::new(&args.source),
        &ItemId::new(&args.target),
        kind,
        args.reason.clone(),
    )?;
    app.save().await?;

    match output_mode {
        OutputMode::Json => output::print_json(&report)?,
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            let verb = match report.outcome {
                crate::graph::LinkOutcome::Created => "Linked",
                crate::graph::LinkOutcome::Updated => "Updated link",
            };
            println!(
                "{}: {} --[{}]--> {}",
                output::success(verb, &config),
                colorize_id(&args.source, &config),
                kind,
                colorize_id(&args.target, &config)
            );
            if let Some(reason) = &report.edge.reason {
                println!("  {} {reason}", dimmed("Reason:", &config));
            }
        }
    }

    Ok(())
}

/// Execute the unlink command
pub async fn execute_unlink(app: &App, args: &UnlinkArgs, output_mode: OutputMode) -> Result<()> {
    let kind: RelationshipType = args.kind.into();
    app.queries()
        .unlink(&ItemId::new(&args.source), &ItemId::new(&args.target), kind)?;
    app.save().await?;

    match output_mode {
        OutputMode::Json => {
            output::print_json(&serde_json::json!({
                "action": "unlink",
                "source": args.source,
                "target": args.target,
                "type": kind,
                "status": "success"
            }))?;
        }
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            println!(
                "{}: {} --[{}]--> {}",
                output::success("Unlinked", &config),
                colorize_id(&args.source, &config),
                kind,
                colorize_id(&args.target, &config)
            );
        }
    }

    Ok(())
}

/// Execute the deps command
pub fn execute_deps(app: &App, args: &DepsArgs, output_mode: OutputMode) -> Result<()> {
    let report = app.queries().dependencies(&ItemId::new(&args.id), &args.query());

    match output_mode {
        OutputMode::Json => output::print_json(&report)?,
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            let heading = if report.reverse {
                "Items waiting on"
            } else {
                "Dependencies of"
            };
            println!(
                "{} {}",
                bold(heading, &config),
                colorize_id(report.id.as_str(), &config)
            );

            if report.dependencies.is_empty() {
                println!("  {}", dimmed("(none)", &config));
                return Ok(());
            }

            for entry in &report.dependencies {
                let indent = "  ".repeat(entry.depth);
                let status = entry
                    .status
                    .map(|s| format!(" [{}]", colorize_status(s, &config)))
                    .unwrap_or_default();
                let title = entry
                    .title
                    .as_deref()
                    .map_or_else(|| output::warning("(unknown item)", &config), str::to_string);
                println!(
                    "{indent}{} {title}{status} {}",
                    colorize_id(entry.id.as_str(), &config),
                    dimmed(&format!("({} via {})", entry.kind, entry.via), &config)
                );
            }
        }
    }

    Ok(())
}

/// Execute the path command
pub fn execute_path(app: &App, args: &PathArgs, output_mode: OutputMode) -> Result<()> {
    let scope = args.scope.scope();
    let queries = app.queries();

    if let Some(item) = &args.item {
        let report = queries.item_path(&scope, &ItemId::new(item))?;
        match output_mode {
            OutputMode::Json => output::print_json(&report)?,
            OutputMode::Text => {
                let config = OutputConfig::from_env();
                println!(
                    "{} {}",
                    bold("Critical path position of", &config),
                    colorize_id(report.id.as_str(), &config)
                );
                match report.position {
                    Some(position) => println!(
                        "  {} step {} of {}",
                        output::error("On the critical path:", &config),
                        position,
                        report.critical_path.len()
                    ),
                    None => println!("  Not on the critical path"),
                }
                print_id_line("Critical path:", &report.critical_path, " -> ", &config);
                print_id_line("Longest chain:", &report.longest_chain, " -> ", &config);
                print_id_line("Direct:", &report.direct_dependencies, ", ", &config);
                print_id_line("Indirect:", &report.indirect_dependencies, ", ", &config);
                if let (Some(effort), Some(date)) =
                    (report.cumulative_effort, report.estimated_completion_date)
                {
                    println!(
                        "  {} {effort} days, done by {date}",
                        dimmed("Cumulative:", &config)
                    );
                }
            }
        }
        return Ok(());
    }

    if args.blockers {
        let report = queries.blockers(&scope);
        match output_mode {
            OutputMode::Json => output::print_json(&report)?,
            OutputMode::Text => {
                let config = OutputConfig::from_env();
                println!(
                    "{} {}",
                    bold("Blockers in", &config),
                    &report.scope
                );
                if report.blockers.is_empty() {
                    println!("  {}", dimmed("(none)", &config));
                }
                for blocker in &report.blockers {
                    let marker = if report.critical.contains(&blocker.id) {
                        output::error("!", &config)
                    } else {
                        " ".to_string()
                    };
                    let status = blocker
                        .status
                        .map_or_else(|| output::warning("UNKNOWN", &config), |s| {
                            colorize_status(s, &config)
                        });
                    println!(
                        "{marker} {} [{status}] blocks {} directly, {} in total",
                        colorize_id(blocker.id.as_str(), &config),
                        blocker.directly_blocks.len(),
                        blocker.total_impact.len()
                    );
                }
            }
        }
        return Ok(());
    }

    let report = queries.path(&scope, args.estimates)?;
    match output_mode {
        OutputMode::Json => output::print_json(&report)?,
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            println!(
                "{} {}",
                bold("Critical path for", &config),
                &report.scope
            );
            print_details(&report.details, &config);
            if let Some(estimates) = &report.estimates {
                print_schedule(estimates, &config);
            }
            print_conflicts(&report.conflicts, &config);
        }
    }

    Ok(())
}

/// Execute the impact command
pub fn execute_impact(app: &App, args: &ImpactArgs, output_mode: OutputMode) -> Result<()> {
    let report = app
        .queries()
        .impact_analysis(&ItemId::new(&args.id), args.delay, args.remove)?;

    match output_mode {
        OutputMode::Json => output::print_json(&report)?,
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            println!(
                "{} {}",
                bold("Impact of", &config),
                colorize_id(report.id.as_str(), &config)
            );
            if report.on_critical_path {
                println!("  {}", output::error("On the critical path", &config));
            }
            print_id_line("Directly blocks:", &report.directly_blocks, ", ", &config);
            print_id_line("Total impact:", &report.total_impact, ", ", &config);

            if let Some(delay) = &report.delay {
                println!();
                println!(
                    "{} {} days",
                    bold("Delay by", &config),
                    delay.delay
                );
                println!(
                    "  Total effort {} -> {} ({:+} days)",
                    delay.previous_total_effort, delay.new_total_effort, delay.effort_delta
                );
                if delay.path_changed {
                    print_id_line("New critical path:", &delay.critical_path, " -> ", &config);
                }
                for shift in &delay.affected {
                    println!(
                        "  {} {} -> {} ({:+})",
                        colorize_id(shift.id.as_str(), &config),
                        shift.previous_completion,
                        shift.new_completion,
                        shift.shift_days
                    );
                }
            }

            if let Some(removal) = &report.removal {
                println!();
                println!("{}", bold("Without this item", &config));
                println!(
                    "  Total effort {} -> {} ({:+} days)",
                    removal.before.total_effort, removal.after.total_effort, removal.effort_delta
                );
                println!(
                    "  Completion {} -> {}",
                    removal.before.estimated_completion_date,
                    removal.after.estimated_completion_date
                );
                print_id_line("Critical path:", &removal.after.path, " -> ", &config);
                print_id_line("Unblocked:", &removal.new_roots, ", ", &config);
            }

            let flagged = report
                .delay
                .as_ref()
                .map(|delay| delay.flagged.as_slice())
                .or_else(|| report.removal.as_ref().map(|removal| removal.flagged.as_slice()));
            if let Some(flagged) = flagged {
                print_flagged(flagged, &config);
            }
        }
    }

    Ok(())
}

/// Execute the check-circular command
pub fn execute_check_circular(
    app: &App,
    args: &CheckCircularArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let report = app
        .queries()
        .check_circular(&args.scope.scope(), args.depth);

    match output_mode {
        OutputMode::Json => output::print_json(&report)?,
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            if report.has_cycles {
                println!(
                    "{} in {}",
                    output::error(&format!("Found {} cycle(s)", report.cycles.len()), &config),
                    &report.scope
                );
                for cycle in &report.cycles {
                    let mut path: Vec<String> = cycle
                        .path
                        .iter()
                        .map(|id| colorize_id(id.as_str(), &config))
                        .collect();
                    if let Some(first) = path.first().cloned() {
                        path.push(first);
                    }
                    println!("  {}", path.join(&dimmed(" -> ", &config)));
                }
            } else {
                println!(
                    "{} in {}",
                    output::success("No circular dependencies", &config),
                    &report.scope
                );
            }
            print_conflicts(&report.conflicts, &config);
        }
    }

    Ok(())
}

/// Execute the graph command
pub fn execute_graph(app: &App, args: &GraphArgs, output_mode: OutputMode) -> Result<()> {
    let nodes = app.queries().dependency_graph(&args.scope.scope());

    match output_mode {
        OutputMode::Json => output::print_json(&nodes)?,
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            if nodes.is_empty() {
                println!("{}", dimmed("(no blocking links)", &config));
            }
            for node in &nodes {
                if node.waits_on.is_empty() {
                    println!("{}", colorize_id(node.id.as_str(), &config));
                } else {
                    println!(
                        "{} {} {}",
                        colorize_id(node.id.as_str(), &config),
                        dimmed("waits on", &config),
                        join_ids(&node.waits_on, ", ", &config)
                    );
                }
            }
        }
    }

    Ok(())
}

fn join_ids(ids: &[ItemId], separator: &str, config: &OutputConfig) -> String {
    ids.iter()
        .map(|id| colorize_id(id.as_str(), config))
        .collect::<Vec<_>>()
        .join(separator)
}

fn print_id_line(label: &str, ids: &[ItemId], separator: &str, config: &OutputConfig) {
    let value = if ids.is_empty() {
        dimmed("(none)", config)
    } else {
        join_ids(ids, separator, config)
    };
    println!("  {} {value}", dimmed(label, config));
}

fn print_details(details: &CriticalPathDetails, config: &OutputConfig) {
    if details.path.is_empty() {
        println!("  {}", dimmed("(no blocking links)", config));
    } else {
        print_id_line("Path:", &details.path, " -> ", config);
    }
    println!(
        "  {} {} items, {} days",
        dimmed("Length:", config),
        details.path_length,
        details.total_effort
    );
    println!(
        "  {} {} to {}",
        dimmed("Schedule:", config),
        details.start_date,
        details.estimated_completion_date
    );

    if !details.bottlenecks.is_empty() {
        println!("  {}", dimmed("Bottlenecks:", config));
        for bottleneck in &details.bottlenecks {
            let marker = if bottleneck.on_critical_path {
                " (critical)"
            } else {
                ""
            };
            println!(
                "    {} gates {} items{marker}",
                colorize_id(bottleneck.id.as_str(), config),
                bottleneck.impact_count
            );
        }
    }

    print_flagged(&details.flagged, config);
}

fn print_flagged(flagged: &[FlaggedItem], config: &OutputConfig) {
    for item in flagged {
        println!(
            "  {} {}: {}",
            output::warning("Flagged", config),
            colorize_id(item.id.as_str(), config),
            item.flag
        );
    }
}

fn print_schedule(schedule: &[ScheduledItem], config: &OutputConfig) {
    println!("  {}", dimmed("Estimates:", config));
    for item in schedule {
        let title = item.title.as_deref().unwrap_or("");
        println!(
            "    {} {title} {} days, cumulative {}, done by {}",
            colorize_id(item.id.as_str(), config),
            item.effort,
            item.cumulative_effort,
            item.estimated_completion_date
        );
    }
}

fn print_conflicts(conflicts: &[ConflictWarning], config: &OutputConfig) {
    for conflict in conflicts {
        let reason = conflict
            .reason
            .as_deref()
            .map(|r| format!(" ({r})"))
            .unwrap_or_default();
        println!(
            "{} {} and {} are both in progress{reason}",
            output::warning("Conflict:", config),
            colorize_id(conflict.first.as_str(), config),
            colorize_id(conflict.second.as_str(), config)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Scope;

    #[test]
    fn test_join_ids_plain() {
        let config = OutputConfig::new(false);
        let ids = [ItemId::new("a"), ItemId::new("b")];
        assert_eq!(join_ids(&ids, " -> ", &config), "a -> b");
        assert_eq!(join_ids(&[], ", ", &config), "");
    }

    #[test]
    fn test_scope_label() {
        assert_eq!(Scope::Project.to_string(), "project");
        let release = Scope::release("R1", [ItemId::new("a")]);
        assert_eq!(release.to_string(), "release R1 (1 items)");
    }
}
