use crate::config::{OutputFormat, Settings};
use crate::core::{self, Plan, Sequencer};
use crate::error::{Result, SeqError};
use crate::models::Instruction;
use serde::Serialize;
use serde_json::json;
use std::collections::HashSet;
use std::path::Path;

/// Handle the import command
pub fn handle_import(settings: &Settings, file: &Path) -> Result<()> {
    let sequencer = Sequencer::open(settings)?;
    let summary = sequencer.import_file(file)?;

    if settings.format == OutputFormat::Json {
        return print_json(&summary);
    }

    println!(
        "Imported {} records from {} into {}",
        summary.stored,
        summary.source,
        settings.db_path.display()
    );
    for issue in &summary.skipped {
        eprintln!("Warning: {issue}");
    }

    Ok(())
}

/// Handle the order command
pub fn handle_order(settings: &Settings, input: Option<&Path>) -> Result<()> {
    let plan = load_plan(settings, input)?;

    if settings.format == OutputFormat::Json {
        return print_json(&json!({
            "has_cycle": plan.has_cycle,
            "order": plan.order,
        }));
    }

    if plan.order.is_empty() {
        println!("No nodes found.");
        return Ok(());
    }

    let unresolved: HashSet<&str> = plan.unresolved.iter().map(String::as_str).collect();
    let width = plan.order.len().to_string().len();
    for (index, id) in plan.order.iter().enumerate() {
        let marker = if unresolved.contains(id.as_str()) { " *" } else { "" };
        match plan.graph.node(id).and_then(|n| n.title.as_deref()) {
            Some(title) => println!("{:>width$}. {id}  {title}{marker}", index + 1),
            None => println!("{:>width$}. {id}{marker}", index + 1),
        }
    }

    warn_cycle(&plan);
    Ok(())
}

/// Handle the sequence command
pub fn handle_sequence(settings: &Settings, input: Option<&Path>) -> Result<()> {
    let plan = load_plan(settings, input)?;

    if settings.format == OutputFormat::Json {
        return print_json(&json!({
            "has_cycle": plan.has_cycle,
            "instructions": plan.instructions,
        }));
    }

    for instruction in &plan.instructions {
        match instruction {
            Instruction::EmitNode { id } => {
                let label = plan.graph.node(id).map(|n| n.label()).unwrap_or(id);
                println!("node {id}  {label}");
            }
            Instruction::EmitEdge { id } => match plan.graph.edge(id) {
                Some(edge) => println!("  edge {id}  {} → {}", edge.source, edge.target),
                None => println!("  edge {id}"),
            },
        }
    }

    warn_cycle(&plan);
    Ok(())
}

/// Handle the check command
pub fn handle_check(settings: &Settings, input: Option<&Path>, strict: bool) -> Result<()> {
    let plan = load_plan(settings, input)?;

    if settings.format == OutputFormat::Json {
        print_json(&json!({
            "has_cycle": plan.has_cycle,
            "cycle": plan.cycle,
            "unresolved": plan.unresolved,
            "issues": plan.issues,
            "stats": plan.stats,
        }))?;
    } else {
        println!(
            "Nodes: {}  Edges: {}  Links: {}",
            plan.stats.nodes, plan.stats.edges, plan.stats.adjacency_pairs
        );

        match &plan.cycle {
            Some(cycle) => {
                println!("Cycle:  {}", cycle.format());
                println!("Unresolved: {}", plan.unresolved.join(", "));
            }
            None => println!("Cycle:  (none)"),
        }

        if plan.issues.is_empty() {
            println!("Issues: (none)");
        } else {
            println!("Issues:");
            for issue in &plan.issues {
                println!("  - {issue}");
            }
        }
    }

    if strict && (plan.has_cycle || !plan.issues.is_empty()) {
        return Err(SeqError::StrictCheckFailed {
            issues: plan.issues.len(),
            has_cycle: plan.has_cycle,
        });
    }

    Ok(())
}

/// Handle the status command
pub fn handle_status(settings: &Settings) -> Result<()> {
    let sequencer = Sequencer::open_existing(&settings.db_path)?;
    let info = sequencer.snapshot_info()?;

    if settings.format == OutputFormat::Json {
        return print_json(&info);
    }

    println!("Database: {}", settings.db_path.display());
    println!("Source:   {}", info.source.as_deref().unwrap_or("(unknown)"));
    match info.imported_at {
        Some(at) => println!("Imported: {}", at.format("%Y-%m-%d %H:%M")),
        None => println!("Imported: (unknown)"),
    }
    println!(
        "Records:  {} ({} nodes, {} edges)",
        info.records, info.nodes, info.edges
    );

    Ok(())
}

// Helper functions

fn load_plan(settings: &Settings, input: Option<&Path>) -> Result<Plan> {
    match input {
        Some(path) => core::plan_file(path),
        None => Sequencer::open_existing(&settings.db_path)?.load_plan(),
    }
}

fn warn_cycle(plan: &Plan) {
    if let Some(cycle) = &plan.cycle {
        eprintln!("Warning: graph contains a cycle: {}", cycle.format());
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
