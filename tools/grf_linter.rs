/// Grammar Linter: checks a town-name project for problems before
/// compiling it.
///
/// Usage: grf_linter <project.ron>

use clap::Parser;
use grf_townnames::core::compiler::{self, weight_width, ENTROPY_BITS, MAX_ALTERNATIVES};
use grf_townnames::core::emit::entry_count;
use grf_townnames::core::grammar::Node;
use grf_townnames::core::project::Project;
use grf_townnames::core::registry::MAX_HANDLES;
use rustc_hash::FxHashSet;
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(name = "grf_linter", about = "Check a town-name project")]
struct Cli {
    /// Project file (RON).
    project: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let project = match Project::load_from_ron(&cli.project) {
        Ok(project) => project,
        Err(e) => {
            eprintln!("ERROR: Failed to load project: {}", e);
            process::exit(1);
        }
    };

    println!("Loaded {} nodes", project.nodes.len());

    let (errors, warnings) = lint_nodes(&project.nodes);

    println!("\n=== Town Name Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn lint_nodes(nodes: &[Node]) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if let Err(e) = compiler::verify_order(nodes) {
        errors.push(e.to_string());
    }

    if !nodes.iter().any(Node::has_display_names) {
        errors.push("No node has display names, so the game offers no style".to_string());
    }

    // Nodes nothing refers to and that are not styles are never used
    let referenced: FxHashSet<&str> = nodes.iter().flat_map(Node::references).collect();
    for node in nodes {
        if !node.has_display_names() && !referenced.contains(node.id.as_str()) {
            warnings.push(format!("Node '{}' is never referenced", node.id));
        }
    }

    for node in nodes {
        for (index, part) in node.parts.iter().enumerate() {
            let entries = entry_count(part);
            if entries > MAX_ALTERNATIVES {
                warnings.push(format!(
                    "Part {} of '{}' needs {} entries and will be split into {} nodes",
                    index,
                    node.id,
                    entries,
                    entries.div_ceil(MAX_ALTERNATIVES)
                ));
            }
            if part.len() == 1 && part.references().next().is_none() && node.parts.len() == 1 {
                warnings.push(format!("Node '{}' always produces the same text", node.id));
            }

            let width = weight_width(part.total_weight());
            if u32::from(node.entropy_start) + u32::from(width) > u32::from(ENTROPY_BITS) {
                errors.push(format!(
                    "Part {} of '{}' needs bits {}..{}, beyond the {}-bit draw",
                    index,
                    node.id,
                    node.entropy_start,
                    u32::from(node.entropy_start) + u32::from(width),
                    ENTROPY_BITS
                ));
            }
        }
    }

    // Full compile catches what the checks above do not, such as the
    // record limit after splitting.
    if errors.is_empty() {
        match compiler::compile(nodes).and_then(|compiled| compiled.emit()) {
            Ok(payload) => {
                if payload.records > MAX_HANDLES * 3 / 4 {
                    warnings.push(format!(
                        "{} of {} records used",
                        payload.records, MAX_HANDLES
                    ));
                }
            }
            Err(e) => errors.push(e.to_string()),
        }
    }

    (errors, warnings)
}
