//! List command handler

use crate::commands::ListArgs;
use crate::config::CliConfig;
use crate::error::CliResult;
use crate::handlers::Project;
use webspec::{Node, Registry};

/// Render the registry as an indented tree with `[only]` / `[skip]` markers
#[must_use]
pub fn render_registry(registry: &Registry) -> String {
    let mut out = String::new();
    for node in registry.nodes() {
        render_node(node, 0, &mut out);
    }
    out
}

fn markers(exclusive: bool, skipped: bool) -> &'static str {
    match (exclusive, skipped) {
        (true, true) => " [only] [skip]",
        (true, false) => " [only]",
        (false, true) => " [skip]",
        (false, false) => "",
    }
}

fn render_node(node: &Node, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    match node {
        Node::Group(group) => {
            out.push_str(&format!(
                "{indent}{}{}\n",
                group.name,
                markers(group.exclusive, group.skipped)
            ));
            for child in &group.children {
                render_node(child, depth + 1, out);
            }
        }
        Node::Case(case) => {
            out.push_str(&format!(
                "{indent}- {}{} ({} steps)\n",
                case.name,
                markers(case.exclusive, case.skipped),
                case.body.len()
            ));
        }
    }
}

/// Execute the list command
pub fn execute_list(config: &CliConfig, args: &ListArgs) -> CliResult<()> {
    let project = Project::load(&args.config, args.spec.as_deref())?;
    if config.verbosity.is_verbose() {
        for file in &project.files {
            println!("# {}", file.display());
        }
    }
    print!("{}", render_registry(&project.registry));
    println!(
        "{} cases in {} files",
        project.registry.len(),
        project.files.len()
    );
    Ok(())
}
