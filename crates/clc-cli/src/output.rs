//! Tree, table and JSON output formatting for CLI commands.

use std::fmt::Write as _;

use serde::Serialize;
use tabled::{Table, Tabled};

use clc_entity::group::ReassembledNode;

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tree or table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// Print a list of items in the selected format
pub fn print_list<T: Serialize + Tabled>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("No results found.");
            } else {
                let table = Table::new(items).to_string();
                println!("{}", table);
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string());
            println!("{}", json);
        }
    }
}

/// Print a single item as pretty JSON
pub fn print_json<T: Serialize>(item: &T) {
    let json = serde_json::to_string_pretty(item).unwrap_or_else(|_| "{}".to_string());
    println!("{}", json);
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("✓ {}", msg);
}

/// Render a group tree with box-drawing connectors.
///
/// Special groups carry their type in brackets; server counts follow the
/// name when non-zero.
pub fn render_tree(root: &ReassembledNode) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", label(root));
    render_children(root, "", &mut out);
    out
}

fn render_children(node: &ReassembledNode, prefix: &str, out: &mut String) {
    let last = node.children.len().saturating_sub(1);
    for (i, child) in node.children.iter().enumerate() {
        let (branch, indent) = if i == last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        let _ = writeln!(out, "{prefix}{branch}{}", label(child));
        render_children(child, &format!("{prefix}{indent}"), out);
    }
}

fn label(node: &ReassembledNode) -> String {
    let mut label = node.name.clone();
    if node.group_type.is_special() {
        let _ = write!(label, " [{}]", node.group_type);
    }
    match node.server_ids.len() {
        0 => {}
        1 => label.push_str(" (1 server)"),
        n => {
            let _ = write!(label, " ({n} servers)");
        }
    }
    label
}
