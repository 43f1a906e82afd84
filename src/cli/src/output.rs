//! Terminal output for the `innsight` CLI.
//!
//! Tables and detail lines for people, JSON or YAML for scripts. Gate and
//! permission decisions print as a single tagged line.

use anyhow::Result;
use clap::ValueEnum;
use colored::*;
use serde::Serialize;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Render as a formatted table
    #[default]
    Table,
    /// Render as JSON
    Json,
    /// Render as YAML
    Yaml,
}

pub fn print_success(msg: &str) {
    println!("{} {}", "[OK]".green().bold(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), msg);
}

pub fn print_warning(msg: &str) {
    eprintln!("{} {}", "[WARN]".yellow().bold(), msg);
}

pub fn print_info(msg: &str) {
    println!("{} {}", "[INFO]".blue().bold(), msg);
}

/// One line for an allow/deny decision. Denials go to stdout too, since they
/// are the command's answer rather than a failure.
pub fn print_decision(allowed: bool, msg: &str) {
    let tag = if allowed {
        "[ALLOW]".green().bold()
    } else {
        "[DENY]".red().bold()
    };
    println!("{} {}", tag, msg);
}

pub fn print_detail(key: &str, value: &str) {
    println!("  {}: {}", key.cyan(), value);
}

pub fn print_header(title: &str) {
    println!();
    println!("{}", title.bold().underline());
    println!();
}

/// `values` joined with commas, or `empty` when there are none.
pub fn joined_or<S: AsRef<str>>(values: &[S], empty: &str) -> String {
    if values.is_empty() {
        return empty.to_string();
    }
    values
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn render_list<T: Tabled + Serialize>(items: &[T], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table if items.is_empty() => Ok(format!("{}\n", "No rows.".dimmed())),
        OutputFormat::Table => {
            let table = Table::new(items)
                .with(Style::rounded())
                .with(Modify::new(Columns::first()).with(Alignment::left()))
                .to_string();
            Ok(format!("{}\n", table))
        }
        _ => render_item(items, format),
    }
}

/// Structured items have no table form; table output falls back to JSON.
pub fn render_item<T: Serialize + ?Sized>(item: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table | OutputFormat::Json => {
            Ok(format!("{}\n", serde_json::to_string_pretty(item)?))
        }
        OutputFormat::Yaml => Ok(serde_yaml::to_string(item)?),
    }
}

pub fn print_list<T: Tabled + Serialize>(items: &[T], format: OutputFormat) -> Result<()> {
    print!("{}", render_list(items, format)?);
    Ok(())
}

pub fn print_item<T: Serialize + ?Sized>(item: &T, format: OutputFormat) -> Result<()> {
    print!("{}", render_item(item, format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Tabled, Serialize)]
    struct Row {
        role: &'static str,
        satisfies: &'static str,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row {
                role: "admin",
                satisfies: "admin, analyst, viewer",
            },
            Row {
                role: "viewer",
                satisfies: "viewer",
            },
        ]
    }

    #[test]
    fn test_joined_or() {
        assert_eq!(joined_or::<&str>(&[], "(public)"), "(public)");
        assert_eq!(joined_or(&["admin", "analyst"], "(public)"), "admin, analyst");
    }

    #[test]
    fn test_render_list_table() {
        let out = render_list(&rows(), OutputFormat::Table).unwrap();
        assert!(out.contains("admin, analyst, viewer"));
        assert!(out.contains("satisfies"));
        assert!(render_list::<Row>(&[], OutputFormat::Table).unwrap().contains("No rows."));
    }

    #[test]
    fn test_render_list_structured() {
        let json: serde_json::Value =
            serde_json::from_str(&render_list(&rows(), OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json[1]["role"], "viewer");

        let yaml = render_list(&rows(), OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("- role: admin"));
    }

    #[test]
    fn test_render_item_table_falls_back_to_json() {
        let item = serde_json::json!({ "outcome": "redirect_login" });
        assert_eq!(
            render_item(&item, OutputFormat::Table).unwrap(),
            render_item(&item, OutputFormat::Json).unwrap()
        );
    }
}
