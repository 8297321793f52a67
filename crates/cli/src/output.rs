//! Rendering of sysio-testutil results
//!
//! Every command result is a set of records. Tables mark failed records
//! (a comparison that found a difference, a port already bound) in red so
//! they stand out in long test logs.

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use serde::Serialize;

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
    /// Plain `field: value` lines
    Plain,
}

/// A command result that renders as one table row
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;

    /// Whether this record reports a failed check
    fn failed(&self) -> bool {
        false
    }
}

fn render_table<T: TableDisplay>(records: &[&T]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(T::headers());
    for record in records {
        let failed = record.failed();
        table.add_row(record.row().into_iter().map(|value| {
            let cell = Cell::new(value);
            if failed {
                cell.fg(Color::Red)
            } else {
                cell
            }
        }));
    }
    table.to_string()
}

fn render_plain<T: TableDisplay>(records: &[&T]) -> String {
    let headers = T::headers();
    records
        .iter()
        .map(|record| {
            headers
                .iter()
                .zip(record.row())
                .map(|(header, value)| format!("{header}: {value}\n"))
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("---\n")
}

/// `document` is what JSON/YAML serialize; `records` feed the table and
/// plain renderings
fn render<T, D>(document: &D, records: &[&T], format: OutputFormat) -> String
where
    T: TableDisplay,
    D: Serialize + ?Sized,
{
    match format {
        OutputFormat::Table => format!("{}\n", render_table(records)),
        OutputFormat::Json => format!("{}\n", serde_json::to_string_pretty(document).unwrap_or_default()),
        OutputFormat::Yaml => serde_yaml::to_string(document).unwrap_or_default(),
        OutputFormat::Plain => render_plain(records),
    }
}

/// Print a single result record
pub fn print_item<T: Serialize + TableDisplay>(item: &T, format: OutputFormat) {
    print!("{}", render(item, &[item], format));
}

/// Print a list of result records
pub fn print_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) {
    if items.is_empty() {
        println!("No items found.");
        return;
    }
    let records: Vec<&T> = items.iter().collect();
    print!("{}", render(items, &records, format));
}

/// Print an arbitrary JSON document; tables fall back to pretty JSON
pub fn print_value(value: &serde_json::Value, format: OutputFormat) {
    match format {
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value).unwrap_or_default()),
        OutputFormat::Plain => println!("{}", value),
        OutputFormat::Table | OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value).unwrap_or_default())
        }
    }
}

pub fn print_message(message: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "message": message })),
        _ => println!("{}", message),
    }
}

pub fn print_error(message: &str) {
    eprintln!("❌ {}", message);
}
