//! Output formatting helpers for human-readable and JSON output.

use orderable::order::OrderedItem;
use serde::Serialize;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Print any serializable value as a single JSON line.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

/// Print a table with aligned columns in human-readable format.
///
/// `headers` and each row in `rows` must have the same length.
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        return;
    }

    // Calculate column widths (max of header and all row values)
    let col_count = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(col_count) {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let header_line: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:<width$}", h, width = widths[i]))
        .collect();
    println!("{}", header_line.join("  ").trim_end());

    for row in rows {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .take(col_count)
            .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
            .collect();
        println!("{}", line.join("  ").trim_end());
    }
}

/// Column headers matching [`item_row`].
pub const ITEM_HEADERS: [&str; 5] = ["#", "GROUP", "VALUE", "ID", "TITLE"];

/// One table row for a listed item.
pub fn item_row(position: usize, item: &OrderedItem) -> Vec<String> {
    vec![
        position.to_string(),
        item.group
            .as_ref()
            .map_or_else(|| "-".to_string(), ToString::to_string),
        item.value.to_string(),
        item.id().to_string(),
        item.record.str_field("title").unwrap_or_default().to_string(),
    ]
}

/// Print listed items in the chosen format.
pub fn print_items(items: &[OrderedItem], format: OutputFormat) -> Result<(), serde_json::Error> {
    match format {
        OutputFormat::Human => {
            if items.is_empty() {
                println!("No records found.");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = items
                .iter()
                .enumerate()
                .map(|(i, item)| item_row(i, item))
                .collect();
            print_table(&ITEM_HEADERS, &rows);
            Ok(())
        }
        OutputFormat::Json => print_json(items),
    }
}
