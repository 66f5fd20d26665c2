//! HTML table → pipe table.
//!
//! The first row becomes the header; cell interiors are recursively
//! converted so inline formatting survives; literal pipes inside cells are
//! escaped so they cannot break the column structure.

use scraper::{ElementRef, Selector};
use std::sync::LazyLock;

use super::walker::Renderer;

static ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("BUG: hardcoded CSS selector 'tr' is invalid"));

/// Convert a `<table>` element into a Markdown pipe table.
///
/// Returns an empty string for tables with no rows.
#[must_use]
pub fn convert_table(table: ElementRef<'_>, renderer: &Renderer) -> String {
    let rows: Vec<Vec<String>> = table
        .select(&ROW_SELECTOR)
        .filter(|row| {
            // select() is recursive; keep only rows belonging to this table,
            // not to a table nested inside a cell.
            row.ancestors()
                .filter_map(ElementRef::wrap)
                .find(|el| el.value().name() == "table")
                .is_some_and(|owner| owner.id() == table.id())
        })
        .map(|row| {
            row.children()
                .filter_map(ElementRef::wrap)
                .filter(|cell| matches!(cell.value().name(), "td" | "th"))
                .map(|cell| render_cell(cell, renderer))
                .collect::<Vec<String>>()
        })
        .filter(|cells| !cells.is_empty())
        .collect();

    if rows.is_empty() {
        return String::new();
    }

    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut out = String::new();

    for (i, row) in rows.iter().enumerate() {
        out.push('|');
        for col in 0..columns {
            out.push(' ');
            out.push_str(row.get(col).map_or("", String::as_str));
            out.push_str(" |");
        }
        out.push('\n');

        if i == 0 {
            out.push('|');
            for _ in 0..columns {
                out.push_str(" --- |");
            }
            out.push('\n');
        }
    }

    out
}

/// Recursively convert a cell's inner HTML, then flatten to a single line
/// and escape pipes.
fn render_cell(cell: ElementRef<'_>, renderer: &Renderer) -> String {
    let markdown = renderer.render_fragment(*cell);
    markdown
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', r"\|")
}
