//! Table rendering utilities for CLI outputs.

use crate::db::dataset::DataTable;
use crate::db::value::DbValue;
use crate::utils::colors::{GREY, RESET};
use unicode_width::UnicodeWidthStr;

/// Widest cell allowed before text gets cut.
const MAX_CELL_WIDTH: usize = 40;

/// Renders `table` as aligned text: header, separator, one line per row.
/// NULL cells are shown as grey `NULL` when `color` is set.
pub fn render(table: &DataTable, separator: char, color: bool) -> String {
    let cells: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.values().iter().map(cell_text).collect())
        .collect();

    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, col)| {
            cells
                .iter()
                .filter_map(|r| r.get(i))
                .map(|c| c.width())
                .chain(std::iter::once(col.name.width()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();

    // Header
    for (col, width) in table.columns.iter().zip(&widths) {
        push_padded(&mut out, &col.name, *width);
    }
    trim_line(&mut out);

    let total: usize = widths.iter().map(|w| w + 1).sum();
    out.extend(std::iter::repeat_n(separator, total.saturating_sub(1)));
    out.push('\n');

    // Rows
    for (row, texts) in table.rows.iter().zip(&cells) {
        for ((value, text), width) in row.values().iter().zip(texts).zip(&widths) {
            if color && value.is_null() {
                out.push_str(GREY);
                push_padded(&mut out, text, *width);
                out.push_str(RESET);
            } else {
                push_padded(&mut out, text, *width);
            }
        }
        trim_line(&mut out);
    }

    out
}

fn cell_text(value: &DbValue) -> String {
    let text = value.to_string().replace(['\n', '\r', '\t'], " ");
    if text.width() <= MAX_CELL_WIDTH {
        return text;
    }
    let mut cut = String::new();
    for ch in text.chars() {
        if cut.width() + 1 >= MAX_CELL_WIDTH {
            break;
        }
        cut.push(ch);
    }
    cut.push('…');
    cut
}

fn push_padded(out: &mut String, text: &str, width: usize) {
    out.push_str(text);
    out.extend(std::iter::repeat_n(' ', width.saturating_sub(text.width()) + 1));
}

fn trim_line(out: &mut String) {
    while out.ends_with(' ') {
        out.pop();
    }
    out.push('\n');
}
