//! Pipe table projection.

use super::inline::render_inline;

/// Cell separator.
pub(super) const CELL_SEPARATOR: char = '|';

/// Split a table row into trimmed cells, ignoring outer pipes.
fn cells(row: &str) -> Vec<&str> {
    let row = row.trim();
    let row = row.strip_prefix(CELL_SEPARATOR).unwrap_or(row);
    let row = row.strip_suffix(CELL_SEPARATOR).unwrap_or(row);
    row.split(CELL_SEPARATOR).map(str::trim).collect()
}

/// Whether every cell is an alignment marker like `---`, `:--` or `:-:`.
fn is_separator_row(cells: &[&str]) -> bool {
    cells.iter().all(|cell| {
        cell.contains('-') && cell.chars().all(|c| c == '-' || c == ':')
    })
}

/// Render buffered rows: the first is the header, separator rows are dropped.
pub(super) fn render_table(rows: &[&str]) -> String {
    let Some((header, body)) = rows.split_first() else {
        return String::new();
    };

    let mut out = String::from("<table>\n<thead>\n<tr>");
    for cell in cells(header) {
        out.push_str("<th>");
        out.push_str(&render_inline(cell));
        out.push_str("</th>");
    }
    out.push_str("</tr>\n</thead>\n<tbody>\n");

    for row in body {
        let cells = cells(row);
        if is_separator_row(&cells) {
            continue;
        }
        out.push_str("<tr>");
        for cell in cells {
            out.push_str("<td>");
            out.push_str(&render_inline(cell));
            out.push_str("</td>");
        }
        out.push_str("</tr>\n");
    }

    out.push_str("</tbody>\n</table>");
    out
}
