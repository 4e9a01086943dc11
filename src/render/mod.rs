//! Tile rendering.
//!
//! Turns fetched [`TileData`] into an HTML fragment. All cell text is
//! escaped here; columns prefixed with `html:` carry trusted-ish rich text
//! and are passed through the sanitizer instead of being escaped.

use crate::registry::Tile;
use crate::sanitize::Sanitizer;
use crate::source::TileData;
use crate::config::TileKind;

/// Column-name prefix marking rich-text cells.
const HTML_COLUMN_PREFIX: &str = "html:";

/// Render a tile's data into an HTML fragment.
///
/// Row count is capped at the tile's `max_rows`. The fragment is wrapped in
/// a `<div class="tile">` with the tile ID so the dashboard page can swap
/// fragments in place.
pub fn render_tile(tile: &Tile, data: &TileData, sanitizer: &Sanitizer) -> String {
    let mut out = String::with_capacity(256 + data.rows.len() * 64);
    out.push_str(&format!(r#"<div class="tile" id="tile-{}">"#, tile.id));

    match tile.kind {
        TileKind::Table => render_table(&mut out, tile, data, sanitizer),
        TileKind::List => render_list(&mut out, tile, data, sanitizer),
    }

    out.push_str("</div>");
    out
}

fn render_table(out: &mut String, tile: &Tile, data: &TileData, sanitizer: &Sanitizer) {
    out.push_str("<table>");
    out.push_str(&format!("<caption>{}</caption>", escape(&tile.title)));

    out.push_str("<thead><tr>");
    for column in &data.columns {
        let label = column.strip_prefix(HTML_COLUMN_PREFIX).unwrap_or(column);
        out.push_str(&format!("<th>{}</th>", escape(label)));
    }
    out.push_str("</tr></thead>");

    out.push_str("<tbody>");
    for row in data.rows.iter().take(tile.max_rows) {
        out.push_str("<tr>");
        for (column, cell) in data.columns.iter().zip(row.iter()) {
            render_cell(out, column, cell, sanitizer);
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table>");

    if data.rows.len() > tile.max_rows {
        out.push_str(&format!(
            r#"<p class="truncated">{} of {} rows shown</p>"#,
            tile.max_rows,
            data.rows.len()
        ));
    }
}

fn render_list(out: &mut String, tile: &Tile, data: &TileData, sanitizer: &Sanitizer) {
    out.push_str(&format!("<h3>{}</h3>", escape(&tile.title)));
    out.push_str("<ul>");
    for row in data.rows.iter().take(tile.max_rows) {
        out.push_str("<li>");
        let mut first = true;
        for (column, cell) in data.columns.iter().zip(row.iter()) {
            if !first {
                out.push_str(" — ");
            }
            render_cell_inline(out, column, cell, sanitizer);
            first = false;
        }
        out.push_str("</li>");
    }
    out.push_str("</ul>");
}

fn render_cell(out: &mut String, column: &str, cell: &serde_json::Value, sanitizer: &Sanitizer) {
    let class = if cell.is_number() { r#" class="num""# } else { "" };
    out.push_str(&format!("<td{}>", class));
    render_cell_inline(out, column, cell, sanitizer);
    out.push_str("</td>");
}

fn render_cell_inline(
    out: &mut String,
    column: &str,
    cell: &serde_json::Value,
    sanitizer: &Sanitizer,
) {
    if column.starts_with(HTML_COLUMN_PREFIX) {
        let raw = match cell {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        out.push_str(&sanitizer.sanitize(&raw).html);
        return;
    }
    match cell {
        serde_json::Value::Null => out.push_str("&mdash;"),
        serde_json::Value::String(s) => out.push_str(&escape(s)),
        other => out.push_str(&escape(&other.to_string())),
    }
}

/// Minimal HTML escape for text produced by the renderer itself.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}
