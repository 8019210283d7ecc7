//! HTML renderings for browsing a trace.
//!
//! Column headers link to `./?s=<index>` so a small web front end can re-render
//! the table sorted by that column.

use super::tsv::sort_rows;
use super::{key_cell_text, ClassNames};
use crate::aggregator::{CountTable, LifetimeSnapshot};
use crate::tracer::TraceResult;

const PAGE_HEAD: &str = "<html><head><title>Allocation Tracer</title></head><body>\n";
const PAGE_TAIL: &str = "</body></html>\n";

/// Escape text for use inside HTML element content or attributes
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render the allocation table as an HTML page
///
/// **Public** - used by the replay command and embedding web front ends
///
/// # Arguments
/// * `result` - Trace result to render
/// * `sort_column` - Optional header index to sort by (see `sort_rows`)
/// * `names` - Class name lookup for `class` key cells
pub fn render_table_html(
    result: &TraceResult,
    sort_column: Option<usize>,
    names: &dyn ClassNames,
) -> String {
    let mut out = String::from(PAGE_HEAD);
    out.push_str("<table border='1'>\n<tr>");
    for (index, column) in result.header().iter().enumerate() {
        out.push_str(&format!("<th><a href='./?s={}'>{}</a></th>", index, column));
    }
    out.push_str("</tr>\n");

    for (key, stats) in sort_rows(result, sort_column) {
        out.push_str("<tr>");
        for value in key.values() {
            out.push_str(&format!(
                "<td>{}</td>",
                escape_html(&key_cell_text(value, names))
            ));
        }
        for n in stats.columns() {
            out.push_str(&format!("<td>{}</td>", n));
        }
        out.push_str("</tr>\n");
    }

    out.push_str("</table>\n");
    out.push_str(PAGE_TAIL);
    out
}

/// Render the lifetime histogram as an HTML page
pub fn render_lifetime_html(lifetime: &LifetimeSnapshot) -> String {
    let width = lifetime.values().map(Vec::len).max().unwrap_or(0);

    let mut out = String::from(PAGE_HEAD);
    out.push_str("<table border='1'>\n<tr><th>type</th>");
    for age in 0..width {
        out.push_str(&format!("<th>{}</th>", age));
    }
    out.push_str("</tr>\n");

    for (value_type, ages) in lifetime {
        out.push_str(&format!("<tr><td>{}</td>", value_type));
        for age in 0..width {
            out.push_str(&format!("<td>{}</td>", ages.get(age).copied().unwrap_or(0)));
        }
        out.push_str("</tr>\n");
    }

    out.push_str("</table>\n");
    out.push_str(PAGE_TAIL);
    out
}

/// Render allocated/freed counters as a preformatted page
pub fn render_counts_html(allocated: &CountTable, freed: &CountTable) -> String {
    let mut out = String::from(PAGE_HEAD);
    out.push_str("<pre>\n");
    out.push_str(&format!("{:<10} {:>12} {:>12}\n", "type", "allocated", "freed"));
    for (value_type, count) in allocated {
        let freed_count = freed.get(value_type).copied().unwrap_or(0);
        out.push_str(&format!(
            "{:<10} {:>12} {:>12}\n",
            value_type.name(),
            count,
            freed_count
        ));
    }
    out.push_str("</pre>\n");
    out.push_str(PAGE_TAIL);
    out
}
