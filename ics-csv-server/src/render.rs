use std::fmt::Write;

use ics_csv_parser::EventRecord;

const COLUMNS: [&str; 5] = ["#", "start", "end", "title", "detail"];

fn cells(idx: usize, event: &EventRecord) -> [String; 5] {
    [
        idx.to_string(),
        event.start.clone(),
        event.end.clone(),
        event.title.clone(),
        event.more.clone(),
    ]
}

/// Preview rows as an HTML table, numbered from 0.
pub fn html_table(rows: &[EventRecord]) -> String {
    let mut html = String::from("<table id=\"table_result\"><tr>");
    for column in COLUMNS {
        let _ = write!(html, "<th>{column}</th>");
    }
    html.push_str("</tr>");

    for (idx, event) in rows.iter().enumerate() {
        html.push_str("<tr>");
        for cell in cells(idx, event) {
            let _ = write!(html, "<td>{}</td>", escape_html(&cell));
        }
        html.push_str("</tr>");
    }

    html.push_str("</table>");
    html
}

/// Preview rows as a plain text table with padded columns.
pub fn text_table(rows: &[EventRecord]) -> String {
    let rows: Vec<[String; 5]> = rows
        .iter()
        .enumerate()
        .map(|(idx, event)| cells(idx, event))
        .collect();

    let mut widths = COLUMNS.map(|column| column.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut text = String::new();
    let header = COLUMNS.map(String::from);
    for row in std::iter::once(&header).chain(&rows) {
        let line = row
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join(" | ");
        text.push_str(line.trim_end());
        text.push('\n');
    }

    text
}

fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
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
