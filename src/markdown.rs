// Markdown rendering for command output. Tables and headings are plain
// strings so they can be printed, piped or pasted into a document.

/// Render a heading. Levels 1 and 2 use setext underlines, deeper levels
/// use `#` prefixes.
pub fn heading(text: &str, level: usize) -> String {
    let mut out = String::new();
    if level < 3 {
        let underline = if level > 1 { "-" } else { "=" };
        out.push_str(text);
        out.push('\n');
        out.push_str(&underline.repeat(text.chars().count()));
    } else {
        out.push_str(&"#".repeat(level));
        out.push(' ');
        out.push_str(text);
    }
    out.push_str("\n\n");
    out
}

/// Render rows as a markdown table. The first row is the header.
pub fn table(rows: &[Vec<String>]) -> String {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for (row_index, row) in rows.iter().enumerate() {
        for (cell_index, cell) in row.iter().enumerate() {
            let mut len = cell.chars().count();
            if row_index == 0 {
                // room for the bold markers
                len += 4;
            }
            widths[cell_index] = widths[cell_index].max(len);
        }
    }

    let mut out = String::new();
    for (row_index, row) in rows.iter().enumerate() {
        out.push('|');
        for (cell_index, cell) in row.iter().enumerate() {
            let cell = if row_index == 0 {
                format!("**{cell}**")
            } else {
                cell.clone()
            };
            out.push_str(&format!("{cell:<width$}|", width = widths[cell_index]));
        }
        out.push('\n');
        if row_index == 0 {
            out.push('|');
            for width in widths.iter().take(row.len()) {
                out.push(':');
                out.push_str(&"-".repeat(width.saturating_sub(1)));
                out.push('|');
            }
            out.push('\n');
        }
    }
    out.push('\n');
    out
}
