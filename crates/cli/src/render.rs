use tabula::{DisplaySlot, Grid, RowKey};

/// Renders the current page as plain text. Matches are wrapped in brackets,
/// the active match in guillemets: `[Dir]ector` vs `«Dir»ector`.
pub fn render_grid(grid: &Grid) -> String {
    let columns = grid.visible_columns();
    let mut out = String::new();

    let headers: Vec<&str> = columns.iter().map(|c| c.header.as_str()).collect();
    out.push_str(&headers.join(" | "));
    out.push('\n');

    for slot in grid.display_slots() {
        match slot {
            DisplaySlot::GroupHeader {
                value,
                row_count,
                collapsed,
            } => {
                let marker = if *collapsed { '+' } else { '-' };
                out.push_str(&format!("{marker} {value} ({row_count})\n"));
            }
            DisplaySlot::Data(key) => {
                let cells: Vec<String> = columns
                    .iter()
                    .map(|column| {
                        let text = grid.cell_text(key, &column.id).unwrap_or_default();
                        decorate(grid, key, &column.id, &text)
                    })
                    .collect();
                out.push_str(&cells.join(" | "));
                out.push('\n');
            }
        }
    }
    out
}

fn decorate(grid: &Grid, key: &RowKey, column_id: &str, text: &str) -> String {
    let spans = grid.match_spans(key, column_id);
    if spans.is_empty() {
        return text.to_string();
    }

    let mut decorated = String::with_capacity(text.len() + spans.len() * 4);
    let mut cursor = 0;
    for span in spans {
        let end = span.start + span.len;
        decorated.push_str(&text[cursor..span.start]);
        let (open, close) = if grid.is_active_match(key, column_id, span.start) {
            ('\u{ab}', '\u{bb}')
        } else {
            ('[', ']')
        };
        decorated.push(open);
        decorated.push_str(&text[span.start..end]);
        decorated.push(close);
        cursor = end;
    }
    decorated.push_str(&text[cursor..]);
    decorated
}
