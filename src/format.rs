use crate::column::Column;
use crate::row::CellValue;

/// Default date rendering, matching the grid's on-screen formatting.
const DEFAULT_DATE_FORMAT: &str = "%b %-d, %Y";

/// Display text for one cell, exactly as the rendering layer paints it.
///
/// Search operates on this text, not on raw values: a formatter's output wins
/// over type-based formatting, and a templated column has no plain-text
/// projection at all (`None`), so its cells never match. Null values also
/// resolve to `None`.
pub fn display_text(column: &Column, value: &CellValue) -> Option<String> {
    if column.template.is_some() {
        return None;
    }
    if let Some(formatter) = &column.formatter {
        return Some(formatter(value));
    }

    match value {
        CellValue::Null => None,
        CellValue::Bool(value) => Some(value.to_string()),
        CellValue::Number(value) => Some(format_number(*value, column.decimals)),
        CellValue::Text(value) => Some(value.clone()),
        CellValue::Date(value) => {
            let format = column.date_format.as_deref().unwrap_or(DEFAULT_DATE_FORMAT);
            Some(value.format(format).to_string())
        }
    }
}

fn format_number(value: f64, decimals: Option<usize>) -> String {
    match decimals {
        Some(digits) => format!("{value:.digits$}"),
        None => {
            if value.fract() == 0.0 && value.abs() < 1e15 {
                format!("{}", value as i64)
            } else {
                format!("{value}")
            }
        }
    }
}
