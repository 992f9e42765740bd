use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::Deserialize;
use tabula::{CellValue, Column, DataType, Grid, Row, RowKey};

/// Embedded sample dataset: people and job titles.
pub const SAMPLE: &str = r#"{
  "key": "ID",
  "columns": [
    { "id": "ID", "kind": "number" },
    { "id": "Name" },
    { "id": "JobTitle", "header": "Job Title" },
    { "id": "HireDate", "header": "Hire Date", "kind": "date" }
  ],
  "rows": [
    { "ID": 1, "Name": "Casey Houston", "JobTitle": "Vice President", "HireDate": "2017-06-19" },
    { "ID": 2, "Name": "Gilberto Todd", "JobTitle": "Director", "HireDate": "2015-12-18" },
    { "ID": 3, "Name": "Tanya Bennett", "JobTitle": "Director", "HireDate": "2005-11-18" },
    { "ID": 4, "Name": "Jack Simon", "JobTitle": "Software Developer", "HireDate": "2008-12-18" },
    { "ID": 5, "Name": "Celia Martinez", "JobTitle": "Senior Software Developer", "HireDate": "2007-12-19" },
    { "ID": 6, "Name": "Erma Walsh", "JobTitle": "CEO", "HireDate": "2016-12-18" },
    { "ID": 7, "Name": "Debra Morton", "JobTitle": "Associate Software Developer", "HireDate": "2005-11-19" },
    { "ID": 8, "Name": "Erika Wells", "JobTitle": "Software Development Team Lead", "HireDate": "2005-10-14" },
    { "ID": 9, "Name": "Leslie Hansen", "JobTitle": "Associate Software Developer", "HireDate": "2013-10-10" },
    { "ID": 10, "Name": "Eduardo Ramirez", "JobTitle": "Manager", "HireDate": "2011-11-28" }
  ]
}"#;

#[derive(Debug, Deserialize)]
pub struct DatasetSpec {
    /// Column whose value is each row's stable key.
    pub key: String,
    pub columns: Vec<ColumnSpec>,
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
pub struct ColumnSpec {
    pub id: String,
    #[serde(default)]
    pub header: Option<String>,
    /// "text" (default), "number", "date" or "bool".
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub searchable: Option<bool>,
    #[serde(default)]
    pub template: Option<String>,
}

pub fn build_grid(json: &str) -> Result<Grid> {
    let spec: DatasetSpec = serde_json::from_str(json).context("parsing dataset")?;

    let mut columns = Vec::new();
    for column_spec in &spec.columns {
        let header = column_spec
            .header
            .clone()
            .unwrap_or_else(|| column_spec.id.clone());
        let mut column =
            Column::new(&column_spec.id, header).with_type(parse_kind(column_spec.kind.as_deref())?);
        if column_spec.searchable == Some(false) {
            column = column.not_searchable();
        }
        if let Some(template) = &column_spec.template {
            column = column.with_template(template);
        }
        columns.push(column);
    }

    let mut rows = Vec::new();
    for (index, fields) in spec.rows.iter().enumerate() {
        let key_value = fields
            .get(&spec.key)
            .with_context(|| format!("row {index} is missing key column {:?}", spec.key))?;
        let mut row = Row::new(parse_key(key_value)?);

        for column_spec in &spec.columns {
            let Some(value) = fields.get(&column_spec.id) else {
                continue;
            };
            row.set_cell(
                &column_spec.id,
                parse_value(value, column_spec.kind.as_deref())
                    .with_context(|| format!("row {index}, column {:?}", column_spec.id))?,
            );
        }
        rows.push(row);
    }

    Ok(Grid::new(columns).with_rows(rows))
}

fn parse_kind(kind: Option<&str>) -> Result<DataType> {
    match kind.unwrap_or("text") {
        "text" => Ok(DataType::Text),
        "number" => Ok(DataType::Number),
        "date" => Ok(DataType::Date),
        "bool" => Ok(DataType::Bool),
        other => bail!("unknown column kind {other:?}"),
    }
}

fn parse_key(value: &serde_json::Value) -> Result<RowKey> {
    match value {
        serde_json::Value::Number(number) => number
            .as_i64()
            .map(RowKey::Int)
            .context("row key must be an integer or a string"),
        serde_json::Value::String(text) => Ok(RowKey::Text(text.clone())),
        other => bail!("unsupported row key {other}"),
    }
}

fn parse_value(value: &serde_json::Value, kind: Option<&str>) -> Result<CellValue> {
    match value {
        serde_json::Value::Null => Ok(CellValue::Null),
        serde_json::Value::Bool(flag) => Ok(CellValue::Bool(*flag)),
        serde_json::Value::Number(number) => number
            .as_f64()
            .map(CellValue::Number)
            .context("number out of range"),
        serde_json::Value::String(text) => {
            if kind == Some("date") {
                let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .with_context(|| format!("invalid date {text:?}"))?;
                Ok(CellValue::Date(date))
            } else {
                Ok(CellValue::Text(text.clone()))
            }
        }
        other => bail!("unsupported cell value {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_dataset_builds_and_searches() {
        let mut grid = build_grid(SAMPLE).unwrap();
        assert_eq!(grid.row_count(), 10);
        assert_eq!(grid.find_next("director", false, false), 2);
        assert!(grid.is_active_match(&RowKey::Int(2), "JobTitle", 0));
    }

    #[test]
    fn dates_parse_into_date_cells() {
        let grid = build_grid(SAMPLE).unwrap();
        assert_eq!(
            grid.cell_text(&RowKey::Int(2), "HireDate").unwrap(),
            "Dec 18, 2015"
        );
    }

    #[test]
    fn missing_key_column_is_an_error() {
        let json = r#"{ "key": "ID", "columns": [{ "id": "Name" }], "rows": [{ "Name": "x" }] }"#;
        assert!(build_grid(json).is_err());
    }

    #[test]
    fn unknown_column_kind_is_an_error() {
        let json = r#"{ "key": "ID", "columns": [{ "id": "ID", "kind": "uuid" }], "rows": [] }"#;
        assert!(build_grid(json).is_err());
    }
}
