use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::task;

use super::{Arguments, ParamKind, ReturnKind, Tool, ToolDescriptor};

/// Rows shown when a table is rendered for the model.
const PREVIEW_ROWS: usize = 10;

/// Inferred kind of a column's values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Integer,
    Number,
    Boolean,
    Text,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColumnKind::Integer => "integer",
            ColumnKind::Number => "number",
            ColumnKind::Boolean => "boolean",
            ColumnKind::Text => "text",
        };
        f.write_str(s)
    }
}

/// In-memory tabular data loaded from a delimited file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Values of the named column, in row order
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| row[index].as_str()).collect())
    }

    /// Narrowest kind every non-empty cell of each column fits into.
    pub fn column_kinds(&self) -> Vec<ColumnKind> {
        (0..self.columns.len())
            .map(|i| infer_kind(self.rows.iter().map(|row| row[i].as_str())))
            .collect()
    }

    /// Text summary with column kinds and the first rows.
    pub fn render_preview(&self) -> String {
        self.render_rows(PREVIEW_ROWS)
    }

    /// Like [`Table::render_preview`], showing at most `limit` rows.
    pub fn render_rows(&self, limit: usize) -> String {
        let mut out = format!(
            "{} rows x {} columns\ncolumns: ",
            self.rows.len(),
            self.columns.len()
        );
        let columns: Vec<String> = self
            .columns
            .iter()
            .zip(self.column_kinds())
            .map(|(name, kind)| format!("{} ({})", name, kind))
            .collect();
        out.push_str(&columns.join(", "));

        out.push_str(&format!("\n{}", self.columns.join(",")));
        for row in self.rows.iter().take(limit) {
            out.push_str(&format!("\n{}", row.join(",")));
        }
        if self.rows.len() > limit {
            out.push_str(&format!("\n... ({} more rows)", self.rows.len() - limit));
        }
        out
    }
}

fn infer_kind<'a>(values: impl Iterator<Item = &'a str>) -> ColumnKind {
    let (mut seen, mut all_int, mut all_num, mut all_bool) = (false, true, true, true);

    for value in values.map(str::trim).filter(|v| !v.is_empty()) {
        seen = true;
        all_int &= value.parse::<i64>().is_ok();
        all_num &= value.parse::<f64>().is_ok();
        all_bool &= value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false");
    }

    match (seen, all_int, all_num, all_bool) {
        (false, ..) => ColumnKind::Text,
        (true, true, _, _) => ColumnKind::Integer,
        (true, false, true, _) => ColumnKind::Number,
        (true, false, false, true) => ColumnKind::Boolean,
        _ => ColumnKind::Text,
    }
}

/// Parse a CSV file with a header row.
///
/// Rows with a different number of fields than the header are an error.
pub async fn load_tabular(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref().to_path_buf();

    task::spawn_blocking(move || {
        let mut reader = csv::Reader::from_path(&path)
            .with_context(|| format!("failed to open csv file: {}", path.display()))?;

        let columns = reader
            .headers()
            .with_context(|| format!("failed to read csv header: {}", path.display()))?
            .iter()
            .map(str::to_string)
            .collect();

        let rows = reader
            .records()
            .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
            .collect::<Result<Vec<Vec<String>>, _>>()
            .with_context(|| format!("malformed csv data in {}", path.display()))?;

        Ok(Table { columns, rows })
    })
    .await
    .context("spawn_blocking failed")?
}

/// Tool for loading a CSV file
pub struct LoadCsvTool {
    descriptor: ToolDescriptor,
}

impl LoadCsvTool {
    pub fn new() -> Self {
        Self {
            descriptor: ToolDescriptor::new(
                "load_csv_from_path",
                "Look at the path and load csv data from path. The first line must be a header.",
            )
            .param("path", ParamKind::String, "Path to csv file")
            .optional_param(
                "max_rows",
                ParamKind::Integer,
                "How many rows to show (default 10)",
            )
            .returns(
                ReturnKind::Table,
                "Row and column counts, inferred column types and the first rows of the table.",
            ),
        }
    }
}

impl Default for LoadCsvTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for LoadCsvTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn execute(&self, args: &Arguments) -> Result<Value> {
        let limit = match args.get("max_rows") {
            Some(_) => {
                let n = args.int("max_rows")?;
                usize::try_from(n)
                    .map_err(|_| anyhow::anyhow!("max_rows must not be negative, got {}", n))?
            }
            None => PREVIEW_ROWS,
        };
        let table = load_tabular(args.str("path")?).await?;
        Ok(Value::String(table.render_rows(limit)))
    }
}
