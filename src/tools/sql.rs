use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{Connection, OpenFlags};
use rusqlite::types::ValueRef;
use serde_json::Value;
use tokio::task;
use tracing::debug;

use super::{Arguments, ParamKind, ReturnKind, Tool, ToolDescriptor};
use crate::error::ConfigError;

/// Handle to the SQLite database the query tools run against.
///
/// Holds only the location; every call opens its own connection and drops it
/// before returning, on success and on failure alike.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Parse a connection string: `sqlite://<path>`, `sqlite:<path>` or a bare path.
    pub fn from_url(url: &str) -> Result<Self, ConfigError> {
        let path = if let Some(rest) = url.strip_prefix("sqlite://") {
            rest
        } else if let Some(rest) = url.strip_prefix("sqlite:") {
            rest
        } else if url.contains("://") {
            return Err(ConfigError::UnsupportedDatabase(url.to_string()));
        } else {
            url
        };

        if path.is_empty() {
            return Err(ConfigError::UnsupportedDatabase(url.to_string()));
        }
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open an existing database; a missing file is an error, never created.
    fn connect(path: &Path) -> Result<Connection> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        Connection::open_with_flags(path, flags)
            .with_context(|| format!("failed to open database: {}", path.display()))
    }

    /// Column names and declared types of `table`, one `name: type` per line.
    ///
    /// A table that does not exist yields an empty string.
    pub async fn describe_columns(&self, table: &str) -> Result<String> {
        let table = table.to_string();
        let db_path = self.path.clone();

        task::spawn_blocking(move || {
            let conn = Self::connect(&db_path)?;
            let mut stmt =
                conn.prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;

            let columns = stmt
                .query_map([&table], |row| {
                    let name: String = row.get(0)?;
                    let declared: String = row.get(1)?;
                    Ok(format!("{}: {}", name, declared))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            debug!(table = %table, columns = columns.len(), "described table");
            Ok(columns.join("\n"))
        })
        .await
        .context("spawn_blocking failed")?
    }

    /// Execute the single statement in `query` and render its result.
    ///
    /// Row-returning statements yield one tuple per line; anything else yields
    /// the number of affected rows. Text holding more than one statement is
    /// rejected before anything runs.
    pub async fn run_query(&self, query: &str) -> Result<String> {
        let statements = count_statements(query);
        if statements > 1 {
            anyhow::bail!(
                "only one SQL statement per call is supported, got {}",
                statements
            );
        }

        let query = query.to_string();
        let db_path = self.path.clone();

        task::spawn_blocking(move || {
            let conn = Self::connect(&db_path)?;
            let mut stmt = conn
                .prepare(&query)
                .with_context(|| format!("invalid query: {}", query))?;

            if stmt.column_count() == 0 {
                let changed = stmt.execute([])?;
                debug!(changed, "executed statement");
                return Ok(format!("{} row(s) affected", changed));
            }

            let width = stmt.column_count();
            let mut rows = stmt.query([])?;
            let mut lines = Vec::new();
            while let Some(row) = rows.next()? {
                let cells = (0..width)
                    .map(|i| row.get_ref(i).map(render_cell))
                    .collect::<Result<Vec<_>, _>>()?;
                lines.push(render_row(&cells));
            }

            debug!(rows = lines.len(), "executed query");
            Ok(lines.join("\n"))
        })
        .await
        .context("spawn_blocking failed")?
    }
}

fn render_cell(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "None".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => format!("{:?}", f),
        ValueRef::Text(bytes) => {
            let text = String::from_utf8_lossy(bytes);
            format!("'{}'", text.replace('\\', "\\\\").replace('\'', "\\'"))
        }
        ValueRef::Blob(bytes) => format!("<blob {} bytes>", bytes.len()),
    }
}

/// Number of non-empty statements in `sql`, splitting on `;` outside quotes
/// and comments.
fn count_statements(sql: &str) -> usize {
    let mut count = 0;
    let mut has_content = false;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' | '`' | '[' => {
                let close = if c == '[' { ']' } else { c };
                has_content = true;
                for next in chars.by_ref() {
                    if next == close {
                        break;
                    }
                }
            }
            '-' if chars.peek() == Some(&'-') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            ';' => {
                if has_content {
                    count += 1;
                }
                has_content = false;
            }
            c if c.is_whitespace() => {}
            _ => has_content = true,
        }
    }

    if has_content {
        count += 1;
    }
    count
}

fn render_row(cells: &[String]) -> String {
    if cells.len() == 1 {
        format!("({},)", cells[0])
    } else {
        format!("({})", cells.join(", "))
    }
}

/// Tool for running SQL queries
pub struct SqlEngineTool {
    database: Arc<Database>,
    descriptor: ToolDescriptor,
}

impl SqlEngineTool {
    pub fn new(database: Arc<Database>) -> Self {
        Self {
            database,
            descriptor: ToolDescriptor::new(
                "sql_engine",
                "Allows you to perform SQL queries on the database. Returns a string \
                 representation of the result, one row per line. Use get_database_column_info \
                 to look up the columns of a table before querying it.",
            )
            .param(
                "query",
                ParamKind::String,
                "The query to perform. This should be correct SQL, one statement per call.",
            )
            .returns(
                ReturnKind::Text,
                "One tuple per result row, or the number of affected rows.",
            ),
        }
    }
}

#[async_trait]
impl Tool for SqlEngineTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn execute(&self, args: &Arguments) -> Result<Value> {
        let output = self.database.run_query(args.str("query")?).await?;
        Ok(Value::String(output))
    }
}

/// Tool for looking up the columns of a table
pub struct ColumnInfoTool {
    database: Arc<Database>,
    descriptor: ToolDescriptor,
}

impl ColumnInfoTool {
    pub fn new(database: Arc<Database>) -> Self {
        Self {
            database,
            descriptor: ToolDescriptor::new(
                "get_database_column_info",
                "Get the column information of a table in the database.",
            )
            .param("table_name", ParamKind::String, "Name of the table")
            .returns(
                ReturnKind::Text,
                "One 'name: type' line per column in declaration order; empty if the table does not exist.",
            ),
        }
    }
}

#[async_trait]
impl Tool for ColumnInfoTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn execute(&self, args: &Arguments) -> Result<Value> {
        let output = self
            .database
            .describe_columns(args.str("table_name")?)
            .await?;
        Ok(Value::String(output))
    }
}
