//! Stage 2: run generated SQL against the record store

use super::StageError;
use serde_json::{Map, Number, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column, ConnectOptions, Connection, Executor, Row, Statement, TypeInfo, ValueRef};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Result text when a query returns no rows.
pub const NO_RESULTS: &str = "No results found";

/// Runs SQL verbatim on a fresh connection per call.
///
/// The SQL comes from the model and is not parameterized. Only a single
/// statement that returns columns is accepted, and its transaction is
/// rolled back, so writes never persist. `read_only` additionally opens
/// the connection read-only.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    database_path: PathBuf,
    read_only: bool,
}

/// Output of a successful execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedQuery {
    pub sql: String,
    /// JSON array of row objects, or [`NO_RESULTS`]
    pub rendered: String,
    pub row_count: usize,
}

impl QueryExecutor {
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            read_only: false,
        }
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub async fn execute(&self, sql: String) -> Result<ExecutedQuery, StageError> {
        match self.fetch_rendered(&sql).await {
            Ok((rendered, row_count)) => {
                debug!(rows = row_count, "SQL executed");
                Ok(ExecutedQuery {
                    sql,
                    rendered,
                    row_count,
                })
            }
            Err(e) => Err(StageError::Execution {
                sql,
                message: e.to_string(),
            }),
        }
    }

    async fn fetch_rendered(&self, sql: &str) -> Result<(String, usize), ExecError> {
        if statement_count(sql) > 1 {
            return Err(ExecError::MultipleStatements);
        }

        let mut conn = SqliteConnectOptions::new()
            .filename(&self.database_path)
            .read_only(self.read_only)
            .connect()
            .await?;

        let fetched = fetch_rolled_back(&mut conn, sql).await;
        conn.close().await?;
        let rows = fetched?;

        if rows.is_empty() {
            return Ok((NO_RESULTS.to_string(), 0));
        }

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            records.push(row_to_map(row)?);
        }

        Ok((serde_json::to_string(&records)?, rows.len()))
    }
}

#[derive(Debug, Error)]
enum ExecError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("You can only execute one statement at a time.")]
    MultipleStatements,

    #[error("statement returns no result columns")]
    NoResultColumns,

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Runs inside a transaction that is always rolled back, so writes never persist.
async fn fetch_rolled_back(
    conn: &mut SqliteConnection,
    sql: &str,
) -> Result<Vec<SqliteRow>, ExecError> {
    let mut tx = conn.begin().await?;

    let fetched = async {
        let statement = (&mut *tx).prepare(sql).await?;
        if statement.columns().is_empty() {
            return Err(ExecError::NoResultColumns);
        }
        Ok(sqlx::query(sql).fetch_all(&mut *tx).await?)
    }
    .await;

    tx.rollback().await?;
    fetched
}

/// Number of non-empty statements, ignoring `;` inside quotes and comments.
fn statement_count(sql: &str) -> usize {
    let mut chars = sql.chars().peekable();
    let mut count = 0;
    let mut has_content = false;

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' | '`' | '[' => {
                let close = if c == '[' { ']' } else { c };
                has_content = true;
                for inner in chars.by_ref() {
                    if inner == close {
                        break;
                    }
                }
            }
            '-' if chars.peek() == Some(&'-') => {
                for inner in chars.by_ref() {
                    if inner == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for inner in chars.by_ref() {
                    if prev == '*' && inner == '/' {
                        break;
                    }
                    prev = inner;
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

/// Column name to cell value, in column order.
fn row_to_map(row: &SqliteRow) -> Result<Map<String, Value>, sqlx::Error> {
    let mut map = Map::new();
    for (idx, column) in row.columns().iter().enumerate() {
        map.insert(column.name().to_string(), cell_value(row, idx)?);
    }
    Ok(map)
}

/// Decodes by the value's runtime storage class, not the declared column type.
fn cell_value(row: &SqliteRow, idx: usize) -> Result<Value, sqlx::Error> {
    let type_name = {
        let raw = row.try_get_raw(idx)?;
        if raw.is_null() {
            return Ok(Value::Null);
        }
        raw.type_info().name().to_string()
    };

    match type_name.as_str() {
        "INTEGER" => row.try_get::<i64, _>(idx).map(Value::from),
        "REAL" => row
            .try_get::<f64, _>(idx)
            .map(|f| Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)),
        "BLOB" => row.try_get::<Vec<u8>, _>(idx).map(|bytes| {
            Value::String(bytes.iter().map(|b| format!("{:02x}", b)).collect())
        }),
        // TEXT
        _ => row.try_get_unchecked::<String, _>(idx).map(Value::String),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sales::{Money, NewSale, SaleStore};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    async fn seeded() -> (TempDir, QueryExecutor) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.sqlite3");
        let store = SaleStore::open(&path).await.unwrap();
        store.migrate().await.unwrap();
        for (name, sold, bought) in [("XYZ", 1525, 1000), ("XYZ", 1475, 900), ("ABC", 999, 500)] {
            let sale = NewSale::new(name, Money::from_cents(sold), Money::from_cents(bought))
                .on(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
            store.insert(&sale).await.unwrap();
        }
        store.close().await;
        (dir, QueryExecutor::new(path))
    }

    #[tokio::test]
    async fn test_renders_rows_in_column_order() {
        let (_dir, executor) = seeded().await;
        let out = executor
            .execute(
                "SELECT COUNT(*) as total_sales, SUM(price_sold) as total_revenue \
                 FROM sales_sale WHERE product_name = 'XYZ'"
                    .to_string(),
            )
            .await
            .unwrap();

        assert_eq!(out.row_count, 1);
        assert_eq!(out.rendered, r#"[{"total_sales":2,"total_revenue":30.0}]"#);
    }

    #[tokio::test]
    async fn test_text_and_null_cells() {
        let (_dir, executor) = seeded().await;
        let out = executor
            .execute("SELECT product_name, NULL AS note FROM sales_sale WHERE product_name = 'ABC'".to_string())
            .await
            .unwrap();
        assert_eq!(out.rendered, r#"[{"product_name":"ABC","note":null}]"#);
    }

    #[tokio::test]
    async fn test_zero_rows_yield_sentinel() {
        let (_dir, executor) = seeded().await;
        let out = executor
            .execute("SELECT * FROM sales_sale WHERE product_name = 'NOPE'".to_string())
            .await
            .unwrap();
        assert_eq!(out.rendered, "No results found");
        assert_eq!(out.row_count, 0);
    }

    #[tokio::test]
    async fn test_syntax_error_keeps_sql() {
        let (_dir, executor) = seeded().await;
        let err = executor
            .execute("SELEC nonsense".to_string())
            .await
            .unwrap_err();

        assert!(err.to_string().starts_with("Error executing SQL: "));
        assert_eq!(err.sql(), Some("SELEC nonsense"));
    }

    #[tokio::test]
    async fn test_read_only_rejects_writes() {
        let (_dir, executor) = seeded().await;
        let executor = executor.read_only(true);
        let err = executor
            .execute("DELETE FROM sales_sale RETURNING id".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, StageError::Execution { .. }));
    }

    async fn count(executor: &QueryExecutor) -> String {
        executor
            .execute("SELECT COUNT(*) AS n FROM sales_sale".to_string())
            .await
            .unwrap()
            .rendered
    }

    #[tokio::test]
    async fn test_multiple_statements_rejected() {
        let (_dir, executor) = seeded().await;
        let err = executor
            .execute("SELECT COUNT(*) AS n FROM sales_sale; DELETE FROM sales_sale".to_string())
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Error executing SQL: You can only execute one statement at a time."
        );
        assert_eq!(count(&executor).await, r#"[{"n":3}]"#);
    }

    #[tokio::test]
    async fn test_statement_without_columns_rejected() {
        let (_dir, executor) = seeded().await;
        let err = executor
            .execute("DELETE FROM sales_sale".to_string())
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Error executing SQL: statement returns no result columns"
        );
        assert_eq!(count(&executor).await, r#"[{"n":3}]"#);
    }

    #[tokio::test]
    async fn test_writes_are_rolled_back() {
        let (_dir, executor) = seeded().await;
        let out = executor
            .execute("DELETE FROM sales_sale WHERE product_name = 'ABC' RETURNING product_name".to_string())
            .await
            .unwrap();

        assert_eq!(out.rendered, r#"[{"product_name":"ABC"}]"#);
        assert_eq!(count(&executor).await, r#"[{"n":3}]"#);
    }

    #[tokio::test]
    async fn test_blob_and_non_finite_cells() {
        let (_dir, executor) = seeded().await;
        let out = executor
            .execute("SELECT x'0aff' AS b, 9e999 AS big, 'txt' AS s".to_string())
            .await
            .unwrap();
        assert_eq!(out.rendered, r#"[{"b":"0aff","big":null,"s":"txt"}]"#);
    }

    #[test]
    fn test_statement_count() {
        assert_eq!(statement_count("SELECT 1"), 1);
        assert_eq!(statement_count("SELECT 1;  \n"), 1);
        assert_eq!(statement_count("SELECT 1; -- trailing note"), 1);
        assert_eq!(statement_count("SELECT 'a;b' AS s;"), 1);
        assert_eq!(statement_count("SELECT \"x;\" FROM t /* ; */"), 1);
        assert_eq!(statement_count("SELECT 1; SELECT 2"), 2);
        assert_eq!(statement_count("SELECT 1;; DELETE FROM t;"), 2);
        assert_eq!(statement_count("  "), 0);
    }
}
