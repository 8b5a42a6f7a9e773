use chrono::{NaiveDate, NaiveDateTime};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::BigDecimal;
use sqlx::{Column, Row, TypeInfo, ValueRef};

use crate::config::DatabaseConfig;
use crate::error::{AppError, Result};

/// PostgreSQL-backed sensor store. Executes oracle-generated read queries
/// whose column shape is not known at compile time.
pub struct SensorStore {
    pool: PgPool,
}

impl SensorStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&config.url())
            .await?;
        Ok(Self { pool })
    }

    /// Run a validated SELECT and render the result rows as one tuple per
    /// line, the shape the report prompt expects.
    pub async fn run_select(&self, sql: &str) -> Result<String> {
        let sql = clean_sql(sql);
        validate_select(&sql)?;

        tracing::info!(sql = %sql, "Executing SQL query");

        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        tracing::info!(rows = rows.len(), "Query returned");

        render_rows(&rows)
    }
}

/// Strip Markdown code fences and surrounding noise from oracle SQL output.
/// The prompt forbids fences, but the model does not always comply.
pub fn clean_sql(raw: &str) -> String {
    let mut sql: String = raw
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string();

    while sql.ends_with(';') {
        sql.pop();
        sql = sql.trim_end().to_string();
    }
    sql
}

/// Accept only a single read statement. The query text comes from the
/// oracle, so anything that is not a plain SELECT is rejected outright.
pub fn validate_select(sql: &str) -> Result<()> {
    let lowered = sql.trim_start().to_lowercase();
    if !(lowered.starts_with("select") || lowered.starts_with("with")) {
        return Err(AppError::Database(format!(
            "Refusing to run non-SELECT statement: {}",
            first_line(sql)
        )));
    }
    if sql.contains(';') {
        return Err(AppError::Database(
            "Refusing to run multiple statements".to_string(),
        ));
    }
    Ok(())
}

fn first_line(sql: &str) -> &str {
    sql.lines().next().unwrap_or_default()
}

/// Render rows of unknown shape as `(v1, v2, ...)` tuples, one per line.
/// Columns are decoded by their reported Postgres type.
fn render_rows(rows: &[PgRow]) -> Result<String> {
    let mut lines = Vec::with_capacity(rows.len());
    for row in rows {
        let mut cells = Vec::with_capacity(row.columns().len());
        for (i, column) in row.columns().iter().enumerate() {
            cells.push(render_cell(row, i, column.type_info().name())?);
        }
        lines.push(format!("({})", cells.join(", ")));
    }
    Ok(lines.join("\n"))
}

fn render_cell(row: &PgRow, i: usize, type_name: &str) -> Result<String> {
    if row.try_get_raw(i)?.is_null() {
        return Ok("NULL".to_string());
    }

    let rendered = match type_name {
        "DATE" => row.try_get::<NaiveDate, _>(i)?.format("%Y-%m-%d").to_string(),
        "TIMESTAMP" => row.try_get::<NaiveDateTime, _>(i)?.to_string(),
        "NUMERIC" => row.try_get::<BigDecimal, _>(i)?.to_string(),
        "FLOAT4" => row.try_get::<f32, _>(i)?.to_string(),
        "FLOAT8" => row.try_get::<f64, _>(i)?.to_string(),
        "INT2" => row.try_get::<i16, _>(i)?.to_string(),
        "INT4" => row.try_get::<i32, _>(i)?.to_string(),
        "INT8" => row.try_get::<i64, _>(i)?.to_string(),
        "BOOL" => row.try_get::<bool, _>(i)?.to_string(),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => row.try_get::<String, _>(i)?,
        other => {
            return Err(AppError::Database(format!(
                "Unsupported column type in result set: {other}"
            )))
        }
    };
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_sql_strips_fences() {
        let raw = "```sql\nSELECT 1\n```";
        assert_eq!(clean_sql(raw), "SELECT 1");
    }

    #[test]
    fn test_clean_sql_strips_trailing_semicolon() {
        assert_eq!(clean_sql("SELECT 1;"), "SELECT 1");
        assert_eq!(clean_sql("SELECT 1;\n"), "SELECT 1");
    }

    #[test]
    fn test_clean_sql_keeps_plain_query() {
        let sql = "SELECT date, MIN(value)\nFROM sensor_data\nGROUP BY date";
        assert_eq!(clean_sql(sql), sql);
    }

    #[test]
    fn test_validate_select_accepts_select_and_cte() {
        assert!(validate_select("SELECT 1").is_ok());
        assert!(validate_select("with t as (select 1) select * from t").is_ok());
    }

    #[test]
    fn test_validate_select_rejects_writes() {
        assert!(validate_select("DROP TABLE sensor_data").is_err());
        assert!(validate_select("DELETE FROM sensor_data").is_err());
        assert!(validate_select("UPDATE sensor_data SET value = 0").is_err());
    }

    #[test]
    fn test_validate_select_rejects_multiple_statements() {
        assert!(validate_select("SELECT 1; DROP TABLE sensor_data").is_err());
    }
}
