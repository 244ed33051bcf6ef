//! Relational store seam: execute SQL with positional parameters, get rows back as JSON objects.

use crate::error::AppError;
use crate::sql::QueryBuf;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{PgPool, Postgres};

#[async_trait]
pub trait Store: Send + Sync {
    /// Run one statement and return every row it produces.
    async fn fetch_all(&self, q: &QueryBuf) -> Result<Vec<Value>, AppError>;

    /// Run several statements atomically; returns the rows of each statement in order.
    async fn transaction(&self, statements: &[QueryBuf]) -> Result<Vec<Vec<Value>>, AppError>;

    /// Liveness check used by readiness probes.
    async fn ping(&self) -> Result<(), AppError> {
        self.fetch_all(&QueryBuf::raw("SELECT 1")).await.map(|_| ())
    }

    async fn fetch_optional(&self, q: &QueryBuf) -> Result<Option<Value>, AppError> {
        Ok(self.fetch_all(q).await?.into_iter().next())
    }
}

/// PostgreSQL-backed store over a shared pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }
}

fn build(q: &QueryBuf) -> sqlx::query::Query<'_, Postgres, PgArguments> {
    let mut query = sqlx::query(&q.sql);
    for p in &q.params {
        query = query.bind(p.clone());
    }
    query
}

#[async_trait]
impl Store for PgStore {
    async fn fetch_all(&self, q: &QueryBuf) -> Result<Vec<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = build(q).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    async fn transaction(&self, statements: &[QueryBuf]) -> Result<Vec<Vec<Value>>, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut out = Vec::with_capacity(statements.len());
        for q in statements {
            tracing::debug!(sql = %q.sql, params = ?q.params, "query (tx)");
            let rows = build(q).fetch_all(&mut *tx).await?;
            out.push(rows.iter().map(row_to_json).collect());
        }
        tx.commit().await?;
        Ok(out)
    }
}

fn row_to_json(row: &PgRow) -> Value {
    use sqlx::Column;
    use sqlx::Row;
    let mut map = serde_json::Map::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    Value::Object(map)
}

fn cell_to_value(row: &PgRow, name: &str) -> Value {
    use sqlx::Row;
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(name) {
        return Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<Value>, _>(name) {
        return j;
    }
    Value::Null
}
