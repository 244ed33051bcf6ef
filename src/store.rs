//! Bootstrap tables and model definition persistence (`model_definitions`).

use crate::error::AppError;
use crate::migration::{drop_table, TableDdl, IDENTITY_TABLE};
use crate::model::ModelDefinition;
use crate::sql::{PgBindValue, QueryBuf, Store};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFINITIONS_TABLE: &str = "model_definitions";

/// A definition row as persisted. `definition` is kept raw: it is parsed (and may be
/// found corrupt) only when resolved for routing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredModel {
    pub id: i64,
    pub name: String,
    #[serde(alias = "table_name")]
    pub table_name: String,
    pub definition: Value,
    #[serde(default, alias = "created_by")]
    pub created_by: Option<i64>,
    #[serde(default, alias = "created_by_username")]
    pub created_by_username: Option<String>,
    #[serde(alias = "created_at")]
    pub created_at: chrono::NaiveDateTime,
}

const STORED_COLUMNS: &str =
    "md.id, md.name, md.table_name, md.definition, md.created_by, u.username AS created_by_username, md.created_at";

fn decode_row(row: Value) -> Result<StoredModel, AppError> {
    serde_json::from_value(row).map_err(|e| AppError::Persistence(format!("model_definitions row: {}", e)))
}

/// Create the identity table (when missing) and `model_definitions`.
pub async fn ensure_sys_tables(store: &dyn Store) -> Result<(), AppError> {
    let users_ddl = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            id SERIAL PRIMARY KEY,
            username VARCHAR(50) UNIQUE NOT NULL,
            role VARCHAR(20) NOT NULL DEFAULT 'Viewer',
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )
        "#,
        IDENTITY_TABLE
    );
    let definitions_ddl = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            id SERIAL PRIMARY KEY,
            name VARCHAR(100) UNIQUE NOT NULL,
            table_name VARCHAR(100) UNIQUE NOT NULL,
            definition JSONB NOT NULL,
            created_by INTEGER REFERENCES {}(id),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
        DEFINITIONS_TABLE, IDENTITY_TABLE
    );
    store.fetch_all(&QueryBuf::raw(users_ddl)).await?;
    store.fetch_all(&QueryBuf::raw(definitions_ddl)).await?;
    Ok(())
}

fn insert_definition(def: &ModelDefinition, creator_id: i64) -> Result<QueryBuf, AppError> {
    let payload = serde_json::to_value(def).map_err(|e| AppError::Persistence(e.to_string()))?;
    let sql = format!(
        "WITH md AS (INSERT INTO {} (name, table_name, definition, created_by) VALUES ($1, $2, $3, $4) \
         RETURNING id, name, table_name, definition, created_by, created_at) \
         SELECT {} FROM md LEFT JOIN {} u ON md.created_by = u.id",
        DEFINITIONS_TABLE, STORED_COLUMNS, IDENTITY_TABLE
    );
    Ok(QueryBuf::with_params(
        sql,
        vec![
            PgBindValue::String(def.name.clone()),
            PgBindValue::String(def.table_name.clone()),
            PgBindValue::Json(payload),
            PgBindValue::I64(creator_id),
        ],
    ))
}

/// Create the table and insert the definition row in one transaction, so a failed
/// insert (e.g. a concurrent create of the same name) leaves no orphaned table.
pub async fn persist(
    store: &dyn Store,
    table: &TableDdl,
    def: &ModelDefinition,
    creator_id: i64,
) -> Result<StoredModel, AppError> {
    let insert = insert_definition(def, creator_id)?;
    let mut results = store.transaction(&[table.statement.clone(), insert]).await?;
    let row = results
        .pop()
        .and_then(|rows| rows.into_iter().next())
        .ok_or_else(|| AppError::Persistence("definition insert returned no row".into()))?;
    decode_row(row)
}

/// All stored models with creator username, newest first.
pub async fn get_all(store: &dyn Store) -> Result<Vec<StoredModel>, AppError> {
    let q = QueryBuf::raw(format!(
        "SELECT {} FROM {} md LEFT JOIN {} u ON md.created_by = u.id ORDER BY md.created_at DESC",
        STORED_COLUMNS, DEFINITIONS_TABLE, IDENTITY_TABLE
    ));
    store.fetch_all(&q).await?.into_iter().map(decode_row).collect()
}

pub async fn get_by_name(store: &dyn Store, name: &str) -> Result<Option<StoredModel>, AppError> {
    let q = QueryBuf::with_params(
        format!(
            "SELECT {} FROM {} md LEFT JOIN {} u ON md.created_by = u.id WHERE md.name = $1",
            STORED_COLUMNS, DEFINITIONS_TABLE, IDENTITY_TABLE
        ),
        vec![PgBindValue::String(name.to_string())],
    );
    store.fetch_optional(&q).await?.map(decode_row).transpose()
}

/// Existing model whose name or table name collides with a new definition.
pub async fn find_conflict(
    store: &dyn Store,
    name: &str,
    table_name: &str,
) -> Result<Option<StoredModel>, AppError> {
    let q = QueryBuf::with_params(
        format!(
            "SELECT {} FROM {} md LEFT JOIN {} u ON md.created_by = u.id WHERE md.name = $1 OR md.table_name = $2",
            STORED_COLUMNS, DEFINITIONS_TABLE, IDENTITY_TABLE
        ),
        vec![
            PgBindValue::String(name.to_string()),
            PgBindValue::String(table_name.to_string()),
        ],
    );
    store.fetch_optional(&q).await?.map(decode_row).transpose()
}

/// Drop the model's table and remove its definition row together.
pub async fn delete(store: &dyn Store, stored: &StoredModel) -> Result<(), AppError> {
    let drop = drop_table(&stored.table_name)?;
    let remove = QueryBuf::with_params(
        format!("DELETE FROM {} WHERE name = $1", DEFINITIONS_TABLE),
        vec![PgBindValue::String(stored.name.clone())],
    );
    store.transaction(&[drop, remove]).await?;
    Ok(())
}
