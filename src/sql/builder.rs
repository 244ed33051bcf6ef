//! Builds parameterized SELECT, INSERT, UPDATE, DELETE for a model's table.
//!
//! Values are always bound positionally. Table and column names come from the
//! validated definition and are embedded as quoted identifiers.

use crate::migration::cast_type;
use crate::model::{FieldKind, ModelDefinition};
use crate::permission::OwnerScope;
use crate::sql::PgBindValue;
use serde_json::{Map, Value};

/// Hard cap on list page size.
pub const MAX_LIST_LIMIT: u32 = 1000;

/// Quote identifier for PostgreSQL (safe: only from validated definitions).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<PgBindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf::default()
    }

    /// Statement without parameters (DDL).
    pub fn raw(sql: impl Into<String>) -> Self {
        QueryBuf {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Statement with parameters already in placeholder order.
    pub fn with_params(sql: impl Into<String>, params: Vec<PgBindValue>) -> Self {
        QueryBuf {
            sql: sql.into(),
            params,
        }
    }

    /// Append a parameter and return its 1-based placeholder index.
    pub fn push_param(&mut self, v: PgBindValue) -> usize {
        self.params.push(v);
        self.params.len()
    }
}

/// Bind a payload value for a field kind. JSON fields always bind as JSON, so a bare
/// string becomes a JSON string rather than text to be parsed.
fn bind_value(kind: FieldKind, v: &Value) -> PgBindValue {
    match kind {
        FieldKind::Json if !v.is_null() => PgBindValue::Json(v.clone()),
        _ => PgBindValue::from_json(v),
    }
}

/// SELECT list: surrogate columns, declared fields, owner column. Decimal columns are
/// read back as text so every row decodes without a numeric type.
pub fn select_column_list(def: &ModelDefinition) -> String {
    let mut cols = vec![quoted("id"), quoted("created_at"), quoted("updated_at")];
    for f in &def.fields {
        let q = quoted(&f.name);
        if f.kind == FieldKind::Number {
            cols.push(format!("{}::text AS {}", q, q));
        } else {
            cols.push(q);
        }
    }
    if let Some(owner) = &def.owner_field {
        cols.push(quoted(owner));
    }
    cols.join(", ")
}

/// WHERE for id match plus optional ownership predicate; placeholders continue from `q`.
fn where_id(q: &mut QueryBuf, id: i64, scope: Option<&OwnerScope<'_>>) -> String {
    let n = q.push_param(PgBindValue::I64(id));
    let mut clause = format!("{} = ${}", quoted("id"), n);
    if let Some(scope) = scope {
        let n = q.push_param(PgBindValue::I64(scope.owner_id));
        clause.push_str(&format!(" AND {} = ${}", quoted(scope.column), n));
    }
    clause
}

/// SELECT all rows, newest first, restricted to the caller's rows when scoped.
pub fn select_list(
    def: &ModelDefinition,
    scope: Option<&OwnerScope<'_>>,
    limit: Option<u32>,
    offset: Option<u32>,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = match scope {
        Some(scope) => {
            let n = q.push_param(PgBindValue::I64(scope.owner_id));
            format!(" WHERE {} = ${}", quoted(scope.column), n)
        }
        None => String::new(),
    };
    let limit_clause = limit
        .map(|n| format!(" LIMIT {}", n.min(MAX_LIST_LIMIT)))
        .unwrap_or_default();
    let offset_clause = offset.map(|n| format!(" OFFSET {}", n)).unwrap_or_default();
    q.sql = format!(
        "SELECT {} FROM {}{} ORDER BY {} DESC{}{}",
        select_column_list(def),
        quoted(&def.table_name),
        where_clause,
        quoted("created_at"),
        limit_clause,
        offset_clause
    );
    q
}

/// SELECT one row by id (and owner when scoped).
pub fn select_by_id(def: &ModelDefinition, id: i64, scope: Option<&OwnerScope<'_>>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = where_id(&mut q, id, scope);
    q.sql = format!(
        "SELECT {} FROM {} WHERE {}",
        select_column_list(def),
        quoted(&def.table_name),
        where_clause
    );
    q
}

/// Guard select run before a mutation: confirms existence and ownership.
pub fn select_guard(def: &ModelDefinition, id: i64, scope: Option<&OwnerScope<'_>>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = where_id(&mut q, id, scope);
    q.sql = format!(
        "SELECT {} FROM {} WHERE {}",
        quoted("id"),
        quoted(&def.table_name),
        where_clause
    );
    q
}

/// INSERT the given field values (declared fields only, in declaration order) plus the owner column.
/// Fields absent from `values` are omitted and take the table's default or NULL.
pub fn insert(def: &ModelDefinition, values: &Map<String, Value>, owner_id: Option<i64>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for f in &def.fields {
        let Some(v) = values.get(&f.name) else { continue };
        let n = q.push_param(bind_value(f.kind, v));
        cols.push(quoted(&f.name));
        placeholders.push(format!("${}::{}", n, cast_type(f.kind)));
    }
    if let (Some(owner), Some(owner_id)) = (&def.owner_field, owner_id) {
        let n = q.push_param(PgBindValue::I64(owner_id));
        cols.push(quoted(owner));
        placeholders.push(format!("${}", n));
    }
    let table = quoted(&def.table_name);
    let returning = select_column_list(def);
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", table, returning)
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            table,
            cols.join(", "),
            placeholders.join(", "),
            returning
        )
    };
    q
}

/// UPDATE by id: SET the given declared fields plus a refreshed `updated_at`.
/// The owner column is never assignable here.
pub fn update(
    def: &ModelDefinition,
    id: i64,
    values: &Map<String, Value>,
    scope: Option<&OwnerScope<'_>>,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = vec![format!("{} = CURRENT_TIMESTAMP", quoted("updated_at"))];
    for f in &def.fields {
        let Some(v) = values.get(&f.name) else { continue };
        let n = q.push_param(bind_value(f.kind, v));
        sets.push(format!("{} = ${}::{}", quoted(&f.name), n, cast_type(f.kind)));
    }
    let where_clause = where_id(&mut q, id, scope);
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} RETURNING {}",
        quoted(&def.table_name),
        sets.join(", "),
        where_clause,
        select_column_list(def)
    );
    q
}

/// DELETE by id (and owner when scoped), returning the removed row.
pub fn delete(def: &ModelDefinition, id: i64, scope: Option<&OwnerScope<'_>>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = where_id(&mut q, id, scope);
    q.sql = format!(
        "DELETE FROM {} WHERE {} RETURNING {}",
        quoted(&def.table_name),
        where_clause,
        select_column_list(def)
    );
    q
}
