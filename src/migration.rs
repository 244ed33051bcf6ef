//! Table synthesis: model definition to `CREATE TABLE IF NOT EXISTS` DDL.
//!
//! Columns are fixed at creation time. A later change to a stored definition is
//! never retrofitted onto an existing table.

use crate::error::DefinitionError;
use crate::model::{validate_definition, FieldKind, FieldSpec, ModelDefinition};
use crate::sql::{quoted, QueryBuf};
use serde_json::Value;

/// Identity table referenced by owner columns.
pub const IDENTITY_TABLE: &str = "users";

/// Physical column type for a field kind.
pub fn column_type(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::String => "VARCHAR(255)",
        FieldKind::Text => "TEXT",
        FieldKind::Number => "DECIMAL(10,2)",
        FieldKind::Integer => "INTEGER",
        FieldKind::Boolean => "BOOLEAN",
        FieldKind::Date => "TIMESTAMP",
        FieldKind::Json => "JSONB",
    }
}

/// Type used when casting a bound parameter to the column's type.
pub fn cast_type(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::String => "varchar",
        FieldKind::Text => "text",
        FieldKind::Number => "numeric",
        FieldKind::Integer => "integer",
        FieldKind::Boolean => "boolean",
        FieldKind::Date => "timestamp",
        FieldKind::Json => "jsonb",
    }
}

fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// DEFAULT literal for a field: quoted for textual kinds, TRUE/FALSE for booleans, raw numerics otherwise.
pub fn default_literal(field: &FieldSpec, value: &Value) -> Result<String, DefinitionError> {
    let invalid = |reason: &str| DefinitionError::InvalidDefault {
        field: field.name.clone(),
        reason: reason.to_string(),
    };
    match field.kind {
        FieldKind::String | FieldKind::Text | FieldKind::Date => value
            .as_str()
            .map(quote_literal)
            .ok_or_else(|| invalid("expected a string")),
        FieldKind::Boolean => match value {
            Value::Bool(true) => Ok("TRUE".into()),
            Value::Bool(false) => Ok("FALSE".into()),
            Value::String(s) if s == "true" => Ok("TRUE".into()),
            Value::String(s) if s == "false" => Ok("FALSE".into()),
            _ => Err(invalid("expected a boolean")),
        },
        FieldKind::Number => match value {
            Value::Number(n) => Ok(n.to_string()),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(|f| f.to_string())
                .ok_or_else(|| invalid("expected a number")),
            _ => Err(invalid("expected a number")),
        },
        FieldKind::Integer => match value {
            Value::Number(n) => n.as_i64().map(|i| i.to_string()).ok_or_else(|| invalid("expected an integer")),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(|i| i.to_string())
                .map_err(|_| invalid("expected an integer")),
            _ => Err(invalid("expected an integer")),
        },
        FieldKind::Json => Ok(format!("{}::jsonb", quote_literal(&value.to_string()))),
    }
}

/// Synthesized DDL for one model.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDdl {
    pub table_name: String,
    pub statement: QueryBuf,
}

/// Build the idempotent CREATE TABLE for a definition. Identifiers are re-validated here,
/// so a definition that did not come through submission still cannot inject SQL.
pub fn synthesize_table(def: &ModelDefinition) -> Result<TableDdl, DefinitionError> {
    validate_definition(def)?;

    let mut col_defs = vec![
        format!("{} SERIAL PRIMARY KEY", quoted("id")),
        format!("{} TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP", quoted("created_at")),
        format!("{} TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP", quoted("updated_at")),
    ];
    for field in &def.fields {
        let mut col = format!("{} {}", quoted(&field.name), column_type(field.kind));
        if field.required {
            col.push_str(" NOT NULL");
        }
        if let Some(default) = &field.default {
            col.push_str(" DEFAULT ");
            col.push_str(&default_literal(field, default)?);
        }
        if field.unique {
            col.push_str(" UNIQUE");
        }
        col_defs.push(col);
    }
    if let Some(owner) = &def.owner_field {
        col_defs.push(format!(
            "{} INTEGER REFERENCES {}({})",
            quoted(owner),
            quoted(IDENTITY_TABLE),
            quoted("id")
        ));
    }

    let sql = format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
        quoted(&def.table_name),
        col_defs.join(",\n  ")
    );
    Ok(TableDdl {
        table_name: def.table_name.clone(),
        statement: QueryBuf::raw(sql),
    })
}

/// DROP for a model's table. The name is validated before it reaches SQL text.
pub fn drop_table(table_name: &str) -> Result<QueryBuf, DefinitionError> {
    crate::model::validate_identifier(table_name)?;
    Ok(QueryBuf::raw(format!("DROP TABLE IF EXISTS {}", quoted(table_name))))
}
