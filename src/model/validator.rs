//! Definition validation: identifier allow-list, reserved names, field uniqueness, defaults.
//!
//! Identifiers end up quoted inside SQL text, so every name that reaches a
//! statement must pass these checks first, both on submission and again when a
//! stored definition is loaded or synthesized.

use crate::error::DefinitionError;
use crate::model::types::*;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Column names the engine owns or that collide with identity data.
pub const RESERVED_FIELD_NAMES: &[&str] = &["id", "created_at", "updated_at", "user", "password", "token"];

/// PostgreSQL reserved keywords rejected as identifiers even though they are quoted.
const SQL_KEYWORDS: &[&str] = &[
    "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric", "both", "case",
    "cast", "check", "collate", "column", "constraint", "create", "current_catalog",
    "current_date", "current_role", "current_time", "current_timestamp", "current_user",
    "default", "deferrable", "desc", "distinct", "do", "drop", "else", "end", "except", "false",
    "fetch", "for", "foreign", "from", "grant", "group", "having", "in", "initially", "insert",
    "intersect", "into", "lateral", "leading", "limit", "localtime", "localtimestamp", "not",
    "null", "offset", "on", "only", "or", "order", "placing", "primary", "references",
    "returning", "select", "session_user", "some", "symmetric", "table", "then", "to",
    "trailing", "true", "union", "unique", "update", "using", "variadic", "when", "where",
    "window", "with", "delete",
];

/// Tables owned by the engine and the identity collaborator.
const RESERVED_TABLE_NAMES: &[&str] = &["users", "model_definitions"];

fn model_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // 62 chars leaves room for the plural suffix within PostgreSQL's 63-byte identifier limit.
    RE.get_or_init(|| Regex::new(r"^[A-Z][A-Za-z0-9]{0,61}$").expect("static pattern"))
}

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("static pattern"))
}

pub fn validate_model_name(name: &str) -> Result<(), DefinitionError> {
    if !model_name_re().is_match(name) || is_sql_keyword(name) {
        return Err(DefinitionError::InvalidModelName(name.to_string()));
    }
    Ok(())
}

/// Allow-list check for a table or column name about to be embedded in SQL.
pub fn validate_identifier(name: &str) -> Result<(), DefinitionError> {
    if !identifier_re().is_match(name) || is_sql_keyword(name) {
        return Err(DefinitionError::InvalidIdentifier(name.to_string()));
    }
    Ok(())
}

fn is_sql_keyword(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    SQL_KEYWORDS.contains(&lower.as_str())
}

fn is_reserved(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    RESERVED_FIELD_NAMES.contains(&lower.as_str())
}

fn validate_column_name(name: &str) -> Result<(), DefinitionError> {
    if is_reserved(name) {
        return Err(DefinitionError::ReservedName(name.to_string()));
    }
    validate_identifier(name)
}

/// Validate a submitted definition and produce the canonical stored form.
pub fn build_definition(input: ModelDefinitionInput) -> Result<ModelDefinition, DefinitionError> {
    let name = input.name.trim().to_string();
    let owner_field = input
        .owner_field
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty());
    let fields = input
        .fields
        .into_iter()
        .map(|mut f| {
            f.name = f.name.trim().to_string();
            if matches!(&f.default, Some(Value::String(s)) if s.is_empty()) || f.default == Some(Value::Null) {
                f.default = None;
            }
            f
        })
        .collect();
    let definition = ModelDefinition {
        table_name: table_name_for(&name),
        name,
        fields,
        owner_field,
        rbac: input.rbac.unwrap_or_else(default_rbac),
    };
    validate_definition(&definition)?;
    Ok(definition)
}

/// Full structural check. Applied to submitted and to stored definitions alike.
pub fn validate_definition(def: &ModelDefinition) -> Result<(), DefinitionError> {
    validate_model_name(&def.name)?;
    validate_identifier(&def.table_name)?;
    if RESERVED_TABLE_NAMES.contains(&def.table_name.to_ascii_lowercase().as_str()) {
        return Err(DefinitionError::ReservedName(def.table_name.clone()));
    }

    let mut seen = HashSet::new();
    for field in &def.fields {
        validate_column_name(&field.name)?;
        if !seen.insert(field.name.to_ascii_lowercase()) {
            return Err(DefinitionError::DuplicateField(field.name.clone()));
        }
        if let Some(default) = &field.default {
            check_default(field, default)?;
        }
    }

    if let Some(owner) = &def.owner_field {
        validate_column_name(owner)?;
        if seen.contains(&owner.to_ascii_lowercase()) {
            return Err(DefinitionError::DuplicateField(owner.clone()));
        }
    }

    for (role, grants) in &def.rbac {
        if role.trim().is_empty() {
            return Err(DefinitionError::Malformed("role name must not be empty".into()));
        }
        if grants.is_empty() {
            return Err(DefinitionError::EmptyGrant(role.clone()));
        }
    }
    Ok(())
}

/// Longest value a `string` column (VARCHAR(255)) holds.
pub const MAX_STRING_CHARS: usize = 255;

/// Exclusive magnitude bound for a `number` column (DECIMAL(10,2)) after rounding to cents.
const MAX_DECIMAL_ABS: f64 = 99_999_999.995;

/// Accepted `date` spellings: RFC 3339, ISO date-time with or without `T`, bare date.
pub fn is_timestamp(s: &str) -> bool {
    let s = s.trim();
    chrono::DateTime::parse_from_rfc3339(s).is_ok()
        || chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").is_ok()
        || chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn fits_decimal(n: f64) -> bool {
    n.is_finite() && n.abs() < MAX_DECIMAL_ABS
}

/// Whether a non-null value can be stored in a column of `kind`. Err carries the reason.
pub fn check_kind_value(kind: FieldKind, v: &Value) -> Result<(), &'static str> {
    let ok = match kind {
        FieldKind::String => {
            return match v.as_str() {
                Some(s) if s.chars().count() <= MAX_STRING_CHARS => Ok(()),
                Some(_) => Err("expected at most 255 characters"),
                None => Err("expected a string"),
            }
        }
        FieldKind::Text => v.is_string(),
        FieldKind::Date => v.as_str().map(is_timestamp).unwrap_or(false),
        FieldKind::Number => match v {
            Value::Number(n) => n.as_f64().map(fits_decimal).unwrap_or(false),
            Value::String(s) => s.trim().parse::<f64>().map(fits_decimal).unwrap_or(false),
            _ => false,
        },
        FieldKind::Integer => match v {
            Value::Number(n) => n.as_i64().and_then(|i| i32::try_from(i).ok()).is_some(),
            Value::String(s) => s.trim().parse::<i32>().is_ok(),
            _ => false,
        },
        FieldKind::Boolean => v.is_boolean(),
        FieldKind::Json => true,
    };
    if ok {
        Ok(())
    } else {
        Err(match kind {
            FieldKind::String | FieldKind::Text => "expected a string",
            FieldKind::Date => "expected a date or timestamp",
            FieldKind::Number => "expected a number below 100000000 in magnitude",
            FieldKind::Integer => "expected a 32-bit integer",
            FieldKind::Boolean => "expected a boolean",
            FieldKind::Json => "expected JSON",
        })
    }
}

fn check_default(field: &FieldSpec, default: &Value) -> Result<(), DefinitionError> {
    if field.kind == FieldKind::Boolean && matches!(default.as_str(), Some("true" | "false")) {
        return Ok(());
    }
    check_kind_value(field.kind, default).map_err(|reason| DefinitionError::InvalidDefault {
        field: field.name.clone(),
        reason: reason.to_string(),
    })
}
