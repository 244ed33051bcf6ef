//! Payload validation against a model's field specs.

use crate::error::AppError;
use crate::model::{check_kind_value, FieldSpec, ModelDefinition};
use serde_json::{Map, Value};

pub struct RequestValidator;

impl RequestValidator {
    /// Create: every required field must be present, non-null and non-empty. Present values must fit their kind.
    pub fn validate(def: &ModelDefinition, body: &Map<String, Value>) -> Result<(), AppError> {
        for field in &def.fields {
            let val = body.get(&field.name);
            if field.required && is_blank(val) {
                return Err(AppError::Validation(format!("Field '{}' is required", field.name)));
            }
            if let Some(v) = val {
                validate_field(field, v)?;
            }
        }
        Ok(())
    }

    /// Update: only fields present in the body are checked; nulls are skipped (not written).
    pub fn validate_partial(def: &ModelDefinition, body: &Map<String, Value>) -> Result<(), AppError> {
        for field in &def.fields {
            if let Some(v) = body.get(&field.name) {
                validate_field(field, v)?;
            }
        }
        Ok(())
    }
}

fn is_blank(v: Option<&Value>) -> bool {
    match v {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn validate_field(field: &FieldSpec, v: &Value) -> Result<(), AppError> {
    if v.is_null() {
        return Ok(());
    }
    check_kind_value(field.kind, v).map_err(|reason| {
        AppError::Validation(format!(
            "Field '{}' must be a valid {} value: {}",
            field.name,
            field.kind.as_str(),
            reason
        ))
    })
}
