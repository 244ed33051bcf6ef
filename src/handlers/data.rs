//! Record CRUD handlers shared by every model. The model is looked up per request, then the
//! caller's role is checked against its rbac before any statement runs.

use crate::error::AppError;
use crate::extractors::Caller;
use crate::model::{Action, ResolvedModel};
use crate::permission::require;
use crate::response::{success_many, success_one, success_one_ok, Meta};
use crate::service::CrudService;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Live model by name, authorized for `action`.
fn authorized_model(
    state: &AppState,
    caller: &Caller,
    name: &str,
    action: Action,
) -> Result<Arc<ResolvedModel>, AppError> {
    let model = state
        .registry
        .get(name)
        .ok_or_else(|| AppError::NotFound(format!("model '{}' not found", name)))?;
    require(&model.definition.rbac, &caller.0.role, action)?;
    Ok(model)
}

fn parse_id(id_str: &str) -> Result<i64, AppError> {
    id_str
        .parse()
        .map_err(|_| AppError::Validation(format!("invalid id '{}'", id_str)))
}

fn body_to_map(value: Value) -> Result<Map<String, Value>, AppError> {
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::Validation("body must be a JSON object".into())),
    }
}

fn meta(model: &ResolvedModel) -> Meta {
    Meta::default().degraded(model.is_degraded())
}

fn meta_message(model: &ResolvedModel, verb: &str) -> Meta {
    Meta::message(format!("{} {} successfully", model.definition.name, verb)).degraded(model.is_degraded())
}

pub async fn list(
    State(state): State<AppState>,
    caller: Caller,
    Path(model_name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let model = authorized_model(&state, &caller, &model_name, Action::Read)?;
    let limit: Option<u32> = params.get("limit").and_then(|v| v.parse().ok());
    let offset: Option<u32> = params.get("offset").and_then(|v| v.parse().ok());
    let rows = CrudService::list(state.store.as_ref(), &model.definition, &caller.0, limit, offset).await?;
    Ok(success_many(rows, meta(&model)))
}

pub async fn read(
    State(state): State<AppState>,
    caller: Caller,
    Path((model_name, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let model = authorized_model(&state, &caller, &model_name, Action::Read)?;
    let id = parse_id(&id)?;
    let row = CrudService::read(state.store.as_ref(), &model.definition, &caller.0, id).await?;
    Ok(success_one_ok(row, meta(&model)))
}

pub async fn create(
    State(state): State<AppState>,
    caller: Caller,
    Path(model_name): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let model = authorized_model(&state, &caller, &model_name, Action::Create)?;
    let Json(body) = body?;
    let body = body_to_map(body)?;
    let row = CrudService::create(state.store.as_ref(), &model.definition, &caller.0, &body).await?;
    tracing::debug!(model = %model.definition.name, caller = caller.0.id, "record created");
    Ok(success_one(row, meta_message(&model, "created")))
}

pub async fn update(
    State(state): State<AppState>,
    caller: Caller,
    Path((model_name, id)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let model = authorized_model(&state, &caller, &model_name, Action::Update)?;
    let id = parse_id(&id)?;
    let Json(body) = body?;
    let body = body_to_map(body)?;
    let row = CrudService::update(state.store.as_ref(), &model.definition, &caller.0, id, &body).await?;
    Ok(success_one_ok(row, meta_message(&model, "updated")))
}

pub async fn delete(
    State(state): State<AppState>,
    caller: Caller,
    Path((model_name, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let model = authorized_model(&state, &caller, &model_name, Action::Delete)?;
    let id = parse_id(&id)?;
    let row = CrudService::delete(state.store.as_ref(), &model.definition, &caller.0, id).await?;
    Ok(success_one_ok(row, meta_message(&model, "deleted")))
}
