//! Model management handlers: create, list, get, delete model definitions.

use crate::error::AppError;
use crate::extractors::Caller;
use crate::model::{resolve_stored, ModelView, ADMIN_ROLE};
use crate::permission::require_role;
use crate::response::{success_many, success_one, success_one_ok, Meta};
use crate::service::ModelService;
use crate::state::AppState;
use crate::store;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

const MODEL_CREATORS: &[&str] = &[ADMIN_ROLE, "Manager"];

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatedBody<'a> {
    #[serde(flatten)]
    model: ModelView<'a>,
    file_path: Option<String>,
}

pub async fn create_model(
    State(state): State<AppState>,
    Caller(caller): Caller,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    require_role(&caller, MODEL_CREATORS)?;
    let Json(body) = body?;
    let created =
        ModelService::create(state.store.as_ref(), &state.registry, &state.mirror, &caller, body).await?;
    let data = CreatedBody {
        model: created.model.view(),
        file_path: created.file_path.map(|p| p.display().to_string()),
    };
    let data = serde_json::to_value(data).map_err(|e| AppError::Persistence(e.to_string()))?;
    Ok(success_one(
        data,
        Meta::message("Model created successfully").degraded(created.model.is_degraded()),
    ))
}

pub async fn list_models(
    State(state): State<AppState>,
    Caller(_): Caller,
) -> Result<impl IntoResponse, AppError> {
    let models: Vec<_> = store::get_all(state.store.as_ref())
        .await?
        .into_iter()
        .filter_map(resolve_stored)
        .collect();
    Ok(success_many(models, Meta::default()))
}

pub async fn get_model(
    State(state): State<AppState>,
    Caller(_): Caller,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let model = store::get_by_name(state.store.as_ref(), &name)
        .await?
        .and_then(resolve_stored)
        .ok_or_else(|| AppError::NotFound(format!("model '{}' not found", name)))?;
    let degraded = model.is_degraded();
    Ok(success_one_ok(model, Meta::default().degraded(degraded)))
}

pub async fn delete_model(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    require_role(&caller, &[ADMIN_ROLE])?;
    ModelService::delete(state.store.as_ref(), &state.registry, &state.mirror, &name).await?;
    Ok(success_one_ok(
        json!({ "name": name }),
        Meta::message("Model deleted successfully"),
    ))
}
