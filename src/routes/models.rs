//! Model management routes under `/models`.

use crate::handlers::models::{create_model, delete_model, get_model, list_models};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn model_routes() -> Router<AppState> {
    Router::new()
        .route("/models", get(list_models).post(create_model))
        .route("/models/:name", get(get_model).delete(delete_model))
}
