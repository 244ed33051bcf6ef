//! Router assembly.

mod common;
mod data;
mod models;

pub use common::common_routes;
pub use data::data_routes;
pub use models::model_routes;

use crate::state::AppState;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;

/// All engine routes with state applied. Mount under a prefix (e.g. `/api`) in the host app.
pub fn api_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .merge(common_routes())
        .merge(model_routes())
        .merge(data_routes())
        .layer(ServiceBuilder::new().layer(RequestBodyLimitLayer::new(max_body_bytes)))
        .with_state(state)
}
