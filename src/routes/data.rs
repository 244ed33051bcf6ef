//! Record routes under `/data/:model`. One handler set serves every model; the model segment
//! is resolved against the registry on each request, so created and deleted models take
//! effect immediately.

use crate::handlers::data::{create, delete as delete_handler, list, read, update};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn data_routes() -> Router<AppState> {
    Router::new()
        .route("/data/:model", get(list).post(create))
        .route(
            "/data/:model/:id",
            get(read).put(update).patch(update).delete(delete_handler),
        )
}
