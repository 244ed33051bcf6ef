//! Schemaforge server: loads settings, bootstraps tables, restores stored models, serves `/api`.
//!
//! Run from repo root: `cargo run -p schemaforge-server`

use schemaforge::{
    api_router, ensure_sys_tables, AppState, FileMirror, JwtIdentity, ModelRegistry, PgStore, Settings,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("schemaforge=info,schemaforge_server=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(&settings.database_url)
        .await?;
    let store = Arc::new(PgStore::new(pool));

    ensure_sys_tables(store.as_ref()).await?;
    let registry = ModelRegistry::load(store.as_ref()).await?;
    let state = AppState::new(
        store,
        registry,
        FileMirror::new(&settings.models_dir),
        Arc::new(JwtIdentity::new(settings.jwt_secret.as_bytes())),
    );

    let app = axum::Router::new().nest("/api", api_router(state, settings.max_body_bytes));
    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("schemaforge listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
