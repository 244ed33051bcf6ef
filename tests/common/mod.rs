#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use schemaforge::model::resolve_stored;
use schemaforge::sql::QueryBuf;
use schemaforge::store::StoredModel;
use schemaforge::{
    api_router, AppError, AppState, FileMirror, Identity, IdentityProvider, ModelRegistry, Store,
};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Replays canned row sets in order and records every statement it is asked to run.
#[derive(Default)]
pub struct ScriptedStore {
    replies: Mutex<VecDeque<Vec<Value>>>,
    seen: Mutex<Vec<QueryBuf>>,
}

impl ScriptedStore {
    pub fn reply(&self, rows: Vec<Value>) {
        self.replies.lock().unwrap().push_back(rows);
    }

    pub fn seen(&self) -> Vec<QueryBuf> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Store for ScriptedStore {
    async fn fetch_all(&self, q: &QueryBuf) -> Result<Vec<Value>, AppError> {
        self.seen.lock().unwrap().push(q.clone());
        Ok(self.replies.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn transaction(&self, statements: &[QueryBuf]) -> Result<Vec<Vec<Value>>, AppError> {
        let mut out = Vec::new();
        for q in statements {
            out.push(self.fetch_all(q).await?);
        }
        Ok(out)
    }
}

/// Bearer tokens are looked up verbatim.
pub struct StaticTokens(HashMap<String, Identity>);

#[async_trait]
impl IdentityProvider for StaticTokens {
    async fn identify(&self, token: &str) -> Result<Identity, AppError> {
        self.0
            .get(token)
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("unknown token".into()))
    }
}

pub const ADMIN: &str = "admin-token";
pub const MANAGER: &str = "manager-token";
pub const OTHER_MANAGER: &str = "manager2-token";
pub const VIEWER: &str = "viewer-token";

pub const ADMIN_ID: i64 = 1;
pub const MANAGER_ID: i64 = 2;
pub const OTHER_MANAGER_ID: i64 = 3;
pub const VIEWER_ID: i64 = 4;

fn tokens() -> StaticTokens {
    let who = |id, role: &str| Identity {
        id,
        role: role.to_string(),
    };
    StaticTokens(HashMap::from([
        (ADMIN.to_string(), who(ADMIN_ID, "Admin")),
        (MANAGER.to_string(), who(MANAGER_ID, "Manager")),
        (OTHER_MANAGER.to_string(), who(OTHER_MANAGER_ID, "Manager")),
        (VIEWER.to_string(), who(VIEWER_ID, "Viewer")),
    ]))
}

pub struct Harness {
    pub store: Arc<ScriptedStore>,
    pub state: AppState,
    pub app: Router,
    pub models_dir: tempfile::TempDir,
}

pub fn harness() -> Harness {
    let store = Arc::new(ScriptedStore::default());
    let models_dir = tempfile::tempdir().unwrap();
    let state = AppState::new(
        store.clone(),
        ModelRegistry::new(),
        FileMirror::new(models_dir.path()),
        Arc::new(tokens()),
    );
    let app = Router::new().nest("/api", api_router(state.clone(), 1024 * 1024));
    Harness {
        store,
        state,
        app,
        models_dir,
    }
}

/// A `model_definitions` row as the store returns it.
pub fn stored_row(name: &str, table_name: &str, definition: Value) -> Value {
    json!({
        "id": 1,
        "name": name,
        "table_name": table_name,
        "definition": definition,
        "created_by": ADMIN_ID,
        "created_by_username": "admin",
        "created_at": "2024-05-01T10:00:00"
    })
}

/// Task: required title, owned rows, Viewer may read, Manager may create/read/update.
pub fn task_definition() -> Value {
    json!({
        "name": "Task",
        "tableName": "tasks",
        "fields": [{"name": "title", "type": "string", "required": true}],
        "ownerField": "ownerId",
        "rbac": {"Viewer": ["read"], "Manager": ["create", "read", "update"]}
    })
}

pub fn register(h: &Harness, row: Value) {
    let stored: StoredModel = serde_json::from_value(row).unwrap();
    h.state.registry.register(resolve_stored(stored).unwrap());
}

/// Send a body as-is, with an optional content type.
pub async fn call_raw(
    h: &Harness,
    method: Method,
    uri: &str,
    token: &str,
    content_type: Option<&str>,
    body: &str,
) -> (StatusCode, Value) {
    let mut req = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));
    if let Some(content_type) = content_type {
        req = req.header(header::CONTENT_TYPE, content_type);
    }
    let req = req.body(Body::from(body.to_string())).unwrap();
    send(h, req).await
}

pub async fn call(
    h: &Harness,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let req = match body {
        Some(b) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&b).unwrap()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    send(h, req).await
}

async fn send(h: &Harness, req: Request<Body>) -> (StatusCode, Value) {
    let resp = h.app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}
