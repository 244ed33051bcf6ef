mod common;

use axum::http::{Method, StatusCode};
use common::*;
use schemaforge::sql::PgBindValue;
use schemaforge::ModelDefinition;
use serde_json::json;

fn task_submission() -> serde_json::Value {
    json!({
        "name": "Task",
        "fields": [
            {"name": "title", "type": "string", "required": true},
            {"name": "status", "type": "string", "default": "open"}
        ],
        "ownerField": "ownerId"
    })
}

#[tokio::test]
async fn manager_creates_model_and_it_becomes_routable() {
    let h = harness();
    let mut stored_definition = task_submission();
    stored_definition["tableName"] = json!("tasks");
    stored_definition["rbac"] = json!({
        "Admin": ["create", "read", "update", "delete"],
        "Manager": ["create", "read", "update"],
        "Viewer": ["read"]
    });
    h.store.reply(vec![]);
    h.store.reply(vec![]);
    h.store.reply(vec![stored_row("Task", "tasks", stored_definition)]);

    let (status, body) = call(&h, Method::POST, "/api/models", Some(MANAGER), Some(task_submission())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Model created successfully");
    assert_eq!(body["data"]["tableName"], "tasks");
    assert_eq!(body["data"]["createdByUsername"], "admin");
    assert!(body["data"]["filePath"].as_str().unwrap().ends_with("Task.json"));
    assert!(h.models_dir.path().join("Task.json").exists());

    let seen = h.store.seen();
    assert_eq!(seen.len(), 3);
    assert!(seen[1].sql.starts_with(r#"CREATE TABLE IF NOT EXISTS "tasks""#));
    assert!(seen[1].sql.contains(r#""ownerId" INTEGER REFERENCES "users"("id")"#));
    assert!(seen[2].sql.contains("INSERT INTO model_definitions"));

    let model = h.state.registry.get("Task").unwrap();
    let bound = seen[2]
        .params
        .iter()
        .find_map(|p| match p {
            PgBindValue::Json(v) => Some(v.clone()),
            _ => None,
        })
        .unwrap();
    let bound: ModelDefinition = serde_json::from_value(bound).unwrap();
    assert_eq!(bound, model.definition);
    assert_eq!(model.definition.rbac["Viewer"].len(), 1);
    assert!(!model.is_degraded());

    h.store.reply(vec![]);
    let (status, _) = call(&h, Method::GET, "/api/data/Task", Some(VIEWER), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn viewer_cannot_create_models() {
    let h = harness();
    let (status, body) = call(&h, Method::POST, "/api/models", Some(VIEWER), Some(task_submission())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
    assert!(h.store.seen().is_empty());
}

#[tokio::test]
async fn duplicate_model_is_rejected_before_ddl() {
    let h = harness();
    h.store.reply(vec![stored_row("Task", "tasks", task_definition())]);
    let (status, body) = call(&h, Method::POST, "/api/models", Some(ADMIN), Some(task_submission())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "model 'Task' already exists");
    assert_eq!(h.store.seen().len(), 1);
}

#[tokio::test]
async fn invalid_definitions_never_reach_the_store() {
    let h = harness();
    for bad in [
        json!({"name": "task", "fields": []}),
        json!({"name": "Task", "fields": [{"name": "id", "type": "integer"}]}),
        json!({"name": "Task", "fields": [{"name": "a", "type": "string"}, {"name": "A", "type": "text"}]}),
        json!({"name": "Task", "fields": [{"name": "x\"y", "type": "string"}]}),
        json!({"name": "Task", "fields": [{"name": "price", "type": "money"}]}),
        json!({"name": "Task", "fields": [{"name": "n", "type": "integer", "default": "many"}]}),
        json!({"name": "Task", "fields": [], "rbac": {"Viewer": []}}),
        json!({"fields": []}),
    ] {
        let (status, body) = call(&h, Method::POST, "/api/models", Some(ADMIN), Some(bad.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", bad);
        assert_eq!(body["error"]["code"], "validation_error");
    }
    assert!(h.store.seen().is_empty());
}

#[tokio::test]
async fn admin_deletes_model_and_its_routes_go_away() {
    let h = harness();
    register(&h, stored_row("Task", "tasks", task_definition()));

    let (status, _) = call(&h, Method::DELETE, "/api/models/Task", Some(MANAGER), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    h.store.reply(vec![stored_row("Task", "tasks", task_definition())]);
    let (status, body) = call(&h, Method::DELETE, "/api/models/Task", Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Task");

    let seen = h.store.seen();
    assert_eq!(seen[1].sql, r#"DROP TABLE IF EXISTS "tasks""#);
    assert!(seen[2].sql.starts_with("DELETE FROM model_definitions"));
    assert!(h.state.registry.get("Task").is_none());

    let (status, _) = call(&h, Method::GET, "/api/data/Task", Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_unknown_model_is_not_found() {
    let h = harness();
    let (status, _) = call(&h, Method::DELETE, "/api/models/Ghost", Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_flags_corrupt_definitions() {
    let h = harness();
    h.store.reply(vec![
        stored_row("Task", "tasks", task_definition()),
        stored_row("Broken", "brokens", json!(42)),
    ]);
    let (status, body) = call(&h, Method::GET, "/api/models", Some(VIEWER), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["data"][0]["definition"]["ownerField"], "ownerId");
    assert!(body["data"][0].get("degraded").is_none());
    assert!(body["data"][1]["degraded"].is_string());
    assert_eq!(body["data"][1]["definition"]["fields"], json!([]));

    let (status, _) = call(&h, Method::GET, "/api/models", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn get_model_by_name() {
    let h = harness();
    h.store.reply(vec![stored_row("Task", "tasks", task_definition())]);
    let (status, body) = call(&h, Method::GET, "/api/models/Task", Some(VIEWER), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Task");

    let (status, _) = call(&h, Method::GET, "/api/models/Ghost", Some(VIEWER), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn probes_need_no_credentials() {
    let h = harness();
    let (status, body) = call(&h, Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = call(&h, Method::GET, "/api/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "ok");

    let (_, body) = call(&h, Method::GET, "/api/version", None, None).await;
    assert_eq!(body["name"], "schemaforge");
}

#[tokio::test]
async fn malformed_model_body_is_an_enveloped_400_after_role_check() {
    let h = harness();
    let (status, body) = call_raw(&h, Method::POST, "/api/models", ADMIN, Some("application/json"), "{\"name\"").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");

    let (status, _) = call_raw(&h, Method::POST, "/api/models", VIEWER, Some("application/json"), "{\"name\"").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(h.store.seen().is_empty());
}
