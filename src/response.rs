//! Standard response envelope helpers: `{success, data, ...metadata}`.

use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
    #[serde(flatten)]
    pub meta: Meta,
}

/// Optional metadata flattened next to `data`.
#[derive(Serialize, Default, Debug, Clone, PartialEq)]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    /// Set when the model is served from its restrictive fallback definition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<bool>,
}

impl Meta {
    pub fn message(message: impl Into<String>) -> Self {
        Meta {
            message: Some(message.into()),
            ..Meta::default()
        }
    }

    pub fn degraded(mut self, degraded: bool) -> Self {
        self.degraded = degraded.then_some(true);
        self
    }
}

pub fn success_one<T: Serialize>(data: T, meta: Meta) -> (StatusCode, Json<Envelope<T>>) {
    (
        StatusCode::CREATED,
        Json(Envelope {
            success: true,
            data,
            meta,
        }),
    )
}

pub fn success_one_ok<T: Serialize>(data: T, meta: Meta) -> (StatusCode, Json<Envelope<T>>) {
    (
        StatusCode::OK,
        Json(Envelope {
            success: true,
            data,
            meta,
        }),
    )
}

pub fn success_many<T: Serialize>(data: Vec<T>, meta: Meta) -> (StatusCode, Json<Envelope<Vec<T>>>) {
    let total = data.len() as u64;
    (
        StatusCode::OK,
        Json(Envelope {
            success: true,
            data,
            meta: Meta {
                total: Some(total),
                ..meta
            },
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn metadata_is_flattened_and_omitted_when_empty() {
        let (status, Json(body)) = success_many(vec![json!({"id": 1})], Meta::default());
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({"success": true, "data": [{"id": 1}], "total": 1})
        );

        let (_, Json(body)) = success_one(json!({}), Meta::message("created").degraded(true));
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({"success": true, "data": {}, "message": "created", "degraded": true})
        );
    }
}
