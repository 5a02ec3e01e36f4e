//! Shared harness: an in-memory database behind the real router, and tokens
//! minted with the same secret the app verifies with.

#![allow(dead_code)]

use std::time::{SystemTime, UNIX_EPOCH};

use api::auth::Claims;
use api::{router, ApiConfig, AppState};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;
use tower::ServiceExt;

pub const SECRET: &str = "integration-secret";

pub async fn test_app() -> Router {
    let pool = db::pool::connect_in_memory().await.expect("in-memory database");
    let config = ApiConfig::load(SECRET.to_string(), None).expect("config");
    router(AppState::from_config(pool, config))
}

pub fn token(roles: &[&str]) -> String {
    let exp = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() + 900;
    let claims = Claims {
        sub: "tester".into(),
        roles: roles.iter().map(|r| r.to_string()).collect(),
        exp,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

pub fn admin() -> String {
    token(&["admin"])
}

/// Send one request and return the status with the decoded JSON body
/// (`Value::Null` when the body is empty).
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(bearer) = bearer {
        request = request.header(header::AUTHORIZATION, format!("Bearer {bearer}"));
    }
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// A workflow body whose `start` names no action.
pub fn placeholder_workflow(name: &str) -> Value {
    serde_json::json!({ "name": name, "start": "a1", "actions": [], "branches": [] })
}

/// Two actions `a` → `b`, where `b` takes `a`'s result as an argument.
pub fn wired_workflow(name: &str) -> Value {
    serde_json::json!({
        "name": name,
        "start": "a",
        "actions": [
            { "id": "a", "name": "first", "app_name": "Utilities", "action_name": "echo" },
            {
                "id": "b",
                "name": "second",
                "app_name": "Utilities",
                "action_name": "echo",
                "arguments": [{ "name": "data", "reference": "a" }]
            }
        ],
        "branches": [{ "id": "ab", "source_id": "a", "destination_id": "b" }]
    })
}

/// Create a playbook through the API and return its JSON.
pub async fn create_playbook(app: &Router, name: &str, workflows: Vec<Value>) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/playbooks",
        Some(&admin()),
        Some(serde_json::json!({ "name": name, "workflows": workflows })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

pub fn id_of(value: &Value) -> String {
    value["id"].as_str().expect("id").to_string()
}
