//! End-to-end tests of the REST surface, driven through the axum router over
//! the in-memory storage backend.

use api_lib::config::Config;
use api_lib::web::{router, AppState};
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use doodle_notes_core::ReadPolicy;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app_with(config: Config) -> Router {
    let config = Arc::new(config);
    router(Arc::new(AppState::in_memory(config)))
}

fn app() -> Router {
    app_with(Config::in_memory())
}

async fn send(app: &Router, method: &str, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}

/// Signs a user up and returns the `session=...` cookie pair.
async fn signup(app: &Router, username: &str) -> String {
    let response = send(
        app,
        "POST",
        "/users/signup",
        None,
        Some(json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "hunter22",
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    set_cookie.split(';').next().unwrap().to_string()
}

async fn create_note(app: &Router, cookie: &str, title: &str) -> Value {
    let response = send(
        app,
        "POST",
        "/notes",
        Some(cookie),
        Some(json!({ "title": title, "image": "data:image/png;base64,AAAA" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await
}

#[tokio::test]
async fn create_then_read_round_trips() {
    let app = app();
    let alice = signup(&app, "alice").await;
    let me = json_body(send(&app, "GET", "/users", Some(alice.as_str()), None).await).await;

    let created = create_note(&app, &alice, "T").await;
    assert_eq!(created["owner_id"], me["user_id"]);

    let uri = format!("/notes/{}", created["id"].as_str().unwrap());
    let response = send(&app, "GET", &uri, None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let read = json_body(response).await;
    assert_eq!(read["title"], "T");
    assert_eq!(read["image"], "data:image/png;base64,AAAA");
    assert_eq!(read["owner_id"], me["user_id"]);
}

#[tokio::test]
async fn anonymous_create_is_rejected_before_field_checks() {
    let app = app();
    let response = send(&app, "POST", "/notes", None, Some(json!({ "title": "" }))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "User not authenticated");
}

#[tokio::test]
async fn missing_fields_are_bad_requests() {
    let app = app();
    let alice = signup(&app, "alice").await;

    let response = send(&app, "POST", "/notes", Some(alice.as_str()), Some(json!({ "title": "", "image": "x" }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Note must have a title");

    // the legacy `img` field name is accepted
    let response = send(&app, "POST", "/notes", Some(alice.as_str()), Some(json!({ "title": "t", "img": "x" }))).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(&app, "POST", "/notes", Some(alice.as_str()), Some(json!({ "title": "t" }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Note must have a doodle");

    let listed = json_body(send(&app, "GET", "/notes/mine", Some(alice.as_str()), None).await).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn only_the_owner_may_update_or_delete() {
    let app = app();
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;
    let note = create_note(&app, &alice, "mine").await;
    let uri = format!("/notes/{}", note["id"].as_str().unwrap());
    let change = json!({ "title": "stolen", "image": "x" });

    let response = send(&app, "PATCH", &uri, Some(bob.as_str()), Some(change.clone())).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "You cannot access this note");

    let response = send(&app, "DELETE", &uri, Some(bob.as_str()), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(&app, "PATCH", &uri, Some(alice.as_str()), Some(json!({ "title": "new", "image": "y" }))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = json_body(response).await;
    assert_eq!(updated["title"], "new");
    assert_eq!(updated["id"], note["id"]);

    let response = send(&app, "DELETE", &uri, Some(alice.as_str()), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, "DELETE", &uri, Some(alice.as_str()), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"], "Note not found");
}

#[tokio::test]
async fn malformed_and_unknown_ids() {
    let app = app();
    let alice = signup(&app, "alice").await;

    let response = send(&app, "GET", "/notes/12345", None, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Invalid note id");

    let unknown = format!("/notes/{}", uuid::Uuid::new_v4());
    let response = send(&app, "PATCH", &unknown, Some(alice.as_str()), Some(json!({ "title": "t", "image": "i" }))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listings_paginate_and_report_totals() {
    let app = app();
    let alice = signup(&app, "alice").await;
    for i in 0..12 {
        create_note(&app, &alice, &format!("note {}", i)).await;
    }

    let response = send(&app, "GET", "/notes?page=2&limit=5", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-total-count"], "12");
    assert_eq!(response.headers()["x-page"], "2");
    let titles: Vec<String> = json_body(response)
        .await
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, ["note 5", "note 6", "note 7", "note 8", "note 9"]);

    // garbage paging values fall back to page 1, limit 5
    let response = send(&app, "GET", "/notes?page=abc&limit=-1", None, None).await;
    assert_eq!(response.headers()["x-limit"], "5");
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 5);

    let response = send(&app, "GET", "/notes?page=99", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(json_body(response).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn scoped_listings() {
    let app = app();
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;
    create_note(&app, &alice, "a").await;
    create_note(&app, &bob, "b1").await;
    create_note(&app, &bob, "b2").await;

    let response = send(&app, "GET", "/notes/mine", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let mine = json_body(send(&app, "GET", "/notes/mine", Some(bob.as_str()), None).await).await;
    assert_eq!(mine.as_array().unwrap().len(), 2);

    let response = send(&app, "GET", "/notes/user/ALICE", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let hers = json_body(response).await;
    assert_eq!(hers.as_array().unwrap().len(), 1);
    assert_eq!(hers[0]["title"], "a");

    let response = send(&app, "GET", "/notes/user/carol", None, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"], "User not found");
}

#[tokio::test]
async fn owner_only_policy_hides_other_users_notes() {
    let mut config = Config::in_memory();
    config.read_policy = ReadPolicy::OwnerOnly;
    let app = app_with(config);
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;
    let note = create_note(&app, &alice, "private").await;
    let uri = format!("/notes/{}", note["id"].as_str().unwrap());

    assert_eq!(send(&app, "GET", &uri, Some(alice.as_str()), None).await.status(), StatusCode::OK);
    assert_eq!(send(&app, "GET", &uri, Some(bob.as_str()), None).await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(send(&app, "GET", &uri, None, None).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_logout_and_duplicate_signup() {
    let app = app();
    signup(&app, "alice").await;

    let response = send(
        &app,
        "POST",
        "/users/signup",
        None,
        Some(json!({ "username": "Alice", "email": "other@example.com", "password": "pw" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = send(&app, "POST", "/users/login", None, Some(json!({ "username": "alice", "password": "wrong" }))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(&app, "POST", "/users/login", None, Some(json!({ "username": "alice" }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, "POST", "/users/login", None, Some(json!({ "username": "ALICE", "password": "hunter22" }))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();

    let me = json_body(send(&app, "GET", "/users", Some(cookie.as_str()), None).await).await;
    assert_eq!(me["username"], "alice");
    assert!(me.get("hashed_password").is_none());

    let by_id = format!("/users/{}", me["user_id"].as_str().unwrap());
    assert_eq!(send(&app, "GET", &by_id, None, None).await.status(), StatusCode::OK);
    assert_eq!(send(&app, "GET", "/users/not-a-uuid", None, None).await.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, "POST", "/users/logout", Some(cookie.as_str()), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(send(&app, "GET", "/users", Some(cookie.as_str()), None).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unreadable_bodies_do_not_jump_the_validation_order() {
    let app = app();

    // no body and no content type
    let response = send(&app, "POST", "/notes", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "User not authenticated");

    // wrongly typed field on a malformed id
    let response = send(&app, "PATCH", "/notes/bad", None, Some(json!({ "title": 5 }))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "User not authenticated");

    let alice = signup(&app, "alice").await;
    let response = send(&app, "PATCH", "/notes/bad", Some(alice.as_str()), Some(json!({ "title": 5 }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Invalid note id");

    let response = send(&app, "POST", "/notes", Some(alice.as_str()), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Note must have a title");
}
