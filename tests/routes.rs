//! Route registration: paths, methods, endpoint naming.

mod common;

use axum::http::StatusCode;
use axum::Router;
use common::{seeded, send, send_get, MemoryAccessor};
use restbind::{serve, Options};
use serde_json::json;
use std::sync::Arc;

// ── default paths ───────────────────────────────────────────────────────

#[tokio::test]
async fn registers_the_fixed_crud_route_set() {
    let (router, name) = serve(Router::new(), seeded(1), Options::new());
    assert_eq!(name, "Model");

    let (status, _, body) = send_get(router.clone(), "/api/v1/Model").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _, body) = send_get(router.clone(), "/api/v1/Model/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "doc1");

    let (status, _, body) = send_get(router.clone(), "/api/v1/Model/count").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (status, _, body) = send(
        router.clone(),
        "POST",
        "/api/v1/Model",
        Some(json!({"name": "new"})),
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "new");

    let (status, _, body) = send(
        router.clone(),
        "PUT",
        "/api/v1/Model/1",
        Some(json!({"name": "renamed"})),
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "renamed");

    let (status, _, body) = send(
        router.clone(),
        "PATCH",
        "/api/v1/Model/1",
        Some(json!({"name": "patched"})),
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "patched");

    let (status, _, body) = send_get(router.clone(), "/api/v1/Model/1/shallow").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "patched");

    let (status, _, _) = send(router, "DELETE", "/api/v1/Model/1", None, &[]).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn custom_prefix_and_version() {
    let (router, _) = serve(
        Router::new(),
        seeded(1),
        Options::new().prefix("/rest").version("/v2"),
    );
    let (status, _, _) = send_get(router.clone(), "/rest/v2/Model").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = send_get(router, "/api/v1/Model").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn explicit_name_overrides_accessor_name() {
    let (router, name) = serve(Router::new(), seeded(1), Options::new().name("people"));
    assert_eq!(name, "people");
    let (status, _, _) = send_get(router, "/api/v1/people").await;
    assert_eq!(status, StatusCode::OK);
}

// ── identifier token in the version segment ─────────────────────────────

#[tokio::test]
async fn id_token_in_version_moves_the_identifier_location() {
    let (router, _) = serve(
        Router::new(),
        seeded(2),
        Options::new().version("/v1/Entities/:id"),
    );

    let (status, _, body) = send_get(router.clone(), "/api/v1/Entities/Model").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, _, body) = send_get(router, "/api/v1/Entities/2/Model").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "doc2");
}

// ── custom identifier property ──────────────────────────────────────────

#[tokio::test]
async fn custom_id_property_drives_lookup() {
    let accessor = Arc::new(MemoryAccessor::new("Model").with_docs(vec![
        json!({"_id": "1", "slug": "alpha", "name": "a"}),
        json!({"_id": "2", "slug": "beta", "name": "b"}),
    ]));
    let (router, _) = serve(
        Router::new(),
        accessor,
        Options::new().id_property("slug"),
    );
    let (status, _, body) = send_get(router.clone(), "/api/v1/Model/beta").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "b");
    let (status, _, _) = send_get(router, "/api/v1/Model/2").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_document_is_not_found() {
    let (router, _) = serve(Router::new(), seeded(1), Options::new());
    let (status, _, body) = send_get(router, "/api/v1/Model/99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn two_endpoints_coexist_on_one_router() {
    let users = Arc::new(MemoryAccessor::new("User").with_docs(vec![json!({"_id": "1"})]));
    let posts = Arc::new(MemoryAccessor::new("Post").with_docs(vec![json!({"_id": "1"})]));
    let (router, _) = serve(Router::new(), users, Options::new());
    let (router, _) = serve(router, posts, Options::new());

    let (status, _, _) = send_get(router.clone(), "/api/v1/User/1").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = send_get(router, "/api/v1/Post/1").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn shallow_flattens_nested_objects() {
    let accessor = Arc::new(MemoryAccessor::new("Model").with_docs(vec![
        json!({"_id": "1", "name": "a", "meta": {"deep": 1}, "tags": ["x"]}),
    ]));
    let (router, _) = serve(Router::new(), accessor, Options::new());
    let (_, _, body) = send_get(router, "/api/v1/Model/1/shallow").await;
    assert_eq!(body, json!({"_id": "1", "name": "a", "meta": true, "tags": ["x"]}));
}
