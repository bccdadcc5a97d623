//! axum handlers, one per registered operation. Each builds the request
//! context and hands off to the pipeline.

use crate::context::RequestContext;
use crate::pipeline::{self, Operation};
use crate::state::EndpointState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, Method, Uri},
    response::Response,
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

fn context(
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    params: HashMap<String, String>,
) -> RequestContext {
    RequestContext::new(method, uri, headers, params)
}

/// Identifier from the matched path. The item route always carries an `id`
/// token, either appended or inherited from prefix/version.
fn path_id(path: &HashMap<String, String>) -> String {
    path.get("id").cloned().unwrap_or_default()
}

pub async fn list(
    State(state): State<EndpointState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let ctx = context(method, uri, headers, params);
    pipeline::run(&state, Operation::List, ctx).await
}

pub async fn count(
    State(state): State<EndpointState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let ctx = context(method, uri, headers, params);
    pipeline::run(&state, Operation::Count, ctx).await
}

pub async fn read(
    State(state): State<EndpointState>,
    Path(path): Path<HashMap<String, String>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let ctx = context(method, uri, headers, params).with_id(path_id(&path));
    pipeline::run(&state, Operation::Read, ctx).await
}

pub async fn shallow(
    State(state): State<EndpointState>,
    Path(path): Path<HashMap<String, String>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let ctx = context(method, uri, headers, params).with_id(path_id(&path));
    pipeline::run(&state, Operation::Shallow, ctx).await
}

pub async fn create(
    State(state): State<EndpointState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    let ctx = context(method, uri, headers, params).with_body(body);
    pipeline::run(&state, Operation::Create, ctx).await
}

pub async fn update(
    State(state): State<EndpointState>,
    Path(path): Path<HashMap<String, String>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    let ctx = context(method, uri, headers, params)
        .with_id(path_id(&path))
        .with_body(body);
    pipeline::run(&state, Operation::Update, ctx).await
}

pub async fn delete(
    State(state): State<EndpointState>,
    Path(path): Path<HashMap<String, String>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let ctx = context(method, uri, headers, params).with_id(path_id(&path));
    pipeline::run(&state, Operation::Delete, ctx).await
}
