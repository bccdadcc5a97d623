//! Per-request state threaded through the pipeline.

use crate::accessor::FindArgs;
use crate::filter::Filter;
use crate::visibility::Visibility;
use axum::{
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

/// Unfiltered output of the core operation, readable by post-hooks and the
/// output stage.
#[derive(Clone, Debug)]
pub enum RestResult {
    One(Value),
    Many(Vec<Value>),
    Count(u64),
}

impl RestResult {
    pub fn to_value(&self) -> Value {
        match self {
            RestResult::One(doc) => doc.clone(),
            RestResult::Many(docs) => Value::Array(docs.clone()),
            RestResult::Count(n) => serde_json::json!({ "count": n }),
        }
    }
}

/// Response under construction: status, headers, and an optional JSON body.
#[derive(Debug)]
pub struct ResponseParts {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl Default for ResponseParts {
    fn default() -> Self {
        ResponseParts {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

/// State owned by exactly one request. Created by the handler, mutated by the
/// pipeline stages and hooks, converted into the response at the end, then
/// dropped.
#[derive(Debug)]
pub struct RequestContext {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    /// Identifier from the item path, when the route has one.
    pub id: Option<String>,
    /// Raw query-string parameters.
    pub params: HashMap<String, String>,
    /// Parsed request body for create/update.
    pub body: Option<Value>,
    /// Effective visibility; `Public` until the access stage resolves it.
    pub visibility: Visibility,
    /// Query filter; client `query` parameter first, narrowed by
    /// `context_filter`.
    pub filter: Filter,
    /// Pagination/sort/projection parsed from the query string.
    pub find: FindArgs,
    /// Target document, fetched ahead of the pre-hook for update/delete when
    /// the atomic path is disabled. Hook mutations here flow into `save`.
    pub document: Option<Value>,
    /// Unfiltered operation output.
    pub result: Option<RestResult>,
    /// Visibility-filtered payload handed to the output stage.
    pub filtered: Option<Value>,
    pub response: ResponseParts,
    halted: bool,
}

impl RequestContext {
    pub fn new(
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        params: HashMap<String, String>,
    ) -> Self {
        RequestContext {
            method,
            uri,
            headers,
            id: None,
            params,
            body: None,
            visibility: Visibility::Public,
            filter: Filter::new(),
            find: FindArgs::default(),
            document: None,
            result: None,
            filtered: None,
            response: ResponseParts::default(),
            halted: false,
        }
    }

    pub fn with_id(mut self, id: String) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Stop the pipeline after the current hook; the response is whatever the
    /// hook has written. Used by `pre_middleware` for auth short-circuits.
    pub fn halt(&mut self) {
        self.halted = true;
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Write a status and JSON body in one step.
    pub fn respond(&mut self, status: StatusCode, body: Value) {
        self.response.status = status;
        self.response.body = Some(body);
    }

    pub fn set_response_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.response.headers.insert(name, value);
    }

    /// Consume the accumulated response parts into an axum response.
    pub fn take_response(&mut self) -> Response {
        let parts = std::mem::take(&mut self.response);
        let mut resp = match parts.body {
            Some(body) => (parts.status, Json(body)).into_response(),
            None => parts.status.into_response(),
        };
        resp.headers_mut().extend(parts.headers);
        resp
    }
}
