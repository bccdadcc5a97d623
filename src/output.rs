//! Response-writer adapters and the default output/error stages.
//!
//! The pipeline never touches the wire format directly; it goes through a
//! [`ResponseWriter`], one implementation per supported host-framework
//! convention. The `restify` option selects the restify-style writer, whose
//! observable difference is that every response carries a JSON body — an
//! empty delete becomes `200 {}` instead of `204` with no body.

use crate::context::{RequestContext, ResponseParts};
use crate::error::{error_body, RestError};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use serde_json::Value;

/// Minimal surface the pipeline needs from a response convention.
pub trait ResponseWriter: Send + Sync {
    fn set_status(&self, parts: &mut ResponseParts, status: StatusCode);
    fn set_header(&self, parts: &mut ResponseParts, name: HeaderName, value: HeaderValue);
    fn send_json(&self, parts: &mut ResponseParts, body: Value);
    /// Finish a response that has no payload.
    fn send_empty(&self, parts: &mut ResponseParts);
}

/// Standard convention: status codes as computed, empty responses stay empty.
pub struct StandardWriter;

impl ResponseWriter for StandardWriter {
    fn set_status(&self, parts: &mut ResponseParts, status: StatusCode) {
        parts.status = status;
    }

    fn set_header(&self, parts: &mut ResponseParts, name: HeaderName, value: HeaderValue) {
        parts.headers.insert(name, value);
    }

    fn send_json(&self, parts: &mut ResponseParts, body: Value) {
        parts.body = Some(body);
    }

    fn send_empty(&self, parts: &mut ResponseParts) {
        parts.body = None;
    }
}

/// Restify-style convention: a body on every response.
pub struct RestifyWriter;

impl ResponseWriter for RestifyWriter {
    fn set_status(&self, parts: &mut ResponseParts, status: StatusCode) {
        parts.status = status;
    }

    fn set_header(&self, parts: &mut ResponseParts, name: HeaderName, value: HeaderValue) {
        parts.headers.insert(name, value);
    }

    fn send_json(&self, parts: &mut ResponseParts, body: Value) {
        parts.body = Some(body);
    }

    fn send_empty(&self, parts: &mut ResponseParts) {
        if parts.status == StatusCode::NO_CONTENT {
            parts.status = StatusCode::OK;
        }
        parts.body = Some(Value::Object(serde_json::Map::new()));
    }
}

pub fn writer_for(restify: bool) -> &'static dyn ResponseWriter {
    if restify {
        &RestifyWriter
    } else {
        &StandardWriter
    }
}

/// Default output stage: serialize the filtered payload under the status the
/// core operation chose.
pub fn default_output(writer: &dyn ResponseWriter, ctx: &mut RequestContext) {
    match ctx.filtered.take() {
        Some(Value::Null) | None => writer.send_empty(&mut ctx.response),
        Some(body) => writer.send_json(&mut ctx.response, body),
    }
}

/// Default error output: status from the error kind, sanitized body. Internal
/// detail stays in the logs.
pub fn default_error(writer: &dyn ResponseWriter, ctx: &mut RequestContext, err: &RestError) {
    writer.set_status(&mut ctx.response, err.status());
    writer.send_json(
        &mut ctx.response,
        serde_json::to_value(error_body(err)).unwrap_or(Value::Null),
    );
}
