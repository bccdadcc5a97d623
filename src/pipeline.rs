//! The request-lifecycle driver.
//!
//! Stage order, strict, for every operation: `pre_middleware` → operation
//! pre-hook → `context_filter` → `access` → core operation → field filtering
//! → operation post-hook → `output_fn` → `post_process`. Any failing stage
//! short-circuits into `on_error`. `post_process` has a weak ordering
//! guarantee only: work spawned but not awaited by the output stage may still
//! be running when it fires.

use crate::context::{RequestContext, RestResult};
use crate::error::RestError;
use crate::filter::Filter;
use crate::hooks::Middleware;
use crate::output::{default_error, default_output, writer_for};
use crate::query;
use crate::state::EndpointState;
use crate::visibility::{filter_fields, shallow};
use axum::http::{HeaderValue, StatusCode};
use axum::response::Response;
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    List,
    Read,
    Shallow,
    Count,
    Create,
    Update,
    Delete,
}

impl Operation {
    fn pre_hooks<'a>(&self, state: &'a EndpointState) -> &'a [Arc<dyn Middleware>] {
        let hooks = &state.options.hooks;
        match self {
            Operation::Create => &hooks.pre_create,
            Operation::List | Operation::Read | Operation::Shallow | Operation::Count => {
                &hooks.pre_read
            }
            Operation::Update => &hooks.pre_update,
            Operation::Delete => &hooks.pre_delete,
        }
    }

    fn post_hooks<'a>(&self, state: &'a EndpointState) -> &'a [Arc<dyn Middleware>] {
        let hooks = &state.options.hooks;
        match self {
            Operation::Create => &hooks.post_create,
            Operation::List | Operation::Read | Operation::Shallow | Operation::Count => {
                &hooks.post_read
            }
            Operation::Update => &hooks.post_update,
            Operation::Delete => &hooks.post_delete,
        }
    }

    /// Update/delete on the fetch-and-save path need the target document
    /// before their pre-hook runs.
    fn needs_document(&self, state: &EndpointState) -> bool {
        match self {
            Operation::Update => !state.options.find_one_and_update,
            Operation::Delete => !state.options.find_one_and_remove,
            _ => false,
        }
    }
}

/// Run one request through the pipeline and produce the response.
pub async fn run(state: &EndpointState, op: Operation, mut ctx: RequestContext) -> Response {
    match drive(state, op, &mut ctx).await {
        Ok(()) => ctx.take_response(),
        Err(err) => {
            tracing::error!(op = ?op, error = %err, "pipeline error");
            match &state.options.hooks.on_error {
                Some(handler) => handler.handle(&mut ctx, &err).await,
                None => default_error(writer_for(state.options.restify), &mut ctx, &err),
            }
            ctx.take_response()
        }
    }
}

async fn drive(
    state: &EndpointState,
    op: Operation,
    ctx: &mut RequestContext,
) -> Result<(), RestError> {
    let opts = &state.options;

    // The query string is parsed before the first stage so pre-hooks can
    // inspect the client filter; a malformed query or a rejected regex
    // short-circuits like any other failure.
    let (client_filter, find) = query::parse(&ctx.params, opts.allow_regex)?;
    ctx.filter = client_filter;
    ctx.find = find;

    // 1. preMiddleware
    for hook in &opts.hooks.pre_middleware {
        hook.call(ctx).await?;
        if ctx.is_halted() {
            return Ok(());
        }
    }

    // 2. operation pre-hook, with the target document on the slow path
    if op.needs_document(state) {
        let id = require_id(ctx)?;
        let lookup = Filter::eq(&opts.id_property, Value::String(id.clone()));
        let doc = state
            .accessor
            .find_one(&lookup, &opts.read_options())
            .await?
            .ok_or(RestError::NotFound(id))?;
        ctx.document = Some(doc);
    }
    for hook in op.pre_hooks(state) {
        hook.call(ctx).await?;
        if ctx.is_halted() {
            return Ok(());
        }
    }

    // 3. contextFilter
    if let Some(cf) = &opts.hooks.context_filter {
        let current = std::mem::take(&mut ctx.filter);
        let narrowed = cf.filter(state.accessor.as_ref(), ctx, current).await?;
        ctx.filter = narrowed;
    }

    // 4. access
    if let Some(access) = &opts.hooks.access {
        ctx.visibility = access.resolve(ctx).await?;
    }

    // 5. core operation
    core_operation(state, op, ctx).await?;

    // 6. field filtering, on the output copy only
    ctx.filtered = filtered_payload(state, op, ctx);

    // 7. operation post-hook: unfiltered result on the context
    for hook in op.post_hooks(state) {
        hook.call(ctx).await?;
    }

    // 8. output
    match &opts.hooks.output_fn {
        Some(output) => output.call(ctx).await?,
        None => default_output(writer_for(opts.restify), ctx),
    }

    // 9. postProcess, weak ordering with respect to spawned output work
    if let Some(post) = &opts.hooks.post_process {
        (post.as_ref())(ctx);
    }
    Ok(())
}

async fn core_operation(
    state: &EndpointState,
    op: Operation,
    ctx: &mut RequestContext,
) -> Result<(), RestError> {
    let opts = &state.options;
    let accessor = state.accessor.as_ref();
    tracing::debug!(op = ?op, filter = ?ctx.filter, "core operation");

    match op {
        Operation::List => {
            let rows = accessor
                .find(&ctx.filter, &ctx.find, &opts.read_options())
                .await?;
            if let Some(header) = opts.count_header_name() {
                // total ignores limit/skip: count takes the filter only
                let total = accessor.count(&ctx.filter).await?;
                if let Ok(value) = HeaderValue::from_str(&total.to_string()) {
                    ctx.set_response_header(header, value);
                }
            }
            ctx.result = Some(RestResult::Many(rows));
            ctx.response.status = StatusCode::OK;
        }
        Operation::Read | Operation::Shallow => {
            let id = require_id(ctx)?;
            let lookup =
                Filter::eq(&opts.id_property, Value::String(id.clone())).and(ctx.filter.clone());
            let doc = accessor
                .find_one(&lookup, &opts.read_options())
                .await?
                .ok_or(RestError::NotFound(id))?;
            ctx.result = Some(RestResult::One(doc));
            ctx.response.status = StatusCode::OK;
        }
        Operation::Count => {
            let n = accessor.count(&ctx.filter).await?;
            ctx.result = Some(RestResult::Count(n));
            ctx.response.status = StatusCode::OK;
        }
        Operation::Create => {
            let body = require_object_body(ctx)?;
            let doc = accessor.create(Value::Object(body)).await?;
            ctx.result = Some(RestResult::One(doc));
            ctx.response.status = StatusCode::CREATED;
        }
        Operation::Update => {
            let id = require_id(ctx)?;
            let patch = require_object_body(ctx)?;
            let scoped =
                Filter::eq(&opts.id_property, Value::String(id.clone())).and(ctx.filter.clone());
            let doc = if opts.find_one_and_update {
                accessor
                    .find_one_and_update(&scoped, Value::Object(patch), &opts.write_options())
                    .await?
                    .ok_or(RestError::NotFound(id))?
            } else {
                // the document was fetched before the pre-hook; re-validate
                // against the narrowed filter so scoping is never bypassed
                if accessor
                    .find_one(&scoped, &opts.read_options())
                    .await?
                    .is_none()
                {
                    return Err(RestError::NotFound(id));
                }
                let current = ctx
                    .document
                    .take()
                    .ok_or_else(|| RestError::Hook("target document missing".into()))?;
                accessor.save(merge_patch(current, patch)).await?
            };
            ctx.result = Some(RestResult::One(doc));
            ctx.response.status = StatusCode::OK;
        }
        Operation::Delete => {
            let id = require_id(ctx)?;
            let scoped =
                Filter::eq(&opts.id_property, Value::String(id.clone())).and(ctx.filter.clone());
            if opts.find_one_and_remove {
                accessor
                    .find_one_and_remove(&scoped)
                    .await?
                    .ok_or(RestError::NotFound(id))?;
            } else {
                if accessor
                    .find_one(&scoped, &opts.read_options())
                    .await?
                    .is_none()
                {
                    return Err(RestError::NotFound(id));
                }
                let doc = ctx
                    .document
                    .take()
                    .ok_or_else(|| RestError::Hook("target document missing".into()))?;
                accessor.remove(&doc).await?;
            }
            ctx.result = None;
            ctx.response.status = StatusCode::NO_CONTENT;
        }
    }
    Ok(())
}

/// Visibility-filtered output payload. The unfiltered result stays on the
/// context for post-hooks.
fn filtered_payload(state: &EndpointState, op: Operation, ctx: &RequestContext) -> Option<Value> {
    match &ctx.result {
        Some(RestResult::One(doc)) => {
            let out = filter_fields(doc, &state.access_tags, ctx.visibility);
            Some(if op == Operation::Shallow {
                shallow(&out)
            } else {
                out
            })
        }
        Some(RestResult::Many(rows)) => Some(filter_fields(
            &Value::Array(rows.clone()),
            &state.access_tags,
            ctx.visibility,
        )),
        Some(RestResult::Count(n)) => Some(serde_json::json!({ "count": n })),
        None => None,
    }
}

fn require_id(ctx: &RequestContext) -> Result<String, RestError> {
    ctx.id
        .clone()
        .ok_or_else(|| RestError::BadRequest("missing identifier".into()))
}

fn require_object_body(ctx: &mut RequestContext) -> Result<Map<String, Value>, RestError> {
    match ctx.body.clone() {
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(RestError::Validation("body must be a JSON object".into())),
        None => Err(RestError::BadRequest("missing request body".into())),
    }
}

/// Shallow merge of patch keys onto a fetched document, for the
/// fetch-mutate-save update path.
fn merge_patch(doc: Value, patch: Map<String, Value>) -> Value {
    match doc {
        Value::Object(mut map) => {
            for (k, v) in patch {
                map.insert(k, v);
            }
            Value::Object(map)
        }
        other => other,
    }
}
