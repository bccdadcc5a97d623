//! Caller-supplied hooks invoked at fixed pipeline stages.
//!
//! Each hook is an async-capable trait object. Plain closures get blanket
//! implementations for the synchronous form; hooks that need to await
//! (external authorization, audit sinks) implement the trait on their own
//! type with `#[async_trait]`. The pipeline awaits every hook strictly before
//! advancing, so a hook that never completes hangs its request — callers
//! needing bounded latency wrap their own timeout around the hook body.

use crate::accessor::DataAccessor;
use crate::context::RequestContext;
use crate::error::RestError;
use crate::filter::Filter;
use crate::visibility::Visibility;
use async_trait::async_trait;
use std::sync::Arc;

/// Request middleware: `pre_*`, `post_*`, and the output stage all share this
/// shape. Mutate the context, or fail to short-circuit into `on_error`.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn call(&self, ctx: &mut RequestContext) -> Result<(), RestError>;
}

#[async_trait]
impl<F> Middleware for F
where
    F: Fn(&mut RequestContext) -> Result<(), RestError> + Send + Sync,
{
    async fn call(&self, ctx: &mut RequestContext) -> Result<(), RestError> {
        (self)(ctx)
    }
}

/// Resolves the effective visibility for a request. The synchronous form is a
/// plain closure returning a value; the asynchronous form is a manual trait
/// implementation whose future the pipeline awaits.
#[async_trait]
pub trait AccessResolver: Send + Sync {
    async fn resolve(&self, ctx: &RequestContext) -> Result<Visibility, RestError>;
}

#[async_trait]
impl<F> AccessResolver for F
where
    F: Fn(&RequestContext) -> Result<Visibility, RestError> + Send + Sync,
{
    async fn resolve(&self, ctx: &RequestContext) -> Result<Visibility, RestError> {
        (self)(ctx)
    }
}

/// Request-specific narrowing of the query (tenant scoping and the like).
/// Receives the accessor, the context, and the filter so far; returns the
/// filter the core operation will use.
#[async_trait]
pub trait ContextFilter: Send + Sync {
    async fn filter(
        &self,
        accessor: &dyn DataAccessor,
        ctx: &RequestContext,
        filter: Filter,
    ) -> Result<Filter, RestError>;
}

#[async_trait]
impl<F> ContextFilter for F
where
    F: Fn(&dyn DataAccessor, &RequestContext, Filter) -> Result<Filter, RestError> + Send + Sync,
{
    async fn filter(
        &self,
        accessor: &dyn DataAccessor,
        ctx: &RequestContext,
        filter: Filter,
    ) -> Result<Filter, RestError> {
        (self)(accessor, ctx, filter)
    }
}

/// Replacement for the default error output. Writes the response for `err`
/// into the context; the sanitized default is used when absent.
#[async_trait]
pub trait ErrorHandler: Send + Sync {
    async fn handle(&self, ctx: &mut RequestContext, err: &RestError);
}

#[async_trait]
impl<F> ErrorHandler for F
where
    F: Fn(&mut RequestContext, &RestError) + Send + Sync,
{
    async fn handle(&self, ctx: &mut RequestContext, err: &RestError) {
        (self)(ctx, err)
    }
}

/// Fire-and-forget observability hook, called after the output stage returns.
/// Weak ordering: work spawned but not awaited inside the output stage may
/// still be running when this fires.
pub type PostProcess = Arc<dyn Fn(&RequestContext) + Send + Sync>;

/// The full hook set of one endpoint. Empty/absent entries are skipped by the
/// pipeline.
#[derive(Clone, Default)]
pub struct Hooks {
    pub pre_middleware: Vec<Arc<dyn Middleware>>,
    pub pre_create: Vec<Arc<dyn Middleware>>,
    pub pre_read: Vec<Arc<dyn Middleware>>,
    pub pre_update: Vec<Arc<dyn Middleware>>,
    pub pre_delete: Vec<Arc<dyn Middleware>>,
    pub context_filter: Option<Arc<dyn ContextFilter>>,
    pub access: Option<Arc<dyn AccessResolver>>,
    pub post_create: Vec<Arc<dyn Middleware>>,
    pub post_read: Vec<Arc<dyn Middleware>>,
    pub post_update: Vec<Arc<dyn Middleware>>,
    pub post_delete: Vec<Arc<dyn Middleware>>,
    pub output_fn: Option<Arc<dyn Middleware>>,
    pub post_process: Option<PostProcess>,
    pub on_error: Option<Arc<dyn ErrorHandler>>,
}

impl Hooks {
    /// Shallow merge: any slot set here wins over the corresponding slot in
    /// `base`.
    pub fn merged_over(&self, base: &Hooks) -> Hooks {
        fn pick_vec(a: &[Arc<dyn Middleware>], b: &[Arc<dyn Middleware>]) -> Vec<Arc<dyn Middleware>> {
            if a.is_empty() { b.to_vec() } else { a.to_vec() }
        }
        Hooks {
            pre_middleware: pick_vec(&self.pre_middleware, &base.pre_middleware),
            pre_create: pick_vec(&self.pre_create, &base.pre_create),
            pre_read: pick_vec(&self.pre_read, &base.pre_read),
            pre_update: pick_vec(&self.pre_update, &base.pre_update),
            pre_delete: pick_vec(&self.pre_delete, &base.pre_delete),
            context_filter: self.context_filter.clone().or_else(|| base.context_filter.clone()),
            access: self.access.clone().or_else(|| base.access.clone()),
            post_create: pick_vec(&self.post_create, &base.post_create),
            post_read: pick_vec(&self.post_read, &base.post_read),
            post_update: pick_vec(&self.post_update, &base.post_update),
            post_delete: pick_vec(&self.post_delete, &base.post_delete),
            output_fn: self.output_fn.clone().or_else(|| base.output_fn.clone()),
            post_process: self.post_process.clone().or_else(|| base.post_process.clone()),
            on_error: self.on_error.clone().or_else(|| base.on_error.clone()),
        }
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("pre_middleware", &self.pre_middleware.len())
            .field("pre_create", &self.pre_create.len())
            .field("pre_read", &self.pre_read.len())
            .field("pre_update", &self.pre_update.len())
            .field("pre_delete", &self.pre_delete.len())
            .field("context_filter", &self.context_filter.is_some())
            .field("access", &self.access.is_some())
            .field("post_create", &self.post_create.len())
            .field("post_read", &self.post_read.len())
            .field("post_update", &self.post_update.len())
            .field("post_delete", &self.post_delete.len())
            .field("output_fn", &self.output_fn.is_some())
            .field("post_process", &self.post_process.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}
