//! restbind: schema-driven REST endpoint binder.
//!
//! Given an axum router, a schema-bound data accessor, and a configuration,
//! [`serve`] registers a fixed set of CRUD routes that each execute a
//! deterministic hook pipeline: `pre_middleware` → operation pre-hook →
//! `context_filter` → `access` → core operation → field filtering →
//! operation post-hook → `output_fn` → `post_process`. Persistence and
//! transport stay external: storage is reached through the [`DataAccessor`]
//! trait, HTTP through the caller's router.

pub mod accessor;
pub mod context;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod hooks;
pub mod options;
pub mod output;
pub mod pipeline;
pub mod query;
pub mod resolved;
pub mod routes;
pub mod state;
pub mod visibility;

pub use accessor::{
    DataAccessor, FieldAccess, FindArgs, ReadOptions, ReadPreference, SelectField, SortOrder,
    WriteOptions,
};
pub use context::{RequestContext, RestResult};
pub use error::RestError;
pub use filter::Filter;
pub use hooks::{AccessResolver, ContextFilter, ErrorHandler, Hooks, Middleware};
pub use options::{defaults, Defaults, Options, TotalCountHeader};
pub use output::{ResponseWriter, RestifyWriter, StandardWriter};
pub use pipeline::Operation;
pub use resolved::{resolve, ResolvedOptions};
pub use routes::serve;
pub use state::EndpointState;
pub use visibility::Visibility;
