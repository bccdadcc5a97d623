//! Endpoint registration: the `serve` entry points.

use crate::accessor::DataAccessor;
use crate::handlers;
use crate::options::{Defaults, Options};
use crate::resolved::{resolve, ResolvedOptions};
use crate::state::EndpointState;
use crate::visibility::Visibility;
use axum::{routing::get, Router};
use std::collections::HashMap;
use std::sync::Arc;

/// Register the CRUD routes for `accessor` on `router`, merging `options`
/// over the built-in defaults only. Returns the augmented router and the
/// resolved endpoint name.
///
/// Routes, for collection path `C` and item path `I`:
/// `GET`/`POST C`, `GET C/count`, `GET`/`PUT`/`PATCH`/`DELETE I`,
/// `GET I/shallow`.
pub fn serve(
    router: Router,
    accessor: Arc<dyn DataAccessor>,
    options: Options,
) -> (Router, String) {
    bind(router, accessor, options)
}

impl Defaults {
    /// Register an endpoint with this registry as the fallback layer:
    /// explicit options win, registry values fill the gaps, built-in defaults
    /// cover the rest.
    pub fn serve(
        &self,
        router: Router,
        accessor: Arc<dyn DataAccessor>,
        options: Options,
    ) -> (Router, String) {
        bind(router, accessor, options.merged_over(self.options()))
    }
}

/// Effective field tags for one endpoint: schema tags first, option-declared
/// lists override.
fn effective_tags(
    accessor: &dyn DataAccessor,
    options: &ResolvedOptions,
) -> HashMap<String, Visibility> {
    let mut tags = accessor.field_access().0;
    for field in &options.protected_fields {
        tags.insert(field.clone(), Visibility::Protected);
    }
    for field in &options.private_fields {
        tags.insert(field.clone(), Visibility::Private);
    }
    tags
}

fn bind(router: Router, accessor: Arc<dyn DataAccessor>, options: Options) -> (Router, String) {
    let resolved = Arc::new(resolve(options, accessor.name()));
    let tags = effective_tags(accessor.as_ref(), &resolved);

    let name = resolved.name.clone();
    let collection = resolved.collection_path();
    let item = resolved.item_path();
    tracing::debug!(endpoint = %name, collection = %collection, item = %item, "registering endpoint");

    let state = EndpointState {
        accessor,
        options: resolved,
        access_tags: Arc::new(tags),
    };

    let endpoint = Router::new()
        .route(&collection, get(handlers::list).post(handlers::create))
        .route(&format!("{}/count", collection), get(handlers::count))
        .route(
            &item,
            get(handlers::read)
                .put(handlers::update)
                .patch(handlers::update)
                .delete(handlers::delete),
        )
        .route(&format!("{}/shallow", item), get(handlers::shallow))
        .with_state(state);

    (router.merge(endpoint), name)
}
