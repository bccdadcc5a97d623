//! Shared state for the handlers of one endpoint.

use crate::accessor::DataAccessor;
use crate::resolved::ResolvedOptions;
use crate::visibility::Visibility;
use std::collections::HashMap;
use std::sync::Arc;

/// Everything a handler needs: the accessor, the resolved options, and the
/// effective field-visibility tags (schema tags merged with option-declared
/// private/protected lists). Built once per `serve` call, cloned per route.
#[derive(Clone)]
pub struct EndpointState {
    pub accessor: Arc<dyn DataAccessor>,
    pub options: Arc<ResolvedOptions>,
    pub access_tags: Arc<HashMap<String, Visibility>>,
}
