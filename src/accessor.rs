//! Data accessor seam: the object-document mapper behind the endpoints.

use crate::error::RestError;
use crate::filter::Filter;
use crate::visibility::Visibility;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

/// Which replica the accessor should read from. Forwarded verbatim; an
/// accessor with a single backing store may ignore it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReadPreference {
    #[default]
    Primary,
    PrimaryPreferred,
    Secondary,
    SecondaryPreferred,
    Nearest,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// One `select` entry: include or exclude a field from the projection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectField {
    pub field: String,
    pub include: bool,
}

/// Pagination, ordering, and projection parsed from the query string.
#[derive(Clone, Debug, Default)]
pub struct FindArgs {
    pub limit: Option<u64>,
    pub skip: Option<u64>,
    pub sort: Vec<(String, SortOrder)>,
    pub select: Vec<SelectField>,
}

/// Options for read operations.
#[derive(Clone, Copy, Debug)]
pub struct ReadOptions {
    /// Plain data vs. live document wrapper. With `lean` the accessor returns
    /// bare values; without it, it may attach accessor-specific derived
    /// fields (virtuals, getters).
    pub lean: bool,
    pub read_preference: ReadPreference,
}

/// Options for the atomic update path.
#[derive(Clone, Copy, Debug)]
pub struct WriteOptions {
    /// Run the accessor's schema validators as part of the atomic update.
    pub run_validators: bool,
    pub lean: bool,
}

/// Per-field visibility tags declared by the accessor's schema. Keys are
/// dotted paths; absent fields are public.
#[derive(Clone, Debug, Default)]
pub struct FieldAccess(pub HashMap<String, Visibility>);

impl FieldAccess {
    pub fn new() -> Self {
        FieldAccess(HashMap::new())
    }

    pub fn tag(mut self, field: &str, vis: Visibility) -> Self {
        self.0.insert(field.to_string(), vis);
        self
    }
}

/// Schema-bound document accessor. Implementations wrap whatever ODM or store
/// the application uses; documents cross the seam as JSON values.
///
/// The split between `find_one_and_update`/`find_one_and_remove` and
/// `save`/`remove` is contractual: the atomic pair is a single round trip
/// that bypasses the accessor's document-level middleware, while `save` and
/// `remove` operate on a fetched document and must fire that middleware.
/// The pipeline chooses between them from the endpoint options.
#[async_trait]
pub trait DataAccessor: Send + Sync {
    /// Model name; becomes the endpoint name unless overridden.
    fn name(&self) -> &str;

    /// Visibility tags declared in the schema.
    fn field_access(&self) -> FieldAccess {
        FieldAccess::new()
    }

    /// Count documents matching the filter, ignoring pagination.
    async fn count(&self, filter: &Filter) -> Result<u64, RestError>;

    async fn find(
        &self,
        filter: &Filter,
        args: &FindArgs,
        opts: &ReadOptions,
    ) -> Result<Vec<Value>, RestError>;

    async fn find_one(
        &self,
        filter: &Filter,
        opts: &ReadOptions,
    ) -> Result<Option<Value>, RestError>;

    /// Insert one document, returning it as stored.
    async fn create(&self, doc: Value) -> Result<Value, RestError>;

    /// Atomic update: apply `patch` to the first match and return the updated
    /// document, or None on a miss. Must not fire document middleware.
    async fn find_one_and_update(
        &self,
        filter: &Filter,
        patch: Value,
        opts: &WriteOptions,
    ) -> Result<Option<Value>, RestError>;

    /// Write back a full document previously obtained from this accessor.
    /// Fires document middleware and full validation.
    async fn save(&self, doc: Value) -> Result<Value, RestError>;

    /// Atomic delete: remove the first match and return it, or None on a
    /// miss. Must not fire document middleware.
    async fn find_one_and_remove(&self, filter: &Filter) -> Result<Option<Value>, RestError>;

    /// Delete a fetched document, firing document middleware.
    async fn remove(&self, doc: &Value) -> Result<(), RestError>;
}
