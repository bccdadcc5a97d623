//! Options with built-in defaults applied, plus endpoint path computation.

use crate::accessor::{ReadOptions, ReadPreference, WriteOptions};
use crate::hooks::Hooks;
use crate::options::{Options, TotalCountHeader};
use axum::http::HeaderName;

pub const DEFAULT_PREFIX: &str = "/api";
pub const DEFAULT_VERSION: &str = "/v1";
pub const DEFAULT_ID_PROPERTY: &str = "_id";
pub const DEFAULT_COUNT_HEADER: &str = "x-total-count";

/// Endpoint configuration with every field concrete. Built by [`resolve`] at
/// registration time; immutable afterwards.
#[derive(Clone, Debug)]
pub struct ResolvedOptions {
    pub prefix: String,
    pub version: String,
    pub name: String,
    pub id_property: String,
    pub restify: bool,
    pub allow_regex: bool,
    pub run_validators: bool,
    pub read_preference: ReadPreference,
    pub total_count_header: TotalCountHeader,
    pub lean: bool,
    pub find_one_and_update: bool,
    pub find_one_and_remove: bool,
    pub private_fields: Vec<String>,
    pub protected_fields: Vec<String>,
    pub hooks: Hooks,
}

/// Apply built-in defaults to whatever the merge left unset. `accessor_name`
/// fills the endpoint name when the options don't.
pub fn resolve(options: Options, accessor_name: &str) -> ResolvedOptions {
    let total_count_header = options
        .total_count_header
        .unwrap_or(TotalCountHeader::Disabled);
    if let TotalCountHeader::Named(name) = &total_count_header {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            tracing::warn!(header = %name, "invalid total-count header name, using default");
        }
    }
    ResolvedOptions {
        prefix: options.prefix.unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
        version: options.version.unwrap_or_else(|| DEFAULT_VERSION.to_string()),
        name: options.name.unwrap_or_else(|| accessor_name.to_string()),
        id_property: options
            .id_property
            .unwrap_or_else(|| DEFAULT_ID_PROPERTY.to_string()),
        restify: options.restify.unwrap_or(false),
        allow_regex: options.allow_regex.unwrap_or(true),
        run_validators: options.run_validators.unwrap_or(false),
        read_preference: options.read_preference.unwrap_or(ReadPreference::Primary),
        total_count_header,
        lean: options.lean.unwrap_or(true),
        find_one_and_update: options.find_one_and_update.unwrap_or(true),
        find_one_and_remove: options.find_one_and_remove.unwrap_or(true),
        private_fields: options.private_fields,
        protected_fields: options.protected_fields,
        hooks: options.hooks,
    }
}

impl ResolvedOptions {
    /// Base path = prefix + version. When it carries a `/:id` token, that
    /// token is the identifier location for item routes and is stripped for
    /// collection routes.
    fn base(&self) -> String {
        format!("{}{}", self.prefix, self.version)
    }

    /// Collection route: `{prefix}{version}/{name}` with any `/:id` token
    /// removed.
    pub fn collection_path(&self) -> String {
        let base = self.base().replace("/:id", "");
        format!("{}/{}", base, self.name)
    }

    /// Item route: identifier in place when prefix/version carry `/:id`
    /// (`/api/v1/Entities/:id/Model`), appended otherwise
    /// (`/api/v1/Model/:id`).
    pub fn item_path(&self) -> String {
        let base = self.base();
        if base.contains("/:id") {
            format!("{}/{}", base, self.name)
        } else {
            format!("{}/{}/:id", base, self.name)
        }
    }

    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            lean: self.lean,
            read_preference: self.read_preference,
        }
    }

    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            run_validators: self.run_validators,
            lean: self.lean,
        }
    }

    /// Header to attach the pre-pagination total under, when enabled.
    pub fn count_header_name(&self) -> Option<HeaderName> {
        match &self.total_count_header {
            TotalCountHeader::Disabled => None,
            TotalCountHeader::Default => Some(HeaderName::from_static(DEFAULT_COUNT_HEADER)),
            TotalCountHeader::Named(name) => HeaderName::from_bytes(name.as_bytes())
                .ok()
                .or_else(|| Some(HeaderName::from_static(DEFAULT_COUNT_HEADER))),
        }
    }
}
