//! Endpoint options and the process-level defaults registry.

use crate::accessor::ReadPreference;
use crate::context::RequestContext;
use crate::hooks::{AccessResolver, ContextFilter, ErrorHandler, Hooks, Middleware};
use std::sync::Arc;

/// Total-count header behavior on list requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TotalCountHeader {
    Disabled,
    /// Emit under the default name `X-Total-Count`.
    Default,
    /// Emit under a caller-chosen header name.
    Named(String),
}

/// Per-endpoint configuration. Every field is independently optional; unset
/// fields fall back to the defaults registry the endpoint was served with,
/// then to the built-in defaults (see `resolved`). Immutable once bound.
#[derive(Clone, Debug, Default)]
pub struct Options {
    pub prefix: Option<String>,
    pub version: Option<String>,
    /// Endpoint name; defaults to the accessor's model name.
    pub name: Option<String>,
    pub id_property: Option<String>,
    /// Restify-style response writer instead of the standard one.
    pub restify: Option<bool>,
    pub allow_regex: Option<bool>,
    pub run_validators: Option<bool>,
    pub read_preference: Option<ReadPreference>,
    pub total_count_header: Option<TotalCountHeader>,
    pub lean: Option<bool>,
    pub find_one_and_update: Option<bool>,
    pub find_one_and_remove: Option<bool>,
    /// Fields only returned to private access, over and above schema tags.
    pub private_fields: Vec<String>,
    /// Fields returned to protected and private access.
    pub protected_fields: Vec<String>,
    pub hooks: Hooks,
}

impl Options {
    pub fn new() -> Self {
        Options::default()
    }

    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn id_property(mut self, id_property: &str) -> Self {
        self.id_property = Some(id_property.to_string());
        self
    }

    pub fn restify(mut self, restify: bool) -> Self {
        self.restify = Some(restify);
        self
    }

    pub fn allow_regex(mut self, allow: bool) -> Self {
        self.allow_regex = Some(allow);
        self
    }

    pub fn run_validators(mut self, run: bool) -> Self {
        self.run_validators = Some(run);
        self
    }

    pub fn read_preference(mut self, pref: ReadPreference) -> Self {
        self.read_preference = Some(pref);
        self
    }

    pub fn total_count_header(mut self, enabled: bool) -> Self {
        self.total_count_header = Some(if enabled {
            TotalCountHeader::Default
        } else {
            TotalCountHeader::Disabled
        });
        self
    }

    pub fn total_count_header_named(mut self, name: &str) -> Self {
        self.total_count_header = Some(TotalCountHeader::Named(name.to_string()));
        self
    }

    pub fn lean(mut self, lean: bool) -> Self {
        self.lean = Some(lean);
        self
    }

    pub fn find_one_and_update(mut self, atomic: bool) -> Self {
        self.find_one_and_update = Some(atomic);
        self
    }

    pub fn find_one_and_remove(mut self, atomic: bool) -> Self {
        self.find_one_and_remove = Some(atomic);
        self
    }

    pub fn private_fields(mut self, fields: &[&str]) -> Self {
        self.private_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn protected_fields(mut self, fields: &[&str]) -> Self {
        self.protected_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn pre_middleware(mut self, hook: impl Middleware + 'static) -> Self {
        self.hooks.pre_middleware.push(Arc::new(hook));
        self
    }

    pub fn pre_create(mut self, hook: impl Middleware + 'static) -> Self {
        self.hooks.pre_create.push(Arc::new(hook));
        self
    }

    pub fn pre_read(mut self, hook: impl Middleware + 'static) -> Self {
        self.hooks.pre_read.push(Arc::new(hook));
        self
    }

    pub fn pre_update(mut self, hook: impl Middleware + 'static) -> Self {
        self.hooks.pre_update.push(Arc::new(hook));
        self
    }

    pub fn pre_delete(mut self, hook: impl Middleware + 'static) -> Self {
        self.hooks.pre_delete.push(Arc::new(hook));
        self
    }

    pub fn context_filter(mut self, filter: impl ContextFilter + 'static) -> Self {
        self.hooks.context_filter = Some(Arc::new(filter));
        self
    }

    pub fn access(mut self, resolver: impl AccessResolver + 'static) -> Self {
        self.hooks.access = Some(Arc::new(resolver));
        self
    }

    pub fn post_create(mut self, hook: impl Middleware + 'static) -> Self {
        self.hooks.post_create.push(Arc::new(hook));
        self
    }

    pub fn post_read(mut self, hook: impl Middleware + 'static) -> Self {
        self.hooks.post_read.push(Arc::new(hook));
        self
    }

    pub fn post_update(mut self, hook: impl Middleware + 'static) -> Self {
        self.hooks.post_update.push(Arc::new(hook));
        self
    }

    pub fn post_delete(mut self, hook: impl Middleware + 'static) -> Self {
        self.hooks.post_delete.push(Arc::new(hook));
        self
    }

    pub fn output_fn(mut self, output: impl Middleware + 'static) -> Self {
        self.hooks.output_fn = Some(Arc::new(output));
        self
    }

    pub fn post_process(mut self, f: impl Fn(&RequestContext) + Send + Sync + 'static) -> Self {
        self.hooks.post_process = Some(Arc::new(f));
        self
    }

    pub fn on_error(mut self, handler: impl ErrorHandler + 'static) -> Self {
        self.hooks.on_error = Some(Arc::new(handler));
        self
    }

    /// Shallow merge: explicit values here win, unset fields come from
    /// `base`. Field lists and hook slots follow the same rule (set-wins, no
    /// element-wise union).
    pub fn merged_over(&self, base: &Options) -> Options {
        Options {
            prefix: self.prefix.clone().or_else(|| base.prefix.clone()),
            version: self.version.clone().or_else(|| base.version.clone()),
            name: self.name.clone().or_else(|| base.name.clone()),
            id_property: self.id_property.clone().or_else(|| base.id_property.clone()),
            restify: self.restify.or(base.restify),
            allow_regex: self.allow_regex.or(base.allow_regex),
            run_validators: self.run_validators.or(base.run_validators),
            read_preference: self.read_preference.or(base.read_preference),
            total_count_header: self
                .total_count_header
                .clone()
                .or_else(|| base.total_count_header.clone()),
            lean: self.lean.or(base.lean),
            find_one_and_update: self.find_one_and_update.or(base.find_one_and_update),
            find_one_and_remove: self.find_one_and_remove.or(base.find_one_and_remove),
            private_fields: if self.private_fields.is_empty() {
                base.private_fields.clone()
            } else {
                self.private_fields.clone()
            },
            protected_fields: if self.protected_fields.is_empty() {
                base.protected_fields.clone()
            } else {
                self.protected_fields.clone()
            },
            hooks: self.hooks.merged_over(&base.hooks),
        }
    }
}

/// Process-level default options. An explicit value threaded into `serve`
/// calls rather than ambient global state; populate it once at startup,
/// before registering routes. Nothing enforces that ordering — interleaving
/// `set` with request handling is a caller bug, not a library concern.
#[derive(Clone, Debug, Default)]
pub struct Defaults {
    base: Options,
}

impl Defaults {
    pub fn new() -> Self {
        Defaults::default()
    }

    /// Replace the registry contents. Later `serve` calls merge their
    /// explicit options over these.
    pub fn set(&mut self, options: Options) {
        self.base = options;
    }

    pub fn options(&self) -> &Options {
        &self.base
    }
}

/// Build a defaults registry from a base configuration.
pub fn defaults(options: Options) -> Defaults {
    Defaults { base: options }
}
