//! Demo server: binds CRUD endpoints for an in-memory Task store, with a
//! header-driven access hook and a total-count header on lists.

use async_trait::async_trait;
use axum::Router;
use restbind::{
    serve, DataAccessor, FieldAccess, Filter, FindArgs, Options, ReadOptions, RequestContext,
    RestError, Visibility, WriteOptions,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

struct TaskStore {
    docs: Mutex<Vec<Value>>,
    next_id: AtomicU64,
}

impl TaskStore {
    fn new() -> Self {
        TaskStore {
            docs: Mutex::new(vec![
                json!({"_id": "1", "title": "write docs", "done": false, "owner_note": "internal"}),
            ]),
            next_id: AtomicU64::new(2),
        }
    }

    fn matches(doc: &Value, filter: &Filter) -> bool {
        filter.0.iter().all(|(k, v)| doc.get(k) == Some(v))
    }
}

#[async_trait]
impl DataAccessor for TaskStore {
    fn name(&self) -> &str {
        "Task"
    }

    fn field_access(&self) -> FieldAccess {
        FieldAccess::new().tag("owner_note", Visibility::Private)
    }

    async fn count(&self, filter: &Filter) -> Result<u64, RestError> {
        let docs = self.docs.lock().unwrap();
        Ok(docs.iter().filter(|d| Self::matches(d, filter)).count() as u64)
    }

    async fn find(
        &self,
        filter: &Filter,
        args: &FindArgs,
        _opts: &ReadOptions,
    ) -> Result<Vec<Value>, RestError> {
        let docs = self.docs.lock().unwrap();
        let rows = docs
            .iter()
            .filter(|d| Self::matches(d, filter))
            .skip(args.skip.unwrap_or(0) as usize)
            .take(args.limit.unwrap_or(u64::MAX) as usize)
            .cloned()
            .collect();
        Ok(rows)
    }

    async fn find_one(
        &self,
        filter: &Filter,
        _opts: &ReadOptions,
    ) -> Result<Option<Value>, RestError> {
        let docs = self.docs.lock().unwrap();
        Ok(docs.iter().find(|d| Self::matches(d, filter)).cloned())
    }

    async fn create(&self, mut doc: Value) -> Result<Value, RestError> {
        if let Some(map) = doc.as_object_mut() {
            if !map.contains_key("_id") {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                map.insert("_id".into(), json!(id.to_string()));
            }
        }
        self.docs.lock().unwrap().push(doc.clone());
        Ok(doc)
    }

    async fn find_one_and_update(
        &self,
        filter: &Filter,
        patch: Value,
        _opts: &WriteOptions,
    ) -> Result<Option<Value>, RestError> {
        let mut docs = self.docs.lock().unwrap();
        for doc in docs.iter_mut() {
            if Self::matches(doc, filter) {
                if let (Some(map), Some(patch_map)) = (doc.as_object_mut(), patch.as_object()) {
                    for (k, v) in patch_map {
                        map.insert(k.clone(), v.clone());
                    }
                }
                return Ok(Some(doc.clone()));
            }
        }
        Ok(None)
    }

    async fn save(&self, doc: Value) -> Result<Value, RestError> {
        let id = doc.get("_id").cloned();
        let mut docs = self.docs.lock().unwrap();
        match docs.iter_mut().find(|d| d.get("_id") == id.as_ref()) {
            Some(slot) => *slot = doc.clone(),
            None => docs.push(doc.clone()),
        }
        Ok(doc)
    }

    async fn find_one_and_remove(&self, filter: &Filter) -> Result<Option<Value>, RestError> {
        let mut docs = self.docs.lock().unwrap();
        let pos = docs.iter().position(|d| Self::matches(d, filter));
        Ok(pos.map(|i| docs.remove(i)))
    }

    async fn remove(&self, doc: &Value) -> Result<(), RestError> {
        let mut docs = self.docs.lock().unwrap();
        if let Some(pos) = docs.iter().position(|d| d.get("_id") == doc.get("_id")) {
            docs.remove(pos);
        }
        Ok(())
    }
}

/// `x-api-key: admin` unlocks private fields; anything else stays public.
fn access_from_header(ctx: &RequestContext) -> Result<Visibility, RestError> {
    Ok(match ctx.header("x-api-key") {
        Some("admin") => Visibility::Private,
        _ => Visibility::Public,
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("restbind=debug".parse()?))
        .init();

    let options = Options::new()
        .total_count_header(true)
        .access(access_from_header);

    let (app, name) = serve(Router::new(), Arc::new(TaskStore::new()), options);
    tracing::info!(endpoint = %name, "routes registered under /api/v1");

    let listener = TcpListener::bind("0.0.0.0:3000").await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
