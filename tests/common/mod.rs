//! Shared test support: an in-memory data accessor with observable document
//! middleware, and request helpers for driving routers with `oneshot`.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use http_body_util::BodyExt;
use regex::Regex;
use restbind::{
    DataAccessor, FieldAccess, Filter, FindArgs, ReadOptions, RestError, SortOrder, WriteOptions,
};
use serde_json::{json, Map, Value};
use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// In-memory document store. Counters expose which accessor path the
/// pipeline took: `save_calls`/`remove_calls` stand in for document-level
/// middleware, which the atomic operations must bypass.
pub struct MemoryAccessor {
    name: String,
    field_access: FieldAccess,
    docs: Mutex<Vec<Value>>,
    next_id: AtomicU64,
    pub save_calls: AtomicUsize,
    pub remove_calls: AtomicUsize,
    pub atomic_updates: AtomicUsize,
    pub atomic_removes: AtomicUsize,
    pub last_write: Mutex<Option<WriteOptions>>,
    pub last_read: Mutex<Option<ReadOptions>>,
    /// When set, every operation fails with this data-layer message.
    pub fail_with: Mutex<Option<String>>,
}

impl MemoryAccessor {
    pub fn new(name: &str) -> Self {
        MemoryAccessor {
            name: name.to_string(),
            field_access: FieldAccess::new(),
            docs: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            save_calls: AtomicUsize::new(0),
            remove_calls: AtomicUsize::new(0),
            atomic_updates: AtomicUsize::new(0),
            atomic_removes: AtomicUsize::new(0),
            last_write: Mutex::new(None),
            last_read: Mutex::new(None),
            fail_with: Mutex::new(None),
        }
    }

    pub fn with_field_access(mut self, access: FieldAccess) -> Self {
        self.field_access = access;
        self
    }

    pub fn with_docs(self, docs: Vec<Value>) -> Self {
        let max_id = docs
            .iter()
            .filter_map(|d| d.get("_id").and_then(|v| v.as_str()))
            .filter_map(|s| s.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        self.next_id.store(max_id + 1, AtomicOrdering::SeqCst);
        *self.docs.lock().unwrap() = docs;
        self
    }

    pub fn docs(&self) -> Vec<Value> {
        self.docs.lock().unwrap().clone()
    }

    fn check_failure(&self) -> Result<(), RestError> {
        match self.fail_with.lock().unwrap().as_ref() {
            Some(msg) => Err(RestError::DataLayer(msg.clone())),
            None => Ok(()),
        }
    }
}

fn as_f64(v: &Value) -> Option<f64> {
    v.as_f64()
}

fn matches_operator(field_value: Option<&Value>, op: &str, operand: &Value) -> bool {
    match op {
        "$ne" => field_value != Some(operand),
        "$in" => match operand {
            Value::Array(items) => field_value.map(|v| items.contains(v)).unwrap_or(false),
            _ => false,
        },
        "$gt" | "$gte" | "$lt" | "$lte" => {
            let (a, b) = match (field_value.and_then(as_f64), as_f64(operand)) {
                (Some(a), Some(b)) => (a, b),
                _ => return false,
            };
            match op {
                "$gt" => a > b,
                "$gte" => a >= b,
                "$lt" => a < b,
                _ => a <= b,
            }
        }
        "$regex" => {
            let (s, pattern) = match (field_value.and_then(|v| v.as_str()), operand.as_str()) {
                (Some(s), Some(p)) => (s, p),
                _ => return false,
            };
            Regex::new(pattern).map(|re| re.is_match(s)).unwrap_or(false)
        }
        // $options et al. are modifiers, not predicates
        _ => true,
    }
}

fn matches_condition(doc: &Value, field: &str, condition: &Value) -> bool {
    let field_value = doc.get(field);
    match condition {
        Value::Object(ops) if ops.keys().any(|k| k.starts_with('$')) => ops
            .iter()
            .all(|(op, operand)| matches_operator(field_value, op, operand)),
        other => field_value == Some(other),
    }
}

pub fn matches_filter(doc: &Value, filter: &Map<String, Value>) -> bool {
    filter.iter().all(|(key, condition)| {
        if key == "$and" {
            match condition {
                Value::Array(clauses) => clauses.iter().all(|clause| match clause {
                    Value::Object(map) => matches_filter(doc, map),
                    _ => false,
                }),
                _ => false,
            }
        } else {
            matches_condition(doc, key, condition)
        }
    })
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => as_f64(a)
            .partial_cmp(&as_f64(b))
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

fn apply_find_args(mut rows: Vec<Value>, args: &FindArgs) -> Vec<Value> {
    for (field, order) in args.sort.iter().rev() {
        rows.sort_by(|a, b| {
            let ord = compare_values(
                a.get(field).unwrap_or(&Value::Null),
                b.get(field).unwrap_or(&Value::Null),
            );
            match order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            }
        });
    }
    let skip = args.skip.unwrap_or(0) as usize;
    let rows: Vec<Value> = rows.into_iter().skip(skip).collect();
    let rows: Vec<Value> = match args.limit {
        Some(limit) => rows.into_iter().take(limit as usize).collect(),
        None => rows,
    };
    if args.select.is_empty() {
        return rows;
    }
    let includes: Vec<&str> = args
        .select
        .iter()
        .filter(|s| s.include)
        .map(|s| s.field.as_str())
        .collect();
    let excludes: Vec<&str> = args
        .select
        .iter()
        .filter(|s| !s.include)
        .map(|s| s.field.as_str())
        .collect();
    rows.into_iter()
        .map(|row| match row {
            Value::Object(map) => {
                let mut out = Map::new();
                for (k, v) in map {
                    let keep = if !includes.is_empty() {
                        k == "_id" || includes.contains(&k.as_str())
                    } else {
                        !excludes.contains(&k.as_str())
                    };
                    if keep {
                        out.insert(k, v);
                    }
                }
                Value::Object(out)
            }
            other => other,
        })
        .collect()
}

#[async_trait]
impl DataAccessor for MemoryAccessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn field_access(&self) -> FieldAccess {
        self.field_access.clone()
    }

    async fn count(&self, filter: &Filter) -> Result<u64, RestError> {
        self.check_failure()?;
        let docs = self.docs.lock().unwrap();
        Ok(docs.iter().filter(|d| matches_filter(d, &filter.0)).count() as u64)
    }

    async fn find(
        &self,
        filter: &Filter,
        args: &FindArgs,
        opts: &ReadOptions,
    ) -> Result<Vec<Value>, RestError> {
        self.check_failure()?;
        *self.last_read.lock().unwrap() = Some(*opts);
        let docs = self.docs.lock().unwrap();
        let rows: Vec<Value> = docs
            .iter()
            .filter(|d| matches_filter(d, &filter.0))
            .cloned()
            .collect();
        Ok(apply_find_args(rows, args))
    }

    async fn find_one(
        &self,
        filter: &Filter,
        opts: &ReadOptions,
    ) -> Result<Option<Value>, RestError> {
        self.check_failure()?;
        *self.last_read.lock().unwrap() = Some(*opts);
        let docs = self.docs.lock().unwrap();
        Ok(docs.iter().find(|d| matches_filter(d, &filter.0)).cloned())
    }

    async fn create(&self, doc: Value) -> Result<Value, RestError> {
        self.check_failure()?;
        let mut doc = doc;
        if let Value::Object(map) = &mut doc {
            if !map.contains_key("_id") {
                let id = self.next_id.fetch_add(1, AtomicOrdering::SeqCst);
                map.insert("_id".to_string(), json!(id.to_string()));
            }
        }
        self.docs.lock().unwrap().push(doc.clone());
        Ok(doc)
    }

    async fn find_one_and_update(
        &self,
        filter: &Filter,
        patch: Value,
        opts: &WriteOptions,
    ) -> Result<Option<Value>, RestError> {
        self.check_failure()?;
        self.atomic_updates.fetch_add(1, AtomicOrdering::SeqCst);
        *self.last_write.lock().unwrap() = Some(*opts);
        let mut docs = self.docs.lock().unwrap();
        for doc in docs.iter_mut() {
            if matches_filter(doc, &filter.0) {
                if let (Value::Object(map), Value::Object(patch_map)) = (&mut *doc, &patch) {
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
        self.check_failure()?;
        self.save_calls.fetch_add(1, AtomicOrdering::SeqCst);
        let id = doc.get("_id").cloned();
        let mut docs = self.docs.lock().unwrap();
        match docs.iter_mut().find(|d| d.get("_id") == id.as_ref()) {
            Some(slot) => *slot = doc.clone(),
            None => docs.push(doc.clone()),
        }
        Ok(doc)
    }

    async fn find_one_and_remove(&self, filter: &Filter) -> Result<Option<Value>, RestError> {
        self.check_failure()?;
        self.atomic_removes.fetch_add(1, AtomicOrdering::SeqCst);
        let mut docs = self.docs.lock().unwrap();
        let pos = docs.iter().position(|d| matches_filter(d, &filter.0));
        Ok(pos.map(|i| docs.remove(i)))
    }

    async fn remove(&self, doc: &Value) -> Result<(), RestError> {
        self.check_failure()?;
        self.remove_calls.fetch_add(1, AtomicOrdering::SeqCst);
        let id = doc.get("_id");
        let mut docs = self.docs.lock().unwrap();
        if let Some(pos) = docs.iter().position(|d| d.get("_id") == id) {
            docs.remove(pos);
        }
        Ok(())
    }
}

/// Accessor named `Model` seeded with `n` simple documents.
pub fn seeded(n: usize) -> Arc<MemoryAccessor> {
    let docs = (1..=n)
        .map(|i| json!({"_id": i.to_string(), "name": format!("doc{}", i), "rank": i}))
        .collect();
    Arc::new(MemoryAccessor::new("Model").with_docs(docs))
}

pub async fn send(
    router: axum::Router,
    method: &str,
    path: &str,
    body: Option<Value>,
    headers: &[(&str, &str)],
) -> (StatusCode, HeaderMap, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, headers, json)
}

pub async fn send_get(router: axum::Router, path: &str) -> (StatusCode, HeaderMap, Value) {
    send(router, "GET", path, None, &[]).await
}
