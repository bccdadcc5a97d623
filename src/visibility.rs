//! Visibility tiers and field-level output filtering.

use serde_json::{Map, Value};
use std::collections::HashMap;

/// Access tier of a request or a field. Ordering is part of the contract:
/// a request at level L sees every field tagged at or below L, so the visible
/// field sets are monotonic (public ⊆ protected ⊆ private).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl Visibility {
    /// Whether a request at this level may see a field tagged `field`.
    pub fn grants(self, field: Visibility) -> bool {
        self >= field
    }
}

impl std::str::FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Visibility::Public),
            "protected" => Ok(Visibility::Protected),
            "private" => Ok(Visibility::Private),
            other => Err(format!("unknown visibility '{}'", other)),
        }
    }
}

/// Strip from `value` every field whose tag exceeds the request visibility.
/// Tags are dotted paths into nested objects ("card.number"); a tag on an
/// object applies to the whole subtree. Arrays are filtered element-wise.
pub fn filter_fields(value: &Value, tags: &HashMap<String, Visibility>, vis: Visibility) -> Value {
    let hidden: Vec<&str> = tags
        .iter()
        .filter(|(_, field_vis)| !vis.grants(**field_vis))
        .map(|(path, _)| path.as_str())
        .collect();
    if hidden.is_empty() {
        return value.clone();
    }
    let mut out = value.clone();
    for path in hidden {
        remove_path(&mut out, path);
    }
    out
}

fn remove_path(value: &mut Value, path: &str) {
    match value {
        Value::Array(items) => {
            for item in items {
                remove_path(item, path);
            }
        }
        Value::Object(map) => match path.split_once('.') {
            Some((head, rest)) => {
                if let Some(inner) = map.get_mut(head) {
                    remove_path(inner, rest);
                }
            }
            None => {
                map.remove(path);
            }
        },
        _ => {}
    }
}

/// Shallow view of a document: nested-object values replaced by `true`,
/// everything else kept as-is. Serves the `GET /:id/shallow` route.
pub fn shallow(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (k, v) in map {
                let flat = match v {
                    Value::Object(_) => Value::Bool(true),
                    other => other.clone(),
                };
                out.insert(k.clone(), flat);
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}
