//! JSON query filter carried through the pipeline and handed to the accessor.

use serde_json::{Map, Value};

/// Query filter as a JSON object. The library transports it opaquely: field
/// equality and operator objects ($gt, $in, $regex, ...) are interpreted by
/// the data accessor, not here. Composition is AND.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter(pub Map<String, Value>);

impl Filter {
    pub fn new() -> Self {
        Filter(Map::new())
    }

    pub fn from_object(map: Map<String, Value>) -> Self {
        Filter(map)
    }

    /// Single-field equality filter, used for identifier lookups.
    pub fn eq(field: &str, value: Value) -> Self {
        let mut map = Map::new();
        map.insert(field.to_string(), value);
        Filter(map)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// AND-compose with another filter. Disjoint keys merge in place;
    /// colliding keys fall back to an explicit `$and` so neither side's
    /// constraint is silently dropped.
    pub fn and(self, other: Filter) -> Filter {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        let collision = other.0.keys().any(|k| self.0.contains_key(k));
        if collision || self.0.contains_key("$and") || other.0.contains_key("$and") {
            let mut map = Map::new();
            map.insert(
                "$and".to_string(),
                Value::Array(vec![Value::Object(self.0), Value::Object(other.0)]),
            );
            Filter(map)
        } else {
            let mut map = self.0;
            map.extend(other.0);
            Filter(map)
        }
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn disjoint_keys_merge_flat() {
        let a = Filter::eq("tenant", json!("t1"));
        let b = Filter::eq("name", json!("x"));
        let merged = a.and(b);
        assert_eq!(merged.as_value(), json!({"tenant": "t1", "name": "x"}));
    }

    #[test]
    fn colliding_keys_wrap_in_and() {
        let a = Filter::eq("age", json!({"$gte": 18}));
        let b = Filter::eq("age", json!({"$lt": 65}));
        let merged = a.and(b);
        assert_eq!(
            merged.as_value(),
            json!({"$and": [{"age": {"$gte": 18}}, {"age": {"$lt": 65}}]})
        );
    }

    #[test]
    fn empty_sides_are_identity() {
        let a = Filter::eq("x", json!(1));
        assert_eq!(a.clone().and(Filter::new()), a);
        assert_eq!(Filter::new().and(a.clone()), a);
    }
}
