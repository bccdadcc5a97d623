//! Query-string parsing: filter, pagination, sort, projection.
//!
//! Grammar: `query` is a URL-encoded JSON object composed (AND) with the
//! context filter; `limit`/`skip` are non-negative integers; `sort` is a
//! comma list with `-` for descending; `select` is a comma list with `-` for
//! exclusion. Unknown parameters are ignored so callers can carry their own.

use crate::accessor::{FindArgs, SelectField, SortOrder};
use crate::error::RestError;
use crate::filter::Filter;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

/// Parse the raw query parameters into a client filter and find arguments.
/// Regex operators in the filter are validated (or rejected outright) before
/// anything reaches the core operation.
pub fn parse(
    params: &HashMap<String, String>,
    allow_regex: bool,
) -> Result<(Filter, FindArgs), RestError> {
    let mut filter = Filter::new();
    let mut args = FindArgs::default();

    for (key, value) in params {
        match key.as_str() {
            "query" => {
                let parsed: Value = serde_json::from_str(value)
                    .map_err(|_| RestError::BadRequest("query must be valid JSON".into()))?;
                let obj = match parsed {
                    Value::Object(map) => map,
                    _ => {
                        return Err(RestError::BadRequest("query must be a JSON object".into()))
                    }
                };
                check_regex(&Value::Object(obj.clone()), allow_regex)?;
                filter = Filter::from_object(obj);
            }
            "limit" => {
                args.limit = Some(parse_unsigned("limit", value)?);
            }
            "skip" => {
                args.skip = Some(parse_unsigned("skip", value)?);
            }
            "sort" => {
                args.sort = parse_sort(value)?;
            }
            "select" => {
                args.select = parse_select(value);
            }
            _ => {}
        }
    }
    Ok((filter, args))
}

fn parse_unsigned(name: &str, value: &str) -> Result<u64, RestError> {
    value
        .parse::<u64>()
        .map_err(|_| RestError::BadRequest(format!("{} must be a non-negative integer", name)))
}

fn parse_sort(value: &str) -> Result<Vec<(String, SortOrder)>, RestError> {
    let mut out = Vec::new();
    for part in value.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (field, order) = match part.strip_prefix('-') {
            Some(rest) => (rest, SortOrder::Descending),
            None => (part, SortOrder::Ascending),
        };
        if field.is_empty() {
            return Err(RestError::BadRequest("sort field must not be empty".into()));
        }
        out.push((field.to_string(), order));
    }
    Ok(out)
}

fn parse_select(value: &str) -> Vec<SelectField> {
    value
        .split(',')
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(|p| match p.strip_prefix('-') {
            Some(rest) => SelectField {
                field: rest.to_string(),
                include: false,
            },
            None => SelectField {
                field: p.to_string(),
                include: true,
            },
        })
        .collect()
}

/// Walk the filter for `$regex` operators. With regex disabled they are a
/// validation error; with it enabled, string patterns must at least compile,
/// so pathological garbage is rejected here instead of inside the accessor.
pub fn check_regex(value: &Value, allow: bool) -> Result<(), RestError> {
    match value {
        Value::Object(map) => {
            for (key, inner) in map {
                if key == "$regex" {
                    if !allow {
                        return Err(RestError::Validation(
                            "regex query operators are disabled".into(),
                        ));
                    }
                    if let Value::String(pattern) = inner {
                        Regex::new(pattern).map_err(|_| {
                            RestError::Validation("invalid regex pattern".into())
                        })?;
                    }
                }
                check_regex(inner, allow)?;
            }
            Ok(())
        }
        Value::Array(items) => {
            for item in items {
                check_regex(item, allow)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}
