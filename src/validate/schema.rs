//! A small, strict JSON schema checker.
//!
//! Schemas describe objects as a fixed list of fields. Validation walks the
//! whole candidate and collects every issue (path + message) rather than
//! stopping at the first one; any issue rejects the object. Keys that the
//! schema does not declare are issues too.

use chrono::DateTime;
use serde_json::{Map, Value};

use crate::error::ValidationError;

#[derive(Debug, Clone)]
pub enum Rule {
    Number { min: Option<f64>, max: Option<f64> },
    Integer { min: i64, max: i64 },
    Text { min_len: usize },
    /// RFC 3339 timestamp string.
    Timestamp,
    Bool,
    Array { item: Box<Rule>, min_len: usize },
    Object(Vec<Field>),
}

impl Rule {
    pub fn number() -> Self {
        Rule::Number { min: None, max: None }
    }

    pub fn range(min: f64, max: f64) -> Self {
        Rule::Number {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn integer(min: i64, max: i64) -> Self {
        Rule::Integer { min, max }
    }

    pub fn text() -> Self {
        Rule::Text { min_len: 1 }
    }

    pub fn non_empty_array(item: Rule) -> Self {
        Rule::Array {
            item: Box::new(item),
            min_len: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: &'static str,
    pub rule: Rule,
    pub required: bool,
}

impl Field {
    pub fn required(name: &'static str, rule: Rule) -> Self {
        Self {
            name,
            rule,
            required: true,
        }
    }

    pub fn optional(name: &'static str, rule: Rule) -> Self {
        Self {
            name,
            rule,
            required: false,
        }
    }
}

/// Named root object schema.
#[derive(Debug, Clone)]
pub struct MetricSchema {
    pub name: &'static str,
    pub fields: Vec<Field>,
}

impl MetricSchema {
    pub fn new(name: &'static str, fields: Vec<Field>) -> Self {
        Self { name, fields }
    }

    /// Accept `candidate` as-is or reject it with every issue found.
    pub fn validate(&self, candidate: &Value) -> Result<(), ValidationError> {
        let mut issues = Vec::new();
        match candidate {
            Value::Object(map) => check_object(&self.fields, map, "", &mut issues),
            other => issues.push(format!("(root): expected object, got {}", type_name(other))),
        }
        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                metric: self.name.to_string(),
                issues,
            })
        }
    }
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn check_object(fields: &[Field], map: &Map<String, Value>, path: &str, issues: &mut Vec<String>) {
    for field in fields {
        let field_path = join(path, field.name);
        match map.get(field.name) {
            Some(value) => check(&field.rule, value, &field_path, issues),
            None if field.required => issues.push(format!("{field_path}: required")),
            None => {}
        }
    }
    for key in map.keys() {
        if !fields.iter().any(|f| f.name == key) {
            issues.push(format!("{}: unrecognized key", join(path, key)));
        }
    }
}

fn check(rule: &Rule, value: &Value, path: &str, issues: &mut Vec<String>) {
    match rule {
        Rule::Number { min, max } => {
            let Some(n) = value.as_f64().filter(|n| n.is_finite()) else {
                issues.push(format!("{path}: expected number, got {}", type_name(value)));
                return;
            };
            if let Some(min) = min.filter(|m| n < *m) {
                issues.push(format!("{path}: {n} is below minimum {min}"));
            }
            if let Some(max) = max.filter(|m| n > *m) {
                issues.push(format!("{path}: {n} is above maximum {max}"));
            }
        }
        Rule::Integer { min, max } => {
            let Some(n) = value.as_i64() else {
                issues.push(format!("{path}: expected integer, got {value}"));
                return;
            };
            if n < *min || n > *max {
                issues.push(format!("{path}: {n} is outside [{min}, {max}]"));
            }
        }
        Rule::Text { min_len } => match value.as_str() {
            Some(s) if s.chars().count() >= *min_len => {}
            Some(_) => issues.push(format!("{path}: must contain at least {min_len} character(s)")),
            None => issues.push(format!("{path}: expected string, got {}", type_name(value))),
        },
        Rule::Timestamp => match value.as_str() {
            Some(s) if DateTime::parse_from_rfc3339(s).is_ok() => {}
            Some(s) => issues.push(format!("{path}: '{s}' is not a valid timestamp")),
            None => issues.push(format!("{path}: expected string, got {}", type_name(value))),
        },
        Rule::Bool => {
            if !value.is_boolean() {
                issues.push(format!("{path}: expected boolean, got {}", type_name(value)));
            }
        }
        Rule::Array { item, min_len } => {
            let Some(items) = value.as_array() else {
                issues.push(format!("{path}: expected array, got {}", type_name(value)));
                return;
            };
            if items.len() < *min_len {
                issues.push(format!("{path}: must contain at least {min_len} element(s)"));
            }
            for (i, element) in items.iter().enumerate() {
                check(item, element, &format!("{path}.{i}"), issues);
            }
        }
        Rule::Object(fields) => match value.as_object() {
            Some(map) => check_object(fields, map, path, issues),
            None => issues.push(format!("{path}: expected object, got {}", type_name(value))),
        },
    }
}
