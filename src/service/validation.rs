//! Request validation against an entity schema: coercion, defaults, and field constraints.

use crate::service::schema::{FieldType, Format, Schema, ValidationRule};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::{Map, Value};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One field-level complaint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationMode {
    /// Required fields enforced, defaults applied.
    Create,
    /// Only fields present in the body are checked.
    Update,
}

pub struct RequestValidator;

impl RequestValidator {
    /// Validate and coerce a body against the schema. Returns only schema fields with non-null
    /// values (unknown keys are dropped), or every field-level error found.
    pub fn validate(
        body: &Map<String, Value>,
        schema: &Schema,
        mode: ValidationMode,
    ) -> Result<Map<String, Value>, Vec<FieldError>> {
        let mut out = Map::new();
        let mut errors = Vec::new();
        for spec in &schema.fields {
            let present = body.get(&spec.name).filter(|v| !v.is_null());
            let Some(v) = present else {
                if mode == ValidationMode::Create {
                    if let Some(default) = &spec.default {
                        out.insert(spec.name.clone(), default.clone());
                    } else if spec.required {
                        errors.push(FieldError::new(&spec.name, "field required"));
                    }
                }
                continue;
            };
            match coerce(v, spec.ty).and_then(|c| check_rule(&c, &spec.rule).map(|_| c)) {
                Ok(c) => {
                    out.insert(spec.name.clone(), c);
                }
                Err(message) => errors.push(FieldError::new(&spec.name, message)),
            }
        }
        let unknown: Vec<&String> = body.keys().filter(|k| schema.field(k).is_none()).collect();
        if !unknown.is_empty() {
            tracing::debug!(fields = ?unknown, "dropping fields not in schema");
        }
        if errors.is_empty() {
            Ok(out)
        } else {
            Err(errors)
        }
    }
}

fn coerce(v: &Value, ty: FieldType) -> Result<Value, String> {
    match ty {
        FieldType::Text => match v {
            Value::String(_) => Ok(v.clone()),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            _ => Err("value is not a valid string".into()),
        },
        FieldType::Integer => {
            let n = match v {
                Value::Number(n) => n
                    .as_i64()
                    .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64).map(|f| f as i64)),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            };
            n.map(Value::from).ok_or_else(|| "value is not a valid integer".into())
        }
        FieldType::Float => {
            let n = match v {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
                _ => None,
            };
            n.and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| "value is not a valid float".into())
        }
        FieldType::Boolean => {
            let b = match v {
                Value::Bool(b) => Some(*b),
                Value::Number(n) => match n.as_i64() {
                    Some(0) => Some(false),
                    Some(1) => Some(true),
                    _ => None,
                },
                Value::String(s) => match s.trim().to_lowercase().as_str() {
                    "true" | "1" | "yes" | "on" => Some(true),
                    "false" | "0" | "no" | "off" => Some(false),
                    _ => None,
                },
                _ => None,
            };
            b.map(Value::Bool).ok_or_else(|| "value could not be parsed to a boolean".into())
        }
        FieldType::Json => match v {
            Value::Array(_) | Value::Object(_) => Ok(v.clone()),
            _ => Err("value is not a valid list or object".into()),
        },
        FieldType::Date => v
            .as_str()
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok())
            .map(|d| Value::String(d.format(DATE_FORMAT).to_string()))
            .ok_or_else(|| "invalid date format".into()),
        FieldType::Timestamp => v
            .as_str()
            .and_then(|s| parse_timestamp(s.trim()))
            .map(|t| Value::String(t.format(TIMESTAMP_FORMAT).to_string()))
            .ok_or_else(|| "invalid datetime format".into()),
    }
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|t| t.naive_utc()))
}

fn check_rule(v: &Value, rule: &ValidationRule) -> Result<(), String> {
    if let Some(format) = rule.format {
        check_format(v, format)?;
    }
    if let Some(s) = v.as_str() {
        let len = s.chars().count();
        if let Some(max) = rule.max_length {
            if len > max {
                return Err(format!("ensure this value has at most {} characters", max));
            }
        }
        if let Some(min) = rule.min_length {
            if len < min {
                return Err(format!("ensure this value has at least {} characters", min));
            }
        }
        if let Some(re) = &rule.pattern {
            if !re.is_match(s) {
                return Err(format!("string does not match pattern '{}'", re.as_str()));
            }
        }
    }
    if let Some(allowed) = &rule.allowed {
        if !allowed.iter().any(|a| value_eq(v, a)) {
            return Err(format!(
                "value is not one of: {}",
                allowed.iter().take(5).map(Value::to_string).collect::<Vec<_>>().join(", ")
            ));
        }
    }
    if let Some(n) = v.as_f64() {
        if let Some(min) = rule.minimum {
            if n < min {
                return Err(format!("ensure this value is greater than or equal to {}", min));
            }
        }
        if let Some(max) = rule.maximum {
            if n > max {
                return Err(format!("ensure this value is less than or equal to {}", max));
            }
        }
    }
    Ok(())
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}

fn check_format(v: &Value, format: Format) -> Result<(), String> {
    let Some(s) = v.as_str() else {
        return Ok(());
    };
    match format {
        Format::Email => {
            let valid = s
                .split_once('@')
                .map(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.starts_with('.'))
                .unwrap_or(false);
            if !valid {
                return Err("value is not a valid email address".into());
            }
        }
        Format::Uuid => {
            if uuid::Uuid::parse_str(s).is_err() {
                return Err("value is not a valid uuid".into());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::schema::FieldSpec;
    use serde_json::json;

    fn item_schema() -> Schema {
        Schema::new(vec![
            FieldSpec::new("name", FieldType::Text).required().max_length(10),
            FieldSpec::new("email", FieldType::Text).format(Format::Email),
            FieldSpec::new("age", FieldType::Integer).minimum(0.0),
            FieldSpec::new("active", FieldType::Boolean).default_value(true),
            FieldSpec::new("tags", FieldType::Json),
            FieldSpec::new("born", FieldType::Date),
            FieldSpec::new("kind", FieldType::Text).allowed(["a", "b"]),
        ])
    }

    fn body(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn create_coerces_and_applies_defaults() {
        let out = RequestValidator::validate(
            &body(json!({"name": "Foo", "age": "42", "tags": ["x"], "born": "2020-01-02", "extra": 1})),
            &item_schema(),
            ValidationMode::Create,
        )
        .unwrap();
        assert_eq!(
            Value::Object(out),
            json!({"name": "Foo", "age": 42, "active": true, "tags": ["x"], "born": "2020-01-02"})
        );
    }

    #[test]
    fn create_reports_every_violated_field_and_only_those() {
        let errors = RequestValidator::validate(
            &body(json!({"email": "not-an-email", "age": -1, "kind": "c", "tags": "x"})),
            &item_schema(),
            ValidationMode::Create,
        )
        .unwrap_err();
        let mut fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        fields.sort();
        assert_eq!(fields, vec!["age", "email", "kind", "name", "tags"]);
    }

    #[test]
    fn update_ignores_missing_required_fields_and_defaults() {
        let out = RequestValidator::validate(
            &body(json!({"email": "foo@email.com"})),
            &item_schema(),
            ValidationMode::Update,
        )
        .unwrap();
        assert_eq!(Value::Object(out), json!({"email": "foo@email.com"}));
    }

    #[test]
    fn null_counts_as_missing() {
        let errors = RequestValidator::validate(&body(json!({"name": null})), &item_schema(), ValidationMode::Create)
            .unwrap_err();
        assert_eq!(errors, vec![FieldError::new("name", "field required")]);
    }

    #[test]
    fn max_length_counts_characters() {
        let errors = RequestValidator::validate(
            &body(json!({"name": "ééééééééééé"})),
            &item_schema(),
            ValidationMode::Create,
        )
        .unwrap_err();
        assert_eq!(errors[0].field, "name");
    }

    #[test]
    fn timestamps_normalize_to_fixed_format() {
        assert_eq!(
            coerce(&json!("2021-03-04T05:06:07Z"), FieldType::Timestamp).unwrap(),
            json!("2021-03-04 05:06:07")
        );
        assert!(coerce(&json!("yesterday"), FieldType::Timestamp).is_err());
        assert_eq!(coerce(&json!("yes"), FieldType::Boolean).unwrap(), json!(true));
        assert!(coerce(&json!(true), FieldType::Integer).is_err());
    }

    #[test]
    fn uuid_format() {
        let rule = ValidationRule {
            format: Some(Format::Uuid),
            ..Default::default()
        };
        assert!(check_rule(&json!("0b6a1b3e-4f7a-4a8e-9d1e-2c9f5b7a1d22"), &rule).is_ok());
        assert!(check_rule(&json!("nope"), &rule).is_err());
    }

    #[test]
    fn declared_pattern_is_applied_to_strings() {
        let schema = Schema::new(vec![FieldSpec::new("code", FieldType::Text).pattern("^[A-Z]{3}$").unwrap()]);
        assert!(RequestValidator::validate(&body(json!({"code": "ABC"})), &schema, ValidationMode::Create).is_ok());
        let errors = RequestValidator::validate(&body(json!({"code": "abcd"})), &schema, ValidationMode::Create)
            .unwrap_err();
        assert_eq!(
            errors,
            vec![FieldError::new("code", "string does not match pattern '^[A-Z]{3}$'")]
        );
    }
}
