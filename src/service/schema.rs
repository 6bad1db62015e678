//! Per-entity field specification table consumed by the request validator.

use crate::sql::ColumnCasts;
use regex::Regex;
use serde_json::Value;

/// Storage type a field is coerced to before it is bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Integer,
    Float,
    Boolean,
    /// List or object, stored as jsonb.
    Json,
    /// `YYYY-MM-DD`
    Date,
    /// `YYYY-MM-DD HH:MM:SS`
    Timestamp,
}

impl FieldType {
    /// Server-side cast for values bound as text.
    pub fn sql_cast(self) -> Option<&'static str> {
        match self {
            FieldType::Date => Some("date"),
            FieldType::Timestamp => Some("timestamp"),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Email,
    Uuid,
}

/// Constraints checked after coercion.
#[derive(Clone, Debug, Default)]
pub struct ValidationRule {
    pub format: Option<Format>,
    pub max_length: Option<usize>,
    pub min_length: Option<usize>,
    pub pattern: Option<Regex>,
    pub allowed: Option<Vec<Value>>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
}

#[derive(Clone, Debug)]
pub struct FieldSpec {
    pub name: String,
    pub ty: FieldType,
    pub required: bool,
    /// Applied on create when the field is absent or null.
    pub default: Option<Value>,
    pub rule: ValidationRule,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        FieldSpec {
            name: name.into(),
            ty,
            required: false,
            default: None,
            rule: ValidationRule::default(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, v: impl Into<Value>) -> Self {
        self.default = Some(v.into());
        self
    }

    pub fn format(mut self, format: Format) -> Self {
        self.rule.format = Some(format);
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        self.rule.max_length = Some(n);
        self
    }

    pub fn min_length(mut self, n: usize) -> Self {
        self.rule.min_length = Some(n);
        self
    }

    /// Compiled once here; a malformed pattern is a declaration error.
    pub fn pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.rule.pattern = Some(Regex::new(pattern)?);
        Ok(self)
    }

    pub fn allowed<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.rule.allowed = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn minimum(mut self, n: f64) -> Self {
        self.rule.minimum = Some(n);
        self
    }

    pub fn maximum(mut self, n: f64) -> Self {
        self.rule.maximum = Some(n);
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct Schema {
    pub fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Schema { fields }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Date and timestamp columns, which need a cast when bound from JSON strings.
    pub fn column_casts(&self) -> ColumnCasts {
        self.fields
            .iter()
            .filter_map(|f| f.ty.sql_cast().map(|ty| (f.name.as_str(), ty)))
            .fold(ColumnCasts::new(), |casts, (name, ty)| casts.cast(name, ty))
    }
}
