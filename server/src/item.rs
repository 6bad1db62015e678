//! The `item` entity: name, email, free-form tags.

use crudkit::{Condition, Entity, FieldSpec, FieldType, Format, OrderBy, Schema};
use std::collections::HashMap;

pub const ITEM_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS item (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT,
    tags JSONB,
    created_at TIMESTAMP NOT NULL DEFAULT NOW()
)
"#;

pub struct Item;

impl Entity for Item {
    const TABLE: &'static str = "item";

    fn schema() -> Option<Schema> {
        Some(Schema::new(vec![
            FieldSpec::new("name", FieldType::Text).required().min_length(1).max_length(200),
            FieldSpec::new("email", FieldType::Text).format(Format::Email),
            FieldSpec::new("tags", FieldType::Json),
        ]))
    }

    fn order_by() -> Vec<OrderBy> {
        vec![OrderBy::asc("name"), OrderBy::asc("id")]
    }

    /// `?name=foo` matches names containing "foo", case-insensitively.
    fn list_filters(params: &HashMap<String, String>) -> Vec<Condition> {
        params
            .get("name")
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| vec![Condition::ilike("name", format!("%{}%", s))])
            .unwrap_or_default()
    }
}
