//! Storage access (table gateway, row decoding) and request validation.

mod gateway;
pub mod row;
mod schema;
mod validation;
pub use gateway::TableGateway;
pub use row::Row;
pub use schema::{FieldSpec, FieldType, Format, Schema, ValidationRule};
pub use validation::{FieldError, RequestValidator, ValidationMode, DATE_FORMAT, TIMESTAMP_FORMAT};
