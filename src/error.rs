//! Typed errors and HTTP mapping.

use crate::response::Envelope;
use crate::service::FieldError;
use crate::sql::Operator;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing setting: {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
    #[error("validation: {0}")]
    Validation(String),
}

/// Query construction errors. These indicate a caller bug, never bad user input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("{0} requires at least one column")]
    NoColumns(&'static str),
    #[error("insert requires at least one row")]
    NoRows,
    #[error("row {row} has {got} values, expected {expected}")]
    RowArity { row: usize, expected: usize, got: usize },
    #[error("operator {op} on column {column} requires a list or sub-query")]
    ExpectsList { column: String, op: Operator },
    #[error("operator {op} on column {column} does not take a list")]
    UnexpectedList { column: String, op: Operator },
    #[error("unknown operator: {0}")]
    UnknownOperator(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("query: {0}")]
    Build(#[from] BuildError),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_) | AppError::Build(_) | AppError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body: Envelope<Value> = match self {
            AppError::Forbidden => Envelope::error("forbidden", "forbidden", json!({})),
            AppError::NotFound => Envelope::error("Not found", "unknown", json!({})),
            AppError::Validation(details) => {
                Envelope::error("Validation Errors", "error", json!({ "details": details }))
            }
            AppError::BadRequest(message) => Envelope::error("Bad request", "error", json!({ "details": message })),
            other => {
                // Storage and internal failures: log the cause, answer generically.
                tracing::error!(error = %other, "request failed");
                Envelope::error("Internal server error", "error", json!({}))
            }
        };
        (status, Json(body)).into_response()
    }
}
