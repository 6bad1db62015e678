//! Standard response envelope helpers: `{message, data, status}` plus `total` on lists.

use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct Envelope<T> {
    pub message: &'static str,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,
    pub status: &'static str,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Envelope {
            message: "All OK",
            data,
            total: None,
            status: "success",
        }
    }

    pub fn error(message: &'static str, status: &'static str, data: T) -> Self {
        Envelope {
            message,
            data,
            total: None,
            status,
        }
    }
}

pub fn success_ok<T: Serialize>(data: T) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::OK, Json(Envelope::ok(data)))
}

pub fn success_created<T: Serialize>(data: T) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::CREATED, Json(Envelope::ok(data)))
}

/// One page of rows plus the total matching the same conditions.
pub fn success_page<T: Serialize>(data: Vec<T>, total: i64) -> (StatusCode, Json<Envelope<Vec<T>>>) {
    (
        StatusCode::OK,
        Json(Envelope {
            total: Some(total),
            ..Envelope::ok(data)
        }),
    )
}
