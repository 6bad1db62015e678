//! Generic CRUD handlers, instantiated once per entity by `entity_routes`.

use crate::entity::{by_id, scoped, Entity, Resource};
use crate::error::AppError;
use crate::response::{success_created, success_ok, success_page};
use crate::service::{RequestValidator, ValidationMode};
use crate::sql::SelectOptions;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Upper bound on `limit` for list requests.
pub const MAX_PAGE_SIZE: i64 = 1000;

/// Identifiers are integer primary keys; anything else names no row.
fn parse_id(id: &str) -> Result<i64, AppError> {
    id.trim().parse().map_err(|_| AppError::NotFound)
}

/// Non-negative integer query parameter; malformed values are ignored.
fn page_param(params: &HashMap<String, String>, key: &str) -> Option<i64> {
    params.get(key).and_then(|v| v.trim().parse::<i64>().ok()).filter(|n| *n >= 0)
}

/// Request body as a field map. Empty body or `{}` is a missing body (404).
fn parse_body(body: &Bytes) -> Result<Map<String, Value>, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::NotFound);
    }
    let value: Value =
        serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("invalid JSON body: {}", e)))?;
    match value {
        Value::Object(m) if m.is_empty() => Err(AppError::NotFound),
        Value::Object(m) => Ok(m),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}

/// Validate and coerce against the entity schema, if it has one.
fn prepare<E: Entity>(
    resource: &Resource<E>,
    body: Map<String, Value>,
    mode: ValidationMode,
) -> Result<Map<String, Value>, AppError> {
    match resource.schema() {
        Some(schema) => RequestValidator::validate(&body, schema, mode).map_err(|errors| {
            tracing::debug!(table = E::TABLE, errors = errors.len(), "validation failed");
            AppError::Validation(errors)
        }),
        None => Ok(body),
    }
}

/// GET /{path}: one page plus the total matching the same filters and scope.
pub async fn list<E: Entity>(
    State(resource): State<Resource<E>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let conditions = scoped::<E>(E::list_filters(&params));
    let offset = page_param(&params, "offset");
    let limit = page_param(&params, "limit").map(|n| n.min(MAX_PAGE_SIZE));
    let options = SelectOptions {
        order_by: E::order_by(),
        ..SelectOptions::default()
    }
    .page(offset, limit);

    let gateway = resource.gateway();
    let total = gateway.count(conditions.clone()).await?;
    let rows = gateway.select(conditions, options).await?;
    Ok(success_page(rows, total))
}

/// GET /{path}/{id}
pub async fn read<E: Entity>(
    State(resource): State<Resource<E>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let row = resource.gateway().get(id).await?.ok_or(AppError::NotFound)?;
    Ok(success_ok(row))
}

/// POST /{path}: insert one row, answer with its generated id.
pub async fn create<E: Entity>(
    State(resource): State<Resource<E>>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let fields = prepare(&resource, parse_body(&body)?, ValidationMode::Create)?;
    let id = resource
        .gateway()
        .insert_one(fields.into_iter().collect())
        .await?
        .unwrap_or(Value::Null);
    tracing::info!(table = E::TABLE, %id, "created");
    let mut data = Map::new();
    data.insert(E::PRIMARY_KEY.to_string(), id);
    Ok(success_created(Value::Object(data)))
}

/// PUT /{path}/{id}: partial update, answer with the updated row.
pub async fn update<E: Entity>(
    State(resource): State<Resource<E>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let fields = prepare(&resource, parse_body(&body)?, ValidationMode::Update)?;
    if fields.is_empty() {
        return Err(AppError::BadRequest("no known fields to update".into()));
    }
    let sets: Vec<(String, Value)> = fields.into_iter().collect();
    let row = resource
        .gateway()
        .update(&sets, by_id::<E>(id))
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(success_ok(row))
}

/// DELETE /{path}/{id}: answer with the deleted row.
pub async fn delete<E: Entity>(
    State(resource): State<Resource<E>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let row = resource
        .gateway()
        .delete(by_id::<E>(id))
        .await?
        .ok_or(AppError::NotFound)?;
    tracing::info!(table = E::TABLE, id, "deleted");
    Ok(success_ok(row))
}

/// PUT or DELETE on the collection path: the identifier segment is missing.
pub async fn missing_id() -> AppError {
    AppError::NotFound
}
