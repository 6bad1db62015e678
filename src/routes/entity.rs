//! Per-entity CRUD routes: `/{path}` (list, create) and `/{path}/:id` (read, update, delete).

use crate::entity::{Entity, Resource};
use crate::handlers::entity::{create, delete, list, missing_id, read, update};
use axum::{routing::get, Router};

/// Mount the five CRUD handlers for `E` at `path`, bound to `resource`.
pub fn entity_routes<E: Entity>(path: &str, resource: Resource<E>) -> Router {
    let base = format!("/{}", path.trim_matches('/'));
    Router::new()
        .route(
            &base,
            get(list::<E>)
                .post(create::<E>)
                .put(missing_id)
                .delete(missing_id),
        )
        .route(
            &format!("{}/:id", base),
            get(read::<E>).put(update::<E>).delete(delete::<E>),
        )
        .with_state(resource)
}
