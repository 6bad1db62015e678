//! Router assembly: entity routes under the API prefix behind the key check, common routes at the root.

use crate::auth::api_key_middleware;
use crate::config::Settings;
use crate::entity::{Entity, Resource};
use crate::error::AppError;
use crate::routes::{common_routes, entity_routes};
use crate::state::AppState;
use axum::{middleware, Router};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

async fn unknown_route() -> AppError {
    AppError::NotFound
}

pub struct App {
    settings: Settings,
    pool: PgPool,
    entities: Router,
}

impl App {
    pub fn new(settings: Settings, pool: PgPool) -> Self {
        App {
            settings,
            pool,
            entities: Router::new(),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Expose `E` at `path` with its declared schema.
    pub fn entity<E: Entity>(self, path: &str) -> Self {
        let resource = Resource::<E>::new(self.pool.clone());
        self.resource(path, resource)
    }

    /// Expose `E` at `path` with an explicitly configured resource.
    pub fn resource<E: Entity>(mut self, path: &str, resource: Resource<E>) -> Self {
        tracing::debug!(table = E::TABLE, path, "mounting entity");
        self.entities = self.entities.merge(entity_routes(path, resource));
        self
    }

    pub fn into_router(self) -> Router {
        let App {
            settings,
            pool,
            entities,
        } = self;

        // Unrouted paths under the prefix still go through the key check.
        let entities = entities.fallback(unknown_route);
        let api = if settings.testing {
            tracing::info!("test environment: api key check disabled");
            entities
        } else {
            entities.layer(middleware::from_fn_with_state(
                Arc::new(settings.api_keys.clone()),
                api_key_middleware,
            ))
        };

        // axum rejects nesting at "/", so an empty prefix merges instead.
        let prefix = settings.api_url.trim_end_matches('/');
        let router = if prefix.is_empty() {
            Router::new().merge(api)
        } else {
            Router::new().nest(prefix, api)
        };

        let state = AppState {
            pool,
            environment: settings.environment,
        };
        router
            .merge(common_routes(state))
            .layer(TraceLayer::new_for_http())
            .layer(RequestBodyLimitLayer::new(settings.body_limit))
    }
}
