//! Shared state for the common routes. Entity routes carry their own `Resource`.

use crate::config::Environment;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub environment: Environment,
}
