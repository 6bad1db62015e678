//! crudkit: generic REST CRUD endpoints over PostgreSQL tables.
//!
//! Declare an [`Entity`], mount it on an [`App`], and every entity gets list, read,
//! create, update and delete handlers backed by a [`TableGateway`] that builds
//! parameterised SQL.

pub mod app;
pub mod auth;
pub mod config;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use app::App;
pub use config::{ApiKeys, DatabaseSettings, Environment, Settings};
pub use entity::{Entity, Resource};
pub use error::{AppError, BuildError, ConfigError};
pub use response::{success_created, success_ok, success_page, Envelope};
pub use routes::{common_routes, entity_routes};
pub use service::{FieldSpec, FieldType, Format, Row, Schema, TableGateway};
pub use sql::{Condition, ConditionValue, Operator, OrderBy, Query, SelectOptions};
pub use state::AppState;
pub use store::{connect_pool, ensure_database_exists, execute_ddl};
