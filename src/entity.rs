//! Entity declarations and the per-entity resource the CRUD handlers are generated for.

use crate::service::{Schema, TableGateway};
use crate::sql::{Condition, OrderBy};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;

/// A logical table exposed over REST. Implemented by a zero-sized marker type per entity.
pub trait Entity: Send + Sync + 'static {
    const TABLE: &'static str;
    const PRIMARY_KEY: &'static str = "id";

    /// Field table used to validate and coerce request bodies. `None` stores bodies as sent.
    fn schema() -> Option<Schema> {
        None
    }

    /// Ordering applied to list responses.
    fn order_by() -> Vec<OrderBy> {
        Vec::new()
    }

    /// Base conditions every handler query is restricted to. Rows outside it are not found.
    fn scope() -> Vec<Condition> {
        Vec::new()
    }

    /// Extra list conditions derived from query parameters (`offset`, `limit` and `api_key` are handled elsewhere).
    fn list_filters(_params: &HashMap<String, String>) -> Vec<Condition> {
        Vec::new()
    }
}

/// `conditions` restricted to the entity's scope.
pub fn scoped<E: Entity>(conditions: Vec<Condition>) -> Vec<Condition> {
    let mut all = E::scope();
    all.extend(conditions);
    all
}

/// The entity's row with primary key `id`, if it is in scope.
pub fn by_id<E: Entity>(id: i64) -> Vec<Condition> {
    scoped::<E>(vec![Condition::eq(E::PRIMARY_KEY, id)])
}

/// Gateway plus optional schema: the state behind one entity's handlers.
pub struct Resource<E> {
    gateway: TableGateway<E>,
    schema: Option<Arc<Schema>>,
}

impl<E> Clone for Resource<E> {
    fn clone(&self) -> Self {
        Resource {
            gateway: self.gateway.clone(),
            schema: self.schema.clone(),
        }
    }
}

impl<E: Entity> Resource<E> {
    /// Resource using the entity's declared schema.
    pub fn new(pool: PgPool) -> Self {
        Resource {
            gateway: TableGateway::new(pool),
            schema: E::schema().map(Arc::new),
        }
    }

    /// Replaces the declared schema; date and timestamp casts follow it.
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.gateway = self.gateway.with_casts(schema.column_casts());
        self.schema = Some(Arc::new(schema));
        self
    }

    pub fn without_schema(mut self) -> Self {
        self.schema = None;
        self
    }

    pub fn gateway(&self) -> &TableGateway<E> {
        &self.gateway
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_deref()
    }
}
