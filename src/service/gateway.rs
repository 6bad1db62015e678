//! Table gateway: the only path from handlers to storage for one entity.
//!
//! Every call runs one statement inside its own transaction on a pooled connection.
//! `sqlx::Transaction` rolls back and hands the connection back to the pool when dropped,
//! so an early `?` return or a cancelled future never leaks a connection.

use crate::entity::{by_id, Entity};
use crate::error::AppError;
use crate::service::row::{first_cell, row_to_json, Row};
use crate::sql::{self, ColumnCasts, Condition, InsertOptions, PgBindValue, Query, QueryBuf, SelectOptions};
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{PgPool, Postgres, Row as _};
use std::marker::PhantomData;

pub struct TableGateway<E> {
    pool: PgPool,
    casts: ColumnCasts,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for TableGateway<E> {
    fn clone(&self) -> Self {
        TableGateway {
            pool: self.pool.clone(),
            casts: self.casts.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> TableGateway<E> {
    /// Column casts come from the entity's declared schema.
    pub fn new(pool: PgPool) -> Self {
        TableGateway {
            pool,
            casts: E::schema().map(|s| s.column_casts()).unwrap_or_default(),
            _entity: PhantomData,
        }
    }

    pub fn with_casts(mut self, casts: ColumnCasts) -> Self {
        self.casts = casts;
        self
    }

    pub fn casts(&self) -> &ColumnCasts {
        &self.casts
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn table(&self) -> &'static str {
        E::TABLE
    }

    fn query(&self, conditions: Vec<Condition>, options: SelectOptions) -> Query {
        options.into_query(E::TABLE, conditions).casts(self.casts.clone())
    }

    /// Zero or more rows.
    pub async fn select(&self, conditions: Vec<Condition>, options: SelectOptions) -> Result<Vec<Row>, AppError> {
        let q = sql::select(&self.query(conditions, options))?;
        let rows = self.fetch_all(&q).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    /// First row or none. Adds `LIMIT 1` unless `no_limit`.
    pub async fn select_one(
        &self,
        conditions: Vec<Condition>,
        options: SelectOptions,
        no_limit: bool,
    ) -> Result<Option<Row>, AppError> {
        let q = sql::select_one(&self.query(conditions, options), no_limit)?;
        let row = self.fetch_optional(&q).await?;
        Ok(row.as_ref().map(row_to_json))
    }

    /// First column of the first row.
    pub async fn select_val(
        &self,
        conditions: Vec<Condition>,
        options: SelectOptions,
        no_limit: bool,
    ) -> Result<Option<Value>, AppError> {
        let q = sql::select_one(&self.query(conditions, options), no_limit)?;
        let row = self.fetch_optional(&q).await?;
        Ok(row.as_ref().and_then(first_cell))
    }

    pub async fn count(&self, conditions: Vec<Condition>) -> Result<i64, AppError> {
        let q = sql::count(&self.query(conditions, SelectOptions::default()))?;
        let rows = self.fetch_all(&q).await?;
        let n = match rows.first() {
            Some(row) => row.try_get::<i64, _>(0)?,
            None => 0,
        };
        Ok(n)
    }

    /// Row lookup by primary key, within the entity's scope.
    pub async fn get(&self, id: i64) -> Result<Option<Row>, AppError> {
        self.select_one(by_id::<E>(id), SelectOptions::default(), false).await
    }

    /// Insert one or more rows in a single statement. Returns the `returning` column of each
    /// inserted row (empty when `options.returning` is unset).
    pub async fn insert(
        &self,
        columns: &[String],
        rows: &[Vec<Value>],
        options: InsertOptions,
    ) -> Result<Vec<Value>, AppError> {
        let q = sql::insert(E::TABLE, columns, rows, &options, &self.casts)?;
        if options.returning.is_none() {
            self.execute(&q).await?;
            return Ok(Vec::new());
        }
        let rows = self.fetch_all(&q).await?;
        Ok(rows.iter().filter_map(first_cell).collect())
    }

    /// Insert one row and return its primary key.
    pub async fn insert_one(&self, fields: Vec<(String, Value)>) -> Result<Option<Value>, AppError> {
        let (columns, values): (Vec<String>, Vec<Value>) = fields.into_iter().unzip();
        let ids = self
            .insert(&columns, &[values], InsertOptions::returning(E::PRIMARY_KEY))
            .await?;
        Ok(ids.into_iter().next())
    }

    /// Update matching rows; returns the first updated row.
    pub async fn update(&self, sets: &[(String, Value)], conditions: Vec<Condition>) -> Result<Option<Row>, AppError> {
        let q = sql::update(E::TABLE, sets, &conditions, &self.casts)?;
        let row = self.fetch_optional(&q).await?;
        Ok(row.as_ref().map(row_to_json))
    }

    /// Delete matching rows; returns the first deleted row.
    pub async fn delete(&self, conditions: Vec<Condition>) -> Result<Option<Row>, AppError> {
        let q = sql::delete(E::TABLE, &conditions, &self.casts)?;
        let row = self.fetch_optional(&q).await?;
        Ok(row.as_ref().map(row_to_json))
    }

    async fn fetch_all(&self, q: &QueryBuf) -> Result<Vec<PgRow>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut tx = self.pool.begin().await?;
        let rows = bind_params(sqlx::query::<Postgres>(&q.sql), &q.params)
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(rows)
    }

    async fn fetch_optional(&self, q: &QueryBuf) -> Result<Option<PgRow>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut tx = self.pool.begin().await?;
        let row = bind_params(sqlx::query::<Postgres>(&q.sql), &q.params)
            .fetch_optional(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn execute(&self, q: &QueryBuf) -> Result<u64, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "execute");
        let mut tx = self.pool.begin().await?;
        let done = bind_params(sqlx::query::<Postgres>(&q.sql), &q.params)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(done.rows_affected())
    }
}

fn bind_params<'q>(
    query: sqlx::query::Query<'q, Postgres, PgArguments>,
    params: &[Value],
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    params.iter().fold(query, |q, p| q.bind(PgBindValue::from(p)))
}
