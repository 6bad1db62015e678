//! Builds parameterized SELECT, COUNT, INSERT, UPDATE, DELETE statements.
//!
//! Identifiers come from code and are quoted; every value travels in `QueryBuf::params`
//! and is referenced by a `$N` placeholder. Placeholders are numbered in the order they
//! appear in the SQL text, so a buffer shared between a SET list, a WHERE clause and any
//! nested sub-queries stays contiguous.

use crate::error::BuildError;
use crate::sql::{
    ColumnCasts, Condition, ConditionValue, Direction, InsertOptions, OnConflict, Operator, OrderBy, Query,
};
use serde_json::Value;

/// Quote identifier for PostgreSQL (safe: only from code).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Table name, optionally schema-qualified as `schema.table`.
fn qualified_table(table: &str) -> String {
    table.split('.').map(quoted).collect::<Vec<_>>().join(".")
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    pub fn new() -> Self {
        QueryBuf::default()
    }

    fn push_param(&mut self, v: Value) -> usize {
        self.params.push(v);
        self.params.len()
    }

    fn placeholder(&mut self, v: Value) -> String {
        format!("${}", self.push_param(v))
    }

    /// Placeholder for a value bound against `column`, cast when the column needs it.
    fn column_placeholder(&mut self, casts: &ColumnCasts, column: &str, v: Value) -> String {
        let ph = self.placeholder(v);
        match casts.get(column) {
            Some(ty) => format!("{}::{}", ph, ty),
            None => ph,
        }
    }
}

fn projection(columns: &[String]) -> String {
    if columns.is_empty() {
        "*".to_string()
    } else {
        columns.iter().map(|c| quoted(c)).collect::<Vec<_>>().join(", ")
    }
}

fn render_condition(q: &mut QueryBuf, c: &Condition, casts: &ColumnCasts) -> Result<String, BuildError> {
    let col = quoted(&c.column);
    match &c.value {
        ConditionValue::Literal(v) => {
            if c.op.is_set_membership() {
                return Err(BuildError::ExpectsList {
                    column: c.column.clone(),
                    op: c.op,
                });
            }
            let ph = q.column_placeholder(casts, &c.column, v.clone());
            Ok(format!("{} {} {}", col, c.op, ph))
        }
        ConditionValue::List(values) => {
            if !c.op.is_set_membership() {
                return Err(BuildError::UnexpectedList {
                    column: c.column.clone(),
                    op: c.op,
                });
            }
            if values.is_empty() {
                // `x IN ()` is not valid SQL; membership in an empty set is constant.
                return Ok(match c.op {
                    Operator::NotIn => "TRUE".to_string(),
                    _ => "FALSE".to_string(),
                });
            }
            let placeholders: Vec<String> = values
                .iter()
                .map(|v| q.column_placeholder(casts, &c.column, v.clone()))
                .collect();
            Ok(format!("{} {} ({})", col, c.op, placeholders.join(", ")))
        }
        ConditionValue::SubQuery(sub) => {
            let sub_sql = render_select(q, sub, &projection(&sub.columns))?;
            Ok(format!("{} {} ({})", col, c.op, sub_sql))
        }
    }
}

/// ` WHERE a = $n AND ...`, or an empty string when there are no conditions.
fn render_where(q: &mut QueryBuf, conditions: &[Condition], casts: &ColumnCasts) -> Result<String, BuildError> {
    if conditions.is_empty() {
        return Ok(String::new());
    }
    let mut parts = Vec::with_capacity(conditions.len());
    for c in conditions {
        parts.push(render_condition(q, c, casts)?);
    }
    Ok(format!(" WHERE {}", parts.join(" AND ")))
}

fn render_order_by(order_by: &[OrderBy]) -> String {
    if order_by.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = order_by
        .iter()
        .map(|o| {
            let dir = match o.direction {
                Direction::Asc => "ASC",
                Direction::Desc => "DESC",
            };
            format!("{} {}", quoted(&o.column), dir)
        })
        .collect();
    format!(" ORDER BY {}", parts.join(", "))
}

fn render_select(q: &mut QueryBuf, query: &Query, select_list: &str) -> Result<String, BuildError> {
    let mut sql = format!("SELECT {} FROM {}", select_list, qualified_table(&query.table));
    sql.push_str(&render_where(q, &query.conditions, &query.casts)?);
    sql.push_str(&render_order_by(&query.order_by));
    if let Some(offset) = query.offset {
        let ph = q.placeholder(Value::from(offset));
        sql.push_str(&format!(" OFFSET {}", ph));
    }
    if let Some(limit) = query.limit {
        let ph = q.placeholder(Value::from(limit));
        sql.push_str(&format!(" LIMIT {}", ph));
    }
    Ok(sql)
}

/// SELECT with optional WHERE, ORDER BY, OFFSET and LIMIT.
pub fn select(query: &Query) -> Result<QueryBuf, BuildError> {
    let mut q = QueryBuf::new();
    q.sql = render_select(&mut q, query, &projection(&query.columns))?;
    Ok(q)
}

/// SELECT for at most one row: appends `LIMIT 1` unless `no_limit` is set or the query already has a limit.
pub fn select_one(query: &Query, no_limit: bool) -> Result<QueryBuf, BuildError> {
    let mut q = select(query)?;
    if !no_limit && query.limit.is_none() {
        q.sql.push_str(" LIMIT 1");
    }
    Ok(q)
}

/// `SELECT count(*)` over the query's conditions; projection, ordering and paging are ignored.
pub fn count(query: &Query) -> Result<QueryBuf, BuildError> {
    let mut q = QueryBuf::new();
    let where_clause = render_where(&mut q, &query.conditions, &query.casts)?;
    q.sql = format!("SELECT count(*) FROM {}{}", qualified_table(&query.table), where_clause);
    Ok(q)
}

/// Multi-row INSERT: one `(...)` group per row, placeholders advancing across all rows.
pub fn insert(
    table: &str,
    columns: &[String],
    rows: &[Vec<Value>],
    options: &InsertOptions,
    casts: &ColumnCasts,
) -> Result<QueryBuf, BuildError> {
    if columns.is_empty() {
        return Err(BuildError::NoColumns("insert"));
    }
    if rows.is_empty() {
        return Err(BuildError::NoRows);
    }
    let mut q = QueryBuf::new();
    let mut groups = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        if row.len() != columns.len() {
            return Err(BuildError::RowArity {
                row: i,
                expected: columns.len(),
                got: row.len(),
            });
        }
        let placeholders: Vec<String> = columns
            .iter()
            .zip(row)
            .map(|(col, v)| q.column_placeholder(casts, col, v.clone()))
            .collect();
        groups.push(format!("({})", placeholders.join(", ")));
    }
    let mut sql = format!(
        "INSERT INTO {} ({}) VALUES {}",
        qualified_table(table),
        projection(columns),
        groups.join(", ")
    );
    match &options.on_conflict {
        Some(OnConflict::DoNothing) => sql.push_str(" ON CONFLICT DO NOTHING"),
        Some(OnConflict::DoNothingOn(target)) => {
            sql.push_str(&format!(" ON CONFLICT ({}) DO NOTHING", projection(target)));
        }
        None => {}
    }
    if let Some(returning) = &options.returning {
        sql.push_str(&format!(" RETURNING {}", quoted(returning)));
    }
    q.sql = sql;
    Ok(q)
}

/// UPDATE: SET values take $1..$k, WHERE values continue from $k+1. Returns the updated rows.
pub fn update(
    table: &str,
    sets: &[(String, Value)],
    conditions: &[Condition],
    casts: &ColumnCasts,
) -> Result<QueryBuf, BuildError> {
    if sets.is_empty() {
        return Err(BuildError::NoColumns("update"));
    }
    let mut q = QueryBuf::new();
    let assignments: Vec<String> = sets
        .iter()
        .map(|(col, v)| format!("{} = {}", quoted(col), q.column_placeholder(casts, col, v.clone())))
        .collect();
    let where_clause = render_where(&mut q, conditions, casts)?;
    q.sql = format!(
        "UPDATE {} SET {}{} RETURNING *",
        qualified_table(table),
        assignments.join(", "),
        where_clause
    );
    Ok(q)
}

/// DELETE with the same WHERE numbering as SELECT. Returns the deleted rows.
pub fn delete(table: &str, conditions: &[Condition], casts: &ColumnCasts) -> Result<QueryBuf, BuildError> {
    let mut q = QueryBuf::new();
    let where_clause = render_where(&mut q, conditions, casts)?;
    q.sql = format!("DELETE FROM {}{} RETURNING *", qualified_table(table), where_clause);
    Ok(q)
}
