//! Entity-scoped query description: table, projection, conditions, ordering and paging.

use crate::sql::Condition;
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(column: impl Into<String>) -> Self {
        OrderBy {
            column: column.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        OrderBy {
            column: column.into(),
            direction: Direction::Desc,
        }
    }
}

/// Column to SQL type for values that must be cast on the server, e.g. `born` to `date`.
/// Strings bind as text, which Postgres will not assign to date or timestamp columns unless cast.
/// Types are `'static` so only code-supplied names reach the SQL text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnCasts(BTreeMap<String, &'static str>);

impl ColumnCasts {
    pub fn new() -> Self {
        ColumnCasts::default()
    }

    pub fn cast(mut self, column: impl Into<String>, sql_type: &'static str) -> Self {
        self.0.insert(column.into(), sql_type);
        self
    }

    pub fn get(&self, column: &str) -> Option<&'static str> {
        self.0.get(column).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A SELECT against one table. Also used as the value of a sub-query condition.
/// An empty `columns` list projects `*`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    pub table: String,
    pub columns: Vec<String>,
    pub conditions: Vec<Condition>,
    pub order_by: Vec<OrderBy>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
    /// Casts for values compared against this table's columns.
    pub casts: ColumnCasts,
}

impl Query {
    pub fn table(table: impl Into<String>) -> Self {
        Query {
            table: table.into(),
            ..Default::default()
        }
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn filters(mut self, conditions: impl IntoIterator<Item = Condition>) -> Self {
        self.conditions.extend(conditions);
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn casts(mut self, casts: ColumnCasts) -> Self {
        self.casts = casts;
        self
    }

    /// Positional arguments this query binds when rendered.
    pub fn arg_count(&self) -> usize {
        let where_args: usize = self.conditions.iter().map(Condition::arg_count).sum();
        where_args + self.offset.map_or(0, |_| 1) + self.limit.map_or(0, |_| 1)
    }
}

/// Trailing clause of a SELECT issued through a gateway (the table and conditions come from the call).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectOptions {
    pub columns: Vec<String>,
    pub order_by: Vec<OrderBy>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

impl SelectOptions {
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    pub fn page(mut self, offset: Option<i64>, limit: Option<i64>) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    pub fn into_query(self, table: impl Into<String>, conditions: Vec<Condition>) -> Query {
        Query {
            table: table.into(),
            columns: self.columns,
            conditions,
            order_by: self.order_by,
            offset: self.offset,
            limit: self.limit,
            casts: ColumnCasts::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OnConflict {
    /// `ON CONFLICT DO NOTHING`
    DoNothing,
    /// `ON CONFLICT ("a", "b") DO NOTHING`
    DoNothingOn(Vec<String>),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InsertOptions {
    /// Column to return per inserted row (usually the primary key).
    pub returning: Option<String>,
    pub on_conflict: Option<OnConflict>,
}

impl InsertOptions {
    pub fn returning(column: impl Into<String>) -> Self {
        InsertOptions {
            returning: Some(column.into()),
            on_conflict: None,
        }
    }

    pub fn on_conflict(mut self, on_conflict: OnConflict) -> Self {
        self.on_conflict = Some(on_conflict);
        self
    }
}
