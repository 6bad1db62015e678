//! Filter predicates: (column, operator, value) triples AND-ed into a WHERE clause.

use crate::error::BuildError;
use crate::sql::Query;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Comparison operator of a condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Like,
    ILike,
    In,
    NotIn,
}

impl Operator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::Le => "<=",
            Operator::Ge => ">=",
            Operator::Like => "LIKE",
            Operator::ILike => "ILIKE",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
        }
    }

    /// `IN` and `NOT IN` take a list or a sub-query, never a single literal.
    pub fn is_set_membership(&self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Operator {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        Ok(match normalized.as_str() {
            "=" | "==" => Operator::Eq,
            "!=" | "<>" => Operator::Ne,
            "<" => Operator::Lt,
            ">" => Operator::Gt,
            "<=" => Operator::Le,
            ">=" => Operator::Ge,
            "like" => Operator::Like,
            "ilike" => Operator::ILike,
            "in" => Operator::In,
            "not in" => Operator::NotIn,
            _ => return Err(BuildError::UnknownOperator(s.to_string())),
        })
    }
}

/// Right-hand side of a condition.
#[derive(Clone, Debug, PartialEq)]
pub enum ConditionValue {
    /// One value, one placeholder. JSON arrays and objects here are bound as a single jsonb value.
    Literal(Value),
    /// Expanded to one placeholder per element (for `IN` / `NOT IN`).
    List(Vec<Value>),
    /// Rendered inline as `(SELECT ...)`; its arguments continue the outer numbering.
    SubQuery(Box<Query>),
}

impl From<Value> for ConditionValue {
    fn from(v: Value) -> Self {
        ConditionValue::Literal(v)
    }
}

impl From<Query> for ConditionValue {
    fn from(q: Query) -> Self {
        ConditionValue::SubQuery(Box::new(q))
    }
}

impl From<Vec<Value>> for ConditionValue {
    fn from(values: Vec<Value>) -> Self {
        ConditionValue::List(values)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Condition {
    pub column: String,
    pub op: Operator,
    pub value: ConditionValue,
}

impl Condition {
    pub fn new(column: impl Into<String>, op: Operator, value: impl Into<ConditionValue>) -> Self {
        Condition {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    fn literal(column: impl Into<String>, op: Operator, value: impl Into<Value>) -> Self {
        Condition::new(column, op, ConditionValue::Literal(value.into()))
    }

    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::literal(column, Operator::Eq, value)
    }

    pub fn ne(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::literal(column, Operator::Ne, value)
    }

    pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::literal(column, Operator::Lt, value)
    }

    pub fn gt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::literal(column, Operator::Gt, value)
    }

    pub fn le(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::literal(column, Operator::Le, value)
    }

    pub fn ge(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::literal(column, Operator::Ge, value)
    }

    pub fn like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Condition::literal(column, Operator::Like, pattern.into())
    }

    pub fn ilike(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Condition::literal(column, Operator::ILike, pattern.into())
    }

    pub fn in_list<I, V>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect::<Vec<_>>();
        Condition::new(column, Operator::In, ConditionValue::List(values))
    }

    pub fn not_in<I, V>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect::<Vec<_>>();
        Condition::new(column, Operator::NotIn, ConditionValue::List(values))
    }

    /// `column IN (SELECT ...)`.
    pub fn in_query(column: impl Into<String>, query: Query) -> Self {
        Condition::new(column, Operator::In, query)
    }

    /// Number of positional arguments this condition binds, sub-queries included.
    pub fn arg_count(&self) -> usize {
        match &self.value {
            ConditionValue::Literal(_) => 1,
            ConditionValue::List(values) => values.len(),
            ConditionValue::SubQuery(q) => q.arg_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_operators_case_insensitively() {
        assert_eq!("ILIKE".parse::<Operator>().unwrap(), Operator::ILike);
        assert_eq!("not   in".parse::<Operator>().unwrap(), Operator::NotIn);
        assert_eq!("<>".parse::<Operator>().unwrap(), Operator::Ne);
        assert!(matches!(
            "between".parse::<Operator>(),
            Err(BuildError::UnknownOperator(op)) if op == "between"
        ));
    }

    #[test]
    fn arg_count_flattens_lists_and_sub_queries() {
        assert_eq!(Condition::eq("id", 1).arg_count(), 1);
        assert_eq!(Condition::in_list("id", [1, 2, 3]).arg_count(), 3);
        let sub = Query::table("orders")
            .columns(["item_id"])
            .filter(Condition::eq("status", "open"))
            .filter(Condition::in_list("region", ["eu", "us"]));
        assert_eq!(Condition::in_query("id", sub).arg_count(), 3);
    }

    #[test]
    fn json_array_literal_is_not_a_list() {
        let c = Condition::eq("tags", json!(["a", "b"]));
        assert_eq!(c.value, ConditionValue::Literal(json!(["a", "b"])));
        assert_eq!(c.arg_count(), 1);
    }
}
