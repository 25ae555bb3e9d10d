//! Query abstract syntax tree.
//!
//! Pure data: the fluent [`crate::builder::Builder`] mutates a [`Query`] and
//! the grammar walks it. Clause variants are closed sum types so the compiler
//! can match exhaustively; no tag strings, no silent fall-through.

use crate::expr::{Expression, Operand};
use crate::operator::Operator;
use crate::value::Value;

/// The conjunction attached to a predicate. The first clause's conjunction
/// is stripped at emit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boolean {
    And,
    Or,
}

impl Boolean {
    pub fn as_str(self) -> &'static str {
        match self {
            Boolean::And => "and",
            Boolean::Or => "or",
        }
    }
}

/// Sort direction for `order by`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

/// A column position that is either a plain (wrappable) name or a raw
/// expression emitted verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnRef {
    Name(String),
    Raw(Expression),
}

impl From<&str> for ColumnRef {
    fn from(name: &str) -> Self {
        ColumnRef::Name(name.to_owned())
    }
}

impl From<String> for ColumnRef {
    fn from(name: String) -> Self {
        ColumnRef::Name(name)
    }
}

impl From<Expression> for ColumnRef {
    fn from(e: Expression) -> Self {
        ColumnRef::Raw(e)
    }
}

/// An entry of the select list.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectColumn {
    Name(String),
    Raw(Expression),
    /// A correlated sub-select with an alias. Compiled with the parent's
    /// running binding offset so dollar-style numbering stays gapless.
    Sub { query: Box<Query>, alias: String },
}

/// The `from` clause.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FromClause {
    #[default]
    None,
    Table {
        name: String,
        alias: Option<String>,
    },
    Raw(Expression),
    Sub {
        query: Box<Query>,
        alias: Option<String>,
    },
}

/// A single `where` predicate: a closed clause variant plus its conjunction.
#[derive(Debug, Clone, PartialEq)]
pub struct Where {
    pub boolean: Boolean,
    pub kind: WhereKind,
}

/// The closed set of predicate shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereKind {
    /// `column op value`
    Basic {
        column: String,
        operator: Operator,
        value: Operand,
    },
    /// `column is null`
    Null { column: String },
    /// `column is not null`
    NotNull { column: String },
    /// `first op second` comparing two columns
    Column {
        first: String,
        operator: Operator,
        second: String,
    },
    /// A predicate built around a sub-select:
    /// `column op (sub)` when `column` is set,
    /// `(sub) op value` when `value` is set,
    /// `exists (sub)` / `not exists (sub)` when neither is.
    Sub {
        column: Option<String>,
        operator: Operator,
        query: Box<Query>,
        value: Option<Operand>,
    },
    /// A parenthesized group of inner predicates.
    Nested { query: Box<Query> },
    /// `column [not] between min and max`
    Between {
        column: String,
        not: bool,
        min: Operand,
        max: Operand,
    },
    /// Raw predicate SQL, emitted verbatim.
    Raw { sql: Expression },
}

/// A join and its `on` conditions, held as a nested join-clause query.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub table: String,
    pub query: Box<Query>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Cross,
}

impl JoinKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JoinKind::Inner => "inner",
            JoinKind::Left => "left",
            JoinKind::Right => "right",
            JoinKind::Cross => "cross",
        }
    }
}

/// A `having` clause entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Having {
    pub boolean: Boolean,
    pub kind: HavingKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HavingKind {
    Basic {
        column: String,
        operator: Operator,
        value: Operand,
    },
    Between {
        column: String,
        not: bool,
        min: Operand,
        max: Operand,
    },
    Raw { sql: Expression },
}

/// An `order by` entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Order {
    Column { column: String, direction: Direction },
    Raw(Expression),
}

/// A `union` / `union all` arm.
#[derive(Debug, Clone, PartialEq)]
pub struct Union {
    pub all: bool,
    pub query: Box<Query>,
}

/// An aggregate projection (`select func(cols) as aggregate`).
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub func: String,
    pub columns: Vec<ColumnRef>,
}

/// Row-level lock request appended after the final clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lock {
    ForUpdate,
    Shared,
}

/// Binding values partitioned by clause phase.
///
/// The flatten order is the compiler's emit order, which is what keeps
/// placeholders and values aligned left-to-right.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bindings {
    pub select: Vec<Value>,
    pub from: Vec<Value>,
    pub join: Vec<Value>,
    pub wheres: Vec<Value>,
    pub group_by: Vec<Value>,
    pub having: Vec<Value>,
    pub order: Vec<Value>,
    pub union: Vec<Value>,
}

impl Bindings {
    /// All bindings in emit order, with `in (...)` lists expanded.
    pub fn flatten(&self) -> Vec<Value> {
        let phases = [
            &self.select,
            &self.from,
            &self.join,
            &self.wheres,
            &self.group_by,
            &self.having,
            &self.order,
            &self.union,
        ];
        let mut out = Vec::new();
        for phase in phases {
            for value in phase {
                match value {
                    Value::Array(items) => out.extend(items.iter().cloned()),
                    other => out.push(other.clone()),
                }
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.flatten().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The query AST: a short-lived mutable assembler filled by the builder.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    pub from: FromClause,
    pub columns: Vec<SelectColumn>,
    pub joins: Vec<Join>,
    pub wheres: Vec<Where>,
    pub groups: Vec<ColumnRef>,
    pub havings: Vec<Having>,
    pub orders: Vec<Order>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub lock: Option<Lock>,
    pub unions: Vec<Union>,
    pub union_orders: Vec<Order>,
    pub union_limit: Option<u64>,
    pub union_offset: Option<u64>,
    pub aggregate: Option<Aggregate>,
    pub distinct: bool,
    pub distinct_columns: Vec<ColumnRef>,
    /// Switches the where compiler's conjunction from `where` to `on`.
    pub is_join_clause: bool,
    pub bindings: Bindings,
}

impl Query {
    /// A fresh child query for closures; join-clause queries propagate the
    /// flag so nested groups slice the right prefix at emit.
    pub(crate) fn child(&self) -> Query {
        Query {
            is_join_clause: self.is_join_clause,
            ..Query::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_phase_order() {
        let mut b = Bindings::default();
        b.union.push(Value::Int(8));
        b.wheres.push(Value::Text("w".into()));
        b.select.push(Value::Int(1));
        b.having.push(Value::Int(5));
        assert_eq!(
            b.flatten(),
            vec![
                Value::Int(1),
                Value::Text("w".into()),
                Value::Int(5),
                Value::Int(8),
            ]
        );
    }

    #[test]
    fn test_flatten_expands_in_lists() {
        let mut b = Bindings::default();
        b.wheres.push(Value::array([1, 2, 3]));
        b.wheres.push(Value::Int(9));
        assert_eq!(b.flatten().len(), 4);
    }
}
