//! The fluent query builder.
//!
//! Every method mutates the underlying [`Query`] and returns `&mut Self` for
//! chaining. Closure arguments receive a fresh child builder that shares the
//! grammar but never observes the parent; when the closure returns, the
//! parent absorbs the child's AST and bindings.
//!
//! Usage errors (bad operator, bad arity) are recorded at call time and
//! surfaced by [`Builder::to_sql`] before any compilation is attempted —
//! chaining methods cannot return `Result`.

use crate::ast::{
    Aggregate, Boolean, ColumnRef, Direction, FromClause, Having, HavingKind, Join, JoinKind,
    Lock, Order, Query, SelectColumn, Union, Where, WhereKind,
};
use crate::error::{QuernError, Result};
use crate::executor::{ExecResult, Executor, Row, Rows};
use crate::expr::{Expression, Operand};
use crate::grammar::{self, Grammar};
use crate::operator::Operator;
use crate::value::Value;
use compact_str::CompactString;
use std::sync::Arc;

/// One row of the array-of-arrays `where` shorthand: `(column, value)` or
/// `(column, operator, value)`.
#[derive(Debug, Clone)]
pub struct Condition {
    column: String,
    operator: Option<String>,
    value: Operand,
}

impl<V: Into<Operand>> From<(&str, V)> for Condition {
    fn from((column, value): (&str, V)) -> Self {
        Condition {
            column: column.to_owned(),
            operator: None,
            value: value.into(),
        }
    }
}

impl<V: Into<Operand>> From<(&str, &str, V)> for Condition {
    fn from((column, operator, value): (&str, &str, V)) -> Self {
        Condition {
            column: column.to_owned(),
            operator: Some(operator.to_owned()),
            value: value.into(),
        }
    }
}

/// Fluent assembler over a [`Query`] bound to a grammar and, optionally, an
/// executor. Single-threaded by design: one builder, one thread.
pub struct Builder {
    query: Query,
    grammar: Arc<dyn Grammar>,
    executor: Option<Arc<dyn Executor>>,
    error: Option<CompactString>,
}

impl Builder {
    /// A builder that can compile but not execute.
    pub fn new(grammar: Arc<dyn Grammar>) -> Self {
        Builder {
            query: Query::default(),
            grammar,
            executor: None,
            error: None,
        }
    }

    /// A builder bound to an executor.
    pub fn with_executor(grammar: Arc<dyn Grammar>, executor: Arc<dyn Executor>) -> Self {
        Builder {
            executor: Some(executor),
            ..Builder::new(grammar)
        }
    }

    /// A builder using a grammar from the process-wide registry.
    pub fn for_driver(driver: &str) -> Result<Self> {
        Ok(Builder::new(grammar::resolve(driver)?))
    }

    /// The grammar this builder compiles with.
    pub fn grammar(&self) -> &Arc<dyn Grammar> {
        &self.grammar
    }

    /// Read access to the assembled AST.
    pub fn query(&self) -> &Query {
        &self.query
    }

    fn child(&self) -> Builder {
        Builder {
            query: self.query.child(),
            grammar: Arc::clone(&self.grammar),
            executor: self.executor.clone(),
            error: None,
        }
    }

    fn build_child(&mut self, f: impl FnOnce(&mut Builder)) -> Query {
        let mut child = self.child();
        f(&mut child);
        if let Some(err) = child.error.take() {
            self.fail_msg(err);
        }
        child.query
    }

    fn fail_msg(&mut self, msg: CompactString) {
        if self.error.is_none() {
            self.error = Some(msg);
        }
    }

    fn fail(&mut self, err: QuernError) {
        let msg = match err {
            QuernError::Usage(msg) => msg,
            other => CompactString::from(other.to_string()),
        };
        self.fail_msg(msg);
    }

    // ==================== from ====================

    /// Sets the root table.
    pub fn table(&mut self, name: &str) -> &mut Self {
        self.query.from = FromClause::Table {
            name: name.to_owned(),
            alias: None,
        };
        self
    }

    /// Alias of [`Builder::table`].
    pub fn from(&mut self, name: &str) -> &mut Self {
        self.table(name)
    }

    /// Sets the root table with an alias.
    pub fn from_as(&mut self, name: &str, alias: &str) -> &mut Self {
        self.query.from = FromClause::Table {
            name: name.to_owned(),
            alias: Some(alias.to_owned()),
        };
        self
    }

    /// Selects from a derived table built by `f`.
    pub fn from_sub(&mut self, f: impl FnOnce(&mut Builder), alias: &str) -> &mut Self {
        let mut sub = self.build_child(f);
        sub.is_join_clause = false;
        self.query.bindings.from.extend(sub.bindings.flatten());
        self.query.from = FromClause::Sub {
            query: Box::new(sub),
            alias: Some(alias.to_owned()),
        };
        self
    }

    /// Selects from a raw table expression.
    pub fn from_raw(&mut self, sql: impl Into<Expression>) -> &mut Self {
        self.query.from = FromClause::Raw(sql.into());
        self
    }

    // ==================== select ====================

    /// Replaces the select list.
    pub fn select<I>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<ColumnRef>,
    {
        self.query.columns = columns
            .into_iter()
            .map(|c| match c.into() {
                ColumnRef::Name(name) => SelectColumn::Name(name),
                ColumnRef::Raw(e) => SelectColumn::Raw(e),
            })
            .collect();
        self
    }

    /// Appends one column to the select list.
    pub fn add_select(&mut self, column: &str) -> &mut Self {
        self.query.columns.push(SelectColumn::Name(column.to_owned()));
        self
    }

    /// Appends a raw select expression.
    pub fn select_raw(&mut self, sql: impl Into<Expression>) -> &mut Self {
        self.query.columns.push(SelectColumn::Raw(sql.into()));
        self
    }

    /// Appends a raw select expression with `?` placeholder bindings.
    pub fn select_raw_bindings<I>(&mut self, sql: impl Into<Expression>, bindings: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.query.columns.push(SelectColumn::Raw(sql.into()));
        self.query
            .bindings
            .select
            .extend(bindings.into_iter().map(Into::into));
        self
    }

    /// Appends an aliased sub-select built by `f`.
    pub fn select_sub(&mut self, f: impl FnOnce(&mut Builder), alias: &str) -> &mut Self {
        let mut sub = self.build_child(f);
        sub.is_join_clause = false;
        self.query.bindings.select.extend(sub.bindings.flatten());
        self.query.columns.push(SelectColumn::Sub {
            query: Box::new(sub),
            alias: alias.to_owned(),
        });
        self
    }

    /// Marks the query `select distinct`.
    pub fn distinct(&mut self) -> &mut Self {
        self.query.distinct = true;
        self
    }

    /// Restricts distinctness to the given columns (aggregate queries).
    pub fn distinct_on<I>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<ColumnRef>,
    {
        self.query.distinct = true;
        self.query.distinct_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    // ==================== where ====================

    fn push_where(&mut self, boolean: Boolean, kind: WhereKind) {
        self.query.wheres.push(Where { boolean, kind });
    }

    fn push_basic(&mut self, boolean: Boolean, column: &str, operator: Operator, value: Operand) {
        // Null values promote to dedicated null predicates.
        if value.is_null() {
            let kind = match operator.as_str() {
                "=" | "is" => WhereKind::Null {
                    column: column.to_owned(),
                },
                "!=" | "<>" | "is not" => WhereKind::NotNull {
                    column: column.to_owned(),
                },
                other => {
                    self.fail(QuernError::usage(format!(
                        "operator `{other}` cannot compare against null"
                    )));
                    return;
                }
            };
            self.push_where(boolean, kind);
            return;
        }
        if let Operand::Value(v) = &value {
            self.query.bindings.wheres.push(v.clone());
        }
        self.push_where(
            boolean,
            WhereKind::Basic {
                column: column.to_owned(),
                operator,
                value,
            },
        );
    }

    fn push_op(&mut self, boolean: Boolean, column: &str, op: &str, value: Operand) {
        let operator = match Operator::parse(op) {
            Ok(op) => op,
            Err(err) => {
                self.fail(err);
                return;
            }
        };
        if operator.as_str() == "between" {
            match value {
                Operand::Value(Value::Array(items)) if items.len() == 2 => {
                    let mut items = items.into_iter();
                    let min = Operand::Value(items.next().unwrap_or(Value::Null));
                    let max = Operand::Value(items.next().unwrap_or(Value::Null));
                    self.push_between(boolean, column, false, min, max);
                }
                _ => self.fail(QuernError::usage(
                    "`between` requires exactly two values",
                )),
            }
            return;
        }
        self.push_basic(boolean, column, operator, value);
    }

    /// `where column = value`; a null value compiles to `is null`.
    pub fn where_(&mut self, column: &str, value: impl Into<Operand>) -> &mut Self {
        self.push_basic(Boolean::And, column, Operator::eq(), value.into());
        self
    }

    /// `or where column = value`.
    pub fn or_where(&mut self, column: &str, value: impl Into<Operand>) -> &mut Self {
        self.push_basic(Boolean::Or, column, Operator::eq(), value.into());
        self
    }

    /// `where column op value` with an operator from the closed set.
    pub fn where_op(&mut self, column: &str, op: &str, value: impl Into<Operand>) -> &mut Self {
        self.push_op(Boolean::And, column, op, value.into());
        self
    }

    /// `or where column op value`.
    pub fn or_where_op(&mut self, column: &str, op: &str, value: impl Into<Operand>) -> &mut Self {
        self.push_op(Boolean::Or, column, op, value.into());
        self
    }

    fn push_group(&mut self, boolean: Boolean, f: impl FnOnce(&mut Builder)) {
        let sub = self.build_child(f);
        if sub.wheres.is_empty() {
            return;
        }
        self.query.bindings.wheres.extend(sub.bindings.flatten());
        self.push_where(
            boolean,
            WhereKind::Nested {
                query: Box::new(sub),
            },
        );
    }

    /// Groups the predicates added by `f` in parentheses.
    pub fn where_group(&mut self, f: impl FnOnce(&mut Builder)) -> &mut Self {
        self.push_group(Boolean::And, f);
        self
    }

    /// `or (...)` variant of [`Builder::where_group`].
    pub fn or_where_group(&mut self, f: impl FnOnce(&mut Builder)) -> &mut Self {
        self.push_group(Boolean::Or, f);
        self
    }

    /// Array-of-arrays shorthand: each row is `(column, value)` or
    /// `(column, operator, value)`, grouped in one parenthesized block.
    pub fn where_all<I>(&mut self, conditions: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Condition>,
    {
        let conditions: Vec<Condition> = conditions.into_iter().map(Into::into).collect();
        self.where_group(move |q| {
            for cond in conditions {
                match cond.operator {
                    Some(op) => q.where_op(&cond.column, &op, cond.value),
                    None => q.where_(&cond.column, cond.value),
                };
            }
        })
    }

    fn push_sub(
        &mut self,
        boolean: Boolean,
        column: Option<String>,
        op: &str,
        f: impl FnOnce(&mut Builder),
        value: Option<Operand>,
    ) {
        let operator = match Operator::parse(op) {
            Ok(op) => op,
            Err(err) => {
                self.fail(err);
                return;
            }
        };
        let mut sub = self.build_child(f);
        sub.is_join_clause = false;
        self.query.bindings.wheres.extend(sub.bindings.flatten());
        if let Some(Operand::Value(v)) = &value {
            self.query.bindings.wheres.push(v.clone());
        }
        self.push_where(
            boolean,
            WhereKind::Sub {
                column,
                operator,
                query: Box::new(sub),
                value,
            },
        );
    }

    /// `where column op (select ...)` — the closure builds the sub-select.
    pub fn where_sub(&mut self, column: &str, op: &str, f: impl FnOnce(&mut Builder)) -> &mut Self {
        self.push_sub(Boolean::And, Some(column.to_owned()), op, f, None);
        self
    }

    /// `or where column op (select ...)`.
    pub fn or_where_sub(
        &mut self,
        column: &str,
        op: &str,
        f: impl FnOnce(&mut Builder),
    ) -> &mut Self {
        self.push_sub(Boolean::Or, Some(column.to_owned()), op, f, None);
        self
    }

    /// `where (select ...) op value` — the sub-select on the left.
    pub fn where_query(
        &mut self,
        f: impl FnOnce(&mut Builder),
        op: &str,
        value: impl Into<Operand>,
    ) -> &mut Self {
        self.push_sub(Boolean::And, None, op, f, Some(value.into()));
        self
    }

    /// `where exists (select ...)`.
    pub fn where_exists(&mut self, f: impl FnOnce(&mut Builder)) -> &mut Self {
        self.push_sub(Boolean::And, None, "exists", f, None);
        self
    }

    /// `where not exists (select ...)`.
    pub fn where_not_exists(&mut self, f: impl FnOnce(&mut Builder)) -> &mut Self {
        self.push_sub(Boolean::And, None, "not exists", f, None);
        self
    }

    /// `where column is null`.
    pub fn where_null(&mut self, column: &str) -> &mut Self {
        self.push_where(
            Boolean::And,
            WhereKind::Null {
                column: column.to_owned(),
            },
        );
        self
    }

    /// `or where column is null`.
    pub fn or_where_null(&mut self, column: &str) -> &mut Self {
        self.push_where(
            Boolean::Or,
            WhereKind::Null {
                column: column.to_owned(),
            },
        );
        self
    }

    /// `where column is not null`.
    pub fn where_not_null(&mut self, column: &str) -> &mut Self {
        self.push_where(
            Boolean::And,
            WhereKind::NotNull {
                column: column.to_owned(),
            },
        );
        self
    }

    /// `or where column is not null`.
    pub fn or_where_not_null(&mut self, column: &str) -> &mut Self {
        self.push_where(
            Boolean::Or,
            WhereKind::NotNull {
                column: column.to_owned(),
            },
        );
        self
    }

    fn push_between(
        &mut self,
        boolean: Boolean,
        column: &str,
        not: bool,
        min: Operand,
        max: Operand,
    ) {
        for operand in [&min, &max] {
            if let Operand::Value(v) = operand {
                self.query.bindings.wheres.push(v.clone());
            }
        }
        self.push_where(
            boolean,
            WhereKind::Between {
                column: column.to_owned(),
                not,
                min,
                max,
            },
        );
    }

    /// `where column between min and max`.
    pub fn where_between(
        &mut self,
        column: &str,
        min: impl Into<Operand>,
        max: impl Into<Operand>,
    ) -> &mut Self {
        self.push_between(Boolean::And, column, false, min.into(), max.into());
        self
    }

    /// `where column not between min and max`.
    pub fn where_not_between(
        &mut self,
        column: &str,
        min: impl Into<Operand>,
        max: impl Into<Operand>,
    ) -> &mut Self {
        self.push_between(Boolean::And, column, true, min.into(), max.into());
        self
    }

    /// `or where column between min and max`.
    pub fn or_where_between(
        &mut self,
        column: &str,
        min: impl Into<Operand>,
        max: impl Into<Operand>,
    ) -> &mut Self {
        self.push_between(Boolean::Or, column, false, min.into(), max.into());
        self
    }

    fn push_in(&mut self, boolean: Boolean, column: &str, not: bool, values: Vec<Value>) {
        let list = Value::Array(values);
        if list.scalar_count() > 0 {
            self.query.bindings.wheres.push(list.clone());
        }
        self.push_where(
            boolean,
            WhereKind::Basic {
                column: column.to_owned(),
                operator: Operator::in_list(not),
                value: Operand::Value(list),
            },
        );
    }

    /// `where column in (...)`.
    pub fn where_in<I>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.push_in(Boolean::And, column, false, values);
        self
    }

    /// `where column not in (...)`.
    pub fn where_not_in<I>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.push_in(Boolean::And, column, true, values);
        self
    }

    /// `or where column in (...)`.
    pub fn or_where_in<I>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.push_in(Boolean::Or, column, false, values);
        self
    }

    fn push_column_cmp(&mut self, boolean: Boolean, first: &str, op: &str, second: &str) {
        let operator = match Operator::parse(op) {
            Ok(op) => op,
            Err(err) => {
                self.fail(err);
                return;
            }
        };
        self.push_where(
            boolean,
            WhereKind::Column {
                first: first.to_owned(),
                operator,
                second: second.to_owned(),
            },
        );
    }

    /// `where first op second` comparing two columns.
    pub fn where_column(&mut self, first: &str, op: &str, second: &str) -> &mut Self {
        self.push_column_cmp(Boolean::And, first, op, second);
        self
    }

    /// `or where first op second` comparing two columns.
    pub fn or_where_column(&mut self, first: &str, op: &str, second: &str) -> &mut Self {
        self.push_column_cmp(Boolean::Or, first, op, second);
        self
    }

    /// Raw predicate SQL, emitted verbatim.
    pub fn where_raw(&mut self, sql: impl Into<Expression>) -> &mut Self {
        self.push_where(Boolean::And, WhereKind::Raw { sql: sql.into() });
        self
    }

    /// `or` variant of [`Builder::where_raw`].
    pub fn or_where_raw(&mut self, sql: impl Into<Expression>) -> &mut Self {
        self.push_where(Boolean::Or, WhereKind::Raw { sql: sql.into() });
        self
    }

    /// Raw predicate SQL with `?` placeholder bindings.
    pub fn where_raw_bindings<I>(&mut self, sql: impl Into<Expression>, bindings: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.query
            .bindings
            .wheres
            .extend(bindings.into_iter().map(Into::into));
        self.push_where(Boolean::And, WhereKind::Raw { sql: sql.into() });
        self
    }

    // ==================== join clause conditions ====================

    /// `on first op second` inside a join closure.
    pub fn on(&mut self, first: &str, op: &str, second: &str) -> &mut Self {
        self.where_column(first, op, second)
    }

    /// `or on first op second` inside a join closure.
    pub fn or_on(&mut self, first: &str, op: &str, second: &str) -> &mut Self {
        self.or_where_column(first, op, second)
    }

    // ==================== joins ====================

    fn push_join(&mut self, kind: JoinKind, table: &str, f: impl FnOnce(&mut Builder)) {
        let mut child = self.child();
        child.query.is_join_clause = true;
        f(&mut child);
        if let Some(err) = child.error.take() {
            self.fail_msg(err);
        }
        self.query
            .bindings
            .join
            .extend(child.query.bindings.flatten());
        self.query.joins.push(Join {
            kind,
            table: table.to_owned(),
            query: Box::new(child.query),
        });
    }

    /// `inner join table on first op second`.
    pub fn join(&mut self, table: &str, first: &str, op: &str, second: &str) -> &mut Self {
        self.push_join(JoinKind::Inner, table, |j| {
            j.on(first, op, second);
        });
        self
    }

    /// `left join table on first op second`.
    pub fn left_join(&mut self, table: &str, first: &str, op: &str, second: &str) -> &mut Self {
        self.push_join(JoinKind::Left, table, |j| {
            j.on(first, op, second);
        });
        self
    }

    /// `right join table on first op second`.
    pub fn right_join(&mut self, table: &str, first: &str, op: &str, second: &str) -> &mut Self {
        self.push_join(JoinKind::Right, table, |j| {
            j.on(first, op, second);
        });
        self
    }

    /// `cross join table`.
    pub fn cross_join(&mut self, table: &str) -> &mut Self {
        self.push_join(JoinKind::Cross, table, |_| {});
        self
    }

    /// Inner join with a closure building a complex `on` clause; the
    /// closure's builder is a join clause (`on` conjunction) and may nest
    /// further joins.
    pub fn join_with(&mut self, table: &str, f: impl FnOnce(&mut Builder)) -> &mut Self {
        self.push_join(JoinKind::Inner, table, f);
        self
    }

    /// Left join variant of [`Builder::join_with`].
    pub fn left_join_with(&mut self, table: &str, f: impl FnOnce(&mut Builder)) -> &mut Self {
        self.push_join(JoinKind::Left, table, f);
        self
    }

    /// Right join variant of [`Builder::join_with`].
    pub fn right_join_with(&mut self, table: &str, f: impl FnOnce(&mut Builder)) -> &mut Self {
        self.push_join(JoinKind::Right, table, f);
        self
    }

    // ==================== group / having / order ====================

    /// Appends `group by` columns.
    pub fn group_by<I>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<ColumnRef>,
    {
        self.query.groups.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Appends a raw `group by` expression.
    pub fn group_by_raw(&mut self, sql: impl Into<Expression>) -> &mut Self {
        self.query.groups.push(ColumnRef::Raw(sql.into()));
        self
    }

    fn push_having(&mut self, boolean: Boolean, column: &str, op: &str, value: Operand) {
        let operator = match Operator::parse(op) {
            Ok(op) => op,
            Err(err) => {
                self.fail(err);
                return;
            }
        };
        if let Operand::Value(v) = &value {
            self.query.bindings.having.push(v.clone());
        }
        self.query.havings.push(Having {
            boolean,
            kind: HavingKind::Basic {
                column: column.to_owned(),
                operator,
                value,
            },
        });
    }

    /// `having column op value`.
    pub fn having(&mut self, column: &str, op: &str, value: impl Into<Operand>) -> &mut Self {
        self.push_having(Boolean::And, column, op, value.into());
        self
    }

    /// `or having column op value`.
    pub fn or_having(&mut self, column: &str, op: &str, value: impl Into<Operand>) -> &mut Self {
        self.push_having(Boolean::Or, column, op, value.into());
        self
    }

    /// `having column between min and max`.
    pub fn having_between(
        &mut self,
        column: &str,
        min: impl Into<Operand>,
        max: impl Into<Operand>,
    ) -> &mut Self {
        let (min, max) = (min.into(), max.into());
        for operand in [&min, &max] {
            if let Operand::Value(v) = operand {
                self.query.bindings.having.push(v.clone());
            }
        }
        self.query.havings.push(Having {
            boolean: Boolean::And,
            kind: HavingKind::Between {
                column: column.to_owned(),
                not: false,
                min,
                max,
            },
        });
        self
    }

    /// Raw `having` SQL.
    pub fn having_raw(&mut self, sql: impl Into<Expression>) -> &mut Self {
        self.query.havings.push(Having {
            boolean: Boolean::And,
            kind: HavingKind::Raw { sql: sql.into() },
        });
        self
    }

    /// `order by column asc`.
    pub fn order_by(&mut self, column: &str) -> &mut Self {
        self.query.orders.push(Order::Column {
            column: column.to_owned(),
            direction: Direction::Asc,
        });
        self
    }

    /// `order by column desc`.
    pub fn order_by_desc(&mut self, column: &str) -> &mut Self {
        self.query.orders.push(Order::Column {
            column: column.to_owned(),
            direction: Direction::Desc,
        });
        self
    }

    /// Raw `order by` expression.
    pub fn order_by_raw(&mut self, sql: impl Into<Expression>) -> &mut Self {
        self.query.orders.push(Order::Raw(sql.into()));
        self
    }

    /// Caps the row count.
    pub fn limit(&mut self, n: u64) -> &mut Self {
        self.query.limit = Some(n);
        self
    }

    /// Skips leading rows.
    pub fn offset(&mut self, n: u64) -> &mut Self {
        self.query.offset = Some(n);
        self
    }

    /// Pagination shorthand: `page` is 1-based.
    pub fn for_page(&mut self, page: u64, per_page: u64) -> &mut Self {
        self.limit(per_page)
            .offset(page.saturating_sub(1) * per_page)
    }

    /// Requests an exclusive row lock.
    pub fn lock_for_update(&mut self) -> &mut Self {
        self.query.lock = Some(Lock::ForUpdate);
        self
    }

    /// Requests a shared row lock.
    pub fn shared_lock(&mut self) -> &mut Self {
        self.query.lock = Some(Lock::Shared);
        self
    }

    // ==================== unions ====================

    fn push_union(&mut self, all: bool, f: impl FnOnce(&mut Builder)) {
        let mut sub = self.build_child(f);
        sub.is_join_clause = false;
        self.query.bindings.union.extend(sub.bindings.flatten());
        self.query.unions.push(Union {
            all,
            query: Box::new(sub),
        });
    }

    /// Appends a `union` arm built by `f`.
    pub fn union(&mut self, f: impl FnOnce(&mut Builder)) -> &mut Self {
        self.push_union(false, f);
        self
    }

    /// Appends a `union all` arm built by `f`.
    pub fn union_all(&mut self, f: impl FnOnce(&mut Builder)) -> &mut Self {
        self.push_union(true, f);
        self
    }

    /// Orders the combined union result.
    pub fn union_order_by(&mut self, column: &str) -> &mut Self {
        self.query.union_orders.push(Order::Column {
            column: column.to_owned(),
            direction: Direction::Asc,
        });
        self
    }

    /// Orders the combined union result descending.
    pub fn union_order_by_desc(&mut self, column: &str) -> &mut Self {
        self.query.union_orders.push(Order::Column {
            column: column.to_owned(),
            direction: Direction::Desc,
        });
        self
    }

    /// Caps the combined union result.
    pub fn union_limit(&mut self, n: u64) -> &mut Self {
        self.query.union_limit = Some(n);
        self
    }

    /// Skips leading rows of the combined union result.
    pub fn union_offset(&mut self, n: u64) -> &mut Self {
        self.query.union_offset = Some(n);
        self
    }

    // ==================== compile ====================

    /// Compiles the query with the active grammar.
    pub fn to_sql(&self) -> Result<String> {
        if let Some(msg) = &self.error {
            return Err(QuernError::Usage(msg.clone()));
        }
        let sql = self.grammar.compile_select(&self.query)?;
        tracing::debug!(
            driver = self.grammar.driver(),
            bindings = self.query.bindings.len(),
            sql = %sql,
            "compiled select"
        );
        Ok(sql)
    }

    /// The flattened binding list in emit order.
    pub fn get_bindings(&self) -> Vec<Value> {
        self.query.bindings.flatten()
    }

    // ==================== execution ====================

    fn exec(&self) -> Result<&dyn Executor> {
        self.executor
            .as_deref()
            .ok_or_else(|| QuernError::usage("no executor bound to this builder"))
    }

    /// Compiles, executes and returns all rows.
    pub fn get(&self) -> Result<Rows> {
        let sql = self.to_sql()?;
        self.exec()?.query(&sql, &self.get_bindings())
    }

    /// As [`Builder::get`], aborting the process on error.
    pub fn must_get(&self) -> Rows {
        match self.get() {
            Ok(rows) => rows,
            Err(err) => panic!("quern: {err}"),
        }
    }

    /// The first row, if any.
    pub fn first(&mut self) -> Result<Option<Row>> {
        self.limit(1);
        Ok(self.get()?.into_iter().next())
    }

    /// Looks a row up by its `id` column.
    pub fn find(&mut self, key: impl Into<Value>) -> Result<Option<Row>> {
        self.where_("id", key.into());
        self.first()
    }

    /// The first row's value for one column.
    pub fn value(&mut self, column: &str) -> Result<Option<Value>> {
        self.select([column]);
        Ok(self
            .first()?
            .and_then(|row| row.into_iter().next().map(|(_, v)| v)))
    }

    fn run_aggregate(&self, func: &str, columns: &[&str]) -> Result<Option<Value>> {
        let mut query = self.query.clone();
        query.aggregate = Some(Aggregate {
            func: func.to_owned(),
            columns: columns.iter().map(|c| ColumnRef::from(*c)).collect(),
        });
        // The aggregate projection replaces the select list; its bindings
        // (and any order-by bindings) must not reach the executor.
        query.columns.clear();
        query.bindings.select.clear();
        query.orders.clear();
        query.bindings.order.clear();

        if let Some(msg) = &self.error {
            return Err(QuernError::Usage(msg.clone()));
        }
        let sql = self.grammar.compile_select(&query)?;
        let rows = self.exec()?.query(&sql, &query.bindings.flatten())?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| row.get("aggregate").cloned()))
    }

    /// `select count(*) as aggregate`.
    pub fn count(&self) -> Result<u64> {
        let value = self.run_aggregate("count", &["*"])?;
        Ok(value.and_then(|v| v.as_i64()).unwrap_or(0) as u64)
    }

    /// `select sum(column) as aggregate`.
    pub fn sum(&self, column: &str) -> Result<Value> {
        Ok(self.run_aggregate("sum", &[column])?.unwrap_or(Value::Null))
    }

    /// `select avg(column) as aggregate`.
    pub fn avg(&self, column: &str) -> Result<Value> {
        Ok(self.run_aggregate("avg", &[column])?.unwrap_or(Value::Null))
    }

    /// `select min(column) as aggregate`.
    pub fn min(&self, column: &str) -> Result<Value> {
        Ok(self.run_aggregate("min", &[column])?.unwrap_or(Value::Null))
    }

    /// `select max(column) as aggregate`.
    pub fn max(&self, column: &str) -> Result<Value> {
        Ok(self.run_aggregate("max", &[column])?.unwrap_or(Value::Null))
    }

    /// Whether the query matches at least one row.
    pub fn exists(&self) -> Result<bool> {
        if let Some(msg) = &self.error {
            return Err(QuernError::Usage(msg.clone()));
        }
        let sql = self.grammar.compile_exists(&self.query)?;
        let rows = self.exec()?.query(&sql, &self.get_bindings())?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next().map(|(_, v)| v))
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }

    /// Inserts the given rows.
    pub fn insert(&self, rows: Vec<Row>) -> Result<ExecResult> {
        let (sql, params) = self.grammar.compile_insert(&self.query, &rows)?;
        tracing::debug!(sql = %sql, rows = rows.len(), "insert");
        self.exec()?.execute(&sql, &params)
    }

    /// As [`Builder::insert`], aborting the process on error.
    pub fn must_insert(&self, rows: Vec<Row>) -> ExecResult {
        match self.insert(rows) {
            Ok(result) => result,
            Err(err) => panic!("quern: {err}"),
        }
    }

    /// Inserts one row and returns the generated `id`, via `returning`
    /// where the dialect has it and the driver's last-insert-id otherwise.
    pub fn insert_get_id(&self, row: Row) -> Result<i64> {
        let (mut sql, params) = self.grammar.compile_insert(&self.query, &[row])?;
        if let Some(returning) = self.grammar.returning_clause("id") {
            sql.push(' ');
            sql.push_str(&returning);
            let rows = self.exec()?.query(&sql, &params)?;
            return rows
                .into_iter()
                .next()
                .and_then(|row| row.into_iter().next().and_then(|(_, v)| v.as_i64()))
                .ok_or(QuernError::NotFound);
        }
        let result = self.exec()?.execute(&sql, &params)?;
        result.last_insert_id.ok_or(QuernError::NotFound)
    }

    /// Updates matching rows; returns the affected count.
    pub fn update(&self, values: Row) -> Result<u64> {
        if let Some(msg) = &self.error {
            return Err(QuernError::Usage(msg.clone()));
        }
        let (sql, params) = self.grammar.compile_update(&self.query, &values)?;
        tracing::debug!(sql = %sql, "update");
        Ok(self.exec()?.execute(&sql, &params)?.rows_affected)
    }

    /// Deletes matching rows; returns the affected count.
    pub fn delete(&self) -> Result<u64> {
        if let Some(msg) = &self.error {
            return Err(QuernError::Usage(msg.clone()));
        }
        let (sql, params) = self.grammar.compile_delete(&self.query)?;
        tracing::debug!(sql = %sql, "delete");
        Ok(self.exec()?.execute(&sql, &params)?.rows_affected)
    }

    /// Empties the table.
    pub fn truncate(&self) -> Result<()> {
        let FromClause::Table { name, .. } = &self.query.from else {
            return Err(QuernError::usage("truncate requires a table"));
        };
        let executor = self.exec()?;
        for sql in self.grammar.compile_truncate(name) {
            executor.execute(&sql, &[])?;
        }
        Ok(())
    }
}
