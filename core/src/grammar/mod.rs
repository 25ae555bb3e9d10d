//! Dialect grammars: one trait, four built-in dialects.
//!
//! [`Grammar`] carries a default compiler for every query node; a dialect
//! overrides only the nodes it renders differently (quoting, placeholder
//! style, pagination, locks). The emit order is fixed:
//!
//! ```text
//! [aggregate] [columns] [from] [joins] [wheres] [groups] [havings]
//! [orders] [limit] [offset] [lock]
//! ```
//!
//! segments joined by single spaces and right-trimmed. A mutable binding
//! offset threads through every nested compilation so dollar-style dialects
//! number placeholders monotonically left-to-right.

mod mysql;
mod postgres;
mod sqlite;
mod sqlserver;

pub use mysql::Mysql;
pub use postgres::Postgres;
pub use sqlite::Sqlite;
pub use sqlserver::Sqlserver;

use crate::ast::{
    Aggregate, ColumnRef, FromClause, Having, HavingKind, Join, JoinKind, Lock, Order, Query,
    SelectColumn, Union, Where, WhereKind,
};
use crate::error::{QuernError, Result};
use crate::executor::Row;
use crate::expr::Operand;
use crate::value::Value;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

/// Strips characters that must never appear inside a quoted identifier.
pub fn sanitize_ident(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '"' | '`' | '\n' | '\r'))
        .collect()
}

/// Quotes a single identifier segment; `*` passes through unquoted.
pub fn quote_ident(name: &str, open: char, close: char) -> String {
    if name == "*" {
        return name.to_owned();
    }
    let mut out = String::with_capacity(name.len() + 2);
    out.push(open);
    out.push_str(&sanitize_ident(name));
    out.push(close);
    out
}

/// Renders a scalar as an inline SQL literal (DDL defaults, never bindings).
pub fn literal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_owned(),
        Value::Bool(true) => "1".to_owned(),
        Value::Bool(false) => "0".to_owned(),
        Value::Int(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Text(v) => quote_literal(v),
        Value::Bytes(v) => {
            let mut out = String::with_capacity(v.len() * 2 + 3);
            out.push_str("x'");
            for b in v {
                out.push_str(&format!("{b:02x}"));
            }
            out.push('\'');
            out
        }
        Value::DateTime(v) => quote_literal(&v.format("%Y-%m-%d %H:%M:%S").to_string()),
        Value::Array(items) => items.iter().map(literal).collect::<Vec<_>>().join(", "),
    }
}

fn quote_literal(text: &str) -> String {
    let cleaned: String = text.chars().filter(|c| !matches!(c, '\n' | '\r')).collect();
    format!("'{}'", cleaned.replace('\'', "''"))
}

/// A SQL dialect: identifier quoting, placeholder style and per-node
/// compilers. Grammar values are immutable once registered and shared
/// across threads.
pub trait Grammar: Send + Sync {
    /// Registry key, e.g. `"mysql"`.
    fn driver(&self) -> &'static str;

    /// Open/close identifier quote characters.
    fn quote_chars(&self) -> (char, char);

    /// Renders the placeholder for the `n`-th binding (1-based). Qmark
    /// dialects ignore `n`.
    fn placeholder(&self, n: usize) -> String {
        let _ = n;
        "?".to_owned()
    }

    // ==================== quoting ====================

    /// Quotes a single identifier, stripping embedded quotes and newlines.
    fn id(&self, name: &str) -> String {
        let (open, close) = self.quote_chars();
        quote_ident(name, open, close)
    }

    /// Inline value quoting for DDL defaults.
    fn val(&self, value: &Value) -> String {
        literal(value)
    }

    /// Wraps a possibly dotted, possibly aliased column reference:
    /// `t.col as c` becomes `` `t`.`col` as `c` ``.
    fn wrap(&self, column: &str) -> String {
        let lowered = column.to_lowercase();
        if let Some(pos) = lowered.find(" as ") {
            let (col, alias) = (&column[..pos], &column[pos + 4..]);
            return format!("{} as {}", self.wrap_segments(col), self.id(alias.trim()));
        }
        self.wrap_segments(column)
    }

    /// Quotes each dot-separated segment of an identifier path.
    fn wrap_segments(&self, path: &str) -> String {
        path.split('.')
            .map(|seg| self.id(seg.trim()))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Wraps a table reference (same rules as columns).
    fn wrap_table(&self, table: &str) -> String {
        self.wrap(table)
    }

    /// Wraps one arm of a union.
    fn wrap_union(&self, sql: &str) -> String {
        format!("({sql})")
    }

    /// Renders a comma-separated column list.
    fn columnize(&self, columns: &[ColumnRef]) -> String {
        columns
            .iter()
            .map(|c| match c {
                ColumnRef::Name(name) => self.wrap(name),
                ColumnRef::Raw(e) => e.sql().to_owned(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    // ==================== parameters ====================

    /// Renders one operand: raw expressions verbatim (zero bindings),
    /// values as placeholders, lists as `(p1, p2, ...)`.
    fn parameter(&self, operand: &Operand, offset: &mut usize) -> String {
        match operand {
            Operand::Raw(e) => e.sql().to_owned(),
            Operand::Value(Value::Array(items)) => {
                let rendered: Vec<String> = items
                    .iter()
                    .map(|v| self.parameter(&Operand::Value(v.clone()), offset))
                    .collect();
                format!("({})", rendered.join(", "))
            }
            Operand::Value(_) => {
                *offset += 1;
                self.placeholder(*offset)
            }
        }
    }

    /// Rewrites `?` markers inside raw SQL to this dialect's placeholders,
    /// advancing the offset; `??` escapes a literal `?`.
    fn substitute_placeholders(&self, raw: &str, offset: &mut usize) -> String {
        let mut out = String::with_capacity(raw.len());
        let mut chars = raw.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '?' {
                if chars.peek() == Some(&'?') {
                    chars.next();
                    out.push('?');
                } else {
                    *offset += 1;
                    out.push_str(&self.placeholder(*offset));
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    // ==================== select pipeline ====================

    /// Compiles a select query with a fresh binding offset.
    fn compile_select(&self, query: &Query) -> Result<String> {
        let mut offset = 0usize;
        self.compile_select_offset(query, &mut offset)
    }

    /// Compiles a select query, threading the caller's binding offset
    /// through every nested compilation.
    fn compile_select_offset(&self, query: &Query, offset: &mut usize) -> Result<String> {
        if !query.unions.is_empty() && query.aggregate.is_some() {
            return self.compile_union_aggregate(query, offset);
        }

        let mut segments: SmallVec<[String; 12]> = SmallVec::new();
        segments.push(self.compile_aggregate(query));
        segments.push(self.compile_columns(query, offset)?);
        segments.push(self.compile_from(query, offset)?);
        segments.push(self.compile_joins(&query.joins, offset)?);
        segments.push(self.compile_wheres(query, offset)?);
        segments.push(self.compile_groups(query));
        segments.push(self.compile_havings(query, offset)?);
        segments.push(self.compile_orders(query, &query.orders, offset)?);
        segments.push(self.compile_limit(query.limit));
        segments.push(self.compile_offset_clause(query.limit, query.offset));
        segments.push(self.compile_lock(query));

        let mut sql = segments
            .iter()
            .filter(|s| !s.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");

        if !query.unions.is_empty() {
            sql = format!("{} {}", self.wrap_union(&sql), self.compile_unions(query, offset)?);
        }

        Ok(sql.trim().to_owned())
    }

    /// An aggregate over a union: project the aggregate from the wrapped
    /// combined select as a derived table.
    fn compile_union_aggregate(&self, query: &Query, offset: &mut usize) -> Result<String> {
        let aggregate = self.compile_aggregate(query);
        let mut inner = query.clone();
        inner.aggregate = None;
        Ok(format!(
            "{} from ({}) as {}",
            aggregate,
            self.compile_select_offset(&inner, offset)?,
            self.wrap_table("temp_table")
        ))
    }

    fn compile_aggregate(&self, query: &Query) -> String {
        let Some(Aggregate { func, columns }) = &query.aggregate else {
            return String::new();
        };
        let mut column = self.columnize(columns);
        if !query.distinct_columns.is_empty() {
            column = format!("distinct {}", self.columnize(&query.distinct_columns));
        } else if query.distinct && column != "*" {
            column = format!("distinct {column}");
        }
        format!("select {func}({column}) as aggregate")
    }

    fn compile_columns(&self, query: &Query, offset: &mut usize) -> Result<String> {
        if query.aggregate.is_some() {
            return Ok(String::new());
        }
        let mut sql = String::from(if query.distinct { "select distinct" } else { "select" });
        if query.columns.is_empty() {
            sql.push_str(" *");
            return Ok(sql);
        }
        let rendered: Vec<String> = query
            .columns
            .iter()
            .map(|col| match col {
                SelectColumn::Name(name) => Ok(self.wrap(name)),
                SelectColumn::Raw(e) => Ok(self.substitute_placeholders(e.sql(), offset)),
                SelectColumn::Sub { query, alias } => Ok(format!(
                    "({}) as {}",
                    self.compile_select_offset(query, offset)?,
                    self.id(alias)
                )),
            })
            .collect::<Result<_>>()?;
        sql.push(' ');
        sql.push_str(&rendered.join(", "));
        Ok(sql)
    }

    fn compile_from(&self, query: &Query, offset: &mut usize) -> Result<String> {
        match &query.from {
            FromClause::None => Ok(String::new()),
            FromClause::Table { name, alias } => {
                let mut sql = format!("from {}", self.wrap_table(name));
                if let Some(alias) = alias {
                    sql.push_str(&format!(" as {}", self.id(alias)));
                }
                Ok(sql)
            }
            FromClause::Raw(e) => Ok(format!("from {}", self.substitute_placeholders(e.sql(), offset))),
            FromClause::Sub { query, alias } => {
                let inner = self.compile_select_offset(query, offset)?;
                match alias {
                    Some(alias) => Ok(format!("from ({inner}) as {}", self.id(alias))),
                    None => Ok(format!("from ({inner})")),
                }
            }
        }
    }

    fn compile_joins(&self, joins: &[Join], offset: &mut usize) -> Result<String> {
        let mut segments: Vec<String> = Vec::with_capacity(joins.len());
        for join in joins {
            let mut table = self.wrap_table(&join.table);
            if !join.query.joins.is_empty() {
                let nested = self.compile_joins(&join.query.joins, offset)?;
                table = format!("({table} {nested})");
            }
            if join.kind == JoinKind::Cross && join.query.wheres.is_empty() {
                segments.push(format!("cross join {table}"));
                continue;
            }
            let conditions = self.compile_wheres(&join.query, offset)?;
            segments.push(
                format!("{} join {table} {conditions}", join.kind.as_str())
                    .trim()
                    .to_owned(),
            );
        }
        Ok(segments.join(" "))
    }

    // ==================== wheres ====================

    fn compile_wheres(&self, query: &Query, offset: &mut usize) -> Result<String> {
        if query.wheres.is_empty() {
            return Ok(String::new());
        }
        let mut clauses: Vec<String> = Vec::with_capacity(query.wheres.len());
        for where_ in &query.wheres {
            let fragment = self.compile_where(where_, offset)?;
            clauses.push(format!("{} {fragment}", where_.boolean.as_str()));
        }
        let conjunction = if query.is_join_clause { "on" } else { "where" };
        Ok(format!(
            "{conjunction} {}",
            remove_leading_boolean(&clauses.join(" "))
        ))
    }

    fn compile_where(&self, where_: &Where, offset: &mut usize) -> Result<String> {
        match &where_.kind {
            WhereKind::Basic {
                column,
                operator,
                value,
            } => self.where_basic(column, operator.as_str(), value, offset),
            WhereKind::Null { column } => Ok(format!("{} is null", self.wrap(column))),
            WhereKind::NotNull { column } => Ok(format!("{} is not null", self.wrap(column))),
            WhereKind::Column {
                first,
                operator,
                second,
            } => Ok(format!(
                "{} {} {}",
                self.wrap(first),
                operator,
                self.wrap(second)
            )),
            WhereKind::Sub {
                column,
                operator,
                query,
                value,
            } => self.where_sub(column.as_deref(), operator.as_str(), query, value.as_ref(), offset),
            WhereKind::Nested { query } => self.where_nested(query, offset),
            WhereKind::Between {
                column,
                not,
                min,
                max,
            } => self.where_between(column, *not, min, max, offset),
            WhereKind::Raw { sql } => Ok(self.substitute_placeholders(sql.sql(), offset)),
        }
    }

    fn where_basic(
        &self,
        column: &str,
        operator: &str,
        value: &Operand,
        offset: &mut usize,
    ) -> Result<String> {
        // Dynamic in-lists may legitimately be empty; degrade to a constant
        // predicate instead of emitting `in ()`.
        if let Operand::Value(Value::Array(items)) = value
            && items.is_empty()
        {
            return Ok(if operator == "not in" { "1 = 1" } else { "0 = 1" }.to_owned());
        }
        Ok(format!(
            "{} {operator} {}",
            self.wrap(column),
            self.parameter(value, offset)
        ))
    }

    fn where_sub(
        &self,
        column: Option<&str>,
        operator: &str,
        query: &Query,
        value: Option<&Operand>,
        offset: &mut usize,
    ) -> Result<String> {
        let sub = self.compile_select_offset(query, offset)?;
        match (column, value) {
            (Some(column), _) => Ok(format!("{} {operator} ({sub})", self.wrap(column))),
            (None, Some(value)) => Ok(format!("({sub}) {operator} {}", self.parameter(value, offset))),
            (None, None) => Ok(format!("{operator} ({sub})")),
        }
    }

    fn where_nested(&self, query: &Query, offset: &mut usize) -> Result<String> {
        let sql = self.compile_wheres(query, offset)?;
        let inner = sql
            .strip_prefix("where ")
            .or_else(|| sql.strip_prefix("on "))
            .unwrap_or(&sql);
        Ok(format!("({inner})"))
    }

    fn where_between(
        &self,
        column: &str,
        not: bool,
        min: &Operand,
        max: &Operand,
        offset: &mut usize,
    ) -> Result<String> {
        let between = if not { "not between" } else { "between" };
        Ok(format!(
            "{} {between} {} and {}",
            self.wrap(column),
            self.parameter(min, offset),
            self.parameter(max, offset)
        ))
    }

    // ==================== trailing clauses ====================

    fn compile_groups(&self, query: &Query) -> String {
        if query.groups.is_empty() {
            return String::new();
        }
        format!("group by {}", self.columnize(&query.groups))
    }

    fn compile_havings(&self, query: &Query, offset: &mut usize) -> Result<String> {
        if query.havings.is_empty() {
            return Ok(String::new());
        }
        let mut clauses: Vec<String> = Vec::with_capacity(query.havings.len());
        for having in &query.havings {
            let fragment = self.compile_having(having, offset)?;
            clauses.push(format!("{} {fragment}", having.boolean.as_str()));
        }
        Ok(format!(
            "having {}",
            remove_leading_boolean(&clauses.join(" "))
        ))
    }

    fn compile_having(&self, having: &Having, offset: &mut usize) -> Result<String> {
        match &having.kind {
            HavingKind::Basic {
                column,
                operator,
                value,
            } => Ok(format!(
                "{} {operator} {}",
                self.wrap(column),
                self.parameter(value, offset)
            )),
            HavingKind::Between {
                column,
                not,
                min,
                max,
            } => self.where_between(column, *not, min, max, offset),
            HavingKind::Raw { sql } => Ok(self.substitute_placeholders(sql.sql(), offset)),
        }
    }

    fn compile_orders(&self, query: &Query, orders: &[Order], offset: &mut usize) -> Result<String> {
        let _ = query;
        if orders.is_empty() {
            return Ok(String::new());
        }
        let clauses: Vec<String> = orders
            .iter()
            .map(|order| match order {
                Order::Column { column, direction } => {
                    format!("{} {}", self.wrap(column), direction.as_str())
                }
                Order::Raw(e) => self.substitute_placeholders(e.sql(), offset),
            })
            .collect();
        Ok(format!("order by {}", clauses.join(", ")))
    }

    fn compile_limit(&self, limit: Option<u64>) -> String {
        match limit {
            Some(n) => format!("limit {n}"),
            None => String::new(),
        }
    }

    fn compile_offset_clause(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        let _ = limit;
        match offset {
            Some(n) => format!("offset {n}"),
            None => String::new(),
        }
    }

    fn compile_lock(&self, query: &Query) -> String {
        let _ = query;
        String::new()
    }

    // ==================== unions ====================

    fn compile_unions(&self, query: &Query, offset: &mut usize) -> Result<String> {
        let mut segments: Vec<String> = Vec::with_capacity(query.unions.len() + 3);
        for union in &query.unions {
            segments.push(self.compile_union(union, offset)?);
        }
        if !query.union_orders.is_empty() {
            segments.push(self.compile_orders(query, &query.union_orders, offset)?);
        }
        if let Some(limit) = query.union_limit {
            segments.push(self.compile_limit(Some(limit)));
        }
        let offset_clause = self.compile_offset_clause(query.union_limit, query.union_offset);
        if !offset_clause.is_empty() {
            segments.push(offset_clause);
        }
        Ok(segments
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "))
    }

    fn compile_union(&self, union: &Union, offset: &mut usize) -> Result<String> {
        let conjunction = if union.all { "union all " } else { "union " };
        Ok(format!(
            "{conjunction}{}",
            self.wrap_union(&self.compile_select_offset(&union.query, offset)?)
        ))
    }

    // ==================== dml ====================

    /// `select exists(...) as "exists"`.
    fn compile_exists(&self, query: &Query) -> Result<String> {
        Ok(format!(
            "select exists({}) as {}",
            self.compile_select(query)?,
            self.id("exists")
        ))
    }

    fn compile_insert(&self, query: &Query, rows: &[Row]) -> Result<(String, Vec<Value>)> {
        let table = insert_target(query)?;
        let Some(first) = rows.first() else {
            return Err(QuernError::compile("nothing to insert"));
        };
        let mut columns: Vec<&str> = first.keys().map(String::as_str).collect();
        columns.sort_unstable();

        let mut offset = 0usize;
        let mut params: Vec<Value> = Vec::with_capacity(rows.len() * columns.len());
        let mut groups: Vec<String> = Vec::with_capacity(rows.len());
        for row in rows {
            let rendered: Vec<String> = columns
                .iter()
                .map(|col| {
                    let value = row.get(*col).cloned().unwrap_or(Value::Null);
                    params.push(value);
                    offset += 1;
                    self.placeholder(offset)
                })
                .collect();
            groups.push(format!("({})", rendered.join(", ")));
        }

        let column_list: Vec<String> = columns.iter().map(|c| self.wrap(c)).collect();
        Ok((
            format!(
                "insert into {} ({}) values {}",
                self.wrap_table(&table),
                column_list.join(", "),
                groups.join(", ")
            ),
            params,
        ))
    }

    /// Suffix that makes an insert return the generated key, where the
    /// dialect supports it.
    fn returning_clause(&self, key: &str) -> Option<String> {
        let _ = key;
        None
    }

    fn compile_update(&self, query: &Query, values: &Row) -> Result<(String, Vec<Value>)> {
        let table = insert_target(query)?;
        if values.is_empty() {
            return Err(QuernError::compile("nothing to update"));
        }
        let mut columns: Vec<&str> = values.keys().map(String::as_str).collect();
        columns.sort_unstable();

        let mut offset = 0usize;
        let mut params: Vec<Value> = Vec::with_capacity(columns.len());
        let sets: Vec<String> = columns
            .iter()
            .map(|col| {
                let value = values.get(*col).cloned().unwrap_or(Value::Null);
                params.push(value);
                offset += 1;
                format!("{} = {}", self.wrap(col), self.placeholder(offset))
            })
            .collect();

        let wheres = self.compile_wheres(query, &mut offset)?;
        params.extend(query.bindings.flatten());

        let mut sql = format!("update {} set {}", self.wrap_table(&table), sets.join(", "));
        if !wheres.is_empty() {
            sql.push(' ');
            sql.push_str(&wheres);
        }
        Ok((sql, params))
    }

    fn compile_delete(&self, query: &Query) -> Result<(String, Vec<Value>)> {
        let table = insert_target(query)?;
        let mut offset = 0usize;
        let wheres = self.compile_wheres(query, &mut offset)?;
        let mut sql = format!("delete from {}", self.wrap_table(&table));
        if !wheres.is_empty() {
            sql.push(' ');
            sql.push_str(&wheres);
        }
        Ok((sql, query.bindings.flatten()))
    }

    fn compile_truncate(&self, table: &str) -> Vec<String> {
        vec![format!("truncate table {}", self.wrap_table(table))]
    }
}

/// Strips the conjunction the builder prepends to every clause.
pub(crate) fn remove_leading_boolean(sql: &str) -> &str {
    sql.strip_prefix("and ")
        .or_else(|| sql.strip_prefix("or "))
        .unwrap_or(sql)
}

fn insert_target(query: &Query) -> Result<String> {
    match &query.from {
        FromClause::Table { name, .. } => Ok(name.clone()),
        _ => Err(QuernError::compile("statement requires a plain table target")),
    }
}

/// Renders the lock suffix shared by the dialects that support both modes.
pub(crate) fn lock_suffix(query: &Query, shared: &'static str) -> String {
    match query.lock {
        Some(Lock::ForUpdate) => "for update".to_owned(),
        Some(Lock::Shared) => shared.to_owned(),
        None => String::new(),
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Maps driver names to immutable grammar values.
pub struct GrammarRegistry {
    grammars: HashMap<String, Arc<dyn Grammar>>,
}

impl GrammarRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        GrammarRegistry {
            grammars: HashMap::new(),
        }
    }

    /// A registry with the built-in dialects.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(Mysql));
        registry.register(Arc::new(Postgres));
        registry.register(Arc::new(Sqlite));
        registry.register(Arc::new(Sqlserver));
        registry
    }

    /// Registers a grammar under its own driver name. Re-registering a name
    /// replaces the previous value (last write wins).
    pub fn register(&mut self, grammar: Arc<dyn Grammar>) {
        self.grammars.insert(grammar.driver().to_owned(), grammar);
    }

    /// Registers a grammar under an explicit alias.
    pub fn register_as(&mut self, name: impl Into<String>, grammar: Arc<dyn Grammar>) {
        self.grammars.insert(name.into(), grammar);
    }

    pub fn get(&self, driver: &str) -> Result<Arc<dyn Grammar>> {
        self.grammars
            .get(driver)
            .cloned()
            .ok_or_else(|| QuernError::UnknownDriver(driver.into()))
    }

    pub fn drivers(&self) -> Vec<&str> {
        self.grammars.keys().map(String::as_str).collect()
    }
}

impl Default for GrammarRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// The process-wide registry. Initialized once with the built-in dialects;
/// re-registration is serialized behind the lock.
pub fn global() -> &'static RwLock<GrammarRegistry> {
    static GLOBAL: OnceLock<RwLock<GrammarRegistry>> = OnceLock::new();
    GLOBAL.get_or_init(|| RwLock::new(GrammarRegistry::with_defaults()))
}

/// Looks a driver up in the process-wide registry.
pub fn resolve(driver: &str) -> Result<Arc<dyn Grammar>> {
    global()
        .read()
        .map_err(|_| QuernError::execute("grammar registry poisoned"))?
        .get(driver)
}

/// Registers a grammar in the process-wide registry.
pub fn register(grammar: Arc<dyn Grammar>) -> Result<()> {
    global()
        .write()
        .map_err(|_| QuernError::execute("grammar registry poisoned"))?
        .register(grammar);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_quotes_and_newlines() {
        assert_eq!(sanitize_ident("us`ers\n"), "users");
        assert_eq!(sanitize_ident("a\"b\r"), "ab");
    }

    #[test]
    fn test_literal_escapes_single_quotes() {
        assert_eq!(literal(&Value::Text("it's".into())), "'it''s'");
        assert_eq!(literal(&Value::Int(7)), "7");
        assert_eq!(literal(&Value::Null), "null");
    }

    #[test]
    fn test_registry_defaults_and_last_write_wins() {
        let mut registry = GrammarRegistry::with_defaults();
        assert!(registry.get("mysql").is_ok());
        assert!(registry.get("postgres").is_ok());
        assert!(registry.get("sqlite").is_ok());
        assert!(registry.get("sqlserver").is_ok());
        assert!(registry.get("oracle").is_err());

        registry.register_as("mysql", Arc::new(Sqlite));
        assert_eq!(registry.get("mysql").unwrap().driver(), "sqlite");
    }

    #[test]
    fn test_remove_leading_boolean() {
        assert_eq!(remove_leading_boolean("and a = 1 or b = 2"), "a = 1 or b = 2");
        assert_eq!(remove_leading_boolean("or x"), "x");
        assert_eq!(remove_leading_boolean("x"), "x");
    }
}
