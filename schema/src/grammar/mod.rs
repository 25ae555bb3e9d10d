//! Schema grammars: per-dialect DDL emission, type maps and introspection.
//!
//! [`SchemaGrammar`] mirrors the query-side grammar design: defaults cover
//! the standard-SQL shape, dialects override what they render differently.
//! The reverse type map ([`SchemaGrammar::base_type`]) recovers abstract
//! column types from introspected declarations.

mod mysql;
mod postgres;
mod sqlite;
mod sqlserver;

pub use mysql::MysqlSchema;
pub use postgres::PostgresSchema;
pub use sqlite::SqliteSchema;
pub use sqlserver::SqlserverSchema;

use crate::types::{Column, ColumnType, CommandKind, Index, IndexType, Primary, Table};
use quern_core::error::{QuernError, Result};
use quern_core::executor::{Executor, Row};
use quern_core::grammar::{literal, quote_ident};
use quern_core::value::Value;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

/// An abstract type recovered from a concrete SQL declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedType {
    pub column_type: ColumnType,
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub unsigned: bool,
}

/// Splits a declaration like `decimal(5,2) unsigned` into its base token,
/// parenthesized arguments and signedness.
pub fn parse_type_decl(declared: &str) -> (String, Option<u32>, Option<u32>, bool) {
    let lowered = declared.trim().to_lowercase();
    let unsigned = lowered.contains(" unsigned") || lowered.ends_with("unsigned");
    let head = lowered.split(" unsigned").next().unwrap_or(&lowered).trim();
    match head.split_once('(') {
        Some((token, rest)) => {
            let args = rest.trim_end_matches(')');
            let mut parts = args.split(',').map(|p| p.trim().parse::<u32>().ok());
            let first = parts.next().flatten();
            let second = parts.next().flatten();
            (token.trim().to_owned(), first, second, unsigned)
        }
        None => (head.to_owned(), None, None, unsigned),
    }
}

/// Pulls the quoted options out of an `enum('A','B')` declaration.
pub fn parse_enum_options(declared: &str) -> Vec<String> {
    let Some(start) = declared.find('(') else {
        return Vec::new();
    };
    let inner = declared[start + 1..].trim_end_matches(')');
    inner
        .split(',')
        .map(|part| part.trim().trim_matches('\'').to_owned())
        .filter(|part| !part.is_empty())
        .collect()
}

// ==================== row readers ====================

pub(crate) fn row_str(row: &Row, key: &str) -> Option<String> {
    match row.get(key) {
        Some(Value::Text(s)) => Some(s.clone()),
        Some(Value::Null) | None => None,
        Some(other) => other.as_i64().map(|v| v.to_string()),
    }
}

pub(crate) fn row_u32(row: &Row, key: &str) -> Option<u32> {
    row.get(key)
        .and_then(Value::as_i64)
        .and_then(|v| u32::try_from(v).ok())
}

pub(crate) fn row_bool(row: &Row, key: &str) -> bool {
    match row.get(key) {
        Some(Value::Bool(v)) => *v,
        Some(Value::Int(v)) => *v != 0,
        Some(Value::Text(s)) => {
            matches!(s.to_lowercase().as_str(), "1" | "true" | "yes" | "y")
        }
        _ => false,
    }
}

/// Backend-specific DDL rendering and introspection. Immutable after
/// registration, shared across threads.
pub trait SchemaGrammar: Send + Sync {
    fn driver(&self) -> &'static str;

    fn quote_chars(&self) -> (char, char);

    /// Placeholder for the `n`-th parameter of an introspection query.
    fn placeholder(&self, n: usize) -> String {
        let _ = n;
        "?".to_owned()
    }

    /// Schema introspection falls back to this when the caller sets none.
    fn default_schema(&self) -> Option<&'static str> {
        None
    }

    fn id(&self, name: &str) -> String {
        let (open, close) = self.quote_chars();
        quote_ident(name, open, close)
    }

    fn val(&self, value: &Value) -> String {
        literal(value)
    }

    /// The schema-qualified table reference.
    fn wrap_table(&self, table: &Table) -> String {
        if table.schema_name.is_empty() {
            self.id(&table.name)
        } else {
            format!("{}.{}", self.id(&table.schema_name), self.id(&table.name))
        }
    }

    // ==================== type maps ====================

    /// Abstract type → concrete SQL type, honoring length/precision/options.
    fn type_sql(&self, column: &Column) -> Result<String>;

    /// Reverse map: one lowercased type token → abstract type.
    fn base_type(&self, token: &str) -> Option<ColumnType>;

    /// Parses a full introspected declaration through the reverse map.
    fn abstract_type(&self, declared: &str) -> ParsedType {
        let (token, first, second, unsigned) = parse_type_decl(declared);
        let column_type = self.base_type(&token).unwrap_or(ColumnType::Text);
        let mut parsed = ParsedType {
            column_type,
            length: None,
            precision: None,
            scale: None,
            unsigned,
        };
        match column_type {
            ColumnType::String | ColumnType::Char | ColumnType::Binary => parsed.length = first,
            ColumnType::Float | ColumnType::Double | ColumnType::Decimal => {
                parsed.precision = first;
                parsed.scale = second;
            }
            _ => {}
        }
        parsed
    }

    /// Index-flavor vocabulary; `None` means the dialect degrades the
    /// flavor to a plain index.
    fn index_type_sql(&self, index_type: IndexType) -> Option<&'static str> {
        match index_type {
            IndexType::Primary => Some("primary key"),
            IndexType::Unique => Some("unique index"),
            IndexType::Index => Some("index"),
            IndexType::Fulltext | IndexType::Spatial => None,
        }
    }

    /// Suffix for auto-incrementing columns; empty when the type itself
    /// carries it (serial types).
    fn auto_increment_sql(&self) -> &'static str {
        ""
    }

    // ==================== column & index definitions ====================

    /// One column definition line.
    fn column_sql(&self, column: &Column) -> Result<String> {
        let mut sql = format!("{} {}", self.id(&column.name), self.type_sql(column)?);
        sql.push_str(if column.nullable { " null" } else { " not null" });
        if let Some(default) = &column.default {
            sql.push_str(&format!(" default {}", self.val(default)));
        }
        if column.auto_increments() && !self.auto_increment_sql().is_empty() {
            sql.push(' ');
            sql.push_str(self.auto_increment_sql());
        }
        Ok(sql)
    }

    fn columnize(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|c| self.id(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// A standalone `create index` statement.
    fn create_index_sql(&self, table: &Table, index: &Index) -> Result<String> {
        let keyword = match index.index_type {
            IndexType::Primary => {
                return Ok(format!(
                    "alter table {} add primary key ({})",
                    self.wrap_table(table),
                    self.columnize(&index.columns)
                ));
            }
            IndexType::Unique => "create unique index",
            IndexType::Index | IndexType::Fulltext | IndexType::Spatial => "create index",
        };
        Ok(format!(
            "{keyword} {} on {} ({})",
            self.id(&index.name),
            self.wrap_table(table),
            self.columnize(&index.columns)
        ))
    }

    // ==================== table DDL ====================

    /// `create table` plus any standalone index statements.
    fn compile_create_table(&self, table: &Table) -> Result<Vec<String>> {
        let mut lines: Vec<String> = Vec::with_capacity(table.columns.len() + 1);
        for column in table.columns.values() {
            lines.push(self.column_sql(column)?);
        }
        if let Some(primary) = table.get_primary() {
            lines.push(format!("primary key ({})", self.columnize(&primary.columns)));
        }
        let mut statements = vec![format!(
            "create table {} ({})",
            self.wrap_table(table),
            lines.join(", ")
        )];
        for index in table.indexes.values() {
            statements.push(self.create_index_sql(table, index)?);
        }
        Ok(statements)
    }

    fn compile_rename_table(&self, from: &str, to: &str) -> String {
        format!("alter table {} rename to {}", self.id(from), self.id(to))
    }

    fn compile_drop_table(&self, name: &str) -> String {
        format!("drop table {}", self.id(name))
    }

    fn compile_drop_table_if_exists(&self, name: &str) -> String {
        format!("drop table if exists {}", self.id(name))
    }

    // ==================== command DDL ====================

    /// Renders one schema command, resolving payload names against the
    /// blueprint table. `current` is the introspected shape; drops against
    /// live constraints take their names from it.
    fn compile_command(
        &self,
        table: &Table,
        current: &Table,
        kind: &CommandKind,
    ) -> Result<Vec<String>> {
        match kind {
            CommandKind::AddColumn(name) => {
                let column = required_column(table, name)?;
                Ok(vec![format!(
                    "alter table {} {} {}",
                    self.wrap_table(table),
                    self.add_column_keyword(),
                    self.column_sql(column)?
                )])
            }
            CommandKind::ModifyColumn(name) => {
                let column = required_column(table, name)?;
                self.modify_column_sql(table, column)
            }
            CommandKind::RenameColumn { from, to } => Ok(vec![self.rename_column_sql(table, from, to)]),
            CommandKind::DropColumn(name) => Ok(vec![format!(
                "alter table {} drop column {}",
                self.wrap_table(table),
                self.id(name)
            )]),
            CommandKind::CreateIndex(name) => {
                let index = table.get_index(name).ok_or_else(|| {
                    QuernError::compile(format!("unknown index `{name}` in blueprint"))
                })?;
                Ok(vec![self.create_index_sql(table, index)?])
            }
            CommandKind::DropIndex(name) => Ok(vec![self.drop_index_sql(table, name)]),
            CommandKind::RenameIndex { from, to } => self.rename_index_sql(table, from, to),
            CommandKind::CreatePrimary => {
                let primary = table.get_primary().ok_or_else(|| {
                    QuernError::compile("blueprint declares no primary key")
                })?;
                Ok(vec![format!(
                    "alter table {} add primary key ({})",
                    self.wrap_table(table),
                    self.columnize(&primary.columns)
                )])
            }
            CommandKind::DropPrimary => {
                Ok(vec![self.drop_primary_sql(table, current.get_primary())?])
            }
        }
    }

    /// `add column` almost everywhere; SQL Server takes a bare `add`.
    fn add_column_keyword(&self) -> &'static str {
        "add column"
    }

    fn modify_column_sql(&self, table: &Table, column: &Column) -> Result<Vec<String>> {
        let _ = (table, column);
        Err(QuernError::compile(format!(
            "{} cannot modify a column in place",
            self.driver()
        )))
    }

    fn rename_column_sql(&self, table: &Table, from: &str, to: &str) -> String {
        format!(
            "alter table {} rename column {} to {}",
            self.wrap_table(table),
            self.id(from),
            self.id(to)
        )
    }

    fn drop_index_sql(&self, table: &Table, name: &str) -> String {
        let _ = table;
        format!("drop index {}", self.id(name))
    }

    fn rename_index_sql(&self, table: &Table, from: &str, to: &str) -> Result<Vec<String>> {
        let _ = (table, from, to);
        Err(QuernError::compile(format!(
            "{} cannot rename an index",
            self.driver()
        )))
    }

    /// Drops the primary-key constraint under its introspected name;
    /// without one the postgres naming convention is the best guess left.
    fn drop_primary_sql(&self, table: &Table, primary: Option<&Primary>) -> Result<String> {
        let name = match primary {
            Some(primary) => primary.name.clone(),
            None => format!("{}_pkey", table.name),
        };
        Ok(format!(
            "alter table {} drop constraint {}",
            self.wrap_table(table),
            self.id(&name)
        ))
    }

    // ==================== introspection ====================

    /// Query deciding whether a table exists.
    fn table_exists_query(&self, schema: Option<&str>, table: &str) -> (String, Vec<Value>) {
        match schema {
            Some(schema) => (
                format!(
                    "select table_name as table_name from information_schema.tables \
                     where table_schema = {} and table_name = {}",
                    self.placeholder(1),
                    self.placeholder(2)
                ),
                vec![schema.into(), table.into()],
            ),
            None => (
                format!(
                    "select table_name as table_name from information_schema.tables \
                     where table_name = {}",
                    self.placeholder(1)
                ),
                vec![table.into()],
            ),
        }
    }

    /// Loads the current shape of a table.
    fn get_table(
        &self,
        executor: &dyn Executor,
        db: &str,
        schema: Option<&str>,
        name: &str,
    ) -> Result<Table>;
}

fn required_column<'a>(table: &'a Table, name: &str) -> Result<&'a Column> {
    table
        .get_column(name)
        .ok_or_else(|| QuernError::compile(format!("unknown column `{name}` in blueprint")))
}

// =============================================================================
// Registry
// =============================================================================

/// Maps driver names to schema grammar values.
pub struct SchemaRegistry {
    grammars: HashMap<String, Arc<dyn SchemaGrammar>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        SchemaRegistry {
            grammars: HashMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(MysqlSchema));
        registry.register(Arc::new(PostgresSchema));
        registry.register(Arc::new(SqliteSchema));
        registry.register(Arc::new(SqlserverSchema));
        registry
    }

    pub fn register(&mut self, grammar: Arc<dyn SchemaGrammar>) {
        self.grammars.insert(grammar.driver().to_owned(), grammar);
    }

    pub fn get(&self, driver: &str) -> Result<Arc<dyn SchemaGrammar>> {
        self.grammars
            .get(driver)
            .cloned()
            .ok_or_else(|| QuernError::UnknownDriver(driver.into()))
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// The process-wide schema registry.
pub fn global() -> &'static RwLock<SchemaRegistry> {
    static GLOBAL: OnceLock<RwLock<SchemaRegistry>> = OnceLock::new();
    GLOBAL.get_or_init(|| RwLock::new(SchemaRegistry::with_defaults()))
}

/// Looks a driver up in the process-wide schema registry.
pub fn resolve(driver: &str) -> Result<Arc<dyn SchemaGrammar>> {
    global()
        .read()
        .map_err(|_| QuernError::execute("schema registry poisoned"))?
        .get(driver)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_type_decl() {
        assert_eq!(
            parse_type_decl("varchar(255)"),
            ("varchar".into(), Some(255), None, false)
        );
        assert_eq!(
            parse_type_decl("decimal(5,2) unsigned"),
            ("decimal".into(), Some(5), Some(2), true)
        );
        assert_eq!(parse_type_decl("BIGINT UNSIGNED"), ("bigint".into(), None, None, true));
        assert_eq!(parse_type_decl("text"), ("text".into(), None, None, false));
    }

    #[test]
    fn test_parse_enum_options() {
        assert_eq!(
            parse_enum_options("enum('WAITING','PENDING','DONE')"),
            vec!["WAITING", "PENDING", "DONE"]
        );
        assert!(parse_enum_options("integer").is_empty());
    }

    #[test]
    fn test_registry_defaults() {
        let registry = SchemaRegistry::with_defaults();
        for driver in ["mysql", "postgres", "sqlite", "sqlserver"] {
            assert!(registry.get(driver).is_ok(), "{driver} should be registered");
        }
        assert!(registry.get("oracle").is_err());
    }
}
