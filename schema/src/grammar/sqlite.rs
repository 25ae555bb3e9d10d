//! SQLite schema grammar: inline primary keys, `sqlite_master` + PRAGMA
//! introspection. In-place column modification is rejected (the engine
//! has no such ALTER form).

use super::{SchemaGrammar, row_bool, row_str};
use crate::types::{Column, ColumnType, IndexType, Primary, Table};
use quern_core::error::{QuernError, Result};
use quern_core::executor::Executor;
use quern_core::value::Value;

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteSchema;

impl SqliteSchema {
    /// Whether the primary key must be declared on the column itself
    /// (single auto-incrementing integer key).
    fn inline_primary(&self, table: &Table) -> bool {
        let Some(primary) = table.get_primary() else {
            return false;
        };
        primary.columns.len() == 1
            && table
                .get_column(&primary.columns[0])
                .map(|c| c.auto_increments())
                .unwrap_or(false)
    }
}

impl SchemaGrammar for SqliteSchema {
    fn driver(&self) -> &'static str {
        "sqlite"
    }

    fn quote_chars(&self) -> (char, char) {
        ('`', '`')
    }

    fn type_sql(&self, column: &Column) -> Result<String> {
        let length = column.length.unwrap_or(255);
        Ok(match column.column_type {
            ColumnType::String => format!("varchar({length})"),
            ColumnType::Char => format!("char({})", column.length.unwrap_or(1)),
            ColumnType::Text | ColumnType::MediumText | ColumnType::LongText => "text".to_owned(),
            ColumnType::TinyInteger
            | ColumnType::SmallInteger
            | ColumnType::Integer
            | ColumnType::BigInteger
            | ColumnType::Year => "integer".to_owned(),
            ColumnType::Float => "float".to_owned(),
            ColumnType::Double => "double".to_owned(),
            ColumnType::Decimal => {
                format!(
                    "decimal({},{})",
                    column.precision.unwrap_or(10),
                    column.scale.unwrap_or(2)
                )
            }
            ColumnType::Boolean => "boolean".to_owned(),
            ColumnType::Date => "date".to_owned(),
            ColumnType::DateTime
            | ColumnType::DateTimeTz
            | ColumnType::Timestamp
            | ColumnType::TimestampTz => "datetime".to_owned(),
            ColumnType::Time | ColumnType::TimeTz => "time".to_owned(),
            ColumnType::Binary => "blob".to_owned(),
            ColumnType::Json | ColumnType::Jsonb => "text".to_owned(),
            ColumnType::Uuid => "varchar(36)".to_owned(),
            ColumnType::Enum => {
                let options: Vec<String> = column
                    .options
                    .iter()
                    .map(|o| format!("'{}'", o.replace('\'', "''")))
                    .collect();
                format!(
                    "text check ({} in ({}))",
                    self.id(&column.name),
                    options.join(", ")
                )
            }
            ColumnType::IpAddress => "varchar(45)".to_owned(),
            ColumnType::MacAddress => "varchar(17)".to_owned(),
            ColumnType::Geometry | ColumnType::Point => "text".to_owned(),
        })
    }

    fn base_type(&self, token: &str) -> Option<ColumnType> {
        Some(match token {
            "varchar" => ColumnType::String,
            "char" => ColumnType::Char,
            "text" | "clob" => ColumnType::Text,
            "integer" | "int" | "tinyint" | "smallint" | "bigint" => ColumnType::Integer,
            "float" | "real" => ColumnType::Float,
            "double" => ColumnType::Double,
            "decimal" | "numeric" => ColumnType::Decimal,
            "boolean" => ColumnType::Boolean,
            "date" => ColumnType::Date,
            "datetime" => ColumnType::DateTime,
            "time" => ColumnType::Time,
            "blob" => ColumnType::Binary,
            _ => return None,
        })
    }

    fn column_sql(&self, column: &Column) -> Result<String> {
        let mut sql = format!("{} {}", self.id(&column.name), self.type_sql(column)?);
        if column.auto_increments() {
            sql.push_str(" not null primary key autoincrement");
            return Ok(sql);
        }
        sql.push_str(if column.nullable { " null" } else { " not null" });
        if let Some(default) = &column.default {
            sql.push_str(&format!(" default {}", self.val(default)));
        }
        Ok(sql)
    }

    fn compile_create_table(&self, table: &Table) -> Result<Vec<String>> {
        let mut lines: Vec<String> = Vec::with_capacity(table.columns.len() + 1);
        for column in table.columns.values() {
            lines.push(self.column_sql(column)?);
        }
        if let Some(primary) = table.get_primary()
            && !self.inline_primary(table)
        {
            lines.push(format!("primary key ({})", self.columnize(&primary.columns)));
        }
        let mut statements = vec![format!(
            "create table {} ({})",
            self.id(&table.name),
            lines.join(", ")
        )];
        for index in table.indexes.values() {
            statements.push(self.create_index_sql(table, index)?);
        }
        Ok(statements)
    }

    fn wrap_table(&self, table: &Table) -> String {
        // Attached databases aside, sqlite tables are unqualified.
        self.id(&table.name)
    }

    fn drop_primary_sql(&self, table: &Table, _primary: Option<&Primary>) -> Result<String> {
        let _ = table;
        Err(QuernError::compile("sqlite cannot drop a primary key"))
    }

    fn table_exists_query(&self, _schema: Option<&str>, table: &str) -> (String, Vec<Value>) {
        (
            "select name as name from sqlite_master where type = 'table' and name = ?".to_owned(),
            vec![table.into()],
        )
    }

    fn get_table(
        &self,
        executor: &dyn Executor,
        db: &str,
        _schema: Option<&str>,
        name: &str,
    ) -> Result<Table> {
        let mut table = Table::new(name, "", db);

        let create_sql = executor
            .query(
                "select sql as sql from sqlite_master where type = 'table' and name = ?",
                &[name.into()],
            )?
            .first()
            .and_then(|row| row_str(row, "sql"))
            .ok_or_else(|| QuernError::introspection(format!("table `{name}` not found")))?;
        let autoincrement = create_sql.to_lowercase().contains("autoincrement");

        let info_sql = format!("pragma table_info({})", self.id(name));
        let rows = executor.query(&info_sql, &[])?;
        if rows.is_empty() {
            return Err(QuernError::introspection(format!("table `{name}` not found")));
        }
        let mut primary_columns: Vec<String> = Vec::new();
        for row in &rows {
            let Some(column_name) = row_str(row, "name") else {
                continue;
            };
            let declared = row_str(row, "type").unwrap_or_default();
            let parsed = self.abstract_type(&declared);
            let mut column = table.new_column(&column_name, parsed.column_type);
            column.length = parsed.length;
            column.precision = parsed.precision;
            column.scale = parsed.scale;
            column.nullable = !row_bool(row, "notnull");
            column.default = row_str(row, "dflt_value")
                .map(|v| Value::Text(v.trim_matches('\'').to_owned()));
            if row_bool(row, "pk") {
                primary_columns.push(column_name.clone());
                column.nullable = false;
                if autoincrement && parsed.column_type == ColumnType::Integer {
                    column.extra = Some("auto_increment".to_owned());
                }
            }
            table.push_column(column);
        }
        if !primary_columns.is_empty() {
            table.primary = Some(Primary {
                name: "PRIMARY".to_owned(),
                db_name: db.to_owned(),
                table_name: name.to_owned(),
                columns: primary_columns,
            });
        }

        let list_sql = format!("pragma index_list({})", self.id(name));
        for row in &executor.query(&list_sql, &[])? {
            let Some(index_name) = row_str(row, "name") else {
                continue;
            };
            if row_str(row, "origin").as_deref() == Some("pk") {
                continue;
            }
            let index_type = if row_bool(row, "unique") {
                IndexType::Unique
            } else {
                IndexType::Index
            };
            let info_sql = format!("pragma index_info({})", self.id(&index_name));
            let columns: Vec<String> = executor
                .query(&info_sql, &[])?
                .iter()
                .filter_map(|r| row_str(r, "name"))
                .collect();
            let index = table.new_index(&index_name, index_type, columns);
            table.push_index(index);
        }

        Ok(table)
    }
}
