//! MySQL schema grammar: inline table indexes, native enums, unsigned
//! integers, `information_schema` introspection.

use super::{SchemaGrammar, parse_enum_options, row_bool, row_str};
use crate::types::{Column, ColumnType, Index, IndexType, Primary, Table};
use quern_core::error::{QuernError, Result};
use quern_core::executor::Executor;
use quern_core::value::Value;

#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlSchema;

impl MysqlSchema {
    fn schema_filter(&self, schema: Option<&str>) -> (String, Vec<Value>) {
        match schema {
            Some(schema) => ("table_schema = ?".to_owned(), vec![schema.into()]),
            None => ("table_schema = database()".to_owned(), Vec::new()),
        }
    }
}

impl SchemaGrammar for MysqlSchema {
    fn driver(&self) -> &'static str {
        "mysql"
    }

    fn quote_chars(&self) -> (char, char) {
        ('`', '`')
    }

    fn auto_increment_sql(&self) -> &'static str {
        "auto_increment"
    }

    fn index_type_sql(&self, index_type: IndexType) -> Option<&'static str> {
        match index_type {
            IndexType::Primary => Some("primary key"),
            IndexType::Unique => Some("unique key"),
            IndexType::Index => Some("key"),
            IndexType::Fulltext => Some("fulltext key"),
            IndexType::Spatial => Some("spatial key"),
        }
    }

    fn type_sql(&self, column: &Column) -> Result<String> {
        let length = column.length.unwrap_or(255);
        let precision = column.precision.unwrap_or(10);
        let scale = column.scale.unwrap_or(2);
        let base = match column.column_type {
            ColumnType::String => format!("varchar({length})"),
            ColumnType::Char => format!("char({})", column.length.unwrap_or(1)),
            ColumnType::Text => "text".to_owned(),
            ColumnType::MediumText => "mediumtext".to_owned(),
            ColumnType::LongText => "longtext".to_owned(),
            ColumnType::TinyInteger => "tinyint".to_owned(),
            ColumnType::SmallInteger => "smallint".to_owned(),
            ColumnType::Integer => "int".to_owned(),
            ColumnType::BigInteger => "bigint".to_owned(),
            ColumnType::Float => format!("float({precision},{scale})"),
            ColumnType::Double => format!("double({precision},{scale})"),
            ColumnType::Decimal => format!("decimal({precision},{scale})"),
            ColumnType::Boolean => "tinyint(1)".to_owned(),
            ColumnType::Date => "date".to_owned(),
            ColumnType::DateTime | ColumnType::DateTimeTz => "datetime".to_owned(),
            ColumnType::Time | ColumnType::TimeTz => "time".to_owned(),
            ColumnType::Timestamp | ColumnType::TimestampTz => "timestamp".to_owned(),
            ColumnType::Year => "year".to_owned(),
            ColumnType::Binary => format!("varbinary({length})"),
            ColumnType::Json | ColumnType::Jsonb => "json".to_owned(),
            ColumnType::Uuid => "char(36)".to_owned(),
            ColumnType::Enum => {
                let options: Vec<String> = column
                    .options
                    .iter()
                    .map(|o| format!("'{}'", o.replace('\'', "''")))
                    .collect();
                format!("enum({})", options.join(","))
            }
            ColumnType::IpAddress => "varchar(45)".to_owned(),
            ColumnType::MacAddress => "varchar(17)".to_owned(),
            ColumnType::Geometry => "geometry".to_owned(),
            ColumnType::Point => "point".to_owned(),
        };
        if column.unsigned && is_numeric(column.column_type) {
            Ok(format!("{base} unsigned"))
        } else {
            Ok(base)
        }
    }

    fn base_type(&self, token: &str) -> Option<ColumnType> {
        Some(match token {
            "varchar" => ColumnType::String,
            "char" => ColumnType::Char,
            "text" => ColumnType::Text,
            "mediumtext" => ColumnType::MediumText,
            "longtext" => ColumnType::LongText,
            "tinyint" => ColumnType::TinyInteger,
            "smallint" => ColumnType::SmallInteger,
            "int" | "integer" | "mediumint" => ColumnType::Integer,
            "bigint" => ColumnType::BigInteger,
            "float" => ColumnType::Float,
            "double" => ColumnType::Double,
            "decimal" | "numeric" => ColumnType::Decimal,
            "date" => ColumnType::Date,
            "datetime" => ColumnType::DateTime,
            "time" => ColumnType::Time,
            "timestamp" => ColumnType::Timestamp,
            "year" => ColumnType::Year,
            "varbinary" | "binary" | "blob" => ColumnType::Binary,
            "json" => ColumnType::Json,
            "enum" => ColumnType::Enum,
            "geometry" => ColumnType::Geometry,
            "point" => ColumnType::Point,
            _ => return None,
        })
    }

    fn column_sql(&self, column: &Column) -> Result<String> {
        let mut sql = format!("{} {}", self.id(&column.name), self.type_sql(column)?);
        if let Some(charset) = &column.charset {
            sql.push_str(&format!(" character set {charset}"));
        }
        if let Some(collation) = &column.collation {
            sql.push_str(&format!(" collate {collation}"));
        }
        sql.push_str(if column.nullable { " null" } else { " not null" });
        if let Some(default) = &column.default {
            sql.push_str(&format!(" default {}", self.val(default)));
        }
        if column.auto_increments() {
            sql.push_str(" auto_increment");
        }
        if let Some(comment) = &column.comment {
            sql.push_str(&format!(" comment '{}'", comment.replace('\'', "''")));
        }
        Ok(sql)
    }

    /// Indexes ride inside the `create table` statement.
    fn compile_create_table(&self, table: &Table) -> Result<Vec<String>> {
        let mut lines: Vec<String> = Vec::with_capacity(table.columns.len() + table.indexes.len());
        for column in table.columns.values() {
            lines.push(self.column_sql(column)?);
        }
        if let Some(primary) = table.get_primary() {
            lines.push(format!("primary key ({})", self.columnize(&primary.columns)));
        }
        for index in table.indexes.values() {
            let keyword = self
                .index_type_sql(index.index_type)
                .unwrap_or("key");
            lines.push(format!(
                "{keyword} {} ({})",
                self.id(&index.name),
                self.columnize(&index.columns)
            ));
        }
        Ok(vec![format!(
            "create table {} ({})",
            self.wrap_table(table),
            lines.join(", ")
        )])
    }

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
            IndexType::Fulltext => "create fulltext index",
            IndexType::Spatial => "create spatial index",
            IndexType::Index => "create index",
        };
        Ok(format!(
            "{keyword} {} on {} ({})",
            self.id(&index.name),
            self.wrap_table(table),
            self.columnize(&index.columns)
        ))
    }

    fn modify_column_sql(&self, table: &Table, column: &Column) -> Result<Vec<String>> {
        Ok(vec![format!(
            "alter table {} modify {}",
            self.wrap_table(table),
            self.column_sql(column)?
        )])
    }

    fn drop_index_sql(&self, table: &Table, name: &str) -> String {
        format!(
            "alter table {} drop index {}",
            self.wrap_table(table),
            self.id(name)
        )
    }

    fn rename_index_sql(&self, table: &Table, from: &str, to: &str) -> Result<Vec<String>> {
        Ok(vec![format!(
            "alter table {} rename index {} to {}",
            self.wrap_table(table),
            self.id(from),
            self.id(to)
        )])
    }

    fn drop_primary_sql(&self, table: &Table, _primary: Option<&Primary>) -> Result<String> {
        Ok(format!("alter table {} drop primary key", self.wrap_table(table)))
    }

    fn table_exists_query(&self, schema: Option<&str>, table: &str) -> (String, Vec<Value>) {
        let (filter, mut params) = self.schema_filter(schema);
        params.push(table.into());
        (
            format!(
                "select table_name as table_name from information_schema.tables \
                 where {filter} and table_name = ?"
            ),
            params,
        )
    }

    fn get_table(
        &self,
        executor: &dyn Executor,
        db: &str,
        schema: Option<&str>,
        name: &str,
    ) -> Result<Table> {
        let mut table = Table::new(name, schema.unwrap_or(""), db);

        let (filter, mut params) = self.schema_filter(schema);
        params.push(name.into());
        let columns_sql = format!(
            "select column_name as column_name, column_type as column_type, \
             is_nullable as is_nullable, column_default as column_default, \
             extra as extra, column_comment as column_comment, \
             character_set_name as character_set_name, collation_name as collation_name \
             from information_schema.columns \
             where {filter} and table_name = ? order by ordinal_position"
        );
        let rows = executor.query(&columns_sql, &params)?;
        if rows.is_empty() {
            return Err(QuernError::introspection(format!("table `{name}` not found")));
        }
        for row in &rows {
            let Some(column_name) = row_str(row, "column_name") else {
                continue;
            };
            let declared = row_str(row, "column_type").unwrap_or_default();
            let parsed = self.abstract_type(&declared);
            let mut column = table.new_column(&column_name, parsed.column_type);
            column.length = parsed.length;
            column.precision = parsed.precision;
            column.scale = parsed.scale;
            column.unsigned = parsed.unsigned;
            column.nullable = row_str(row, "is_nullable").as_deref() == Some("YES");
            column.default = row_str(row, "column_default").map(Value::Text);
            column.charset = row_str(row, "character_set_name");
            column.collation = row_str(row, "collation_name");
            column.comment = row_str(row, "column_comment").filter(|c| !c.is_empty());
            if parsed.column_type == ColumnType::Enum {
                column.options = parse_enum_options(&declared);
            }
            if row_str(row, "extra")
                .map(|e| e.to_lowercase().contains("auto_increment"))
                .unwrap_or(false)
            {
                column.extra = Some("auto_increment".to_owned());
            }
            table.push_column(column);
        }

        let (filter, mut params) = self.schema_filter(schema);
        params.push(name.into());
        let indexes_sql = format!(
            "select index_name as index_name, non_unique as non_unique, \
             column_name as column_name, index_type as index_type \
             from information_schema.statistics \
             where {filter} and table_name = ? order by index_name, seq_in_index"
        );
        for row in &executor.query(&indexes_sql, &params)? {
            let Some(index_name) = row_str(row, "index_name") else {
                continue;
            };
            let Some(column_name) = row_str(row, "column_name") else {
                continue;
            };
            if index_name == "PRIMARY" {
                match &mut table.primary {
                    Some(primary) => primary.columns.push(column_name),
                    None => {
                        table.primary = Some(Primary {
                            name: "PRIMARY".to_owned(),
                            db_name: db.to_owned(),
                            table_name: name.to_owned(),
                            columns: vec![column_name],
                        });
                    }
                }
                continue;
            }
            let index_type = match row_str(row, "index_type").as_deref() {
                Some("FULLTEXT") => IndexType::Fulltext,
                Some("SPATIAL") => IndexType::Spatial,
                _ if !row_bool(row, "non_unique") => IndexType::Unique,
                _ => IndexType::Index,
            };
            match table.indexes.get_mut(&index_name) {
                Some(index) => index.columns.push(column_name),
                None => {
                    let index = table.new_index(&index_name, index_type, vec![column_name]);
                    table.push_index(index);
                }
            }
        }

        Ok(table)
    }
}

fn is_numeric(column_type: ColumnType) -> bool {
    matches!(
        column_type,
        ColumnType::TinyInteger
            | ColumnType::SmallInteger
            | ColumnType::Integer
            | ColumnType::BigInteger
            | ColumnType::Float
            | ColumnType::Double
            | ColumnType::Decimal
    )
}
