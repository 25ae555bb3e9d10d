//! SQL Server schema grammar: identity columns, `sp_rename`, sys-catalog
//! index introspection.

use super::{SchemaGrammar, row_bool, row_str, row_u32};
use crate::types::{Column, ColumnType, IndexType, Primary, Table};
use quern_core::error::{QuernError, Result};
use quern_core::executor::Executor;
use quern_core::value::Value;

#[derive(Debug, Clone, Copy, Default)]
pub struct SqlserverSchema;

impl SqlserverSchema {
    fn object_name(&self, schema: Option<&str>, table: &str) -> String {
        format!("{}.{table}", schema.unwrap_or("dbo"))
    }
}

impl SchemaGrammar for SqlserverSchema {
    fn driver(&self) -> &'static str {
        "sqlserver"
    }

    fn quote_chars(&self) -> (char, char) {
        ('"', '"')
    }

    fn placeholder(&self, n: usize) -> String {
        format!("@p{n}")
    }

    fn default_schema(&self) -> Option<&'static str> {
        Some("dbo")
    }

    fn auto_increment_sql(&self) -> &'static str {
        "identity(1,1)"
    }

    fn type_sql(&self, column: &Column) -> Result<String> {
        let length = column.length.unwrap_or(255);
        let precision = column.precision.unwrap_or(10);
        let scale = column.scale.unwrap_or(2);
        Ok(match column.column_type {
            ColumnType::String => format!("nvarchar({length})"),
            ColumnType::Char => format!("nchar({})", column.length.unwrap_or(1)),
            ColumnType::Text | ColumnType::MediumText | ColumnType::LongText => {
                "nvarchar(max)".to_owned()
            }
            ColumnType::TinyInteger => "tinyint".to_owned(),
            ColumnType::SmallInteger => "smallint".to_owned(),
            ColumnType::Integer => "int".to_owned(),
            ColumnType::BigInteger => "bigint".to_owned(),
            ColumnType::Float => "real".to_owned(),
            ColumnType::Double => "float".to_owned(),
            ColumnType::Decimal => format!("decimal({precision},{scale})"),
            ColumnType::Boolean => "bit".to_owned(),
            ColumnType::Date => "date".to_owned(),
            ColumnType::DateTime | ColumnType::Timestamp => "datetime2".to_owned(),
            ColumnType::DateTimeTz | ColumnType::TimestampTz => "datetimeoffset".to_owned(),
            ColumnType::Time | ColumnType::TimeTz => "time".to_owned(),
            ColumnType::Year => "int".to_owned(),
            ColumnType::Binary => format!("varbinary({length})"),
            ColumnType::Json | ColumnType::Jsonb => "nvarchar(max)".to_owned(),
            ColumnType::Uuid => "uniqueidentifier".to_owned(),
            ColumnType::Enum => {
                let options: Vec<String> = column
                    .options
                    .iter()
                    .map(|o| format!("'{}'", o.replace('\'', "''")))
                    .collect();
                format!(
                    "nvarchar(255) check ({} in ({}))",
                    self.id(&column.name),
                    options.join(", ")
                )
            }
            ColumnType::IpAddress => "nvarchar(45)".to_owned(),
            ColumnType::MacAddress => "nvarchar(17)".to_owned(),
            ColumnType::Geometry | ColumnType::Point => "geometry".to_owned(),
        })
    }

    fn base_type(&self, token: &str) -> Option<ColumnType> {
        Some(match token {
            "nvarchar" | "varchar" => ColumnType::String,
            "nchar" | "char" => ColumnType::Char,
            "ntext" | "text" => ColumnType::Text,
            "tinyint" => ColumnType::TinyInteger,
            "smallint" => ColumnType::SmallInteger,
            "int" => ColumnType::Integer,
            "bigint" => ColumnType::BigInteger,
            "real" => ColumnType::Float,
            "float" => ColumnType::Double,
            "decimal" | "numeric" => ColumnType::Decimal,
            "bit" => ColumnType::Boolean,
            "date" => ColumnType::Date,
            "datetime" | "datetime2" => ColumnType::DateTime,
            "datetimeoffset" => ColumnType::DateTimeTz,
            "time" => ColumnType::Time,
            "varbinary" | "binary" | "image" => ColumnType::Binary,
            "uniqueidentifier" => ColumnType::Uuid,
            "geometry" => ColumnType::Geometry,
            _ => return None,
        })
    }

    fn add_column_keyword(&self) -> &'static str {
        "add"
    }

    fn compile_rename_table(&self, from: &str, to: &str) -> String {
        format!("sp_rename '{from}', '{to}'")
    }

    fn modify_column_sql(&self, table: &Table, column: &Column) -> Result<Vec<String>> {
        // ALTER COLUMN takes type and nullability; defaults are bound
        // constraints and stay out of this engine's single-apply scope.
        let nullability = if column.nullable { "null" } else { "not null" };
        Ok(vec![format!(
            "alter table {} alter column {} {} {nullability}",
            self.wrap_table(table),
            self.id(&column.name),
            self.type_sql(column)?
        )])
    }

    fn rename_column_sql(&self, table: &Table, from: &str, to: &str) -> String {
        format!("sp_rename '{}.{from}', '{to}', 'COLUMN'", table.name)
    }

    fn drop_index_sql(&self, table: &Table, name: &str) -> String {
        format!("drop index {} on {}", self.id(name), self.wrap_table(table))
    }

    fn rename_index_sql(&self, table: &Table, from: &str, to: &str) -> Result<Vec<String>> {
        Ok(vec![format!(
            "sp_rename '{}.{from}', '{to}', 'INDEX'",
            table.name
        )])
    }

    fn get_table(
        &self,
        executor: &dyn Executor,
        db: &str,
        schema: Option<&str>,
        name: &str,
    ) -> Result<Table> {
        let schema_name = schema.or(self.default_schema()).unwrap_or("dbo");
        let mut table = Table::new(name, schema_name, db);
        let params: Vec<Value> = vec![schema_name.into(), name.into()];

        let columns_sql = "select column_name as column_name, data_type as data_type, \
             is_nullable as is_nullable, column_default as column_default, \
             character_maximum_length as character_maximum_length, \
             numeric_precision as numeric_precision, numeric_scale as numeric_scale \
             from information_schema.columns \
             where table_schema = @p1 and table_name = @p2 order by ordinal_position";
        let rows = executor.query(columns_sql, &params)?;
        if rows.is_empty() {
            return Err(QuernError::introspection(format!("table `{name}` not found")));
        }
        for row in &rows {
            let Some(column_name) = row_str(row, "column_name") else {
                continue;
            };
            let declared = row_str(row, "data_type").unwrap_or_default();
            let parsed = self.abstract_type(&declared);
            let mut column = table.new_column(&column_name, parsed.column_type);
            column.length = row_u32(row, "character_maximum_length");
            if matches!(
                parsed.column_type,
                ColumnType::Decimal | ColumnType::Float | ColumnType::Double
            ) {
                column.precision = row_u32(row, "numeric_precision");
                column.scale = row_u32(row, "numeric_scale");
            }
            column.nullable = row_str(row, "is_nullable").as_deref() == Some("YES");
            column.default = row_str(row, "column_default")
                .map(|d| Value::Text(d.trim_matches(|c| c == '(' || c == ')' || c == '\'').to_owned()));
            table.push_column(column);
        }

        let object = self.object_name(schema, name);
        let identity_sql = "select name as column_name from sys.identity_columns \
             where object_id = object_id(@p1)";
        for row in &executor.query(identity_sql, &[Value::from(object.as_str())])? {
            if let Some(column_name) = row_str(row, "column_name")
                && let Some(column) = table.get_column_mut(&column_name)
            {
                column.extra = Some("auto_increment".to_owned());
            }
        }

        let indexes_sql = "select i.name as index_name, i.is_unique as is_unique, \
             i.is_primary_key as is_primary, c.name as column_name \
             from sys.indexes i \
             join sys.index_columns ic on i.object_id = ic.object_id and i.index_id = ic.index_id \
             join sys.columns c on ic.object_id = c.object_id and ic.column_id = c.column_id \
             where i.object_id = object_id(@p1) order by i.name, ic.key_ordinal";
        for row in &executor.query(indexes_sql, &[Value::from(object.as_str())])? {
            let Some(index_name) = row_str(row, "index_name") else {
                continue;
            };
            let Some(column_name) = row_str(row, "column_name") else {
                continue;
            };
            if row_bool(row, "is_primary") {
                match &mut table.primary {
                    Some(primary) => primary.columns.push(column_name),
                    None => {
                        table.primary = Some(Primary {
                            name: index_name,
                            db_name: db.to_owned(),
                            table_name: name.to_owned(),
                            columns: vec![column_name],
                        });
                    }
                }
                continue;
            }
            let index_type = if row_bool(row, "is_unique") {
                IndexType::Unique
            } else {
                IndexType::Index
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
