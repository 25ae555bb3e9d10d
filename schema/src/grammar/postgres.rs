//! PostgreSQL schema grammar: serial auto-increment types, check-constraint
//! enums, `information_schema` + `pg_indexes` introspection.

use super::{SchemaGrammar, row_str, row_u32};
use crate::types::{Column, ColumnType, IndexType, Primary, Table};
use quern_core::error::{QuernError, Result};
use quern_core::executor::Executor;
use quern_core::grammar::literal;
use quern_core::value::Value;

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresSchema;

impl SchemaGrammar for PostgresSchema {
    fn driver(&self) -> &'static str {
        "postgres"
    }

    fn quote_chars(&self) -> (char, char) {
        ('"', '"')
    }

    fn placeholder(&self, n: usize) -> String {
        format!("${n}")
    }

    fn default_schema(&self) -> Option<&'static str> {
        Some("public")
    }

    fn val(&self, value: &Value) -> String {
        match value {
            Value::Bool(true) => "true".to_owned(),
            Value::Bool(false) => "false".to_owned(),
            other => literal(other),
        }
    }

    fn type_sql(&self, column: &Column) -> Result<String> {
        let length = column.length.unwrap_or(255);
        let precision = column.precision.unwrap_or(10);
        let scale = column.scale.unwrap_or(2);
        // Auto-increment folds into the serial types.
        if column.auto_increments() {
            return Ok(match column.column_type {
                ColumnType::SmallInteger | ColumnType::TinyInteger => "smallserial",
                ColumnType::Integer => "serial",
                ColumnType::BigInteger => "bigserial",
                other => {
                    return Err(QuernError::compile(format!(
                        "{other:?} cannot auto-increment on postgres"
                    )));
                }
            }
            .to_owned());
        }
        Ok(match column.column_type {
            ColumnType::String => format!("varchar({length})"),
            ColumnType::Char => format!("char({})", column.length.unwrap_or(1)),
            ColumnType::Text | ColumnType::MediumText | ColumnType::LongText => "text".to_owned(),
            ColumnType::TinyInteger | ColumnType::SmallInteger => "smallint".to_owned(),
            ColumnType::Integer => "integer".to_owned(),
            ColumnType::BigInteger => "bigint".to_owned(),
            ColumnType::Float => "real".to_owned(),
            ColumnType::Double => "double precision".to_owned(),
            ColumnType::Decimal => format!("decimal({precision},{scale})"),
            ColumnType::Boolean => "boolean".to_owned(),
            ColumnType::Date => "date".to_owned(),
            ColumnType::DateTime | ColumnType::Timestamp => "timestamp".to_owned(),
            ColumnType::DateTimeTz | ColumnType::TimestampTz => "timestamptz".to_owned(),
            ColumnType::Time => "time".to_owned(),
            ColumnType::TimeTz => "timetz".to_owned(),
            ColumnType::Year => "integer".to_owned(),
            ColumnType::Binary => "bytea".to_owned(),
            ColumnType::Json => "json".to_owned(),
            ColumnType::Jsonb => "jsonb".to_owned(),
            ColumnType::Uuid => "uuid".to_owned(),
            ColumnType::Enum => {
                let options: Vec<String> = column
                    .options
                    .iter()
                    .map(|o| format!("'{}'", o.replace('\'', "''")))
                    .collect();
                format!(
                    "varchar(255) check ({} in ({}))",
                    self.id(&column.name),
                    options.join(", ")
                )
            }
            ColumnType::IpAddress => "inet".to_owned(),
            ColumnType::MacAddress => "macaddr".to_owned(),
            ColumnType::Geometry => "geometry".to_owned(),
            ColumnType::Point => "point".to_owned(),
        })
    }

    fn base_type(&self, token: &str) -> Option<ColumnType> {
        Some(match token {
            "varchar" | "character varying" => ColumnType::String,
            "char" | "character" | "bpchar" => ColumnType::Char,
            "text" => ColumnType::Text,
            "smallint" | "int2" => ColumnType::SmallInteger,
            "integer" | "int" | "int4" => ColumnType::Integer,
            "bigint" | "int8" => ColumnType::BigInteger,
            "real" | "float4" => ColumnType::Float,
            "double precision" | "float8" => ColumnType::Double,
            "decimal" | "numeric" => ColumnType::Decimal,
            "boolean" | "bool" => ColumnType::Boolean,
            "date" => ColumnType::Date,
            "timestamp" | "timestamp without time zone" => ColumnType::Timestamp,
            "timestamptz" | "timestamp with time zone" => ColumnType::TimestampTz,
            "time" | "time without time zone" => ColumnType::Time,
            "timetz" | "time with time zone" => ColumnType::TimeTz,
            "bytea" => ColumnType::Binary,
            "json" => ColumnType::Json,
            "jsonb" => ColumnType::Jsonb,
            "uuid" => ColumnType::Uuid,
            "inet" => ColumnType::IpAddress,
            "macaddr" => ColumnType::MacAddress,
            "geometry" => ColumnType::Geometry,
            "point" => ColumnType::Point,
            "smallserial" => ColumnType::SmallInteger,
            "serial" => ColumnType::Integer,
            "bigserial" => ColumnType::BigInteger,
            _ => return None,
        })
    }

    fn modify_column_sql(&self, table: &Table, column: &Column) -> Result<Vec<String>> {
        let wrapped = self.wrap_table(table);
        let name = self.id(&column.name);
        let mut statements = vec![format!(
            "alter table {wrapped} alter column {name} type {}",
            self.type_sql(column)?
        )];
        statements.push(if column.nullable {
            format!("alter table {wrapped} alter column {name} drop not null")
        } else {
            format!("alter table {wrapped} alter column {name} set not null")
        });
        statements.push(match &column.default {
            Some(default) => format!(
                "alter table {wrapped} alter column {name} set default {}",
                self.val(default)
            ),
            None => format!("alter table {wrapped} alter column {name} drop default"),
        });
        Ok(statements)
    }

    fn rename_index_sql(&self, _table: &Table, from: &str, to: &str) -> Result<Vec<String>> {
        Ok(vec![format!(
            "alter index {} rename to {}",
            self.id(from),
            self.id(to)
        )])
    }

    fn get_table(
        &self,
        executor: &dyn Executor,
        db: &str,
        schema: Option<&str>,
        name: &str,
    ) -> Result<Table> {
        let schema = schema.or(self.default_schema()).unwrap_or("public");
        let mut table = Table::new(name, schema, db);
        let params: Vec<Value> = vec![schema.into(), name.into()];

        let columns_sql = "select column_name as column_name, data_type as data_type, \
             udt_name as udt_name, is_nullable as is_nullable, \
             column_default as column_default, \
             character_maximum_length as character_maximum_length, \
             numeric_precision as numeric_precision, numeric_scale as numeric_scale \
             from information_schema.columns \
             where table_schema = $1 and table_name = $2 order by ordinal_position";
        let rows = executor.query(columns_sql, &params)?;
        if rows.is_empty() {
            return Err(QuernError::introspection(format!("table `{name}` not found")));
        }
        for row in &rows {
            let Some(column_name) = row_str(row, "column_name") else {
                continue;
            };
            let declared = row_str(row, "data_type")
                .or_else(|| row_str(row, "udt_name"))
                .unwrap_or_default();
            let parsed = self.abstract_type(&declared.to_lowercase());
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
            match row_str(row, "column_default") {
                // serial columns surface as nextval() defaults
                Some(default) if default.starts_with("nextval(") => {
                    column.extra = Some("auto_increment".to_owned());
                }
                Some(default) => {
                    column.default = Some(Value::Text(strip_default_cast(&default)));
                }
                None => {}
            }
            table.push_column(column);
        }

        let primary_sql = "select kcu.column_name as column_name, \
             tc.constraint_name as constraint_name \
             from information_schema.table_constraints tc \
             join information_schema.key_column_usage kcu \
             on kcu.constraint_name = tc.constraint_name \
             and kcu.table_schema = tc.table_schema \
             where tc.table_schema = $1 and tc.table_name = $2 \
             and tc.constraint_type = 'PRIMARY KEY' order by kcu.ordinal_position";
        let mut primary_name = None;
        for row in &executor.query(primary_sql, &params)? {
            let Some(column_name) = row_str(row, "column_name") else {
                continue;
            };
            primary_name = row_str(row, "constraint_name");
            match &mut table.primary {
                Some(primary) => primary.columns.push(column_name),
                None => {
                    table.primary = Some(Primary {
                        name: primary_name.clone().unwrap_or_else(|| "PRIMARY".to_owned()),
                        db_name: db.to_owned(),
                        table_name: name.to_owned(),
                        columns: vec![column_name],
                    });
                }
            }
        }

        let indexes_sql = "select indexname as index_name, indexdef as index_def \
             from pg_indexes where schemaname = $1 and tablename = $2";
        for row in &executor.query(indexes_sql, &params)? {
            let Some(index_name) = row_str(row, "index_name") else {
                continue;
            };
            if Some(&index_name) == primary_name.as_ref() {
                continue;
            }
            let definition = row_str(row, "index_def").unwrap_or_default();
            let index_type = if definition.to_lowercase().contains("unique index") {
                IndexType::Unique
            } else {
                IndexType::Index
            };
            let columns = parse_indexdef_columns(&definition);
            let index = table.new_index(&index_name, index_type, columns);
            table.push_index(index);
        }

        Ok(table)
    }
}

/// `nextval('t_id_seq'::regclass)` aside, defaults come back with a type
/// cast suffix: `'WAITING'::character varying`.
fn strip_default_cast(default: &str) -> String {
    let head = default.split("::").next().unwrap_or(default);
    head.trim().trim_matches('\'').to_owned()
}

/// Pulls the column list out of a `pg_indexes.indexdef` statement:
/// `CREATE UNIQUE INDEX x ON t USING btree (a, b)`.
fn parse_indexdef_columns(definition: &str) -> Vec<String> {
    let Some(start) = definition.rfind('(') else {
        return Vec::new();
    };
    definition[start + 1..]
        .trim_end_matches(')')
        .split(',')
        .map(|col| col.trim().trim_matches('"').to_owned())
        .filter(|col| !col.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_default_cast() {
        assert_eq!(strip_default_cast("'WAITING'::character varying"), "WAITING");
        assert_eq!(strip_default_cast("0"), "0");
    }

    #[test]
    fn test_parse_indexdef_columns() {
        assert_eq!(
            parse_indexdef_columns(
                "CREATE UNIQUE INDEX t_email_unique ON public.t USING btree (email)"
            ),
            vec!["email"]
        );
        assert_eq!(
            parse_indexdef_columns("CREATE INDEX i ON t (a, b)"),
            vec!["a", "b"]
        );
    }

    #[test]
    fn test_serial_types() {
        let table = Table::new("t", "public", "");
        let mut id = table.new_column("id", ColumnType::BigInteger);
        id.extra = Some("auto_increment".to_owned());
        assert_eq!(PostgresSchema.type_sql(&id).unwrap(), "bigserial");
    }
}
