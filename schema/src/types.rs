//! Table, column, index and command model.
//!
//! Columns and indexes reference their owning table by name keys (db,
//! schema, table), never by pointer; the DDL compilers only need names.
//! A [`Table`] keeps its columns and indexes in insertion-ordered,
//! name-unique maps so emission order is stable and lookups stay cheap.

use indexmap::IndexMap;
use quern_core::Value;
use serde::{Deserialize, Serialize};

/// Abstract column types mapped per dialect by the schema grammar's type
/// map; the reverse map recovers them during introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    String,
    Char,
    Text,
    MediumText,
    LongText,
    TinyInteger,
    SmallInteger,
    Integer,
    BigInteger,
    Float,
    Double,
    Decimal,
    Boolean,
    Date,
    DateTime,
    DateTimeTz,
    Time,
    TimeTz,
    Timestamp,
    TimestampTz,
    Year,
    Binary,
    Json,
    Jsonb,
    Uuid,
    Enum,
    IpAddress,
    MacAddress,
    Geometry,
    Point,
}

/// Index flavors; not every dialect supports every flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexType {
    Primary,
    Unique,
    Index,
    Fulltext,
    Spatial,
}

/// A column definition (declared or introspected).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub db_name: String,
    pub schema_name: String,
    pub table_name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub datetime_precision: Option<u32>,
    pub charset: Option<String>,
    pub collation: Option<String>,
    pub nullable: bool,
    pub default: Option<Value>,
    /// Free-form extra, e.g. `auto_increment`.
    pub extra: Option<String>,
    pub comment: Option<String>,
    /// Allowed values for [`ColumnType::Enum`] columns.
    pub options: Vec<String>,
    pub unsigned: bool,
    /// Marks this column for `ModifyColumn` in an alter diff.
    #[serde(skip)]
    pub change: bool,
}

impl Column {
    pub fn auto_increments(&self) -> bool {
        self.extra.as_deref() == Some("auto_increment")
    }

    /// Whether the introspectable shape of two columns differs.
    ///
    /// Lengths and precisions only count when both sides declare them:
    /// introspection always fills them in, blueprints often leave the
    /// dialect default.
    pub fn shape_differs(&self, other: &Column) -> bool {
        if self.column_type != other.column_type
            || self.nullable != other.nullable
            || self.unsigned != other.unsigned
        {
            return true;
        }
        if both_set_and_differ(self.length, other.length)
            || both_set_and_differ(self.precision, other.precision)
            || both_set_and_differ(self.scale, other.scale)
        {
            return true;
        }
        !defaults_equal(self.default.as_ref(), other.default.as_ref())
    }
}

fn both_set_and_differ(a: Option<u32>, b: Option<u32>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a != b)
}

/// Compares defaults textually; introspection reports every default as a
/// string regardless of the declared type.
pub(crate) fn defaults_equal(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => default_text(a) == default_text(b),
        _ => false,
    }
}

fn default_text(value: &Value) -> String {
    match value {
        Value::Text(s) => s.clone(),
        other => quern_core::grammar::literal(other).trim_matches('\'').to_owned(),
    }
}

/// An index over one or more columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    pub db_name: String,
    pub schema_name: String,
    pub table_name: String,
    #[serde(rename = "type")]
    pub index_type: IndexType,
    pub columns: Vec<String>,
}

impl Index {
    /// The identity used for set-membership diffing.
    pub fn signature(&self) -> (String, IndexType, Vec<String>) {
        (self.name.clone(), self.index_type, self.columns.clone())
    }
}

/// The primary key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Primary {
    pub name: String,
    pub db_name: String,
    pub table_name: String,
    pub columns: Vec<String>,
}

/// What a schema command does; payloads are names resolved against the
/// blueprint table at DDL-compile time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    AddColumn(String),
    ModifyColumn(String),
    RenameColumn { from: String, to: String },
    DropColumn(String),
    CreateIndex(String),
    DropIndex(String),
    RenameIndex { from: String, to: String },
    CreatePrimary,
    DropPrimary,
}

type Callback = Box<dyn FnOnce() + Send>;

/// One schema command with success/failure callbacks, run synchronously
/// and in-order as the batch proceeds.
pub struct Command {
    pub kind: CommandKind,
    on_success: Option<Callback>,
    on_failure: Option<Callback>,
}

impl Command {
    pub fn new(kind: CommandKind) -> Self {
        Command {
            kind,
            on_success: None,
            on_failure: None,
        }
    }

    pub fn on_success(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    pub fn on_failure(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_failure = Some(Box::new(f));
        self
    }

    /// Runs the success callback, at most once.
    pub fn succeed(&mut self) {
        if let Some(f) = self.on_success.take() {
            f();
        }
    }

    /// Runs the failure callback, at most once.
    pub fn fail(&mut self) {
        if let Some(f) = self.on_failure.take() {
            f();
        }
    }
}

impl core::fmt::Debug for Command {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Command")
            .field("kind", &self.kind)
            .field("on_success", &self.on_success.is_some())
            .field("on_failure", &self.on_failure.is_some())
            .finish()
    }
}

/// A table shape: declared by a blueprint or loaded by introspection.
#[derive(Debug, Serialize, Deserialize)]
pub struct Table {
    pub db_name: String,
    pub schema_name: String,
    pub name: String,
    pub columns: IndexMap<String, Column>,
    pub indexes: IndexMap<String, Index>,
    pub primary: Option<Primary>,
    #[serde(skip)]
    pub commands: Vec<Command>,
}

impl Table {
    pub fn new(name: &str, schema_name: &str, db_name: &str) -> Self {
        Table {
            db_name: db_name.to_owned(),
            schema_name: schema_name.to_owned(),
            name: name.to_owned(),
            columns: IndexMap::new(),
            indexes: IndexMap::new(),
            primary: None,
            commands: Vec::new(),
        }
    }

    /// A column pre-filled with this table's name keys.
    pub fn new_column(&self, name: &str, column_type: ColumnType) -> Column {
        Column {
            name: name.to_owned(),
            db_name: self.db_name.clone(),
            schema_name: self.schema_name.clone(),
            table_name: self.name.clone(),
            column_type,
            length: None,
            precision: None,
            scale: None,
            datetime_precision: None,
            charset: None,
            collation: None,
            nullable: false,
            default: None,
            extra: None,
            comment: None,
            options: Vec::new(),
            unsigned: false,
            change: false,
        }
    }

    /// An index pre-filled with this table's name keys.
    pub fn new_index(&self, name: &str, index_type: IndexType, columns: Vec<String>) -> Index {
        Index {
            name: name.to_owned(),
            db_name: self.db_name.clone(),
            schema_name: self.schema_name.clone(),
            table_name: self.name.clone(),
            index_type,
            columns,
        }
    }

    /// Inserts a column, keeping first-insertion order on re-push.
    pub fn push_column(&mut self, column: Column) -> &mut Self {
        self.columns.insert(column.name.clone(), column);
        self
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn get_column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.get_mut(name)
    }

    pub fn push_index(&mut self, index: Index) -> &mut Self {
        self.indexes.insert(index.name.clone(), index);
        self
    }

    pub fn has_index(&self, name: &str) -> bool {
        self.indexes.contains_key(name)
    }

    pub fn get_index(&self, name: &str) -> Option<&Index> {
        self.indexes.get(name)
    }

    /// The primary key, if declared.
    pub fn get_primary(&self) -> Option<&Primary> {
        self.primary.as_ref()
    }

    pub fn add_command(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Column names in declaration order.
    pub fn column_listing(&self) -> Vec<String> {
        self.columns.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_column_preserves_first_insert_order() {
        let mut table = Table::new("t", "", "");
        table.push_column(table.new_column("a", ColumnType::Integer));
        table.push_column(table.new_column("b", ColumnType::Integer));
        let mut replacement = table.new_column("a", ColumnType::Text);
        replacement.nullable = true;
        table.push_column(replacement);
        assert_eq!(table.column_listing(), vec!["a", "b"]);
        assert_eq!(table.get_column("a").map(|c| c.column_type), Some(ColumnType::Text));
    }

    #[test]
    fn test_shape_differs_ignores_one_sided_lengths() {
        let table = Table::new("t", "", "");
        let mut a = table.new_column("x", ColumnType::Integer);
        let mut b = table.new_column("x", ColumnType::Integer);
        b.precision = Some(10);
        assert!(!a.shape_differs(&b));
        a.nullable = true;
        assert!(a.shape_differs(&b));
    }

    #[test]
    fn test_defaults_compare_textually() {
        let table = Table::new("t", "", "");
        let mut a = table.new_column("x", ColumnType::Integer);
        let mut b = table.new_column("x", ColumnType::Integer);
        a.default = Some(Value::Int(0));
        b.default = Some(Value::Text("0".into()));
        assert!(!a.shape_differs(&b));
    }

    #[test]
    fn test_command_callbacks_run_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static HITS: AtomicUsize = AtomicUsize::new(0);
        let mut cmd = Command::new(CommandKind::AddColumn("x".into()))
            .on_success(|| {
                HITS.fetch_add(1, Ordering::SeqCst);
            });
        cmd.succeed();
        cmd.succeed();
        assert_eq!(HITS.load(Ordering::SeqCst), 1);
    }
}
