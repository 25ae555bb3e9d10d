//! Declarative table blueprints.
//!
//! A blueprint closure fills a [`Table`] through typed column helpers; each
//! helper returns a [`ColumnDef`] handle for the fluent modifiers
//! (`.nullable()`, `.default_()`, `.unique()`, ...). The handle addresses
//! its column by name inside the table's collections, so no back-pointers
//! exist anywhere in the model.

use crate::types::{Column, ColumnType, Command, CommandKind, IndexType, Primary, Table};

/// The declarative target shape of one table plus the commands recorded
/// while declaring it.
#[derive(Debug)]
pub struct Blueprint {
    pub(crate) table: Table,
}

impl Blueprint {
    pub fn new(name: &str, schema_name: &str, db_name: &str) -> Self {
        Blueprint {
            table: Table::new(name, schema_name, db_name),
        }
    }

    /// Read access to the declared table.
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Attaches a command with caller-supplied callbacks.
    pub fn add_command(&mut self, command: Command) -> &mut Self {
        self.table.add_command(command);
        self
    }

    fn add_column(&mut self, name: &str, column_type: ColumnType) -> ColumnDef<'_> {
        let column = self.table.new_column(name, column_type);
        self.table.push_column(column);
        self.table
            .add_command(Command::new(CommandKind::AddColumn(name.to_owned())));
        ColumnDef {
            table: &mut self.table,
            name: name.to_owned(),
        }
    }

    // ==================== typed column helpers ====================

    /// `bigint unsigned auto-increment primary key` in one stroke.
    pub fn id(&mut self, name: &str) -> ColumnDef<'_> {
        self.add_column(name, ColumnType::BigInteger)
            .unsigned()
            .auto_increment()
            .primary()
    }

    pub fn string(&mut self, name: &str, length: u32) -> ColumnDef<'_> {
        self.add_column(name, ColumnType::String).length(length)
    }

    pub fn char(&mut self, name: &str, length: u32) -> ColumnDef<'_> {
        self.add_column(name, ColumnType::Char).length(length)
    }

    pub fn text(&mut self, name: &str) -> ColumnDef<'_> {
        self.add_column(name, ColumnType::Text)
    }

    pub fn medium_text(&mut self, name: &str) -> ColumnDef<'_> {
        self.add_column(name, ColumnType::MediumText)
    }

    pub fn long_text(&mut self, name: &str) -> ColumnDef<'_> {
        self.add_column(name, ColumnType::LongText)
    }

    pub fn tiny_integer(&mut self, name: &str) -> ColumnDef<'_> {
        self.add_column(name, ColumnType::TinyInteger)
    }

    pub fn small_integer(&mut self, name: &str) -> ColumnDef<'_> {
        self.add_column(name, ColumnType::SmallInteger)
    }

    pub fn integer(&mut self, name: &str) -> ColumnDef<'_> {
        self.add_column(name, ColumnType::Integer)
    }

    pub fn big_integer(&mut self, name: &str) -> ColumnDef<'_> {
        self.add_column(name, ColumnType::BigInteger)
    }

    pub fn float(&mut self, name: &str, precision: u32, scale: u32) -> ColumnDef<'_> {
        self.add_column(name, ColumnType::Float)
            .precision(precision, scale)
    }

    pub fn double(&mut self, name: &str, precision: u32, scale: u32) -> ColumnDef<'_> {
        self.add_column(name, ColumnType::Double)
            .precision(precision, scale)
    }

    pub fn decimal(&mut self, name: &str, precision: u32, scale: u32) -> ColumnDef<'_> {
        self.add_column(name, ColumnType::Decimal)
            .precision(precision, scale)
    }

    pub fn boolean(&mut self, name: &str) -> ColumnDef<'_> {
        self.add_column(name, ColumnType::Boolean)
    }

    pub fn date(&mut self, name: &str) -> ColumnDef<'_> {
        self.add_column(name, ColumnType::Date)
    }

    pub fn date_time(&mut self, name: &str) -> ColumnDef<'_> {
        self.add_column(name, ColumnType::DateTime)
    }

    pub fn date_time_tz(&mut self, name: &str) -> ColumnDef<'_> {
        self.add_column(name, ColumnType::DateTimeTz)
    }

    pub fn time(&mut self, name: &str) -> ColumnDef<'_> {
        self.add_column(name, ColumnType::Time)
    }

    pub fn time_tz(&mut self, name: &str) -> ColumnDef<'_> {
        self.add_column(name, ColumnType::TimeTz)
    }

    pub fn timestamp(&mut self, name: &str) -> ColumnDef<'_> {
        self.add_column(name, ColumnType::Timestamp)
    }

    pub fn timestamp_tz(&mut self, name: &str) -> ColumnDef<'_> {
        self.add_column(name, ColumnType::TimestampTz)
    }

    pub fn year(&mut self, name: &str) -> ColumnDef<'_> {
        self.add_column(name, ColumnType::Year)
    }

    pub fn binary(&mut self, name: &str, length: u32) -> ColumnDef<'_> {
        self.add_column(name, ColumnType::Binary).length(length)
    }

    pub fn json(&mut self, name: &str) -> ColumnDef<'_> {
        self.add_column(name, ColumnType::Json)
    }

    pub fn jsonb(&mut self, name: &str) -> ColumnDef<'_> {
        self.add_column(name, ColumnType::Jsonb)
    }

    pub fn uuid(&mut self, name: &str) -> ColumnDef<'_> {
        self.add_column(name, ColumnType::Uuid)
    }

    /// A closed-vocabulary string column.
    pub fn enumeration<I>(&mut self, name: &str, options: I) -> ColumnDef<'_>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let options: Vec<String> = options.into_iter().map(Into::into).collect();
        let mut handle = self.add_column(name, ColumnType::Enum);
        if let Some(column) = handle.table.get_column_mut(&handle.name) {
            column.options = options;
        }
        handle
    }

    pub fn ip_address(&mut self, name: &str) -> ColumnDef<'_> {
        self.add_column(name, ColumnType::IpAddress)
    }

    pub fn mac_address(&mut self, name: &str) -> ColumnDef<'_> {
        self.add_column(name, ColumnType::MacAddress)
    }

    pub fn geometry(&mut self, name: &str) -> ColumnDef<'_> {
        self.add_column(name, ColumnType::Geometry)
    }

    pub fn point(&mut self, name: &str) -> ColumnDef<'_> {
        self.add_column(name, ColumnType::Point)
    }

    /// `created_at` and `updated_at` nullable timestamps.
    pub fn timestamps(&mut self) -> &mut Self {
        self.timestamp("created_at").nullable();
        self.timestamp("updated_at").nullable();
        self
    }

    /// A nullable `deleted_at` timestamp for soft deletion.
    pub fn soft_deletes(&mut self) -> &mut Self {
        self.timestamp("deleted_at").nullable();
        self
    }

    // ==================== alter helpers ====================

    /// Renames a column.
    pub fn rename_column(&mut self, from: &str, to: &str) -> &mut Self {
        self.table.add_command(Command::new(CommandKind::RenameColumn {
            from: from.to_owned(),
            to: to.to_owned(),
        }));
        self
    }

    /// Drops a column.
    pub fn drop_column(&mut self, name: &str) -> &mut Self {
        self.table
            .add_command(Command::new(CommandKind::DropColumn(name.to_owned())));
        self
    }

    /// Drops an index by name.
    pub fn drop_index(&mut self, name: &str) -> &mut Self {
        self.table
            .add_command(Command::new(CommandKind::DropIndex(name.to_owned())));
        self
    }

    /// Renames an index.
    pub fn rename_index(&mut self, from: &str, to: &str) -> &mut Self {
        self.table.add_command(Command::new(CommandKind::RenameIndex {
            from: from.to_owned(),
            to: to.to_owned(),
        }));
        self
    }

    /// Drops the primary key.
    pub fn drop_primary(&mut self) -> &mut Self {
        self.table.add_command(Command::new(CommandKind::DropPrimary));
        self
    }

    /// Declares a standalone (possibly composite) index.
    pub fn add_index<I>(&mut self, name: &str, index_type: IndexType, columns: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let index = self
            .table
            .new_index(name, index_type, columns.into_iter().map(Into::into).collect());
        self.table.push_index(index);
        self.table
            .add_command(Command::new(CommandKind::CreateIndex(name.to_owned())));
        self
    }
}

/// Fluent modifier handle for the column just declared.
///
/// Holds the owning table mutably and addresses the column by name, so the
/// index helpers can touch the table's index map from the same handle.
pub struct ColumnDef<'a> {
    table: &'a mut Table,
    name: String,
}

impl ColumnDef<'_> {
    fn column(&mut self) -> &mut Column {
        self.table
            .get_column_mut(&self.name)
            .expect("blueprint column vanished from its table")
    }

    pub fn nullable(mut self) -> Self {
        self.column().nullable = true;
        self
    }

    /// Sets the default value.
    pub fn default_(mut self, value: impl Into<quern_core::Value>) -> Self {
        self.column().default = Some(value.into());
        self
    }

    /// Alias of [`ColumnDef::default_`] for call sites that read better
    /// with a verb.
    pub fn set_default(self, value: impl Into<quern_core::Value>) -> Self {
        self.default_(value)
    }

    pub fn unsigned(mut self) -> Self {
        self.column().unsigned = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.column().extra = Some("auto_increment".to_owned());
        self
    }

    pub fn length(mut self, length: u32) -> Self {
        self.column().length = Some(length);
        self
    }

    pub fn precision(mut self, precision: u32, scale: u32) -> Self {
        let column = self.column();
        column.precision = Some(precision);
        column.scale = Some(scale);
        self
    }

    pub fn charset(mut self, charset: &str) -> Self {
        self.column().charset = Some(charset.to_owned());
        self
    }

    pub fn collation(mut self, collation: &str) -> Self {
        self.column().collation = Some(collation.to_owned());
        self
    }

    pub fn comment(mut self, comment: &str) -> Self {
        self.column().comment = Some(comment.to_owned());
        self
    }

    /// Makes this column the primary key.
    pub fn primary(mut self) -> Self {
        let primary = Primary {
            name: "PRIMARY".to_owned(),
            db_name: self.table.db_name.clone(),
            table_name: self.table.name.clone(),
            columns: vec![self.name.clone()],
        };
        self.table.primary = Some(primary);
        self.table
            .add_command(Command::new(CommandKind::CreatePrimary));
        self.column().nullable = false;
        self
    }

    fn push_index(self, index_type: IndexType, suffix: &str) -> Self {
        let index_name = format!("{}_{}_{}", self.table.name, self.name, suffix);
        let index = self
            .table
            .new_index(&index_name, index_type, vec![self.name.clone()]);
        self.table.push_index(index);
        self.table
            .add_command(Command::new(CommandKind::CreateIndex(index_name)));
        self
    }

    /// Adds a unique index over this column.
    pub fn unique(self) -> Self {
        self.push_index(IndexType::Unique, "unique")
    }

    /// Adds a plain index over this column.
    pub fn index(self) -> Self {
        self.push_index(IndexType::Index, "index")
    }

    /// Adds a fulltext index over this column.
    pub fn fulltext(self) -> Self {
        self.push_index(IndexType::Fulltext, "fulltext")
    }

    /// Adds a spatial index over this column.
    pub fn spatial(self) -> Self {
        self.push_index(IndexType::Spatial, "spatial")
    }

    /// Marks the column changed so an alter diff emits `ModifyColumn`.
    pub fn change(mut self) -> Self {
        self.column().change = true;
        self
    }
}
