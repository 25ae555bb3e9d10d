//! The schema builder: create/alter/drop tables against an executor.
//!
//! Alters are introspect → diff → ordered commands. Every command settles
//! its callbacks synchronously before the next command starts; a command
//! whose precondition is already satisfied is skipped and counts as
//! success; a cancelled executor error fails the rest of the batch.

use crate::blueprint::Blueprint;
use crate::diff::{TableDiff, diff};
use crate::grammar::SchemaGrammar;
use crate::types::{Command, CommandKind, Table};
use quern_core::error::{QuernError, Result};
use quern_core::executor::Executor;
use std::sync::Arc;

/// Schema operations bound to one grammar, one executor and one database.
pub struct SchemaBuilder {
    grammar: Arc<dyn SchemaGrammar>,
    executor: Arc<dyn Executor>,
    db_name: String,
    schema_name: Option<String>,
}

impl SchemaBuilder {
    pub fn new(grammar: Arc<dyn SchemaGrammar>, executor: Arc<dyn Executor>) -> Self {
        SchemaBuilder {
            grammar,
            executor,
            db_name: String::new(),
            schema_name: None,
        }
    }

    /// Names the database the builder introspects.
    pub fn with_database(mut self, db_name: &str) -> Self {
        self.db_name = db_name.to_owned();
        self
    }

    /// Overrides the schema namespace (defaults per dialect: `public`,
    /// `dbo`, or the connection's current database).
    pub fn with_schema(mut self, schema_name: &str) -> Self {
        self.schema_name = Some(schema_name.to_owned());
        self
    }

    fn schema(&self) -> Option<&str> {
        self.schema_name
            .as_deref()
            .or_else(|| self.grammar.default_schema())
    }

    fn blueprint(&self, name: &str) -> Blueprint {
        Blueprint::new(name, self.schema().unwrap_or(""), &self.db_name)
    }

    // ==================== create ====================

    /// Creates a table from a blueprint closure. On failure every recorded
    /// command's failure callback runs in reverse declaration order.
    pub fn create_table(&self, name: &str, f: impl FnOnce(&mut Blueprint)) -> Result<()> {
        let mut blueprint = self.blueprint(name);
        f(&mut blueprint);
        let statements = self.grammar.compile_create_table(&blueprint.table)?;
        let mut commands = std::mem::take(&mut blueprint.table.commands);

        for sql in &statements {
            tracing::debug!(sql = %sql, table = name, "create table");
            if let Err(err) = self.executor.execute(sql, &[]) {
                tracing::error!(table = name, error = %err, "create table failed");
                for command in commands.iter_mut().rev() {
                    command.fail();
                }
                return Err(err);
            }
        }
        for command in commands.iter_mut() {
            command.succeed();
        }
        Ok(())
    }

    /// As [`SchemaBuilder::create_table`], aborting the process on error.
    pub fn must_create_table(&self, name: &str, f: impl FnOnce(&mut Blueprint)) {
        if let Err(err) = self.create_table(name, f) {
            panic!("quern: create table `{name}`: {err}");
        }
    }

    // ==================== alter ====================

    /// Alters a table: introspects the current shape, diffs it against the
    /// blueprint and applies the resulting commands one by one. Individual
    /// command failures settle that command's callback and surface as the
    /// batch error after the batch finishes; cancellation stops the batch.
    pub fn alter_table(&self, name: &str, f: impl FnOnce(&mut Blueprint)) -> Result<()> {
        let current = self.get_table(name)?;
        let mut blueprint = self.blueprint(name);
        f(&mut blueprint);
        let TableDiff {
            table,
            mut commands,
        } = diff(blueprint, &current);

        let mut first_error: Option<QuernError> = None;
        let mut cancelled = false;
        for command in commands.iter_mut() {
            if cancelled {
                command.fail();
                continue;
            }
            if command_is_stale(&command.kind, &current) {
                tracing::warn!(command = ?command.kind, table = name, "skipping stale command");
                command.succeed();
                continue;
            }
            match self.apply_command(&table, &current, command) {
                Ok(()) => command.succeed(),
                Err(err) => {
                    command.fail();
                    cancelled = err.is_cancelled();
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// As [`SchemaBuilder::alter_table`], aborting the process on error.
    pub fn must_alter_table(&self, name: &str, f: impl FnOnce(&mut Blueprint)) {
        if let Err(err) = self.alter_table(name, f) {
            panic!("quern: alter table `{name}`: {err}");
        }
    }

    fn apply_command(&self, table: &Table, current: &Table, command: &Command) -> Result<()> {
        let statements = self.grammar.compile_command(table, current, &command.kind)?;
        for sql in &statements {
            tracing::debug!(sql = %sql, "schema command");
            self.executor.execute(sql, &[])?;
        }
        Ok(())
    }

    // ==================== table-level operations ====================

    pub fn rename_table(&self, from: &str, to: &str) -> Result<()> {
        let sql = self.grammar.compile_rename_table(from, to);
        self.executor.execute(&sql, &[]).map(|_| ())
    }

    pub fn drop_table(&self, name: &str) -> Result<()> {
        let sql = self.grammar.compile_drop_table(name);
        self.executor.execute(&sql, &[]).map(|_| ())
    }

    pub fn drop_table_if_exists(&self, name: &str) -> Result<()> {
        let sql = self.grammar.compile_drop_table_if_exists(name);
        self.executor.execute(&sql, &[]).map(|_| ())
    }

    // ==================== introspection ====================

    pub fn has_table(&self, name: &str) -> Result<bool> {
        let (sql, params) = self.grammar.table_exists_query(self.schema(), name);
        Ok(!self.executor.query(&sql, &params)?.is_empty())
    }

    pub fn has_column(&self, table: &str, column: &str) -> Result<bool> {
        Ok(self.get_table(table)?.has_column(column))
    }

    pub fn get_column_listing(&self, table: &str) -> Result<Vec<String>> {
        Ok(self.get_table(table)?.column_listing())
    }

    /// Loads the current shape of a table via the dialect's introspection
    /// queries.
    pub fn get_table(&self, name: &str) -> Result<Table> {
        self.grammar
            .get_table(self.executor.as_ref(), &self.db_name, self.schema(), name)
    }
}

/// A command whose precondition no longer holds against the introspected
/// shape is a no-op that counts as success.
fn command_is_stale(kind: &CommandKind, current: &Table) -> bool {
    match kind {
        CommandKind::AddColumn(name) => current.has_column(name),
        CommandKind::ModifyColumn(name) => !current.has_column(name),
        CommandKind::DropColumn(name) => !current.has_column(name),
        CommandKind::RenameColumn { from, .. } => !current.has_column(from),
        CommandKind::CreateIndex(_) => false,
        CommandKind::DropIndex(name) => !current.has_index(name),
        CommandKind::RenameIndex { from, .. } => !current.has_index(from),
        CommandKind::CreatePrimary => false,
        CommandKind::DropPrimary => current.get_primary().is_none(),
    }
}
