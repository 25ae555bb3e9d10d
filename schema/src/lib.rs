//! # quern-schema
//!
//! Declarative table blueprints, schema diffing and per-dialect DDL for
//! quern: blueprint → diff against the introspected shape → ordered command
//! list → dialect DDL, with per-command success/failure callbacks.

pub mod blueprint;
pub mod builder;
pub mod diff;
pub mod grammar;
pub mod types;

pub use blueprint::{Blueprint, ColumnDef};
pub use builder::SchemaBuilder;
pub use diff::{TableDiff, diff};
pub use grammar::{
    MysqlSchema, PostgresSchema, SchemaGrammar, SchemaRegistry, SqliteSchema, SqlserverSchema,
};
pub use types::{Column, ColumnType, Command, CommandKind, Index, IndexType, Primary, Table};
