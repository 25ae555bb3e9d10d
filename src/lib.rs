//! # quern
//!
//! A fluent SQL query builder and schema migration engine.
//!
//! Queries are assembled as dialect-independent ASTs and compiled to
//! concrete SQL per backend (MySQL, PostgreSQL, SQLite, SQL Server) with
//! deterministic parameter binding; table shapes are declared as blueprints,
//! diffed against the live schema and applied as ordered DDL commands.
//!
//! ```no_run
//! use quern::{Condition, prelude::*};
//! use std::sync::Arc;
//!
//! # fn demo(executor: Arc<dyn Executor>) -> Result<()> {
//! let mut query = Builder::with_executor(Arc::new(quern::Mysql), executor);
//! query
//!     .table("users")
//!     .where_op("email", "like", "%@example.com")
//!     .where_all([
//!         Condition::from(("score", ">", 64.56)),
//!         Condition::from(("vote", 10)),
//!     ]);
//! let rows = query.get()?;
//! # let _ = rows;
//! # Ok(())
//! # }
//! ```

pub use quern_core::{
    Boolean, Builder, Condition, Direction, ExecResult, Executor, Expression, Grammar,
    GrammarRegistry, JoinKind, Lock, Mysql, Operand, Operator, Postgres, Query, QuernError,
    Result, Row, Rows, Sqlite, Sqlserver, Transaction, Value, raw,
};

pub use quern_core::{ast, builder, error, executor, expr, grammar, model, operator, value};

/// Schema blueprints, diffing and DDL.
pub mod schema {
    pub use quern_schema::*;
}

/// Everything commonly needed to build queries and migrate schemas.
pub mod prelude {
    pub use quern_core::prelude::*;
    pub use quern_schema::{Blueprint, SchemaBuilder, SchemaGrammar, SchemaRegistry};
}
