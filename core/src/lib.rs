//! # quern-core
//!
//! The core of the quern database abstraction layer: a dialect-independent
//! query AST, a fluent builder that assembles it, and per-dialect grammars
//! that render it to concrete SQL with deterministic parameter binding.
//!
//! Wire I/O is out of scope; execution goes through the injected
//! [`executor::Executor`] trait.

pub mod ast;
pub mod builder;
pub mod error;
pub mod executor;
pub mod expr;
pub mod grammar;
pub mod model;
pub mod operator;
pub mod value;

pub use ast::{Boolean, Direction, JoinKind, Lock, Query};
pub use builder::{Builder, Condition};
pub use error::{QuernError, Result};
pub use executor::{ExecResult, Executor, Row, Rows, Transaction};
pub use expr::{Expression, Operand, raw};
pub use grammar::{Grammar, GrammarRegistry, Mysql, Postgres, Sqlite, Sqlserver};
pub use operator::Operator;
pub use value::Value;

/// Everything commonly needed to build and run queries.
pub mod prelude {
    pub use crate::builder::Builder;
    pub use crate::error::{QuernError, Result};
    pub use crate::executor::{ExecResult, Executor, Row, Rows, Transaction};
    pub use crate::expr::raw;
    pub use crate::grammar::{Grammar, GrammarRegistry};
    pub use crate::value::Value;
}
