//! The executor contract: the seam between the pure compile path and a
//! driver that can run prepared statements.
//!
//! Compilation is synchronous and side-effect free; everything that may
//! block on I/O — including timeouts and cancellation — lives behind these
//! traits. quern ships no driver; hosts inject one.

use crate::error::Result;
use crate::value::Value;
use indexmap::IndexMap;

/// One result row: an ordered column-alias → scalar mapping.
pub type Row = IndexMap<String, Value>;

/// An ordered result set.
pub type Rows = Vec<Row>;

/// Outcome of a non-query statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    pub last_insert_id: Option<i64>,
}

/// A driver capable of running prepared statements with positional
/// parameters. Parameters arrive flattened, in placeholder order.
pub trait Executor: Send + Sync {
    /// Runs a row-returning statement.
    fn query(&self, sql: &str, params: &[Value]) -> Result<Rows>;

    /// Runs a statement for its side effects.
    fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecResult>;

    /// Opens a transaction.
    fn begin(&self) -> Result<Box<dyn Transaction + '_>>;
}

/// An open transaction; dropped without commit means the driver decides
/// (drivers conventionally roll back).
pub trait Transaction {
    fn commit(self: Box<Self>) -> Result<()>;
    fn rollback(self: Box<Self>) -> Result<()>;
}
