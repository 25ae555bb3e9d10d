//! A programmable in-memory executor standing in for the driver layer.

#![allow(dead_code)]

use quern::{ExecResult, Executor, QuernError, Result, Row, Rows, Transaction, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Builds an ordered row from `(column, value)` pairs.
pub fn row(pairs: &[(&str, Value)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), v.clone()))
        .collect()
}

#[derive(Clone, Copy)]
enum FailMode {
    Execute,
    Cancelled,
}

/// Records every statement and replays canned responses in FIFO order.
#[derive(Default)]
pub struct MockExecutor {
    calls: Mutex<Vec<(String, Vec<Value>)>>,
    query_responses: Mutex<VecDeque<Rows>>,
    exec_responses: Mutex<VecDeque<ExecResult>>,
    failures: Mutex<Vec<(String, FailMode)>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues one result set for the next `query` call.
    pub fn push_rows(&self, rows: Rows) {
        self.query_responses.lock().unwrap().push_back(rows);
    }

    /// Queues one result for the next `execute` call.
    pub fn push_exec(&self, result: ExecResult) {
        self.exec_responses.lock().unwrap().push_back(result);
    }

    /// Any statement containing `needle` fails with an execute error.
    pub fn fail_on(&self, needle: &str) {
        self.failures
            .lock()
            .unwrap()
            .push((needle.to_owned(), FailMode::Execute));
    }

    /// Any statement containing `needle` fails with a cancellation error.
    pub fn cancel_on(&self, needle: &str) {
        self.failures
            .lock()
            .unwrap()
            .push((needle.to_owned(), FailMode::Cancelled));
    }

    /// Every statement seen so far, with its parameters.
    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }

    /// Just the SQL strings, in execution order.
    pub fn statements(&self) -> Vec<String> {
        self.calls().into_iter().map(|(sql, _)| sql).collect()
    }

    fn check_failure(&self, sql: &str) -> Result<()> {
        for (needle, mode) in self.failures.lock().unwrap().iter() {
            if sql.contains(needle.as_str()) {
                return Err(match mode {
                    FailMode::Execute => QuernError::execute(format!("forced failure: {needle}")),
                    FailMode::Cancelled => {
                        QuernError::Cancelled(format!("forced cancel: {needle}").into())
                    }
                });
            }
        }
        Ok(())
    }

    fn record(&self, sql: &str, params: &[Value]) {
        self.calls
            .lock()
            .unwrap()
            .push((sql.to_owned(), params.to_vec()));
    }
}

impl Executor for MockExecutor {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Rows> {
        self.record(sql, params);
        self.check_failure(sql)?;
        Ok(self
            .query_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecResult> {
        self.record(sql, params);
        self.check_failure(sql)?;
        Ok(self
            .exec_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    fn begin(&self) -> Result<Box<dyn Transaction + '_>> {
        Ok(Box::new(MockTransaction))
    }
}

struct MockTransaction;

impl Transaction for MockTransaction {
    fn commit(self: Box<Self>) -> Result<()> {
        Ok(())
    }

    fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
