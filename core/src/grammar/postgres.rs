//! PostgreSQL grammar: double-quoted identifiers, `$N` placeholders.

use super::{Grammar, literal, lock_suffix};
use crate::ast::Query;
use crate::value::Value;

#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Grammar for Postgres {
    fn driver(&self) -> &'static str {
        "postgres"
    }

    fn quote_chars(&self) -> (char, char) {
        ('"', '"')
    }

    fn placeholder(&self, n: usize) -> String {
        format!("${n}")
    }

    fn val(&self, value: &Value) -> String {
        // Booleans are a real type here; 1/0 defaults would not bind.
        match value {
            Value::Bool(true) => "true".to_owned(),
            Value::Bool(false) => "false".to_owned(),
            other => literal(other),
        }
    }

    fn returning_clause(&self, key: &str) -> Option<String> {
        Some(format!("returning {}", self.id(key)))
    }

    fn compile_lock(&self, query: &Query) -> String {
        lock_suffix(query, "for share")
    }
}
