//! MySQL grammar: backtick identifiers, `?` placeholders.

use super::{Grammar, lock_suffix};
use crate::ast::Query;

#[derive(Debug, Clone, Copy, Default)]
pub struct Mysql;

impl Grammar for Mysql {
    fn driver(&self) -> &'static str {
        "mysql"
    }

    fn quote_chars(&self) -> (char, char) {
        ('`', '`')
    }

    fn compile_lock(&self, query: &Query) -> String {
        lock_suffix(query, "lock in share mode")
    }
}
