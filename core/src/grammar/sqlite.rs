//! SQLite grammar: backtick identifiers, `?` placeholders, no row locks.

use super::Grammar;

#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Grammar for Sqlite {
    fn driver(&self) -> &'static str {
        "sqlite"
    }

    fn quote_chars(&self) -> (char, char) {
        ('`', '`')
    }

    fn compile_truncate(&self, table: &str) -> Vec<String> {
        // No TRUNCATE statement; an unqualified DELETE takes the fast path.
        vec![format!("delete from {}", self.wrap_table(table))]
    }
}
