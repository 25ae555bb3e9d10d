//! SQL Server grammar: double-quoted identifiers, `@pN` placeholders,
//! `offset ... fetch` pagination.

use super::Grammar;
use crate::ast::{Order, Query};
use crate::error::Result;

#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlserver;

impl Grammar for Sqlserver {
    fn driver(&self) -> &'static str {
        "sqlserver"
    }

    fn quote_chars(&self) -> (char, char) {
        ('"', '"')
    }

    fn placeholder(&self, n: usize) -> String {
        format!("@p{n}")
    }

    fn compile_orders(&self, query: &Query, orders: &[Order], offset: &mut usize) -> Result<String> {
        let sql = default_orders(self, orders, offset)?;
        // OFFSET/FETCH is only legal after ORDER BY; stabilize paginated
        // queries that did not order explicitly.
        if sql.is_empty() && (query.limit.is_some() || query.offset.is_some()) {
            return Ok("order by (select 0)".to_owned());
        }
        Ok(sql)
    }

    fn compile_limit(&self, _limit: Option<u64>) -> String {
        String::new()
    }

    fn compile_offset_clause(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            (None, None) => String::new(),
            (Some(limit), offset) => {
                format!("offset {} rows fetch next {limit} rows only", offset.unwrap_or(0))
            }
            (None, Some(offset)) => format!("offset {offset} rows"),
        }
    }

    fn compile_exists(&self, query: &Query) -> Result<String> {
        // EXISTS is not allowed in a bare select list here.
        Ok(format!(
            "select case when exists({}) then 1 else 0 end as {}",
            self.compile_select(query)?,
            self.id("exists")
        ))
    }
}

fn default_orders(grammar: &Sqlserver, orders: &[Order], offset: &mut usize) -> Result<String> {
    if orders.is_empty() {
        return Ok(String::new());
    }
    let clauses: Vec<String> = orders
        .iter()
        .map(|order| match order {
            Order::Column { column, direction } => {
                format!("{} {}", grammar.wrap(column), direction.as_str())
            }
            Order::Raw(e) => grammar.substitute_placeholders(e.sql(), offset),
        })
        .collect();
    Ok(format!("order by {}", clauses.join(", ")))
}
