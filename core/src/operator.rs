//! The closed comparison-operator vocabulary.

use crate::error::{QuernError, Result};
use compact_str::CompactString;

/// Operators the builder accepts in predicate positions.
///
/// Anything outside this set is a usage error at build time.
const OPERATORS: &[&str] = &[
    "=", "<", ">", "<=", ">=", "<>", "!=", "like", "not like", "ilike", "rlike", "regexp",
    "between", "in", "not in", "is", "is not", "exists", "not exists",
];

/// A validated, lowercased SQL comparison operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator(CompactString);

impl Operator {
    /// The default equality operator.
    pub fn eq() -> Self {
        Operator(CompactString::const_new("="))
    }

    pub(crate) fn exists(not: bool) -> Self {
        if not {
            Operator(CompactString::const_new("not exists"))
        } else {
            Operator(CompactString::const_new("exists"))
        }
    }

    pub(crate) fn in_list(not: bool) -> Self {
        if not {
            Operator(CompactString::const_new("not in"))
        } else {
            Operator(CompactString::const_new("in"))
        }
    }

    /// Validates `op` against the closed operator set.
    pub fn parse(op: &str) -> Result<Self> {
        let lowered = op.trim().to_lowercase();
        if OPERATORS.contains(&lowered.as_str()) {
            Ok(Operator(CompactString::from(lowered)))
        } else {
            Err(QuernError::usage(format!("invalid operator `{op}`")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Operator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_closed_set() {
        for op in ["=", ">", "like", "NOT LIKE", "  in ", "is not"] {
            assert!(Operator::parse(op).is_ok(), "operator {op} should parse");
        }
    }

    #[test]
    fn test_parse_rejects_unknown() {
        for op in ["==", "<=>", "contains", ""] {
            assert!(Operator::parse(op).is_err(), "operator {op} should be rejected");
        }
    }

    #[test]
    fn test_parse_lowercases() {
        assert_eq!(Operator::parse("LIKE").unwrap().as_str(), "like");
    }
}
