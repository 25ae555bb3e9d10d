//! Raw SQL expressions and the operand model for value positions.

use crate::value::Value;
use chrono::NaiveDateTime;

/// An opaque raw SQL fragment.
///
/// Expressions pass through the compiler verbatim and contribute zero
/// bindings. `?` placeholders inside a raw fragment are rewritten to the
/// active dialect's placeholder at compile time; `??` escapes a literal
/// question mark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression(pub(crate) String);

impl Expression {
    pub fn new(sql: impl Into<String>) -> Self {
        Expression(sql.into())
    }

    pub fn sql(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Expression {
    fn from(sql: &str) -> Self {
        Expression(sql.to_owned())
    }
}

impl From<String> for Expression {
    fn from(sql: String) -> Self {
        Expression(sql)
    }
}

/// Shorthand for [`Expression::new`], mirroring `raw("NOW()")` call sites.
pub fn raw(sql: impl Into<String>) -> Expression {
    Expression::new(sql)
}

/// What may sit in a value position of a predicate: a bindable scalar or a
/// raw expression rendered verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Value(Value),
    Raw(Expression),
}

impl Operand {
    pub fn is_null(&self) -> bool {
        matches!(self, Operand::Value(Value::Null))
    }

    /// Number of placeholders this operand consumes.
    pub fn placeholder_count(&self) -> usize {
        match self {
            Operand::Raw(_) => 0,
            Operand::Value(v) => v.scalar_count(),
        }
    }
}

impl From<Expression> for Operand {
    fn from(e: Expression) -> Self {
        Operand::Raw(e)
    }
}

impl From<Value> for Operand {
    fn from(v: Value) -> Self {
        Operand::Value(v)
    }
}

// `impl<T: Into<Value>> From<T> for Operand` would collide with the
// reflexive From impl, so the scalar conversions are spelled out.
macro_rules! operand_from_scalar {
    ($($ty:ty),* $(,)?) => {
        $(impl From<$ty> for Operand {
            fn from(v: $ty) -> Self {
                Operand::Value(v.into())
            }
        })*
    };
}

operand_from_scalar!(bool, i8, i16, i32, i64, u32, f32, f64, &str, String, Vec<u8>, NaiveDateTime);

impl<T: Into<Value>> From<Option<T>> for Operand {
    fn from(v: Option<T>) -> Self {
        Operand::Value(v.into())
    }
}
