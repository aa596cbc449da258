//! Thin glue: `int4` arithmetic, `factorial`, and type passthroughs.
//!
//! Overflow and division by zero are errors, never wrapped results.

use pgfn_error::{PgFnError, Result};
use pgfn_types::{Datum, DatumType};

use crate::scalar::{check_arity, int4_arg, point_arg, timestamptz_arg};
use crate::{FunctionRegistry, ScalarFunction};

/// Largest `n` with `n!` representable as `i64`.
pub const MAX_FACTORIAL_INPUT: i32 = 20;

// ── Binary int4 operators ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Int4Op {
    Add,
    Sub,
    Mul,
    Div,
}

impl Int4Op {
    fn apply(self, a: i32, b: i32) -> Result<i32> {
        let out = match self {
            Self::Add => a.checked_add(b),
            Self::Sub => a.checked_sub(b),
            Self::Mul => a.checked_mul(b),
            Self::Div => {
                if b == 0 {
                    return Err(PgFnError::DivisionByZero);
                }
                // i32::MIN / -1 is the only overflowing quotient.
                a.checked_div(b)
            }
        };
        out.ok_or(PgFnError::IntegerOverflow)
    }
}

pub struct Int4BinaryFunc {
    name: &'static str,
    op: Int4Op,
}

impl Int4BinaryFunc {
    pub const ADD: Self = Self {
        name: "add_nums",
        op: Int4Op::Add,
    };
    pub const SUB: Self = Self {
        name: "sub_nums",
        op: Int4Op::Sub,
    };
    pub const MUL: Self = Self {
        name: "mul_nums",
        op: Int4Op::Mul,
    };
    pub const DIV: Self = Self {
        name: "divide_nums",
        op: Int4Op::Div,
    };
}

impl ScalarFunction for Int4BinaryFunc {
    fn invoke(&self, args: &[Datum]) -> Result<Datum> {
        check_arity(self.name, args, 2)?;
        let a = int4_arg(self.name, args, 0)?;
        let b = int4_arg(self.name, args, 1)?;
        self.op.apply(a, b).map(Datum::Int4)
    }

    fn arg_types(&self) -> &[DatumType] {
        &[DatumType::Int4, DatumType::Int4]
    }

    fn return_type(&self) -> DatumType {
        DatumType::Int4
    }

    fn name(&self) -> &str {
        self.name
    }
}

// ── factorial ─────────────────────────────────────────────────────────────

/// `n!` for `0 <= n <= 20`.
pub fn factorial(n: i32) -> Result<i64> {
    if !(0..=MAX_FACTORIAL_INPUT).contains(&n) {
        return Err(PgFnError::out_of_range("factorial input", n));
    }
    Ok((1..=i64::from(n)).product())
}

pub struct FactorialFunc;

impl ScalarFunction for FactorialFunc {
    fn invoke(&self, args: &[Datum]) -> Result<Datum> {
        check_arity(self.name(), args, 1)?;
        let n = int4_arg(self.name(), args, 0)?;
        factorial(n).map(Datum::Int8)
    }

    fn arg_types(&self) -> &[DatumType] {
        &[DatumType::Int4]
    }

    fn return_type(&self) -> DatumType {
        DatumType::Int8
    }

    fn name(&self) -> &str {
        "factorial"
    }
}

// ── Passthroughs ──────────────────────────────────────────────────────────

pub struct PointCopyFunc;

impl ScalarFunction for PointCopyFunc {
    fn invoke(&self, args: &[Datum]) -> Result<Datum> {
        check_arity(self.name(), args, 1)?;
        point_arg(self.name(), args, 0).map(Datum::Point)
    }

    fn arg_types(&self) -> &[DatumType] {
        &[DatumType::Point]
    }

    fn return_type(&self) -> DatumType {
        DatumType::Point
    }

    fn name(&self) -> &str {
        "point_copy"
    }
}

pub struct TimestampTzCopyFunc;

impl ScalarFunction for TimestampTzCopyFunc {
    fn invoke(&self, args: &[Datum]) -> Result<Datum> {
        check_arity(self.name(), args, 1)?;
        timestamptz_arg(self.name(), args, 0).map(Datum::TimestampTz)
    }

    fn arg_types(&self) -> &[DatumType] {
        &[DatumType::TimestampTz]
    }

    fn return_type(&self) -> DatumType {
        DatumType::TimestampTz
    }

    fn name(&self) -> &str {
        "timestamptz_copy"
    }
}

/// Register the arithmetic and passthrough glue.
pub fn register_glue_builtins(registry: &mut FunctionRegistry) {
    registry.register_scalar(Int4BinaryFunc::ADD);
    registry.register_scalar(Int4BinaryFunc::SUB);
    registry.register_scalar(Int4BinaryFunc::MUL);
    registry.register_scalar(Int4BinaryFunc::DIV);
    registry.register_scalar(FactorialFunc);
    registry.register_scalar(PointCopyFunc);
    registry.register_scalar(TimestampTzCopyFunc);
}

#[cfg(test)]
mod tests {
    use pgfn_types::{Point, TimestampTz};

    use super::*;

    fn call(f: &dyn ScalarFunction, a: i32, b: i32) -> Result<Datum> {
        f.invoke(&[Datum::Int4(a), Datum::Int4(b)])
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(call(&Int4BinaryFunc::ADD, 2, 3).unwrap(), Datum::Int4(5));
        assert_eq!(call(&Int4BinaryFunc::SUB, 2, 3).unwrap(), Datum::Int4(-1));
        assert_eq!(call(&Int4BinaryFunc::MUL, -4, 3).unwrap(), Datum::Int4(-12));
        assert_eq!(call(&Int4BinaryFunc::DIV, 7, 2).unwrap(), Datum::Int4(3));
        assert_eq!(call(&Int4BinaryFunc::DIV, -7, 2).unwrap(), Datum::Int4(-3));
    }

    #[test]
    fn test_arithmetic_overflow() {
        for (f, a, b) in [
            (Int4BinaryFunc::ADD, i32::MAX, 1),
            (Int4BinaryFunc::SUB, i32::MIN, 1),
            (Int4BinaryFunc::MUL, i32::MAX, 2),
            (Int4BinaryFunc::DIV, i32::MIN, -1),
        ] {
            assert!(
                matches!(call(&f, a, b), Err(PgFnError::IntegerOverflow)),
                "{} should overflow",
                f.name
            );
        }
    }

    #[test]
    fn test_divide_by_zero() {
        let err = call(&Int4BinaryFunc::DIV, 1, 0).unwrap_err();
        assert!(matches!(err, PgFnError::DivisionByZero));
        assert_eq!(err.sql_state().code(), "22012");
    }

    #[test]
    fn test_factorial() {
        assert_eq!(factorial(0).unwrap(), 1);
        assert_eq!(factorial(5).unwrap(), 120);
        assert_eq!(factorial(20).unwrap(), 2_432_902_008_176_640_000);
        assert!(matches!(factorial(21), Err(PgFnError::OutOfRange { .. })));
        assert!(matches!(factorial(-1), Err(PgFnError::OutOfRange { .. })));
        assert_eq!(
            FactorialFunc.invoke(&[Datum::Int4(3)]).unwrap(),
            Datum::Int8(6)
        );
    }

    #[test]
    fn test_passthroughs() {
        let p = Datum::Point(Point::new(1.5, -2.0));
        assert_eq!(PointCopyFunc.invoke(std::slice::from_ref(&p)).unwrap(), p);
        let t = Datum::TimestampTz(TimestampTz::from_pg_micros(1_000_000));
        let out = TimestampTzCopyFunc.invoke(&[t.clone()]).unwrap();
        assert_eq!(out, t);
        assert!(matches!(
            PointCopyFunc.invoke(&[Datum::Null]),
            Err(PgFnError::NullArgument { .. })
        ));
    }

    #[test]
    fn test_register_glue_builtins() {
        let mut registry = FunctionRegistry::new();
        register_glue_builtins(&mut registry);
        assert_eq!(registry.len(), 7);
        assert!(registry.contains_scalar("divide_nums"));
        assert!(registry.find_scalar("factorial", 1).is_some());
    }
}
