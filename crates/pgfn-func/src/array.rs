//! `float8[]` reductions.
//!
//! Both reductions read the flat element sequence in storage order and
//! ignore dimensionality.

use pgfn_error::Result;
use pgfn_types::{Datum, DatumType, Float8Array};

use crate::scalar::{check_arity, float8_array_arg};
use crate::{FunctionRegistry, ScalarFunction};

/// Left-to-right sum; `0.0` for an empty array.
pub fn array_sum(arr: &Float8Array) -> f64 {
    arr.iter().fold(0.0, |acc, &x| acc + x)
}

/// Maximum element, `None` for an empty array.
///
/// A strict `>` scan from the first element: a NaN never replaces the
/// running maximum, but a leading NaN is never replaced either.
pub fn array_max(arr: &Float8Array) -> Option<f64> {
    let (&first, rest) = arr.as_slice().split_first()?;
    let mut max = first;
    for &x in rest {
        if x > max {
            max = x;
        }
    }
    Some(max)
}

pub struct ArraySumFunc;

impl ScalarFunction for ArraySumFunc {
    fn invoke(&self, args: &[Datum]) -> Result<Datum> {
        check_arity(self.name(), args, 1)?;
        let arr = float8_array_arg(self.name(), args, 0)?;
        Ok(Datum::Float8(array_sum(arr)))
    }

    fn arg_types(&self) -> &[DatumType] {
        &[DatumType::Float8Array]
    }

    fn return_type(&self) -> DatumType {
        DatumType::Float8
    }

    fn name(&self) -> &str {
        "array_sum"
    }
}

pub struct ArrayMaxFunc;

impl ScalarFunction for ArrayMaxFunc {
    fn invoke(&self, args: &[Datum]) -> Result<Datum> {
        check_arity(self.name(), args, 1)?;
        let arr = float8_array_arg(self.name(), args, 0)?;
        Ok(array_max(arr).into())
    }

    fn arg_types(&self) -> &[DatumType] {
        &[DatumType::Float8Array]
    }

    fn return_type(&self) -> DatumType {
        DatumType::Float8
    }

    fn name(&self) -> &str {
        "array_max"
    }
}

/// Register `array_sum` and `array_max`.
pub fn register_array_builtins(registry: &mut FunctionRegistry) {
    registry.register_scalar(ArraySumFunc);
    registry.register_scalar(ArrayMaxFunc);
}
