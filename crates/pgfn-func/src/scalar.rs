//! Scalar (row-level) function trait.
//!
//! Scalar functions compute a single output value from a fixed, positional,
//! typed argument list. Each invocation is independent: no state survives
//! between calls.
//!
//! # Send + Sync
//!
//! Functions are shared through `Arc<dyn ScalarFunction>` in the
//! [`FunctionRegistry`](crate::FunctionRegistry), so implementations must be
//! thread-safe.

use pgfn_error::{PgFnError, Result};
use pgfn_types::{Datum, DatumType, Float8Array, Point, TimestampTz, Varlena};

use crate::collation::CollationFunction;

/// What a caller gets when any argument is NULL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NullPolicy {
    /// NULL arguments are a fatal error.
    Reject,
    /// NULL in, NULL out, without invoking the function.
    Propagate,
}

/// A scalar SQL function.
///
/// # Error Handling
///
/// - Return [`PgFnError::NullArgument`] for NULLs under [`NullPolicy::Reject`].
/// - Return [`PgFnError::OutOfRange`] / [`PgFnError::IntegerOverflow`] for
///   domain errors.
/// - Return [`PgFnError::TooBig`] if a varlena result exceeds the size limit.
pub trait ScalarFunction: Send + Sync {
    /// Execute this function on the given arguments.
    fn invoke(&self, args: &[Datum]) -> Result<Datum>;

    /// Execute under an explicit collation.
    ///
    /// Only collation-sensitive functions override this; everything else
    /// ignores the collation.
    fn invoke_with_collation(
        &self,
        args: &[Datum],
        _collation: &dyn CollationFunction,
    ) -> Result<Datum> {
        self.invoke(args)
    }

    /// Whether the result depends on the caller's collation.
    fn uses_collation(&self) -> bool {
        false
    }

    /// Whether this function is deterministic (same inputs → same output).
    fn is_deterministic(&self) -> bool {
        true
    }

    /// NULL handling, applied by the dispatcher before `invoke`.
    fn null_policy(&self) -> NullPolicy {
        NullPolicy::Reject
    }

    /// Positional argument types.
    fn arg_types(&self) -> &[DatumType];

    /// Result type (the result may also be NULL).
    fn return_type(&self) -> DatumType;

    /// The number of arguments this function accepts.
    fn num_args(&self) -> usize {
        self.arg_types().len()
    }

    /// The function name, used for registration and in error messages.
    fn name(&self) -> &str;
}

/// Fail with [`PgFnError::WrongArgumentCount`] unless `args` has `expected`
/// entries.
pub fn check_arity(function: &str, args: &[Datum], expected: usize) -> Result<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(PgFnError::WrongArgumentCount {
            function: function.to_owned(),
            expected,
            actual: args.len(),
        })
    }
}

/// Check every non-NULL argument against the declared signature.
pub fn check_arg_types(function: &dyn ScalarFunction, args: &[Datum]) -> Result<()> {
    check_arity(function.name(), args, function.num_args())?;
    for (arg, expected) in args.iter().zip(function.arg_types()) {
        if let Some(actual) = arg.datum_type() {
            if actual != *expected {
                return Err(PgFnError::type_mismatch(
                    expected.sql_name(),
                    actual.sql_name(),
                ));
            }
        }
    }
    Ok(())
}

fn arg<'a, T>(
    function: &str,
    args: &'a [Datum],
    idx: usize,
    expected: DatumType,
    extract: impl FnOnce(&'a Datum) -> Option<T>,
) -> Result<T> {
    let Some(datum) = args.get(idx) else {
        return Err(PgFnError::WrongArgumentCount {
            function: function.to_owned(),
            expected: idx + 1,
            actual: args.len(),
        });
    };
    if datum.is_null() {
        return Err(PgFnError::null_argument(function, idx + 1));
    }
    let actual = datum.type_name();
    extract(datum).ok_or_else(|| PgFnError::type_mismatch(expected.sql_name(), actual))
}

/// Argument `idx` as `text`; NULL is rejected.
pub fn text_arg<'a>(function: &str, args: &'a [Datum], idx: usize) -> Result<&'a Varlena> {
    arg(function, args, idx, DatumType::Text, Datum::as_text)
}

/// Argument `idx` as UTF-8 `text`.
///
/// NULL is rejected, and so is a payload that is not valid UTF-8
/// ([`PgFnError::InvalidTextEncoding`], naming the offending bytes).
pub fn text_str_arg<'a>(function: &str, args: &'a [Datum], idx: usize) -> Result<&'a str> {
    let payload = text_arg(function, args, idx)?.payload();
    std::str::from_utf8(payload).map_err(|err| {
        let bad = &payload[err.valid_up_to()..];
        let len = err.error_len().unwrap_or(bad.len());
        let bytes: Vec<String> = bad[..len].iter().map(|b| format!("0x{b:02x}")).collect();
        PgFnError::invalid_encoding(bytes.join(" "))
    })
}

/// Argument `idx` as `integer`; NULL is rejected.
pub fn int4_arg(function: &str, args: &[Datum], idx: usize) -> Result<i32> {
    arg(function, args, idx, DatumType::Int4, Datum::as_int4)
}

/// Argument `idx` as `double precision[]`; NULL is rejected.
pub fn float8_array_arg<'a>(
    function: &str,
    args: &'a [Datum],
    idx: usize,
) -> Result<&'a Float8Array> {
    arg(
        function,
        args,
        idx,
        DatumType::Float8Array,
        Datum::as_float8_array,
    )
}

/// Argument `idx` as `point`; NULL is rejected.
pub fn point_arg(function: &str, args: &[Datum], idx: usize) -> Result<Point> {
    arg(function, args, idx, DatumType::Point, Datum::as_point)
}

/// Argument `idx` as `timestamptz`; NULL is rejected.
pub fn timestamptz_arg(function: &str, args: &[Datum], idx: usize) -> Result<TimestampTz> {
    arg(
        function,
        args,
        idx,
        DatumType::TimestampTz,
        Datum::as_timestamptz,
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    // -- Mock: add_one(int4) -> int4 --

    struct AddOne;

    impl ScalarFunction for AddOne {
        fn invoke(&self, args: &[Datum]) -> Result<Datum> {
            let i = int4_arg(self.name(), args, 0)?;
            i.checked_add(1)
                .map(Datum::Int4)
                .ok_or(PgFnError::IntegerOverflow)
        }

        fn arg_types(&self) -> &[DatumType] {
            &[DatumType::Int4]
        }

        fn return_type(&self) -> DatumType {
            DatumType::Int4
        }

        fn name(&self) -> &str {
            "add_one"
        }
    }

    // -- Mock: non-deterministic, null-propagating --

    struct Lenient;

    impl ScalarFunction for Lenient {
        fn invoke(&self, _args: &[Datum]) -> Result<Datum> {
            Ok(Datum::Int8(42))
        }

        fn is_deterministic(&self) -> bool {
            false
        }

        fn null_policy(&self) -> NullPolicy {
            NullPolicy::Propagate
        }

        fn arg_types(&self) -> &[DatumType] {
            &[DatumType::Text]
        }

        fn return_type(&self) -> DatumType {
            DatumType::Int8
        }

        fn name(&self) -> &str {
            "lenient"
        }
    }

    #[test]
    fn test_scalar_function_invoke_basic() {
        let f = AddOne;
        assert_eq!(f.invoke(&[Datum::Int4(41)]).unwrap(), Datum::Int4(42));
        assert!(matches!(
            f.invoke(&[Datum::Int4(i32::MAX)]),
            Err(PgFnError::IntegerOverflow)
        ));
    }

    #[test]
    fn test_scalar_function_defaults() {
        let f = AddOne;
        assert!(f.is_deterministic());
        assert!(!f.uses_collation());
        assert_eq!(f.null_policy(), NullPolicy::Reject);
        assert_eq!(f.num_args(), 1);

        let g = Lenient;
        assert!(!g.is_deterministic());
        assert_eq!(g.null_policy(), NullPolicy::Propagate);
    }

    #[test]
    fn test_arg_helpers_reject_null() {
        let err = int4_arg("f", &[Datum::Null], 0).unwrap_err();
        assert!(matches!(
            err,
            PgFnError::NullArgument { ref function, position: 1 } if function == "f"
        ));
    }

    #[test]
    fn test_arg_helpers_type_mismatch() {
        let err = text_arg("f", &[Datum::Int4(1)], 0).unwrap_err();
        let PgFnError::TypeMismatch { expected, actual } = &err else {
            panic!("got {err:?}");
        };
        assert_eq!((expected.as_str(), actual.as_str()), ("text", "integer"));
    }

    #[test]
    fn test_text_str_arg_requires_utf8() {
        let good = [Datum::Text(Varlena::from_text("héllo").unwrap())];
        assert_eq!(text_str_arg("f", &good, 0).unwrap(), "héllo");

        let bad = [Datum::Text(Varlena::encode(&[b't', 0xFF, b'x']).unwrap())];
        let err = text_str_arg("f", &bad, 0).unwrap_err();
        assert!(
            matches!(err, PgFnError::InvalidTextEncoding { .. }),
            "{err:?}"
        );
        assert_eq!(err.sql_state().code(), "22021");
        assert!(err.to_string().ends_with("0xff"), "{err}");

        // Truncated multi-byte sequence at the end of the payload.
        let cut = [Datum::Text(Varlena::encode(&[b'a', 0xC3]).unwrap())];
        let err = text_str_arg("f", &cut, 0).unwrap_err();
        assert!(err.to_string().ends_with("0xc3"), "{err}");

        assert!(matches!(
            text_str_arg("f", &[Datum::Null], 0),
            Err(PgFnError::NullArgument { .. })
        ));
    }

    #[test]
    fn test_arg_helpers_missing_argument() {
        let err = int4_arg("f", &[Datum::Int4(1)], 1).unwrap_err();
        assert!(matches!(
            err,
            PgFnError::WrongArgumentCount {
                expected: 2,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_check_arg_types() {
        assert!(check_arg_types(&AddOne, &[Datum::Int4(1)]).is_ok());
        // NULL matches any declared type.
        assert!(check_arg_types(&AddOne, &[Datum::Null]).is_ok());
        assert!(matches!(
            check_arg_types(&AddOne, &[Datum::Int8(1)]),
            Err(PgFnError::TypeMismatch { .. })
        ));
        assert!(matches!(
            check_arg_types(&AddOne, &[]),
            Err(PgFnError::WrongArgumentCount { .. })
        ));
    }

    #[test]
    fn test_scalar_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AddOne>();

        let f: Arc<dyn ScalarFunction> = Arc::new(AddOne);
        let f2 = Arc::clone(&f);
        let handle = std::thread::spawn(move || f2.invoke(&[Datum::Int4(0)]));
        let _ = f.invoke(&[Datum::Int4(1)]);
        assert_eq!(handle.join().unwrap().unwrap(), Datum::Int4(1));
    }
}
