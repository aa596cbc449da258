//! Byte-wise text transforms over varlena payloads.
//!
//! Every transform works on raw payload bytes, not decoded characters:
//! `reverse` of a multi-byte UTF-8 sequence reverses its bytes, and only
//! ASCII letters are case-mapped. Results are always fresh values.

use pgfn_error::{PgFnError, Result};
use pgfn_types::{Datum, DatumType, Varlena};

use crate::collation::{BinaryCollation, CollationFunction};
use crate::scalar::{check_arity, text_arg};
use crate::{FunctionRegistry, ScalarFunction};

// ── Pure transforms ───────────────────────────────────────────────────────

/// Payload bytes in reverse order.
pub fn reverse_bytes(s: &[u8]) -> Vec<u8> {
    s.iter().rev().copied().collect()
}

/// Upper-case the first ASCII letter of the string and the first ASCII
/// letter after every space (0x20).
///
/// Non-letters between a space and the next letter do not end the word
/// boundary: `"x 1y"` becomes `"X 1Y"`. Tabs and newlines are not word
/// separators here.
pub fn capitalize_bytes(s: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    let mut at_word_start = true;
    for &b in s {
        if at_word_start && b.is_ascii_alphabetic() {
            out.push(b.to_ascii_uppercase());
            at_word_start = false;
        } else {
            if b == b' ' {
                at_word_start = true;
            }
            out.push(b);
        }
    }
    out
}

/// The C locale's `isspace` set, which includes vertical tab.
const fn is_c_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0B | 0x0C)
}

/// Number of maximal runs of non-whitespace bytes.
pub fn count_words_bytes(s: &[u8]) -> usize {
    s.split(|&b| is_c_space(b))
        .filter(|w| !w.is_empty())
        .count()
}

// ── reverse ───────────────────────────────────────────────────────────────

pub struct ReverseFunc;

impl ScalarFunction for ReverseFunc {
    fn invoke(&self, args: &[Datum]) -> Result<Datum> {
        check_arity(self.name(), args, 1)?;
        let s = text_arg(self.name(), args, 0)?;
        let out = reverse_bytes(s.payload());
        Ok(Datum::Text(Varlena::encode(&out)?))
    }

    fn arg_types(&self) -> &[DatumType] {
        &[DatumType::Text]
    }

    fn return_type(&self) -> DatumType {
        DatumType::Text
    }

    fn name(&self) -> &str {
        "reverse"
    }
}

// ── capitalize ────────────────────────────────────────────────────────────

pub struct CapitalizeFunc;

impl ScalarFunction for CapitalizeFunc {
    fn invoke(&self, args: &[Datum]) -> Result<Datum> {
        check_arity(self.name(), args, 1)?;
        let s = text_arg(self.name(), args, 0)?;
        let out = capitalize_bytes(s.payload());
        Ok(Datum::Text(Varlena::encode(&out)?))
    }

    fn arg_types(&self) -> &[DatumType] {
        &[DatumType::Text]
    }

    fn return_type(&self) -> DatumType {
        DatumType::Text
    }

    fn name(&self) -> &str {
        "capitalize"
    }
}

// ── count_words ───────────────────────────────────────────────────────────

pub struct CountWordsFunc;

impl ScalarFunction for CountWordsFunc {
    fn invoke(&self, args: &[Datum]) -> Result<Datum> {
        check_arity(self.name(), args, 1)?;
        let s = text_arg(self.name(), args, 0)?;
        let n = i32::try_from(count_words_bytes(s.payload()))
            .map_err(|_| PgFnError::IntegerOverflow)?;
        Ok(Datum::Int4(n))
    }

    fn arg_types(&self) -> &[DatumType] {
        &[DatumType::Text]
    }

    fn return_type(&self) -> DatumType {
        DatumType::Int4
    }

    fn name(&self) -> &str {
        "count_words"
    }
}

// ── copy ──────────────────────────────────────────────────────────────────

pub struct CopyFunc;

impl ScalarFunction for CopyFunc {
    fn invoke(&self, args: &[Datum]) -> Result<Datum> {
        check_arity(self.name(), args, 1)?;
        let s = text_arg(self.name(), args, 0)?;
        Ok(Datum::Text(Varlena::encode(s.payload())?))
    }

    fn arg_types(&self) -> &[DatumType] {
        &[DatumType::Text]
    }

    fn return_type(&self) -> DatumType {
        DatumType::Text
    }

    fn name(&self) -> &str {
        "copy"
    }
}

// ── concatenate ───────────────────────────────────────────────────────────

pub struct ConcatenateFunc;

impl ScalarFunction for ConcatenateFunc {
    fn invoke(&self, args: &[Datum]) -> Result<Datum> {
        check_arity(self.name(), args, 2)?;
        let a = text_arg(self.name(), args, 0)?;
        let b = text_arg(self.name(), args, 1)?;
        Ok(Datum::Text(Varlena::concat(a, b)?))
    }

    fn arg_types(&self) -> &[DatumType] {
        &[DatumType::Text, DatumType::Text]
    }

    fn return_type(&self) -> DatumType {
        DatumType::Text
    }

    fn name(&self) -> &str {
        "concatenate"
    }
}

// ── starts_with ───────────────────────────────────────────────────────────

pub struct StartsWithFunc;

impl ScalarFunction for StartsWithFunc {
    fn invoke(&self, args: &[Datum]) -> Result<Datum> {
        self.invoke_with_collation(args, &BinaryCollation)
    }

    fn invoke_with_collation(
        &self,
        args: &[Datum],
        collation: &dyn CollationFunction,
    ) -> Result<Datum> {
        check_arity(self.name(), args, 2)?;
        let s = text_arg(self.name(), args, 0)?;
        let prefix = text_arg(self.name(), args, 1)?;
        let matched = collation.has_prefix(s.payload(), prefix.payload());
        Ok(Datum::Bool(matched))
    }

    fn uses_collation(&self) -> bool {
        true
    }

    fn arg_types(&self) -> &[DatumType] {
        &[DatumType::Text, DatumType::Text]
    }

    fn return_type(&self) -> DatumType {
        DatumType::Bool
    }

    fn name(&self) -> &str {
        "starts_with"
    }
}

/// Register the text transforms.
pub fn register_text_builtins(registry: &mut FunctionRegistry) {
    registry.register_scalar(ReverseFunc);
    registry.register_scalar(CapitalizeFunc);
    registry.register_scalar(CountWordsFunc);
    registry.register_scalar(CopyFunc);
    registry.register_scalar(ConcatenateFunc);
    registry.register_scalar(StartsWithFunc);
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::collation::NoCaseCollation;

    fn text(s: &str) -> Datum {
        Datum::Text(Varlena::from_text(s).unwrap())
    }

    fn payload(d: &Datum) -> &[u8] {
        d.as_text().expect("text result").payload()
    }

    #[test]
    fn test_reverse() {
        let r = ReverseFunc.invoke(&[text("abc")]).unwrap();
        assert_eq!(payload(&r), b"cba");
        let r = ReverseFunc.invoke(&[text("")]).unwrap();
        assert_eq!(payload(&r), b"");
    }

    #[test]
    fn test_reverse_is_bytewise() {
        // "é" is C3 A9; reversed bytes are not valid UTF-8.
        let r = ReverseFunc.invoke(&[text("é")]).unwrap();
        assert_eq!(payload(&r), &[0xA9, 0xC3]);
        assert!(r.as_text().unwrap().as_str().is_none());
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize_bytes(b"hello world"), b"Hello World");
        assert_eq!(capitalize_bytes(b""), b"");
        assert_eq!(capitalize_bytes(b"a b"), b"A B");
        assert_eq!(capitalize_bytes(b"already Up"), b"Already Up");
        assert_eq!(capitalize_bytes(b"x 1y"), b"X 1Y");
        // Only 0x20 starts a word.
        assert_eq!(capitalize_bytes(b"a\tb"), b"A\tb");
        assert_eq!(capitalize_bytes(b"  lead"), b"  Lead");
        let r = CapitalizeFunc.invoke(&[text("hello world")]).unwrap();
        assert_eq!(payload(&r), b"Hello World");
    }

    #[test]
    fn test_count_words() {
        assert_eq!(count_words_bytes(b""), 0);
        assert_eq!(count_words_bytes(b"  "), 0);
        assert_eq!(count_words_bytes(b"a b  c"), 3);
        assert_eq!(count_words_bytes(b" lead  trail "), 2);
        assert_eq!(count_words_bytes(b"tab\tsep\x0bvt\x0cff"), 4);
        assert_eq!(
            CountWordsFunc.invoke(&[text("one two")]).unwrap(),
            Datum::Int4(2)
        );
    }

    #[test]
    fn test_copy_is_fresh_and_equal() {
        let src = Varlena::from_text("payload").unwrap().to_short_form();
        let r = CopyFunc.invoke(&[Datum::Text(src.clone())]).unwrap();
        assert_eq!(r.as_text().unwrap(), &src);
        assert_eq!(payload(&r), b"payload");
    }

    #[test]
    fn test_concatenate() {
        let r = ConcatenateFunc.invoke(&[text("foo"), text("bar")]).unwrap();
        assert_eq!(payload(&r), b"foobar");
        let r = ConcatenateFunc.invoke(&[text(""), text("x")]).unwrap();
        assert_eq!(payload(&r), b"x");
    }

    fn starts_with(s: &str, prefix: &str) -> Datum {
        StartsWithFunc.invoke(&[text(s), text(prefix)]).unwrap()
    }

    #[test]
    fn test_starts_with() {
        assert_eq!(starts_with("hello world", "hello"), Datum::Bool(true));
        assert_eq!(starts_with("hello", "hello world"), Datum::Bool(false));
        assert_eq!(starts_with("abc", ""), Datum::Bool(true));
    }

    #[test]
    fn test_starts_with_collation() {
        let args = [text("Hello world"), text("hello")];
        assert_eq!(StartsWithFunc.invoke(&args).unwrap(), Datum::Bool(false));
        assert_eq!(
            StartsWithFunc
                .invoke_with_collation(&args, &NoCaseCollation)
                .unwrap(),
            Datum::Bool(true)
        );
    }

    #[test]
    fn test_null_and_wrong_type_rejected() {
        let err = ReverseFunc.invoke(&[Datum::Null]).unwrap_err();
        assert!(matches!(err, PgFnError::NullArgument { position: 1, .. }));
        let args = [text("a"), Datum::Null];
        let err = ConcatenateFunc.invoke(&args).unwrap_err();
        assert!(matches!(err, PgFnError::NullArgument { position: 2, .. }));
        let err = CapitalizeFunc.invoke(&[Datum::Int4(1)]).unwrap_err();
        assert!(matches!(err, PgFnError::TypeMismatch { .. }));
        let err = CopyFunc.invoke(&[]).unwrap_err();
        assert!(matches!(err, PgFnError::WrongArgumentCount { .. }));
    }

    #[test]
    fn test_register_text_builtins() {
        let mut registry = FunctionRegistry::new();
        register_text_builtins(&mut registry);
        for (name, arity) in [
            ("reverse", 1),
            ("capitalize", 1),
            ("count_words", 1),
            ("copy", 1),
            ("concatenate", 2),
            ("starts_with", 2),
        ] {
            assert!(
                registry.find_scalar(name, arity).is_some(),
                "{name}/{arity}"
            );
        }
    }

    proptest! {
        #[test]
        fn reverse_is_an_involution(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
            prop_assert_eq!(reverse_bytes(&reverse_bytes(&bytes)), bytes);
        }

        #[test]
        fn capitalize_preserves_length_and_is_idempotent(s in "[ a-zA-Z0-9\t]{0,64}") {
            let once = capitalize_bytes(s.as_bytes());
            prop_assert_eq!(once.len(), s.len());
            prop_assert_eq!(capitalize_bytes(&once), once);
        }

        #[test]
        fn count_words_matches_str_split(s in "[ a-z\t\n]{0,64}") {
            let expected = s.split_whitespace().count();
            prop_assert_eq!(count_words_bytes(s.as_bytes()), expected);
        }
    }
}
