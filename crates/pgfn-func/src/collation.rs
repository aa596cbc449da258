//! Collations: named byte-string comparators.
//!
//! A collation decides when two text payloads compare equal. The only
//! collation-sensitive built-in is `starts_with`, which asks whether the
//! leading bytes of one value collate equal to another value.
//!
//! Implementations must be deterministic, antisymmetric and transitive.

use std::cmp::Ordering;

/// The collation used when a caller names none.
pub const DEFAULT_COLLATION: &str = "C";

/// A collation comparator over raw payload bytes.
pub trait CollationFunction: Send + Sync {
    /// Collation name (for `COLLATE "name"`).
    fn name(&self) -> &str;

    /// Compare two byte slices.
    fn compare(&self, left: &[u8], right: &[u8]) -> Ordering;

    /// Whether `s` begins with `prefix` under this collation.
    ///
    /// The default compares the first `prefix.len()` bytes of `s`, which is
    /// correct for any collation that maps each byte to one byte.
    fn has_prefix(&self, s: &[u8], prefix: &[u8]) -> bool {
        s.len() >= prefix.len() && self.compare(&s[..prefix.len()], prefix) == Ordering::Equal
    }
}

/// `"C"`: byte-exact comparison, no locale and no case folding.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCollation;

impl CollationFunction for BinaryCollation {
    fn name(&self) -> &str {
        DEFAULT_COLLATION
    }

    fn compare(&self, left: &[u8], right: &[u8]) -> Ordering {
        left.cmp(right)
    }

    fn has_prefix(&self, s: &[u8], prefix: &[u8]) -> bool {
        s.starts_with(prefix)
    }
}

/// `"nocase"`: ASCII case-insensitive comparison.
///
/// Only `A-Z` fold to `a-z`; every other byte compares as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCaseCollation;

impl CollationFunction for NoCaseCollation {
    fn name(&self) -> &str {
        "nocase"
    }

    fn compare(&self, left: &[u8], right: &[u8]) -> Ordering {
        let l = left.iter().map(u8::to_ascii_lowercase);
        let r = right.iter().map(u8::to_ascii_lowercase);
        l.cmp(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_is_byte_order() {
        let coll = BinaryCollation;
        assert_eq!(coll.compare(b"abc", b"abc"), Ordering::Equal);
        assert_eq!(coll.compare(b"abc", b"abd"), Ordering::Less);
        // Uppercase sorts before lowercase in byte order.
        assert_eq!(coll.compare(b"ABC", b"abc"), Ordering::Less);
        assert_ne!(coll.compare("über".as_bytes(), b"uber"), Ordering::Equal);
        assert_eq!(coll.name(), "C");
    }

    #[test]
    fn nocase_folds_ascii_only() {
        let coll = NoCaseCollation;
        assert_eq!(coll.compare(b"HeLLo", b"hello"), Ordering::Equal);
        assert_eq!(coll.compare(b"A", b"b"), Ordering::Less);
        assert_ne!(
            coll.compare("É".as_bytes(), "é".as_bytes()),
            Ordering::Equal
        );
    }

    #[test]
    fn prefix_under_each_collation() {
        assert!(BinaryCollation.has_prefix(b"hello world", b"hello"));
        assert!(!BinaryCollation.has_prefix(b"hello world", b"Hello"));
        assert!(!BinaryCollation.has_prefix(b"hello", b"hello world"));
        assert!(BinaryCollation.has_prefix(b"anything", b""));

        assert!(NoCaseCollation.has_prefix(b"hello world", b"HELLO"));
        assert!(!NoCaseCollation.has_prefix(b"he", b"hello"));
        assert!(NoCaseCollation.has_prefix(b"", b""));
    }

    #[test]
    fn antisymmetric() {
        let collations: [&dyn CollationFunction; 2] = [&BinaryCollation, &NoCaseCollation];
        let pairs: &[(&[u8], &[u8])] = &[
            (b"abc", b"def"),
            (b"ABC", b"abc"),
            (b"", b"a"),
            (b"hello", b"help"),
        ];
        for coll in collations {
            for &(a, b) in pairs {
                assert_eq!(
                    coll.compare(a, b),
                    coll.compare(b, a).reverse(),
                    "{} not antisymmetric for {a:?} / {b:?}",
                    coll.name()
                );
            }
        }
    }
}
