//! Default registration.
//!
//! [`register_builtins`] installs everything the library always ships: the
//! text transforms, the array reductions and the built-in collations. The
//! arithmetic glue is opt-in through [`register_glue_builtins`].
//!
//! [`register_glue_builtins`]: crate::register_glue_builtins

use crate::FunctionRegistry;
use crate::array::register_array_builtins;
use crate::collation::{BinaryCollation, NoCaseCollation};
use crate::text::register_text_builtins;

/// Install the `"C"` and `"nocase"` collations.
pub fn register_builtin_collations(registry: &mut FunctionRegistry) {
    registry.register_collation(BinaryCollation);
    registry.register_collation(NoCaseCollation);
}

/// Install the text transforms, array reductions and collations.
pub fn register_builtins(registry: &mut FunctionRegistry) {
    register_text_builtins(registry);
    register_array_builtins(registry);
    register_builtin_collations(registry);
}

#[cfg(test)]
mod tests {
    use pgfn_types::{Datum, Float8Array, Varlena};

    use super::*;

    #[test]
    fn test_builtin_catalogue() {
        let mut registry = FunctionRegistry::new();
        register_builtins(&mut registry);
        assert_eq!(
            registry.names(),
            vec![
                "array_max",
                "array_sum",
                "capitalize",
                "concatenate",
                "copy",
                "count_words",
                "reverse",
                "starts_with",
            ]
        );
        assert!(!registry.contains_scalar("add_nums"));
    }

    #[test]
    fn test_dispatch_through_registry() {
        let mut registry = FunctionRegistry::new();
        register_builtins(&mut registry);

        let hello = [Datum::Text(Varlena::from_text("hello world").unwrap())];
        let out = registry.call("CAPITALIZE", &hello, "C").unwrap();
        assert_eq!(out.to_text_output().as_deref(), Some("Hello World"));

        let empty = [Datum::Float8Array(Float8Array::empty())];
        assert!(registry.call("array_max", &empty, "C").unwrap().is_null());

        let args = [
            Datum::Text(Varlena::from_text("Hello").unwrap()),
            Datum::Text(Varlena::from_text("HE").unwrap()),
        ];
        let binary = registry.call("starts_with", &args, "C").unwrap();
        let nocase = registry.call("starts_with", &args, "nocase").unwrap();
        assert_eq!(binary, Datum::Bool(false));
        assert_eq!(nocase, Datum::Bool(true));
    }
}
