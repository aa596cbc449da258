//! Scalar function surface for pgfn.
//!
//! This crate defines the user-implementable [`ScalarFunction`] and
//! [`CollationFunction`] traits, the built-in text, array and glue
//! functions, and a [`FunctionRegistry`] that resolves functions by
//! `(name, num_args)` and dispatches calls with signature and NULL checks.
#![allow(clippy::unnecessary_literal_bound)]

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use pgfn_error::{PgFnError, Result};
use pgfn_types::Datum;
use tracing::debug;

pub mod array;
pub mod builtins;
pub mod collation;
pub mod glue;
pub mod scalar;
pub mod text;

pub use array::register_array_builtins;
pub use builtins::{register_builtin_collations, register_builtins};
pub use collation::{BinaryCollation, CollationFunction, DEFAULT_COLLATION, NoCaseCollation};
pub use glue::register_glue_builtins;
pub use scalar::{NullPolicy, ScalarFunction};
pub use text::register_text_builtins;

/// Composite lookup key for functions: `(lowercase name, num_args)`.
///
/// Names are folded to lowercase ASCII, as the host folds unquoted
/// identifiers.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct FunctionKey {
    /// Function name, stored as lowercase ASCII.
    pub name: String,
    /// Argument count.
    pub num_args: usize,
}

impl FunctionKey {
    /// Create a new function key with the name canonicalized to lowercase.
    #[must_use]
    pub fn new(name: &str, num_args: usize) -> Self {
        Self {
            name: canonical_name(name),
            num_args,
        }
    }
}

/// Registry for scalar functions and collations.
///
/// Functions are keyed by `(name, num_args)`; two functions may share a
/// name with different arities. Collations are keyed by their exact name.
#[derive(Default)]
pub struct FunctionRegistry {
    scalars: HashMap<FunctionKey, Arc<dyn ScalarFunction>>,
    collations: HashMap<String, Arc<dyn CollationFunction>>,
}

impl FunctionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scalar function, keyed by `(name, num_args)`.
    ///
    /// Overwrites any existing function with the same key. Returns the
    /// previous function if one existed.
    pub fn register_scalar<F>(&mut self, function: F) -> Option<Arc<dyn ScalarFunction>>
    where
        F: ScalarFunction + 'static,
    {
        let key = FunctionKey::new(function.name(), function.num_args());
        self.scalars.insert(key, Arc::new(function))
    }

    /// Register a collation under its own name.
    ///
    /// Returns the previous collation with that name, if any.
    pub fn register_collation<C>(&mut self, collation: C) -> Option<Arc<dyn CollationFunction>>
    where
        C: CollationFunction + 'static,
    {
        self.collations
            .insert(collation.name().to_owned(), Arc::new(collation))
    }

    /// Look up a scalar function by `(name, num_args)`.
    #[must_use]
    pub fn find_scalar(&self, name: &str, num_args: usize) -> Option<Arc<dyn ScalarFunction>> {
        let key = FunctionKey::new(name, num_args);
        let result = self.scalars.get(&key).map(Arc::clone);
        debug!(
            name = %key.name,
            arity = num_args,
            kind = "scalar",
            hit = result.is_some(),
            "registry lookup"
        );
        result
    }

    /// Look up a collation by exact name.
    #[must_use]
    pub fn find_collation(&self, name: &str) -> Option<Arc<dyn CollationFunction>> {
        let result = self.collations.get(name).map(Arc::clone);
        debug!(
            name,
            kind = "collation",
            hit = result.is_some(),
            "registry lookup"
        );
        result
    }

    /// Whether the registry contains any scalar function with this name
    /// (any arg count).
    #[must_use]
    pub fn contains_scalar(&self, name: &str) -> bool {
        let canon = canonical_name(name);
        self.scalars.keys().any(|k| k.name == canon)
    }

    /// Distinct registered function names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.scalars
            .keys()
            .map(|k| k.name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Number of registered `(name, num_args)` entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scalars.len()
    }

    /// Whether no scalar function is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scalars.is_empty()
    }

    /// Resolve and invoke `name(args...)`.
    ///
    /// Order of checks:
    /// 1. `(name, args.len())` must resolve, else [`PgFnError::NoSuchFunction`].
    /// 2. Non-NULL arguments must match the declared types.
    /// 3. Any NULL argument is handled per the function's [`NullPolicy`].
    /// 4. Collation-sensitive functions get `collation`, which must exist.
    /// 5. A non-NULL result must have the declared return type.
    pub fn call(&self, name: &str, args: &[Datum], collation: &str) -> Result<Datum> {
        let Some(function) = self.find_scalar(name, args.len()) else {
            return Err(PgFnError::NoSuchFunction {
                name: canonical_name(name),
                num_args: args.len(),
            });
        };
        scalar::check_arg_types(function.as_ref(), args)?;

        if let Some(position) = args.iter().position(Datum::is_null) {
            return match function.null_policy() {
                NullPolicy::Propagate => Ok(Datum::Null),
                NullPolicy::Reject => Err(PgFnError::null_argument(function.name(), position + 1)),
            };
        }

        let result = if function.uses_collation() {
            let Some(coll) = self.find_collation(collation) else {
                return Err(PgFnError::NoSuchCollation {
                    name: collation.to_owned(),
                });
            };
            function.invoke_with_collation(args, coll.as_ref())?
        } else {
            function.invoke(args)?
        };

        let declared = function.return_type();
        match result.datum_type() {
            Some(actual) if actual != declared => {
                let name = function.name();
                let detail = format!("{name} returned {actual}, declared {declared}");
                Err(PgFnError::internal(detail))
            }
            _ => Ok(result),
        }
    }
}

fn canonical_name(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}
