//! Public API facade for pgfn.
//!
//! An [`Extension`] is built once from an [`ExtensionConfig`] and a
//! [`QueryBackend`]. It owns the function registry and dispatches calls by
//! name with arity, type and NULL checks:
//!
//! ```ignore
//! use std::sync::Arc;
//! use pgfn::{Datum, Extension, ExtensionConfig, MemoryBackend, Varlena};
//!
//! let backend = Arc::new(MemoryBackend::new().with_table("users", 3));
//! let ext = Extension::new(ExtensionConfig::default(), backend)?;
//! let out = ext.call("row_count", &[Datum::Text(Varlena::from_text("users")?)])?;
//! assert_eq!(out, Datum::Int8(3));
//! ```

use std::sync::Arc;

use tracing::{debug, info};

pub mod config;

pub use config::ExtensionConfig;
pub use pgfn_error::{PgFnError, Result, SqlState};
pub use pgfn_func::{
    CollationFunction, DEFAULT_COLLATION, FunctionRegistry, NullPolicy, ScalarFunction,
};
pub use pgfn_spi::{
    MemoryBackend, QueryBackend, ResultSet, RowCountFunc, RowCountOptions, Session, SessionId,
    SessionStats, quote_identifier, row_count,
};
pub use pgfn_types::{Datum, DatumType, Float8Array, Point, TimestampTz, Varlena};

#[must_use]
pub const fn extension_name() -> &'static str {
    "pgfn"
}

/// A configured function library.
pub struct Extension {
    config: ExtensionConfig,
    registry: FunctionRegistry,
    backend: Arc<dyn QueryBackend>,
}

impl Extension {
    /// Validate `config` and register every function it enables.
    ///
    /// Fails with [`PgFnError::InvalidConfig`] for an invalid configuration
    /// and [`PgFnError::NoSuchCollation`] when the default collation is not
    /// registered.
    pub fn new(config: ExtensionConfig, backend: Arc<dyn QueryBackend>) -> Result<Self> {
        config.validate()?;

        let mut registry = FunctionRegistry::new();
        pgfn_func::register_builtins(&mut registry);
        if config.register_glue {
            pgfn_func::register_glue_builtins(&mut registry);
        }
        registry.register_scalar(RowCountFunc::new(
            Arc::clone(&backend),
            config.row_count_options(),
        ));

        if registry.find_collation(&config.default_collation).is_none() {
            return Err(PgFnError::NoSuchCollation {
                name: config.default_collation,
            });
        }

        info!(
            extension = extension_name(),
            functions = registry.len(),
            glue = config.register_glue,
            default_collation = %config.default_collation,
            "registered functions"
        );
        Ok(Self {
            config,
            registry,
            backend,
        })
    }

    /// Call `name(args...)` under the configured default collation.
    pub fn call(&self, name: &str, args: &[Datum]) -> Result<Datum> {
        self.call_collated(name, args, &self.config.default_collation)
    }

    /// Call `name(args...)` under an explicit collation.
    pub fn call_collated(&self, name: &str, args: &[Datum], collation: &str) -> Result<Datum> {
        debug!(function = name, nargs = args.len(), collation, "call");
        self.registry.call(name, args, collation)
    }

    /// Add or replace a user function after start-up.
    pub fn register_scalar<F>(&mut self, function: F) -> Option<Arc<dyn ScalarFunction>>
    where
        F: ScalarFunction + 'static,
    {
        info!(
            function = function.name(),
            nargs = function.num_args(),
            "registering user function"
        );
        self.registry.register_scalar(function)
    }

    /// Add or replace a collation after start-up.
    pub fn register_collation<C>(&mut self, collation: C) -> Option<Arc<dyn CollationFunction>>
    where
        C: CollationFunction + 'static,
    {
        self.registry.register_collation(collation)
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ExtensionConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<dyn QueryBackend> {
        &self.backend
    }
}
