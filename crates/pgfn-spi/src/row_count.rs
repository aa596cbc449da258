//! `row_count(table)`: count the rows of a named table through a fresh
//! session.

use std::sync::Arc;

use pgfn_error::{PgFnError, Result};
use pgfn_func::ScalarFunction;
use pgfn_func::scalar::{NullPolicy, check_arity, text_str_arg};
use pgfn_types::{Datum, DatumType};
use tracing::{debug, warn};

use crate::quote::quote_identifier;
use crate::session::{QueryBackend, Session};

/// How the count query is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowCountOptions {
    /// Ask the host to run the query read-only.
    pub read_only: bool,
    /// Row limit handed to the host; `0` means unlimited.
    pub max_rows: u64,
}

impl Default for RowCountOptions {
    fn default() -> Self {
        Self {
            read_only: true,
            max_rows: 0,
        }
    }
}

/// The fixed count statement for an already-quoted table name.
pub fn count_query(quoted_table: &str) -> String {
    format!("SELECT COUNT(*) FROM {quoted_table}")
}

/// Count the rows in `table`.
///
/// - `None` returns `Ok(None)` without touching the backend.
/// - A failed connect is [`PgFnError::SessionFailure`].
/// - A failed execution is [`PgFnError::QueryFailure`], carrying the
///   backend error as its source.
/// - Anything but exactly one result row is
///   [`PgFnError::UnexpectedResultShape`].
/// - A NULL or non-numeric count yields `Ok(None)`.
///
/// The session is finished on every path once it has been opened. A finish
/// failure after a successful count is reported; after an earlier error it
/// is logged and the earlier error is returned.
pub fn row_count(
    backend: &dyn QueryBackend,
    table: Option<&str>,
    options: &RowCountOptions,
) -> Result<Option<i64>> {
    let Some(table) = table else {
        debug!("row_count on NULL table name");
        return Ok(None);
    };

    let session = Session::open(backend)?;
    let sql = count_query(&quote_identifier(table));

    let result = match session.execute(&sql, options.read_only, options.max_rows) {
        Ok(result) => result,
        Err(err) => {
            let err = PgFnError::query(sql, err);
            return Err(close_after_error(session, err));
        }
    };

    if result.processed() != 1 {
        let err = PgFnError::UnexpectedResultShape {
            expected: 1,
            actual: result.processed(),
        };
        return Err(close_after_error(session, err));
    }

    let text = result.get_text(0, 0);
    session.close()?;

    let count = text.and_then(|t| t.parse::<i64>().ok());
    debug!(table, count, "row_count done");
    Ok(count)
}

fn close_after_error(session: Session<'_>, err: PgFnError) -> PgFnError {
    if let Err(close_err) = session.close() {
        warn!(error = %close_err, primary = %err, "session close failed after error");
    }
    err
}

/// `row_count(text) -> bigint`, NULL in, NULL out.
///
/// A table name that is not valid UTF-8 is rejected before a session is
/// opened.
pub struct RowCountFunc {
    backend: Arc<dyn QueryBackend>,
    options: RowCountOptions,
}

impl RowCountFunc {
    pub fn new(backend: Arc<dyn QueryBackend>, options: RowCountOptions) -> Self {
        Self { backend, options }
    }
}

impl ScalarFunction for RowCountFunc {
    fn invoke(&self, args: &[Datum]) -> Result<Datum> {
        check_arity(self.name(), args, 1)?;
        if args[0].is_null() {
            return Ok(Datum::Null);
        }
        let table = text_str_arg(self.name(), args, 0)?;
        let count = row_count(self.backend.as_ref(), Some(table), &self.options)?;
        Ok(count.into())
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
        "row_count"
    }
}
