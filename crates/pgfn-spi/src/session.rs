//! Query sessions against the embedding host.
//!
//! A [`QueryBackend`] is the host's embedded query interface: connect,
//! execute, finish. [`Session`] wraps one connected session and guarantees
//! it is finished exactly once, either through [`Session::close`] or on drop.

use pgfn_error::{PgFnError, Result};
use pgfn_types::Datum;
use tracing::{debug, warn};

/// Opaque handle for one connected session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// Rows produced by one executed statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Vec<Datum>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Datum>>) -> Self {
        Self { columns, rows }
    }

    /// A one-row, one-column result.
    pub fn single(column: impl Into<String>, value: Datum) -> Self {
        Self::new(vec![column.into()], vec![vec![value]])
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Datum>] {
        &self.rows
    }

    /// Number of rows the statement processed.
    pub fn processed(&self) -> u64 {
        self.rows.len() as u64
    }

    /// Raw value at `(row, col)`, `None` when out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<&Datum> {
        self.rows.get(row)?.get(col)
    }

    /// Text output form of `(row, col)`.
    ///
    /// `None` for SQL NULL as well as for out-of-bounds positions.
    pub fn get_text(&self, row: usize, col: usize) -> Option<String> {
        self.get(row, col)?.to_text_output()
    }

    /// Keep at most `max_rows` rows; `0` means no limit.
    #[must_use]
    pub fn limited(mut self, max_rows: u64) -> Self {
        if max_rows > 0 {
            let keep = usize::try_from(max_rows).unwrap_or(usize::MAX);
            self.rows.truncate(keep);
        }
        self
    }
}

/// The host's embedded query interface.
///
/// At most one session is connected at a time on a given backend; callers
/// must finish a session before connecting another.
pub trait QueryBackend: Send + Sync {
    /// Open a session.
    fn connect(&self) -> Result<SessionId>;

    /// Execute `sql` inside `session`.
    ///
    /// `read_only` asks the host to reject writes; `max_rows` caps the
    /// number of returned rows (`0` = unlimited).
    fn execute(
        &self,
        session: SessionId,
        sql: &str,
        read_only: bool,
        max_rows: u64,
    ) -> Result<ResultSet>;

    /// Tear down `session`. The session is gone even when this fails.
    fn finish(&self, session: SessionId) -> Result<()>;
}

fn as_session_failure(err: PgFnError) -> PgFnError {
    match err {
        PgFnError::SessionFailure { .. } => err,
        other => PgFnError::session(other.to_string()),
    }
}

/// A connected session, finished exactly once.
///
/// Dropping an unclosed session finishes it and logs (but cannot report) a
/// failure; call [`Session::close`] to observe the result.
pub struct Session<'a> {
    backend: &'a dyn QueryBackend,
    id: SessionId,
    closed: bool,
}

impl<'a> Session<'a> {
    /// Connect a new session. Any backend error becomes
    /// [`PgFnError::SessionFailure`].
    pub fn open(backend: &'a dyn QueryBackend) -> Result<Self> {
        let id = backend.connect().map_err(as_session_failure)?;
        debug!(session = %id, "session opened");
        Ok(Self {
            backend,
            id,
            closed: false,
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Execute a statement within this session.
    pub fn execute(&self, sql: &str, read_only: bool, max_rows: u64) -> Result<ResultSet> {
        debug!(session = %self.id, sql, read_only, max_rows, "executing query");
        let result = self.backend.execute(self.id, sql, read_only, max_rows)?;
        debug!(session = %self.id, processed = result.processed(), "query done");
        Ok(result)
    }

    /// Finish the session, reporting teardown failure as
    /// [`PgFnError::SessionFailure`].
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        debug!(session = %self.id, "closing session");
        self.backend.finish(self.id).map_err(as_session_failure)
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            // Best-effort finish; nothing to propagate to from drop.
            if let Err(err) = self.backend.finish(self.id) {
                warn!(session = %self.id, error = %err, "session finish failed during drop");
            }
        }
    }
}
