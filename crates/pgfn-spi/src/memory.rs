//! In-memory [`QueryBackend`].
//!
//! Holds a set of named tables with row counts and answers exactly one
//! statement shape, `SELECT COUNT(*) FROM <identifier>`. It enforces the
//! one-session-at-a-time rule, counts every connect/execute/finish, and
//! can be told to fail the next connect or finish, or to return a fixed
//! result set.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;
use pgfn_error::{PgFnError, Result};
use pgfn_types::Datum;
use tracing::debug;

use crate::quote::is_reserved_keyword;
use crate::session::{QueryBackend, ResultSet, SessionId};

/// Session bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub opened: u64,
    pub closed: u64,
    pub executed: u64,
}

impl SessionStats {
    /// Every opened session has been closed.
    pub fn is_balanced(&self) -> bool {
        self.opened == self.closed
    }
}

#[derive(Debug, Default)]
struct State {
    tables: HashMap<String, i64>,
    denied: HashSet<String>,
    active: Option<SessionId>,
    next_id: u64,
    stats: SessionStats,
    fail_next_connect: bool,
    fail_next_finish: bool,
    result_override: Option<ResultSet>,
    last_query: Option<String>,
    last_options: Option<(bool, u64)>,
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`MemoryBackend::add_table`].
    #[must_use]
    pub fn with_table(self, name: impl Into<String>, rows: i64) -> Self {
        self.add_table(name, rows);
        self
    }

    /// Answer every query with `result` instead of evaluating it.
    #[must_use]
    pub fn with_result_override(self, result: ResultSet) -> Self {
        self.state.lock().result_override = Some(result);
        self
    }

    /// Create or replace a table. Names are stored verbatim.
    pub fn add_table(&self, name: impl Into<String>, rows: i64) {
        self.state.lock().tables.insert(name.into(), rows);
    }

    pub fn drop_table(&self, name: &str) -> bool {
        self.state.lock().tables.remove(name).is_some()
    }

    /// Make queries against `name` fail with a permission error.
    pub fn deny(&self, name: impl Into<String>) {
        self.state.lock().denied.insert(name.into());
    }

    /// The next `connect` fails.
    pub fn fail_next_connect(&self) {
        self.state.lock().fail_next_connect = true;
    }

    /// The next `finish` tears the session down and then reports failure.
    pub fn fail_next_finish(&self) {
        self.state.lock().fail_next_finish = true;
    }

    pub fn stats(&self) -> SessionStats {
        self.state.lock().stats
    }

    pub fn has_open_session(&self) -> bool {
        self.state.lock().active.is_some()
    }

    /// Text of the most recently executed statement.
    pub fn last_query(&self) -> Option<String> {
        self.state.lock().last_query.clone()
    }

    /// `(read_only, max_rows)` of the most recently executed statement.
    pub fn last_options(&self) -> Option<(bool, u64)> {
        self.state.lock().last_options
    }
}

impl QueryBackend for MemoryBackend {
    fn connect(&self) -> Result<SessionId> {
        let mut state = self.state.lock();
        if std::mem::take(&mut state.fail_next_connect) {
            return Err(PgFnError::session("connection refused"));
        }
        if let Some(active) = state.active {
            return Err(PgFnError::session(format!(
                "{active} is still connected; nested sessions are not supported"
            )));
        }
        state.next_id += 1;
        let id = SessionId(state.next_id);
        state.active = Some(id);
        state.stats.opened += 1;
        debug!(session = %id, "memory backend connect");
        Ok(id)
    }

    fn execute(
        &self,
        session: SessionId,
        sql: &str,
        read_only: bool,
        max_rows: u64,
    ) -> Result<ResultSet> {
        let mut state = self.state.lock();
        if state.active != Some(session) {
            return Err(PgFnError::session(format!("{session} is not connected")));
        }
        state.stats.executed += 1;
        state.last_query = Some(sql.to_owned());
        state.last_options = Some((read_only, max_rows));

        if let Some(result) = &state.result_override {
            return Ok(result.clone().limited(max_rows));
        }

        let table = parse_count_query(sql)?;
        if state.denied.contains(&table) {
            return Err(PgFnError::PermissionDenied { name: table });
        }
        let Some(&rows) = state.tables.get(&table) else {
            return Err(PgFnError::NoSuchTable { name: table });
        };
        let result = ResultSet::single("count", Datum::Int8(rows));
        Ok(result.limited(max_rows))
    }

    fn finish(&self, session: SessionId) -> Result<()> {
        let mut state = self.state.lock();
        if state.active != Some(session) {
            return Err(PgFnError::session(format!("{session} is not connected")));
        }
        state.active = None;
        state.stats.closed += 1;
        debug!(session = %session, "memory backend finish");
        if std::mem::take(&mut state.fail_next_finish) {
            return Err(PgFnError::session("disconnect failed"));
        }
        Ok(())
    }
}

// ── Statement parsing ─────────────────────────────────────────────────────

fn syntax_error(token: &str) -> PgFnError {
    PgFnError::SyntaxError {
        token: token.to_owned(),
    }
}

/// Syntax error at `token`, or at the end of the statement.
fn unexpected(token: &str) -> PgFnError {
    if token.is_empty() {
        syntax_error("end of input")
    } else {
        syntax_error(token)
    }
}

const fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Split off the next whitespace-delimited token.
fn next_token(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    s.split_at(end)
}

/// Parse `SELECT COUNT(*) FROM <ident>` and return the table name with
/// identifier rules applied: unquoted names fold to lowercase, quoted names
/// are taken verbatim with `""` unescaped.
fn parse_count_query(sql: &str) -> Result<String> {
    let mut rest = sql;
    for keyword in ["select", "count(*)", "from"] {
        let (token, tail) = next_token(rest);
        if !token.eq_ignore_ascii_case(keyword) {
            return Err(unexpected(token));
        }
        rest = tail;
    }

    let rest = rest.trim_start();
    let (name, tail) = match rest.strip_prefix('"') {
        Some(quoted) => parse_quoted(quoted)?,
        None => parse_bare(rest)?,
    };

    let tail = tail.trim();
    let tail = tail.strip_suffix(';').unwrap_or(tail).trim_end();
    if !tail.is_empty() {
        return Err(syntax_error(next_token(tail).0));
    }
    Ok(name)
}

fn parse_quoted(s: &str) -> Result<(String, &str)> {
    let mut name = String::new();
    let mut chars = s.char_indices();
    while let Some((i, c)) = chars.next() {
        if c != '"' {
            name.push(c);
            continue;
        }
        if s[i + 1..].starts_with('"') {
            name.push('"');
            chars.next();
            continue;
        }
        if name.is_empty() {
            return Err(syntax_error("\"\""));
        }
        return Ok((name, &s[i + 1..]));
    }
    Err(syntax_error("unterminated quoted identifier"))
}

fn parse_bare(s: &str) -> Result<(String, &str)> {
    let end = s.find(|c: char| !is_ident_char(c)).unwrap_or(s.len());
    let (word, tail) = s.split_at(end);
    let valid_start = word
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !valid_start {
        return Err(unexpected(next_token(s).0));
    }
    let folded = word.to_ascii_lowercase();
    if is_reserved_keyword(&folded) {
        return Err(syntax_error(word));
    }
    Ok((folded, tail))
}
