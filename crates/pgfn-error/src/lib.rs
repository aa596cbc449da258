use thiserror::Error;

/// Primary error type for pgfn functions.
///
/// Every variant is fatal for the call that produced it: the operation is
/// aborted and no partial result is returned. Absence of a result is not an
/// error and is expressed as a NULL datum instead.
#[derive(Error, Debug)]
pub enum PgFnError {
    // === Argument Errors ===
    /// A NULL was passed to a function that does not accept one.
    #[error("null value not allowed for argument {position} of {function}")]
    NullArgument { function: String, position: usize },

    /// Wrong number of arguments for the resolved function.
    #[error("function {function} expects {expected} argument(s), got {actual}")]
    WrongArgumentCount {
        function: String,
        expected: usize,
        actual: usize,
    },

    /// Argument or value of the wrong type.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Value out of range.
    #[error("{what} out of range: {value}")]
    OutOfRange { what: String, value: String },

    /// Integer overflow during computation.
    #[error("integer out of range")]
    IntegerOverflow,

    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,

    // === Value Errors ===
    /// Variable-length value exceeds the size limit.
    #[error("requested length {requested} exceeds the varlena limit of {max} bytes")]
    TooBig { requested: usize, max: usize },

    /// Variable-length buffer with an inconsistent header.
    #[error("malformed varlena: {detail}")]
    MalformedVarlena { detail: String },

    /// Array dimensions that do not describe the element payload.
    #[error("malformed array: {detail}")]
    MalformedArray { detail: String },

    /// Text payload that is not valid in the server encoding.
    #[error("invalid byte sequence for encoding \"UTF8\": {detail}")]
    InvalidTextEncoding { detail: String },

    // === Catalog Errors ===
    /// No function registered under this name and arity.
    #[error("function {name} with {num_args} argument(s) does not exist")]
    NoSuchFunction { name: String, num_args: usize },

    /// No collation registered under this name.
    #[error("collation \"{name}\" does not exist")]
    NoSuchCollation { name: String },

    // === Query Bridge Errors ===
    /// The embedded query session could not be opened or closed.
    #[error("query session failure: {detail}")]
    SessionFailure { detail: String },

    /// The query was rejected or failed while executing.
    #[error("query failed: {query}: {source}")]
    QueryFailure {
        query: String,
        #[source]
        source: Box<PgFnError>,
    },

    /// The query completed but did not return the expected number of rows.
    #[error("unexpected result shape: expected {expected} row(s), got {actual}")]
    UnexpectedResultShape { expected: u64, actual: u64 },

    /// Table referenced by a query does not exist (raised by backends).
    #[error("relation \"{name}\" does not exist")]
    NoSuchTable { name: String },

    /// Permission denied on a relation (raised by backends).
    #[error("permission denied for table {name}")]
    PermissionDenied { name: String },

    /// Malformed query text (raised by backends).
    #[error("syntax error at or near \"{token}\"")]
    SyntaxError { token: String },

    // === Configuration Errors ===
    /// Extension configuration could not be loaded or is inconsistent.
    #[error("invalid configuration: {detail}")]
    InvalidConfig { detail: String },

    // === Internal Errors ===
    /// Internal logic error (should never happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Host SQLSTATE error classes.
///
/// The string form is the five-character code the host reports to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlState {
    /// `22004` null_value_not_allowed.
    NullValueNotAllowed,
    /// `22003` numeric_value_out_of_range.
    NumericValueOutOfRange,
    /// `22012` division_by_zero.
    DivisionByZero,
    /// `22023` invalid_parameter_value.
    InvalidParameterValue,
    /// `22021` character_not_in_repertoire.
    CharacterNotInRepertoire,
    /// `42804` datatype_mismatch.
    DatatypeMismatch,
    /// `42883` undefined_function.
    UndefinedFunction,
    /// `42704` undefined_object.
    UndefinedObject,
    /// `42P01` undefined_table.
    UndefinedTable,
    /// `42501` insufficient_privilege.
    InsufficientPrivilege,
    /// `42601` syntax_error.
    SyntaxError,
    /// `54000` program_limit_exceeded.
    ProgramLimitExceeded,
    /// `08000` connection_exception.
    ConnectionException,
    /// `21000` cardinality_violation.
    CardinalityViolation,
    /// `XX001` data_corrupted.
    DataCorrupted,
    /// `XX000` internal_error.
    InternalError,
}

impl SqlState {
    /// The five-character SQLSTATE code.
    pub const fn code(self) -> &'static str {
        match self {
            Self::NullValueNotAllowed => "22004",
            Self::NumericValueOutOfRange => "22003",
            Self::DivisionByZero => "22012",
            Self::InvalidParameterValue => "22023",
            Self::CharacterNotInRepertoire => "22021",
            Self::DatatypeMismatch => "42804",
            Self::UndefinedFunction => "42883",
            Self::UndefinedObject => "42704",
            Self::UndefinedTable => "42P01",
            Self::InsufficientPrivilege => "42501",
            Self::SyntaxError => "42601",
            Self::ProgramLimitExceeded => "54000",
            Self::ConnectionException => "08000",
            Self::CardinalityViolation => "21000",
            Self::DataCorrupted => "XX001",
            Self::InternalError => "XX000",
        }
    }
}

impl PgFnError {
    /// Map this error to the SQLSTATE the host reports.
    ///
    /// A query failure reports the code of the backend error it wraps.
    #[allow(clippy::match_same_arms)]
    pub fn sql_state(&self) -> SqlState {
        match self {
            Self::NullArgument { .. } => SqlState::NullValueNotAllowed,
            Self::WrongArgumentCount { .. } | Self::NoSuchFunction { .. } => {
                SqlState::UndefinedFunction
            }
            Self::TypeMismatch { .. } => SqlState::DatatypeMismatch,
            Self::InvalidTextEncoding { .. } => SqlState::CharacterNotInRepertoire,
            Self::OutOfRange { .. } | Self::IntegerOverflow => SqlState::NumericValueOutOfRange,
            Self::DivisionByZero => SqlState::DivisionByZero,
            Self::TooBig { .. } => SqlState::ProgramLimitExceeded,
            Self::MalformedVarlena { .. } => SqlState::DataCorrupted,
            Self::MalformedArray { .. } | Self::InvalidConfig { .. } => {
                SqlState::InvalidParameterValue
            }
            Self::NoSuchCollation { .. } => SqlState::UndefinedObject,
            Self::SessionFailure { .. } => SqlState::ConnectionException,
            Self::QueryFailure { source, .. } => source.sql_state(),
            Self::Internal(_) => SqlState::InternalError,
            Self::UnexpectedResultShape { .. } => SqlState::CardinalityViolation,
            Self::NoSuchTable { .. } => SqlState::UndefinedTable,
            Self::PermissionDenied { .. } => SqlState::InsufficientPrivilege,
            Self::SyntaxError { .. } => SqlState::SyntaxError,
        }
    }

    /// Whether the caller can likely fix this by changing the arguments.
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NullArgument { .. }
                | Self::WrongArgumentCount { .. }
                | Self::TypeMismatch { .. }
                | Self::InvalidTextEncoding { .. }
                | Self::OutOfRange { .. }
                | Self::DivisionByZero
                | Self::NoSuchFunction { .. }
                | Self::NoSuchCollation { .. }
                | Self::NoSuchTable { .. }
                | Self::SyntaxError { .. }
        )
    }

    /// Whether this error came out of the embedded query bridge.
    pub const fn is_bridge_failure(&self) -> bool {
        matches!(
            self,
            Self::SessionFailure { .. }
                | Self::QueryFailure { .. }
                | Self::UnexpectedResultShape { .. }
        )
    }

    /// Human-friendly hint for fixing this error.
    pub const fn hint(&self) -> Option<&'static str> {
        match self {
            Self::NullArgument { .. } => Some("Pass a non-NULL value or wrap the call in COALESCE"),
            Self::DivisionByZero => Some("Check the divisor before calling"),
            Self::TooBig { .. } => Some("Reduce the size of the value being built"),
            Self::QueryFailure { .. } => {
                Some("Check that the table exists and that you may read it")
            }
            Self::SessionFailure { .. } => Some("The host refused a query session; retry later"),
            _ => None,
        }
    }

    /// Create a null-argument error.
    pub fn null_argument(function: impl Into<String>, position: usize) -> Self {
        Self::NullArgument {
            function: function.into(),
            position,
        }
    }

    /// Create a type mismatch error.
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an out-of-range error.
    pub fn out_of_range(what: impl Into<String>, value: impl ToString) -> Self {
        Self::OutOfRange {
            what: what.into(),
            value: value.to_string(),
        }
    }

    /// Create a session failure.
    pub fn session(detail: impl Into<String>) -> Self {
        Self::SessionFailure {
            detail: detail.into(),
        }
    }

    /// Wrap a backend error raised while running `query`.
    pub fn query(query: impl Into<String>, source: Self) -> Self {
        Self::QueryFailure {
            query: query.into(),
            source: Box::new(source),
        }
    }

    /// Create an invalid-encoding error.
    pub fn invalid_encoding(detail: impl Into<String>) -> Self {
        Self::InvalidTextEncoding {
            detail: detail.into(),
        }
    }

    /// Create a configuration error.
    pub fn invalid_config(detail: impl Into<String>) -> Self {
        Self::InvalidConfig {
            detail: detail.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias using `PgFnError`.
pub type Result<T> = std::result::Result<T, PgFnError>;
