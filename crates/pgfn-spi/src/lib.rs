//! Embedded query bridge.
//!
//! Functions that need to run SQL against the host (today only
//! [`row_count`]) go through a [`QueryBackend`] and a scoped [`Session`].
//! [`MemoryBackend`] is a self-contained backend for embedding and tests.

pub mod memory;
pub mod quote;
pub mod row_count;
pub mod session;

pub use memory::{MemoryBackend, SessionStats};
pub use quote::quote_identifier;
pub use row_count::{RowCountFunc, RowCountOptions, count_query, row_count};
pub use session::{QueryBackend, ResultSet, Session, SessionId};
