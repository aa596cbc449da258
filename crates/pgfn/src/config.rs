//! Extension configuration.

use pgfn_error::{PgFnError, Result};
use pgfn_func::DEFAULT_COLLATION;
use pgfn_spi::RowCountOptions;
use serde::{Deserialize, Serialize};

/// Settings fixed when an [`Extension`](crate::Extension) is built.
///
/// Every field has a default, so a JSON document only needs the keys it
/// changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ExtensionConfig {
    /// Collation used by collation-sensitive functions when the caller
    /// names none.
    pub default_collation: String,
    /// Run the `row_count` query read-only.
    pub row_count_read_only: bool,
    /// Row limit for the `row_count` query (`0` = unlimited).
    pub row_count_max_rows: u64,
    /// Register `add_nums`, `factorial`, `point_copy` and the rest of the
    /// glue functions.
    pub register_glue: bool,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            default_collation: DEFAULT_COLLATION.to_owned(),
            row_count_read_only: true,
            row_count_max_rows: 0,
            register_glue: true,
        }
    }
}

impl ExtensionConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(config_error)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(config_error)
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.default_collation.trim().is_empty() {
            return Err(PgFnError::invalid_config("default_collation is empty"));
        }
        Ok(())
    }

    /// Options handed to `row_count`.
    #[must_use]
    pub fn row_count_options(&self) -> RowCountOptions {
        RowCountOptions {
            read_only: self.row_count_read_only,
            max_rows: self.row_count_max_rows,
        }
    }
}

fn config_error(err: serde_json::Error) -> PgFnError {
    PgFnError::invalid_config(err.to_string())
}
