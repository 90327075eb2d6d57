//! Check configuration and crate-level errors
//!
//! [`CheckOptions`] can be built in code, deserialized from a JSON file with
//! [`CheckOptions::from_file`], and then overridden by command-line flags.
//! Missing keys take their defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Knobs for one `check` run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckOptions {
    /// Allow a field to name a type declared later in the source
    pub allow_forward_references: bool,
    /// Reject folded constants that do not fit the declared type
    pub range_checks: bool,
    /// Keep at most this many diagnostics (after sorting)
    pub max_diagnostics: Option<usize>,
    /// Report warnings with error severity
    pub warnings_as_errors: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            allow_forward_references: true,
            range_checks: true,
            max_diagnostics: None,
            warnings_as_errors: false,
        }
    }
}

impl CheckOptions {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Failures outside the checked source itself
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
