//! Error taxonomy shared by loaders and generators.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RefmanError {
    /// A description document is malformed.
    #[error("{}: {message}", file.display())]
    Schema { file: PathBuf, message: String },

    /// A supertype, inheritance target or cross-reference names a symbol
    /// that does not exist.
    #[error("{}: `{symbol}` references unknown `{target}`", file.display())]
    Reference {
        file: PathBuf,
        symbol: String,
        target: String,
    },

    /// Visible documentation links to a symbol that is never rendered.
    #[error("{}: `{symbol}` links to hidden `{target}`", file.display())]
    HiddenReference {
        file: PathBuf,
        symbol: String,
        target: String,
    },

    #[error("{}: {relation} cycle: {}", file.display(), chain.join(" -> "))]
    Cycle {
        file: PathBuf,
        relation: &'static str,
        chain: Vec<String>,
    },

    /// A page links to a symbol that has no anchor.
    #[error("{}: dangling link to `{target}`", page.display())]
    DanglingLink { page: PathBuf, target: String },

    /// The same block would be written twice, leaving two elements with one id.
    #[error("{}: `{target}` is already inserted on {}", page.display(), first.display())]
    DuplicateInsert {
        page: PathBuf,
        target: String,
        first: PathBuf,
    },

    #[error("{}:{line}: {message}", file.display())]
    Sitemap {
        file: PathBuf,
        line: usize,
        message: String,
    },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: {message}", path.display())]
    Pickle { path: PathBuf, message: String },

    #[error("unknown {kind} `{name}` (available: {})", available.join(", "))]
    UnknownBackend {
        kind: &'static str,
        name: String,
        available: Vec<String>,
    },
}

pub type Result<T, E = RefmanError> = std::result::Result<T, E>;

impl RefmanError {
    pub fn io(path: &Path, source: io::Error) -> Self {
        RefmanError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn schema(file: &Path, message: impl Into<String>) -> Self {
        RefmanError::Schema {
            file: file.to_path_buf(),
            message: message.into(),
        }
    }
}
