//! Error types returned by the public entry points.
//!
//! Individual statements never produce these; they report diagnostics and bump the
//! unit's error counter. These errors describe whole-compile and file-loading
//! outcomes only.

use thiserror::Error;

pub use config::ConfigError;

/// Top-level failure of a symbols compile.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("no keys defined in symbols section \"{section}\"")]
    NoKeys { section: String },

    #[error("symbols section \"{section}\" had {count} error(s)")]
    Errors { section: String, count: usize },
}

/// Failure to load an included file or a statement tree.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("can't find file \"{0}\" for symbols include")]
    NotFound(String),

    #[error("no map named \"{map}\" in file \"{file}\"")]
    NoSuchMap { file: String, map: String },

    #[error("file \"{0}\" contains no maps")]
    Empty(String),

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
}
