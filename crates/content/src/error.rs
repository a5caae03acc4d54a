//! Content loading error types.

use std::path::PathBuf;

/// Errors that abort a whole load. The previously published content stays.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Content root does not exist or is not a directory.
    #[error("content root not found: {}", .0.display())]
    RootMissing(PathBuf),

    /// A directory that exists could not be listed.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Problems with a single file. The file is skipped and loading continues.
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("unreadable: {0}")]
    Io(#[from] std::io::Error),

    #[error("frontmatter: {0}")]
    Frontmatter(#[from] serde_yaml::Error),

    /// Opening `---` fence without a closing one.
    #[error("unterminated frontmatter")]
    Unterminated,

    #[error("invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("missing required field {0}")]
    MissingField(&'static str),

    #[error("invalid file name")]
    InvalidName,
}
