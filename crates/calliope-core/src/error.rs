use std::path::PathBuf;

/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by project, character, template, git and export operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A character with the same (case-insensitive) name already exists.
    #[error("character '{0}' already exists")]
    DuplicateName(String),

    /// No character matches the given name.
    #[error("character '{0}' not found")]
    NotFound(String),

    /// Input was rejected before any work was done.
    #[error("validation error: {0}")]
    Validation(String),

    /// A template is missing or malformed.
    #[error("template error: {0}")]
    Template(String),

    /// A git invocation failed.
    #[error("git error: {0}")]
    Git(String),

    /// An export could not be produced.
    #[error("export error: {0}")]
    Export(String),

    /// Reading or writing a file failed.
    #[error("cannot access {}: {source}", path.display())]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A YAML document could not be parsed or serialized.
    #[error("invalid YAML in {}: {source}", path.display())]
    Yaml {
        /// The file involved.
        path: PathBuf,
        /// The underlying YAML error.
        #[source]
        source: serde_yaml::Error,
    },
}

impl CoreError {
    /// Wrap an I/O error together with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
