use std::error::Error as StdError;
use std::path::PathBuf;

use calliope_core::CoreError;

/// Alias for `Result<T, AiError>`.
pub type AiResult<T> = Result<T, AiError>;

/// Failures raised while constructing or calling a text-generation backend.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider could not be built from the current settings.
    #[error("provider configuration error: {0}")]
    Configuration(String),

    /// The backend was reached but the exchange failed.
    #[error("{provider} request failed: {message}")]
    Gateway {
        /// Backend name, e.g. `openai`.
        provider: &'static str,
        /// HTTP status when the backend answered with one.
        status: Option<u16>,
        /// Transport, status or decoding detail.
        message: String,
        /// Underlying transport or decoding error, when there is one.
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
}

impl ProviderError {
    /// A gateway failure without an HTTP status.
    pub fn gateway(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Gateway {
            provider,
            status: None,
            message: message.into(),
            source: None,
        }
    }

    /// A gateway failure caused by `source`.
    pub fn transport<E>(provider: &'static str, message: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Gateway {
            provider,
            status: None,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// A non-success HTTP answer.
    pub fn status(provider: &'static str, status: u16, message: impl Into<String>) -> Self {
        Self::Gateway {
            provider,
            status: Some(status),
            message: message.into(),
            source: None,
        }
    }
}

/// Errors raised by the consistency checker and the scene generator.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    /// A project or character operation failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The text-generation backend failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The request was rejected before any backend call.
    #[error("validation error: {0}")]
    Validation(String),

    /// Reading an input or writing an output failed.
    #[error("cannot access {}: {source}", path.display())]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl AiError {
    /// Wrap an I/O error together with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
