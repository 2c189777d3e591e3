use thiserror::Error;

use crate::transport::TransportError;

/// Everything the extraction layer can fail with.
///
/// A missing landmark means the live markup no longer matches the template
/// the extractors were written against, so it is always surfaced.
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed timestamp: {0:?}")]
    MalformedTimestamp(String),

    #[error("malformed counter: {0:?}")]
    MalformedCounter(String),

    #[error("malformed integer: {0:?}")]
    MalformedInteger(String),

    #[error("cannot extract {field}: {reason}")]
    Extraction { field: &'static str, reason: String },

    #[error("malformed comment stream at item {index} (position {position}): {reason}")]
    MalformedCommentStream {
        index: usize,
        position: u8,
        reason: &'static str,
    },

    #[error("page index must start at 1, got {0}")]
    InvalidPage(u32),

    #[error("no {0} action available")]
    MissingAction(&'static str),

    #[error("this action needs a logged-in session")]
    NoSession,

    #[error("unexpected action response: {0}")]
    ActionResponse(#[from] serde_json::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("configuration: {0}")]
    Config(#[from] config::ConfigError),
}

impl Error {
    pub(crate) fn missing(field: &'static str) -> Self {
        Error::Extraction {
            field,
            reason: "landmark not found".to_string(),
        }
    }

    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Error::Extraction {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
