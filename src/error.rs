//! Domain errors and their transport-independent classification.

use thiserror::Error;

/// Closed set of failure categories a domain error is classified into.
///
/// Only the first three are caller-attributable; everything else is
/// [`ErrorKind::Unclassified`] and treated as an internal failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    Forbidden,
    NotFound,
    InvalidArgument(String),
    Unclassified,
}

/// Errors raised by catalog operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The caller is authenticated but may not touch the resource.
    #[error("forbidden")]
    Forbidden,

    /// The requested resource does not exist.
    #[error("not found")]
    NotFound,

    /// The caller supplied an invalid argument. The reason is echoed back to
    /// the caller, so it must never carry internal details.
    #[error("{0}")]
    InvalidArgument(String),

    #[error("storage failure: {0}")]
    Storage(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Build an [`Error::InvalidArgument`] from anything string-like.
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Error::InvalidArgument(reason.into())
    }

    /// Classify this error into exactly one [`ErrorKind`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Forbidden => ErrorKind::Forbidden,
            Error::NotFound => ErrorKind::NotFound,
            Error::InvalidArgument(reason) => ErrorKind::InvalidArgument(reason.clone()),
            Error::Storage(_) | Error::Io(_) | Error::Json(_) | Error::Other(_) => {
                ErrorKind::Unclassified
            }
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_errors_keep_their_kind() {
        assert_eq!(Error::Forbidden.kind(), ErrorKind::Forbidden);
        assert_eq!(Error::NotFound.kind(), ErrorKind::NotFound);
        assert_eq!(
            Error::invalid_argument("bad name").kind(),
            ErrorKind::InvalidArgument("bad name".into())
        );
    }

    #[test]
    fn everything_else_is_unclassified() {
        let io = Error::from(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert_eq!(io.kind(), ErrorKind::Unclassified);
        assert_eq!(Error::Storage("pool".into()).kind(), ErrorKind::Unclassified);

        let boxed: Box<dyn std::error::Error + Send + Sync> = "boom".into();
        assert_eq!(Error::from(boxed).kind(), ErrorKind::Unclassified);
    }
}
