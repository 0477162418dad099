//! Error kinds surfaced by the analyses

/// Failure of a single analysis call. Inputs are never mutated on error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A required argument is missing, non-finite or outside its valid range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The tree violates a structural precondition of the requested analysis.
    #[error("invalid topology: {0}")]
    InvalidTopology(String),
}

impl Error {
    pub(crate) fn argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub(crate) fn topology(msg: impl Into<String>) -> Self {
        Error::InvalidTopology(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
