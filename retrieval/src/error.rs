/// Errors surfaced by index construction and query evaluation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed boolean query. `position` is a character offset into the query string.
    #[error("syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },
    /// Rejected input collection (duplicate or empty document id).
    #[error("validation error: {0}")]
    Validation(String),
}

impl Error {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        Error::Syntax { position, message: message.into() }
    }

    /// Character position of a syntax error, if this is one.
    pub fn position(&self) -> Option<usize> {
        match self {
            Error::Syntax { position, .. } => Some(*position),
            Error::Validation(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
