use rust_decimal::Decimal;
use std::io;
use std::path::PathBuf;

/// Failures while loading, validating or reconciling a statement document.
///
/// A reconciliation mismatch is not an error; see [`crate::Outcome`].
#[derive(Debug, thiserror::Error)]
pub enum StatementError {
    #[error("input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The document is not syntactically valid JSON.
    #[error("malformed JSON: {0}")]
    Parse(String),

    /// Valid JSON that does not have the account statement shape.
    #[error("invalid statement: {0}")]
    Validation(String),

    #[error("tolerance must not be negative (got {0})")]
    NegativeTolerance(Decimal),
}

impl StatementError {
    pub(crate) fn from_json(e: serde_json::Error) -> Self {
        use serde_json::error::Category;
        match e.classify() {
            Category::Data => StatementError::Validation(e.to_string()),
            Category::Syntax | Category::Eof | Category::Io => StatementError::Parse(e.to_string()),
        }
    }

    /// Amounts whose sum does not fit in a `Decimal`.
    pub(crate) fn overflow() -> Self {
        StatementError::Validation("amount overflow".to_string())
    }

    /// True for errors caused by the document's content rather than the filesystem.
    pub fn is_validation(&self) -> bool {
        matches!(self, StatementError::Parse(_) | StatementError::Validation(_))
    }
}
