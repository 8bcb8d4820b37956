//! Error types of this crate.

use thiserror::Error;

/// Catch-all error for this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// An error that originates in this crate.
    #[error("{0}")]
    General(String),
    /// Returned when two weight vectors that must be aligned slot by slot have different lengths.
    #[error("dimensionality error in {context}: expected {expected} weight slots, found {found}")]
    Dimension {
        /// Number of slots of the reference vector.
        expected: usize,
        /// Number of slots of the offending vector.
        found: usize,
        /// Name of the cut, histogram or operation where the mismatch occurred.
        context: String,
    },
    /// Returned when no weight satisfies the nominal-weight predicate.
    #[error(
        "no nominal weight found for dynamic scale choice {scale_choice} and central PDF sets {central_pdfs:?}"
    )]
    MissingNominal {
        /// Requested dynamic scale choice.
        scale_choice: i32,
        /// Accepted central PDF ids.
        central_pdfs: Vec<i32>,
    },
    /// Error while reading from a file or stream.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Error that does not originate from this crate.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub(crate) fn dimension(expected: usize, found: usize, context: impl Into<String>) -> Self {
        Self::Dimension {
            expected,
            found,
            context: context.into(),
        }
    }
}

/// Result type of this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
