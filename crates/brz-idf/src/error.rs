//! Error types for the brz-idf crate.

use thiserror::Error;

/// Errors raised while reading term statistics.
#[derive(Debug, Error)]
pub enum IdfError {
    /// The input has no `#documents` header.
    #[error("missing #documents header")]
    MissingDocumentCount,

    /// The `#documents` header is zero.
    #[error("document count must be greater than zero")]
    ZeroDocumentCount,

    /// A line could not be parsed.
    #[error("line {line}: {reason}")]
    Malformed {
        /// 1-based line number.
        line: usize,
        /// What is wrong with it.
        reason: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IdfError {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::Malformed {
            line,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_display() {
        let err = IdfError::malformed(7, "missing tab");
        assert_eq!(err.to_string(), "line 7: missing tab");
    }
}
