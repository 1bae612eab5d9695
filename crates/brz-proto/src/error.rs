//! Error types for the brz-proto crate.

use thiserror::Error;

/// Errors that can occur during protocol operations.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// Failed to encode a message.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Failed to decode a message.
    #[error("decoding error: {0}")]
    Decoding(String),

    /// Unknown indexing operation name.
    #[error("invalid indexing command type: {0}")]
    InvalidIndexingType(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_indexing_type_display() {
        let err = ProtoError::InvalidIndexingType("upsert".into());
        assert_eq!(err.to_string(), "invalid indexing command type: upsert");
    }
}
