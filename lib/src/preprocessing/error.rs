//! Error types for preprocessing operations.

use thiserror::Error;

/// Error type for preprocessing operations.
#[derive(Debug, Error)]
pub enum PreprocessingError {
    /// Data contains missing values (NaN) when not expected.
    #[error("Missing values: {0}")]
    MissingValues(String),
    /// Invalid hyperparameter value or unsupported operation.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// Serialization or deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
    /// Empty data provided where non-empty was required.
    #[error("Empty data: {0}")]
    EmptyData(String),
    /// Feature dimension mismatch.
    #[error("Feature mismatch: expected {expected_features} features, got {got_features}")]
    FeatureMismatch {
        expected_features: usize,
        got_features: usize,
    },
}

impl From<bincode::Error> for PreprocessingError {
    fn from(err: bincode::Error) -> Self {
        PreprocessingError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_missing_values() {
        let err = PreprocessingError::MissingValues("column 0".to_string());
        assert!(err.to_string().contains("Missing values"));
    }

    #[test]
    fn test_error_display_empty_data() {
        let err = PreprocessingError::EmptyData("no rows".to_string());
        assert!(err.to_string().contains("Empty data"));
    }

    #[test]
    fn test_error_display_feature_mismatch() {
        let err = PreprocessingError::FeatureMismatch {
            expected_features: 9,
            got_features: 3,
        };
        assert_eq!(
            err.to_string(),
            "Feature mismatch: expected 9 features, got 3"
        );
    }

    #[test]
    fn test_error_from_bincode_error() {
        let bad_bytes: &[u8] = &[0xff, 0xff, 0xff, 0xff];
        let bincode_result: Result<String, bincode::Error> = bincode::deserialize(bad_bytes);
        if let Err(e) = bincode_result {
            let err: PreprocessingError = e.into();
            assert!(matches!(err, PreprocessingError::SerializationError(_)));
        }
    }
}
