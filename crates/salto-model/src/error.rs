//! Error types for model loading and evaluation.

use std::path::PathBuf;

/// Errors that can occur while loading or evaluating a model.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Failed to read the model file.
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse the model file content.
    #[error("parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The model declares no generalized coordinates.
    #[error("model '{0}' has no coordinates")]
    NoCoordinates(String),

    /// A segment references a coordinate index that does not exist.
    #[error("segment '{segment}' references unknown coordinate {coordinate}")]
    UnknownCoordinate { segment: String, coordinate: usize },

    /// A segment, marker, or contact point references an unknown segment.
    #[error("'{referrer}' references unknown segment {segment}")]
    UnknownSegment { referrer: String, segment: usize },

    /// A segment's parent does not precede it in the chain.
    #[error("segment '{0}' must come after its parent")]
    ParentOrder(String),

    /// A joint range with minimum above maximum.
    #[error("coordinate '{0}' has an inverted range")]
    InvertedRange(String),

    /// A marker index that does not exist on this model.
    #[error("unknown marker index {0}")]
    UnknownMarker(usize),

    /// A coordinate vector of the wrong length was supplied.
    #[error("invalid coordinate vector length: expected {expected}, got {got}")]
    InvalidDimension { expected: usize, got: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = ModelError::UnknownCoordinate {
            segment: "thigh_r".into(),
            coordinate: 42,
        };
        assert_eq!(
            e.to_string(),
            "segment 'thigh_r' references unknown coordinate 42"
        );

        let e = ModelError::InvalidDimension {
            expected: 13,
            got: 7,
        };
        assert_eq!(
            e.to_string(),
            "invalid coordinate vector length: expected 13, got 7"
        );

        let e = ModelError::UnknownMarker(9);
        assert_eq!(e.to_string(), "unknown marker index 9");
    }

    #[test]
    fn io_error_includes_path() {
        let e = ModelError::Io {
            path: PathBuf::from("/tmp/jumper.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        let msg = e.to_string();
        assert!(msg.contains("/tmp/jumper.json"));
        assert!(msg.contains("not found"));
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn error_is_send_sync() {
        assert_send_sync::<ModelError>();
    }
}
