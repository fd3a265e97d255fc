use thiserror::Error;

/// Result type alias for plus3dsk operations
pub type Result<T> = std::result::Result<T, DskError>;

/// Errors that can occur when working with EDSK images and +3 filesystems
#[derive(Debug, Error)]
pub enum DskError {
    /// I/O error occurred while reading or writing a host file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Disk info block did not match either the Standard or Extended magic
    #[error("Unrecognized EDSK container: {0}")]
    UnknownContainer(String),

    /// Cylinder or side count in the disk info block was zero
    #[error("Bad disk geometry: {0}")]
    BadGeometry(String),

    /// A track header or sector info block was malformed
    #[error("Bad track at index {index}: {message}")]
    BadTrack {
        /// Cylinder-major, side-minor track index
        index: usize,
        /// Description of what was wrong
        message: String,
    },

    /// The byte stream ended before a declared field could be read
    #[error("Truncated input: expected {expected} more bytes, found {found}")]
    TruncatedInput {
        /// Bytes required to complete the current field
        expected: usize,
        /// Bytes actually available
        found: usize,
    },

    /// A track's declared sectors exceed its declared on-disk size
    #[error("Oversized track at index {0}: sector payloads exceed declared track size")]
    OversizedTrack(usize),

    /// Track 1 or one of its directory sectors was absent
    #[error("Missing directory: {0}")]
    MissingDirectory(String),

    /// A directory sector was not exactly 512 bytes
    #[error("Short directory sector: expected 512 bytes, found {0}")]
    ShortDirectorySector(usize),

    /// Invalid command-line usage
    #[error("Usage error: {0}")]
    UsageError(String),
}

impl DskError {
    /// Build a [`DskError::BadTrack`] with the given track index and message
    pub fn bad_track<S: Into<String>>(index: usize, message: S) -> Self {
        DskError::BadTrack {
            index,
            message: message.into(),
        }
    }

    /// Build a [`DskError::UnknownContainer`] error
    pub fn unknown_container<S: Into<String>>(message: S) -> Self {
        DskError::UnknownContainer(message.into())
    }

    /// Build a [`DskError::BadGeometry`] error
    pub fn bad_geometry<S: Into<String>>(message: S) -> Self {
        DskError::BadGeometry(message.into())
    }

    /// Build a [`DskError::UsageError`] error
    pub fn usage<S: Into<String>>(message: S) -> Self {
        DskError::UsageError(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_track_display() {
        let err = DskError::bad_track(3, "sector count is zero");
        assert_eq!(err.to_string(), "Bad track at index 3: sector count is zero");
    }

    #[test]
    fn test_truncated_input_display() {
        let err = DskError::TruncatedInput {
            expected: 256,
            found: 10,
        };
        assert_eq!(
            err.to_string(),
            "Truncated input: expected 256 more bytes, found 10"
        );
    }

    #[test]
    fn test_usage_display() {
        let err = DskError::usage("plus3dsk-inspect <image.dsk>");
        assert_eq!(err.to_string(), "Usage error: plus3dsk-inspect <image.dsk>");
    }
}
