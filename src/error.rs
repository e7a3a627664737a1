use std::io;
use thiserror::Error;

/// Result type for audio operations
pub type AudioResult<T> = Result<T, AudioError>;

/// Error types for audio encoding
#[derive(Error, Debug)]
pub enum AudioError {
    /// IO error (file operations, disk access)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Sample format the encoder cannot consume without conversion
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// Bad or contradictory encoder options
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// No registered encoder matched the request
    #[error("No such encoder: {0}")]
    NotFound(String),

    /// The sample source failed to deliver samples
    #[error("Source read error: {0}")]
    SourceRead(String),

    /// Decoding failed
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// Encoding failed
    #[error("Encode error: {0}")]
    EncodeError(String),

    /// Invalid channel count
    #[error("Invalid channel configuration: expected at most {expected}, got {got}")]
    InvalidChannels {
        /// Highest supported number of channels
        expected: u16,
        /// Got number of channels
        got: u16,
    },

    /// Invalid sample rate
    #[error("Invalid sample rate: {rate}")]
    InvalidSampleRate {
        /// The invalid sample rate
        rate: u32,
    },
}

impl AudioError {
    /// Whether this error belongs to the configuration class (fatal at open time)
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            AudioError::ConfigError(_)
                | AudioError::UnsupportedFormat(_)
                | AudioError::InvalidChannels { .. }
                | AudioError::InvalidSampleRate { .. }
        )
    }
}

impl From<symphonia::core::errors::Error> for AudioError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        AudioError::DecodeError(err.to_string())
    }
}

impl From<hound::Error> for AudioError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(e) => AudioError::Io(e),
            hound::Error::Unsupported => {
                AudioError::UnsupportedFormat("WAV layout not supported".to_string())
            }
            e => AudioError::SourceRead(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_class() {
        assert!(AudioError::ConfigError("x".into()).is_configuration());
        assert!(AudioError::UnsupportedFormat("x".into()).is_configuration());
        assert!(!AudioError::SourceRead("x".into()).is_configuration());
        assert!(!AudioError::NotFound("flac".into()).is_configuration());
    }

    #[test]
    fn test_not_found_message() {
        let err = AudioError::NotFound("flac".to_string());
        assert_eq!(err.to_string(), "No such encoder: flac");
    }
}
