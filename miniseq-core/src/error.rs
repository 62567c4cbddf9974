use thiserror::Error;

/// Errors raised by the sequencer core and its collaborators.
///
/// End of track and end of pattern are not errors: sources report them by
/// returning `None`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeqError {
    /// Invalid tempo, resolution or batch size. Raised before any worker starts.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The output device could not be opened or refused a message.
    #[error("MIDI device error: {0}")]
    Device(String),

    /// A transport operation that moves the sequence needs a loaded track.
    #[error("No track loaded")]
    NoTrack,

    /// The scheduler thread panicked instead of returning.
    #[error("Scheduler thread panicked")]
    WorkerPanicked,
}

impl SeqError {
    pub fn config(message: impl Into<String>) -> Self {
        SeqError::Configuration(message.into())
    }

    pub fn device(message: impl Into<String>) -> Self {
        SeqError::Device(message.into())
    }

    /// True for failures reported by the output device
    pub fn is_device(&self) -> bool {
        matches!(self, SeqError::Device(_))
    }
}

pub type Result<T> = std::result::Result<T, SeqError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            SeqError::config("bpm must be > 0").to_string(),
            "Invalid configuration: bpm must be > 0"
        );
        assert_eq!(
            SeqError::device("port closed").to_string(),
            "MIDI device error: port closed"
        );
        assert_eq!(SeqError::NoTrack.to_string(), "No track loaded");
    }

    #[test]
    fn test_is_device() {
        assert!(SeqError::device("x").is_device());
        assert!(!SeqError::NoTrack.is_device());
    }
}
