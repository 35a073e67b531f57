// src/infra/errors.rs — Error types for Chronos

use thiserror::Error;

/// Message shown to the user whenever a simulation turn cannot complete.
pub const TURN_FAILED_MESSAGE: &str = "Temporal sync failed. Try again.";

#[derive(Error, Debug)]
pub enum ChronosError {
    // Remote service errors
    #[error("Simulation API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Simulation API unreachable: {0}")]
    Transport(String),

    #[error("{}", TURN_FAILED_MESSAGE)]
    TurnFailed,

    // Audio
    #[error("Invalid audio payload: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Audio device error: {0}")]
    AudioDevice(String),

    // Infra
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Corrupt session data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ChronosError {
    /// Errors coming from the remote service boundary.
    pub fn is_remote(&self) -> bool {
        matches!(self, ChronosError::Api { .. } | ChronosError::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_failed_display() {
        assert_eq!(
            ChronosError::TurnFailed.to_string(),
            "Temporal sync failed. Try again."
        );
    }

    #[test]
    fn test_is_remote() {
        let api = ChronosError::Api {
            status: 500,
            message: "boom".into(),
        };
        assert!(api.is_remote());
        assert!(ChronosError::Transport("refused".into()).is_remote());
        assert!(!ChronosError::TurnFailed.is_remote());
        assert!(!ChronosError::Config("bad".into()).is_remote());
    }
}
