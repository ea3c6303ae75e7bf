/// Result alias that carries the custom [`RhythmError`] type.
pub type Result<T> = std::result::Result<T, RhythmError>;

/// Common error type for the core crate.
///
/// Gameplay outcomes (a miss, running out of lives) are never errors; they
/// surface as session phase transitions instead.
#[derive(Debug, thiserror::Error)]
pub enum RhythmError {
    /// Song data failed validation at load time.
    #[error("malformed song `{title}`: {reason}")]
    MalformedSong { title: String, reason: String },
    /// Configuration values that cannot drive a session.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// The catalog has no song at the requested selection index.
    #[error("no song at catalog index {0}")]
    UnknownSong(usize),
    /// An operation was requested in a phase that does not allow it.
    #[error("cannot {action} while {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: &'static str,
    },
    /// Every producer or the consumer of the event channel has gone away.
    #[error("event channel disconnected")]
    Disconnected,
    /// Free-form failure outside the categories above.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Wrapper around JSON (de)serialisation errors.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl RhythmError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub(crate) fn malformed(title: &str, reason: impl Into<String>) -> Self {
        Self::MalformedSong {
            title: title.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_errors_display_their_text() {
        let err = RhythmError::msg("game clock thread panicked");
        assert!(matches!(err, RhythmError::Message(_)));
        assert_eq!(err.to_string(), "game clock thread panicked");
    }
}
