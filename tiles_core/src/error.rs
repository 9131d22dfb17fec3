use song_schema::DifficultyKey;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionErrorKind {
    /// The song or difficulty cannot be played; the caller should return to selection.
    Config,
    /// The rule set itself is inconsistent.
    Rules,
}

/// Refusal to start a run. Gameplay outcomes are never reported through this type.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SessionError {
    #[error("no song selected")]
    NoSongSelected,

    #[error("song {title:?} has a non-playable tempo ({bpm} bpm)")]
    InvalidTempo { title: String, bpm: f64 },

    #[error("song {title:?} has no usable {difficulty} difficulty profile")]
    MissingDifficulty {
        title: String,
        difficulty: DifficultyKey,
    },

    #[error("invalid rules: {0}")]
    InvalidRules(String),
}

impl SessionError {
    pub fn kind(&self) -> SessionErrorKind {
        match self {
            SessionError::NoSongSelected
            | SessionError::InvalidTempo { .. }
            | SessionError::MissingDifficulty { .. } => SessionErrorKind::Config,
            SessionError::InvalidRules(_) => SessionErrorKind::Rules,
        }
    }
}

/// High-score persistence failure. Callers on the gameplay path swallow these.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("high score storage io: {0}")]
    Io(#[from] std::io::Error),

    #[error("high score storage format: {0}")]
    Serde(#[from] serde_json::Error),
}
