//! Error taxonomy for the lesson engine.
//!
//! None of these are fatal: the sequencer contains them at the exercise or
//! step boundary (log + skip, or show feedback and keep the exercise open).

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum LessonError {
  /// Exercise data missing or unusable (empty list, empty word bank, ...).
  #[error("lesson content missing: {0}")]
  MissingContent(String),

  #[error("failed to read lesson config {path}: {source}")]
  ConfigRead {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse lesson config {path}: {source}")]
  ConfigParse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("invalid setting: {0}")]
  InvalidSetting(String),

  /// Audio capture device unavailable or failed mid-recording.
  #[error("audio capture failed: {0}")]
  Capture(String),

  #[error("progress store failure: {0}")]
  Store(String),
}

pub type LessonResult<T> = Result<T, LessonError>;
