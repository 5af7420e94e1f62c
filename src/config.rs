//! Loading lesson configuration (settings, rewards and content) from TOML.
//!
//! See `LessonConfig` for the expected schema. Every table is optional; a
//! missing content table falls back to the built-in lesson in `seeds`.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::{
  DialogStep, ImageChoiceExercise, LessonContent, ParticleExercise, PronunciationExercise, Reward, SentenceExercise, WordCard,
};
use crate::error::{LessonError, LessonResult};
use crate::seeds::{default_lesson_content, default_script};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct LessonConfig {
  #[serde(default)]
  pub settings: Settings,
  #[serde(default)]
  pub rewards: Rewards,
  #[serde(default)] pub words: Vec<WordCard>,
  #[serde(default)] pub sentences: Vec<SentenceExercise>,
  #[serde(default)] pub particles: Vec<ParticleExercise>,
  #[serde(default)] pub pronunciations: Vec<PronunciationExercise>,
  #[serde(default)] pub image_choices: Vec<ImageChoiceExercise>,
  /// Custom NPC script; the built-in one is generated when absent.
  #[serde(default)] pub script: Vec<DialogStep>,
}

/// Session-wide knobs. Defaults reproduce the shipped lesson.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// Skip restore and wipe the store when a session starts.
  pub reset_progress_on_start: bool,
  /// Accuracy threshold for pronunciation items that don't set their own.
  pub required_accuracy: f32,
  /// Hard cutoff for a single recording.
  pub max_recording_secs: f32,
  /// Seconds per revealed character; 0 shows step text at once.
  pub typing_speed_secs: f32,
  /// Range the simulated scorer draws accuracy from.
  pub simulated_accuracy_min: f32,
  pub simulated_accuracy_max: f32,
  /// Interval of the server-side frame loop.
  pub frame_millis: u64,
  /// Fixed RNG seed for option shuffling (tests, reproducible demos).
  pub shuffle_seed: Option<u64>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      reset_progress_on_start: true,
      required_accuracy: 0.7,
      max_recording_secs: 5.0,
      typing_speed_secs: 0.0,
      simulated_accuracy_min: 0.6,
      simulated_accuracy_max: 0.95,
      frame_millis: 50,
      shuffle_seed: None,
    }
  }
}

const MAX_RECORDING_LIMIT_SECS: f32 = 60.0;
const MAX_TYPING_SPEED_SECS: f32 = 1.0;
const DEFAULT_MAX_RECORDING: Duration = Duration::from_secs(5);

impl Settings {
  /// Falls back to 5s for values `Duration` can't hold (settings built in code skip `validate`).
  pub fn max_recording(&self) -> Duration {
    Duration::try_from_secs_f32(self.max_recording_secs.max(0.0)).unwrap_or(DEFAULT_MAX_RECORDING)
  }

  pub fn typing_interval(&self) -> Option<Duration> {
    if self.typing_speed_secs.is_nan() || self.typing_speed_secs <= 0.0 {
      return None;
    }
    Duration::try_from_secs_f32(self.typing_speed_secs).ok()
  }

  pub fn frame_interval(&self) -> Duration {
    Duration::from_millis(self.frame_millis.max(1))
  }

  /// Reject values the engine can't work with.
  pub fn validate(&self) -> LessonResult<()> {
    if !(0.0..=1.0).contains(&self.required_accuracy) {
      return Err(LessonError::InvalidSetting(format!(
        "required_accuracy must be within [0, 1], got {}",
        self.required_accuracy
      )));
    }
    if self.max_recording_secs.is_nan() || self.max_recording_secs <= 0.0 || self.max_recording_secs > MAX_RECORDING_LIMIT_SECS {
      return Err(LessonError::InvalidSetting(format!(
        "max_recording_secs must be within (0, {MAX_RECORDING_LIMIT_SECS}], got {}",
        self.max_recording_secs
      )));
    }
    if !(0.0..=MAX_TYPING_SPEED_SECS).contains(&self.typing_speed_secs) {
      return Err(LessonError::InvalidSetting(format!(
        "typing_speed_secs must be within [0, {MAX_TYPING_SPEED_SECS}], got {}",
        self.typing_speed_secs
      )));
    }
    for (name, value) in [("simulated_accuracy_min", self.simulated_accuracy_min), ("simulated_accuracy_max", self.simulated_accuracy_max)] {
      if !(0.0..=1.0).contains(&value) {
        return Err(LessonError::InvalidSetting(format!("{name} must be within [0, 1], got {value}")));
      }
    }
    if self.simulated_accuracy_min > self.simulated_accuracy_max {
      return Err(LessonError::InvalidSetting(
        "simulated_accuracy_min must not exceed simulated_accuracy_max".into(),
      ));
    }
    Ok(())
  }
}

/// Amounts granted by the two reward step kinds.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Rewards {
  pub reward: Reward,
  pub final_reward: Reward,
}

impl Default for Rewards {
  fn default() -> Self {
    Self { reward: Reward::new(50, 25), final_reward: Reward::new(100, 50) }
  }
}

impl LessonConfig {
  /// Content from the file; each empty list is filled from the built-in lesson.
  pub fn content(&self) -> LessonContent {
    fn pick<T: Clone>(from_cfg: &[T], fallback: Vec<T>) -> Vec<T> {
      if from_cfg.is_empty() { fallback } else { from_cfg.to_vec() }
    }
    let defaults = default_lesson_content();
    LessonContent {
      words: pick(&self.words, defaults.words),
      sentences: pick(&self.sentences, defaults.sentences),
      particles: pick(&self.particles, defaults.particles),
      pronunciations: pick(&self.pronunciations, defaults.pronunciations),
      image_choices: pick(&self.image_choices, defaults.image_choices),
    }
  }

  /// The configured script, or the built-in one generated for `content`.
  pub fn script(&self, content: &LessonContent) -> Vec<DialogStep> {
    if self.script.is_empty() { default_script(content) } else { self.script.clone() }
  }
}

/// Everything a dialog session needs, shared read-only between sessions.
#[derive(Clone, Debug)]
pub struct Lesson {
  pub settings: Settings,
  pub rewards: Rewards,
  pub content: Arc<LessonContent>,
  pub script: Arc<Vec<DialogStep>>,
}

impl Lesson {
  pub fn new(settings: Settings, rewards: Rewards, content: LessonContent, script: Vec<DialogStep>) -> Self {
    Self { settings, rewards, content: Arc::new(content), script: Arc::new(script) }
  }

  /// The built-in lesson with default settings.
  pub fn builtin() -> Self {
    LessonConfig::default().into_lesson()
  }
}

impl LessonConfig {
  pub fn into_lesson(self) -> Lesson {
    let content = self.content();
    let script = self.script(&content);
    Lesson::new(self.settings, self.rewards, content, script)
  }
}

/// Read and parse a lesson file.
pub fn load_lesson_config(path: &Path) -> LessonResult<LessonConfig> {
  let raw = std::fs::read_to_string(path)
    .map_err(|source| LessonError::ConfigRead { path: path.to_path_buf(), source })?;
  let cfg = toml::from_str::<LessonConfig>(&raw)
    .map_err(|source| LessonError::ConfigParse { path: path.to_path_buf(), source })?;
  cfg.settings.validate()?;
  Ok(cfg)
}

/// Attempt to load `LessonConfig` from LESSON_CONFIG_PATH. On any error, returns None.
pub fn load_lesson_config_from_env() -> Option<LessonConfig> {
  let path = std::env::var("LESSON_CONFIG_PATH").ok()?;
  match load_lesson_config(Path::new(&path)) {
    Ok(cfg) => {
      info!(target: "lingo_quest", %path, "Loaded lesson config (TOML)");
      Some(cfg)
    }
    Err(e) => {
      error!(target: "lingo_quest", %path, error = %e, "Failed to load lesson config; using built-in lesson");
      None
    }
  }
}
