//! Domain models: dialog steps, lesson content (words + exercises) and asset handles.

use serde::{Deserialize, Serialize};

/// Opaque handle to an audio clip or image. The presentation layer resolves it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRef(pub String);

impl AssetRef {
  pub fn new(key: impl Into<String>) -> Self { AssetRef(key.into()) }
  pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

/// What a dialog step hands control to once its text is shown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogAction {
  #[default]
  None,
  StartWordLearning,
  StartSentenceExercise,
  ContinueSentenceExercise,
  StartToExercise,
  ContinueToExercise,
  FinalSentenceExercise,
  StartPronunciationExercise,
  StartTranslationChoice,
  ShowReward,
  ShowFinalReward,
}

/// One line of the NPC script.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DialogStep {
  pub text: String,
  pub speaker: String,
  #[serde(default)]
  pub action: DialogAction,
}

impl DialogStep {
  pub fn line(text: impl Into<String>, speaker: impl Into<String>) -> Self {
    Self { text: text.into(), speaker: speaker.into(), action: DialogAction::None }
  }

  pub fn with_action(text: impl Into<String>, speaker: impl Into<String>, action: DialogAction) -> Self {
    Self { text: text.into(), speaker: speaker.into(), action }
  }
}

/// Vocabulary flashcard.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WordCard {
  /// English term being learned (also used as the learned-word id).
  pub foreign_term: String,
  pub native_term: String,
  #[serde(default)] pub audio: AssetRef,
  #[serde(default)] pub image: AssetRef,
  #[serde(default)] pub category: String,
}

/// Build the English sentence from a bank of words (distractors included).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SentenceExercise {
  pub prompt_native: String,
  pub correct_foreign: String,
  #[serde(default)] pub word_bank: Vec<String>,
}

/// Decide whether "to" belongs in the gap.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParticleExercise {
  pub sentence_with_gap: String,
  pub requires_particle: bool,
  #[serde(default)] pub explanation: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PronunciationExercise {
  pub foreign_phrase: String,
  #[serde(default)] pub native_translation: String,
  #[serde(default)] pub reference_audio: AssetRef,
  /// Minimum accuracy in [0, 1]; falls back to the lesson-wide setting when absent.
  #[serde(default)] pub required_accuracy: Option<f32>,
}

/// Pick the English label for a picture.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageChoiceExercise {
  pub image: AssetRef,
  pub correct_label: String,
  #[serde(default)] pub distractor_labels: Vec<String>,
}

/// All exercise material for one lesson. Read-only during play.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LessonContent {
  #[serde(default)] pub words: Vec<WordCard>,
  #[serde(default)] pub sentences: Vec<SentenceExercise>,
  #[serde(default)] pub particles: Vec<ParticleExercise>,
  #[serde(default)] pub pronunciations: Vec<PronunciationExercise>,
  #[serde(default)] pub image_choices: Vec<ImageChoiceExercise>,
}

/// XP/coin amounts granted by a reward step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
  pub xp: u32,
  pub coins: u32,
}

impl Reward {
  pub const fn new(xp: u32, coins: u32) -> Self { Self { xp, coins } }
}
