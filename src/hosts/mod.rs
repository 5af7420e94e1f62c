//! Exercise hosts: one controller per exercise kind.
//!
//! A host is opened with `begin`, receives learner input through `handle`
//! and frame ticks through `on_tick`. Each call reports an `Outcome`; once a
//! host reports `Correct` the sequencer waits `feedback_delay` and then
//! resumes the dialog. Hosts never advance the dialog themselves.

use std::time::Duration;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::capture::AudioCapture;
use crate::config::Settings;
use crate::domain::Reward;
use crate::error::LessonResult;
use crate::ledger::Ledger;
use crate::presenter::Presenter;

pub mod image_choice;
pub mod particle;
pub mod pronunciation;
pub mod reward;
pub mod sentence;
pub mod word;

pub use image_choice::ImageChoiceHost;
pub use particle::ParticleHost;
pub use pronunciation::PronunciationHost;
pub use reward::RewardHost;
pub use sentence::SentenceHost;
pub use word::WordHost;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
  Word,
  Sentence,
  Particle,
  Pronunciation,
  ImageChoice,
  Reward,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
  Pending,
  Incorrect,
  Correct,
}

/// Learner input events delivered to the active host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "input", rename_all = "snake_case")]
pub enum LearnerInput {
  RememberWord,
  PlayWordSound,
  SelectWord { word: String },
  /// Take the placed word at `index` out of the sentence, back into the bank.
  RemoveWord { index: usize },
  ResetSentence,
  SubmitSentence,
  AnswerParticle { yes: bool },
  RecordStart,
  RecordStop,
  SelectChoice { index: usize },
}

/// Raised when a host's exercise is done and the dialog resumes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExerciseCompleted {
  pub exercise_id: String,
  pub kind: ExerciseKind,
  pub reward: Option<Reward>,
}

/// Collaborators a host may touch while handling an event.
pub struct HostContext<'a> {
  pub presenter: &'a mut dyn Presenter,
  pub capture: &'a mut dyn AudioCapture,
  pub ledger: &'a mut Ledger,
  pub rng: &'a mut StdRng,
  pub settings: &'a Settings,
  /// Frame-clock time.
  pub now: Duration,
}

pub trait ExerciseHost: Send {
  fn kind(&self) -> ExerciseKind;

  fn exercise_id(&self) -> &str;

  /// Switch to this exercise's view and reset transient state. An error means
  /// the exercise can't run (missing content) and should be skipped.
  fn begin(&mut self, cx: &mut HostContext<'_>) -> LessonResult<Outcome>;

  fn handle(&mut self, input: &LearnerInput, cx: &mut HostContext<'_>) -> Outcome;

  fn on_tick(&mut self, _cx: &mut HostContext<'_>) -> Outcome { Outcome::Pending }

  /// The exercise is being discarded (dialog closed); release resources.
  fn cancel(&mut self, _cx: &mut HostContext<'_>) {}

  /// How long feedback stays visible after a correct answer.
  fn feedback_delay(&self) -> Duration;

  fn reward(&self) -> Option<Reward> { None }
}

pub(crate) const CORRECT_MARK: &str = "Правильно! ✓";
