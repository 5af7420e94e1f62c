//! Sentence builder: pick words from a shuffled bank, then submit.
//!
//! A picked word leaves the bank; removing it from the sentence puts it back.

use std::time::Duration;

use rand::seq::SliceRandom;
use tracing::{debug, info, instrument};

use super::{ExerciseHost, ExerciseKind, HostContext, LearnerInput, Outcome, CORRECT_MARK};
use crate::domain::SentenceExercise;
use crate::error::{LessonError, LessonResult};
use crate::evaluator::evaluate_sentence;
use crate::presenter::{Tone, View};
use crate::util::join_words;

const FEEDBACK_DELAY: Duration = Duration::from_millis(1500);

pub struct SentenceHost {
  id: String,
  exercise: SentenceExercise,
  bank: Vec<String>,
  available: Vec<String>,
  picked: Vec<String>,
}

impl SentenceHost {
  pub fn new(index: usize, exercise: SentenceExercise) -> Self {
    Self { id: format!("sentence_{index}"), exercise, bank: Vec::new(), available: Vec::new(), picked: Vec::new() }
  }

  pub fn picked(&self) -> &[String] { &self.picked }

  /// Bank words not placed in the sentence yet.
  pub fn available(&self) -> &[String] { &self.available }

  fn reset(&mut self, cx: &mut HostContext<'_>) {
    self.picked.clear();
    self.available = self.bank.clone();
    cx.presenter.show_choices(&self.available);
    cx.presenter.show_constructed("");
    cx.presenter.clear_feedback();
  }

  fn refresh(&self, cx: &mut HostContext<'_>) {
    cx.presenter.show_choices(&self.available);
    cx.presenter.show_constructed(&join_words(&self.picked));
  }
}

impl ExerciseHost for SentenceHost {
  fn kind(&self) -> ExerciseKind { ExerciseKind::Sentence }

  fn exercise_id(&self) -> &str { &self.id }

  #[instrument(level = "debug", skip_all, fields(id = %self.id))]
  fn begin(&mut self, cx: &mut HostContext<'_>) -> LessonResult<Outcome> {
    if self.exercise.word_bank.iter().all(|w| w.trim().is_empty()) {
      return Err(LessonError::MissingContent(format!("{}: empty word bank", self.id)));
    }
    self.bank = self.exercise.word_bank.iter().filter(|w| !w.trim().is_empty()).cloned().collect();
    self.bank.shuffle(&mut *cx.rng);

    cx.presenter.show_view(View::SentenceBuilder);
    cx.presenter.show_prompt(&self.exercise.prompt_native, "");
    self.reset(cx);
    debug!(target: "exercise", id = %self.id, bank = ?self.bank, "Sentence exercise opened");
    Ok(Outcome::Pending)
  }

  fn handle(&mut self, input: &LearnerInput, cx: &mut HostContext<'_>) -> Outcome {
    match input {
      LearnerInput::SelectWord { word } => {
        let Some(pos) = self.available.iter().position(|w| w == word) else {
          debug!(target: "exercise", id = %self.id, %word, "Word not available; ignored");
          return Outcome::Pending;
        };
        let word = self.available.remove(pos);
        self.picked.push(word);
        self.refresh(cx);
        Outcome::Pending
      }
      LearnerInput::RemoveWord { index } => {
        if *index >= self.picked.len() {
          debug!(target: "exercise", id = %self.id, index, "No placed word at index; ignored");
          return Outcome::Pending;
        }
        let word = self.picked.remove(*index);
        self.available.push(word);
        self.refresh(cx);
        Outcome::Pending
      }
      LearnerInput::ResetSentence => {
        self.reset(cx);
        Outcome::Pending
      }
      LearnerInput::SubmitSentence => {
        let correct = evaluate_sentence(&self.picked, &self.exercise);
        info!(target: "exercise", id = %self.id, answer = %join_words(&self.picked), %correct, "Sentence submitted");
        if correct {
          cx.presenter.show_feedback(CORRECT_MARK, Tone::Success);
          Outcome::Correct
        } else {
          cx.presenter.show_feedback(&format!("Неправильно! Правильно: {}", self.exercise.correct_foreign), Tone::Error);
          Outcome::Incorrect
        }
      }
      _ => Outcome::Pending,
    }
  }

  fn feedback_delay(&self) -> Duration { FEEDBACK_DELAY }
}
