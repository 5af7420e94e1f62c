//! Vocabulary flashcard. No failure state: "remember" completes it.

use std::time::Duration;

use tracing::info;

use super::{ExerciseHost, ExerciseKind, HostContext, LearnerInput, Outcome};
use crate::domain::WordCard;
use crate::error::{LessonError, LessonResult};
use crate::evaluator::evaluate_word_learning;
use crate::presenter::View;

pub struct WordHost {
  id: String,
  card: WordCard,
}

impl WordHost {
  pub fn new(index: usize, card: WordCard) -> Self {
    Self { id: format!("word_{index}"), card }
  }
}

impl ExerciseHost for WordHost {
  fn kind(&self) -> ExerciseKind { ExerciseKind::Word }

  fn exercise_id(&self) -> &str { &self.id }

  fn begin(&mut self, cx: &mut HostContext<'_>) -> LessonResult<Outcome> {
    if self.card.foreign_term.trim().is_empty() {
      return Err(LessonError::MissingContent(format!("{}: word card has no term", self.id)));
    }
    cx.presenter.show_view(View::WordCard);
    cx.presenter.show_prompt(&self.card.foreign_term, &self.card.native_term);
    if !self.card.image.is_empty() {
      cx.presenter.show_image(&self.card.image);
    }
    Ok(Outcome::Pending)
  }

  fn handle(&mut self, input: &LearnerInput, cx: &mut HostContext<'_>) -> Outcome {
    match input {
      LearnerInput::RememberWord if evaluate_word_learning() => {
        if cx.ledger.mark_word_learned(&self.card.foreign_term) {
          info!(target: "exercise", id = %self.id, word = %self.card.foreign_term, "Word learned");
        }
        Outcome::Correct
      }
      LearnerInput::PlayWordSound => {
        cx.presenter.play_audio(&self.card.audio);
        Outcome::Pending
      }
      _ => Outcome::Pending,
    }
  }

  fn feedback_delay(&self) -> Duration { Duration::ZERO }
}
