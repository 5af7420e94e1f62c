//! "What is in the picture?" multiple choice over the correct label plus distractors.

use std::time::Duration;

use rand::seq::SliceRandom;
use tracing::{debug, info};

use super::{ExerciseHost, ExerciseKind, HostContext, LearnerInput, Outcome, CORRECT_MARK};
use crate::domain::ImageChoiceExercise;
use crate::error::{LessonError, LessonResult};
use crate::evaluator::evaluate_image_choice;
use crate::presenter::{Highlight, Tone, View};

const FEEDBACK_DELAY: Duration = Duration::from_millis(1500);
const QUESTION: &str = "Что изображено на картинке?";

pub struct ImageChoiceHost {
  id: String,
  exercise: ImageChoiceExercise,
  options: Vec<String>,
}

impl ImageChoiceHost {
  pub fn new(index: usize, exercise: ImageChoiceExercise) -> Self {
    Self { id: format!("image_choice_{index}"), exercise, options: Vec::new() }
  }

  pub fn options(&self) -> &[String] { &self.options }
}

impl ExerciseHost for ImageChoiceHost {
  fn kind(&self) -> ExerciseKind { ExerciseKind::ImageChoice }

  fn exercise_id(&self) -> &str { &self.id }

  fn begin(&mut self, cx: &mut HostContext<'_>) -> LessonResult<Outcome> {
    if self.exercise.correct_label.trim().is_empty() {
      return Err(LessonError::MissingContent(format!("{}: no correct label", self.id)));
    }
    self.options = std::iter::once(self.exercise.correct_label.clone())
      .chain(self.exercise.distractor_labels.iter().cloned())
      .collect();
    self.options.shuffle(&mut *cx.rng);

    cx.presenter.show_view(View::TranslationChoice);
    cx.presenter.show_prompt(QUESTION, "");
    cx.presenter.show_image(&self.exercise.image);
    cx.presenter.show_choices(&self.options);
    for i in 0..self.options.len() {
      cx.presenter.highlight(i, Highlight::Normal);
    }
    cx.presenter.clear_feedback();
    Ok(Outcome::Pending)
  }

  fn handle(&mut self, input: &LearnerInput, cx: &mut HostContext<'_>) -> Outcome {
    let LearnerInput::SelectChoice { index } = input else {
      return Outcome::Pending;
    };
    let Some(selected) = self.options.get(*index) else {
      debug!(target: "exercise", id = %self.id, index, "Choice index out of range; ignored");
      return Outcome::Pending;
    };
    let correct = evaluate_image_choice(selected, &self.exercise);
    info!(target: "exercise", id = %self.id, %selected, %correct, "Image choice answered");

    for (i, label) in self.options.iter().enumerate() {
      let color = if i == *index {
        if correct { Highlight::Correct } else { Highlight::Wrong }
      } else if !correct && *label == self.exercise.correct_label {
        Highlight::Correct
      } else {
        Highlight::Normal
      };
      cx.presenter.highlight(i, color);
    }

    if correct {
      cx.presenter.show_feedback(CORRECT_MARK, Tone::Success);
      Outcome::Correct
    } else {
      cx.presenter.show_feedback("Неправильно! Попробуй ещё раз", Tone::Error);
      Outcome::Incorrect
    }
  }

  fn feedback_delay(&self) -> Duration { FEEDBACK_DELAY }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::AssetRef;
  use crate::hosts::test_support::Rig;
  use crate::presenter::Presentation;

  fn exercise() -> ImageChoiceExercise {
    ImageChoiceExercise {
      image: AssetRef::new("img/coffee"),
      correct_label: "coffee".into(),
      distractor_labels: vec!["tea".into(), "juice".into(), "water".into()],
    }
  }

  fn highlights(events: &[Presentation]) -> Vec<(usize, Highlight)> {
    events
      .iter()
      .filter_map(|e| match e {
        Presentation::Highlight { option, color } => Some((*option, *color)),
        _ => None,
      })
      .collect()
  }

  #[test]
  fn wrong_pick_marks_both() {
    let mut rig = Rig::new();
    let mut host = ImageChoiceHost::new(0, exercise());
    host.begin(&mut rig.cx()).unwrap();
    assert_eq!(host.options().len(), 4);

    let right = host.options().iter().position(|o| o == "coffee").unwrap();
    let wrong = (right + 1) % 4;
    rig.presenter.drain();

    assert_eq!(host.handle(&LearnerInput::SelectChoice { index: wrong }, &mut rig.cx()), Outcome::Incorrect);
    let marks = highlights(&rig.presenter.events);
    assert!(marks.contains(&(wrong, Highlight::Wrong)));
    assert!(marks.contains(&(right, Highlight::Correct)));

    rig.presenter.drain();
    assert_eq!(host.handle(&LearnerInput::SelectChoice { index: right }, &mut rig.cx()), Outcome::Correct);
    let marks = highlights(&rig.presenter.events);
    assert_eq!(marks.iter().filter(|(_, c)| *c == Highlight::Correct).count(), 1);
    assert!(marks.contains(&(right, Highlight::Correct)));
  }

  #[test]
  fn out_of_range_is_ignored() {
    let mut rig = Rig::new();
    let mut host = ImageChoiceHost::new(0, exercise());
    host.begin(&mut rig.cx()).unwrap();
    assert_eq!(host.handle(&LearnerInput::SelectChoice { index: 9 }, &mut rig.cx()), Outcome::Pending);
  }
}
