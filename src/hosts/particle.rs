//! "Does this gap need `to`?" yes/no quiz.

use std::time::Duration;

use tracing::info;

use super::{ExerciseHost, ExerciseKind, HostContext, LearnerInput, Outcome, CORRECT_MARK};
use crate::domain::ParticleExercise;
use crate::error::{LessonError, LessonResult};
use crate::evaluator::evaluate_particle;
use crate::presenter::{Tone, View};

const FEEDBACK_DELAY: Duration = Duration::from_secs(2);

pub struct ParticleHost {
  id: String,
  exercise: ParticleExercise,
}

impl ParticleHost {
  pub fn new(index: usize, exercise: ParticleExercise) -> Self {
    Self { id: format!("particle_{index}"), exercise }
  }
}

impl ExerciseHost for ParticleHost {
  fn kind(&self) -> ExerciseKind { ExerciseKind::Particle }

  fn exercise_id(&self) -> &str { &self.id }

  fn begin(&mut self, cx: &mut HostContext<'_>) -> LessonResult<Outcome> {
    if self.exercise.sentence_with_gap.trim().is_empty() {
      return Err(LessonError::MissingContent(format!("{}: empty sentence", self.id)));
    }
    cx.presenter.show_view(View::ParticleQuiz);
    cx.presenter.show_prompt(&self.exercise.sentence_with_gap, "");
    cx.presenter.clear_feedback();
    Ok(Outcome::Pending)
  }

  fn handle(&mut self, input: &LearnerInput, cx: &mut HostContext<'_>) -> Outcome {
    let LearnerInput::AnswerParticle { yes } = input else {
      return Outcome::Pending;
    };
    let correct = evaluate_particle(*yes, &self.exercise);
    info!(target: "exercise", id = %self.id, answered_yes = *yes, %correct, "Particle answered");

    // the explanation is shown either way
    cx.presenter.show_prompt(&self.exercise.sentence_with_gap, &self.exercise.explanation);
    if correct {
      cx.presenter.show_feedback(CORRECT_MARK, Tone::Success);
      Outcome::Correct
    } else {
      cx.presenter.show_feedback("Неправильно! ✗", Tone::Error);
      Outcome::Incorrect
    }
  }

  fn feedback_delay(&self) -> Duration { FEEDBACK_DELAY }
}
