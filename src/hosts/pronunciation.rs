//! Pronunciation practice: record, score, compare with the expected phrase.
//!
//! Only one of record-start/record-stop is enabled at a time. A recording
//! that reaches the configured maximum is stopped and scored on the next
//! tick, so the capture device is always released.

use std::time::Duration;

use tracing::{info, instrument, warn};

use super::{ExerciseHost, ExerciseKind, HostContext, LearnerInput, Outcome};
use crate::capture::CaptureHandle;
use crate::domain::PronunciationExercise;
use crate::error::{LessonError, LessonResult};
use crate::evaluator::{evaluate_pronunciation, pronunciation_text_matches};
use crate::presenter::{Tone, View};
use crate::util::percent;

const FEEDBACK_DELAY: Duration = Duration::from_secs(2);

struct Recording {
  handle: CaptureHandle,
  started: Duration,
}

pub struct PronunciationHost {
  id: String,
  exercise: PronunciationExercise,
  recording: Option<Recording>,
}

impl PronunciationHost {
  pub fn new(index: usize, exercise: PronunciationExercise) -> Self {
    Self { id: format!("pronunciation_{index}"), exercise, recording: None }
  }

  pub fn is_recording(&self) -> bool { self.recording.is_some() }

  fn start_recording(&mut self, cx: &mut HostContext<'_>) -> Outcome {
    if self.recording.is_some() {
      return Outcome::Pending;
    }
    match cx.capture.start(cx.settings.max_recording()) {
      Ok(handle) => {
        self.recording = Some(Recording { handle, started: cx.now });
        cx.presenter.set_recording_controls(false, true);
        cx.presenter.show_recording_status("Запись... Говори!");
        info!(target: "exercise", id = %self.id, handle = handle.0, "Recording started");
      }
      Err(e) => {
        warn!(target: "exercise", id = %self.id, error = %e, "Microphone unavailable");
        cx.presenter.set_recording_controls(true, false);
        cx.presenter.show_feedback("Ошибка микрофона! Попробуй ещё раз.", Tone::Error);
      }
    }
    Outcome::Pending
  }

  #[instrument(level = "debug", skip_all, fields(id = %self.id))]
  fn stop_and_score(&mut self, cx: &mut HostContext<'_>) -> Outcome {
    let Some(rec) = self.recording.take() else {
      return Outcome::Pending;
    };
    cx.presenter.set_recording_controls(true, false);
    cx.presenter.show_feedback("Анализируем произношение...", Tone::Pending);

    let result = match cx.capture.stop(rec.handle, &self.exercise.foreign_phrase) {
      Ok(r) => r,
      Err(e) => {
        warn!(target: "exercise", id = %self.id, error = %e, "Capture failed");
        cx.capture.cancel(rec.handle);
        cx.presenter.show_feedback("Ошибка записи! Попробуй ещё раз.", Tone::Error);
        return Outcome::Pending;
      }
    };

    let required = self.exercise.required_accuracy.unwrap_or(cx.settings.required_accuracy);
    cx.presenter.set_slider_value(result.accuracy);
    let correct = evaluate_pronunciation(result.accuracy, &result.recognized_text, &self.exercise, cx.settings.required_accuracy);
    info!(
      target: "exercise",
      id = %self.id,
      accuracy = result.accuracy,
      required,
      recognized = %result.recognized_text,
      %correct,
      "Pronunciation scored"
    );

    if correct {
      cx.presenter.show_feedback(&format!("Отлично! Точность: {}", percent(result.accuracy)), Tone::Success);
      return Outcome::Correct;
    }
    let text = if result.accuracy < required {
      format!("Попробуй ещё раз! Точность: {} (нужно {})", percent(result.accuracy), percent(required))
    } else if !pronunciation_text_matches(&result.recognized_text, &self.exercise.foreign_phrase) {
      format!("Фраза не распознана! Скажи: '{}'", self.exercise.foreign_phrase)
    } else {
      "Попробуй ещё раз!".to_string()
    };
    cx.presenter.show_feedback(&text, Tone::Error);
    cx.presenter.play_audio(&self.exercise.reference_audio);
    Outcome::Incorrect
  }
}

impl ExerciseHost for PronunciationHost {
  fn kind(&self) -> ExerciseKind { ExerciseKind::Pronunciation }

  fn exercise_id(&self) -> &str { &self.id }

  fn begin(&mut self, cx: &mut HostContext<'_>) -> LessonResult<Outcome> {
    if self.exercise.foreign_phrase.trim().is_empty() {
      return Err(LessonError::MissingContent(format!("{}: empty phrase", self.id)));
    }
    self.recording = None;
    cx.presenter.show_view(View::Pronunciation);
    cx.presenter.show_prompt(&self.exercise.foreign_phrase, &self.exercise.native_translation);
    cx.presenter.show_feedback("Нажми «Начать запись» и произнеси фразу", Tone::Neutral);
    cx.presenter.set_slider_value(0.0);
    cx.presenter.set_recording_controls(true, false);
    Ok(Outcome::Pending)
  }

  fn handle(&mut self, input: &LearnerInput, cx: &mut HostContext<'_>) -> Outcome {
    match input {
      LearnerInput::RecordStart => self.start_recording(cx),
      LearnerInput::RecordStop => self.stop_and_score(cx),
      _ => Outcome::Pending,
    }
  }

  fn on_tick(&mut self, cx: &mut HostContext<'_>) -> Outcome {
    let Some(rec) = &self.recording else {
      return Outcome::Pending;
    };
    let elapsed = cx.now.saturating_sub(rec.started);
    if elapsed >= cx.settings.max_recording() {
      info!(target: "exercise", id = %self.id, "Recording cutoff reached");
      return self.stop_and_score(cx);
    }
    cx.presenter.show_recording_status(&format!("Запись: {:.1}с", elapsed.as_secs_f32()));
    Outcome::Pending
  }

  fn cancel(&mut self, cx: &mut HostContext<'_>) {
    if let Some(rec) = self.recording.take() {
      cx.capture.cancel(rec.handle);
    }
  }

  fn feedback_delay(&self) -> Duration { FEEDBACK_DELAY }
}
