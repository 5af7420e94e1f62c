//! Audio capture capability used by the pronunciation exercise.
//!
//! Real speech recognition is out of scope; `SimulatedCapture` plays the
//! device and scorer, drawing an accuracy from a configured range and
//! "recognising" the expected phrase.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, instrument};

use crate::config::Settings;
use crate::error::{LessonError, LessonResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureHandle(pub u64);

#[derive(Clone, Debug, PartialEq)]
pub struct CaptureResult {
  pub accuracy: f32,
  pub recognized_text: String,
}

pub trait AudioCapture {
  /// Acquire the device for at most `max_duration`.
  fn start(&mut self, max_duration: Duration) -> LessonResult<CaptureHandle>;
  /// Release the device and score what was said against `expected_phrase`.
  fn stop(&mut self, handle: CaptureHandle, expected_phrase: &str) -> LessonResult<CaptureResult>;
  /// Release the device without scoring.
  fn cancel(&mut self, handle: CaptureHandle);
  fn is_capturing(&self) -> bool;
}

#[derive(Debug)]
pub struct SimulatedCapture {
  rng: StdRng,
  min_accuracy: f32,
  max_accuracy: f32,
  active: Option<CaptureHandle>,
  next_handle: u64,
}

impl SimulatedCapture {
  pub fn new(min_accuracy: f32, max_accuracy: f32, seed: Option<u64>) -> Self {
    let (lo, hi) = if min_accuracy <= max_accuracy { (min_accuracy, max_accuracy) } else { (max_accuracy, min_accuracy) };
    Self {
      rng: seed.map(StdRng::seed_from_u64).unwrap_or_else(StdRng::from_entropy),
      min_accuracy: lo.clamp(0.0, 1.0),
      max_accuracy: hi.clamp(0.0, 1.0),
      active: None,
      next_handle: 1,
    }
  }

  pub fn from_settings(settings: &Settings) -> Self {
    Self::new(settings.simulated_accuracy_min, settings.simulated_accuracy_max, settings.shuffle_seed)
  }
}

impl AudioCapture for SimulatedCapture {
  #[instrument(level = "debug", skip(self))]
  fn start(&mut self, max_duration: Duration) -> LessonResult<CaptureHandle> {
    // a new recording replaces a dangling one
    if let Some(old) = self.active.take() {
      debug!(target: "exercise", handle = old.0, "Dropping previous capture");
    }
    let handle = CaptureHandle(self.next_handle);
    self.next_handle += 1;
    self.active = Some(handle);
    Ok(handle)
  }

  #[instrument(level = "debug", skip(self))]
  fn stop(&mut self, handle: CaptureHandle, expected_phrase: &str) -> LessonResult<CaptureResult> {
    if self.active != Some(handle) {
      return Err(LessonError::Capture(format!("no active capture for handle {}", handle.0)));
    }
    self.active = None;
    let accuracy = self.rng.gen_range(self.min_accuracy..=self.max_accuracy);
    Ok(CaptureResult { accuracy, recognized_text: expected_phrase.to_string() })
  }

  fn cancel(&mut self, handle: CaptureHandle) {
    if self.active == Some(handle) {
      self.active = None;
    }
  }

  fn is_capturing(&self) -> bool { self.active.is_some() }
}
