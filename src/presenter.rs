//! Presentation capability consumed by the sequencer and the exercise hosts.
//!
//! The core never lays anything out; it emits `Presentation` values and the
//! front end (WebSocket client, tests) decides how to render them.

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::AssetRef;

/// Which panel is on screen. At most one exercise view is visible.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
  Hidden,
  Dialog,
  WordCard,
  SentenceBuilder,
  ParticleQuiz,
  Pronunciation,
  TranslationChoice,
  Reward,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
  Neutral,
  Pending,
  Success,
  Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Highlight {
  Normal,
  Correct,
  Wrong,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Presentation {
  View { view: View },
  /// Dialog line; `text` is partial while the typing reveal runs.
  Step { speaker: String, text: String },
  Prompt { title: String, detail: String },
  Choices { options: Vec<String> },
  Image { image: AssetRef },
  /// Sentence assembled so far from the word bank.
  Constructed { text: String },
  Slider { value: f32 },
  Highlight { option: usize, color: Highlight },
  Feedback { text: String, tone: Tone },
  RecordingControls { can_start: bool, can_stop: bool },
  RecordingStatus { text: String },
  Stats { xp: u64, coins: u64 },
  PlayAudio { clip: AssetRef },
  DialogClosed { finished: bool },
}

pub trait Presenter {
  fn present(&mut self, p: Presentation);

  fn show_view(&mut self, view: View) { self.present(Presentation::View { view }) }

  fn show_text(&mut self, speaker: &str, text: &str) {
    self.present(Presentation::Step { speaker: speaker.to_string(), text: text.to_string() })
  }

  fn show_prompt(&mut self, title: &str, detail: &str) {
    self.present(Presentation::Prompt { title: title.to_string(), detail: detail.to_string() })
  }

  fn show_choices(&mut self, options: &[String]) { self.present(Presentation::Choices { options: options.to_vec() }) }

  fn show_image(&mut self, image: &AssetRef) { self.present(Presentation::Image { image: image.clone() }) }

  fn show_constructed(&mut self, text: &str) { self.present(Presentation::Constructed { text: text.to_string() }) }

  fn set_slider_value(&mut self, value: f32) { self.present(Presentation::Slider { value }) }

  fn highlight(&mut self, option: usize, color: Highlight) { self.present(Presentation::Highlight { option, color }) }

  fn show_feedback(&mut self, text: &str, tone: Tone) {
    self.present(Presentation::Feedback { text: text.to_string(), tone })
  }

  fn clear_feedback(&mut self) { self.show_feedback("", Tone::Neutral) }

  fn set_recording_controls(&mut self, can_start: bool, can_stop: bool) {
    self.present(Presentation::RecordingControls { can_start, can_stop })
  }

  fn show_recording_status(&mut self, text: &str) {
    self.present(Presentation::RecordingStatus { text: text.to_string() })
  }

  fn show_stats(&mut self, xp: u64, coins: u64) { self.present(Presentation::Stats { xp, coins }) }

  fn play_audio(&mut self, clip: &AssetRef) {
    if !clip.is_empty() {
      self.present(Presentation::PlayAudio { clip: clip.clone() })
    }
  }

  fn dialog_closed(&mut self, finished: bool) { self.present(Presentation::DialogClosed { finished }) }
}

/// Streams presentations to a connection task.
#[derive(Clone, Debug)]
pub struct ChannelPresenter {
  tx: mpsc::UnboundedSender<Presentation>,
}

impl ChannelPresenter {
  pub fn new() -> (Self, mpsc::UnboundedReceiver<Presentation>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Self { tx }, rx)
  }
}

impl Presenter for ChannelPresenter {
  fn present(&mut self, p: Presentation) {
    if self.tx.send(p).is_err() {
      debug!(target: "dialog", "Presentation dropped: receiver gone");
    }
  }
}

/// Keeps every presentation in order. Handy for tests and replay.
#[derive(Clone, Debug, Default)]
pub struct RecordingPresenter {
  pub events: Vec<Presentation>,
}

impl RecordingPresenter {
  pub fn new() -> Self { Self::default() }

  pub fn drain(&mut self) -> Vec<Presentation> { std::mem::take(&mut self.events) }

  /// Most recent full dialog line.
  pub fn last_step_text(&self) -> Option<&str> {
    self.events.iter().rev().find_map(|e| match e {
      Presentation::Step { text, .. } => Some(text.as_str()),
      _ => None,
    })
  }

  pub fn last_view(&self) -> Option<View> {
    self.events.iter().rev().find_map(|e| match e {
      Presentation::View { view } => Some(*view),
      _ => None,
    })
  }

  pub fn last_choices(&self) -> Option<&[String]> {
    self.events.iter().rev().find_map(|e| match e {
      Presentation::Choices { options } => Some(options.as_slice()),
      _ => None,
    })
  }

  pub fn last_feedback(&self) -> Option<(&str, Tone)> {
    self.events.iter().rev().find_map(|e| match e {
      Presentation::Feedback { text, tone } => Some((text.as_str(), *tone)),
      _ => None,
    })
  }

  pub fn last_recording_controls(&self) -> Option<(bool, bool)> {
    self.events.iter().rev().find_map(|e| match e {
      Presentation::RecordingControls { can_start, can_stop } => Some((*can_start, *can_stop)),
      _ => None,
    })
  }
}

impl Presenter for RecordingPresenter {
  fn present(&mut self, p: Presentation) {
    self.events.push(p);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn recording_presenter_keeps_order() {
    let mut p = RecordingPresenter::new();
    p.show_view(View::Dialog);
    p.show_text("Гид", "Привет!");
    p.show_feedback("ok", Tone::Success);
    assert_eq!(p.last_view(), Some(View::Dialog));
    assert_eq!(p.last_step_text(), Some("Привет!"));
    assert_eq!(p.last_feedback(), Some(("ok", Tone::Success)));
    assert_eq!(p.drain().len(), 3);
    assert!(p.events.is_empty());
  }

  #[test]
  fn empty_audio_is_not_played() {
    let mut p = RecordingPresenter::new();
    p.play_audio(&AssetRef::default());
    assert!(p.events.is_empty());
  }

  #[tokio::test]
  async fn channel_presenter_forwards() {
    let (mut p, mut rx) = ChannelPresenter::new();
    p.show_stats(150, 75);
    assert_eq!(rx.recv().await, Some(Presentation::Stats { xp: 150, coins: 75 }));
  }

  #[test]
  fn presentation_json_is_tagged() {
    let json = serde_json::to_value(Presentation::Highlight { option: 2, color: Highlight::Wrong }).unwrap();
    assert_eq!(json, serde_json::json!({ "kind": "highlight", "option": 2, "color": "wrong" }));
  }
}
