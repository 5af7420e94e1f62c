//! Dialog step sequencer: walks the NPC script one step at a time and hands
//! control to an exercise host whenever a step carries an action.
//!
//! States:
//!   Inactive ──start──▶ ShowingStep ──action step──▶ AwaitingExercise
//!       ▲                    │  ▲                          │
//!       └──────close─────────┘  └──── exercise completed ──┘
//!   any advance past the last step ──▶ Ended (progress persisted)
//!
//! The sequencer is the single mutator of progress. It is driven by explicit
//! calls (start/continue/skip/close, learner input) and by `tick`, which
//! feeds elapsed frame time into feedback delays, the typing reveal and the
//! recording cutoff.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::capture::AudioCapture;
use crate::config::Lesson;
use crate::domain::{DialogAction, DialogStep, LessonContent};
use crate::error::{LessonError, LessonResult};
use crate::hosts::{
  ExerciseCompleted, ExerciseHost, ExerciseKind, HostContext, ImageChoiceHost, LearnerInput, Outcome, ParticleHost,
  PronunciationHost, RewardHost, SentenceHost, WordHost,
};
use crate::ledger::Ledger;
use crate::presenter::{Presenter, View};
use crate::store::KvStore;
use crate::timer::{TimerId, Timers};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogState {
  Inactive,
  ShowingStep,
  AwaitingExercise,
  Ended,
}

/// Character-by-character reveal of the current line.
struct Reveal {
  speaker: String,
  chars: Vec<char>,
  shown: usize,
  interval: Duration,
  carry: Duration,
}

/// Item index for a step of a Start/Continue list: the `start` step opens
/// item 0 and each `cont` step after it opens the next one. Derived from the
/// script alone, so a resumed or reopened step gets the same item.
fn list_position(script: &[DialogStep], step: usize, start: DialogAction, cont: DialogAction) -> usize {
  let mut continues = 0;
  for s in script.iter().take(step + 1).rev() {
    if s.action == start {
      return continues;
    }
    if s.action == cont {
      continues += 1;
    }
  }
  continues.saturating_sub(1)
}

/// Number of earlier steps carrying `action`.
fn occurrence(script: &[DialogStep], step: usize, action: DialogAction) -> usize {
  script.iter().take(step).filter(|s| s.action == action).count()
}

fn boxed<H: ExerciseHost + 'static>(host: H) -> Box<dyn ExerciseHost> {
  Box::new(host)
}

fn missing(what: &str, index: usize) -> LessonError {
  LessonError::MissingContent(format!("no {what} exercise at index {index}"))
}

pub struct DialogSequencer<P, S> {
  lesson: Lesson,
  presenter: P,
  store: S,
  capture: Box<dyn AudioCapture + Send>,
  ledger: Ledger,
  rng: StdRng,
  state: DialogState,
  active: Option<Box<dyn ExerciseHost>>,
  /// Set once the active host answered correctly; its completion is queued.
  completion: Option<TimerId>,
  timers: Timers<usize>,
  reveal: Option<Reveal>,
  completed: Vec<ExerciseCompleted>,
}

impl<P: Presenter, S: KvStore> DialogSequencer<P, S> {
  /// Build a session. Progress is restored from `store`, or the store is
  /// wiped when the lesson says to reset on start.
  #[instrument(level = "info", skip_all, fields(steps = lesson.script.len()))]
  pub fn new(lesson: Lesson, presenter: P, mut store: S, capture: Box<dyn AudioCapture + Send>) -> Self {
    let mut ledger = Ledger::open(&mut store, lesson.settings.reset_progress_on_start);
    let len = lesson.script.len();
    if ledger.current_step() > len {
      warn!(target: "ledger", restored = ledger.current_step(), len, "Saved step is past the script; clamped");
      ledger.set_current_step(len);
    }
    let rng = lesson
      .settings
      .shuffle_seed
      .map(StdRng::seed_from_u64)
      .unwrap_or_else(StdRng::from_entropy);
    info!(target: "dialog", step = ledger.current_step(), xp = ledger.xp(), coins = ledger.coins(), "Dialog session created");
    Self {
      lesson,
      presenter,
      store,
      capture,
      ledger,
      rng,
      state: DialogState::Inactive,
      active: None,
      completion: None,
      timers: Timers::new(),
      reveal: None,
      completed: Vec::new(),
    }
  }

  pub fn state(&self) -> DialogState { self.state }

  pub fn is_active(&self) -> bool {
    matches!(self.state, DialogState::ShowingStep | DialogState::AwaitingExercise)
  }

  pub fn ledger(&self) -> &Ledger { &self.ledger }

  pub fn presenter(&self) -> &P { &self.presenter }

  pub fn presenter_mut(&mut self) -> &mut P { &mut self.presenter }

  pub fn store(&self) -> &S { &self.store }

  pub fn script(&self) -> &[DialogStep] { &self.lesson.script }

  pub fn content(&self) -> &LessonContent { &self.lesson.content }

  pub fn current_step(&self) -> Option<&DialogStep> { self.lesson.script.get(self.ledger.current_step()) }

  pub fn active_exercise(&self) -> Option<(ExerciseKind, &str)> {
    self.active.as_ref().map(|h| (h.kind(), h.exercise_id()))
  }

  pub fn is_revealing(&self) -> bool { self.reveal.is_some() }

  /// Completions since the last call, oldest first.
  pub fn take_completions(&mut self) -> Vec<ExerciseCompleted> { std::mem::take(&mut self.completed) }

  #[instrument(level = "info", skip(self), fields(step = self.ledger.current_step()))]
  pub fn start_dialog(&mut self) {
    if self.is_active() {
      debug!(target: "dialog", "start_dialog ignored: already active");
      return;
    }
    info!(target: "dialog", "Dialog started");
    self.state = DialogState::ShowingStep;
    self.presenter.show_view(View::Dialog);
    self.presenter.show_stats(self.ledger.xp(), self.ledger.coins());
    self.show_current_step();
  }

  /// Close from any state: the in-flight exercise is discarded without
  /// completion and progress is persisted.
  #[instrument(level = "info", skip(self), fields(step = self.ledger.current_step()))]
  pub fn close_dialog(&mut self) {
    if !self.is_active() {
      return;
    }
    self.discard_exercise();
    self.state = DialogState::Inactive;
    self.presenter.show_view(View::Hidden);
    self.presenter.dialog_closed(false);
    info!(target: "dialog", "Dialog closed");
    self.persist();
  }

  /// Learner pressed "next". Returns whether the dialog moved on.
  pub fn continue_dialog(&mut self) -> bool {
    if self.state != DialogState::ShowingStep {
      debug!(target: "dialog", state = ?self.state, "continue ignored");
      return false;
    }
    if self.finish_reveal() {
      return false;
    }
    self.advance();
    true
  }

  /// Learner pressed "skip": like continue, but never waits for a line to finish typing.
  pub fn skip_dialog(&mut self) -> bool {
    if self.state != DialogState::ShowingStep {
      debug!(target: "dialog", state = ?self.state, "skip ignored");
      return false;
    }
    self.reveal = None;
    if self.ledger.advance_step() >= self.lesson.script.len() {
      self.end_dialog();
    } else {
      self.show_current_step();
    }
    true
  }

  /// Deliver one learner input to the active exercise.
  pub fn handle_input(&mut self, input: &LearnerInput) -> Outcome {
    if self.state != DialogState::AwaitingExercise || self.completion.is_some() {
      debug!(target: "dialog", state = ?self.state, ?input, "input ignored");
      return Outcome::Pending;
    }
    let Some(outcome) = self.with_active(|host, cx| host.handle(input, cx)) else {
      return Outcome::Pending;
    };
    if outcome == Outcome::Correct {
      self.on_correct();
    }
    outcome
  }

  /// Feed elapsed frame time: typing reveal, host ticks, due completions.
  pub fn tick(&mut self, elapsed: Duration) {
    let due = self.timers.advance(elapsed);
    self.tick_reveal(elapsed);

    if self.state == DialogState::AwaitingExercise && self.completion.is_none() {
      if let Some(Outcome::Correct) = self.with_active(|host, cx| host.on_tick(cx)) {
        self.on_correct();
      }
    }

    for step in due {
      self.complete_exercise(step);
    }
  }

  fn advance(&mut self) {
    self.ledger.advance_step();
    self.show_current_step();
  }

  /// Render the step at the current index, dispatching its action. Steps
  /// whose exercise can't run are skipped.
  fn show_current_step(&mut self) {
    loop {
      let index = self.ledger.current_step();
      let Some(step) = self.lesson.script.get(index).cloned() else {
        self.end_dialog();
        return;
      };
      debug!(target: "dialog", index, action = ?step.action, "Showing step");
      self.render_step(&step);
      self.state = DialogState::ShowingStep;
      if step.action == DialogAction::None {
        return;
      }
      match self.open_exercise(index, step.action) {
        Ok(()) => return,
        Err(e) => {
          warn!(target: "dialog", index, action = ?step.action, error = %e, "Exercise skipped");
          self.presenter.show_view(View::Dialog);
          self.ledger.advance_step();
        }
      }
    }
  }

  fn open_exercise(&mut self, step: usize, action: DialogAction) -> LessonResult<()> {
    let mut host = self.host_for(step, action)?;
    let outcome = {
      let mut cx = self.host_cx();
      host.begin(&mut cx)?
    };
    info!(target: "exercise", id = %host.exercise_id(), kind = ?host.kind(), step, "Exercise opened");
    self.active = Some(host);
    self.state = DialogState::AwaitingExercise;
    if outcome == Outcome::Correct {
      self.on_correct();
    }
    Ok(())
  }

  /// Map an action to a host loaded with the next unconsumed item of its list.
  fn host_for(&self, step: usize, action: DialogAction) -> LessonResult<Box<dyn ExerciseHost>> {
    let content = Arc::clone(&self.lesson.content);
    let script = self.lesson.script.as_slice();
    match action {
      DialogAction::None => Err(LessonError::MissingContent(format!("step {step} has no exercise"))),
      DialogAction::StartWordLearning => {
        let i = occurrence(script, step, action);
        let card = content.words.get(i).cloned().ok_or_else(|| missing("word", i))?;
        Ok(boxed(WordHost::new(i, card)))
      }
      DialogAction::StartSentenceExercise | DialogAction::ContinueSentenceExercise | DialogAction::FinalSentenceExercise => {
        let i = if action == DialogAction::FinalSentenceExercise {
          content.sentences.len().saturating_sub(1)
        } else {
          list_position(script, step, DialogAction::StartSentenceExercise, DialogAction::ContinueSentenceExercise)
        };
        let ex = content.sentences.get(i).cloned().ok_or_else(|| missing("sentence", i))?;
        Ok(boxed(SentenceHost::new(i, ex)))
      }
      DialogAction::StartToExercise | DialogAction::ContinueToExercise => {
        let i = list_position(script, step, DialogAction::StartToExercise, DialogAction::ContinueToExercise);
        let ex = content.particles.get(i).cloned().ok_or_else(|| missing("particle", i))?;
        Ok(boxed(ParticleHost::new(i, ex)))
      }
      DialogAction::StartPronunciationExercise => {
        // once the list runs out the last phrase is practised again
        let last = content.pronunciations.len().checked_sub(1).ok_or_else(|| missing("pronunciation", 0))?;
        let i = occurrence(script, step, action).min(last);
        let ex = content.pronunciations.get(i).cloned().ok_or_else(|| missing("pronunciation", i))?;
        Ok(boxed(PronunciationHost::new(i, ex)))
      }
      DialogAction::StartTranslationChoice => {
        let i = occurrence(script, step, action);
        let ex = content.image_choices.get(i).cloned().ok_or_else(|| missing("image choice", i))?;
        Ok(boxed(ImageChoiceHost::new(i, ex)))
      }
      DialogAction::ShowReward => Ok(boxed(RewardHost::new(step, self.lesson.rewards.reward))),
      DialogAction::ShowFinalReward => Ok(boxed(RewardHost::new(step, self.lesson.rewards.final_reward))),
    }
  }

  /// Queue completion of the active exercise after its feedback delay.
  fn on_correct(&mut self) {
    if self.completion.is_some() {
      return;
    }
    let Some(host) = &self.active else {
      return;
    };
    let step = self.ledger.current_step();
    let delay = host.feedback_delay();
    debug!(target: "exercise", id = %host.exercise_id(), ?delay, "Correct; completion queued");
    if delay.is_zero() {
      self.complete_exercise(step);
    } else {
      self.completion = Some(self.timers.schedule(delay, step));
    }
  }

  /// Resume the dialog after the exercise at `step`. Stale completions
  /// (dialog already moved or closed) are dropped.
  fn complete_exercise(&mut self, step: usize) {
    if self.state != DialogState::AwaitingExercise || self.ledger.current_step() != step {
      debug!(target: "dialog", step, "Stale completion dropped");
      return;
    }
    self.completion = None;
    let Some(host) = self.active.take() else {
      return;
    };
    let done = ExerciseCompleted {
      exercise_id: host.exercise_id().to_string(),
      kind: host.kind(),
      reward: host.reward(),
    };
    self.ledger.mark_exercise_completed(&done.exercise_id);
    info!(target: "exercise", id = %done.exercise_id, kind = ?done.kind, step, "Exercise completed");
    self.completed.push(done);

    self.state = DialogState::ShowingStep;
    self.presenter.show_view(View::Dialog);
    self.advance();
  }

  fn end_dialog(&mut self) {
    self.discard_exercise();
    self.state = DialogState::Ended;
    self.presenter.show_view(View::Hidden);
    self.presenter.dialog_closed(true);
    info!(target: "dialog", xp = self.ledger.xp(), coins = self.ledger.coins(), "All steps finished");
    self.persist();
  }

  fn discard_exercise(&mut self) {
    if let Some(timer) = self.completion.take() {
      self.timers.cancel(timer);
    }
    self.reveal = None;
    if let Some(mut host) = self.active.take() {
      info!(target: "exercise", id = %host.exercise_id(), "Exercise discarded");
      let mut cx = self.host_cx();
      host.cancel(&mut cx);
    }
  }

  fn persist(&mut self) {
    if let Err(e) = self.ledger.persist(&mut self.store) {
      error!(target: "ledger", error = %e, "Failed to persist progress");
    }
  }

  fn render_step(&mut self, step: &DialogStep) {
    match self.lesson.settings.typing_interval() {
      Some(interval) if !interval.is_zero() && !step.text.is_empty() => {
        self.presenter.show_text(&step.speaker, "");
        self.reveal = Some(Reveal {
          speaker: step.speaker.clone(),
          chars: step.text.chars().collect(),
          shown: 0,
          interval,
          carry: Duration::ZERO,
        });
      }
      _ => {
        self.reveal = None;
        self.presenter.show_text(&step.speaker, &step.text);
      }
    }
  }

  fn tick_reveal(&mut self, elapsed: Duration) {
    let Some(r) = self.reveal.as_mut() else {
      return;
    };
    r.carry += elapsed;
    let steps = (r.carry.as_nanos() / r.interval.as_nanos()) as usize;
    if steps == 0 {
      return;
    }
    r.carry = Duration::from_nanos((r.carry.as_nanos() % r.interval.as_nanos()) as u64);
    r.shown = r.shown.saturating_add(steps).min(r.chars.len());
    let text: String = r.chars[..r.shown].iter().collect();
    let done = r.shown == r.chars.len();
    self.presenter.show_text(&r.speaker, &text);
    if done {
      self.reveal = None;
    }
  }

  /// Show the whole line at once; returns false when nothing was typing.
  fn finish_reveal(&mut self) -> bool {
    let Some(r) = self.reveal.take() else {
      return false;
    };
    let text: String = r.chars.iter().collect();
    self.presenter.show_text(&r.speaker, &text);
    true
  }

  fn host_cx(&mut self) -> HostContext<'_> {
    HostContext {
      presenter: &mut self.presenter,
      capture: self.capture.as_mut(),
      ledger: &mut self.ledger,
      rng: &mut self.rng,
      settings: &self.lesson.settings,
      now: self.timers.now(),
    }
  }

  fn with_active<R>(&mut self, f: impl FnOnce(&mut dyn ExerciseHost, &mut HostContext<'_>) -> R) -> Option<R> {
    let mut host = self.active.take()?;
    let result = {
      let mut cx = self.host_cx();
      f(host.as_mut(), &mut cx)
    };
    self.active = Some(host);
    Some(result)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::capture::SimulatedCapture;
  use crate::config::{Rewards, Settings};
  use crate::domain::{ParticleExercise, Reward, SentenceExercise};
  use crate::presenter::RecordingPresenter;
  use crate::seeds::GUIDE;
  use crate::store::MemoryStore;

  fn content() -> LessonContent {
    LessonContent {
      sentences: vec![
        SentenceExercise {
          prompt_native: "Я хочу кофе".into(),
          correct_foreign: "I want coffee".into(),
          word_bank: vec!["I".into(), "want".into(), "coffee".into()],
        },
        SentenceExercise {
          prompt_native: "Я хочу пить".into(),
          correct_foreign: "I want to drink".into(),
          word_bank: vec!["I".into(), "want".into(), "to".into(), "drink".into()],
        },
      ],
      particles: vec![ParticleExercise {
        sentence_with_gap: "I want ____ drink".into(),
        requires_particle: true,
        explanation: String::new(),
      }],
      ..LessonContent::default()
    }
  }

  fn session(script: Vec<DialogStep>, settings: Settings) -> DialogSequencer<RecordingPresenter, MemoryStore> {
    let lesson = Lesson::new(settings, Rewards::default(), content(), script);
    DialogSequencer::new(
      lesson,
      RecordingPresenter::new(),
      MemoryStore::new(),
      Box::new(SimulatedCapture::new(0.9, 0.9, Some(3))),
    )
  }

  fn line(text: &str) -> DialogStep { DialogStep::line(text, GUIDE) }

  fn act(action: DialogAction) -> DialogStep { DialogStep::with_action("…", GUIDE, action) }

  fn answer_sentence(d: &mut DialogSequencer<RecordingPresenter, MemoryStore>, words: &str) -> Outcome {
    for w in words.split_whitespace() {
      d.handle_input(&LearnerInput::SelectWord { word: w.into() });
    }
    d.handle_input(&LearnerInput::SubmitSentence)
  }

  #[test]
  fn start_is_idempotent() {
    let mut d = session(vec![line("a"), line("b")], Settings::default());
    d.start_dialog();
    d.start_dialog();
    assert_eq!(d.state(), DialogState::ShowingStep);
    assert_eq!(d.ledger().current_step(), 0);
    let step_lines = d.presenter().events.iter().filter(|e| matches!(e, crate::presenter::Presentation::Step { .. })).count();
    assert_eq!(step_lines, 1);
  }

  #[test]
  fn continue_is_blocked_while_awaiting() {
    let mut d = session(vec![act(DialogAction::StartSentenceExercise), line("after")], Settings::default());
    d.start_dialog();
    assert_eq!(d.state(), DialogState::AwaitingExercise);
    assert!(!d.continue_dialog());
    assert!(!d.continue_dialog());
    assert!(!d.skip_dialog());
    assert_eq!(d.ledger().current_step(), 0);

    assert_eq!(answer_sentence(&mut d, "I want coffee"), Outcome::Correct);
    // inputs after a correct answer are latched out
    assert_eq!(d.handle_input(&LearnerInput::SubmitSentence), Outcome::Pending);
    d.tick(Duration::from_millis(1499));
    assert_eq!(d.ledger().current_step(), 0);
    d.tick(Duration::from_millis(1));
    assert_eq!(d.ledger().current_step(), 1);
    assert_eq!(d.state(), DialogState::ShowingStep);
    assert!(d.ledger().is_completed("sentence_0"));
  }

  #[test]
  fn continue_actions_walk_the_sentence_list() {
    let script = vec![
      act(DialogAction::StartSentenceExercise),
      act(DialogAction::ContinueSentenceExercise),
      act(DialogAction::ContinueSentenceExercise),
      line("end"),
    ];
    let mut d = session(script, Settings::default());
    d.start_dialog();
    assert_eq!(d.active_exercise(), Some((ExerciseKind::Sentence, "sentence_0")));
    answer_sentence(&mut d, "I want coffee");
    d.tick(Duration::from_secs(2));
    assert_eq!(d.active_exercise(), Some((ExerciseKind::Sentence, "sentence_1")));
    answer_sentence(&mut d, "I want to drink");
    d.tick(Duration::from_secs(2));
    // list exhausted: the third sentence step is skipped
    assert_eq!(d.ledger().current_step(), 3);
    assert_eq!(d.state(), DialogState::ShowingStep);
    assert_eq!(d.presenter().last_step_text(), Some("end"));
  }

  #[test]
  fn final_sentence_uses_last_item() {
    let mut d = session(vec![act(DialogAction::FinalSentenceExercise)], Settings::default());
    d.start_dialog();
    assert_eq!(d.active_exercise(), Some((ExerciseKind::Sentence, "sentence_1")));
  }

  #[test]
  fn missing_content_advances() {
    let script = vec![act(DialogAction::StartWordLearning), act(DialogAction::StartTranslationChoice), line("x")];
    let mut d = session(script, Settings::default());
    d.start_dialog();
    assert_eq!(d.ledger().current_step(), 2);
    assert_eq!(d.state(), DialogState::ShowingStep);
  }

  #[test]
  fn reward_steps_grant_and_auto_complete() {
    let script = vec![act(DialogAction::ShowReward), act(DialogAction::ShowFinalReward), line("bye")];
    let mut d = session(script, Settings::default());
    d.start_dialog();
    assert_eq!((d.ledger().xp(), d.ledger().coins()), (50, 25));
    assert_eq!(d.state(), DialogState::AwaitingExercise);
    d.tick(Duration::from_secs(3));
    assert_eq!((d.ledger().xp(), d.ledger().coins()), (150, 75));
    d.tick(Duration::from_secs(3));
    assert_eq!(d.ledger().current_step(), 2);

    let done = d.take_completions();
    assert_eq!(done.len(), 2);
    assert_eq!(done[0].reward, Some(Reward::new(50, 25)));
    assert_eq!(done[1].reward, Some(Reward::new(100, 50)));
  }

  #[test]
  fn close_discards_pending_completion() {
    let mut d = session(vec![act(DialogAction::StartToExercise), line("after")], Settings::default());
    d.start_dialog();
    assert_eq!(d.handle_input(&LearnerInput::AnswerParticle { yes: true }), Outcome::Correct);
    d.close_dialog();
    assert_eq!(d.state(), DialogState::Inactive);
    d.tick(Duration::from_secs(5));
    assert_eq!(d.ledger().current_step(), 0);
    assert!(!d.ledger().is_completed("particle_0"));
    assert_eq!(d.store().get(crate::ledger::KEY_STEP).as_deref(), Some("0"));

    // reopening shows the same exercise again
    d.start_dialog();
    assert_eq!(d.active_exercise(), Some((ExerciseKind::Particle, "particle_0")));
  }

  #[test]
  fn skip_past_last_step_ends() {
    let mut d = session(vec![line("only")], Settings::default());
    d.start_dialog();
    assert!(d.skip_dialog());
    assert_eq!(d.state(), DialogState::Ended);
    assert_eq!(d.store().get(crate::ledger::KEY_STEP).as_deref(), Some("1"));
    assert!(!d.continue_dialog());
  }

  #[test]
  fn typing_reveal_then_continue() {
    let settings = Settings { typing_speed_secs: 0.1, ..Settings::default() };
    let mut d = session(vec![line("abcd"), line("next")], settings);
    d.start_dialog();
    assert!(d.is_revealing());
    d.tick(Duration::from_millis(250));
    assert_eq!(d.presenter().last_step_text(), Some("ab"));

    // first continue completes the line, second one advances
    assert!(!d.continue_dialog());
    assert_eq!(d.presenter().last_step_text(), Some("abcd"));
    assert_eq!(d.ledger().current_step(), 0);
    assert!(d.continue_dialog());
    assert_eq!(d.ledger().current_step(), 1);

    d.tick(Duration::from_secs(1));
    assert_eq!(d.presenter().last_step_text(), Some("next"));
    assert!(!d.is_revealing());
  }

  fn resumed(script: Vec<DialogStep>, content: LessonContent, saved_step: &str) -> DialogSequencer<RecordingPresenter, MemoryStore> {
    let mut store = MemoryStore::new();
    store.set(crate::ledger::KEY_XP, "0".into()).unwrap();
    store.set(crate::ledger::KEY_STEP, saved_step.into()).unwrap();
    let settings = Settings { reset_progress_on_start: false, ..Settings::default() };
    DialogSequencer::new(
      Lesson::new(settings, Rewards::default(), content, script),
      RecordingPresenter::new(),
      store,
      Box::new(SimulatedCapture::new(0.9, 0.9, Some(3))),
    )
  }

  #[test]
  fn saved_step_past_the_end_is_clamped() {
    let mut d = resumed(vec![line("a"), line("b"), line("c")], content(), "99");
    assert_eq!(d.ledger().current_step(), 3);
    d.start_dialog();
    assert_eq!(d.state(), DialogState::Ended);
    assert_eq!(d.store().get(crate::ledger::KEY_STEP).as_deref(), Some("3"));
  }

  #[test]
  fn resumed_continue_step_opens_its_own_item() {
    let mut c = content();
    c.sentences.push(SentenceExercise {
      prompt_native: "Мы хотим есть".into(),
      correct_foreign: "We want to eat".into(),
      word_bank: vec!["We".into(), "want".into(), "to".into(), "eat".into()],
    });
    let script = vec![
      act(DialogAction::StartSentenceExercise),
      act(DialogAction::ContinueSentenceExercise),
      act(DialogAction::ContinueSentenceExercise),
    ];
    let mut d = resumed(script, c, "2");
    d.start_dialog();
    assert_eq!(d.active_exercise(), Some((ExerciseKind::Sentence, "sentence_2")));
  }

  #[test]
  fn list_position_counts_from_latest_start() {
    use DialogAction::*;
    let script: Vec<DialogStep> = [StartToExercise, ContinueToExercise, None, ContinueToExercise, StartToExercise, ContinueToExercise]
      .into_iter()
      .map(act)
      .collect();
    let pos = |step| list_position(&script, step, StartToExercise, ContinueToExercise);
    assert_eq!((pos(0), pos(1), pos(3)), (0, 1, 2));
    assert_eq!((pos(4), pos(5)), (0, 1));

    // a continue with no start before it opens the first item
    let orphan = vec![act(ContinueSentenceExercise), act(ContinueSentenceExercise)];
    assert_eq!(list_position(&orphan, 1, StartSentenceExercise, ContinueSentenceExercise), 1);
    assert_eq!(occurrence(&orphan, 1, ContinueSentenceExercise), 1);
  }
}
