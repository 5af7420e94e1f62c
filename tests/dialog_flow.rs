//! End-to-end dialog sessions driven through the public API.

use std::collections::VecDeque;
use std::time::Duration;

use lingo_quest::capture::{AudioCapture, CaptureHandle, CaptureResult, SimulatedCapture};
use lingo_quest::config::{Lesson, Rewards, Settings};
use lingo_quest::domain::{AssetRef, DialogAction, DialogStep, LessonContent, PronunciationExercise, SentenceExercise};
use lingo_quest::error::{LessonError, LessonResult};
use lingo_quest::hosts::{ExerciseKind, LearnerInput, Outcome};
use lingo_quest::ledger::{KEY_COINS, KEY_STEP, KEY_XP};
use lingo_quest::presenter::{RecordingPresenter, Tone, View};
use lingo_quest::seeds::GUIDE;
use lingo_quest::sequencer::{DialogSequencer, DialogState};
use lingo_quest::store::{JsonFileStore, KvStore, MemoryStore};

/// Capture whose results are queued up front; `None` makes `start` fail.
struct ScriptedCapture {
  takes: VecDeque<Option<f32>>,
  pending: Option<f32>,
  active: Option<CaptureHandle>,
}

impl ScriptedCapture {
  fn new(takes: &[Option<f32>]) -> Self {
    Self { takes: takes.iter().copied().collect(), pending: None, active: None }
  }
}

impl AudioCapture for ScriptedCapture {
  fn start(&mut self, _max: Duration) -> LessonResult<CaptureHandle> {
    match self.takes.pop_front().flatten() {
      Some(acc) => {
        self.pending = Some(acc);
        self.active = Some(CaptureHandle(1));
        Ok(CaptureHandle(1))
      }
      None => Err(LessonError::Capture("no microphone".into())),
    }
  }

  fn stop(&mut self, handle: CaptureHandle, expected: &str) -> LessonResult<CaptureResult> {
    if self.active.take() != Some(handle) {
      return Err(LessonError::Capture("not recording".into()));
    }
    Ok(CaptureResult { accuracy: self.pending.take().unwrap_or(0.0), recognized_text: expected.to_string() })
  }

  fn cancel(&mut self, _handle: CaptureHandle) { self.active = None; }

  fn is_capturing(&self) -> bool { self.active.is_some() }
}

fn sentence(foreign: &str) -> SentenceExercise {
  SentenceExercise {
    prompt_native: "…".into(),
    correct_foreign: foreign.into(),
    word_bank: foreign.split_whitespace().map(String::from).chain(["tea".to_string()]).collect(),
  }
}

fn pronunciation() -> PronunciationExercise {
  PronunciationExercise {
    foreign_phrase: "I want coffee".into(),
    native_translation: "Я хочу кофе".into(),
    reference_audio: AssetRef::new("audio/i_want_coffee"),
    required_accuracy: Some(0.7),
  }
}

fn lesson(settings: Settings, script: Vec<DialogStep>) -> Lesson {
  let content = LessonContent {
    sentences: vec![sentence("I want coffee")],
    pronunciations: vec![pronunciation()],
    ..LessonContent::default()
  };
  Lesson::new(settings, Rewards::default(), content, script)
}

fn pick(d: &mut DialogSequencer<RecordingPresenter, impl KvStore>, words: &str) -> Outcome {
  for w in words.split_whitespace() {
    d.handle_input(&LearnerInput::SelectWord { word: w.into() });
  }
  d.handle_input(&LearnerInput::SubmitSentence)
}

fn index_of(id: &str) -> usize {
  id.rsplit('_').next().and_then(|n| n.parse().ok()).unwrap()
}

/// Answers whatever exercise is open, correctly.
fn solve(d: &mut DialogSequencer<RecordingPresenter, MemoryStore>) {
  let (kind, id) = d.active_exercise().map(|(k, id)| (k, id.to_string())).unwrap();
  let i = index_of(&id);
  let outcome = match kind {
    ExerciseKind::Word => d.handle_input(&LearnerInput::RememberWord),
    ExerciseKind::Sentence => {
      let answer = d.content().sentences[i].correct_foreign.clone();
      pick(d, &answer)
    }
    ExerciseKind::Particle => {
      let yes = d.content().particles[i].requires_particle;
      d.handle_input(&LearnerInput::AnswerParticle { yes })
    }
    ExerciseKind::Pronunciation => {
      d.handle_input(&LearnerInput::RecordStart);
      d.handle_input(&LearnerInput::RecordStop)
    }
    ExerciseKind::ImageChoice => {
      let label = d.content().image_choices[i].correct_label.clone();
      let index = d.presenter().last_choices().unwrap().iter().position(|o| *o == label).unwrap();
      d.handle_input(&LearnerInput::SelectChoice { index })
    }
    ExerciseKind::Reward => Outcome::Correct,
  };
  assert_eq!(outcome, Outcome::Correct, "{id}");
  d.tick(Duration::from_secs(3));
}

#[test]
fn three_step_dialog_with_sentence_exercise() {
  let script = vec![
    DialogStep::line("A", GUIDE),
    DialogStep::with_action("B", GUIDE, DialogAction::StartSentenceExercise),
    DialogStep::line("C", GUIDE),
  ];
  let mut d = DialogSequencer::new(
    lesson(Settings::default(), script),
    RecordingPresenter::new(),
    MemoryStore::new(),
    Box::new(SimulatedCapture::new(0.9, 0.9, None)),
  );

  d.start_dialog();
  assert_eq!(d.state(), DialogState::ShowingStep);
  assert_eq!(d.presenter().last_step_text(), Some("A"));

  assert!(d.continue_dialog());
  assert_eq!(d.state(), DialogState::AwaitingExercise);
  assert_eq!(d.presenter().last_view(), Some(View::SentenceBuilder));

  assert_eq!(pick(&mut d, "I want tea"), Outcome::Incorrect);
  assert_eq!(d.state(), DialogState::AwaitingExercise);
  d.handle_input(&LearnerInput::ResetSentence);
  assert_eq!(pick(&mut d, "I want coffee"), Outcome::Correct);

  d.tick(Duration::from_millis(1000));
  assert_eq!(d.state(), DialogState::AwaitingExercise);
  d.tick(Duration::from_millis(500));
  assert_eq!(d.state(), DialogState::ShowingStep);
  assert_eq!(d.presenter().last_step_text(), Some("C"));
  assert!(d.ledger().is_completed("sentence_0"));

  assert!(d.continue_dialog());
  assert_eq!(d.state(), DialogState::Ended);
  assert_eq!(d.store().get(KEY_STEP).as_deref(), Some("3"));
  assert_eq!(d.take_completions().len(), 1);
}

#[test]
fn built_in_lesson_plays_to_the_end() {
  let mut d = DialogSequencer::new(
    Lesson::builtin(),
    RecordingPresenter::new(),
    MemoryStore::new(),
    Box::new(SimulatedCapture::new(0.95, 0.95, None)),
  );
  d.start_dialog();

  let mut guard = 0;
  while d.state() != DialogState::Ended {
    guard += 1;
    assert!(guard < 200, "dialog did not finish");
    match d.state() {
      DialogState::ShowingStep => {
        d.continue_dialog();
      }
      DialogState::AwaitingExercise => solve(&mut d),
      other => panic!("unexpected state {other:?}"),
    }
  }

  assert_eq!((d.ledger().xp(), d.ledger().coins()), (150, 75));
  assert_eq!(d.ledger().current_step(), d.script().len());
  for id in ["word_0", "pronunciation_0", "image_choice_0", "sentence_3", "particle_3"] {
    assert!(d.ledger().is_completed(id), "{id}");
  }
  assert!(d.ledger().progress().learned_words.contains("want"));
  assert_eq!(d.store().get(KEY_XP).as_deref(), Some("150"));
  assert_eq!(d.store().get(KEY_COINS).as_deref(), Some("75"));
}

#[test]
fn microphone_failure_keeps_exercise_open() {
  let script = vec![DialogStep::with_action("Скажи", GUIDE, DialogAction::StartPronunciationExercise)];
  let mut d = DialogSequencer::new(
    lesson(Settings::default(), script),
    RecordingPresenter::new(),
    MemoryStore::new(),
    Box::new(ScriptedCapture::new(&[None, Some(0.5), Some(0.9)])),
  );
  d.start_dialog();

  assert_eq!(d.handle_input(&LearnerInput::RecordStart), Outcome::Pending);
  assert_eq!(d.presenter().last_feedback().map(|f| f.1), Some(Tone::Error));
  assert_eq!(d.presenter().last_recording_controls(), Some((true, false)));

  d.handle_input(&LearnerInput::RecordStart);
  assert_eq!(d.handle_input(&LearnerInput::RecordStop), Outcome::Incorrect);
  assert_eq!(d.state(), DialogState::AwaitingExercise);

  d.handle_input(&LearnerInput::RecordStart);
  assert_eq!(d.handle_input(&LearnerInput::RecordStop), Outcome::Correct);
  d.tick(Duration::from_secs(2));
  assert_eq!(d.state(), DialogState::Ended);
}

#[test]
fn recording_is_cut_off_at_the_limit() {
  let script = vec![
    DialogStep::with_action("Скажи", GUIDE, DialogAction::StartPronunciationExercise),
    DialogStep::line("Готово", GUIDE),
  ];
  let settings = Settings { max_recording_secs: 5.0, ..Settings::default() };
  let mut d = DialogSequencer::new(
    lesson(settings, script),
    RecordingPresenter::new(),
    MemoryStore::new(),
    Box::new(ScriptedCapture::new(&[Some(0.8)])),
  );
  d.start_dialog();
  d.handle_input(&LearnerInput::RecordStart);

  for _ in 0..4 {
    d.tick(Duration::from_secs(1));
  }
  assert_eq!(d.state(), DialogState::AwaitingExercise);
  d.tick(Duration::from_secs(1));
  // scored on the cutoff tick; completion follows after the feedback delay
  d.tick(Duration::from_secs(2));
  assert_eq!(d.state(), DialogState::ShowingStep);
  assert_eq!(d.presenter().last_step_text(), Some("Готово"));
}

#[test]
fn progress_survives_a_restart_unless_reset() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("progress.json");
  let script = vec![
    DialogStep::with_action("Награда", GUIDE, DialogAction::ShowReward),
    DialogStep::line("Дальше", GUIDE),
    DialogStep::line("Конец", GUIDE),
  ];
  let keep = Settings { reset_progress_on_start: false, ..Settings::default() };

  let mut first = DialogSequencer::new(
    lesson(keep.clone(), script.clone()),
    RecordingPresenter::new(),
    JsonFileStore::open(&path),
    Box::new(SimulatedCapture::new(0.9, 0.9, None)),
  );
  first.start_dialog();
  first.tick(Duration::from_secs(3));
  assert_eq!(first.ledger().current_step(), 1);
  first.close_dialog();

  let mut second = DialogSequencer::new(
    lesson(keep, script.clone()),
    RecordingPresenter::new(),
    JsonFileStore::open(&path),
    Box::new(SimulatedCapture::new(0.9, 0.9, None)),
  );
  assert_eq!((second.ledger().xp(), second.ledger().coins()), (50, 25));
  assert!(second.ledger().progress().last_saved.is_some());
  second.start_dialog();
  assert_eq!(second.presenter().last_step_text(), Some("Дальше"));

  let third = DialogSequencer::new(
    lesson(Settings::default(), script),
    RecordingPresenter::new(),
    JsonFileStore::open(&path),
    Box::new(SimulatedCapture::new(0.9, 0.9, None)),
  );
  assert_eq!(third.ledger().xp(), 0);
  assert_eq!(third.ledger().current_step(), 0);
  assert_eq!(JsonFileStore::open(&path).get(KEY_XP), None);
}
