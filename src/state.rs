//! Application state: the loaded lesson, the shared progress record, and a
//! registry of live dialog sessions.
//!
//! The server models one learner. Every WebSocket owns its own sequencer,
//! but all of them read and write the same progress record; with
//! PROGRESS_PATH set that record is one JSON file held in memory and flushed
//! from the blocking pool. The registry mirrors each session's latest
//! progress so the HTTP side can report it.

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tokio::sync::RwLock;
use tracing::{error, info, instrument};

use crate::capture::{AudioCapture, SimulatedCapture};
use crate::config::{load_lesson_config_from_env, Lesson};
use crate::ledger::{Ledger, ProgressState};
use crate::sequencer::DialogState;
use crate::store::{KvStore, MemoryStore, SharedFileStore};

pub type SessionStore = Box<dyn KvStore + Send>;

/// Latest known state of one connected session.
#[derive(Clone, Debug)]
pub struct SessionSnapshot {
    pub state: DialogState,
    pub progress: ProgressState,
}

#[derive(Clone)]
pub struct AppState {
    pub lesson: Lesson,
    pub progress: Option<SharedFileStore>,
    pub sessions: Arc<RwLock<HashMap<String, SessionSnapshot>>>,
    reset_pending: Arc<AtomicBool>,
}

impl AppState {
    /// Build state from env: LESSON_CONFIG_PATH (falls back to the built-in
    /// lesson) and PROGRESS_PATH.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let lesson = load_lesson_config_from_env()
            .map(|cfg| cfg.into_lesson())
            .unwrap_or_else(Lesson::builtin);
        let progress_path = std::env::var("PROGRESS_PATH").ok().map(PathBuf::from);
        Self::with_lesson(lesson, progress_path)
    }

    pub fn with_lesson(lesson: Lesson, progress_path: Option<PathBuf>) -> Self {
        let lesson = match lesson.settings.validate() {
            Ok(()) => lesson,
            Err(e) => {
                error!(target: "lingo_quest", error = %e, "Lesson settings rejected; using built-in lesson");
                Lesson::builtin()
            }
        };
        info!(
            target: "lingo_quest",
            steps = lesson.script.len(),
            words = lesson.content.words.len(),
            sentences = lesson.content.sentences.len(),
            particles = lesson.content.particles.len(),
            pronunciations = lesson.content.pronunciations.len(),
            image_choices = lesson.content.image_choices.len(),
            progress_path = ?progress_path,
            "Lesson ready"
        );
        Self {
            lesson,
            progress: progress_path.as_deref().map(SharedFileStore::open),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            reset_pending: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Lesson for a new session. With a shared progress file only the first
    /// session of the process honours `reset_progress_on_start`; later ones
    /// resume the shared record instead of wiping it under a live session.
    pub fn session_lesson(&self) -> Lesson {
        let mut lesson = self.lesson.clone();
        if self.progress.is_some() && lesson.settings.reset_progress_on_start {
            lesson.settings.reset_progress_on_start = self.reset_pending.swap(false, Ordering::SeqCst);
        }
        lesson
    }

    /// Progress store for a new session: the shared file when configured, memory otherwise.
    pub fn open_store(&self) -> SessionStore {
        match &self.progress {
            Some(shared) => Box::new(shared.clone()),
            None => Box::new(MemoryStore::new()),
        }
    }

    pub fn open_capture(&self) -> Box<dyn AudioCapture + Send> {
        Box::new(SimulatedCapture::from_settings(&self.lesson.settings))
    }

    /// Progress as last recorded in the shared store (zeros when nothing was saved).
    pub fn saved_progress(&self) -> ProgressState {
        let store = self.open_store();
        let mut ledger = Ledger::new();
        ledger.restore(&store);
        ledger.progress().clone()
    }

    /// Persist pending progress writes without blocking the runtime.
    pub async fn flush_progress(&self) {
        if let Some(shared) = &self.progress {
            if let Err(e) = shared.flush().await {
                error!(target: "ledger", error = %e, "Progress flush failed");
            }
        }
    }

    pub async fn update_session(&self, id: &str, snapshot: SessionSnapshot) {
        self.sessions.write().await.insert(id.to_string(), snapshot);
    }

    pub async fn remove_session(&self, id: &str) {
        self.sessions.write().await.remove(id);
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for AppState {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::KEY_XP;
    use crate::store::JsonFileStore;

    #[test]
    fn memory_store_without_path() {
        let state = AppState::with_lesson(Lesson::builtin(), None);
        assert_eq!(state.saved_progress(), ProgressState::default());
        assert!(!state.lesson.script.is_empty());
        assert!(state.session_lesson().settings.reset_progress_on_start);
        assert!(state.session_lesson().settings.reset_progress_on_start);
    }

    #[tokio::test]
    async fn sessions_share_one_progress_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        let state = AppState::with_lesson(Lesson::builtin(), Some(path.clone()));

        let mut first = state.open_store();
        first.set(KEY_XP, "120".into()).unwrap();
        let second = state.open_store();
        assert_eq!(second.get(KEY_XP).as_deref(), Some("120"));
        assert_eq!(state.saved_progress().xp, 120);

        state.flush_progress().await;
        assert_eq!(JsonFileStore::open(&path).get(KEY_XP).as_deref(), Some("120"));
    }

    #[test]
    fn reset_applies_to_the_first_session_only() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::with_lesson(Lesson::builtin(), Some(dir.path().join("progress.json")));
        assert!(state.session_lesson().settings.reset_progress_on_start);
        assert!(!state.session_lesson().settings.reset_progress_on_start);
        assert!(!state.clone().session_lesson().settings.reset_progress_on_start);
    }

    #[tokio::test]
    async fn session_registry() {
        let state = AppState::with_lesson(Lesson::builtin(), None);
        let snap = SessionSnapshot { state: DialogState::ShowingStep, progress: ProgressState::default() };
        state.update_session("a", snap).await;
        assert_eq!(state.session_count().await, 1);
        let seen = state.sessions.read().await.get("a").map(|s| s.state);
        assert_eq!(seen, Some(DialogState::ShowingStep));
        state.remove_session("a").await;
        assert_eq!(state.session_count().await, 0);
    }
}
