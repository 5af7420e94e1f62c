//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{DialogStep, LessonContent};
use crate::hosts::{ExerciseCompleted, LearnerInput, Outcome};
use crate::ledger::ProgressState;
use crate::presenter::Presentation;
use crate::sequencer::DialogState;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    StartDialog,
    Continue,
    Skip,
    Close,
    /// Input for the open exercise, e.g.
    /// `{"type":"input","input":{"input":"select_word","word":"want"}}`.
    Input {
        input: LearnerInput,
    },
    GetProgress,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Session {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    /// One presentation command for the client to render.
    Present {
        event: Presentation,
    },
    State {
        state: DialogState,
        step: usize,
    },
    InputResult {
        outcome: Outcome,
    },
    ExerciseCompleted {
        completed: ExerciseCompleted,
    },
    Progress {
        progress: ProgressOut,
    },
    Error {
        message: String,
    },
}

// ---------- HTTP DTOs ----------

#[derive(Debug, Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct ScriptOut {
    pub steps: Vec<DialogStep>,
    pub content: LessonContent,
}

#[derive(Debug, Deserialize)]
pub struct SentenceIn {
    pub index: usize,
    pub words: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SentenceOut {
    pub correct: bool,
    pub expected: String,
    pub submitted: String,
}

#[derive(Debug, Deserialize)]
pub struct PronunciationIn {
    pub index: usize,
    pub accuracy: f32,
    #[serde(rename = "recognizedText")]
    pub recognized_text: String,
}

#[derive(Debug, Serialize)]
pub struct PronunciationOut {
    pub correct: bool,
    pub accuracy: f32,
    pub required: f32,
    #[serde(rename = "textMatches")]
    pub text_matches: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProgressOut {
    pub xp: u64,
    pub coins: u64,
    #[serde(rename = "currentStep")]
    pub current_step: usize,
    #[serde(rename = "completedExercises")]
    pub completed_exercises: Vec<String>,
    #[serde(rename = "learnedWords")]
    pub learned_words: Vec<String>,
    #[serde(rename = "lastSaved")]
    pub last_saved: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProgressSummaryOut {
    pub saved: ProgressOut,
    #[serde(rename = "activeSessions")]
    pub active_sessions: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorOut {
    pub message: String,
}

pub fn to_progress_out(p: &ProgressState) -> ProgressOut {
    ProgressOut {
        xp: p.xp,
        coins: p.coins,
        current_step: p.current_step,
        completed_exercises: p.completed_exercises.iter().cloned().collect(),
        learned_words: p.learned_words.iter().cloned().collect(),
        last_saved: p.last_saved.map(|t| t.to_rfc3339()),
    }
}
