//! HTTP endpoint handlers. Stateless checks against the loaded lesson plus a
//! read-only view of saved progress; the dialog itself runs over `/ws`.

use std::sync::Arc;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::{info, instrument, warn};

use crate::evaluator::{evaluate_pronunciation, evaluate_sentence, pronunciation_text_matches};
use crate::protocol::*;
use crate::state::AppState;
use crate::util::join_words;

type ApiError = (StatusCode, Json<ErrorOut>);

fn not_found(what: &str, index: usize) -> ApiError {
  warn!(target: "lingo_quest", what, index, "Unknown exercise requested");
  (StatusCode::NOT_FOUND, Json(ErrorOut { message: format!("no {what} exercise at index {index}") }))
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_get_script(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(ScriptOut {
    steps: state.lesson.script.as_ref().clone(),
    content: state.lesson.content.as_ref().clone(),
  })
}

#[instrument(level = "info", skip(state, body), fields(index = body.index, words = body.words.len()))]
pub async fn http_post_sentence(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SentenceIn>,
) -> Result<Json<SentenceOut>, ApiError> {
  let exercise = state.lesson.content.sentences.get(body.index).ok_or_else(|| not_found("sentence", body.index))?;
  let correct = evaluate_sentence(&body.words, exercise);
  info!(target: "exercise", index = body.index, %correct, "HTTP sentence evaluated");
  Ok(Json(SentenceOut {
    correct,
    expected: exercise.correct_foreign.clone(),
    submitted: join_words(&body.words),
  }))
}

#[instrument(level = "info", skip(state, body), fields(index = body.index, accuracy = body.accuracy))]
pub async fn http_post_pronunciation(
  State(state): State<Arc<AppState>>,
  Json(body): Json<PronunciationIn>,
) -> Result<Json<PronunciationOut>, ApiError> {
  let exercise = state.lesson.content.pronunciations.get(body.index).ok_or_else(|| not_found("pronunciation", body.index))?;
  let default_required = state.lesson.settings.required_accuracy;
  let correct = evaluate_pronunciation(body.accuracy, &body.recognized_text, exercise, default_required);
  info!(target: "exercise", index = body.index, %correct, "HTTP pronunciation evaluated");
  Ok(Json(PronunciationOut {
    correct,
    accuracy: body.accuracy,
    required: exercise.required_accuracy.unwrap_or(default_required),
    text_matches: pronunciation_text_matches(&body.recognized_text, &exercise.foreign_phrase),
  }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_progress(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let saved = to_progress_out(&state.saved_progress());
  let active_sessions = state.session_count().await;
  Json(ProgressSummaryOut { saved, active_sessions })
}
