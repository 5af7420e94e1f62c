//! WebSocket dialog session. Each socket owns one sequencer driven by client
//! messages and a frame ticker; presentation commands are streamed back as
//! they are produced. Progress goes to the shared store and is flushed after
//! every loop turn.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::presenter::{ChannelPresenter, Presentation};
use crate::protocol::{to_progress_out, ClientWsMessage, ServerWsMessage};
use crate::sequencer::{DialogSequencer, DialogState};
use crate::state::{AppState, SessionSnapshot, SessionStore};
use crate::util::trunc_for_log;

type Session = DialogSequencer<ChannelPresenter, SessionStore>;

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "lingo_quest", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  let session_id = Uuid::new_v4().to_string();
  info!(target: "lingo_quest", %session_id, "WebSocket connected");

  let (presenter, mut events) = ChannelPresenter::new();
  let mut dialog: Session = DialogSequencer::new(state.session_lesson(), presenter, state.open_store(), state.open_capture());

  let mut ticker = interval(state.lesson.settings.frame_interval());
  ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
  let mut last_tick = Instant::now();
  let mut reported: Option<(DialogState, usize)> = None;

  if send(&mut socket, &ServerWsMessage::Session { session_id: session_id.clone() }).await.is_err() {
    return;
  }

  loop {
    tokio::select! {
      incoming = socket.recv() => {
        let Some(Ok(msg)) = incoming else { break };
        match msg {
          Message::Text(txt) => {
            let reply = match serde_json::from_str::<ClientWsMessage>(&txt) {
              Ok(incoming) => {
                debug!(target: "lingo_quest", %session_id, raw = %trunc_for_log(&txt, 200), "WS received");
                handle_client_ws(incoming, &mut dialog)
              }
              Err(e) => Some(ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }),
            };
            if let Some(reply) = reply {
              if send(&mut socket, &reply).await.is_err() {
                break;
              }
            }
          }
          Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
          Message::Close(_) => break,
          _ => {}
        }
      }
      _ = ticker.tick() => {
        let now = Instant::now();
        dialog.tick(now - last_tick);
        last_tick = now;
      }
    }

    let outgoing = drain_outgoing(&mut dialog, &mut events, &mut reported);
    state.flush_progress().await;
    if send_all(&mut socket, &outgoing).await.is_err() {
      break;
    }
    let snapshot = SessionSnapshot { state: dialog.state(), progress: dialog.ledger().progress().clone() };
    state.update_session(&session_id, snapshot).await;
  }

  disconnect(&mut dialog);
  state.flush_progress().await;
  state.remove_session(&session_id).await;
  info!(target: "lingo_quest", %session_id, "WebSocket disconnected");
}

/// Apply one client message to the session; returns the direct reply, if any.
fn handle_client_ws(msg: ClientWsMessage, dialog: &mut Session) -> Option<ServerWsMessage> {
  match msg {
    ClientWsMessage::Ping => Some(ServerWsMessage::Pong),
    ClientWsMessage::StartDialog => {
      dialog.start_dialog();
      None
    }
    ClientWsMessage::Continue => {
      dialog.continue_dialog();
      None
    }
    ClientWsMessage::Skip => {
      dialog.skip_dialog();
      None
    }
    ClientWsMessage::Close => {
      dialog.close_dialog();
      None
    }
    ClientWsMessage::Input { input } => {
      let outcome = dialog.handle_input(&input);
      Some(ServerWsMessage::InputResult { outcome })
    }
    ClientWsMessage::GetProgress => Some(ServerWsMessage::Progress { progress: to_progress_out(dialog.ledger().progress()) }),
  }
}

/// Leaving mid-dialog counts as closing it: the open exercise is dropped, progress saved.
fn disconnect(dialog: &mut Session) {
  dialog.close_dialog();
}

/// Everything the session produced since the last turn, in send order:
/// presentation commands, completed exercises, then the state if it changed.
fn drain_outgoing(
  dialog: &mut Session,
  events: &mut UnboundedReceiver<Presentation>,
  reported: &mut Option<(DialogState, usize)>,
) -> Vec<ServerWsMessage> {
  let mut out = Vec::new();
  while let Ok(event) = events.try_recv() {
    out.push(ServerWsMessage::Present { event });
  }
  out.extend(dialog.take_completions().into_iter().map(|completed| ServerWsMessage::ExerciseCompleted { completed }));
  let current = (dialog.state(), dialog.ledger().current_step());
  if *reported != Some(current) {
    *reported = Some(current);
    out.push(ServerWsMessage::State { state: current.0, step: current.1 });
  }
  out
}

async fn send_all(socket: &mut WebSocket, msgs: &[ServerWsMessage]) -> Result<(), axum::Error> {
  for msg in msgs {
    send(socket, msg).await?;
  }
  Ok(())
}

async fn send(socket: &mut WebSocket, msg: &ServerWsMessage) -> Result<(), axum::Error> {
  let out = serde_json::to_string(msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  });
  socket.send(Message::Text(out)).await.map_err(|e| {
    error!(target: "lingo_quest", error = %e, "WS send error");
    e
  })
}
