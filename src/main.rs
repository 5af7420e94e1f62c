//! Lingo Quest · lesson server
//!
//! - Axum HTTP + WebSocket API, one dialog session per socket
//! - Lesson content and settings from TOML, built-in lesson otherwise
//!
//! Important env variables:
//!   PORT               : u16 (default 3000)
//!   LESSON_CONFIG_PATH : path to TOML lesson (settings, rewards, content, script)
//!   PROGRESS_PATH      : JSON file for saved progress; in-memory when unset
//!   LOG_LEVEL          : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT         : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use lingo_quest::routes::build_router;
use lingo_quest::state::AppState;
use lingo_quest::telemetry;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let state = Arc::new(AppState::new());
  let app = build_router(state.clone());

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "lingo_quest", %addr, steps = state.lesson.script.len(), "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "lingo_quest", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "lingo_quest", error = %e, "Failed to listen for Ctrl-C");
    std::future::pending::<()>().await;
  }
  info!(target: "lingo_quest", "Shutdown requested");
}
