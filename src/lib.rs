//! Lingo Quest · dialog-driven English lesson engine.
//!
//! An NPC walks the learner through a scripted dialog; some steps open an
//! exercise (word card, sentence builder, `to` quiz, pronunciation, picture
//! choice, reward). Correct answers resume the dialog, progress is kept in a
//! key/value store. The engine is frame-clocked and presentation-agnostic;
//! `routes` exposes it over HTTP and WebSocket.

pub mod capture;
pub mod config;
pub mod domain;
pub mod error;
pub mod evaluator;
pub mod hosts;
pub mod ledger;
pub mod presenter;
pub mod protocol;
pub mod routes;
pub mod seeds;
pub mod sequencer;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod timer;
pub mod util;
