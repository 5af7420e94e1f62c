//! Progress/reward ledger: XP, coins, script position and completion sets.
//!
//! Only the scalar fields (xp, coins, step index, save time) go to the store.
//! Completed exercises and learned words live for the session.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::domain::Reward;
use crate::error::LessonResult;
use crate::store::KvStore;

pub const KEY_XP: &str = "player_xp";
pub const KEY_COINS: &str = "player_coins";
pub const KEY_STEP: &str = "dialog_step";
pub const KEY_SAVE_TIME: &str = "save_time";

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ProgressState {
  pub xp: u64,
  pub coins: u64,
  pub current_step: usize,
  pub completed_exercises: BTreeSet<String>,
  pub learned_words: BTreeSet<String>,
  pub last_saved: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default)]
pub struct Ledger {
  progress: ProgressState,
}

impl Ledger {
  pub fn new() -> Self { Self::default() }

  /// Session bootstrap: wipe the store when `reset` is set, otherwise restore from it.
  #[instrument(level = "info", skip(store))]
  pub fn open(store: &mut dyn KvStore, reset: bool) -> Self {
    let mut ledger = Ledger::new();
    if reset {
      if let Err(e) = store.delete_all() {
        warn!(target: "ledger", error = %e, "Failed to clear progress store");
      }
      info!(target: "ledger", "Progress reset");
    } else {
      ledger.restore(store);
    }
    ledger
  }

  pub fn progress(&self) -> &ProgressState { &self.progress }

  pub fn xp(&self) -> u64 { self.progress.xp }

  pub fn coins(&self) -> u64 { self.progress.coins }

  pub fn current_step(&self) -> usize { self.progress.current_step }

  pub fn set_current_step(&mut self, step: usize) { self.progress.current_step = step; }

  /// Move to the next step and return the new index.
  pub fn advance_step(&mut self) -> usize {
    self.progress.current_step += 1;
    self.progress.current_step
  }

  pub fn add_reward(&mut self, reward: Reward) {
    self.progress.xp += u64::from(reward.xp);
    self.progress.coins += u64::from(reward.coins);
    info!(target: "ledger", xp = reward.xp, coins = reward.coins, total_xp = self.progress.xp, total_coins = self.progress.coins, "Reward granted");
  }

  /// Returns false when the id was already recorded.
  pub fn mark_exercise_completed(&mut self, id: &str) -> bool {
    self.progress.completed_exercises.insert(id.to_string())
  }

  pub fn mark_word_learned(&mut self, word: &str) -> bool {
    self.progress.learned_words.insert(word.to_string())
  }

  pub fn is_completed(&self, id: &str) -> bool {
    self.progress.completed_exercises.contains(id)
  }

  #[instrument(level = "info", skip(self, store), fields(xp = self.progress.xp, coins = self.progress.coins, step = self.progress.current_step))]
  pub fn persist(&mut self, store: &mut dyn KvStore) -> LessonResult<()> {
    let now = Utc::now();
    store.set(KEY_XP, self.progress.xp.to_string())?;
    store.set(KEY_COINS, self.progress.coins.to_string())?;
    store.set(KEY_STEP, self.progress.current_step.to_string())?;
    store.set(KEY_SAVE_TIME, now.to_rfc3339())?;
    self.progress.last_saved = Some(now);
    Ok(())
  }

  /// Load scalars when a save exists; returns whether anything was restored.
  #[instrument(level = "info", skip(self, store))]
  pub fn restore(&mut self, store: &dyn KvStore) -> bool {
    if store.get(KEY_XP).is_none() {
      return false;
    }
    self.progress.xp = read_number(store, KEY_XP);
    self.progress.coins = read_number(store, KEY_COINS);
    self.progress.current_step = read_number::<usize>(store, KEY_STEP);
    self.progress.last_saved = store
      .get(KEY_SAVE_TIME)
      .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
      .map(|t| t.with_timezone(&Utc));
    info!(target: "ledger", xp = self.progress.xp, coins = self.progress.coins, step = self.progress.current_step, "Progress restored");
    true
  }
}

fn read_number<T: std::str::FromStr + Default>(store: &dyn KvStore, key: &str) -> T {
  match store.get(key) {
    Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
      warn!(target: "ledger", %key, value = %raw, "Unparseable progress value; using 0");
      T::default()
    }),
    None => T::default(),
  }
}
