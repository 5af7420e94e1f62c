//! Frame clock: timed waits expressed as entries that fire once enough
//! elapsed time has been fed in through `advance`.

use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug)]
pub struct Timers<E> {
  now: Duration,
  next_id: u64,
  pending: Vec<(Duration, TimerId, E)>,
}

impl<E> Default for Timers<E> {
  fn default() -> Self {
    Self { now: Duration::ZERO, next_id: 0, pending: Vec::new() }
  }
}

impl<E> Timers<E> {
  pub fn new() -> Self { Self::default() }

  /// Elapsed time since the clock was created.
  pub fn now(&self) -> Duration { self.now }

  pub fn schedule(&mut self, delay: Duration, event: E) -> TimerId {
    let id = TimerId(self.next_id);
    self.next_id += 1;
    self.pending.push((self.now + delay, id, event));
    id
  }

  pub fn cancel(&mut self, id: TimerId) -> Option<E> {
    let pos = self.pending.iter().position(|(_, t, _)| *t == id)?;
    Some(self.pending.remove(pos).2)
  }

  pub fn is_empty(&self) -> bool { self.pending.is_empty() }

  /// Move the clock forward and return due events, earliest first
  /// (ties in scheduling order).
  pub fn advance(&mut self, elapsed: Duration) -> Vec<E> {
    self.now += elapsed;
    let now = self.now;
    let (mut due, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending).into_iter().partition(|(at, _, _)| *at <= now);
    self.pending = rest;
    due.sort_by_key(|(at, id, _)| (*at, id.0));
    due.into_iter().map(|(_, _, e)| e).collect()
  }
}
