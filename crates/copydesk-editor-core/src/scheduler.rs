//! Deterministic debounce scheduling on a virtual clock.
//!
//! Each task kind has at most one pending deadline. Arming a kind replaces
//! its previous deadline, so only the most recent request can ever fire.
//! Time only moves when the host calls [`Scheduler::advance`].

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Scheduler<K> {
    now: Duration,
    pending: Vec<(K, Duration)>,
}

impl<K> Default for Scheduler<K> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            pending: Vec::new(),
        }
    }
}

impl<K: Copy + Eq + std::fmt::Debug> Scheduler<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `kind` to fire `delay` from now, cancelling any pending one.
    pub fn schedule(&mut self, kind: K, delay: Duration) {
        self.cancel(kind);
        self.pending.push((kind, self.now + delay));
    }

    /// Disarm `kind`. Returns whether anything was pending.
    pub fn cancel(&mut self, kind: K) -> bool {
        let before = self.pending.len();
        self.pending.retain(|(k, _)| *k != kind);
        before != self.pending.len()
    }

    pub fn is_pending(&self, kind: K) -> bool {
        self.pending.iter().any(|(k, _)| *k == kind)
    }

    /// Time remaining until `kind` fires.
    pub fn remaining(&self, kind: K) -> Option<Duration> {
        self.pending
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, at)| at.saturating_sub(self.now))
    }

    /// Move the clock forward and return every kind whose deadline has
    /// passed, earliest first. Returned kinds are no longer pending.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<K> {
        self.now += elapsed;
        let now = self.now;
        let mut due: Vec<(K, Duration)> = Vec::new();
        self.pending.retain(|&(k, at)| {
            if at <= now {
                due.push((k, at));
                false
            } else {
                true
            }
        });
        due.sort_by_key(|&(_, at)| at);
        due.into_iter().map(|(k, _)| k).collect()
    }
}
